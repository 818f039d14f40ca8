//! Numeric sanitizers applied before anything reaches the solver.
//!
//! A numeric solver kernel can corrupt its state or crash on NaN/Infinity,
//! so every value crossing that boundary goes through one of these.

use crate::constants::MIN_DIMENSION;
use crate::math::{Quat, Vec3};

/// Returns `v`, or `0.0` if it is NaN or infinite.
#[inline]
#[must_use]
pub fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Returns `v` for finite values above [`MIN_DIMENSION`], otherwise `MIN_DIMENSION`.
///
/// Used for strictly-positive quantities such as radii and extents.
#[inline]
#[must_use]
pub fn positive_or_epsilon(v: f32) -> f32 {
    if v.is_finite() && v > MIN_DIMENSION {
        v
    } else {
        MIN_DIMENSION
    }
}

/// Component-wise [`finite_or_zero`].
#[inline]
#[must_use]
pub fn finite_vec3(v: Vec3) -> Vec3 {
    Vec3::new(finite_or_zero(v.x), finite_or_zero(v.y), finite_or_zero(v.z))
}

/// Component-wise [`positive_or_epsilon`].
#[inline]
#[must_use]
pub fn positive_vec3(v: Vec3) -> Vec3 {
    Vec3::new(
        positive_or_epsilon(v.x),
        positive_or_epsilon(v.y),
        positive_or_epsilon(v.z),
    )
}

/// Unit quaternion with non-finite input replaced by identity.
#[inline]
#[must_use]
pub fn finite_quat(q: Quat) -> Quat {
    if q.is_finite() {
        q.normalize()
    } else {
        Quat::IDENTITY
    }
}

/// Sanitizes a buffer in place. Returns how many values were replaced.
pub fn sanitize_slice(values: &mut [f32]) -> usize {
    let mut replaced = 0;
    for v in values.iter_mut() {
        if !v.is_finite() {
            *v = 0.0;
            replaced += 1;
        }
    }
    replaced
}
