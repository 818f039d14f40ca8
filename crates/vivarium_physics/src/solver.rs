//! # Solver Capability
//!
//! The physics solver is an external oracle. This module names the exact
//! capability set the driving layer consumes; any backend implementing
//! [`Solver`] is substitutable.
//!
//! ## Contract
//!
//! - Handles are opaque and never reused within one solver instance,
//!   including across [`Solver::reset`].
//! - Every query on an unknown handle returns `None`/`false`, never panics.
//! - Inputs reaching the solver are already finite; backends may still
//!   reject malformed shapes with [`SolverError`].

use vivarium_shared::{BodyHandle, ColliderHandle, JointHandle, Quat, Vec3};

use crate::error::SolverError;

/// Geometric tolerance for hull degeneracy tests.
const GEOMETRY_EPSILON: f32 = 1.0e-6;

/// Rigid body simulation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Moved by forces, gravity and contacts.
    Dynamic,
    /// Never moves.
    Fixed,
    /// Moved by explicit next-pose targets; pushes dynamic bodies.
    KinematicPositionBased,
}

/// Parameters for body creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyDesc {
    /// Simulation mode.
    pub kind: BodyKind,
    /// Initial world position.
    pub position: Vec3,
    /// Initial world rotation.
    pub rotation: Quat,
}

/// Concrete collider geometry, already scaled and sanitized.
#[derive(Clone, Debug, PartialEq)]
pub enum ColliderShape {
    /// Box by half extents.
    Cuboid {
        /// Half extents along local X, Y, Z.
        half_extents: Vec3,
    },
    /// Sphere.
    Ball {
        /// Radius.
        radius: f32,
    },
    /// Y-aligned cylinder.
    Cylinder {
        /// Half of the height.
        half_height: f32,
        /// Radius.
        radius: f32,
    },
    /// Y-aligned cone, apex up.
    Cone {
        /// Half of the height.
        half_height: f32,
        /// Base radius.
        radius: f32,
    },
    /// Y-aligned capsule.
    Capsule {
        /// Half of the cylindrical segment length.
        half_height: f32,
        /// Radius of the caps and segment.
        radius: f32,
    },
    /// Convex hull of a point cloud.
    ConvexHull {
        /// Hull input points in local space.
        points: Vec<Vec3>,
    },
    /// Row-major height grid spanning `scale.x` by `scale.z`, centered on the body.
    Heightfield {
        /// Number of rows (along Z).
        rows: usize,
        /// Number of columns (along X).
        cols: usize,
        /// `rows * cols` heights, row-major.
        heights: Vec<f32>,
        /// Grid extent in X/Z and height multiplier in Y.
        scale: Vec3,
    },
    /// Indexed triangle mesh.
    TriMesh {
        /// Vertex positions in local space.
        vertices: Vec<Vec3>,
        /// Triangle vertex indices.
        indices: Vec<[u32; 3]>,
    },
}

fn require_positive(name: &str, values: &[f32]) -> Result<(), SolverError> {
    if values.iter().all(|v| v.is_finite() && *v > 0.0) {
        Ok(())
    } else {
        Err(SolverError::InvalidShape(format!("{name} dimensions must be positive and finite")))
    }
}

fn point_bounds(points: &[Vec3]) -> Result<(Vec3, Vec3), SolverError> {
    let Some(&first) = points.first() else {
        return Err(SolverError::InvalidShape("empty point set".into()));
    };
    if points.iter().any(|p| !p.is_finite()) {
        return Err(SolverError::InvalidShape("non-finite vertex".into()));
    }
    Ok(points.iter().fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))))
}

/// `true` if the points span a volume (not all coplanar).
fn hull_is_solid(points: &[Vec3]) -> bool {
    let Some(&p0) = points.first() else {
        return false;
    };
    let Some(p1) = points.iter().copied().find(|p| p.distance(p0) > GEOMETRY_EPSILON) else {
        return false;
    };
    let axis = p1 - p0;
    let Some(p2) = points
        .iter()
        .copied()
        .find(|p| axis.cross(*p - p0).length() > GEOMETRY_EPSILON)
    else {
        return false;
    };
    let normal = axis.cross(p2 - p0);
    points.iter().any(|p| normal.dot(*p - p0).abs() > GEOMETRY_EPSILON)
}

impl ColliderShape {
    /// Validates the geometry and returns its local AABB.
    ///
    /// Every backend runs this before building a collider, so malformed
    /// input is rejected the same way whatever solver sits underneath.
    ///
    /// # Errors
    ///
    /// [`SolverError::DegenerateShape`] for hulls with no volume,
    /// [`SolverError::InvalidShape`] for non-positive dimensions, non-finite
    /// numbers, mismatched heightfields and out-of-range trimesh indices.
    pub fn local_bounds(&self) -> Result<(Vec3, Vec3), SolverError> {
        match self {
            ColliderShape::Cuboid { half_extents } => {
                require_positive("cuboid", &half_extents.to_array())?;
                Ok((-*half_extents, *half_extents))
            }
            ColliderShape::Ball { radius } => {
                require_positive("ball", &[*radius])?;
                Ok((Vec3::splat(-radius), Vec3::splat(*radius)))
            }
            ColliderShape::Cylinder { half_height, radius } | ColliderShape::Cone { half_height, radius } => {
                require_positive("cylinder", &[*half_height, *radius])?;
                let half = Vec3::new(*radius, *half_height, *radius);
                Ok((-half, half))
            }
            ColliderShape::Capsule { half_height, radius } => {
                require_positive("capsule", &[*half_height, *radius])?;
                let half = Vec3::new(*radius, half_height + radius, *radius);
                Ok((-half, half))
            }
            ColliderShape::ConvexHull { points } => {
                if points.len() < 4 {
                    return Err(SolverError::DegenerateShape(format!(
                        "convex hull needs at least 4 points, got {}",
                        points.len()
                    )));
                }
                let bounds = point_bounds(points)?;
                if !hull_is_solid(points) {
                    return Err(SolverError::DegenerateShape("convex hull points are coplanar".into()));
                }
                Ok(bounds)
            }
            ColliderShape::Heightfield { rows, cols, heights, scale } => {
                if *rows < 2 || *cols < 2 || heights.len() != rows * cols {
                    return Err(SolverError::InvalidShape(format!(
                        "heightfield {rows}x{cols} with {} heights",
                        heights.len()
                    )));
                }
                require_positive("heightfield", &[scale.x, scale.z])?;
                if !scale.y.is_finite() || heights.iter().any(|h| !h.is_finite()) {
                    return Err(SolverError::InvalidShape("non-finite height".into()));
                }
                let (lo, hi) = heights
                    .iter()
                    .fold((f32::MAX, f32::MIN), |(lo, hi), h| (lo.min(*h), hi.max(*h)));
                let (y0, y1) = (lo * scale.y, hi * scale.y);
                Ok((
                    Vec3::new(-scale.x * 0.5, y0.min(y1), -scale.z * 0.5),
                    Vec3::new(scale.x * 0.5, y0.max(y1), scale.z * 0.5),
                ))
            }
            ColliderShape::TriMesh { vertices, indices } => {
                if indices.is_empty() {
                    return Err(SolverError::InvalidShape("trimesh has no triangles".into()));
                }
                if let Some(bad) = indices.iter().flatten().find(|i| **i as usize >= vertices.len()) {
                    return Err(SolverError::InvalidShape(format!(
                        "trimesh index {bad} out of range for {} vertices",
                        vertices.len()
                    )));
                }
                point_bounds(vertices)
            }
        }
    }
}

/// Parameters for collider creation.
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderDesc {
    /// Geometry.
    pub shape: ColliderShape,
    /// Coulomb friction coefficient.
    pub friction: f32,
    /// Bounciness in `[0, 1]`.
    pub restitution: f32,
    /// Mass contributed to the parent body.
    pub mass: f32,
}

/// Zero-rest-length spring between two bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringJointDesc {
    /// First body (the driver).
    pub body1: BodyHandle,
    /// Second body (the driven).
    pub body2: BodyHandle,
    /// Anchor in `body1`'s local frame.
    pub local_anchor1: Vec3,
    /// Anchor in `body2`'s local frame.
    pub local_anchor2: Vec3,
    /// Rest length.
    pub rest_length: f32,
    /// Spring stiffness (N/m).
    pub stiffness: f32,
    /// Spring damping (N·s/m).
    pub damping: f32,
}

/// Contact start/stop between two bodies, in solver handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawContactEvent {
    /// First body.
    pub body_a: BodyHandle,
    /// Second body.
    pub body_b: BodyHandle,
    /// `true` on contact start, `false` on contact end.
    pub started: bool,
}

/// The solver capability set consumed by the driving layer.
pub trait Solver {
    // =========================================================================
    // Bodies and colliders
    // =========================================================================

    /// Creates a rigid body.
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Attaches a collider to `body`.
    ///
    /// # Errors
    ///
    /// [`SolverError::UnknownBody`] for a dead parent,
    /// [`SolverError::DegenerateShape`] or [`SolverError::InvalidShape`]
    /// when the geometry is unusable.
    fn create_collider(
        &mut self,
        body: BodyHandle,
        desc: &ColliderDesc,
    ) -> Result<ColliderHandle, SolverError>;

    /// Removes a collider. Returns `false` if unknown.
    fn remove_collider(&mut self, collider: ColliderHandle) -> bool;

    /// Removes a body with its colliders and attached joints.
    /// Returns `false` if unknown.
    fn remove_body(&mut self, body: BodyHandle) -> bool;

    /// Handle-existence check.
    fn contains_body(&self, body: BodyHandle) -> bool;

    /// Simulation mode of `body`.
    fn body_kind(&self, body: BodyHandle) -> Option<BodyKind>;

    /// Total collider mass of `body`.
    fn body_mass(&self, body: BodyHandle) -> Option<f32>;

    /// Current world pose of `body`.
    fn body_pose(&self, body: BodyHandle) -> Option<(Vec3, Quat)>;

    /// Current linear velocity of `body`.
    fn body_linear_velocity(&self, body: BodyHandle) -> Option<Vec3>;

    /// Overwrites the linear velocity of a dynamic body.
    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool;

    /// Teleports `body`, clearing its velocity and any pending kinematic target.
    fn set_body_pose(&mut self, body: BodyHandle, position: Vec3, rotation: Quat) -> bool;

    /// Sets the pose a kinematic body reaches at the end of the next step.
    fn set_next_kinematic_pose(&mut self, body: BodyHandle, position: Vec3, rotation: Quat)
        -> bool;

    /// Sets only the position a kinematic body reaches at the end of the next step.
    fn set_next_kinematic_translation(&mut self, body: BodyHandle, position: Vec3) -> bool;

    // =========================================================================
    // Joints
    // =========================================================================

    /// Creates a spring joint.
    ///
    /// # Errors
    ///
    /// [`SolverError::UnknownBody`] or [`SolverError::JointRejected`].
    fn create_spring_joint(&mut self, desc: &SpringJointDesc) -> Result<JointHandle, SolverError>;

    /// Removes a joint.
    ///
    /// # Errors
    ///
    /// [`SolverError::UnknownJoint`] if it is already gone.
    fn remove_joint(&mut self, joint: JointHandle) -> Result<(), SolverError>;

    // =========================================================================
    // World
    // =========================================================================

    /// Advances the world by one fixed step.
    fn step(&mut self);

    /// Pops every queued contact event, oldest first.
    fn drain_collision_events(&mut self, sink: &mut dyn FnMut(RawContactEvent));

    /// Visits every non-fixed body with its pose.
    fn for_each_active_body(&self, visit: &mut dyn FnMut(BodyHandle, Vec3, Quat));

    /// Sets world gravity.
    fn set_gravity(&mut self, gravity: Vec3);

    /// Current world gravity.
    fn gravity(&self) -> Vec3;

    /// Sets the fixed step size in seconds.
    fn set_timestep(&mut self, dt: f32);

    /// Frees every body, collider, joint and queued event.
    ///
    /// Every previously issued handle becomes invalid.
    fn reset(&mut self);
}
