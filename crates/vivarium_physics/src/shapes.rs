//! # Shape/Mass Factory
//!
//! Translates semantic shape + material requests into solver body and
//! collider descriptors.
//!
//! ## Mass policy
//!
//! - An explicit mass override is used verbatim; an override of exactly zero
//!   makes the body immovable
//! - Without an override, mass is `volume × material density`
//! - With an override, density is back-derived as `override / volume` for
//!   rescale bookkeeping only
//! - A dynamic request that resolves to zero mass is promoted to fixed
//!
//! Every number handed to the solver passes through the sanitizers in
//! [`vivarium_shared::sanitize`] first.

use std::f32::consts::PI;

use tracing::warn;
use vivarium_shared::sanitize::sanitize_slice;
use vivarium_shared::{
    finite_or_zero, finite_quat, finite_vec3, positive_or_epsilon, positive_vec3, BodyHandle,
    ColliderHandle, Quat, Vec3,
};

use crate::error::{PhysicsError, PhysicsResult, SolverError};
use crate::materials::{Material, MaterialTable};
use crate::solver::{BodyDesc, BodyKind, ColliderDesc, ColliderShape, Solver};

// =============================================================================
// Shape descriptors
// =============================================================================

/// Semantic shape, in unscaled base dimensions.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeDesc {
    /// Box by full extents (width, height, depth).
    Box {
        /// Full extents.
        size: Vec3,
    },
    /// Sphere.
    Sphere {
        /// Radius.
        radius: f32,
    },
    /// Y-aligned cylinder.
    Cylinder {
        /// Radius.
        radius: f32,
        /// Full height.
        height: f32,
    },
    /// Y-aligned cone.
    Cone {
        /// Base radius.
        radius: f32,
        /// Full height.
        height: f32,
    },
    /// Y-aligned capsule.
    Capsule {
        /// Cap and segment radius.
        radius: f32,
        /// Length of the cylindrical segment, caps excluded.
        height: f32,
    },
    /// Convex hull of a point cloud.
    ConvexHull {
        /// Hull points.
        points: Vec<Vec3>,
    },
    /// Height grid. Always fixed.
    Heightfield {
        /// Rows (along Z).
        rows: usize,
        /// Columns (along X).
        cols: usize,
        /// `rows * cols` heights, row-major.
        heights: Vec<f32>,
        /// Grid extent in X/Z, height multiplier in Y.
        scale: Vec3,
    },
    /// Indexed triangle mesh. Always fixed.
    TriMesh {
        /// Vertices.
        vertices: Vec<Vec3>,
        /// Triangles.
        indices: Vec<[u32; 3]>,
    },
}

impl ShapeDesc {
    /// Short name for logs.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Cylinder { .. } => "cylinder",
            Self::Cone { .. } => "cone",
            Self::Capsule { .. } => "capsule",
            Self::ConvexHull { .. } => "convex_hull",
            Self::Heightfield { .. } => "heightfield",
            Self::TriMesh { .. } => "trimesh",
        }
    }

    /// Shapes the solver only supports on fixed bodies.
    #[must_use]
    pub const fn is_static_only(&self) -> bool {
        matches!(self, Self::Heightfield { .. } | Self::TriMesh { .. })
    }

    /// Geometric volume in m³.
    ///
    /// Convex hulls use their axis-aligned bounds. Heightfields and trimeshes
    /// have no volume.
    #[must_use]
    pub fn volume(&self) -> f32 {
        match self {
            Self::Box { size } => {
                let s = positive_vec3(*size);
                s.x * s.y * s.z
            }
            Self::Sphere { radius } => 4.0 / 3.0 * PI * positive_or_epsilon(*radius).powi(3),
            Self::Cylinder { radius, height } => {
                PI * positive_or_epsilon(*radius).powi(2) * positive_or_epsilon(*height)
            }
            Self::Cone { radius, height } => {
                PI * positive_or_epsilon(*radius).powi(2) * positive_or_epsilon(*height) / 3.0
            }
            Self::Capsule { radius, height } => {
                let r = positive_or_epsilon(*radius);
                PI * r * r * positive_or_epsilon(*height) + 4.0 / 3.0 * PI * r.powi(3)
            }
            Self::ConvexHull { points } => {
                let size = bounds_size(points);
                size.x * size.y * size.z
            }
            Self::Heightfield { .. } | Self::TriMesh { .. } => 0.0,
        }
    }

    /// Base dimensions multiplied by `scale`.
    ///
    /// Boxes, hulls, meshes and heightfields scale per axis. Spheres use the
    /// largest component; Y-aligned round shapes scale radius by
    /// `max(|sx|, |sz|)` and height by `|sy|`.
    #[must_use]
    pub fn scaled(&self, scale: Vec3) -> Self {
        let s = finite_vec3(scale).abs();
        let radial = s.x.max(s.z);
        match self {
            Self::Box { size } => Self::Box { size: size.mul_elem(s) },
            Self::Sphere { radius } => Self::Sphere { radius: radius * s.max_element() },
            Self::Cylinder { radius, height } => Self::Cylinder {
                radius: radius * radial,
                height: height * s.y,
            },
            Self::Cone { radius, height } => Self::Cone {
                radius: radius * radial,
                height: height * s.y,
            },
            Self::Capsule { radius, height } => Self::Capsule {
                radius: radius * radial,
                height: height * s.y,
            },
            Self::ConvexHull { points } => Self::ConvexHull {
                points: points.iter().map(|p| p.mul_elem(s)).collect(),
            },
            Self::Heightfield { rows, cols, heights, scale } => Self::Heightfield {
                rows: *rows,
                cols: *cols,
                heights: heights.clone(),
                scale: scale.mul_elem(s),
            },
            Self::TriMesh { vertices, indices } => Self::TriMesh {
                vertices: vertices.iter().map(|v| v.mul_elem(s)).collect(),
                indices: indices.clone(),
            },
        }
    }

    /// Solver geometry for this shape.
    ///
    /// Strictly positive dimensions are clamped to the epsilon floor, vertex
    /// and height data is scrubbed of non-finite values.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::HeightfieldSize`] or [`PhysicsError::TrimeshIndex`]
    /// when the buffers contradict each other.
    pub fn collider_shape(&self) -> PhysicsResult<ColliderShape> {
        let shape = match self {
            Self::Box { size } => ColliderShape::Cuboid {
                half_extents: positive_vec3(*size * 0.5),
            },
            Self::Sphere { radius } => ColliderShape::Ball {
                radius: positive_or_epsilon(*radius),
            },
            Self::Cylinder { radius, height } => ColliderShape::Cylinder {
                half_height: positive_or_epsilon(height * 0.5),
                radius: positive_or_epsilon(*radius),
            },
            Self::Cone { radius, height } => ColliderShape::Cone {
                half_height: positive_or_epsilon(height * 0.5),
                radius: positive_or_epsilon(*radius),
            },
            Self::Capsule { radius, height } => ColliderShape::Capsule {
                half_height: positive_or_epsilon(height * 0.5),
                radius: positive_or_epsilon(*radius),
            },
            Self::ConvexHull { points } => ColliderShape::ConvexHull {
                points: points.iter().copied().map(finite_vec3).collect(),
            },
            Self::Heightfield { rows, cols, heights, scale } => {
                if heights.len() != rows * cols {
                    return Err(PhysicsError::HeightfieldSize {
                        rows: *rows,
                        cols: *cols,
                        len: heights.len(),
                    });
                }
                let mut heights = heights.clone();
                let replaced = sanitize_slice(&mut heights);
                if replaced > 0 {
                    warn!(replaced, "non-finite heightfield samples zeroed");
                }
                let scale = finite_vec3(*scale);
                ColliderShape::Heightfield {
                    rows: *rows,
                    cols: *cols,
                    heights,
                    scale: Vec3::new(
                        positive_or_epsilon(scale.x.abs()),
                        scale.y,
                        positive_or_epsilon(scale.z.abs()),
                    ),
                }
            }
            Self::TriMesh { vertices, indices } => {
                if let Some(&index) = indices.iter().flatten().find(|i| **i as usize >= vertices.len()) {
                    return Err(PhysicsError::TrimeshIndex {
                        index,
                        vertex_count: vertices.len(),
                    });
                }
                ColliderShape::TriMesh {
                    vertices: vertices.iter().copied().map(finite_vec3).collect(),
                    indices: indices.clone(),
                }
            }
        };
        Ok(shape)
    }
}

/// Extents of the axis-aligned bounds of `points` (zero if empty).
fn bounds_size(points: &[Vec3]) -> Vec3 {
    let mut finite = points.iter().copied().map(finite_vec3);
    let Some(first) = finite.next() else {
        return Vec3::ZERO;
    };
    let (lo, hi) = finite.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
    hi - lo
}

// =============================================================================
// Mass resolution
// =============================================================================

/// Resolved mass and surface properties of a body at one scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassProperties {
    /// Body mass in kg.
    pub mass: f32,
    /// Effective density in kg/m³.
    pub density: f32,
    /// Friction coefficient.
    pub friction: f32,
    /// Restitution.
    pub restitution: f32,
    /// Shape volume in m³.
    pub volume: f32,
    /// Body kind after zero-mass promotion.
    pub kind: BodyKind,
}

/// Applies the mass policy to a shape volume.
#[must_use]
pub fn resolve_mass(
    volume: f32,
    material: Material,
    mass_override: Option<f32>,
    requested: BodyKind,
) -> MassProperties {
    let volume = finite_or_zero(volume).max(0.0);
    let (mass, density) = match mass_override {
        Some(m) => {
            let m = finite_or_zero(m).max(0.0);
            let density = if volume > 0.0 { m / volume } else { material.density };
            (m, density)
        }
        None => (volume * material.density, material.density),
    };
    let kind = if requested == BodyKind::Dynamic && mass <= 0.0 {
        BodyKind::Fixed
    } else {
        requested
    };
    MassProperties {
        mass,
        density,
        friction: material.friction,
        restitution: material.restitution,
        volume,
        kind,
    }
}

/// Mass after a rescale changes the volume from `base.volume` to `new_volume`.
///
/// With an explicit override, mass scales with the volume ratio; otherwise
/// the density is reapplied to the new volume.
#[must_use]
pub fn rescaled_mass(base: &MassProperties, has_override: bool, new_volume: f32) -> f32 {
    if has_override {
        if base.volume > 0.0 {
            base.mass * (new_volume / base.volume)
        } else {
            base.mass
        }
    } else {
        new_volume * base.density
    }
}

// =============================================================================
// Requests and blueprints
// =============================================================================

/// A request to create a body.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyRequest {
    /// Base shape at scale one.
    pub shape: ShapeDesc,
    /// Requested kind. Heightfields and trimeshes are always fixed.
    pub kind: BodyKind,
    /// Material name; `None` uses the default material.
    pub material: Option<String>,
    /// Explicit mass override.
    pub mass: Option<f32>,
    /// World position.
    pub position: Vec3,
    /// World rotation.
    pub rotation: Quat,
    /// Scale applied to the base shape.
    pub scale: Vec3,
}

impl BodyRequest {
    /// Request at the origin, unrotated, unscaled, default material.
    #[must_use]
    pub fn new(shape: ShapeDesc, kind: BodyKind) -> Self {
        Self {
            shape,
            kind,
            material: None,
            mass: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Sets the material by name.
    #[must_use]
    pub fn with_material(mut self, name: impl Into<String>) -> Self {
        self.material = Some(name.into());
        self
    }

    /// Sets an explicit mass.
    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Sets the world position.
    #[must_use]
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the world rotation.
    #[must_use]
    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the scale applied to the base shape.
    #[must_use]
    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

/// Everything needed to create a body, resolved but not yet submitted.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyBlueprint {
    /// Body parameters.
    pub body: BodyDesc,
    /// Collider parameters at the requested scale.
    pub collider: ColliderDesc,
    /// Material the request resolved to.
    pub material: Material,
    /// Mass properties of the base shape at scale one.
    pub base: MassProperties,
    /// Mass properties at the requested scale.
    pub scaled: MassProperties,
}

/// Resolves a request against the material table.
///
/// # Errors
///
/// [`PhysicsError::UnknownMaterial`] and the shape contract violations of
/// [`ShapeDesc::collider_shape`].
pub fn blueprint(request: &BodyRequest, materials: &MaterialTable) -> PhysicsResult<BodyBlueprint> {
    let material = materials.resolve(request.material.as_deref())?;
    let requested = if request.shape.is_static_only() {
        BodyKind::Fixed
    } else {
        request.kind
    };

    // An override is the mass of the body as spawned, so the policy runs on
    // the scaled volume and the scale-one base is back-derived for rescales.
    let shape = request.shape.scaled(request.scale);
    let scaled = resolve_mass(shape.volume(), material, request.mass, requested);
    let base = scaled_properties(&scaled, request.mass.is_some(), request.shape.volume());

    Ok(BodyBlueprint {
        body: BodyDesc {
            kind: scaled.kind,
            position: finite_vec3(request.position),
            rotation: finite_quat(request.rotation),
        },
        collider: ColliderDesc {
            shape: shape.collider_shape()?,
            friction: scaled.friction,
            restitution: scaled.restitution,
            mass: scaled.mass,
        },
        material,
        base,
        scaled,
    })
}

/// Mass properties of a rescaled shape derived from its base properties.
#[must_use]
pub fn scaled_properties(base: &MassProperties, has_override: bool, new_volume: f32) -> MassProperties {
    MassProperties {
        mass: rescaled_mass(base, has_override, new_volume),
        volume: new_volume,
        ..*base
    }
}

// =============================================================================
// Solver submission
// =============================================================================

/// Handles produced by [`create_body`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnedBody {
    /// Body handle.
    pub body: BodyHandle,
    /// Collider handle.
    pub collider: ColliderHandle,
    /// `true` if a degenerate hull was replaced by its bounding box.
    pub used_fallback: bool,
}

/// Submits a blueprint to the solver.
///
/// The body is removed again if its collider cannot be created.
///
/// # Errors
///
/// The solver's collider error, after the hull fallback has been tried.
pub fn create_body<S: Solver + ?Sized>(
    solver: &mut S,
    blueprint: &BodyBlueprint,
) -> PhysicsResult<SpawnedBody> {
    let body = solver.create_body(&blueprint.body);
    match attach_collider(solver, body, &blueprint.collider) {
        Ok((collider, used_fallback)) => Ok(SpawnedBody { body, collider, used_fallback }),
        Err(err) => {
            solver.remove_body(body);
            Err(err)
        }
    }
}

/// Attaches a collider, substituting a bounding box for a degenerate hull.
///
/// Returns the collider and whether the fallback was used.
///
/// # Errors
///
/// Any solver error other than a degenerate hull.
pub fn attach_collider<S: Solver + ?Sized>(
    solver: &mut S,
    body: BodyHandle,
    desc: &ColliderDesc,
) -> PhysicsResult<(ColliderHandle, bool)> {
    match solver.create_collider(body, desc) {
        Ok(collider) => Ok((collider, false)),
        Err(SolverError::DegenerateShape(reason)) => {
            let ColliderShape::ConvexHull { points } = &desc.shape else {
                return Err(SolverError::DegenerateShape(reason).into());
            };
            warn!(%body, %reason, "convex hull rejected, using bounding box");
            let fallback = ColliderDesc {
                shape: ColliderShape::Cuboid {
                    half_extents: positive_vec3(bounds_size(points) * 0.5),
                },
                friction: desc.friction,
                restitution: desc.restitution,
                mass: desc.mass,
            };
            Ok((solver.create_collider(body, &fallback)?, true))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceSolver;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-3 * b.abs().max(1.0)
    }

    #[test]
    fn test_closed_form_volumes() {
        assert!(close(ShapeDesc::Box { size: Vec3::new(2.0, 3.0, 4.0) }.volume(), 24.0));
        assert!(close(ShapeDesc::Sphere { radius: 1.0 }.volume(), 4.0 / 3.0 * PI));
        assert!(close(ShapeDesc::Cylinder { radius: 1.0, height: 2.0 }.volume(), 2.0 * PI));
        assert!(close(ShapeDesc::Cone { radius: 1.0, height: 3.0 }.volume(), PI));
        assert!(close(
            ShapeDesc::Capsule { radius: 1.0, height: 2.0 }.volume(),
            2.0 * PI + 4.0 / 3.0 * PI
        ));
        let hull = ShapeDesc::ConvexHull {
            points: vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 3.0)],
        };
        assert!(close(hull.volume(), 6.0));
    }

    #[test]
    fn test_box_mass_from_density_and_override() {
        let table = MaterialTable::builtin();
        let shape = ShapeDesc::Box { size: Vec3::new(2.0, 3.0, 4.0) };

        let plain = blueprint(&BodyRequest::new(shape.clone(), BodyKind::Dynamic), &table).unwrap();
        assert!(close(plain.scaled.mass, 24_000.0));

        let heavy_metal = BodyRequest::new(shape, BodyKind::Dynamic)
            .with_material("metal")
            .with_mass(10.0);
        let over = blueprint(&heavy_metal, &table).unwrap();
        assert_eq!(over.scaled.mass, 10.0);
        assert!(close(over.scaled.density, 10.0 / 24.0));
        assert_eq!(over.scaled.friction, 0.4);
    }

    #[test]
    fn test_override_survives_spawn_scale() {
        let table = MaterialTable::builtin();
        let request = BodyRequest::new(ShapeDesc::Box { size: Vec3::new(2.0, 3.0, 4.0) }, BodyKind::Dynamic)
            .with_material("stone")
            .with_mass(10.0)
            .scaled(Vec3::splat(2.0));
        let bp = blueprint(&request, &table).unwrap();

        assert_eq!(bp.scaled.mass, 10.0);
        assert_eq!(bp.collider.mass, 10.0);
        assert!(close(bp.scaled.density, 10.0 / 192.0));
        assert!(close(bp.base.mass, 10.0 / 8.0));
        assert!(close(bp.base.volume, 24.0));

        // Rescaling back to the spawn scale lands on the override again.
        assert!(close(rescaled_mass(&bp.base, true, 192.0), 10.0));

        let plain = BodyRequest::new(ShapeDesc::Box { size: Vec3::ONE }, BodyKind::Dynamic)
            .with_material("wood")
            .scaled(Vec3::splat(2.0));
        let bp = blueprint(&plain, &table).unwrap();
        assert!(close(bp.scaled.mass, 5600.0));
        assert!(close(bp.base.mass, 700.0));
    }

    #[test]
    fn test_zero_mass_promotes_to_fixed() {
        let table = MaterialTable::builtin();
        let request = BodyRequest::new(ShapeDesc::Sphere { radius: 1.0 }, BodyKind::Dynamic).with_mass(0.0);
        let bp = blueprint(&request, &table).unwrap();
        assert_eq!(bp.body.kind, BodyKind::Fixed);

        let nan = BodyRequest::new(ShapeDesc::Sphere { radius: 1.0 }, BodyKind::Dynamic).with_mass(f32::NAN);
        assert_eq!(blueprint(&nan, &table).unwrap().scaled.mass, 0.0);
    }

    #[test]
    fn test_static_only_shapes_are_fixed() {
        let table = MaterialTable::builtin();
        let terrain = ShapeDesc::Heightfield {
            rows: 2,
            cols: 2,
            heights: vec![0.0, 1.0, f32::NAN, 0.5],
            scale: Vec3::new(10.0, 1.0, 10.0),
        };
        let bp = blueprint(&BodyRequest::new(terrain, BodyKind::Dynamic), &table).unwrap();
        assert_eq!(bp.body.kind, BodyKind::Fixed);
        let ColliderShape::Heightfield { heights, .. } = &bp.collider.shape else {
            panic!("expected heightfield");
        };
        assert_eq!(heights[2], 0.0);
    }

    #[test]
    fn test_contract_violations_fail_fast() {
        let bad_grid = ShapeDesc::Heightfield {
            rows: 3,
            cols: 3,
            heights: vec![0.0; 8],
            scale: Vec3::ONE,
        };
        assert_eq!(
            bad_grid.collider_shape(),
            Err(PhysicsError::HeightfieldSize { rows: 3, cols: 3, len: 8 })
        );

        let bad_mesh = ShapeDesc::TriMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![[0, 1, 3]],
        };
        assert_eq!(
            bad_mesh.collider_shape(),
            Err(PhysicsError::TrimeshIndex { index: 3, vertex_count: 3 })
        );
    }

    #[test]
    fn test_scale_rules() {
        let s = Vec3::new(2.0, 3.0, -4.0);
        assert_eq!(
            ShapeDesc::Box { size: Vec3::ONE }.scaled(s),
            ShapeDesc::Box { size: Vec3::new(2.0, 3.0, 4.0) }
        );
        assert_eq!(
            ShapeDesc::Sphere { radius: 1.0 }.scaled(s),
            ShapeDesc::Sphere { radius: 4.0 }
        );
        assert_eq!(
            ShapeDesc::Capsule { radius: 0.5, height: 1.0 }.scaled(s),
            ShapeDesc::Capsule { radius: 2.0, height: 3.0 }
        );
    }

    #[test]
    fn test_non_finite_dimensions_are_clamped() {
        let shape = ShapeDesc::Box { size: Vec3::new(f32::NAN, 1.0, -2.0) };
        let ColliderShape::Cuboid { half_extents } = shape.collider_shape().unwrap() else {
            panic!("expected cuboid");
        };
        assert_eq!(half_extents, Vec3::new(1.0e-4, 0.5, 1.0e-4));
    }

    #[test]
    fn test_rescale_mass_rules() {
        let wood = Material::new(700.0, 0.6, 0.3);
        let base = resolve_mass(1.0, wood, None, BodyKind::Dynamic);
        assert!(close(rescaled_mass(&base, false, 8.0), 5600.0));

        let fixed_mass = resolve_mass(1.0, wood, Some(10.0), BodyKind::Dynamic);
        assert!(close(rescaled_mass(&fixed_mass, true, 8.0), 80.0));
    }

    #[test]
    fn test_degenerate_hull_falls_back_to_box() {
        let mut solver = ReferenceSolver::default();
        let table = MaterialTable::builtin();
        let flat = ShapeDesc::ConvexHull {
            points: vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0)],
        };
        let bp = blueprint(&BodyRequest::new(flat, BodyKind::Dynamic), &table).unwrap();
        let spawned = create_body(&mut solver, &bp).unwrap();
        assert!(spawned.used_fallback);
        assert!(solver.contains_body(spawned.body));
        assert_eq!(solver.collider_count(), 1);
    }

    #[test]
    fn test_failed_collider_removes_body() {
        let mut solver = ReferenceSolver::default();
        let bp = BodyBlueprint {
            body: BodyDesc { kind: BodyKind::Fixed, position: Vec3::ZERO, rotation: Quat::IDENTITY },
            collider: ColliderDesc {
                shape: ColliderShape::Heightfield { rows: 1, cols: 1, heights: vec![0.0], scale: Vec3::ONE },
                friction: 0.5,
                restitution: 0.0,
                mass: 0.0,
            },
            material: Material::default(),
            base: resolve_mass(0.0, Material::default(), None, BodyKind::Fixed),
            scaled: resolve_mass(0.0, Material::default(), None, BodyKind::Fixed),
        };
        assert!(create_body(&mut solver, &bp).is_err());
        assert_eq!(solver.body_count(), 0);
    }
}
