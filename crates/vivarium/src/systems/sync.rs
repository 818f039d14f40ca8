//! World ↔ solver pose exchange.

use vivarium_core::World;
use vivarium_physics::{HandleRegistry, Solver};
use vivarium_shared::{finite_quat, finite_vec3};

/// Hands every kinematic target to the solver for the next sub-step.
///
/// Entities need both a target and a rigid body whose handle is still live.
/// Returns the number of targets pushed.
pub fn push_kinematic_targets<S: Solver + ?Sized>(world: &World, solver: &mut S) -> usize {
    let mut pushed = 0;
    world.kinematic.for_each(|entity, target| {
        let Some(body) = world.rigid_bodies.get(entity) else {
            return;
        };
        if !solver.contains_body(body) {
            return;
        }
        if solver.set_next_kinematic_pose(body, finite_vec3(target.position), finite_quat(target.rotation)) {
            pushed += 1;
        }
    });
    pushed
}

/// Copies every active solver pose into the transform store.
///
/// Only current buffers are written; bodies without a registered entity
/// (the grab hand) are skipped. Returns the number of transforms written.
pub fn sync_transforms<S: Solver + ?Sized>(
    world: &mut World,
    registry: &HandleRegistry,
    solver: &S,
) -> usize {
    let transforms = &mut world.transforms;
    let mut written = 0;
    solver.for_each_active_body(&mut |body, position, rotation| {
        if let Some(entity) = registry.entity(body) {
            if transforms.set_pose(entity, position, rotation) {
                written += 1;
            }
        }
    });
    written
}
