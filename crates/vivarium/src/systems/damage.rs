//! # Impact Damage
//!
//! Runs on the events of the last flush. A projectile is spent by the first
//! started contact with an entity that has integrity, whether or not its
//! impulse clears the damage threshold. Contacts with the owner or with
//! plain geometry leave it alive.

use vivarium_core::{EntityId, World};
use vivarium_physics::{CollisionEvent, Solver};
use vivarium_shared::{BodyHandle, Vec3};

/// A registered hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    /// Entity that took damage.
    pub target: EntityId,
    /// Projectile that dealt it.
    pub projectile: EntityId,
    /// Damage applied.
    pub damage: f32,
    /// Health after the hit, saturated at zero.
    pub remaining_health: f32,
}

/// Applies projectile hits from `events`.
///
/// Spent projectiles are appended to `spent` (never twice) and registered
/// hits to `impacts`. Both are cleared first. Returns the number of hits.
pub fn resolve_impacts<S: Solver + ?Sized>(
    world: &mut World,
    solver: &S,
    events: &[CollisionEvent],
    spent: &mut Vec<EntityId>,
    impacts: &mut Vec<Impact>,
) -> usize {
    spent.clear();
    impacts.clear();

    for event in events.iter().filter(|e| e.started) {
        for (projectile, body, target) in [
            (event.entity_a, event.body_a, event.entity_b),
            (event.entity_b, event.body_b, event.entity_a),
        ] {
            let Some(payload) = world.projectiles.get(projectile) else {
                continue;
            };
            if target == payload.owner || !world.integrity.contains(target) || spent.contains(&projectile) {
                continue;
            }

            let (point, velocity) = contact_sample(world, solver, projectile, body);
            spent.push(projectile);
            if let Some(remaining_health) =
                world.integrity.apply_impact(target, payload.damage, payload.impulse, point, velocity)
            {
                impacts.push(Impact {
                    target,
                    projectile,
                    damage: payload.damage,
                    remaining_health,
                });
            }
        }
    }
    impacts.len()
}

/// Projectile position and velocity at impact, from the solver when it still
/// knows the body.
fn contact_sample<S: Solver + ?Sized>(
    world: &World,
    solver: &S,
    projectile: EntityId,
    body: BodyHandle,
) -> (Vec3, Vec3) {
    let point = solver
        .body_pose(body)
        .map(|(p, _)| p)
        .or_else(|| world.transforms.position(projectile))
        .unwrap_or(Vec3::ZERO);
    let velocity = solver.body_linear_velocity(body).unwrap_or(Vec3::ZERO);
    (point, velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vivarium_core::{Integrity, Projectile};
    use vivarium_physics::{BodyDesc, BodyKind, ReferenceSolver};
    use vivarium_shared::Quat;

    struct Scene {
        world: World,
        solver: ReferenceSolver,
        shooter: EntityId,
        target: EntityId,
        bullet: EntityId,
        bullet_body: BodyHandle,
        target_body: BodyHandle,
    }

    fn scene(impulse: f32) -> Scene {
        let mut world = World::new(8);
        let mut solver = ReferenceSolver::default();
        let shooter = world.create_entity();
        let target = world.create_entity();
        let bullet = world.create_entity();

        world.integrity.insert(target, Integrity::new(100.0, 5.0));
        world.integrity.insert(shooter, Integrity::new(100.0, 0.0));
        world
            .projectiles
            .insert(bullet, Projectile { damage: 30.0, impulse, lifetime: 3.0, owner: shooter });

        let bullet_body = solver.create_body(&BodyDesc {
            kind: BodyKind::Dynamic,
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
        });
        solver.set_linear_velocity(bullet_body, Vec3::new(0.0, 0.0, -20.0));
        let target_body = solver.create_body(&BodyDesc {
            kind: BodyKind::Fixed,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        });

        Scene { world, solver, shooter, target, bullet, bullet_body, target_body }
    }

    fn hit(s: &Scene, other: EntityId, other_body: BodyHandle, started: bool) -> CollisionEvent {
        CollisionEvent {
            entity_a: other,
            entity_b: s.bullet,
            body_a: other_body,
            body_b: s.bullet_body,
            started,
        }
    }

    #[test]
    fn test_hit_above_threshold_damages_and_records() {
        let mut s = scene(10.0);
        let events = [hit(&s, s.target, s.target_body, true)];
        let (mut spent, mut impacts) = (Vec::new(), Vec::new());

        assert_eq!(resolve_impacts(&mut s.world, &s.solver, &events, &mut spent, &mut impacts), 1);
        assert_eq!(spent, vec![s.bullet]);
        assert_eq!(impacts[0].remaining_health, 70.0);

        let integrity = s.world.integrity.get(s.target).unwrap();
        assert_eq!(integrity.health, 70.0);
        assert_eq!(integrity.last_impact_point, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(integrity.last_impact_velocity, Vec3::new(0.0, 0.0, -20.0));
    }

    #[test]
    fn test_hit_below_threshold_spends_without_damage() {
        let mut s = scene(1.0);
        let events = [hit(&s, s.target, s.target_body, true)];
        let (mut spent, mut impacts) = (Vec::new(), Vec::new());

        assert_eq!(resolve_impacts(&mut s.world, &s.solver, &events, &mut spent, &mut impacts), 0);
        assert_eq!(spent, vec![s.bullet]);
        assert_eq!(s.world.integrity.health(s.target), Some(100.0));
    }

    #[test]
    fn test_owner_and_stop_events_are_ignored() {
        let mut s = scene(10.0);
        let events = [
            hit(&s, s.shooter, s.target_body, true),
            hit(&s, s.target, s.target_body, false),
        ];
        let (mut spent, mut impacts) = (Vec::new(), Vec::new());

        assert_eq!(resolve_impacts(&mut s.world, &s.solver, &events, &mut spent, &mut impacts), 0);
        assert!(spent.is_empty());
        assert_eq!(s.world.integrity.health(s.shooter), Some(100.0));
    }

    #[test]
    fn test_projectile_is_spent_once_per_flush() {
        let mut s = scene(10.0);
        let events = [hit(&s, s.target, s.target_body, true), hit(&s, s.target, s.target_body, true)];
        let (mut spent, mut impacts) = (Vec::new(), Vec::new());

        assert_eq!(resolve_impacts(&mut s.world, &s.solver, &events, &mut spent, &mut impacts), 1);
        assert_eq!(spent.len(), 1);
        assert_eq!(s.world.integrity.health(s.target), Some(70.0));
    }
}
