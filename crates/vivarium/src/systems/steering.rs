//! # Agent Steering
//!
//! A three-state machine per agent:
//!
//! - **Idle** stands still until the decision timer runs out
//! - **Wander** walks along a random heading until the timer runs out
//! - **Flee** runs straight away from the threat while it is within range
//!
//! Moving agents drive their kinematic target, so the solver carries the
//! body along on the next sub-step.

use std::f32::consts::TAU;

use rand::Rng;
use vivarium_core::{AgentState, KinematicTarget, World};
use vivarium_shared::{finite_or_zero, Quat, Vec3};

use crate::config::SteeringConfig;

/// Advances every agent by `dt` seconds.
///
/// # Arguments
///
/// * `threat` - Planar point agents flee from, if any
/// * `rng` - Source for wander decisions; seeded once per simulation
///
/// Returns the number of agents that moved.
pub fn update_agents<R: Rng + ?Sized>(
    world: &mut World,
    dt: f32,
    threat: Option<Vec3>,
    config: &SteeringConfig,
    rng: &mut R,
) -> usize {
    if !(dt.is_finite() && dt > 0.0) {
        return 0;
    }
    let flee_radius_sq = config.flee_radius * config.flee_radius;
    // Unvalidated configs reach here too; non-finite values read as zero.
    let min_wait = finite_or_zero(config.min_decision_time).max(0.0);
    let max_wait = finite_or_zero(config.max_decision_time).max(min_wait);
    let wander_chance = finite_or_zero(config.wander_chance).clamp(0.0, 1.0);

    let agents = world.agents.columns_mut();
    let mut moved = 0;

    for i in 0..agents.entities.len() {
        let entity = agents.entities[i];
        let (x, z) = (agents.target_x[i], agents.target_z[i]);

        let away = threat.map(|t| (x - t.x, z - t.z));
        let fleeing = matches!(away, Some((ax, az)) if ax * ax + az * az < flee_radius_sq);

        if fleeing {
            if let Some((ax, az)) = away {
                if ax != 0.0 || az != 0.0 {
                    agents.heading[i] = ax.atan2(az);
                }
            }
            agents.state[i] = AgentState::Flee;
        } else {
            if agents.state[i] == AgentState::Flee {
                agents.state[i] = AgentState::Idle;
                agents.decision_timer[i] = 0.0;
            }
            agents.decision_timer[i] -= dt;
            if agents.decision_timer[i] <= 0.0 {
                if rng.gen_bool(f64::from(wander_chance)) {
                    agents.state[i] = AgentState::Wander;
                    agents.heading[i] = rng.gen_range(0.0..TAU);
                } else {
                    agents.state[i] = AgentState::Idle;
                }
                agents.decision_timer[i] = rng.gen_range(min_wait..=max_wait);
            }
        }

        if agents.state[i] == AgentState::Idle {
            continue;
        }
        let heading = agents.heading[i];
        let step = agents.speed[i] * dt;
        agents.target_x[i] += heading.sin() * step;
        agents.target_z[i] += heading.cos() * step;
        moved += 1;

        if world.kinematic.contains(entity) {
            let y = world.transforms.position(entity).map_or(0.0, |p| p.y);
            world.kinematic.insert(
                entity,
                KinematicTarget {
                    position: Vec3::new(agents.target_x[i], y, agents.target_z[i]),
                    rotation: Quat::from_axis_angle(Vec3::Y, heading),
                },
            );
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use vivarium_core::{Agent, Transform};

    fn world_with_agent(agent: Agent) -> (World, vivarium_core::EntityId) {
        let mut world = World::new(4);
        let entity = world.create_entity();
        world
            .transforms
            .insert(entity, Transform::from_position(Vec3::new(agent.target_x, 1.5, agent.target_z)));
        world.kinematic.insert(entity, KinematicTarget::default());
        world.agents.insert(entity, agent);
        (world, entity)
    }

    #[test]
    fn test_flee_moves_away_from_threat() {
        let (mut world, entity) = world_with_agent(Agent::idle(2.0, 0.0, 4.0, 10.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let moved = update_agents(&mut world, 0.5, Some(Vec3::ZERO), &SteeringConfig::default(), &mut rng);
        assert_eq!(moved, 1);

        let agent = world.agents.get(entity).unwrap();
        assert_eq!(agent.state, AgentState::Flee);
        assert!((agent.target_x - 4.0).abs() < 1e-4);
        assert!(agent.target_z.abs() < 1e-4);

        let target = world.kinematic.get(entity).unwrap();
        assert_eq!(target.position.y, 1.5);
        assert!((target.position.x - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_idle_agent_holds_until_timer_expires() {
        let (mut world, entity) = world_with_agent(Agent::idle(0.0, 0.0, 1.0, 2.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = SteeringConfig::default();

        assert_eq!(update_agents(&mut world, 1.0, None, &config, &mut rng), 0);
        let agent = world.agents.get(entity).unwrap();
        assert_eq!(agent.state, AgentState::Idle);
        assert_eq!(agent.decision_timer, 1.0);
        assert_eq!(world.kinematic.get(entity), Some(KinematicTarget::default()));
    }

    #[test]
    fn test_decision_always_wanders_at_full_chance() {
        let (mut world, entity) = world_with_agent(Agent::idle(0.0, 0.0, 1.0, 0.1));
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let config = SteeringConfig { wander_chance: 1.0, ..SteeringConfig::default() };

        assert_eq!(update_agents(&mut world, 0.2, None, &config, &mut rng), 1);
        let agent = world.agents.get(entity).unwrap();
        assert_eq!(agent.state, AgentState::Wander);
        assert!((0.0..TAU).contains(&agent.heading));
        assert!((config.min_decision_time..=config.max_decision_time).contains(&agent.decision_timer));

        let travelled = (agent.target_x * agent.target_x + agent.target_z * agent.target_z).sqrt();
        assert!((travelled - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_leaving_flee_range_forces_a_decision() {
        let (mut world, entity) = world_with_agent(Agent::idle(20.0, 0.0, 1.0, 100.0));
        world.agents.set_state(entity, AgentState::Flee);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = SteeringConfig { wander_chance: 0.0, ..SteeringConfig::default() };

        update_agents(&mut world, 0.1, Some(Vec3::ZERO), &config, &mut rng);
        let agent = world.agents.get(entity).unwrap();
        assert_eq!(agent.state, AgentState::Idle);
        assert!(agent.decision_timer >= config.min_decision_time);
    }

    #[test]
    fn test_same_seed_same_paths() {
        let run = |seed| {
            let mut world = World::new(16);
            for i in 0..8 {
                let e = world.create_entity();
                world.agents.insert(e, Agent::idle(i as f32, 0.0, 1.5, 0.0));
            }
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..120 {
                update_agents(&mut world, 1.0 / 60.0, None, &SteeringConfig::default(), &mut rng);
            }
            world.agents.entities().iter().map(|&e| world.agents.get(e).unwrap()).collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_non_finite_config_never_panics() {
        let (mut world, entity) = world_with_agent(Agent::idle(0.0, 0.0, 1.0, 0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = SteeringConfig {
            wander_chance: f32::NAN,
            min_decision_time: f32::NAN,
            max_decision_time: f32::INFINITY,
            ..SteeringConfig::default()
        };

        assert_eq!(update_agents(&mut world, 0.1, None, &config, &mut rng), 0);
        let agent = world.agents.get(entity).unwrap();
        assert_eq!(agent.state, AgentState::Idle);
        assert_eq!(agent.decision_timer, 0.0);
    }
}
