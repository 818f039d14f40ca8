//! # Vivarium Headless Runner
//!
//! Builds a small scene, drags a box around with the grab spring, fires a
//! projectile at a target and lets an agent wander, then logs frame stats.
//!
//! ```bash
//! RUST_LOG=vivarium=debug ./vivarium_headless [config.toml] [frames]
//! ```

use tracing::{info, warn};
use vivarium::core::{Agent, EntityId, Integrity, Projectile, RenderHandle};
use vivarium::physics::{BodyKind, BodyRequest, ShapeDesc};
use vivarium::shared::Vec3;
use vivarium::{Simulation, SimulationConfig, SimulationResult};

/// Frames run when none are given.
const DEFAULT_FRAMES: u32 = 600;

/// Simulated wall time per frame (a 60 Hz display).
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Boxes in the stack.
const STACK_HEIGHT: usize = 4;

fn main() -> SimulationResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            info!(%path, "loading config");
            SimulationConfig::load(&path)?
        }
        None => SimulationConfig::default(),
    };
    let frames = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut sim = Simulation::new(&config)?;
    let collisions = sim.subscribe();
    let scene = build_scene(&mut sim)?;

    // Grab the top box at its upper face.
    let grip = Vec3::new(0.0, STACK_HEIGHT as f32, 0.0);
    if let Err(err) = sim.start_grab(scene.top_box, grip) {
        warn!(%err, "could not grab top box");
    }

    let mut contacts = 0_usize;
    for frame in 0..frames {
        let t = frame as f32 * FRAME_MS as f32 / 1000.0;
        sim.move_hand(Vec3::new(2.0 * t.sin(), STACK_HEIGHT as f32 + 1.0, 2.0 * (1.0 - t.cos())));
        if frame == frames / 2 {
            sim.end_grab();
        }

        sim.frame(FRAME_MS);
        contacts += collisions.try_iter().filter(|e| e.started).count();
        for impact in sim.impacts() {
            info!(
                entity = %impact.target,
                projectile = %impact.projectile,
                health = impact.remaining_health,
                "impact"
            );
        }
    }

    let stats = sim.stats();
    info!(
        frames = stats.frames,
        avg_substeps = stats.avg_substeps(),
        capped_ratio = stats.capped_ratio(),
        contacts,
        alive = sim.world().alive_count(),
        "run complete"
    );
    if let Some(target_health) = sim.world().integrity.health(scene.target) {
        info!(target_health, "target state");
    }
    if let Some(agent) = sim.world().agents.get(scene.agent) {
        info!(x = agent.target_x, z = agent.target_z, state = ?agent.state, "agent state");
    }
    sim.for_each_render_pose(|entity, position, _| {
        if let Some(name) = sim.world().names.get(entity) {
            info!(%entity, name = name.as_str(), x = position.x, y = position.y, z = position.z, "final pose");
        }
    });
    Ok(())
}

struct Scene {
    top_box: EntityId,
    target: EntityId,
    agent: EntityId,
}

fn build_scene(sim: &mut Simulation) -> SimulationResult<Scene> {
    let ground = sim.create_entity();
    sim.spawn_body(
        ground,
        &BodyRequest::new(ShapeDesc::Box { size: Vec3::new(40.0, 1.0, 40.0) }, BodyKind::Fixed)
            .with_material("stone")
            .at(Vec3::new(0.0, -0.5, 0.0)),
    )?;
    sim.components_mut().names.insert(ground, "ground".to_owned());

    let mut top_box = ground;
    for level in 0..STACK_HEIGHT {
        let e = sim.create_entity();
        sim.spawn_body(
            e,
            &BodyRequest::new(ShapeDesc::Box { size: Vec3::ONE }, BodyKind::Dynamic)
                .with_material("wood")
                .at(Vec3::new(0.0, level as f32 + 0.5, 0.0)),
        )?;
        let components = sim.components_mut();
        components.names.insert(e, format!("box{level}"));
        components.render_handles.insert(e, RenderHandle(level as u64));
        top_box = e;
    }

    let target = sim.create_entity();
    sim.spawn_body(
        target,
        &BodyRequest::new(ShapeDesc::Box { size: Vec3::new(1.0, 2.0, 1.0) }, BodyKind::Fixed)
            .at(Vec3::new(0.0, 1.0, -8.0)),
    )?;
    let components = sim.components_mut();
    components.integrity.insert(target, Integrity::new(100.0, 5.0));
    components.names.insert(target, "target".to_owned());

    let shooter = sim.create_entity();
    let bullet = sim.create_entity();
    sim.spawn_body(
        bullet,
        &BodyRequest::new(ShapeDesc::Sphere { radius: 0.1 }, BodyKind::Dynamic)
            .with_material("metal")
            .at(Vec3::new(0.0, 1.2, -3.0)),
    )?;
    sim.set_linear_velocity(bullet, Vec3::new(0.0, 0.0, -25.0))?;
    sim.components_mut()
        .projectiles
        .insert(bullet, Projectile { damage: 35.0, impulse: 20.0, lifetime: 3.0, owner: shooter });

    let agent = sim.create_entity();
    sim.spawn_body(
        agent,
        &BodyRequest::new(
            ShapeDesc::Capsule { radius: 0.3, height: 1.0 },
            BodyKind::KinematicPositionBased,
        )
        .at(Vec3::new(6.0, 0.8, 6.0)),
    )?;
    let components = sim.components_mut();
    components.agents.insert(agent, Agent::idle(6.0, 6.0, 1.5, 0.5));
    components.names.insert(agent, "agent".to_owned());
    sim.set_threat(Some(Vec3::ZERO));

    info!(entities = sim.world().alive_count(), "scene built");
    Ok(Scene { top_box, target, agent })
}
