//! # Rapier Backend Tests
//!
//! The default [`Simulation`] runs on rapier3d. These checks use loose
//! tolerances: contact resolution is rapier's, not ours.
//!
//! Run with: cargo test -p vivarium --test rapier_backend_test

use vivarium::core::EntityId;
use vivarium::physics::{BodyKind, BodyRequest, RapierSolver, ShapeDesc, Solver};
use vivarium::shared::Vec3;
use vivarium::{Simulation, SimulationConfig};

const FRAME_MS: f64 = 1000.0 / 60.0;

fn rapier() -> Simulation<RapierSolver> {
    Simulation::new(&SimulationConfig::default()).unwrap()
}

fn ground_and_cube(sim: &mut Simulation<RapierSolver>, height: f32) -> (EntityId, EntityId) {
    let ground = sim.create_entity();
    sim.spawn_body(
        ground,
        &BodyRequest::new(ShapeDesc::Box { size: Vec3::new(20.0, 1.0, 20.0) }, BodyKind::Fixed)
            .with_material("stone")
            .at(Vec3::new(0.0, -0.5, 0.0)),
    )
    .unwrap();

    let cube = sim.create_entity();
    sim.spawn_body(
        cube,
        &BodyRequest::new(ShapeDesc::Box { size: Vec3::ONE }, BodyKind::Dynamic)
            .with_material("wood")
            .at(Vec3::new(0.0, height, 0.0)),
    )
    .unwrap();
    (ground, cube)
}

#[test]
fn verify_cube_lands_on_ground() {
    let mut sim = rapier();
    let (ground, cube) = ground_and_cube(&mut sim, 3.0);
    let channel = sim.subscribe();

    let mut touched = false;
    for _ in 0..180 {
        sim.frame(FRAME_MS);
        touched |= channel
            .try_iter()
            .any(|event| event.started && event.other(cube) == Some(ground));
    }

    assert!(touched, "no contact reported between cube and ground");
    let position = sim.world().transforms.position(cube).unwrap();
    assert!((position.y - 0.5).abs() < 0.05, "cube rests at {position:?}");
    assert!(position.x.abs() < 0.05 && position.z.abs() < 0.05);
}

#[test]
fn verify_mass_reaches_the_solver() {
    let mut sim = rapier();
    let (_, cube) = ground_and_cube(&mut sim, 3.0);
    let body = sim.world().rigid_bodies.get(cube).unwrap();
    assert!((sim.solver().body_mass(body).unwrap() - 700.0).abs() < 0.5);

    sim.rescale_body(cube, Vec3::splat(2.0)).unwrap();
    assert!((sim.solver().body_mass(body).unwrap() - 5600.0).abs() < 2.0);
}

#[test]
fn verify_grab_lifts_the_cube() {
    let mut sim = rapier();
    let (_, cube) = ground_and_cube(&mut sim, 0.5);
    sim.start_grab(cube, Vec3::new(0.0, 1.0, 0.0)).unwrap();

    for _ in 0..120 {
        sim.move_hand(Vec3::new(0.0, 3.0, 0.0));
        sim.frame(FRAME_MS);
    }
    let position = sim.world().transforms.position(cube).unwrap();
    assert!(position.y > 1.5, "cube stayed at {position:?}");

    sim.end_grab();
    assert!(!sim.grab().is_grabbing());
}

#[test]
fn verify_reset_rebuilds_the_world() {
    let mut sim = rapier();
    let (ground, cube) = ground_and_cube(&mut sim, 3.0);
    let old = sim.world().rigid_bodies.get(cube).unwrap();
    sim.frame(FRAME_MS);

    sim.reset_physics();
    assert_eq!(sim.solver().body_count(), 0);
    assert!(!sim.solver().contains_body(old));
    assert!(sim.registry().is_empty());

    let fresh = sim
        .spawn_body(cube, &BodyRequest::new(ShapeDesc::Sphere { radius: 0.5 }, BodyKind::Dynamic))
        .unwrap();
    assert_ne!(fresh, old);
    assert_eq!(sim.registry().entity(fresh), Some(cube));
    assert!(sim.world().is_alive(ground));
    for _ in 0..10 {
        sim.frame(FRAME_MS);
    }
    assert!(sim.world().transforms.position(cube).unwrap().y < 0.0);
}
