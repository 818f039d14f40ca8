//! Projectile lifetime countdown.

use vivarium_core::{EntityId, World};

/// Counts every projectile's lifetime down by `dt` seconds.
///
/// `expired` is cleared, then filled with projectiles whose lifetime ran
/// out. Destroying them is left to the caller, which owns the solver side.
pub fn expire_projectiles(world: &mut World, dt: f32, expired: &mut Vec<EntityId>) -> usize {
    expired.clear();
    if dt.is_finite() && dt > 0.0 {
        world.projectiles.tick_lifetimes(dt, expired);
    }
    expired.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vivarium_core::Projectile;

    #[test]
    fn test_expiry_reports_only_spent_projectiles() {
        let mut world = World::new(4);
        let owner = world.create_entity();
        let short = world.create_entity();
        let long = world.create_entity();
        world.projectiles.insert(short, Projectile { damage: 1.0, impulse: 1.0, lifetime: 0.05, owner });
        world.projectiles.insert(long, Projectile { damage: 1.0, impulse: 1.0, lifetime: 5.0, owner });

        let mut expired = vec![owner];
        assert_eq!(expire_projectiles(&mut world, 0.1, &mut expired), 1);
        assert_eq!(expired, vec![short]);

        assert_eq!(expire_projectiles(&mut world, f32::NAN, &mut expired), 0);
        assert!((world.projectiles.get(long).unwrap().lifetime - 4.9).abs() < 1e-5);
    }
}
