//! # Simulation Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file) yields the stock 60 Hz setup.
//!
//! ```toml
//! seed = 7
//!
//! [physics]
//! step_hz = 120
//! gravity = { x = 0.0, y = -3.7, z = 0.0 }
//!
//! [[materials]]
//! name = "foam"
//! density = 30.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use vivarium_physics::{Material, MaterialTable, SpringTuning};
use vivarium_shared::constants::DEFAULT_GRAVITY;
use vivarium_shared::{Vec3, MAX_FRAME_TIME, MAX_STEPS, STEP_HZ};

use crate::error::ConfigError;

/// Fixed-step clock and world settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Solver sub-steps per simulated second.
    pub step_hz: u32,
    /// Sub-step cap per frame.
    pub max_steps: u32,
    /// Ceiling on a single frame delta, in seconds.
    pub max_frame_time: f64,
    /// World gravity.
    pub gravity: Vec3,
    /// Bound of each collision subscriber channel.
    pub event_capacity: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            step_hz: STEP_HZ,
            max_steps: MAX_STEPS,
            max_frame_time: MAX_FRAME_TIME,
            gravity: Vec3::from_array(DEFAULT_GRAVITY),
            event_capacity: 1024,
        }
    }
}

/// Agent steering tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Agents closer than this to the threat flee.
    pub flee_radius: f32,
    /// Shortest time between decisions, in seconds.
    pub min_decision_time: f32,
    /// Longest time between decisions, in seconds.
    pub max_decision_time: f32,
    /// Probability of wandering (versus idling) at each decision.
    pub wander_chance: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            flee_radius: 8.0,
            min_decision_time: 1.0,
            max_decision_time: 4.0,
            wander_chance: 0.6,
        }
    }
}

/// Material table entry from configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Name referenced by body requests.
    pub name: String,
    /// Density in kg/m³.
    pub density: f32,
    /// Friction coefficient.
    #[serde(default = "default_friction")]
    pub friction: f32,
    /// Restitution.
    #[serde(default = "default_restitution")]
    pub restitution: f32,
}

fn default_friction() -> f32 {
    Material::default().friction
}

fn default_restitution() -> f32 {
    Material::default().restitution
}

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Clock and world settings.
    pub physics: PhysicsConfig,
    /// Grab spring tuning.
    pub grab: SpringTuning,
    /// Agent steering.
    pub steering: SteeringConfig,
    /// Materials added to (or overriding) the built-in table.
    pub materials: Vec<MaterialDef>,
    /// Expected peak entity count.
    pub capacity: usize,
    /// Seed for every random decision in the simulation.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            grab: SpringTuning::default(),
            steering: SteeringConfig::default(),
            materials: Vec::new(),
            capacity: 4096,
            seed: 0x5EED,
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] plus everything [`Self::from_toml_str`] returns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        if physics.step_hz == 0 {
            return invalid("physics.step_hz must be positive");
        }
        if physics.max_steps == 0 {
            return invalid("physics.max_steps must be at least 1");
        }
        if !(physics.max_frame_time.is_finite() && physics.max_frame_time > 0.0) {
            return invalid("physics.max_frame_time must be positive");
        }
        if !physics.gravity.is_finite() {
            return invalid("physics.gravity must be finite");
        }
        if physics.event_capacity == 0 {
            return invalid("physics.event_capacity must be positive");
        }

        let grab = &self.grab;
        if !(grab.stiffness_per_kg > 0.0 && grab.min_stiffness > 0.0 && grab.min_stiffness <= grab.max_stiffness)
        {
            return invalid("grab stiffness must be positive with min <= max");
        }

        let steering = &self.steering;
        if !(steering.min_decision_time > 0.0 && steering.min_decision_time <= steering.max_decision_time) {
            return invalid("steering decision times must be positive with min <= max");
        }
        if !(0.0..=1.0).contains(&steering.wander_chance) {
            return invalid("steering.wander_chance must be within [0, 1]");
        }

        for def in &self.materials {
            if !(def.density.is_finite() && def.density > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "material {}: density must be positive",
                    def.name
                )));
            }
            if !(def.friction >= 0.0 && (0.0..=1.0).contains(&def.restitution)) {
                return Err(ConfigError::Invalid(format!(
                    "material {}: friction must be >= 0 and restitution within [0, 1]",
                    def.name
                )));
            }
        }
        Ok(())
    }

    /// Built-in materials overlaid with the configured ones.
    #[must_use]
    pub fn material_table(&self) -> MaterialTable {
        let mut table = MaterialTable::builtin();
        for def in &self.materials {
            table.insert(def.name.clone(), Material::new(def.density, def.friction, def.restitution));
        }
        table
    }
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = SimulationConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.physics.step_hz, 60);
        assert_eq!(config.physics.max_steps, 5);
        assert_eq!(config.grab.stiffness_per_kg, 120.0);
    }

    #[test]
    fn test_partial_document() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 7

            [physics]
            step_hz = 120
            gravity = { x = 0.0, y = -3.7, z = 0.0 }

            [grab]
            max_stiffness = 5000.0

            [[materials]]
            name = "foam"
            density = 30.0
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.physics.step_hz, 120);
        assert_eq!(config.physics.max_steps, 5);
        assert_eq!(config.physics.gravity.y, -3.7);
        assert_eq!(config.grab.max_stiffness, 5000.0);
        assert_eq!(config.grab.min_stiffness, 100.0);

        let table = config.material_table();
        let foam = table.get("foam").unwrap();
        assert_eq!(foam.density, 30.0);
        assert_eq!(foam.friction, 0.5);
        assert_eq!(table.get("wood").unwrap().density, 700.0);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        for source in [
            "[physics]\nstep_hz = 0",
            "[physics]\nmax_frame_time = -1.0",
            "[grab]\nmin_stiffness = 10.0\nmax_stiffness = 1.0",
            "[steering]\nwander_chance = 1.5",
            "[[materials]]\nname = \"void\"\ndensity = 0.0",
        ] {
            assert!(
                matches!(SimulationConfig::from_toml_str(source), Err(ConfigError::Invalid(_))),
                "accepted: {source}"
            );
        }
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            SimulationConfig::from_toml_str("physics = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SimulationConfig::load("/nonexistent/vivarium.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
