//! # Simulation Error Types

use std::path::PathBuf;

use thiserror::Error;
use vivarium_core::EntityId;
use vivarium_physics::PhysicsError;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the simulation context.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Physics layer failure.
    #[error(transparent)]
    Physics(#[from] PhysicsError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The entity is not alive.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// The entity has no rigid body.
    #[error("entity {0} has no rigid body")]
    NoRigidBody(EntityId),
}

/// Result type for simulation operations.
pub type SimulationResult<T> = Result<T, SimulationError>;
