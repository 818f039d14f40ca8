//! # Physics Error Types
//!
//! Two layers: [`SolverError`] is what a solver backend reports,
//! [`PhysicsError`] is what the driving layer reports to callers.
//!
//! Stale handles are routine after a world reset. Most call sites treat
//! them as a no-op; the typed variant exists for callers that want to know.

use thiserror::Error;
use vivarium_shared::{BodyHandle, JointHandle};

/// Errors reported by a [`Solver`](crate::Solver) backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// The body handle does not exist in the live solver world.
    #[error("unknown body: {0}")]
    UnknownBody(BodyHandle),

    /// The joint handle does not exist in the live solver world.
    #[error("unknown joint: {0}")]
    UnknownJoint(JointHandle),

    /// The shape is geometrically degenerate (flat or too few points).
    #[error("degenerate shape: {0}")]
    DegenerateShape(String),

    /// The shape description is malformed.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// The solver refused to create the joint.
    #[error("joint rejected: {0}")]
    JointRejected(String),
}

/// Errors reported by the physics driving layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// The solver backend failed.
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// Heightfield buffer length does not match `rows * cols`.
    #[error("heightfield size mismatch: {rows}x{cols} needs {} heights, got {len}", .rows * .cols)]
    HeightfieldSize {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
        /// Actual buffer length.
        len: usize,
    },

    /// Triangle mesh index points past the vertex buffer.
    #[error("trimesh index {index} out of range for {vertex_count} vertices")]
    TrimeshIndex {
        /// Offending index.
        index: u32,
        /// Vertex buffer length.
        vertex_count: usize,
    },

    /// Grab anchor contains NaN or infinity.
    #[error("grab anchor is not finite")]
    NonFiniteAnchor,

    /// The handle was issued by a solver world that no longer exists.
    #[error("stale body handle: {0}")]
    StaleHandle(BodyHandle),

    /// The operation needs a dynamic body.
    #[error("body {0} is not dynamic")]
    NotDynamic(BodyHandle),

    /// Material name is not in the material table.
    #[error("unknown material: {0}")]
    UnknownMaterial(String),
}

/// Result type for physics operations.
pub type PhysicsResult<T> = Result<T, PhysicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heightfield_message_includes_expected_len() {
        let err = PhysicsError::HeightfieldSize { rows: 3, cols: 4, len: 10 };
        assert_eq!(err.to_string(), "heightfield size mismatch: 3x4 needs 12 heights, got 10");
    }

    #[test]
    fn test_solver_error_converts() {
        let err: PhysicsError = SolverError::UnknownBody(BodyHandle::from_raw(4)).into();
        assert!(matches!(err, PhysicsError::Solver(SolverError::UnknownBody(_))));
        assert_eq!(err.to_string(), "unknown body: BodyHandle(4)");
    }
}
