//! Physics error types

use std::fmt;

/// Error type for collider construction and collision queries
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Malformed shape (too few polygon vertices, unknown shape tag, bad dimensions)
    InvalidShape(String),
    /// A collision routine received something that is not a usable collider
    InvalidCollider(String),
    /// A layer bitstring or layer index outside the configured layers
    InvalidLayers(String),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::InvalidShape(msg) => write!(f, "Invalid shape: {}", msg),
            PhysicsError::InvalidCollider(msg) => write!(f, "Invalid collider: {}", msg),
            PhysicsError::InvalidLayers(msg) => write!(f, "Invalid layers: {}", msg),
        }
    }
}

impl std::error::Error for PhysicsError {}
