//! Scene error types

use std::io;

use jazz2d_physics::PhysicsError;

/// Unified error type for scene operations
#[derive(Debug)]
pub enum SceneError {
    /// Collider, layer or query error from the collision engine
    Physics(PhysicsError),
    /// A physics object was loaded without a collider
    MissingCollider(String),
    /// The key does not name a live object
    UnknownObject,
    /// Parenting would make an object its own ancestor
    HierarchyCycle,
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax)
    Parse(ron::error::SpannedError),
    /// Serialization error
    Serialize(ron::Error),
}

impl From<PhysicsError> for SceneError {
    fn from(e: PhysicsError) -> Self {
        SceneError::Physics(e)
    }
}

impl From<io::Error> for SceneError {
    fn from(e: io::Error) -> Self {
        SceneError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SceneError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneError::Parse(e)
    }
}

impl From<ron::Error> for SceneError {
    fn from(e: ron::Error) -> Self {
        SceneError::Serialize(e)
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::Physics(e) => write!(f, "Physics error: {}", e),
            SceneError::MissingCollider(name) => write!(f, "Physics object '{}' has no collider", name),
            SceneError::UnknownObject => write!(f, "Unknown object"),
            SceneError::HierarchyCycle => write!(f, "Object cannot be parented to its own descendant"),
            SceneError::Io(e) => write!(f, "IO error: {}", e),
            SceneError::Parse(e) => write!(f, "Parse error: {}", e),
            SceneError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Physics(e) => Some(e),
            SceneError::Io(e) => Some(e),
            SceneError::Parse(e) => Some(e),
            SceneError::Serialize(e) => Some(e),
            _ => None,
        }
    }
}
