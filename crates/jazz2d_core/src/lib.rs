//! Core types for the jazz2d engine
//!
//! This crate provides the scene layer on top of the collision engine:
//!
//! - [`Transform2D`] - Local position and rotation
//! - [`SceneObject`] - A node in the hierarchy with an optional collider
//! - [`PhysicsBinding`] - Body, area or ray role plus its layers
//! - [`World`] - Container for all objects
//! - [`ObjectKey`] - Generational key to an object in the world
//! - [`Scene`] - A live scene driving the physics world each tick
//! - [`SceneTemplate`] - Loadable/saveable scene description

mod error;
mod object;
mod scene;
mod template;
mod transform;
mod world;

pub use error::SceneError;
pub use object::{AreaState, PhysicsBinding, PhysicsRole, RayHit, RayState, SceneObject};
pub use scene::{Contact, Scene};
pub use template::{ObjectTemplate, RoleTemplate, SceneTemplate};
pub use transform::{normalize_degrees, Transform2D};
pub use world::{ObjectKey, World};

// Re-export commonly used types for convenience
pub use jazz2d_math::{Rect, Vec2};
pub use jazz2d_physics::{
    Collider, CollisionTarget, DebugLine, LayerMask, Penetration, PhysicsConfig, PhysicsError, Pose, Shape,
    ShapeDesc,
};
