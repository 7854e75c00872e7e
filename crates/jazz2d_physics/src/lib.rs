//! 2D collision engine for jazz2d
//!
//! This crate provides the collision layer of the engine:
//! - Collider shapes (rectangles, circles, convex polygons, rays)
//! - Narrow phase tests (SAT overlap, segment and ray intersection)
//! - A uniform spatial hash grid for broad phase pruning
//! - A per-layer physics world coordinating the grids
//!
//! Objects themselves are owned elsewhere; the engine reads them through the
//! [`ObjectSource`] trait.

pub mod collider;
pub mod collision;
pub mod debug;
pub mod error;
pub mod grid;
pub mod layers;
pub mod shapes;
pub mod world;

// Re-export commonly used types
pub use collider::{Collider, PlacedCollider, Pose};
pub use collision::{collide_sat, ray_cast, segment_circle_intersection, segment_intersection, Penetration};
pub use debug::DebugLine;
pub use error::PhysicsError;
pub use grid::{ObjectSource, SpatialGrid};
pub use layers::LayerMask;
pub use shapes::{Shape, ShapeDesc, ShapeKind};
pub use world::{CollisionTarget, PhysicsConfig, PhysicsWorld, ResolvedCollider};
