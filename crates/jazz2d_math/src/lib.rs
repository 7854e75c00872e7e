//! 2D Mathematics Library
//!
//! This crate provides the small set of geometric types the jazz2d engine
//! is built on.
//!
//! ## Core Types
//!
//! - [`Vec2`] - 2D vector with x, y components (y grows downward, screen style)
//! - [`Rect`] - Axis-aligned rectangle used for bounding boxes

mod vec2;
pub mod rect;

pub use vec2::Vec2;
pub use rect::Rect;
