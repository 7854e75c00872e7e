//! 2D Transform (local position and rotation)
//!
//! A Transform2D holds an object's values relative to its parent. World
//! values are derived by composing with the parent's world [`Pose`].

use jazz2d_math::Vec2;
use jazz2d_physics::Pose;
use serde::{Deserialize, Serialize};

/// Parent rotations this close to zero compose by plain addition
pub const PARENT_ROTATION_EPSILON: f32 = 0.001;

/// Wrap an angle in degrees into `[0, 360)`
#[inline]
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Serialized form of [`Transform2D`], normalized on conversion
#[derive(Deserialize)]
struct TransformData {
    #[serde(default)]
    position: Vec2,
    #[serde(default)]
    rotation: f32,
}

impl From<TransformData> for Transform2D {
    fn from(data: TransformData) -> Self {
        Self::new(data.position, data.rotation)
    }
}

/// A local 2D transform with position and rotation in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformData")]
pub struct Transform2D {
    /// Position relative to the parent
    pub position: Vec2,
    /// Rotation relative to the parent, kept in `[0, 360)`
    rotation: f32,
}

impl Transform2D {
    /// Create an identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec2) -> Self {
        Self { position, rotation: 0.0 }
    }

    /// Create a transform with position and rotation
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation: normalize_degrees(rotation),
        }
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = normalize_degrees(degrees);
    }

    /// Add to the local rotation
    pub fn rotate(&mut self, degrees: f32) {
        self.set_rotation(self.rotation + degrees);
    }

    /// Compose with the parent's world pose
    ///
    /// Without a parent the local values are the world values.
    pub fn world_pose(&self, parent: Option<Pose>) -> Pose {
        match parent {
            None => Pose::new(self.position, self.rotation),
            Some(parent) => {
                let offset = if parent.rotation.abs() < PARENT_ROTATION_EPSILON {
                    self.position
                } else {
                    self.position.rotate(parent.rotation)
                };
                Pose::new(parent.position + offset, parent.rotation + self.rotation)
            }
        }
    }

    /// Solve the local position that yields `world` under `parent`
    pub fn set_world_position(&mut self, world: Vec2, parent: Option<Pose>) {
        self.position = match parent {
            None => world,
            Some(parent) => (world - parent.position).rotate(-parent.rotation),
        };
    }

    /// Solve the local rotation that yields `world` under `parent`
    pub fn set_world_rotation(&mut self, world: f32, parent: Option<Pose>) {
        let parent_rotation = parent.map_or(0.0, |p| p.rotation);
        self.set_rotation(world - parent_rotation);
    }
}
