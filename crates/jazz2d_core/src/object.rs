//! Scene objects and their physics roles
//!
//! A [`SceneObject`] is a node in the object hierarchy: a local transform, an
//! optional collider and, for objects that take part in the collision
//! engine, a [`PhysicsBinding`] describing their role and layers.

use std::collections::HashSet;

use jazz2d_math::Vec2;
use jazz2d_physics::{Collider, LayerMask};

use crate::transform::Transform2D;
use crate::world::ObjectKey;

/// A ray hit: the object struck and the world-space point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub object: ObjectKey,
    pub point: Vec2,
}

/// State of an area detector
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AreaState {
    /// Inactive areas keep their last result
    pub active: bool,
    /// Only objects carrying this tag are detected
    pub target_group: Option<String>,
    /// Objects overlapping the area at the last update, nearest first
    pub entered: Vec<ObjectKey>,
}

/// State of a ray caster
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RayState {
    /// Inactive rays keep their last result
    pub active: bool,
    /// Objects the ray ignores
    pub blacklist: Vec<ObjectKey>,
    /// Closest hit at the last update
    pub hit: Option<RayHit>,
}

/// How an object takes part in collisions
#[derive(Clone, Debug, PartialEq)]
pub enum PhysicsRole {
    /// A solid object resolved by `move_and_collide`
    Body { is_static: bool },
    /// A detector recording what overlaps it
    Area(AreaState),
    /// A ray caster recording its closest hit
    Ray(RayState),
}

impl PhysicsRole {
    pub fn is_body(&self) -> bool {
        matches!(self, PhysicsRole::Body { .. })
    }
}

/// Physics role plus the layers an object registers on and queries
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsBinding {
    pub role: PhysicsRole,
    /// Layer grids the object is registered in
    pub layers: LayerMask,
    /// Layer grids the object queries
    pub collision_layers: LayerMask,
}

impl PhysicsBinding {
    /// A dynamic or static body on the default layers
    pub fn body(is_static: bool) -> Self {
        Self {
            role: PhysicsRole::Body { is_static },
            layers: LayerMask::default(),
            collision_layers: LayerMask::default(),
        }
    }

    /// An active area; areas register on no layer so nothing detects them
    pub fn area() -> Self {
        Self {
            role: PhysicsRole::Area(AreaState {
                active: true,
                ..Default::default()
            }),
            layers: LayerMask::NONE,
            collision_layers: LayerMask::default(),
        }
    }

    /// An active ray caster on the default layers
    pub fn ray() -> Self {
        Self {
            role: PhysicsRole::Ray(RayState {
                active: true,
                ..Default::default()
            }),
            layers: LayerMask::default(),
            collision_layers: LayerMask::default(),
        }
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_collision_layers(mut self, layers: LayerMask) -> Self {
        self.collision_layers = layers;
        self
    }

    /// Restrict an area to objects tagged with `group`; no effect on other roles
    pub fn with_target_group(mut self, group: impl Into<String>) -> Self {
        if let PhysicsRole::Area(area) = &mut self.role {
            area.target_group = Some(group.into());
        }
        self
    }

    /// Whether this is a static body
    pub fn is_static(&self) -> bool {
        matches!(self.role, PhysicsRole::Body { is_static: true })
    }
}

/// An object in the scene hierarchy
#[derive(Clone, Debug, Default)]
pub struct SceneObject {
    /// Optional name for lookup
    pub name: Option<String>,
    /// Group tags, used by area target groups
    pub tags: HashSet<String>,
    /// Transform relative to the parent
    pub transform: Transform2D,
    /// The object's collider, if any
    pub collider: Option<Collider>,
    /// Collision role and layers, if the object is a physics object
    pub physics: Option<PhysicsBinding>,
    pub(crate) parent: Option<ObjectKey>,
    pub(crate) children: Vec<ObjectKey>,
}

impl SceneObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.transform.set_rotation(degrees);
        self
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn with_physics(mut self, binding: PhysicsBinding) -> Self {
        self.physics = Some(binding);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// The parent object, if attached
    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectKey] {
        &self.children
    }

    /// Name for log and error messages
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn is_body(&self) -> bool {
        self.physics.as_ref().map_or(false, |p| p.role.is_body())
    }

    pub fn is_static(&self) -> bool {
        self.physics.as_ref().map_or(false, |p| p.is_static())
    }
}
