//! Scene templates
//!
//! Provides SceneTemplate for loading/saving scenes from RON files. A
//! template describes objects by plain data (shape tags, layer bitstrings)
//! and is turned into a live [`Scene`] by [`SceneTemplate::instantiate`].

use std::fs;
use std::path::Path;

use jazz2d_math::Vec2;
use jazz2d_physics::{Collider, LayerMask, PhysicsConfig, ShapeDesc};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::object::{PhysicsBinding, SceneObject};
use crate::scene::Scene;
use crate::world::ObjectKey;

/// Physics role of a templated object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoleTemplate {
    Body {
        #[serde(default)]
        is_static: bool,
    },
    Area {
        #[serde(default)]
        target_group: Option<String>,
    },
    Ray,
}

/// A serializable object template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectTemplate {
    /// Optional name for this object (for lookup)
    #[serde(default)]
    pub name: Option<String>,
    /// Group tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Position relative to the parent
    #[serde(default)]
    pub position: Vec2,
    /// Rotation relative to the parent, in degrees
    #[serde(default)]
    pub rotation: f32,
    /// Collider described by shape tag
    #[serde(default)]
    pub collider: Option<ShapeDesc>,
    /// Center polygon vertices on the object after building the collider
    #[serde(default)]
    pub recenter: bool,
    /// Debug draw color of the collider
    #[serde(default)]
    pub color: Option<[f32; 4]>,
    /// Physics role; objects without one are not registered
    #[serde(default)]
    pub role: Option<RoleTemplate>,
    /// Layers bitstring, defaults depend on the role
    #[serde(default)]
    pub layers: Option<String>,
    /// Collision layers bitstring, defaults to `"0001"`
    #[serde(default)]
    pub collision_layers: Option<String>,
    /// Child objects
    #[serde(default)]
    pub children: Vec<ObjectTemplate>,
}

impl ObjectTemplate {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_collider(mut self, shape: ShapeDesc) -> Self {
        self.collider = Some(shape);
        self
    }

    pub fn with_role(mut self, role: RoleTemplate) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_child(mut self, child: ObjectTemplate) -> Self {
        self.children.push(child);
        self
    }

    /// Build the object this template describes, without its children
    pub fn to_object(&self) -> Result<SceneObject, SceneError> {
        let mut object = SceneObject::new()
            .with_position(self.position)
            .with_rotation(self.rotation);
        object.name = self.name.clone();
        object.tags = self.tags.iter().cloned().collect();

        if let Some(desc) = &self.collider {
            let mut collider = Collider::new(desc.to_shape()?)?;
            if self.recenter {
                collider.recenter();
            }
            if let Some(color) = self.color {
                collider = collider.with_debug_color(color);
            }
            object.collider = Some(collider);
        }

        if let Some(role) = &self.role {
            let mut binding = match role {
                RoleTemplate::Body { is_static } => PhysicsBinding::body(*is_static),
                RoleTemplate::Area { target_group } => {
                    let area = PhysicsBinding::area();
                    match target_group {
                        Some(group) => area.with_target_group(group.clone()),
                        None => area,
                    }
                }
                RoleTemplate::Ray => PhysicsBinding::ray(),
            };
            if let Some(layers) = &self.layers {
                binding.layers = LayerMask::from_bitstring(layers)?;
            }
            if let Some(layers) = &self.collision_layers {
                binding.collision_layers = LayerMask::from_bitstring(layers)?;
            }
            object.physics = Some(binding);
        }

        Ok(object)
    }
}

/// A serializable scene containing object templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTemplate {
    /// Scene name (for display/debugging)
    pub name: String,
    /// Physics settings; the defaults are used when absent
    #[serde(default)]
    pub physics: Option<PhysicsConfig>,
    /// Root object templates
    #[serde(default)]
    pub objects: Vec<ObjectTemplate>,
}

impl SceneTemplate {
    /// Create a new empty scene template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            physics: None,
            objects: Vec::new(),
        }
    }

    /// Set the physics configuration for this scene
    pub fn with_physics(mut self, config: PhysicsConfig) -> Self {
        self.physics = Some(config);
        self
    }

    /// Add a root object template
    pub fn add_object(&mut self, object: ObjectTemplate) {
        self.objects.push(object);
    }

    /// Load a scene template from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let contents = fs::read_to_string(path)?;
        let template = ron::from_str(&contents)?;
        Ok(template)
    }

    /// Save a scene template to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneError> {
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Build a live scene, loading every object in hierarchy order
    pub fn instantiate(&self, config: Option<PhysicsConfig>) -> Result<Scene, SceneError> {
        let config = config.or_else(|| self.physics.clone()).unwrap_or_default();
        let mut scene = Scene::with_config(self.name.clone(), config);
        for object in &self.objects {
            spawn(&mut scene, None, object)?;
        }
        log::info!("Instantiated scene '{}' with {} objects", self.name, scene.world().len());
        Ok(scene)
    }
}

fn spawn(scene: &mut Scene, parent: Option<ObjectKey>, template: &ObjectTemplate) -> Result<ObjectKey, SceneError> {
    let object = template.to_object()?;
    let key = match parent {
        Some(parent) => scene.add_child_object(parent, object)?,
        None => scene.add_object(object)?,
    };
    for child in &template.children {
        spawn(scene, Some(key), child)?;
    }
    Ok(key)
}
