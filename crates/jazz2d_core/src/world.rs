//! World container for scene objects
//!
//! The World owns every [`SceneObject`] in a generational arena and keeps the
//! parent/child hierarchy. Parents are plain keys: a child never owns its
//! parent, and removing an object removes its whole subtree.

use std::collections::VecDeque;

use jazz2d_math::Vec2;
use jazz2d_physics::{LayerMask, ObjectSource, PlacedCollider, Pose};
use slotmap::{new_key_type, SlotMap};

use crate::error::SceneError;
use crate::object::SceneObject;

new_key_type! {
    /// Generational key to an object in the world
    pub struct ObjectKey;
}

/// Container for all scene objects
#[derive(Debug, Default)]
pub struct World {
    objects: SlotMap<ObjectKey, SceneObject>,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            objects: SlotMap::with_key(),
        }
    }

    /// Add a root object to the world, returning its key
    pub fn insert(&mut self, mut object: SceneObject) -> ObjectKey {
        object.parent = None;
        object.children.clear();
        self.objects.insert(object)
    }

    pub fn get(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut SceneObject> {
        self.objects.get_mut(key)
    }

    fn get_or_err(&self, key: ObjectKey) -> Result<&SceneObject, SceneError> {
        self.objects.get(key).ok_or(SceneError::UnknownObject)
    }

    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over keys and objects
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &SceneObject)> {
        self.objects.iter()
    }

    /// Find the first object with the given name
    pub fn get_by_name(&self, name: &str) -> Option<(ObjectKey, &SceneObject)> {
        self.objects
            .iter()
            .find(|(_, obj)| obj.name.as_deref() == Some(name))
    }

    // --- Hierarchy ---

    /// Attach `child` under `parent`, detaching it from any previous parent
    ///
    /// The child keeps its local transform. Fails with
    /// [`SceneError::HierarchyCycle`] if `child` is `parent` or one of its
    /// ancestors.
    pub fn add_child(&mut self, parent: ObjectKey, child: ObjectKey) -> Result<(), SceneError> {
        self.get_or_err(parent)?;
        self.get_or_err(child)?;

        let mut ancestor = Some(parent);
        while let Some(key) = ancestor {
            if key == child {
                return Err(SceneError::HierarchyCycle);
            }
            ancestor = self.objects.get(key).and_then(|obj| obj.parent);
        }

        self.detach(child)?;
        if let Some(obj) = self.objects.get_mut(child) {
            obj.parent = Some(parent);
        }
        if let Some(obj) = self.objects.get_mut(parent) {
            obj.children.push(child);
        }
        Ok(())
    }

    /// Make `child` a root object again, keeping its local transform
    pub fn detach(&mut self, child: ObjectKey) -> Result<(), SceneError> {
        let parent = self.get_or_err(child)?.parent;
        if let Some(parent) = parent {
            if let Some(obj) = self.objects.get_mut(parent) {
                obj.children.retain(|&k| k != child);
            }
        }
        if let Some(obj) = self.objects.get_mut(child) {
            obj.parent = None;
        }
        Ok(())
    }

    pub fn parent(&self, key: ObjectKey) -> Option<ObjectKey> {
        self.objects.get(key)?.parent
    }

    /// Topmost ancestor of an object (the object itself for roots)
    pub fn root(&self, key: ObjectKey) -> Option<ObjectKey> {
        let mut current = key;
        let mut parent = self.objects.get(key)?.parent;
        while let Some(p) = parent {
            match self.objects.get(p) {
                Some(obj) => {
                    current = p;
                    parent = obj.parent;
                }
                None => break,
            }
        }
        Some(current)
    }

    /// Whether two objects hang under the same root
    pub fn same_root(&self, a: ObjectKey, b: ObjectKey) -> bool {
        match (self.root(a), self.root(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }

    /// Object and all its descendants, parents before children
    pub fn subtree(&self, key: ObjectKey) -> Vec<ObjectKey> {
        let mut order = Vec::new();
        let mut queue = VecDeque::from([key]);
        while let Some(k) = queue.pop_front() {
            if let Some(obj) = self.objects.get(k) {
                order.push(k);
                queue.extend(obj.children.iter().copied());
            }
        }
        order
    }

    /// Remove an object and its whole subtree
    ///
    /// The object is detached from its parent first. Removed objects are
    /// returned parents first; an unknown key removes nothing.
    pub fn remove(&mut self, key: ObjectKey) -> Vec<(ObjectKey, SceneObject)> {
        if self.detach(key).is_err() {
            return Vec::new();
        }
        self.subtree(key)
            .into_iter()
            .filter_map(|k| self.objects.remove(k).map(|obj| (k, obj)))
            .collect()
    }

    // --- Transforms ---

    /// World pose of an object, composed through its ancestors
    pub fn world_pose(&self, key: ObjectKey) -> Option<Pose> {
        let obj = self.objects.get(key)?;
        let mut chain = vec![obj.transform];
        let mut parent = obj.parent;
        while let Some(p) = parent {
            let Some(ancestor) = self.objects.get(p) else {
                break;
            };
            chain.push(ancestor.transform);
            parent = ancestor.parent;
        }

        let mut pose = None;
        for transform in chain.iter().rev() {
            pose = Some(transform.world_pose(pose));
        }
        pose
    }

    fn parent_pose(&self, key: ObjectKey) -> Option<Pose> {
        self.parent(key).and_then(|p| self.world_pose(p))
    }

    pub fn world_position(&self, key: ObjectKey) -> Option<Vec2> {
        self.world_pose(key).map(|pose| pose.position)
    }

    pub fn world_rotation(&self, key: ObjectKey) -> Option<f32> {
        self.world_pose(key).map(|pose| pose.rotation)
    }

    /// Move an object so its world position becomes `position`
    pub fn set_world_position(&mut self, key: ObjectKey, position: Vec2) -> Result<(), SceneError> {
        let parent = self.parent_pose(key);
        let obj = self.objects.get_mut(key).ok_or(SceneError::UnknownObject)?;
        obj.transform.set_world_position(position, parent);
        Ok(())
    }

    /// Rotate an object so its world rotation becomes `degrees`
    pub fn set_world_rotation(&mut self, key: ObjectKey, degrees: f32) -> Result<(), SceneError> {
        let parent = self.parent_pose(key);
        let obj = self.objects.get_mut(key).ok_or(SceneError::UnknownObject)?;
        obj.transform.set_world_rotation(degrees, parent);
        Ok(())
    }

    /// Translate an object in world space
    pub fn translate(&mut self, key: ObjectKey, delta: Vec2) -> Result<(), SceneError> {
        let position = self.world_position(key).ok_or(SceneError::UnknownObject)?;
        self.set_world_position(key, position + delta)
    }

    /// Add to an object's local rotation
    pub fn rotate(&mut self, key: ObjectKey, degrees: f32) -> Result<(), SceneError> {
        let obj = self.objects.get_mut(key).ok_or(SceneError::UnknownObject)?;
        obj.transform.rotate(degrees);
        Ok(())
    }

    /// Unit vector along the object's world rotation
    pub fn facing(&self, key: ObjectKey) -> Option<Vec2> {
        self.world_rotation(key).map(Vec2::from_angle)
    }

    /// Turn an object to face a direction; a zero direction faces +X
    pub fn set_facing(&mut self, key: ObjectKey, direction: Vec2) -> Result<(), SceneError> {
        self.set_world_rotation(key, direction.angle())
    }
}

impl ObjectSource<ObjectKey> for World {
    fn collider(&self, key: ObjectKey) -> Option<PlacedCollider<'_>> {
        let collider = self.objects.get(key)?.collider.as_ref()?;
        Some(collider.placed(self.world_pose(key)?))
    }

    fn collision_layers(&self, key: ObjectKey) -> LayerMask {
        self.objects
            .get(key)
            .and_then(|obj| obj.physics.as_ref())
            .map_or(LayerMask::NONE, |binding| binding.collision_layers)
    }
}
