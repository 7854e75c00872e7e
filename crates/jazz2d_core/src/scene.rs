//! Runtime scene: objects plus the collision engine
//!
//! A [`Scene`] owns its [`World`] and its [`PhysicsWorld`] and wires them
//! together: loading an object registers it with the layer grids, removing
//! it unregisters its whole subtree, and [`Scene::fixed_update`] rebuilds the
//! grids before refreshing every active ray and area.

use std::collections::HashSet;

use jazz2d_math::{Rect, Vec2};
use jazz2d_physics::{
    collide_sat, ray_cast, Collider, CollisionTarget, DebugLine, LayerMask, ObjectSource, Penetration,
    PhysicsConfig, PhysicsError, PhysicsWorld, PlacedCollider, Pose, ShapeKind,
};

use crate::error::SceneError;
use crate::object::{PhysicsRole, RayHit, SceneObject};
use crate::world::{ObjectKey, World};

/// A resolved overlap reported by [`Scene::move_and_collide`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// The object collided with
    pub object: ObjectKey,
    /// Overlap before resolution, normal pointing from the mover to `object`
    pub penetration: Penetration,
}

/// Keep the first occurrence of each key
fn unique(keys: Vec<ObjectKey>) -> Vec<ObjectKey> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(*k)).collect()
}

/// A live scene with objects and physics
pub struct Scene {
    /// Scene name (for display/debugging)
    pub name: String,
    world: World,
    physics: PhysicsWorld<ObjectKey>,
}

impl Scene {
    /// Create an empty scene with the default physics configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, PhysicsConfig::default())
    }

    /// Create an empty scene with a custom physics configuration
    pub fn with_config(name: impl Into<String>, config: PhysicsConfig) -> Self {
        Self {
            name: name.into(),
            world: World::new(),
            physics: PhysicsWorld::with_config(config),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the objects
    ///
    /// Objects inserted or removed through this bypass the physics lifecycle;
    /// use [`Scene::add_object`] and [`Scene::remove_object`] for that.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn physics(&self) -> &PhysicsWorld<ObjectKey> {
        &self.physics
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.physics.config
    }

    // --- Lifecycle ---

    /// Add a root object and run its load hook
    ///
    /// If loading fails the object is not kept.
    pub fn add_object(&mut self, object: SceneObject) -> Result<ObjectKey, SceneError> {
        let key = self.world.insert(object);
        if let Err(e) = self.on_object_loaded(key) {
            self.world.remove(key);
            return Err(e);
        }
        Ok(key)
    }

    /// Add an object under `parent` and run its load hook
    pub fn add_child_object(&mut self, parent: ObjectKey, object: SceneObject) -> Result<ObjectKey, SceneError> {
        if !self.world.contains(parent) {
            return Err(SceneError::UnknownObject);
        }
        let key = self.world.insert(object);
        let loaded = self
            .world
            .add_child(parent, key)
            .and_then(|()| self.on_object_loaded(key));
        if let Err(e) = loaded {
            self.world.remove(key);
            return Err(e);
        }
        Ok(key)
    }

    /// Register a loaded physics object with the layer grids
    ///
    /// Objects without a physics binding are ignored. A physics object
    /// without a collider fails with [`SceneError::MissingCollider`].
    pub fn on_object_loaded(&mut self, key: ObjectKey) -> Result<(), SceneError> {
        let obj = self.world.get(key).ok_or(SceneError::UnknownObject)?;
        let Some(binding) = &obj.physics else {
            return Ok(());
        };
        if obj.collider.is_none() {
            return Err(SceneError::MissingCollider(obj.display_name().to_string()));
        }
        let layers = binding.layers;
        log::debug!("Loaded physics object '{}'", obj.display_name());
        self.physics.add_physics_object(key, layers)?;
        Ok(())
    }

    /// Unregister an object from every layer grid
    pub fn on_object_removed(&mut self, key: ObjectKey) {
        self.physics.remove_physics_object(key);
    }

    /// Remove an object and its subtree, unregistering every physics object
    pub fn remove_object(&mut self, key: ObjectKey) -> Result<Vec<SceneObject>, SceneError> {
        if !self.world.contains(key) {
            return Err(SceneError::UnknownObject);
        }
        let removed = self.world.remove(key);
        for (k, obj) in &removed {
            if obj.physics.is_some() {
                log::debug!("Unloaded physics object '{}'", obj.display_name());
            }
            self.on_object_removed(*k);
        }
        Ok(removed.into_iter().map(|(_, obj)| obj).collect())
    }

    // --- Tick ---

    /// Rebuild every layer grid from current positions
    pub fn build_grid(&mut self) {
        self.physics.build_grid(&self.world);
    }

    /// Advance one fixed step
    ///
    /// Rebuilds the grids, then refreshes every active ray's hit and every
    /// active area's entered list. Query failures are logged and skipped.
    pub fn fixed_update(&mut self) {
        self.build_grid();

        let mut rays = Vec::new();
        let mut areas = Vec::new();
        for (key, obj) in self.world.iter() {
            match obj.physics.as_ref().map(|b| &b.role) {
                Some(PhysicsRole::Ray(state)) if state.active => rays.push((key, state.blacklist.clone())),
                Some(PhysicsRole::Area(state)) if state.active => areas.push(key),
                _ => {}
            }
        }

        for (key, blacklist) in rays {
            match self.cast(key, &blacklist) {
                Ok(hit) => {
                    if let Some(PhysicsRole::Ray(state)) = self.role_mut(key) {
                        state.hit = hit;
                    }
                }
                Err(e) => log::warn!("Ray cast skipped: {}", e),
            }
        }

        for key in areas {
            match self.get_entered(key) {
                Ok(entered) => {
                    if let Some(PhysicsRole::Area(state)) = self.role_mut(key) {
                        state.entered = entered;
                    }
                }
                Err(e) => log::warn!("Area update skipped: {}", e),
            }
        }
    }

    fn role_mut(&mut self, key: ObjectKey) -> Option<&mut PhysicsRole> {
        self.world.get_mut(key)?.physics.as_mut().map(|b| &mut b.role)
    }

    // --- Queries ---

    /// Broad phase candidates of an object across its collision layers
    pub fn get_aabb_collisions(&self, key: ObjectKey) -> Result<Vec<ObjectKey>, SceneError> {
        Ok(self.physics.get_aabb_collisions(&self.world, key)?)
    }

    /// Broad phase candidates of an object on a single layer
    pub fn get_layer_collisions(&self, key: ObjectKey, layer: usize) -> Result<Vec<ObjectKey>, SceneError> {
        Ok(self.physics.get_layer_collisions(&self.world, key, layer)?)
    }

    /// Objects on `layers` whose bounding box overlaps `rect`
    pub fn query_rect(&self, rect: &Rect, layers: LayerMask) -> Vec<ObjectKey> {
        unique(self.physics.query_rect(&self.world, rect, layers))
    }

    /// SAT overlap between two targets
    pub fn collide_sat(
        &self,
        a: CollisionTarget<'_, ObjectKey>,
        b: CollisionTarget<'_, ObjectKey>,
    ) -> Result<Penetration, SceneError> {
        Ok(self.physics.collide_sat(&self.world, a, b)?)
    }

    /// Cast a ray target against another target
    pub fn collide_ray(
        &self,
        ray: CollisionTarget<'_, ObjectKey>,
        target: CollisionTarget<'_, ObjectKey>,
    ) -> Result<Option<Vec2>, SceneError> {
        Ok(self.physics.collide_ray(&self.world, ray, target)?)
    }

    fn placed(&self, key: ObjectKey) -> Result<PlacedCollider<'_>, SceneError> {
        let obj = self.world.get(key).ok_or(SceneError::UnknownObject)?;
        self.world
            .collider(key)
            .ok_or_else(|| SceneError::MissingCollider(obj.display_name().to_string()))
    }

    // --- Bodies ---

    /// Move a body and push it out of everything it now overlaps
    ///
    /// Candidates are resolved nearest first. Two dynamic bodies each move
    /// half the depth; a static body pushes the other the full depth; a
    /// dynamic body is pushed out of a static one. Static pairs and
    /// non-body candidates are left alone. Returns the overlaps found.
    pub fn move_and_collide(&mut self, key: ObjectKey, delta: Vec2) -> Result<Vec<Contact>, SceneError> {
        self.move_and_collide_chained(key, delta, 0)
    }

    fn move_and_collide_chained(
        &mut self,
        key: ObjectKey,
        delta: Vec2,
        chain: u32,
    ) -> Result<Vec<Contact>, SceneError> {
        let obj = self.world.get(key).ok_or(SceneError::UnknownObject)?;
        let is_static = match obj.physics.as_ref().map(|b| &b.role) {
            Some(PhysicsRole::Body { is_static }) => *is_static,
            _ => {
                return Err(PhysicsError::InvalidCollider(format!(
                    "'{}' is not a body",
                    obj.display_name()
                ))
                .into())
            }
        };

        self.world.translate(key, delta)?;

        let position = self.world.world_position(key).ok_or(SceneError::UnknownObject)?;
        let mut candidates = unique(self.get_aabb_collisions(key)?);
        candidates.sort_by(|a, b| {
            let da = self.world.world_position(*a).map_or(f32::INFINITY, |p| position.distance(p));
            let db = self.world.world_position(*b).map_or(f32::INFINITY, |p| position.distance(p));
            da.total_cmp(&db)
        });

        let slop = self.physics.config.resolution_slop;
        let max_chain = self.physics.config.max_push_depth;
        let mut contacts = Vec::new();

        for other in candidates {
            let Some(other_obj) = self.world.get(other) else {
                continue;
            };
            let other_static = match other_obj.physics.as_ref().map(|b| &b.role) {
                Some(PhysicsRole::Body { is_static }) => *is_static,
                _ => continue,
            };
            if is_static && other_static {
                continue;
            }

            let penetration = collide_sat(&self.placed(key)?, &self.placed(other)?);
            if penetration.depth == 0.0 {
                continue;
            }
            contacts.push(Contact { object: other, penetration });

            let push = penetration.normal * (penetration.depth + slop);
            if !is_static && !other_static {
                self.world.translate(key, -push * 0.5)?;
                self.push_body(other, push * 0.5, chain, max_chain)?;
            } else if is_static {
                self.push_body(other, push, chain, max_chain)?;
            } else {
                self.world.translate(key, -push)?;
            }
        }

        Ok(contacts)
    }

    fn push_body(&mut self, key: ObjectKey, delta: Vec2, chain: u32, max_chain: u32) -> Result<(), SceneError> {
        if chain < max_chain {
            self.move_and_collide_chained(key, delta, chain + 1)?;
        } else {
            self.world.translate(key, delta)?;
        }
        Ok(())
    }

    // --- Rays ---

    /// Every hit of a placed ray among `candidates`, nearest first
    fn ray_hits(
        &self,
        ray: &PlacedCollider<'_>,
        candidates: Vec<ObjectKey>,
        skip: impl Fn(ObjectKey) -> bool,
    ) -> Vec<RayHit> {
        let origin = ray.pose.position;
        let mut hits: Vec<RayHit> = unique(candidates)
            .into_iter()
            .filter(|&k| !skip(k))
            .filter_map(|k| {
                let target = self.world.collider(k)?;
                ray_cast(ray, &target).map(|point| RayHit { object: k, point })
            })
            .collect();
        hits.sort_by(|a, b| origin.distance(a.point).total_cmp(&origin.distance(b.point)));
        hits
    }

    fn placed_ray(&self, key: ObjectKey) -> Result<(PlacedCollider<'_>, f32), SceneError> {
        let ray = self.placed(key)?;
        let length = ray.collider.ray_length().ok_or_else(|| {
            PhysicsError::InvalidCollider(format!("ray casts need a Ray collider, got {}", ray.kind()))
        })?;
        Ok((ray, length))
    }

    /// Closest hit of a ray object within its length
    ///
    /// Objects sharing the ray's root and blacklisted objects are ignored.
    pub fn cast(&self, key: ObjectKey, blacklist: &[ObjectKey]) -> Result<Option<RayHit>, SceneError> {
        let (ray, length) = self.placed_ray(key)?;
        let origin = ray.pose.position;
        let candidates = self.get_aabb_collisions(key)?;
        let hits = self.ray_hits(&ray, candidates, |k| blacklist.contains(&k) || self.world.same_root(key, k));
        Ok(hits.into_iter().find(|hit| origin.distance(hit.point) <= length))
    }

    /// Every hit of a ray object, nearest first
    ///
    /// Only blacklisted objects are ignored.
    pub fn cast_all(&self, key: ObjectKey, blacklist: &[ObjectKey]) -> Result<Vec<RayHit>, SceneError> {
        let (ray, _) = self.placed_ray(key)?;
        let candidates = self.get_aabb_collisions(key)?;
        Ok(self.ray_hits(&ray, candidates, |k| blacklist.contains(&k)))
    }

    /// Change the length of a ray object
    pub fn set_ray_length(&mut self, key: ObjectKey, length: f32) -> Result<(), SceneError> {
        let obj = self.world.get_mut(key).ok_or(SceneError::UnknownObject)?;
        let name = obj.display_name().to_string();
        let collider = obj.collider.as_mut().ok_or(SceneError::MissingCollider(name))?;
        collider.set_ray_length(length)?;
        Ok(())
    }

    /// Last hit recorded for a ray object by [`Scene::fixed_update`]
    pub fn ray_hit(&self, key: ObjectKey) -> Option<RayHit> {
        match self.world.get(key)?.physics.as_ref().map(|b| &b.role) {
            Some(PhysicsRole::Ray(state)) => state.hit,
            _ => None,
        }
    }

    /// Cast a temporary ray from `start` to `end` against the given layers
    ///
    /// Returns `None` when `start` and `end` coincide.
    pub fn physics_raycast(
        &self,
        start: Vec2,
        end: Vec2,
        layers: LayerMask,
        blacklist: &[ObjectKey],
    ) -> Result<Option<RayHit>, SceneError> {
        let length = start.distance(end);
        if length == 0.0 {
            return Ok(None);
        }
        let ray = Collider::ray(length)?;
        let placed = ray.placed(Pose::new(start, start.direction_to(end).angle()));
        let candidates = self.physics.query_rect(&self.world, &placed.bounding_rect(), layers);
        let hits = self.ray_hits(&placed, candidates, |k| blacklist.contains(&k));
        Ok(hits.into_iter().find(|hit| start.distance(hit.point) <= length))
    }

    // --- Areas ---

    /// Objects whose SAT overlap with an area is nonzero, nearest first
    ///
    /// Objects sharing the area's root are ignored, and when the area has a
    /// target group only objects tagged with it count.
    pub fn get_entered(&self, key: ObjectKey) -> Result<Vec<ObjectKey>, SceneError> {
        let area = self.placed(key)?;
        let target_group = match self.world.get(key).and_then(|o| o.physics.as_ref()).map(|b| &b.role) {
            Some(PhysicsRole::Area(state)) => state.target_group.clone(),
            _ => None,
        };
        let position = area.pose.position;

        let mut candidates = unique(self.get_aabb_collisions(key)?);
        candidates.sort_by(|a, b| {
            let da = self.world.world_position(*a).map_or(f32::INFINITY, |p| position.distance(p));
            let db = self.world.world_position(*b).map_or(f32::INFINITY, |p| position.distance(p));
            da.total_cmp(&db)
        });

        let entered = candidates
            .into_iter()
            .filter(|&k| {
                target_group
                    .as_deref()
                    .map_or(true, |group| self.world.get(k).map_or(false, |o| o.has_tag(group)))
            })
            .filter(|&k| !self.world.same_root(key, k))
            .filter(|&k| {
                self.world
                    .collider(k)
                    .map_or(false, |other| collide_sat(&area, &other).depth != 0.0)
            })
            .collect();
        Ok(entered)
    }

    /// Entered list recorded for an area by [`Scene::fixed_update`]
    pub fn entered(&self, key: ObjectKey) -> &[ObjectKey] {
        match self.world.get(key).and_then(|o| o.physics.as_ref()).map(|b| &b.role) {
            Some(PhysicsRole::Area(state)) => state.entered.as_slice(),
            _ => &[],
        }
    }

    // --- Debug ---

    /// Debug lines for every collider in the scene
    pub fn debug_lines(&self) -> Vec<DebugLine> {
        self.world
            .iter()
            .filter_map(|(key, _)| self.world.collider(key))
            .flat_map(|placed| placed.debug_lines())
            .collect()
    }

    /// Number of objects with a collider of the given shape
    pub fn count_shapes(&self, kind: ShapeKind) -> usize {
        self.world
            .iter()
            .filter(|(_, obj)| obj.collider.as_ref().map_or(false, |c| c.kind() == kind))
            .count()
    }
}
