//! Physics world: one spatial grid per collision layer

use std::fmt::Debug;
use std::hash::Hash;

use jazz2d_math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::collider::{Collider, PlacedCollider, Pose};
use crate::collision::{self, Penetration};
use crate::error::PhysicsError;
use crate::grid::{ObjectSource, SpatialGrid};
use crate::layers::LayerMask;
use crate::shapes::ShapeKind;

/// Configuration for the collision engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Edge length of a grid cell in world units
    pub cell_size: f32,
    /// Number of collision layers (one grid each)
    pub layer_count: usize,
    /// Smallest query margin in cells
    pub min_query_margin: i32,
    /// Extra distance added to every body separation push
    pub resolution_slop: f32,
    /// How many times a push may chain through dynamic bodies
    pub max_push_depth: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            cell_size: 50.0,
            layer_count: 4,
            min_query_margin: 1,
            resolution_slop: 0.0,
            max_push_depth: 8,
        }
    }
}

impl PhysicsConfig {
    /// Set the grid cell size
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the number of collision layers
    pub fn with_layer_count(mut self, layer_count: usize) -> Self {
        self.layer_count = layer_count;
        self
    }

    /// Set the separation slop
    pub fn with_resolution_slop(mut self, slop: f32) -> Self {
        self.resolution_slop = slop;
        self
    }
}

/// Anything that can be resolved to a collider for a narrow phase test
#[derive(Clone, Copy, Debug)]
pub enum CollisionTarget<'a, K> {
    /// A registered object, looked up through the object source
    Object(K),
    /// A collider already placed in the world
    Collider(PlacedCollider<'a>),
    /// A plain rectangle, tested as a temporary rectangle collider
    Rect(Rect),
}

impl<'a, K> From<PlacedCollider<'a>> for CollisionTarget<'a, K> {
    fn from(placed: PlacedCollider<'a>) -> Self {
        CollisionTarget::Collider(placed)
    }
}

impl<'a, K> From<Rect> for CollisionTarget<'a, K> {
    fn from(rect: Rect) -> Self {
        CollisionTarget::Rect(rect)
    }
}

/// A collision target resolved to geometry
#[derive(Debug)]
pub enum ResolvedCollider<'a> {
    Borrowed(PlacedCollider<'a>),
    Owned(Collider, Pose),
}

impl<'a> ResolvedCollider<'a> {
    pub fn view(&self) -> PlacedCollider<'_> {
        match self {
            ResolvedCollider::Borrowed(placed) => *placed,
            ResolvedCollider::Owned(collider, pose) => collider.placed(*pose),
        }
    }
}

/// The per-layer broad phase
///
/// Objects are registered under their `layers` mask and query the grids of
/// their `collision_layers` mask. Every grid is rebuilt once per tick by
/// [`PhysicsWorld::build_grid`].
#[derive(Clone, Debug)]
pub struct PhysicsWorld<K> {
    grids: Vec<SpatialGrid<K>>,
    /// Physics configuration
    pub config: PhysicsConfig,
}

impl<K: Copy + Eq + Hash + Debug> Default for PhysicsWorld<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash + Debug> PhysicsWorld<K> {
    /// Create a physics world with the default configuration
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Create a physics world with a custom configuration
    pub fn with_config(config: PhysicsConfig) -> Self {
        let layer_count = config.layer_count.min(LayerMask::MAX_LAYERS);
        let grids = (0..layer_count)
            .map(|_| SpatialGrid::new(config.cell_size, config.min_query_margin))
            .collect();
        Self { grids, config }
    }

    pub fn layer_count(&self) -> usize {
        self.grids.len()
    }

    /// The grid of one layer
    pub fn layer(&self, index: usize) -> Option<&SpatialGrid<K>> {
        self.grids.get(index)
    }

    fn check_mask(&self, layers: LayerMask) -> Result<(), PhysicsError> {
        match layers.highest() {
            Some(index) if index >= self.grids.len() => Err(PhysicsError::InvalidLayers(format!(
                "layer {} does not exist, the world has {} layers",
                index,
                self.grids.len()
            ))),
            _ => Ok(()),
        }
    }

    /// Register an object in the grid of every layer set in `layers`
    ///
    /// Fails with [`PhysicsError::InvalidLayers`] if the mask names a layer
    /// past the configured count. Registering twice is harmless.
    pub fn add_physics_object(&mut self, key: K, layers: LayerMask) -> Result<(), PhysicsError> {
        self.check_mask(layers)?;
        for index in layers.indices() {
            self.grids[index].add_object(key);
        }
        log::debug!("Registered physics object {:?} on layers {:?}", key, layers);
        Ok(())
    }

    /// Remove an object from every layer grid
    pub fn remove_physics_object(&mut self, key: K) {
        for grid in &mut self.grids {
            grid.remove_object(key);
        }
    }

    /// Whether the object is registered on any layer
    pub fn contains(&self, key: K) -> bool {
        self.grids.iter().any(|grid| grid.contains(key))
    }

    /// Rebuild every layer grid; call once at the start of a tick
    pub fn build_grid<S: ObjectSource<K>>(&mut self, source: &S) {
        for grid in &mut self.grids {
            grid.build_grid(source);
        }
    }

    /// Broad phase candidates of an object across its collision layers
    ///
    /// Results are concatenated layer by layer, so an object present on
    /// several queried layers appears once per layer.
    pub fn get_aabb_collisions<S: ObjectSource<K>>(&self, source: &S, key: K) -> Result<Vec<K>, PhysicsError> {
        let placed = source.collider(key).ok_or_else(|| {
            PhysicsError::InvalidCollider(format!("object {:?} has no collider to query with", key))
        })?;
        let rect = placed.bounding_rect();

        let mut found = Vec::new();
        for index in source.collision_layers(key).indices() {
            if let Some(grid) = self.grids.get(index) {
                found.extend(grid.query_rect(source, &rect, Some(key)));
            }
        }
        Ok(found)
    }

    /// Broad phase candidates of an object on a single layer
    pub fn get_layer_collisions<S: ObjectSource<K>>(
        &self,
        source: &S,
        key: K,
        layer: usize,
    ) -> Result<Vec<K>, PhysicsError> {
        let grid = self.grids.get(layer).ok_or_else(|| {
            PhysicsError::InvalidLayers(format!("layer {} does not exist", layer))
        })?;
        grid.get_aabb_collisions(source, key)
    }

    /// Objects on the given layers whose bounding box overlaps `rect`
    pub fn query_rect<S: ObjectSource<K>>(&self, source: &S, rect: &Rect, layers: LayerMask) -> Vec<K> {
        let mut found = Vec::new();
        for index in layers.indices() {
            if let Some(grid) = self.grids.get(index) {
                found.extend(grid.query_rect(source, rect, None));
            }
        }
        found
    }

    /// Resolve a collision target to geometry
    ///
    /// Objects without a collider and empty rectangles fail with
    /// [`PhysicsError::InvalidCollider`].
    pub fn resolve<'a, S: ObjectSource<K>>(
        source: &'a S,
        target: CollisionTarget<'a, K>,
    ) -> Result<ResolvedCollider<'a>, PhysicsError> {
        match target {
            CollisionTarget::Object(key) => source
                .collider(key)
                .map(ResolvedCollider::Borrowed)
                .ok_or_else(|| PhysicsError::InvalidCollider(format!("object {:?} has no collider", key))),
            CollisionTarget::Collider(placed) => Ok(ResolvedCollider::Borrowed(placed)),
            CollisionTarget::Rect(rect) => {
                let (collider, pose) = Collider::from_rect(&rect).map_err(|e| {
                    PhysicsError::InvalidCollider(format!("rect {:?} is not a usable collider: {}", rect, e))
                })?;
                Ok(ResolvedCollider::Owned(collider, pose))
            }
        }
    }

    /// SAT overlap between two targets, normal oriented from `a` to `b`
    pub fn collide_sat<S: ObjectSource<K>>(
        &self,
        source: &S,
        a: CollisionTarget<'_, K>,
        b: CollisionTarget<'_, K>,
    ) -> Result<Penetration, PhysicsError> {
        let a = Self::resolve(source, a)?;
        let b = Self::resolve(source, b)?;
        Ok(collision::collide_sat(&a.view(), &b.view()))
    }

    /// Cast a ray target against another target
    ///
    /// Fails with [`PhysicsError::InvalidCollider`] when `ray` does not
    /// resolve to a Ray collider.
    pub fn collide_ray<S: ObjectSource<K>>(
        &self,
        source: &S,
        ray: CollisionTarget<'_, K>,
        target: CollisionTarget<'_, K>,
    ) -> Result<Option<Vec2>, PhysicsError> {
        let ray = Self::resolve(source, ray)?;
        let target = Self::resolve(source, target)?;
        let ray = ray.view();
        if ray.kind() != ShapeKind::Ray {
            return Err(PhysicsError::InvalidCollider(format!(
                "ray casts need a Ray collider, got {}",
                ray.kind()
            )));
        }
        Ok(collision::ray_cast(&ray, &target.view()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    struct Entry {
        collider: Option<Collider>,
        pose: Pose,
        collision_layers: LayerMask,
    }

    struct Objects(Vec<Entry>);

    impl Objects {
        fn push(&mut self, collider: Option<Collider>, position: Vec2, collision_layers: LayerMask) -> usize {
            self.0.push(Entry { collider, pose: Pose::at(position), collision_layers });
            self.0.len() - 1
        }
    }

    impl ObjectSource<usize> for Objects {
        fn collider(&self, key: usize) -> Option<PlacedCollider<'_>> {
            let entry = self.0.get(key)?;
            entry.collider.as_ref().map(|c| c.placed(entry.pose))
        }

        fn collision_layers(&self, key: usize) -> LayerMask {
            self.0.get(key).map_or(LayerMask::NONE, |e| e.collision_layers)
        }
    }

    fn square(size: f32) -> Option<Collider> {
        Some(Collider::rectangle(size, size).unwrap())
    }

    #[test]
    fn test_default_config() {
        let config = PhysicsConfig::default();
        assert_eq!(config.cell_size, 50.0);
        assert_eq!(config.layer_count, 4);
        let world: PhysicsWorld<usize> = PhysicsWorld::new();
        assert_eq!(world.layer_count(), 4);
    }

    #[test]
    fn test_add_rejects_missing_layers() {
        let mut world: PhysicsWorld<usize> = PhysicsWorld::new();
        let err = world.add_physics_object(0, LayerMask::layer(4).unwrap()).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidLayers(_)));
        assert!(!world.contains(0));
    }

    #[test]
    fn test_multi_layer_membership() {
        let mut world: PhysicsWorld<usize> = PhysicsWorld::new();
        world.add_physics_object(7, "0101".parse().unwrap()).unwrap();
        assert!(world.layer(1).unwrap().contains(7));
        assert!(world.layer(3).unwrap().contains(7));
        assert!(!world.layer(0).unwrap().contains(7));

        world.remove_physics_object(7);
        world.remove_physics_object(7);
        assert!(!world.contains(7));
    }

    #[test]
    fn test_layer_filtered_queries() {
        let mut objects = Objects(Vec::new());
        let query = objects.push(square(10.0), Vec2::ZERO, "1000".parse().unwrap());
        let same_layer = objects.push(square(10.0), Vec2::new(5.0, 0.0), LayerMask::NONE);
        let other_layer = objects.push(square(10.0), Vec2::new(-5.0, 0.0), LayerMask::NONE);

        let mut world = PhysicsWorld::new();
        world.add_physics_object(query, LayerMask::LAYER_0).unwrap();
        world.add_physics_object(same_layer, LayerMask::LAYER_0).unwrap();
        world.add_physics_object(other_layer, LayerMask::LAYER_2).unwrap();
        world.build_grid(&objects);

        assert_eq!(world.get_aabb_collisions(&objects, query).unwrap(), vec![same_layer]);
        assert_eq!(world.get_layer_collisions(&objects, query, 2).unwrap(), vec![other_layer]);
        assert!(world.get_layer_collisions(&objects, query, 9).is_err());
    }

    #[test]
    fn test_cross_layer_duplicates_kept() {
        let mut objects = Objects(Vec::new());
        let query = objects.push(square(10.0), Vec2::ZERO, "1100".parse().unwrap());
        let both = objects.push(square(10.0), Vec2::new(3.0, 3.0), LayerMask::NONE);

        let mut world = PhysicsWorld::new();
        world.add_physics_object(both, "1100".parse().unwrap()).unwrap();
        world.build_grid(&objects);

        assert_eq!(world.get_aabb_collisions(&objects, query).unwrap(), vec![both, both]);
    }

    #[test]
    fn test_query_without_collider() {
        let mut objects = Objects(Vec::new());
        let ghost = objects.push(None, Vec2::ZERO, LayerMask::default());
        let world: PhysicsWorld<usize> = PhysicsWorld::new();
        let err = world.get_aabb_collisions(&objects, ghost).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidCollider(_)));
    }

    #[test]
    fn test_collide_sat_with_rect_target() {
        let mut objects = Objects(Vec::new());
        let body = objects.push(square(10.0), Vec2::ZERO, LayerMask::default());
        let world: PhysicsWorld<usize> = PhysicsWorld::new();

        let hit = world
            .collide_sat(&objects, CollisionTarget::Object(body), Rect::new(3.0, -5.0, 13.0, 5.0).into())
            .unwrap();
        assert!((hit.depth - 2.0).abs() < EPSILON);
        assert!(hit.normal.approx_eq(Vec2::X, EPSILON));

        let err = world
            .collide_sat(&objects, CollisionTarget::Object(body), Rect::new(3.0, 0.0, 3.0, 5.0).into())
            .unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidCollider(_)));
    }

    #[test]
    fn test_collide_sat_unknown_object() {
        let objects = Objects(Vec::new());
        let world: PhysicsWorld<usize> = PhysicsWorld::new();
        let result = world.collide_sat(&objects, CollisionTarget::Object(0), CollisionTarget::Object(1));
        assert!(matches!(result, Err(PhysicsError::InvalidCollider(_))));
    }

    #[test]
    fn test_collide_ray() {
        let mut objects = Objects(Vec::new());
        let ray = objects.push(Some(Collider::ray(20.0).unwrap()), Vec2::ZERO, LayerMask::default());
        let ball = objects.push(Some(Collider::circle(3.0).unwrap()), Vec2::new(10.0, 0.0), LayerMask::default());
        let world: PhysicsWorld<usize> = PhysicsWorld::new();

        let hit = world
            .collide_ray(&objects, CollisionTarget::Object(ray), CollisionTarget::Object(ball))
            .unwrap()
            .expect("ray should hit");
        assert!(hit.approx_eq(Vec2::new(7.0, 0.0), EPSILON));

        let err = world
            .collide_ray(&objects, CollisionTarget::Object(ball), CollisionTarget::Object(ray))
            .unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidCollider(_)));
    }

    #[test]
    fn test_query_rect_by_mask() {
        let mut objects = Objects(Vec::new());
        let a = objects.push(square(10.0), Vec2::ZERO, LayerMask::NONE);
        let b = objects.push(square(10.0), Vec2::new(2.0, 0.0), LayerMask::NONE);

        let mut world = PhysicsWorld::new();
        world.add_physics_object(a, LayerMask::LAYER_0).unwrap();
        world.add_physics_object(b, LayerMask::LAYER_1).unwrap();
        world.build_grid(&objects);

        let rect = Rect::new(-1.0, -1.0, 1.0, 1.0);
        assert_eq!(world.query_rect(&objects, &rect, LayerMask::LAYER_0), vec![a]);
        assert_eq!(world.query_rect(&objects, &rect, "11".parse().unwrap()), vec![a, b]);
    }
}
