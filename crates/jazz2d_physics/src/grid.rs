//! Uniform spatial hash grid for broad phase pruning
//!
//! The grid keeps an authoritative membership list and a cell-to-members
//! mapping that is rebuilt from scratch once per tick. Members are looked up
//! through an [`ObjectSource`], so the grid itself only stores keys.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use jazz2d_math::Rect;

use crate::collider::PlacedCollider;
use crate::error::PhysicsError;
use crate::layers::LayerMask;

/// Read access to the objects the physics engine works on
pub trait ObjectSource<K> {
    /// The object's collider at its current world pose, if it has one
    fn collider(&self, key: K) -> Option<PlacedCollider<'_>>;

    /// Layers whose grids the object queries
    fn collision_layers(&self, key: K) -> LayerMask;
}

/// Largest cell coordinate magnitude; farther objects share the edge cells
const MAX_CELL: i32 = 1 << 30;

/// Pack a signed cell coordinate pair into one bucket key
#[inline]
fn cell_key(x: i32, y: i32) -> u64 {
    ((x as u32 as u64) << 32) | (y as u32 as u64)
}

/// Inclusive range of cells covered by a rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CellRange {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

/// A uniform spatial hash over object keys
#[derive(Clone, Debug)]
pub struct SpatialGrid<K> {
    cell_size: f32,
    /// Lower bound on the query margin, in cells
    min_margin: i32,
    /// Query margin derived by the last build, in cells
    margin: i32,
    objects: Vec<K>,
    cells: HashMap<u64, Vec<K>>,
}

impl<K: Copy + Eq + Hash + Debug> SpatialGrid<K> {
    /// Create an empty grid with the given cell size and minimum query margin
    pub fn new(cell_size: f32, min_margin: i32) -> Self {
        let min_margin = min_margin.max(0);
        Self {
            cell_size,
            min_margin,
            margin: min_margin,
            objects: Vec::new(),
            cells: HashMap::new(),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Query margin in cells, as of the last build
    #[inline]
    pub fn margin(&self) -> i32 {
        self.margin
    }

    /// Registered members, in insertion order
    pub fn objects(&self) -> &[K] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.objects.contains(&key)
    }

    /// Number of occupied cells after the last build
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Register a member. Adding an existing member does nothing.
    pub fn add_object(&mut self, key: K) {
        if !self.objects.contains(&key) {
            self.objects.push(key);
        }
    }

    /// Unregister a member. Removing an unknown key does nothing.
    ///
    /// The buckets keep the key until the next build.
    pub fn remove_object(&mut self, key: K) {
        self.objects.retain(|&k| k != key);
    }

    /// Cell coordinate of a world coordinate, clamped to [`MAX_CELL`]
    fn cell_coord(&self, value: f32) -> i32 {
        let cell = (value / self.cell_size).floor();
        cell.clamp(-MAX_CELL as f32, MAX_CELL as f32) as i32
    }

    fn cell_range(&self, rect: &Rect) -> CellRange {
        CellRange {
            x0: self.cell_coord(rect.left),
            y0: self.cell_coord(rect.top),
            x1: self.cell_coord(rect.right),
            y1: self.cell_coord(rect.bottom),
        }
    }

    /// Rebuild every bucket from the membership list
    ///
    /// Each member is inserted into every cell its bounding box touches,
    /// boundaries included. Members without a collider are skipped.
    pub fn build_grid<S: ObjectSource<K>>(&mut self, source: &S) {
        self.cells.clear();
        let mut max_extent: f32 = 0.0;
        let mut skipped = 0;

        for &key in &self.objects {
            let Some(placed) = source.collider(key) else {
                log::warn!("Physics object {:?} has no collider, leaving it out of the grid", key);
                skipped += 1;
                continue;
            };
            let rect = placed.bounding_rect();
            max_extent = max_extent.max(rect.width()).max(rect.height());

            let range = self.cell_range(&rect);
            for x in range.x0..=range.x1 {
                for y in range.y0..=range.y1 {
                    self.cells.entry(cell_key(x, y)).or_default().push(key);
                }
            }
        }

        let extent_cells = (max_extent / self.cell_size).ceil().min(MAX_CELL as f32) as i32;
        self.margin = self.min_margin.max(extent_cells);

        log::debug!(
            "Rebuilt grid: {} members ({} skipped), {} cells, margin {}",
            self.objects.len(),
            skipped,
            self.cells.len(),
            self.margin
        );
    }

    /// Members of the `w` x `h` block of cells starting at `(x, y)`
    ///
    /// Each member appears once, in the order first encountered.
    pub fn get_cells(&self, x: i32, y: i32, w: i32, h: i32) -> Vec<K> {
        if self.objects.is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for cx in x..x.saturating_add(w) {
            for cy in y..y.saturating_add(h) {
                let Some(bucket) = self.cells.get(&cell_key(cx, cy)) else {
                    continue;
                };
                for &key in bucket {
                    if seen.insert(key) {
                        found.push(key);
                    }
                }
            }
        }
        found
    }

    /// Members whose bounding box strictly overlaps `rect`
    ///
    /// The cell window around `rect` is widened by the query margin. `exclude`
    /// is never returned, nor are keys that no longer resolve to a collider.
    pub fn query_rect<S: ObjectSource<K>>(&self, source: &S, rect: &Rect, exclude: Option<K>) -> Vec<K> {
        let range = self.cell_range(rect);
        let m = self.margin;
        let span = |from: i32, to: i32| to.saturating_sub(from).saturating_add(1).saturating_add(m.saturating_mul(2));
        let candidates = self.get_cells(
            range.x0.saturating_sub(m),
            range.y0.saturating_sub(m),
            span(range.x0, range.x1),
            span(range.y0, range.y1),
        );

        candidates
            .into_iter()
            .filter(|&key| Some(key) != exclude)
            .filter(|&key| {
                source
                    .collider(key)
                    .map_or(false, |other| other.bounding_rect().overlaps(rect))
            })
            .collect()
    }

    /// Members whose bounding box strictly overlaps the query object's
    ///
    /// Fails with [`PhysicsError::InvalidCollider`] when the query object has
    /// no collider. The query object is never part of its own result.
    pub fn get_aabb_collisions<S: ObjectSource<K>>(&self, source: &S, key: K) -> Result<Vec<K>, PhysicsError> {
        let placed = source.collider(key).ok_or_else(|| {
            PhysicsError::InvalidCollider(format!("object {:?} has no collider to query with", key))
        })?;
        Ok(self.query_rect(source, &placed.bounding_rect(), Some(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::{Collider, Pose};
    use jazz2d_math::Vec2;

    /// Objects indexed by position in a Vec; `None` entries have no collider
    struct Objects(Vec<Option<(Collider, Pose)>>);

    impl ObjectSource<usize> for Objects {
        fn collider(&self, key: usize) -> Option<PlacedCollider<'_>> {
            self.0
                .get(key)?
                .as_ref()
                .map(|(collider, pose)| collider.placed(*pose))
        }

        fn collision_layers(&self, _key: usize) -> LayerMask {
            LayerMask::default()
        }
    }

    fn square_at(size: f32, x: f32, y: f32) -> Option<(Collider, Pose)> {
        Some((Collider::rectangle(size, size).unwrap(), Pose::at(Vec2::new(x, y))))
    }

    fn grid_with(objects: &Objects) -> SpatialGrid<usize> {
        let mut grid = SpatialGrid::new(50.0, 1);
        for key in 0..objects.0.len() {
            grid.add_object(key);
        }
        grid.build_grid(objects);
        grid
    }

    #[test]
    fn test_cell_key_distinguishes_signs() {
        assert_ne!(cell_key(-1, 0), cell_key(1, 0));
        assert_ne!(cell_key(0, -1), cell_key(-1, 0));
        assert_ne!(cell_key(1, 2), cell_key(2, 1));
    }

    #[test]
    fn test_add_remove_idempotent() {
        let mut grid: SpatialGrid<usize> = SpatialGrid::new(50.0, 1);
        grid.add_object(3);
        grid.add_object(3);
        assert_eq!(grid.len(), 1);

        grid.remove_object(3);
        grid.remove_object(3);
        grid.remove_object(7);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_empty_grid_has_no_cells() {
        let grid: SpatialGrid<usize> = SpatialGrid::new(50.0, 1);
        assert!(grid.get_cells(-10, -10, 20, 20).is_empty());
    }

    #[test]
    fn test_member_occupies_every_touched_cell() {
        // Spans x 30..70 and y -20..20: cells (0,-1), (0,0), (1,-1), (1,0)
        let objects = Objects(vec![square_at(40.0, 50.0, 0.0)]);
        let grid = grid_with(&objects);
        assert_eq!(grid.occupied_cells(), 4);
        assert_eq!(grid.get_cells(1, 0, 1, 1), vec![0]);
        assert_eq!(grid.get_cells(0, -1, 1, 1), vec![0]);
        assert!(grid.get_cells(2, 0, 1, 1).is_empty());
    }

    #[test]
    fn test_get_cells_deduplicates() {
        let objects = Objects(vec![square_at(40.0, 50.0, 0.0), square_at(10.0, 10.0, 10.0)]);
        let grid = grid_with(&objects);
        let found = grid.get_cells(-1, -1, 3, 3);
        assert_eq!(found.len(), 2);
        assert!(found.contains(&0));
        assert!(found.contains(&1));
    }

    #[test]
    fn test_boundary_straddling_pair_is_found() {
        // Size 40 squares at x=48 and x=52 sit in different primary cells
        let objects = Objects(vec![square_at(40.0, 48.0, 0.0), square_at(40.0, 52.0, 0.0)]);
        let grid = grid_with(&objects);
        assert_eq!(grid.get_aabb_collisions(&objects, 0).unwrap(), vec![1]);
        assert_eq!(grid.get_aabb_collisions(&objects, 1).unwrap(), vec![0]);
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let objects = Objects(vec![square_at(10.0, 0.0, 0.0), square_at(10.0, 10.0, 0.0)]);
        let grid = grid_with(&objects);
        assert!(grid.get_aabb_collisions(&objects, 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_excludes_self() {
        let objects = Objects(vec![square_at(10.0, 0.0, 0.0)]);
        let grid = grid_with(&objects);
        assert!(grid.get_aabb_collisions(&objects, 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_without_collider_fails() {
        let objects = Objects(vec![square_at(10.0, 0.0, 0.0), None]);
        let grid = grid_with(&objects);
        let err = grid.get_aabb_collisions(&objects, 1).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidCollider(_)));
    }

    #[test]
    fn test_random_sweep_matches_brute_force() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        // Members cluster around cell boundaries, a few large ones widen the margin
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let entries = (0..60)
                .map(|_| {
                    let x = rng.gen_range(-4..=4) as f32 * 50.0 + rng.gen_range(-3.0..3.0);
                    let y = rng.gen_range(-4..=4) as f32 * 50.0 + rng.gen_range(-3.0..3.0);
                    let size = if rng.gen_bool(0.1) {
                        rng.gen_range(60.0..140.0)
                    } else {
                        rng.gen_range(1.0..40.0)
                    };
                    square_at(size, x, y)
                })
                .collect();
            let objects = Objects(entries);
            let grid = grid_with(&objects);

            for key in 0..objects.0.len() {
                let rect = objects.collider(key).unwrap().bounding_rect();
                let mut expected: Vec<usize> = (0..objects.0.len())
                    .filter(|&other| other != key)
                    .filter(|&other| objects.collider(other).unwrap().bounding_rect().overlaps(&rect))
                    .collect();
                let mut found = grid.get_aabb_collisions(&objects, key).unwrap();
                expected.sort_unstable();
                found.sort_unstable();
                assert_eq!(found, expected, "seed {} object {}", seed, key);
            }
        }
    }

    #[test]
    fn test_margin_tracks_largest_member() {
        let objects = Objects(vec![square_at(10.0, 0.0, 0.0), square_at(180.0, 300.0, 0.0)]);
        let grid = grid_with(&objects);
        assert_eq!(grid.margin(), 4);

        let small = Objects(vec![square_at(10.0, 0.0, 0.0)]);
        assert_eq!(grid_with(&small).margin(), 1);
    }

    #[test]
    fn test_member_without_collider_is_skipped() {
        let objects = Objects(vec![None, square_at(10.0, 0.0, 0.0)]);
        let grid = grid_with(&objects);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.get_cells(-1, -1, 2, 2), vec![1]);
    }

    #[test]
    fn test_far_away_members_do_not_overflow() {
        let objects = Objects(vec![
            square_at(10.0, -2e11, 0.0),
            square_at(10.0, 0.0, 3e12),
            square_at(10.0, 0.0, 0.0),
        ]);
        let grid = grid_with(&objects);
        assert!(grid.get_aabb_collisions(&objects, 0).unwrap().is_empty());
        assert!(grid.get_aabb_collisions(&objects, 1).unwrap().is_empty());
        assert!(grid.get_aabb_collisions(&objects, 2).unwrap().is_empty());

        let far = Rect::new(-3e11, -1.0, -1e11, 1.0);
        assert_eq!(grid.query_rect(&objects, &far, None), vec![0]);
    }

    #[test]
    fn test_query_rect() {
        let objects = Objects(vec![square_at(10.0, 0.0, 0.0), square_at(10.0, 100.0, 0.0)]);
        let grid = grid_with(&objects);
        let found = grid.query_rect(&objects, &Rect::new(90.0, -1.0, 120.0, 1.0), None);
        assert_eq!(found, vec![1]);
        let found = grid.query_rect(&objects, &Rect::new(-10.0, -10.0, 110.0, 10.0), Some(0));
        assert_eq!(found, vec![1]);
    }
}
