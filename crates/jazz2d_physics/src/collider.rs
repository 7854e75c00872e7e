//! Colliders and their world-space geometry
//!
//! A [`Collider`] stores its shape in owner-local space and never changes it
//! with the owner's movement. World-space geometry is derived on demand by
//! pairing the collider with the owner's [`Pose`] in a [`PlacedCollider`].

use std::cell::Cell;

use jazz2d_math::{Rect, Vec2};

use crate::collision::{self, Penetration};
use crate::error::PhysicsError;
use crate::shapes::{Shape, ShapeKind};

/// Two unit normals closer than this to `|dot| == 1` are the same axis
pub const PARALLEL_EPSILON: f32 = 1e-5;

/// World-space position and rotation (degrees) of a collider's owner
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub rotation: f32,
}

impl Pose {
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    pub fn at(position: Vec2) -> Self {
        Self { position, rotation: 0.0 }
    }

    /// Map an owner-local point into world space
    #[inline]
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + local.rotate(self.rotation)
    }
}

/// Bounding box offsets relative to the owner position, tagged with the
/// owner rotation they were computed for
#[derive(Clone, Copy, Debug)]
struct BoundsCache {
    rotation: f32,
    offsets: Rect,
}

/// A collision shape attached to one owner object
#[derive(Clone, Debug)]
pub struct Collider {
    kind: ShapeKind,
    /// Shape-local vertices (empty for circles)
    vertices: Vec<Vec2>,
    /// Vertex index pairs forming the edges
    edges: Vec<(usize, usize)>,
    /// Circle radius, or the farthest vertex distance for polygonal shapes
    radius: f32,
    /// Shape-local centroid
    center: Vec2,
    bounds: Cell<Option<BoundsCache>>,
    /// RGBA color used when exporting debug lines
    pub debug_color: [f32; 4],
}

impl Collider {
    /// Build a collider from a shape declaration
    ///
    /// Fails with [`PhysicsError::InvalidShape`] for malformed shapes.
    pub fn new(shape: Shape) -> Result<Self, PhysicsError> {
        shape.validate()?;
        let kind = shape.kind();

        let (vertices, radius) = match shape {
            Shape::Rectangle { width, height } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                let verts = vec![
                    Vec2::new(hw, hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(-hw, -hh),
                    Vec2::new(-hw, hh),
                ];
                (verts, 0.0)
            }
            Shape::Circle { radius } => (Vec::new(), radius),
            Shape::Polygon { vertices } => (vertices, 0.0),
            Shape::Ray { length } => (vec![Vec2::ZERO, Vec2::new(length, 0.0)], 0.0),
        };

        let mut collider = Self {
            kind,
            edges: Self::edge_indices(vertices.len()),
            radius,
            center: Vec2::ZERO,
            vertices,
            bounds: Cell::new(None),
            debug_color: [1.0, 1.0, 1.0, 1.0],
        };
        collider.refresh_local_metrics();
        Ok(collider)
    }

    pub fn rectangle(width: f32, height: f32) -> Result<Self, PhysicsError> {
        Self::new(Shape::rectangle(width, height))
    }

    pub fn circle(radius: f32) -> Result<Self, PhysicsError> {
        Self::new(Shape::circle(radius))
    }

    pub fn polygon(vertices: impl IntoIterator<Item = Vec2>) -> Result<Self, PhysicsError> {
        Self::new(Shape::polygon(vertices))
    }

    pub fn ray(length: f32) -> Result<Self, PhysicsError> {
        Self::new(Shape::ray(length))
    }

    /// Build a rectangle collider matching an axis-aligned rect, and the
    /// pose that places it
    pub fn from_rect(rect: &Rect) -> Result<(Self, Pose), PhysicsError> {
        let collider = Self::rectangle(rect.width(), rect.height())?;
        Ok((collider, Pose::at(rect.center())))
    }

    /// Set the debug color
    pub fn with_debug_color(mut self, color: [f32; 4]) -> Self {
        self.debug_color = color;
        self
    }

    fn edge_indices(count: usize) -> Vec<(usize, usize)> {
        match count {
            0 | 1 => Vec::new(),
            2 => vec![(0, 1)],
            n => (0..n).map(|i| (i, (i + 1) % n)).collect(),
        }
    }

    /// Recompute the centroid and bounding radius from the local vertices
    fn refresh_local_metrics(&mut self) {
        match self.vertices.len() {
            0 | 1 => {}
            2 => {
                self.center = Vec2::ZERO;
                self.radius = self.vertices.iter().map(|v| v.length()).fold(0.0, f32::max);
            }
            n => {
                let sum = self.vertices.iter().fold(Vec2::ZERO, |acc, &v| acc + v);
                self.center = sum / n as f32;
                self.radius = self.vertices.iter().map(|v| v.length()).fold(0.0, f32::max);
            }
        }
        self.bounds.set(None);
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Whether the shape is a single point with a radius (a circle)
    #[inline]
    pub fn is_point_shape(&self) -> bool {
        self.kind == ShapeKind::Circle
    }

    /// Shape-local vertices
    #[inline]
    pub fn local_vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Circle radius, or the farthest vertex distance from the owner for
    /// polygonal shapes
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Shape-local centroid
    #[inline]
    pub fn local_center(&self) -> Vec2 {
        self.center
    }

    /// Length of a ray collider, `None` for other shapes
    pub fn ray_length(&self) -> Option<f32> {
        match self.kind {
            ShapeKind::Ray => Some(self.vertices[1].x),
            _ => None,
        }
    }

    /// Change the length of a ray collider
    pub fn set_ray_length(&mut self, length: f32) -> Result<(), PhysicsError> {
        if self.kind != ShapeKind::Ray {
            return Err(PhysicsError::InvalidShape(format!(
                "cannot set a ray length on a {} collider",
                self.kind
            )));
        }
        Shape::ray(length).validate()?;
        self.vertices[1] = Vec2::new(length, 0.0);
        self.refresh_local_metrics();
        Ok(())
    }

    /// Shift polygon vertices so their centroid sits on the owner position
    ///
    /// Meant to be called once after construction. Other shapes are already
    /// centered and are left untouched.
    pub fn recenter(&mut self) {
        if self.kind != ShapeKind::Polygon || self.center == Vec2::ZERO {
            return;
        }
        let center = self.center;
        for vertex in &mut self.vertices {
            *vertex -= center;
        }
        self.refresh_local_metrics();
        self.center = Vec2::ZERO;
    }

    /// Bounding box offsets relative to the owner position for a rotation
    ///
    /// Cached per rotation; only a rotation change triggers a recompute.
    pub fn bounds_offsets(&self, rotation: f32) -> Rect {
        if self.kind == ShapeKind::Circle {
            let r = self.radius;
            return Rect::new(-r, -r, r, r);
        }
        if let Some(cache) = self.bounds.get() {
            if cache.rotation == rotation {
                return cache.offsets;
            }
        }
        let offsets = Rect::from_points(self.vertices.iter().map(|v| v.rotate(rotation)))
            .unwrap_or_default();
        self.bounds.set(Some(BoundsCache { rotation, offsets }));
        offsets
    }

    /// Rotation the cached bounds were computed for, if any
    pub fn cached_rotation(&self) -> Option<f32> {
        self.bounds.get().map(|cache| cache.rotation)
    }

    /// Pair this collider with its owner's pose
    #[inline]
    pub fn placed(&self, pose: Pose) -> PlacedCollider<'_> {
        PlacedCollider { collider: self, pose }
    }
}

/// A collider viewed at its owner's world pose
#[derive(Clone, Copy, Debug)]
pub struct PlacedCollider<'a> {
    pub collider: &'a Collider,
    pub pose: Pose,
}

impl<'a> PlacedCollider<'a> {
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.collider.kind
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.collider.radius
    }

    #[inline]
    pub fn is_point_shape(&self) -> bool {
        self.collider.is_point_shape()
    }

    /// World-space centroid
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pose.transform_point(self.collider.center)
    }

    /// Unit vector along the owner's rotation
    #[inline]
    pub fn facing(&self) -> Vec2 {
        Vec2::from_angle(self.pose.rotation)
    }

    /// World-space vertices (empty for circles)
    pub fn vertices(&self) -> Vec<Vec2> {
        self.collider
            .vertices
            .iter()
            .map(|&v| self.pose.transform_point(v))
            .collect()
    }

    /// World-space edges as (start, end) pairs
    pub fn edges(&self) -> Vec<(Vec2, Vec2)> {
        let vertices = self.vertices();
        self.collider
            .edges
            .iter()
            .map(|&(i, j)| (vertices[i], vertices[j]))
            .collect()
    }

    /// Unit edge normals with parallel duplicates removed, in edge order
    pub fn normals(&self) -> Vec<Vec2> {
        let mut normals: Vec<Vec2> = Vec::new();
        for (start, end) in self.edges() {
            let Some(direction) = (end - start).try_normalized() else {
                continue;
            };
            let candidate = direction.rotate(90.0);
            let duplicate = normals
                .iter()
                .any(|n| (n.dot(candidate).abs() - 1.0).abs() <= PARALLEL_EPSILON);
            if !duplicate {
                normals.push(candidate);
            }
        }
        normals
    }

    /// World-space axis-aligned bounding box
    pub fn bounding_rect(&self) -> Rect {
        let position = match self.kind() {
            ShapeKind::Circle => self.center(),
            _ => self.pose.position,
        };
        self.collider
            .bounds_offsets(self.pose.rotation)
            .translated(position)
    }

    /// Size of the bounding box
    pub fn size(&self) -> Vec2 {
        self.bounding_rect().size()
    }

    /// Project the shape onto an axis, returning (min, max)
    pub fn project(&self, axis: Vec2) -> (f32, f32) {
        if self.is_point_shape() {
            let p = self.center().dot(axis);
            let r = self.collider.radius * axis.length();
            return (p - r, p + r);
        }
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for vertex in self.vertices() {
            let proj = vertex.dot(axis);
            min = min.min(proj);
            max = max.max(proj);
        }
        (min, max)
    }

    /// Strict bounding box overlap
    pub fn collide_rect(&self, other: &PlacedCollider<'_>) -> bool {
        self.bounding_rect().overlaps(&other.bounding_rect())
    }

    /// Bounding circle test using each shape's radius
    pub fn collide_circle(&self, other: &PlacedCollider<'_>) -> bool {
        self.center().distance(other.center()) <= self.radius() + other.radius()
    }

    /// SAT overlap test against another collider
    pub fn collide_sat(&self, other: &PlacedCollider<'_>) -> Penetration {
        collision::collide_sat(self, other)
    }

    /// Cast this ray collider against a target
    ///
    /// Fails with [`PhysicsError::InvalidCollider`] when `self` is not a ray.
    pub fn collide_ray(&self, target: &PlacedCollider<'_>) -> Result<Option<Vec2>, PhysicsError> {
        if self.kind() != ShapeKind::Ray {
            return Err(PhysicsError::InvalidCollider(format!(
                "ray casts need a Ray collider, got {}",
                self.kind()
            )));
        }
        Ok(collision::ray_cast(self, target))
    }
}
