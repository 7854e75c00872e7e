//! Debug line export for colliders
//!
//! Colliders can be drawn as plain line segments by an external renderer.
//! [`DebugLine`] is plain old data so a batch can be uploaded as raw bytes.

use bytemuck::{Pod, Zeroable};
use jazz2d_math::Vec2;

use crate::collider::PlacedCollider;
use crate::shapes::ShapeKind;

/// Segments used to approximate a circle outline
pub const CIRCLE_SEGMENTS: usize = 16;

/// Color of the facing indicator
pub const FACING_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Color of the bounding box outline
pub const BOUNDS_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

/// A colored line segment in world space
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DebugLine {
    pub start: Vec2,
    pub end: Vec2,
    pub color: [f32; 4],
}

impl DebugLine {
    pub fn new(start: Vec2, end: Vec2, color: [f32; 4]) -> Self {
        Self { start, end, color }
    }

    /// View a batch of lines as bytes for upload
    pub fn as_bytes(lines: &[DebugLine]) -> &[u8] {
        bytemuck::cast_slice(lines)
    }
}

impl PlacedCollider<'_> {
    /// Outline, facing indicator and bounding box of this collider
    pub fn debug_lines(&self) -> Vec<DebugLine> {
        let color = self.collider.debug_color;
        let mut lines = Vec::new();

        if self.kind() == ShapeKind::Circle {
            let center = self.center();
            let radius = self.radius();
            let step = 360.0 / CIRCLE_SEGMENTS as f32;
            for i in 0..CIRCLE_SEGMENTS {
                let start = center + Vec2::from_angle(step * i as f32) * radius;
                let end = center + Vec2::from_angle(step * (i + 1) as f32) * radius;
                lines.push(DebugLine::new(start, end, color));
            }
        } else {
            lines.extend(self.edges().into_iter().map(|(start, end)| DebugLine::new(start, end, color)));
        }

        let center = self.center();
        let reach = self.radius().max(1.0);
        lines.push(DebugLine::new(center, center + self.facing() * reach, FACING_COLOR));

        let corners = self.bounding_rect().corners();
        for i in 0..corners.len() {
            lines.push(DebugLine::new(corners[i], corners[(i + 1) % corners.len()], BOUNDS_COLOR));
        }

        lines
    }
}
