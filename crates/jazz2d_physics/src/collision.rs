//! Narrow phase collision tests
//!
//! Provides the SAT overlap test between any two colliders and the
//! segment/ray intersection routines used by ray casts.

use jazz2d_math::Vec2;

use crate::collider::PlacedCollider;
use crate::shapes::ShapeKind;

/// Result of a SAT overlap test
///
/// `depth` is the minimum translation distance along `normal` needed to
/// separate the shapes. `normal` points from the first shape toward the
/// second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Penetration {
    pub depth: f32,
    pub normal: Vec2,
}

impl Penetration {
    /// Separated shapes
    pub const NONE: Self = Self {
        depth: 0.0,
        normal: Vec2::ZERO,
    };

    pub fn new(depth: f32, normal: Vec2) -> Self {
        Self { depth, normal }
    }

    /// Check if this represents an actual overlap (positive depth)
    pub fn is_colliding(&self) -> bool {
        self.depth > 0.0
    }
}

/// Unit vector from `center` to the nearest of `points`, skipping points
/// that coincide with the center
fn nearest_point_axis(center: Vec2, points: &[Vec2]) -> Option<Vec2> {
    let mut best: Option<(f32, Vec2)> = None;
    for &point in points {
        let offset = point - center;
        let length = offset.length();
        if length == 0.0 {
            continue;
        }
        if best.map_or(true, |(min, _)| length < min) {
            best = Some((length, offset / length));
        }
    }
    best.map(|(_, axis)| axis)
}

/// Points a circle's curved surface is tested against: the other shape's
/// vertices, or its center when it is a circle too
fn circle_targets(other: &PlacedCollider<'_>) -> Vec<Vec2> {
    if other.is_point_shape() {
        vec![other.center()]
    } else {
        other.vertices()
    }
}

/// Separating Axis Theorem overlap test
///
/// Candidate axes are `a`'s normals followed by `b`'s. When one side is a
/// circle, the axis from its center to the nearest vertex of the other shape
/// is added. Returns [`Penetration::NONE`] as soon as a separating axis is
/// found; otherwise the smallest overlap wins, the first one encountered on
/// ties.
pub fn collide_sat(a: &PlacedCollider<'_>, b: &PlacedCollider<'_>) -> Penetration {
    let mut axes = a.normals();
    axes.extend(b.normals());

    if a.is_point_shape() {
        axes.extend(nearest_point_axis(a.center(), &circle_targets(b)));
    } else if b.is_point_shape() {
        axes.extend(nearest_point_axis(b.center(), &a.vertices()));
    }

    // Two concentric circles have no usable axis; any direction separates
    // them equally well.
    if axes.is_empty() {
        axes.push(Vec2::X);
    }

    let mut depth = f32::INFINITY;
    let mut best_axis = Vec2::ZERO;
    for axis in axes {
        let (a_min, a_max) = a.project(axis);
        let (b_min, b_max) = b.project(axis);
        if a_max < b_min || b_max < a_min {
            return Penetration::NONE;
        }
        let overlap = (b_max - a_min).min(a_max - b_min);
        if overlap < depth {
            depth = overlap;
            best_axis = axis;
        }
    }

    let mut normal = best_axis.normalized();
    let toward_b = a.center().direction_to(b.center());
    if normal.dot(toward_b) < 0.0 {
        normal = -normal;
    }
    Penetration::new(depth, normal)
}

/// Intersection point of segments `p0-p1` and `p2-p3`
///
/// Returns `None` for parallel or zero-length segments, or when the
/// intersection lies outside either segment.
pub fn segment_intersection(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Option<Vec2> {
    let s1 = p1 - p0;
    let s2 = p3 - p2;

    // Parallel within f32 precision, relative to the segment lengths
    let denom = s1.cross(s2);
    if denom.abs() <= f32::EPSILON * s1.length() * s2.length() {
        return None;
    }

    // s: parameter along p2-p3, t: parameter along p0-p1
    let s = (-s1.y * (p0.x - p2.x) + s1.x * (p0.y - p2.y)) / denom;
    let t = (s2.x * (p0.y - p2.y) - s2.y * (p0.x - p2.x)) / denom;

    if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
        Some(p0 + s1 * t)
    } else {
        None
    }
}

/// Intersection of the line through `a` and `b` with a circle
///
/// The circle center is projected onto the infinite line through the
/// segment. When the perpendicular distance exceeds the radius there is no
/// hit; otherwise the crossing reached by stepping from the projection
/// toward `a` is returned, so a circle centered behind `a` yields the
/// crossing ahead of it.
pub fn segment_circle_intersection(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> Option<Vec2> {
    let ab = b - a;
    let abab = ab.dot(ab);
    if abab == 0.0 {
        return None;
    }

    let t = (center - a).dot(ab) / abab;
    let closest = a + ab * t;
    let h = closest - center;
    let hh = h.dot(h);
    if hh > radius * radius {
        return None;
    }

    let penetration = (radius * radius - hh).sqrt();
    let toward_a = (a - closest).try_normalized().unwrap_or_else(|| -ab.normalized());
    Some(closest + toward_a * penetration)
}

/// Cast a ray collider against a target collider
///
/// Circles use the segment/circle test; other shapes test every edge and
/// keep the hit closest to the ray origin.
pub fn ray_cast(ray: &PlacedCollider<'_>, target: &PlacedCollider<'_>) -> Option<Vec2> {
    let ray_vertices = ray.vertices();
    let (origin, end) = match ray_vertices.as_slice() {
        [origin, end, ..] => (*origin, *end),
        _ => return None,
    };

    if target.kind() == ShapeKind::Circle {
        return segment_circle_intersection(origin, end, target.center(), target.radius());
    }

    target
        .edges()
        .into_iter()
        .filter_map(|(start, finish)| segment_intersection(origin, end, start, finish))
        .min_by(|p, q| {
            origin
                .distance(*p)
                .partial_cmp(&origin.distance(*q))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::{Collider, Pose};
    use jazz2d_math::Rect;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    // ===== Segment Tests =====

    #[test]
    fn test_segment_intersection_crossing() {
        let hit = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, -5.0),
            Vec2::new(5.0, 5.0),
        )
        .expect("Segments should cross");
        assert!(hit.approx_eq(Vec2::new(5.0, 0.0), EPSILON));
    }

    #[test]
    fn test_segment_intersection_parallel() {
        let hit = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(10.0, 1.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_segment_intersection_shallow_angle() {
        // Less than a fifth of a degree apart, still a real crossing
        let hit = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.3),
            Vec2::new(0.0, 0.1),
            Vec2::new(100.0, 0.1),
        )
        .expect("Shallow segments should cross");
        assert!(hit.approx_eq(Vec2::new(100.0 / 3.0, 0.1), 0.001));
    }

    #[test]
    fn test_segment_intersection_out_of_range() {
        // Lines cross at (15, 0), beyond the first segment
        let hit = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(15.0, -5.0),
            Vec2::new(15.0, 5.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_segment_intersection_degenerate() {
        let hit = segment_intersection(Vec2::ZERO, Vec2::ZERO, Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0));
        assert!(hit.is_none());
    }

    #[test]
    fn test_segment_circle_near_point() {
        let hit = segment_circle_intersection(Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0), Vec2::new(10.0, 0.0), 3.0)
            .expect("Ray should hit the circle");
        assert!(hit.approx_eq(Vec2::new(7.0, 0.0), EPSILON));
    }

    #[test]
    fn test_segment_circle_origin_inside() {
        // Center behind the origin: the exit point ahead of it is reported
        let hit = segment_circle_intersection(Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0), Vec2::new(-1.0, 0.0), 3.0)
            .expect("Ray starts inside the circle");
        assert!(hit.approx_eq(Vec2::new(2.0, 0.0), EPSILON));

        // Center exactly on the origin steps back along the segment
        let hit = segment_circle_intersection(Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0), Vec2::ZERO, 3.0)
            .expect("Ray starts at the center");
        assert!(hit.approx_eq(Vec2::new(-3.0, 0.0), EPSILON));
    }

    #[test]
    fn test_segment_circle_miss() {
        let hit = segment_circle_intersection(Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0), Vec2::new(10.0, 5.0), 3.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_segment_circle_offset_chord() {
        // Center 4 below the line, radius 5: half chord of 3
        let hit = segment_circle_intersection(Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0), Vec2::new(10.0, 4.0), 5.0)
            .expect("Ray should hit the circle");
        assert!(hit.approx_eq(Vec2::new(7.0, 0.0), EPSILON));
    }

    // ===== SAT Tests =====

    #[test]
    fn test_sat_separated_rectangles() {
        let a = Collider::rectangle(10.0, 10.0).unwrap();
        let b = Collider::rectangle(10.0, 10.0).unwrap();
        let result = collide_sat(
            &a.placed(Pose::at(Vec2::ZERO)),
            &b.placed(Pose::at(Vec2::new(20.0, 0.0))),
        );
        assert_eq!(result, Penetration::NONE);
    }

    #[test]
    fn test_sat_overlapping_rectangles() {
        let a = Collider::rectangle(10.0, 10.0).unwrap();
        let b = Collider::rectangle(10.0, 10.0).unwrap();
        let result = collide_sat(
            &a.placed(Pose::at(Vec2::ZERO)),
            &b.placed(Pose::at(Vec2::new(8.0, 1.0))),
        );
        assert!(result.is_colliding());
        assert!(approx_eq(result.depth, 2.0));
        assert!(result.normal.approx_eq(Vec2::X, EPSILON));
    }

    #[test]
    fn test_sat_normal_points_from_a_to_b() {
        let a = Collider::rectangle(10.0, 10.0).unwrap();
        let b = Collider::rectangle(10.0, 10.0).unwrap();
        let result = collide_sat(
            &a.placed(Pose::at(Vec2::new(8.0, 0.0))),
            &b.placed(Pose::at(Vec2::ZERO)),
        );
        assert!(approx_eq(result.depth, 2.0));
        assert!(result.normal.approx_eq(-Vec2::X, EPSILON));
    }

    #[test]
    fn test_sat_touching_is_zero_depth() {
        let a = Collider::rectangle(10.0, 10.0).unwrap();
        let result = collide_sat(
            &a.placed(Pose::at(Vec2::ZERO)),
            &a.placed(Pose::at(Vec2::new(10.0, 0.0))),
        );
        assert!(!result.is_colliding());
        assert!(approx_eq(result.depth, 0.0));
    }

    #[test]
    fn test_sat_circle_vs_circle() {
        let a = Collider::circle(5.0).unwrap();
        let b = Collider::circle(5.0).unwrap();
        let result = collide_sat(
            &a.placed(Pose::at(Vec2::ZERO)),
            &b.placed(Pose::at(Vec2::new(0.0, 8.0))),
        );
        assert!(approx_eq(result.depth, 2.0));
        assert!(result.normal.approx_eq(Vec2::Y, EPSILON));

        let apart = collide_sat(
            &a.placed(Pose::at(Vec2::ZERO)),
            &b.placed(Pose::at(Vec2::new(11.0, 0.0))),
        );
        assert_eq!(apart, Penetration::NONE);
    }

    #[test]
    fn test_sat_circle_vs_rectangle_corner() {
        let rect = Collider::rectangle(10.0, 10.0).unwrap();
        let circle = Collider::circle(2.0).unwrap();

        // Circle diagonally off the (5, 5) corner, 2.83 away: no overlap even
        // though both axis-aligned projections overlap.
        let result = collide_sat(
            &circle.placed(Pose::at(Vec2::new(7.0, 7.0))),
            &rect.placed(Pose::at(Vec2::ZERO)),
        );
        assert_eq!(result, Penetration::NONE);

        // Closer: 1.41 from the corner
        let result = collide_sat(
            &rect.placed(Pose::at(Vec2::ZERO)),
            &circle.placed(Pose::at(Vec2::new(6.0, 6.0))),
        );
        assert!(result.is_colliding());
        assert!(result.normal.dot(Vec2::new(6.0, 6.0)) >= 0.0);
    }

    #[test]
    fn test_sat_concentric_circles() {
        let a = Collider::circle(3.0).unwrap();
        let result = collide_sat(&a.placed(Pose::default()), &a.placed(Pose::default()));
        assert!(approx_eq(result.depth, 6.0));
    }

    #[test]
    fn test_sat_rotated_rectangle() {
        let a = Collider::rectangle(10.0, 10.0).unwrap();
        let b = Collider::rectangle(10.0, 10.0).unwrap();
        // b rotated 45 degrees, its corner reaches 5 + 7.07 - 10 = 2.07 into a
        let result = collide_sat(
            &a.placed(Pose::at(Vec2::ZERO)),
            &b.placed(Pose::new(Vec2::new(10.0, 0.0), 45.0)),
        );
        assert!(result.is_colliding());
        assert!((result.depth - (5.0 + 50f32.sqrt() - 10.0)).abs() < 0.001);
        assert!(result.normal.approx_eq(Vec2::X, 0.001));
    }

    #[test]
    fn test_sat_translation_by_depth_separates() {
        let a = Collider::polygon([Vec2::new(0.0, -6.0), Vec2::new(6.0, 4.0), Vec2::new(-6.0, 4.0)]).unwrap();
        let b = Collider::rectangle(8.0, 5.0).unwrap();
        let pa = a.placed(Pose::at(Vec2::ZERO));
        let pb = b.placed(Pose::at(Vec2::new(4.0, 3.0)));

        let result = collide_sat(&pa, &pb);
        assert!(approx_eq(result.depth, 3.5));
        assert!(result.normal.approx_eq(Vec2::Y, EPSILON));
        assert!(result.normal.dot(pb.center() - pa.center()) >= 0.0);

        // Moving b out along the normal by the depth leaves the shapes touching
        let moved = b.placed(Pose::at(pb.pose.position + result.normal * result.depth));
        let after = collide_sat(&pa, &moved);
        assert!(after.depth.abs() < 0.001);
    }

    #[test]
    fn test_sat_aabb_separation_implies_zero_depth() {
        let shapes = [
            Collider::rectangle(6.0, 9.0).unwrap(),
            Collider::circle(4.0).unwrap(),
            Collider::polygon([Vec2::new(0.0, -5.0), Vec2::new(5.0, 5.0), Vec2::new(-5.0, 5.0)]).unwrap(),
        ];
        for (i, a) in shapes.iter().enumerate() {
            for (j, b) in shapes.iter().enumerate() {
                for offset in [12.0f32, 15.0, 30.0] {
                    let pa = a.placed(Pose::new(Vec2::ZERO, 10.0 * i as f32));
                    let pb = b.placed(Pose::new(Vec2::new(offset, offset * 0.5), 15.0 * j as f32));
                    if !pa.bounding_rect().overlaps(&pb.bounding_rect()) {
                        assert_eq!(collide_sat(&pa, &pb).depth, 0.0);
                    }
                }
            }
        }
    }

    // ===== Ray Cast Tests =====

    #[test]
    fn test_ray_cast_circle() {
        let ray = Collider::ray(20.0).unwrap();
        let circle = Collider::circle(3.0).unwrap();
        let hit = ray_cast(
            &ray.placed(Pose::at(Vec2::ZERO)),
            &circle.placed(Pose::at(Vec2::new(10.0, 0.0))),
        )
        .expect("Ray should hit");
        assert!(hit.approx_eq(Vec2::new(7.0, 0.0), EPSILON));
    }

    #[test]
    fn test_ray_cast_rectangle_nearest_edge() {
        let ray = Collider::ray(50.0).unwrap();
        let (rect, pose) = Collider::from_rect(&Rect::new(10.0, -5.0, 20.0, 5.0)).unwrap();
        let hit = ray_cast(&ray.placed(Pose::at(Vec2::ZERO)), &rect.placed(pose)).expect("Ray should hit");
        assert!(hit.approx_eq(Vec2::new(10.0, 0.0), EPSILON));
    }

    #[test]
    fn test_ray_cast_follows_owner_rotation() {
        let ray = Collider::ray(50.0).unwrap();
        let rect = Collider::rectangle(10.0, 10.0).unwrap();
        let target = rect.placed(Pose::at(Vec2::new(0.0, 30.0)));

        assert!(ray_cast(&ray.placed(Pose::at(Vec2::ZERO)), &target).is_none());

        let hit = ray_cast(&ray.placed(Pose::new(Vec2::ZERO, 90.0)), &target).expect("Ray should hit");
        assert!(hit.approx_eq(Vec2::new(0.0, 25.0), 0.001));
    }

    #[test]
    fn test_ray_cast_grazing_edge_is_nearest() {
        // Ray climbs 0.3 over 100 units; the long bottom edge at y = 0.1 is
        // crossed at x = 33.3, well before the right edge at x = 60
        let ray = Collider::ray(100.0).unwrap();
        let angle = Vec2::new(100.0, 0.3).angle();
        let (rect, pose) = Collider::from_rect(&Rect::new(-40.0, 0.1, 60.0, 10.0)).unwrap();
        let hit = ray_cast(&ray.placed(Pose::new(Vec2::ZERO, angle)), &rect.placed(pose)).expect("Ray should hit");
        assert!((hit.x - 100.0 / 3.0).abs() < 0.05);
        assert!((hit.y - 0.1).abs() < 0.001);
    }

    #[test]
    fn test_ray_cast_too_short() {
        let ray = Collider::ray(5.0).unwrap();
        let rect = Collider::rectangle(10.0, 10.0).unwrap();
        let hit = ray_cast(&ray.placed(Pose::at(Vec2::ZERO)), &rect.placed(Pose::at(Vec2::new(20.0, 0.0))));
        assert!(hit.is_none());
    }
}
