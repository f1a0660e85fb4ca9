// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Robust geometric predicates
//!
//! Shared by the intersection and classification modules so that both
//! resolve ties identically — inconsistent tie-breaking between face-face
//! cuts and containment rays is the classic source of boolean-engine bugs.
//!
//! Tolerance policy: orientation *signs* come from exact adaptive-precision
//! arithmetic (the `robust` crate), so sidedness decisions on input
//! coordinates never flip under roundoff. Distance-valued tests (point on
//! surface, segment extent, vertex welding) use the documented absolute
//! epsilons below; geometry finer than these tolerances is out of contract.

use nalgebra::{Point3, Vector3};
use robust::{orient2d, orient3d, Coord, Coord3D};

/// Geometric epsilon for distance comparisons on derived points.
pub const EPS: f64 = 1e-9;

/// Distance under which a sample point counts as lying on a surface.
pub const COINCIDENT_EPS: f64 = 1e-7;

/// Vertices closer than this are merged during assembly.
pub const WELD_EPS: f64 = 1e-7;

/// Side of an oriented plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The side the triangle normal (b - a) x (c - a) points toward.
    Front,
    Back,
    On,
}

fn coord3(p: &Point3<f64>) -> Coord3D<f64> {
    Coord3D {
        x: p.x,
        y: p.y,
        z: p.z,
    }
}

/// Exact side of `p` relative to the oriented plane through (a, b, c).
pub fn side_of_plane(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    p: &Point3<f64>,
) -> Side {
    // robust::orient3d is positive when p lies *below* the plane, i.e. on
    // the side opposite the right-handed normal.
    let o = orient3d(coord3(a), coord3(b), coord3(c), coord3(p));
    if o < 0.0 {
        Side::Front
    } else if o > 0.0 {
        Side::Back
    } else {
        Side::On
    }
}

/// Exact 2D orientation: positive when (a, b, c) wind counterclockwise.
pub fn orient2d_sign(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    orient2d(
        Coord { x: a.0, y: a.1 },
        Coord { x: b.0, y: b.1 },
        Coord { x: c.0, y: c.1 },
    )
}

/// Coordinate axis to drop when projecting a plane with normal `n` to 2D
/// (the axis of largest normal magnitude).
pub fn projection_axis(n: &Vector3<f64>) -> usize {
    let ax = n.x.abs();
    let ay = n.y.abs();
    let az = n.z.abs();
    if ax >= ay && ax >= az {
        0
    } else if ay >= az {
        1
    } else {
        2
    }
}

/// Project a point to 2D by dropping `axis`.
pub fn project2(p: &Point3<f64>, axis: usize) -> (f64, f64) {
    match axis {
        0 => (p.y, p.z),
        1 => (p.x, p.z),
        _ => (p.x, p.y),
    }
}

/// Point-in-triangle test in 2D, boundary inclusive, using exact
/// orientation signs so the answer is consistent for points on edges.
pub fn point_in_triangle_2d(
    p: (f64, f64),
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
) -> bool {
    let s1 = orient2d_sign(a, b, p);
    let s2 = orient2d_sign(b, c, p);
    let s3 = orient2d_sign(c, a, p);
    (s1 >= 0.0 && s2 >= 0.0 && s3 >= 0.0) || (s1 <= 0.0 && s2 <= 0.0 && s3 <= 0.0)
}

/// Unsigned distance from a point to a 3D segment.
pub fn point_segment_distance(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < EPS * EPS {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Unsigned distance from a point to a triangle (closest point on the
/// face, an edge, or a corner).
pub fn point_triangle_distance(p: &Point3<f64>, tri: &[Point3<f64>; 3]) -> f64 {
    let [v0, v1, v2] = tri;
    let n = (v1 - v0).cross(&(v2 - v0));
    let n_len = n.norm();
    if n_len < EPS {
        // Degenerate triangle: fall back to its edges.
        return point_segment_distance(p, v0, v1)
            .min(point_segment_distance(p, v1, v2))
            .min(point_segment_distance(p, v2, v0));
    }
    let n = n / n_len;
    let plane_dist = (p - v0).dot(&n);
    let projected = p - n * plane_dist;

    let axis = projection_axis(&n);
    if point_in_triangle_2d(
        project2(&projected, axis),
        project2(v0, axis),
        project2(v1, axis),
        project2(v2, axis),
    ) {
        return plane_dist.abs();
    }
    point_segment_distance(p, v0, v1)
        .min(point_segment_distance(p, v1, v2))
        .min(point_segment_distance(p, v2, v0))
}

/// Outcome of a ray-triangle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayHit {
    Miss,
    /// Clean interior crossing at parameter `t > 0`.
    Hit(f64),
    /// The ray grazes an edge, a vertex, the triangle plane, or starts on
    /// the surface. Parity would be unreliable; the caller must re-cast.
    Grazing,
}

/// Relative margin around barycentric boundaries below which a crossing
/// counts as grazing.
const BARY_EPS: f64 = 1e-9;

/// Moller-Trumbore ray-triangle intersection with explicit degeneracy
/// reporting instead of an arbitrary tie-break.
pub fn ray_triangle(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    tri: &[Point3<f64>; 3],
) -> RayHit {
    let [v0, v1, v2] = tri;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = dir.cross(&edge2);
    let det = edge1.dot(&h);

    let scale = edge1.norm() * edge2.norm();
    if det.abs() <= 1e-12 * scale.max(f64::MIN_POSITIVE) {
        // Ray parallel to the triangle plane. Only dangerous when the
        // origin is (nearly) in that plane.
        let n = edge1.cross(&edge2);
        let n_len = n.norm();
        if n_len > 0.0 && ((origin - v0).dot(&n) / n_len).abs() < COINCIDENT_EPS {
            return RayHit::Grazing;
        }
        return RayHit::Miss;
    }

    let inv_det = 1.0 / det;
    let s = origin - v0;
    let u = inv_det * s.dot(&h);
    if u < -BARY_EPS || u > 1.0 + BARY_EPS {
        return RayHit::Miss;
    }
    let q = s.cross(&edge1);
    let v = inv_det * dir.dot(&q);
    if v < -BARY_EPS || u + v > 1.0 + BARY_EPS {
        return RayHit::Miss;
    }

    let t = inv_det * edge2.dot(&q);
    if t <= -EPS {
        return RayHit::Miss;
    }

    let w = 1.0 - u - v;
    if u < BARY_EPS || v < BARY_EPS || w < BARY_EPS || t < EPS {
        return RayHit::Grazing;
    }
    RayHit::Hit(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_of_plane() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        // Normal is +z.
        assert_eq!(side_of_plane(&a, &b, &c, &Point3::new(0.2, 0.2, 1.0)), Side::Front);
        assert_eq!(side_of_plane(&a, &b, &c, &Point3::new(0.2, 0.2, -1.0)), Side::Back);
        assert_eq!(side_of_plane(&a, &b, &c, &Point3::new(5.0, -3.0, 0.0)), Side::On);
    }

    #[test]
    fn test_point_in_triangle_2d_boundary() {
        let a = (0.0, 0.0);
        let b = (1.0, 0.0);
        let c = (0.0, 1.0);
        assert!(point_in_triangle_2d((0.25, 0.25), a, b, c));
        assert!(point_in_triangle_2d((0.5, 0.0), a, b, c)); // on edge
        assert!(point_in_triangle_2d((0.0, 0.0), a, b, c)); // at vertex
        assert!(!point_in_triangle_2d((0.75, 0.75), a, b, c));
    }

    #[test]
    fn test_point_triangle_distance() {
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        assert!((point_triangle_distance(&Point3::new(0.5, 0.5, 1.0), &tri) - 1.0).abs() < 1e-12);
        // Closest feature is the corner at the origin.
        let d = point_triangle_distance(&Point3::new(-1.0, -1.0, 0.0), &tri);
        assert!((d - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_ray_triangle_clean_hit() {
        let tri = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(0.0, 2.0, 1.0),
        ];
        let hit = ray_triangle(
            &Point3::new(0.5, 0.5, 0.0),
            &Vector3::new(0.0, 0.0, 1.0),
            &tri,
        );
        match hit {
            RayHit::Hit(t) => assert!((t - 1.0).abs() < 1e-12),
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[test]
    fn test_ray_triangle_edge_is_grazing() {
        let tri = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(0.0, 2.0, 1.0),
        ];
        // Passes exactly through the edge y = 0.
        let hit = ray_triangle(
            &Point3::new(1.0, 0.0, 0.0),
            &Vector3::new(0.0, 0.0, 1.0),
            &tri,
        );
        assert_eq!(hit, RayHit::Grazing);
    }

    #[test]
    fn test_ray_triangle_behind_origin() {
        let tri = [
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(2.0, 0.0, -1.0),
            Point3::new(0.0, 2.0, -1.0),
        ];
        let hit = ray_triangle(
            &Point3::new(0.5, 0.5, 0.0),
            &Vector3::new(0.0, 0.0, 1.0),
            &tri,
        );
        assert_eq!(hit, RayHit::Miss);
    }
}
