// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Triangle-triangle intersection
//!
//! Computes, for every broad-phase candidate pair, the geometry along which
//! the two faces cross, classified as transversal, coplanar overlap, or
//! edge-aligned contact. Plane sidedness comes from the exact predicates in
//! [`super::predicates`]; only derived quantities (crossing parameters,
//! segment extents) use the documented floating tolerance.
//!
//! Every segment is recorded on *both* owning faces. This is what keeps the
//! later retriangulation consistent across the two meshes: a segment
//! endpoint always lies on an edge of one of the two triangles of its pair,
//! and both triangles insert it, so the cut polylines of mesh A and mesh B
//! subdivide identically along the intersection curve.

use super::bbox::BoundingBox;
use super::bvh::Bvh;
use super::mesh::Mesh;
use super::predicates::{
    self, point_segment_distance, project2, projection_axis, side_of_plane, Side, EPS,
};
use crate::error::CsgError;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

/// Classification of an intersection segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// The faces cross each other's interior.
    Transversal,
    /// The faces are coplanar and overlap; the segment is one boundary
    /// edge of the overlap polygon.
    CoplanarOverlap,
    /// The segment lies along an existing edge of one of the faces. Zero
    /// width: it inserts split points but cuts no new area, which is what
    /// prevents spurious slivers along shared edges.
    EdgeAligned,
}

/// A segment of the intersection curve, tagged with its classification.
/// Owned per face; both faces of a pair carry equal copies.
#[derive(Debug, Clone)]
pub struct CutSegment {
    pub a: Point3<f64>,
    pub b: Point3<f64>,
    pub kind: SegmentKind,
}

impl CutSegment {
    pub fn length(&self) -> f64 {
        (self.b - self.a).norm()
    }
}

/// Outcome of intersecting one candidate pair.
#[derive(Debug, Clone)]
pub enum PairIntersection {
    None,
    /// Single-point contact (vertex on face, vertex on vertex). Ignored:
    /// adjacent segments carry their own endpoints.
    Touch,
    /// One or more cut segments shared by both faces.
    Segments(Vec<CutSegment>),
    /// The predicates could not resolve the configuration.
    Degenerate(&'static str),
}

/// Cut segments for every face of both input meshes, indexed by face.
pub struct CutSets {
    pub on_a: Vec<Vec<CutSegment>>,
    pub on_b: Vec<Vec<CutSegment>>,
}

/// Intersect all candidate face pairs of `a` against `b`, using `bvh_b`
/// for the broad phase. Parallel over the faces of `a`; results are merged
/// in a single-threaded pass.
pub fn intersect_meshes(a: &Mesh, b: &Mesh, bvh_b: &Bvh) -> Result<CutSets, CsgError> {
    let per_face: Vec<Vec<(usize, Vec<CutSegment>)>> = (0..a.face_count())
        .into_par_iter()
        .map(|fa| {
            let ta = a.face_points(fa);
            let mut candidates = Vec::new();
            bvh_b.query_box(&BoundingBox::from_triangle(&ta).dilated(EPS), &mut candidates);
            candidates.sort_unstable();

            let mut hits = Vec::new();
            for fb in candidates {
                let tb = b.face_points(fb);
                match intersect_pair(&ta, &tb) {
                    PairIntersection::None | PairIntersection::Touch => {}
                    PairIntersection::Segments(segments) => hits.push((fb, segments)),
                    PairIntersection::Degenerate(reason) => {
                        return Err(CsgError::DegenerateGeometry {
                            face_a: fa,
                            face_b: fb,
                            reason: reason.into(),
                        });
                    }
                }
            }
            Ok(hits)
        })
        .collect::<Result<_, CsgError>>()?;

    let mut on_a: Vec<Vec<CutSegment>> = vec![Vec::new(); a.face_count()];
    let mut on_b: Vec<Vec<CutSegment>> = vec![Vec::new(); b.face_count()];
    for (fa, hits) in per_face.into_iter().enumerate() {
        for (fb, segments) in hits {
            for seg in &segments {
                on_a[fa].push(seg.clone());
                on_b[fb].push(seg.clone());
            }
        }
    }
    Ok(CutSets { on_a, on_b })
}

/// Intersect a single triangle pair.
pub fn intersect_pair(
    ta: &[Point3<f64>; 3],
    tb: &[Point3<f64>; 3],
) -> PairIntersection {
    let sides_b = [
        side_of_plane(&ta[0], &ta[1], &ta[2], &tb[0]),
        side_of_plane(&ta[0], &ta[1], &ta[2], &tb[1]),
        side_of_plane(&ta[0], &ta[1], &ta[2], &tb[2]),
    ];
    if all_strictly(&sides_b, Side::Front) || all_strictly(&sides_b, Side::Back) {
        return PairIntersection::None;
    }
    if sides_b.iter().all(|&s| s == Side::On) {
        return coplanar_overlap(ta, tb);
    }

    let sides_a = [
        side_of_plane(&tb[0], &tb[1], &tb[2], &ta[0]),
        side_of_plane(&tb[0], &tb[1], &tb[2], &ta[1]),
        side_of_plane(&tb[0], &tb[1], &tb[2], &ta[2]),
    ];
    if all_strictly(&sides_a, Side::Front) || all_strictly(&sides_a, Side::Back) {
        return PairIntersection::None;
    }

    transversal_segment(ta, tb, &sides_a, &sides_b)
}

fn all_strictly(sides: &[Side; 3], which: Side) -> bool {
    sides.iter().all(|&s| s == which)
}

fn normal(tri: &[Point3<f64>; 3]) -> Vector3<f64> {
    (tri[1] - tri[0]).cross(&(tri[2] - tri[0]))
}

/// Interval method for the non-coplanar case: each triangle crosses the
/// common intersection line in an interval; the cut segment is the overlap
/// of the two intervals.
fn transversal_segment(
    ta: &[Point3<f64>; 3],
    tb: &[Point3<f64>; 3],
    sides_a: &[Side; 3],
    sides_b: &[Side; 3],
) -> PairIntersection {
    let na = normal(ta);
    let nb = normal(tb);

    let pts_a = boundary_plane_crossings(ta, sides_a, tb, &nb);
    let pts_b = boundary_plane_crossings(tb, sides_b, ta, &na);
    if pts_a.is_empty() || pts_b.is_empty() {
        return PairIntersection::None;
    }

    let line_dir = na.cross(&nb);
    let line_len = line_dir.norm();
    if line_len < EPS * na.norm().max(nb.norm()) {
        // Exact sides said the triangles cross, but the planes are
        // numerically parallel without being coplanar.
        return PairIntersection::Degenerate("near-parallel planes with mixed orientation signs");
    }
    let line_dir = line_dir / line_len;
    let line_origin = pts_a[0];

    let interval_a = param_interval(&pts_a, &line_origin, &line_dir);
    let interval_b = param_interval(&pts_b, &line_origin, &line_dir);

    let lo = interval_a.0.max(interval_b.0);
    let hi = interval_a.1.min(interval_b.1);
    if !(lo.is_finite() && hi.is_finite()) {
        return PairIntersection::Degenerate("non-finite intersection interval");
    }
    if hi - lo < EPS {
        return PairIntersection::Touch;
    }

    // Reuse the exact crossing points computed above for the endpoints, so
    // adjacent faces that compute the same crossing get bit-identical
    // coordinates.
    let all_points = pts_a.iter().chain(pts_b.iter());
    let mut start = line_origin + line_dir * lo;
    let mut end = line_origin + line_dir * hi;
    for p in all_points {
        let t = (p - line_origin).dot(&line_dir);
        if (t - lo).abs() < EPS {
            start = *p;
        } else if (t - hi).abs() < EPS {
            end = *p;
        }
    }

    let kind = if lies_on_some_edge(&start, &end, ta) || lies_on_some_edge(&start, &end, tb) {
        SegmentKind::EdgeAligned
    } else {
        SegmentKind::Transversal
    };
    PairIntersection::Segments(vec![CutSegment { a: start, b: end, kind }])
}

/// Points where the boundary of `tri` meets the plane of `other`, using
/// the exact per-vertex sides. At most two distinct points for a valid
/// triangle; an edge lying in the plane contributes both its endpoints.
fn boundary_plane_crossings(
    tri: &[Point3<f64>; 3],
    sides: &[Side; 3],
    other: &[Point3<f64>; 3],
    other_normal: &Vector3<f64>,
) -> Vec<Point3<f64>> {
    let mut points: Vec<Point3<f64>> = Vec::with_capacity(2);
    let mut push = |p: Point3<f64>| {
        if !points.iter().any(|q| (p - q).norm() < EPS) {
            points.push(p);
        }
    };

    for k in 0..3 {
        let (i, j) = (k, (k + 1) % 3);
        match (sides[i], sides[j]) {
            (Side::On, _) => push(tri[i]),
            (Side::Front, Side::Back) | (Side::Back, Side::Front) => {
                push(edge_plane_crossing(&tri[i], &tri[j], other_normal, &other[0]));
            }
            _ => {}
        }
    }
    points
}

/// Crossing of edge (p, q) with the plane through `plane_point` with
/// normal `plane_normal`. Endpoints are ordered canonically first so the
/// two faces sharing the edge compute an identical result.
fn edge_plane_crossing(
    p: &Point3<f64>,
    q: &Point3<f64>,
    plane_normal: &Vector3<f64>,
    plane_point: &Point3<f64>,
) -> Point3<f64> {
    let (p, q) = if lex_less(q, p) { (q, p) } else { (p, q) };
    let dp = plane_normal.dot(&(p - plane_point));
    let dq = plane_normal.dot(&(q - plane_point));
    let denom = dp - dq;
    if denom.abs() < f64::MIN_POSITIVE {
        return Point3::from((p.coords + q.coords) / 2.0);
    }
    let t = (dp / denom).clamp(0.0, 1.0);
    p + (q - p) * t
}

fn lex_less(a: &Point3<f64>, b: &Point3<f64>) -> bool {
    (a.x, a.y, a.z) < (b.x, b.y, b.z)
}

fn param_interval(
    points: &[Point3<f64>],
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for p in points {
        let t = (p - origin).dot(dir);
        lo = lo.min(t);
        hi = hi.max(t);
    }
    (lo, hi)
}

/// Does the segment (a, b) lie along one of the triangle's edges?
fn lies_on_some_edge(a: &Point3<f64>, b: &Point3<f64>, tri: &[Point3<f64>; 3]) -> bool {
    for k in 0..3 {
        let (p, q) = (&tri[k], &tri[(k + 1) % 3]);
        if point_segment_distance(a, p, q) < EPS && point_segment_distance(b, p, q) < EPS {
            return true;
        }
    }
    false
}

/// Coplanar faces: project to 2D, clip one triangle against the other
/// (both are convex), and emit the overlap polygon's boundary edges as
/// cut segments. The overlap contributes boundary edges but no volume.
fn coplanar_overlap(ta: &[Point3<f64>; 3], tb: &[Point3<f64>; 3]) -> PairIntersection {
    let axis = projection_axis(&normal(ta));

    let mut subject: Vec<Point3<f64>> = ta.to_vec();
    if polygon_area_2d(&subject, axis) < 0.0 {
        subject.reverse();
    }
    let mut clip: Vec<Point3<f64>> = tb.to_vec();
    if polygon_area_2d(&clip, axis) < 0.0 {
        clip.reverse();
    }

    // Sutherland-Hodgman against each edge of the clip triangle.
    let mut poly = subject;
    for k in 0..3 {
        if poly.is_empty() {
            break;
        }
        let e0 = clip[k];
        let e1 = clip[(k + 1) % 3];
        poly = clip_by_half_plane(&poly, &e0, &e1, axis);
    }

    if poly.len() < 3 || polygon_area_2d(&poly, axis).abs() < EPS * EPS {
        // Degenerate overlap: shared edge or corner only.
        return PairIntersection::Touch;
    }
    if poly.iter().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
        return PairIntersection::Degenerate("non-finite coplanar clip result");
    }

    let mut segments = Vec::with_capacity(poly.len());
    for k in 0..poly.len() {
        let a = poly[k];
        let b = poly[(k + 1) % poly.len()];
        if (b - a).norm() < EPS {
            continue;
        }
        segments.push(CutSegment {
            a,
            b,
            kind: SegmentKind::CoplanarOverlap,
        });
    }
    if segments.is_empty() {
        return PairIntersection::Touch;
    }
    PairIntersection::Segments(segments)
}

fn polygon_area_2d(poly: &[Point3<f64>], axis: usize) -> f64 {
    let mut sum = 0.0;
    for k in 0..poly.len() {
        let (x0, y0) = project2(&poly[k], axis);
        let (x1, y1) = project2(&poly[(k + 1) % poly.len()], axis);
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

/// Keep the part of `poly` on the left of the directed line (e0, e1),
/// judged in the 2D projection. Crossing points are interpolated on the
/// original 3D edge so they stay on the common plane.
fn clip_by_half_plane(
    poly: &[Point3<f64>],
    e0: &Point3<f64>,
    e1: &Point3<f64>,
    axis: usize,
) -> Vec<Point3<f64>> {
    let a2 = project2(e0, axis);
    let b2 = project2(e1, axis);
    let side = |p: &Point3<f64>| predicates::orient2d_sign(a2, b2, project2(p, axis));

    let mut out = Vec::with_capacity(poly.len() + 1);
    for k in 0..poly.len() {
        let cur = poly[k];
        let next = poly[(k + 1) % poly.len()];
        let s_cur = side(&cur);
        let s_next = side(&next);

        if s_cur >= 0.0 {
            out.push(cur);
        }
        if (s_cur > 0.0 && s_next < 0.0) || (s_cur < 0.0 && s_next > 0.0) {
            // Edge crosses the clip line.
            let (cx, cy) = project2(&cur, axis);
            let (nx, ny) = project2(&next, axis);
            let denom = (b2.0 - a2.0) * (ny - cy) - (b2.1 - a2.1) * (nx - cx);
            if denom.abs() > f64::MIN_POSITIVE {
                let t = (((a2.0 - cx) * (a2.1 - b2.1)) - ((a2.1 - cy) * (a2.0 - b2.0))) / denom;
                let t = t.clamp(0.0, 1.0);
                out.push(cur + (next - cur) * t);
            }
        }
    }
    out
}
