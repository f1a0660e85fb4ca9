// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Face retriangulation along intersection cuts
//!
//! Subdivides each cut face into triangular fragments such that the
//! intersection polyline runs exactly along fragment edges. Fragments
//! inherit the winding of their parent face, lie in its plane, and tile
//! it exactly.
//!
//! Two passes per face: first every segment endpoint and every proper
//! segment-segment crossing is inserted as a fragment vertex (split in
//! two on an edge, in three in the interior), then every area-cutting
//! segment is enforced as a constrained edge. Constraint insertion never
//! creates a vertex: the fragments the segment crosses are removed and
//! the two halves of the resulting cavity are re-triangulated from the
//! vertices already present. The vertices along the cut are therefore
//! exactly the segment endpoints and crossings, which both meshes derive
//! from the same pair data, so their subdivisions agree edge for edge.
//! Edge-aligned segments take part only in the first pass; they are
//! zero-width and cut no area, but their endpoints still subdivide the
//! face so that both meshes agree on the vertices along a shared edge.

use super::intersection::{CutSegment, SegmentKind};
use super::mesh::Mesh;
use super::predicates::{point_in_triangle_2d, point_segment_distance, project2, projection_axis, EPS};
use nalgebra::Point3;
use rayon::prelude::*;

/// Subdivide every face of `mesh` along its cut segments. Returns one
/// fragment list per face; uncut faces keep their single triangle.
pub fn retriangulate_mesh(
    mesh: &Mesh,
    cuts: &[Vec<CutSegment>],
) -> Vec<Vec<[Point3<f64>; 3]>> {
    (0..mesh.face_count())
        .into_par_iter()
        .map(|f| {
            let tri = mesh.face_points(f);
            if cuts[f].is_empty() {
                vec![tri]
            } else {
                retriangulate_face(&tri, &cuts[f])
            }
        })
        .collect()
}

/// Subdivide a single triangle along its cut segments.
pub fn retriangulate_face(
    tri: &[Point3<f64>; 3],
    segments: &[CutSegment],
) -> Vec<[Point3<f64>; 3]> {
    let normal = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    let axis = projection_axis(&normal);

    let mut fragments = vec![*tri];

    // Pass 1: segment endpoints and crossings become fragment vertices.
    for seg in segments {
        insert_point(&mut fragments, &seg.a, axis);
        insert_point(&mut fragments, &seg.b, axis);
    }
    for p in segment_crossings(segments, axis) {
        insert_point(&mut fragments, &p, axis);
    }

    // Pass 2: area-cutting segments become constrained fragment edges.
    for seg in segments {
        if seg.kind == SegmentKind::EdgeAligned {
            continue;
        }
        insert_constraint(&mut fragments, &seg.a, &seg.b, axis);
    }

    fragments
}

/// A fragment thinner than the welding resolution collapses later anyway;
/// skip it at creation so both meshes drop the same slivers.
fn is_collapsed(frag: &[Point3<f64>; 3]) -> bool {
    (frag[0] - frag[1]).norm() < EPS
        || (frag[1] - frag[2]).norm() < EPS
        || (frag[2] - frag[0]).norm() < EPS
}

fn push_fragment(out: &mut Vec<[Point3<f64>; 3]>, frag: [Point3<f64>; 3]) {
    if !is_collapsed(&frag) {
        out.push(frag);
    }
}

fn cross2(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn signed_area2(frag: &[Point3<f64>; 3], axis: usize) -> f64 {
    cross2(
        project2(&frag[0], axis),
        project2(&frag[1], axis),
        project2(&frag[2], axis),
    )
}

fn dist2_point_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let len_sq = abx * abx + aby * aby;
    if len_sq < EPS * EPS {
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    let t = (((p.0 - a.0) * abx + (p.1 - a.1) * aby) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + abx * t, a.1 + aby * t);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Points where two area-cutting segments properly cross in the face
/// plane. Crossings at shared endpoints are already vertices and are
/// excluded. Both owning faces of each segment compute the same crossing
/// from the same segment coordinates.
fn segment_crossings(segments: &[CutSegment], axis: usize) -> Vec<Point3<f64>> {
    let mut out: Vec<Point3<f64>> = Vec::new();
    for i in 0..segments.len() {
        if segments[i].kind == SegmentKind::EdgeAligned {
            continue;
        }
        for j in (i + 1)..segments.len() {
            if segments[j].kind == SegmentKind::EdgeAligned {
                continue;
            }
            let (s, r) = (&segments[i], &segments[j]);
            let a0 = project2(&s.a, axis);
            let a1 = project2(&s.b, axis);
            let b0 = project2(&r.a, axis);
            let b1 = project2(&r.b, axis);
            let da = (a1.0 - a0.0, a1.1 - a0.1);
            let db = (b1.0 - b0.0, b1.1 - b0.1);
            let denom = da.0 * db.1 - da.1 * db.0;
            let len_a = (da.0 * da.0 + da.1 * da.1).sqrt();
            let len_b = (db.0 * db.0 + db.1 * db.1).sqrt();
            if denom.abs() <= EPS * len_a * len_b {
                // Parallel or collinear: overlaps are resolved by the
                // segments' own endpoints.
                continue;
            }
            let t = ((b0.0 - a0.0) * db.1 - (b0.1 - a0.1) * db.0) / denom;
            let u = ((b0.0 - a0.0) * da.1 - (b0.1 - a0.1) * da.0) / denom;
            if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
                continue;
            }
            let p = s.a + (s.b - s.a) * t;
            let near_endpoint = [&s.a, &s.b, &r.a, &r.b]
                .iter()
                .any(|e| (p - **e).norm() < EPS);
            if !near_endpoint && !out.iter().any(|q| (p - q).norm() < EPS) {
                out.push(p);
            }
        }
    }
    out
}

/// Insert `p` as a vertex of whichever fragments it lies in. A point on a
/// fragment edge splits that fragment in two; a point in the interior
/// splits it in three; a point at an existing corner changes nothing.
fn insert_point(fragments: &mut Vec<[Point3<f64>; 3]>, p: &Point3<f64>, axis: usize) {
    let mut next = Vec::with_capacity(fragments.len() + 2);
    for frag in fragments.drain(..) {
        if frag.iter().any(|c| (c - p).norm() < EPS) {
            next.push(frag);
            continue;
        }

        let mut on_edge = None;
        for k in 0..3 {
            if point_segment_distance(p, &frag[k], &frag[(k + 1) % 3]) < EPS {
                on_edge = Some(k);
                break;
            }
        }
        if let Some(k) = on_edge {
            let (i, j, opposite) = (k, (k + 1) % 3, (k + 2) % 3);
            push_fragment(&mut next, [frag[i], *p, frag[opposite]]);
            push_fragment(&mut next, [*p, frag[j], frag[opposite]]);
            continue;
        }

        let inside = point_in_triangle_2d(
            project2(p, axis),
            project2(&frag[0], axis),
            project2(&frag[1], axis),
            project2(&frag[2], axis),
        );
        if inside {
            push_fragment(&mut next, [frag[0], frag[1], *p]);
            push_fragment(&mut next, [frag[1], frag[2], *p]);
            push_fragment(&mut next, [frag[2], frag[0], *p]);
        } else {
            next.push(frag);
        }
    }
    *fragments = next;
}

/// Nearest existing fragment corner within tolerance of `p`, so the
/// constraint endpoints are bit-identical to the vertices pass 1 made.
fn snap_to_corner(fragments: &[[Point3<f64>; 3]], p: &Point3<f64>) -> Point3<f64> {
    for frag in fragments {
        for c in frag {
            if (c - p).norm() < EPS {
                return *c;
            }
        }
    }
    *p
}

/// Force the open segment (a, b) to run along fragment edges. The segment
/// is first split at every existing vertex lying on it (collinear
/// sub-segments from neighboring pairs meet at such vertices), then each
/// span is carved in without creating any vertex.
fn insert_constraint(
    fragments: &mut Vec<[Point3<f64>; 3]>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    axis: usize,
) {
    let a = snap_to_corner(fragments, a);
    let b = snap_to_corner(fragments, b);
    let dir = b - a;
    let len_sq = dir.norm_squared();
    if len_sq < EPS * EPS {
        return;
    }

    let mut stations: Vec<(f64, Point3<f64>)> = vec![(0.0, a), (1.0, b)];
    for frag in fragments.iter() {
        for c in frag {
            if (c - a).norm() < EPS || (c - b).norm() < EPS {
                continue;
            }
            if point_segment_distance(c, &a, &b) < EPS {
                let t = (c - a).dot(&dir) / len_sq;
                if t > 0.0 && t < 1.0 && !stations.iter().any(|(_, s)| (s - c).norm() < EPS) {
                    stations.push((t, *c));
                }
            }
        }
    }
    stations.sort_by(|x, y| x.0.total_cmp(&y.0));

    for w in stations.windows(2) {
        insert_span(fragments, &w[0].1, &w[1].1, axis);
    }
}

/// Carve one constraint span, whose endpoints are existing vertices and
/// whose interior contains no vertex, into the triangulation. Fragments
/// properly crossed by the span form a cavity; the cavity boundary is
/// split at the span endpoints into two chains, and each chain is
/// re-triangulated with the span as one of its edges.
fn insert_span(
    fragments: &mut Vec<[Point3<f64>; 3]>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    axis: usize,
) {
    let mut cavity: Vec<usize> = Vec::new();
    for (idx, frag) in fragments.iter().enumerate() {
        if span_crosses_interior(frag, a, b, axis) {
            cavity.push(idx);
        }
    }
    if cavity.is_empty() {
        // Already an edge of the triangulation.
        return;
    }
    let orient = signed_area2(&fragments[cavity[0]], axis);

    // Cavity boundary: edges not shared between two cavity members. The
    // fragments all wind the same way, so shared edges cancel as
    // opposite directed pairs and the survivors form one oriented loop.
    let mut edges: Vec<(Point3<f64>, Point3<f64>)> = Vec::new();
    for &idx in &cavity {
        let f = &fragments[idx];
        for k in 0..3 {
            let e = (f[k], f[(k + 1) % 3]);
            if let Some(pos) = edges
                .iter()
                .position(|(p, q)| (p - e.1).norm() < EPS && (q - e.0).norm() < EPS)
            {
                edges.swap_remove(pos);
            } else {
                edges.push(e);
            }
        }
    }
    if edges.len() < 4 {
        return;
    }

    let mut loop_pts: Vec<Point3<f64>> = Vec::with_capacity(edges.len());
    let first = edges.swap_remove(0);
    loop_pts.push(first.0);
    let mut cursor = first.1;
    while !edges.is_empty() {
        let Some(pos) = edges.iter().position(|(p, _)| (p - cursor).norm() < EPS) else {
            return;
        };
        loop_pts.push(cursor);
        cursor = edges.swap_remove(pos).1;
    }

    let Some(ia) = loop_pts.iter().position(|p| (p - a).norm() < EPS) else {
        return;
    };
    let Some(ib) = loop_pts.iter().position(|p| (p - b).norm() < EPS) else {
        return;
    };
    if ia == ib {
        return;
    }

    let n = loop_pts.len();
    let mut chain_a = Vec::new();
    let mut i = ia;
    loop {
        chain_a.push(loop_pts[i]);
        if i == ib {
            break;
        }
        i = (i + 1) % n;
    }
    let mut chain_b = Vec::new();
    let mut i = ib;
    loop {
        chain_b.push(loop_pts[i]);
        if i == ia {
            break;
        }
        i = (i + 1) % n;
    }

    let mut pieces = ear_clip(&chain_a, axis);
    pieces.extend(ear_clip(&chain_b, axis));
    if pieces.is_empty() {
        return;
    }

    for &idx in cavity.iter().rev() {
        fragments.swap_remove(idx);
    }
    for mut piece in pieces {
        if signed_area2(&piece, axis) * orient < 0.0 {
            piece.swap(1, 2);
        }
        push_fragment(fragments, piece);
    }
}

/// True when the open span (a, b) passes through the fragment's interior,
/// rather than missing it or running along one of its edges.
fn span_crosses_interior(
    frag: &[Point3<f64>; 3],
    a: &Point3<f64>,
    b: &Point3<f64>,
    axis: usize,
) -> bool {
    let f2 = [
        project2(&frag[0], axis),
        project2(&frag[1], axis),
        project2(&frag[2], axis),
    ];
    let sf = cross2(f2[0], f2[1], f2[2]);
    if sf == 0.0 {
        return false;
    }
    let s = sf.signum();
    let a2 = project2(a, axis);
    let b2 = project2(b, axis);

    // Clip the span to the fragment, tracking the parameter interval.
    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    for k in 0..3 {
        let e0 = cross2(f2[k], f2[(k + 1) % 3], a2) * s;
        let e1 = cross2(f2[k], f2[(k + 1) % 3], b2) * s;
        if e0 < 0.0 && e1 < 0.0 {
            return false;
        }
        if e0 >= 0.0 && e1 >= 0.0 {
            continue;
        }
        let t = e0 / (e0 - e1);
        if e0 >= 0.0 {
            hi = hi.min(t);
        } else {
            lo = lo.max(t);
        }
        if lo >= hi {
            return false;
        }
    }
    if hi - lo < 1e-9 {
        return false;
    }

    let m = a + (b - a) * ((lo + hi) / 2.0);
    let m2 = project2(&m, axis);
    for k in 0..3 {
        if dist2_point_segment(m2, f2[k], f2[(k + 1) % 3]) < EPS {
            return false;
        }
    }
    point_in_triangle_2d(m2, f2[0], f2[1], f2[2])
}

/// Triangulate a simple polygon by ear clipping. Flat vertices are never
/// clipped across (that would bridge over a vertex the neighboring
/// fragments keep), and any vertex inside or on a candidate ear blocks
/// it.
fn ear_clip(poly: &[Point3<f64>], axis: usize) -> Vec<[Point3<f64>; 3]> {
    if poly.len() < 3 {
        return Vec::new();
    }
    let mut verts = poly.to_vec();
    let pts2: Vec<(f64, f64)> = verts.iter().map(|p| project2(p, axis)).collect();
    let mut area = 0.0;
    for i in 0..pts2.len() {
        let j = (i + 1) % pts2.len();
        area += pts2[i].0 * pts2[j].1 - pts2[j].0 * pts2[i].1;
    }
    if area < 0.0 {
        verts.reverse();
    }

    let mut out = Vec::new();
    while verts.len() > 3 {
        let n = verts.len();
        let mut ear = None;
        for i in 0..n {
            let prev = verts[(i + n - 1) % n];
            let cur = verts[i];
            let next = verts[(i + 1) % n];
            let p2 = project2(&prev, axis);
            let c2 = project2(&cur, axis);
            let n2 = project2(&next, axis);
            let turn = cross2(p2, c2, n2);
            let leg_a = ((c2.0 - p2.0).powi(2) + (c2.1 - p2.1).powi(2)).sqrt();
            let leg_b = ((n2.0 - c2.0).powi(2) + (n2.1 - c2.1).powi(2)).sqrt();
            if turn <= EPS * leg_a * leg_b {
                continue;
            }
            let blocked = verts.iter().enumerate().any(|(j, w)| {
                j != i
                    && j != (i + 1) % n
                    && j != (i + n - 1) % n
                    && point_in_triangle_2d(project2(w, axis), p2, c2, n2)
            });
            if !blocked {
                ear = Some(i);
                break;
            }
        }
        match ear {
            Some(i) => {
                let n = verts.len();
                out.push([verts[(i + n - 1) % n], verts[i], verts[(i + 1) % n]]);
                verts.remove(i);
            }
            None => {
                // Numerically stuck; a fan still tiles the region.
                for k in 1..verts.len() - 1 {
                    out.push([verts[0], verts[k], verts[k + 1]]);
                }
                return out;
            }
        }
    }
    out.push([verts[0], verts[1], verts[2]]);
    out
}
