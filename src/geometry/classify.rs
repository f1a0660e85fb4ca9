// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Fragment containment classification
//!
//! Decides, for every fragment of one mesh, where it sits relative to the
//! other solid: strictly inside, strictly outside, or on the boundary with
//! matching or opposing orientation. Fragments never straddle the boundary
//! at this point, so a single representative point (the centroid) decides
//! the whole fragment.
//!
//! Containment uses ray-crossing parity accelerated by the other mesh's
//! BVH. A cast that grazes an edge, vertex, or coplanar face is discarded
//! and retried along the next direction from a fixed skew list, so parity
//! is only ever read off a clean cast. Running out of directions is
//! reported as an error rather than guessed at.

use super::bvh::Bvh;
use super::mesh::Mesh;
use super::predicates::{point_triangle_distance, ray_triangle, RayHit, COINCIDENT_EPS};
use crate::error::CsgError;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

/// Where a fragment sits relative to the other solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentClass {
    Inside,
    Outside,
    /// On the other solid's surface with the same orientation.
    BoundarySame,
    /// On the other solid's surface with opposite orientation.
    BoundaryOpposite,
}

/// Fixed skew directions for parity casts. None is axis-aligned or
/// parallel to another, so a configuration that grazes along one of them
/// is overwhelmingly unlikely to graze along the next.
const RAY_DIRECTIONS: [[f64; 3]; 6] = [
    [0.294_917, 0.596_127, 0.746_823],
    [-0.671_431, 0.412_809, 0.615_327],
    [0.527_163, -0.718_241, 0.454_319],
    [0.381_537, 0.291_473, -0.877_151],
    [-0.443_219, -0.621_083, -0.646_317],
    [0.815_327, -0.172_419, -0.552_637],
];

/// Classify every fragment of every face of the source mesh against the
/// other solid. `fragments` is indexed by source face; the result mirrors
/// its shape. Parallel over faces.
pub fn classify_fragments(
    fragments: &[Vec<[Point3<f64>; 3]>],
    other: &Mesh,
    other_bvh: &Bvh,
) -> Result<Vec<Vec<FragmentClass>>, CsgError> {
    let other_bounds = other.bounding_box().dilated(COINCIDENT_EPS);
    fragments
        .par_iter()
        .enumerate()
        .map(|(face, frags)| {
            frags
                .iter()
                .map(|frag| classify_point(face, frag, other, other_bvh, &other_bounds))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

fn centroid(frag: &[Point3<f64>; 3]) -> Point3<f64> {
    Point3::from((frag[0].coords + frag[1].coords + frag[2].coords) / 3.0)
}

fn classify_point(
    source_face: usize,
    frag: &[Point3<f64>; 3],
    other: &Mesh,
    other_bvh: &Bvh,
    other_bounds: &super::BoundingBox,
) -> Result<FragmentClass, CsgError> {
    let point = centroid(frag);
    if other.is_empty() || !other_bounds.contains_point(&point) {
        return Ok(FragmentClass::Outside);
    }

    // Coincidence first: a fragment lying on the other surface must be
    // classified as boundary, not resolved by a parity cast that would
    // inevitably graze it.
    let mut candidates = Vec::new();
    other_bvh.query_box(
        &super::BoundingBox::from_points([point].iter()).dilated(COINCIDENT_EPS),
        &mut candidates,
    );
    for &f in &candidates {
        let tri = other.face_points(f);
        if point_triangle_distance(&point, &tri) < COINCIDENT_EPS {
            let frag_normal = (frag[1] - frag[0]).cross(&(frag[2] - frag[0]));
            let same = frag_normal.dot(&other.face_normal(f)) > 0.0;
            return Ok(if same {
                FragmentClass::BoundarySame
            } else {
                FragmentClass::BoundaryOpposite
            });
        }
    }

    // Parity cast, retried on grazing.
    let mut last_grazed = 0usize;
    for dir in &RAY_DIRECTIONS {
        let dir = Vector3::new(dir[0], dir[1], dir[2]);
        match parity_cast(&point, &dir, other, other_bvh) {
            ParityOutcome::Crossings(n) => {
                return Ok(if n % 2 == 1 {
                    FragmentClass::Inside
                } else {
                    FragmentClass::Outside
                });
            }
            ParityOutcome::Grazed(face) => last_grazed = face,
        }
    }
    Err(CsgError::DegenerateGeometry {
        face_a: source_face,
        face_b: last_grazed,
        reason: "containment ray grazed the surface in every cast direction".into(),
    })
}

enum ParityOutcome {
    Crossings(usize),
    /// The cast grazed this face and its parity is unreliable.
    Grazed(usize),
}

fn parity_cast(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    other: &Mesh,
    other_bvh: &Bvh,
) -> ParityOutcome {
    let mut candidates = Vec::new();
    other_bvh.query_ray(origin, dir, &mut candidates);

    let mut crossings = 0usize;
    for &f in &candidates {
        match ray_triangle(origin, dir, &other.face_points(f)) {
            RayHit::Miss => {}
            RayHit::Hit(_) => crossings += 1,
            RayHit::Grazing => return ParityOutcome::Grazed(f),
        }
    }
    ParityOutcome::Crossings(crossings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::cuboid;

    fn frag_at(p: [f64; 3]) -> [Point3<f64>; 3] {
        // Small triangle centered at p, lying in the z plane through p.
        let c = Point3::from(p);
        [
            Point3::new(c.x - 0.01, c.y - 0.01, c.z),
            Point3::new(c.x + 0.02, c.y - 0.01, c.z),
            Point3::new(c.x - 0.01, c.y + 0.02, c.z),
        ]
    }

    #[test]
    fn test_inside_and_outside() {
        let cube = cuboid(Vector3::new(2.0, 2.0, 2.0));
        let bvh = Bvh::build(&cube);

        let inside = classify_point(
            0,
            &frag_at([1.0, 1.0, 1.0]),
            &cube,
            &bvh,
            &cube.bounding_box().dilated(COINCIDENT_EPS),
        )
        .unwrap();
        assert_eq!(inside, FragmentClass::Inside);

        let outside = classify_point(
            0,
            &frag_at([5.0, 5.0, 5.0]),
            &cube,
            &bvh,
            &cube.bounding_box().dilated(COINCIDENT_EPS),
        )
        .unwrap();
        assert_eq!(outside, FragmentClass::Outside);
    }

    #[test]
    fn test_boundary_same_and_opposite() {
        let cube = cuboid(Vector3::new(2.0, 2.0, 2.0));
        let bvh = Bvh::build(&cube);
        let bounds = cube.bounding_box().dilated(COINCIDENT_EPS);

        // Fragment in the top face plane (z = 2), normal +z like the
        // cube's top face.
        let same = classify_point(0, &frag_at([1.0, 1.0, 2.0]), &cube, &bvh, &bounds).unwrap();
        assert_eq!(same, FragmentClass::BoundarySame);

        // Same position, winding flipped.
        let mut flipped = frag_at([1.0, 1.0, 2.0]);
        flipped.swap(1, 2);
        let opposite = classify_point(0, &flipped, &cube, &bvh, &bounds).unwrap();
        assert_eq!(opposite, FragmentClass::BoundaryOpposite);
    }

    #[test]
    fn test_empty_other_is_outside() {
        let empty = Mesh::empty();
        let bvh = Bvh::build(&empty);
        let class = classify_point(
            0,
            &frag_at([0.0, 0.0, 0.0]),
            &empty,
            &bvh,
            &empty.bounding_box(),
        )
        .unwrap();
        assert_eq!(class, FragmentClass::Outside);
    }

    #[test]
    fn test_whole_mesh_fragments() {
        let a = cuboid(Vector3::new(2.0, 2.0, 2.0));
        let b = cuboid(Vector3::new(10.0, 10.0, 10.0)).translated(Vector3::new(-4.0, -4.0, -4.0));
        let bvh_b = Bvh::build(&b);

        // Every face of a, uncut, sits strictly inside b.
        let fragments: Vec<Vec<[Point3<f64>; 3]>> =
            (0..a.face_count()).map(|f| vec![a.face_points(f)]).collect();
        let classes = classify_fragments(&fragments, &b, &bvh_b).unwrap();
        assert!(classes
            .iter()
            .flatten()
            .all(|&c| c == FragmentClass::Inside));
    }
}
