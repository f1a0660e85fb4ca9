// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Touching, flush, and coincident configurations. These are the cases
//! a naive boolean engine turns into slivers, doubled walls, or open
//! shells; here each must come out as a clean closed manifold.

use approx::assert_relative_eq;
use nalgebra::Vector3;
use solidcut::{cuboid, Mesh};

#[test]
fn test_shared_face_union() {
    // Two boxes flush along a full face. The interior wall must vanish.
    let a = cuboid(Vector3::new(1.0, 1.0, 1.0));
    let b = cuboid(Vector3::new(1.0, 1.0, 1.0)).translated(Vector3::new(1.0, 0.0, 0.0));

    let out = a.union(&b).unwrap();
    out.validate().unwrap();
    assert_relative_eq!(out.volume(), 2.0, epsilon = 1e-6);
    // Box surface of the merged 2 x 1 x 1 solid; no internal wall area.
    assert_relative_eq!(out.surface_area(), 10.0, epsilon = 1e-6);
    assert_eq!(out.euler_characteristic(), 2);
}

#[test]
fn test_shared_partial_face_union() {
    // The smaller box sits flush against a larger face, covering part of it.
    let a = cuboid(Vector3::new(2.0, 2.0, 2.0));
    let b = cuboid(Vector3::new(1.0, 1.0, 1.0)).translated(Vector3::new(2.0, 0.5, 0.5));

    let out = a.union(&b).unwrap();
    out.validate().unwrap();
    assert_relative_eq!(out.volume(), 9.0, epsilon = 1e-6);
}

#[test]
fn test_no_degenerate_faces_in_output() {
    let a = cuboid(Vector3::new(1.0, 1.0, 1.0));
    let b = cuboid(Vector3::new(1.0, 1.0, 1.0)).translated(Vector3::new(1.0, 0.0, 0.0));
    let out = a.union(&b).unwrap();
    for f in 0..out.face_count() {
        assert!(out.face_area_vector(f).norm() / 2.0 > 1e-12);
    }
}

#[test]
fn test_edge_touching_cubes_union_is_reported() {
    use solidcut::CsgError;

    // Boxes sharing only an edge: four faces would meet along the contact
    // edge, which no closed 2-manifold can represent. The engine must
    // report that instead of returning a pinched mesh.
    let a = cuboid(Vector3::new(1.0, 1.0, 1.0));
    let b = cuboid(Vector3::new(1.0, 1.0, 1.0)).translated(Vector3::new(1.0, 1.0, 0.0));

    let result = a.union(&b);
    assert!(matches!(result, Err(CsgError::NonManifoldResult { .. })));
}

#[test]
fn test_coincident_solids() {
    let a = cuboid(Vector3::new(1.5, 2.5, 3.5));

    let same = a.intersect(&a.clone()).unwrap();
    assert_relative_eq!(same.volume(), a.volume(), epsilon = 1e-6);
    same.validate().unwrap();

    let nothing = a.subtract(&a.clone()).unwrap();
    assert!(nothing.is_empty());

    let union = a.union(&a.clone()).unwrap();
    assert_relative_eq!(union.volume(), a.volume(), epsilon = 1e-6);
}

#[test]
fn test_flush_subtract_opens_face() {
    // Subtracting a box flush with one side bites a notch out of it.
    let a = cuboid(Vector3::new(2.0, 2.0, 2.0));
    let b = cuboid(Vector3::new(1.0, 1.0, 1.0)).translated(Vector3::new(1.0, 0.5, 0.5));

    let out = a.subtract(&b).unwrap();
    out.validate().unwrap();
    assert_relative_eq!(out.volume(), 7.0, epsilon = 1e-6);
    assert_eq!(out.euler_characteristic(), 2);
}

#[test]
fn test_invalid_input_rejected() {
    use nalgebra::Point3;
    use solidcut::CsgError;

    // One triangle: not closed.
    let open = Mesh::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2]],
    );
    assert!(matches!(open, Err(CsgError::InvalidMesh { .. })));
}
