// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Algebraic properties of the boolean operators on overlapping solids.

use approx::assert_relative_eq;
use nalgebra::{Rotation3, Vector3};
use solidcut::{cuboid, Mesh};

/// Two unit-ish cubes overlapping in a 1 x 1 x 1 corner region.
fn overlapping_pair() -> (Mesh, Mesh) {
    let a = cuboid(Vector3::new(2.0, 2.0, 2.0));
    let b = cuboid(Vector3::new(2.0, 2.0, 2.0)).translated(Vector3::new(1.0, 1.0, 1.0));
    (a, b)
}

#[test]
fn test_union_volume_identity() {
    let (a, b) = overlapping_pair();
    let union = a.union(&b).unwrap();
    let intersection = a.intersect(&b).unwrap();

    union.validate().unwrap();
    assert_relative_eq!(
        union.volume(),
        a.volume() + b.volume() - intersection.volume(),
        epsilon = 1e-6
    );
    assert_relative_eq!(union.volume(), 15.0, epsilon = 1e-6);
}

#[test]
fn test_intersection_volume() {
    let (a, b) = overlapping_pair();
    let intersection = a.intersect(&b).unwrap();

    intersection.validate().unwrap();
    assert_relative_eq!(intersection.volume(), 1.0, epsilon = 1e-6);
}

#[test]
fn test_subtract_volume_identity() {
    let (a, b) = overlapping_pair();
    let difference = a.subtract(&b).unwrap();
    let intersection = a.intersect(&b).unwrap();

    difference.validate().unwrap();
    assert_relative_eq!(
        difference.volume(),
        a.volume() - intersection.volume(),
        epsilon = 1e-6
    );
    assert_relative_eq!(difference.volume(), 7.0, epsilon = 1e-6);
}

#[test]
fn test_union_commutes() {
    let (a, b) = overlapping_pair();
    let ab = a.union(&b).unwrap();
    let ba = b.union(&a).unwrap();
    assert_relative_eq!(ab.volume(), ba.volume(), epsilon = 1e-6);
}

#[test]
fn test_intersect_commutes() {
    let (a, b) = overlapping_pair();
    let ab = a.intersect(&b).unwrap();
    let ba = b.intersect(&a).unwrap();
    assert_relative_eq!(ab.volume(), ba.volume(), epsilon = 1e-6);
}

#[test]
fn test_subtract_is_not_symmetric_but_partitions() {
    // vol(A - B) + vol(B - A) + vol(A n B) = vol(A u B)
    let (a, b) = overlapping_pair();
    let ab = a.subtract(&b).unwrap();
    let ba = b.subtract(&a).unwrap();
    let isect = a.intersect(&b).unwrap();
    let union = a.union(&b).unwrap();

    assert_relative_eq!(
        ab.volume() + ba.volume() + isect.volume(),
        union.volume(),
        epsilon = 1e-6
    );
}

#[test]
fn test_outputs_are_closed_manifolds() {
    let (a, b) = overlapping_pair();
    for result in [
        a.union(&b).unwrap(),
        a.intersect(&b).unwrap(),
        a.subtract(&b).unwrap(),
    ] {
        result.validate().unwrap();
        assert!(result.volume() > 0.0);
        // Sphere-like solids.
        assert_eq!(result.euler_characteristic(), 2);
    }
}

#[test]
fn test_self_intersection_is_identity() {
    let a = cuboid(Vector3::new(2.0, 3.0, 4.0));
    let same = a.intersect(&a.clone()).unwrap();
    same.validate().unwrap();
    assert_relative_eq!(same.volume(), a.volume(), epsilon = 1e-6);
}

#[test]
fn test_self_subtraction_is_empty() {
    let a = cuboid(Vector3::new(2.0, 3.0, 4.0));
    let nothing = a.subtract(&a.clone()).unwrap();
    assert!(nothing.is_empty());
    assert_eq!(nothing.volume(), 0.0);
}

#[test]
fn test_self_union_is_identity() {
    let a = cuboid(Vector3::new(2.0, 3.0, 4.0));
    let same = a.union(&a.clone()).unwrap();
    same.validate().unwrap();
    assert_relative_eq!(same.volume(), a.volume(), epsilon = 1e-6);
}

#[test]
fn test_contained_operand() {
    // B strictly inside A: no surface intersection at all.
    let a = cuboid(Vector3::new(4.0, 4.0, 4.0));
    let b = cuboid(Vector3::new(2.0, 2.0, 2.0)).translated(Vector3::new(1.0, 1.0, 1.0));

    let union = a.union(&b).unwrap();
    assert_relative_eq!(union.volume(), 64.0, epsilon = 1e-6);

    let isect = a.intersect(&b).unwrap();
    assert_relative_eq!(isect.volume(), 8.0, epsilon = 1e-6);

    // Subtract leaves an internal cavity: volume drops, mesh stays closed.
    let diff = a.subtract(&b).unwrap();
    diff.validate().unwrap();
    assert_relative_eq!(diff.volume(), 56.0, epsilon = 1e-6);
}

#[test]
fn test_drill_through_slab() {
    // Drill overshoots the slab on both sides, so its walls end mid-face
    // on the slab's top and bottom rather than flush with them.
    let slab = cuboid(Vector3::new(5.0, 5.0, 1.0));
    let drill = cuboid(Vector3::new(1.0, 1.0, 3.0)).translated(Vector3::new(2.0, 2.0, -1.0));

    let pierced = slab.subtract(&drill).unwrap();
    pierced.validate().unwrap();
    assert_relative_eq!(pierced.volume(), 24.0, epsilon = 1e-6);
    // A through-hole makes the solid a torus.
    assert_eq!(pierced.euler_characteristic(), 0);
}

#[test]
fn test_partial_penetration_leaves_pocket() {
    // The drill enters through the top face only; its tip floats inside
    // the block.
    let block = cuboid(Vector3::new(4.0, 4.0, 2.0));
    let drill = cuboid(Vector3::new(1.0, 1.0, 2.0)).translated(Vector3::new(1.5, 1.5, 1.0));

    let pocketed = block.subtract(&drill).unwrap();
    pocketed.validate().unwrap();
    assert_relative_eq!(pocketed.volume(), 31.0, epsilon = 1e-6);
    // A blind pocket keeps the solid sphere-like.
    assert_eq!(pocketed.euler_characteristic(), 2);
}

#[test]
fn test_half_overlap_single_axis() {
    // 50% overlap along x only: four side planes are flush, the two
    // interior walls cut transversally.
    let a = cuboid(Vector3::new(2.0, 2.0, 2.0));
    let b = cuboid(Vector3::new(2.0, 2.0, 2.0)).translated(Vector3::new(1.0, 0.0, 0.0));

    let union = a.union(&b).unwrap();
    union.validate().unwrap();
    assert_relative_eq!(union.volume(), 12.0, epsilon = 1e-6);

    let isect = a.intersect(&b).unwrap();
    isect.validate().unwrap();
    assert_relative_eq!(isect.volume(), 4.0, epsilon = 1e-6);

    let diff = a.subtract(&b).unwrap();
    diff.validate().unwrap();
    assert_relative_eq!(diff.volume(), 4.0, epsilon = 1e-6);
}

fn check_rotated_operand(angle: f64) {
    let a = cuboid(Vector3::new(2.0, 2.0, 2.0));
    let b = cuboid(Vector3::new(2.0, 2.0, 2.0))
        .rotated(&Rotation3::from_axis_angle(&Vector3::z_axis(), angle))
        .translated(Vector3::new(1.0, 0.5, 0.5));

    let union = a.union(&b).unwrap();
    let isect = a.intersect(&b).unwrap();
    let diff = a.subtract(&b).unwrap();
    union.validate().unwrap();
    isect.validate().unwrap();
    diff.validate().unwrap();

    let overlap = isect.volume();
    assert!(overlap > 0.0 && overlap < a.volume());
    assert_relative_eq!(
        union.volume(),
        a.volume() + b.volume() - overlap,
        epsilon = 1e-6
    );
    assert_relative_eq!(diff.volume(), a.volume() - overlap, epsilon = 1e-6);
}

#[test]
fn test_rotated_operand() {
    // No axis alignment between the operands' vertical faces.
    check_rotated_operand(0.3);
}

#[test]
fn test_rotated_operand_steep_angle() {
    check_rotated_operand(0.7);
}
