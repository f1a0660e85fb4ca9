// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Solid primitives

use super::mesh::Mesh;
use nalgebra::{Point3, Vector3};

/// Axis-aligned box with one corner at the origin and the opposite corner
/// at `size`. All faces wind outward.
pub fn cuboid(size: Vector3<f64>) -> Mesh {
    let (sx, sy, sz) = (size.x, size.y, size.z);
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(sx, 0.0, 0.0),
        Point3::new(sx, sy, 0.0),
        Point3::new(0.0, sy, 0.0),
        Point3::new(0.0, 0.0, sz),
        Point3::new(sx, 0.0, sz),
        Point3::new(sx, sy, sz),
        Point3::new(0.0, sy, sz),
    ];
    let faces = vec![
        // bottom (-z), top (+z)
        [0, 3, 2],
        [0, 2, 1],
        [4, 5, 6],
        [4, 6, 7],
        // front (-y), back (+y)
        [0, 1, 5],
        [0, 5, 4],
        [3, 7, 6],
        [3, 6, 2],
        // left (-x), right (+x)
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    // Correct by construction; skipping validation keeps this infallible.
    Mesh::from_parts_unchecked(vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cuboid_is_valid_closed_solid() {
        let mesh = cuboid(Vector3::new(2.0, 3.0, 4.0));
        mesh.validate().unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 12);
        assert_eq!(mesh.euler_characteristic(), 2);
        assert_relative_eq!(mesh.volume(), 24.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cuboid_normals_point_outward() {
        let mesh = cuboid(Vector3::new(1.0, 1.0, 1.0));
        let center = Point3::new(0.5, 0.5, 0.5);
        for f in 0..mesh.face_count() {
            let [v0, v1, v2] = mesh.face_points(f);
            let centroid = Point3::from((v0.coords + v1.coords + v2.coords) / 3.0);
            assert!(mesh.face_normal(f).dot(&(centroid - center)) > 0.0);
        }
    }
}
