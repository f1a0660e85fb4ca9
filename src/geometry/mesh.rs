// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Triangle mesh representation
//!
//! A `Mesh` is a flat vertex array plus a face-index array. Construction
//! validates the closed 2-manifold invariant: every edge is shared by
//! exactly two faces with opposite winding. Both boolean inputs and the
//! boolean output must satisfy it; the engine never returns a mesh that
//! does not.
//!
//! Adjacency is represented through indices into the flat arrays, never
//! through owning references.

use super::BoundingBox;
use crate::error::CsgError;
use nalgebra::{Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Faces with area below this are rejected as degenerate.
pub const DEGENERATE_AREA: f64 = 1e-12;

/// Triangular mesh with positions and face indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
}

impl Mesh {
    /// Construct a mesh and validate the 2-manifold invariant.
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Result<Self, CsgError> {
        let mesh = Self { vertices, faces };
        mesh.validate()?;
        Ok(mesh)
    }

    /// The empty mesh. Vacuously closed; identity element for Union.
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Construct without validation. Used by assembly while the result is
    /// still being stitched; the caller must validate before returning the
    /// mesh to users.
    pub(crate) fn from_parts_unchecked(vertices: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// The three corner positions of face `face`.
    pub fn face_points(&self, face: usize) -> [Point3<f64>; 3] {
        let [i0, i1, i2] = self.faces[face];
        [self.vertices[i0], self.vertices[i1], self.vertices[i2]]
    }

    /// Outward unit normal of face `face`, computed from the winding.
    pub fn face_normal(&self, face: usize) -> Vector3<f64> {
        let [v0, v1, v2] = self.face_points(face);
        (v1 - v0).cross(&(v2 - v0)).normalize()
    }

    /// Twice-signed area vector of face `face` (unnormalized normal).
    pub fn face_area_vector(&self, face: usize) -> Vector3<f64> {
        let [v0, v1, v2] = self.face_points(face);
        (v1 - v0).cross(&(v2 - v0))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter())
    }

    /// Rigid translation of every vertex.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    pub fn translated(mut self, offset: Vector3<f64>) -> Self {
        self.translate(offset);
        self
    }

    /// Rigid rotation of every vertex about the origin.
    pub fn rotate(&mut self, rotation: &Rotation3<f64>) {
        for v in &mut self.vertices {
            *v = rotation * *v;
        }
    }

    pub fn rotated(mut self, rotation: &Rotation3<f64>) -> Self {
        self.rotate(rotation);
        self
    }

    /// Enclosed volume via the divergence theorem. Positive for outward
    /// consistent winding.
    pub fn volume(&self) -> f64 {
        let mut six_vol = 0.0;
        for face in 0..self.faces.len() {
            let [v0, v1, v2] = self.face_points(face);
            six_vol += v0.coords.dot(&v1.coords.cross(&v2.coords));
        }
        six_vol / 6.0
    }

    pub fn surface_area(&self) -> f64 {
        (0..self.faces.len())
            .map(|f| self.face_area_vector(f).norm() / 2.0)
            .sum()
    }

    /// Euler characteristic V - E + F. 2 for a sphere-like solid, 0 for a
    /// torus-like one (e.g. a frame with a through-hole).
    pub fn euler_characteristic(&self) -> i64 {
        let adjacency = self.edge_adjacency();
        self.vertices.len() as i64 - adjacency.edge_count() as i64 + self.faces.len() as i64
    }

    /// Derived edge adjacency: which two faces share each undirected edge.
    /// Built on demand; edges are not stored persistently.
    pub fn edge_adjacency(&self) -> EdgeAdjacency {
        let mut edges: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (f, face) in self.faces.iter().enumerate() {
            for k in 0..3 {
                let a = face[k];
                let b = face[(k + 1) % 3];
                let key = if a < b { (a, b) } else { (b, a) };
                edges.entry(key).or_default().push(f);
            }
        }
        EdgeAdjacency { edges }
    }

    /// Validate the closed 2-manifold invariant.
    ///
    /// Checks, in order: index bounds, degenerate faces (repeated index or
    /// near-zero area), and edge pairing — every directed edge must occur
    /// exactly once and its reversal exactly once, which simultaneously
    /// enforces closedness and consistent orientation.
    pub fn validate(&self) -> Result<(), CsgError> {
        for (f, face) in self.faces.iter().enumerate() {
            for &i in face {
                if i >= self.vertices.len() {
                    return Err(CsgError::invalid_mesh(format!(
                        "face {f} references vertex {i} out of {}",
                        self.vertices.len()
                    )));
                }
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(CsgError::invalid_mesh(format!(
                    "face {f} repeats a vertex index"
                )));
            }
            if self.face_area_vector(f).norm() / 2.0 < DEGENERATE_AREA {
                return Err(CsgError::invalid_mesh(format!("face {f} has zero area")));
            }
        }

        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        for (f, face) in self.faces.iter().enumerate() {
            for k in 0..3 {
                let edge = (face[k], face[(k + 1) % 3]);
                if let Some(&other) = directed.get(&edge) {
                    // Same directed edge twice means two faces with the
                    // same winding across it (non-orientable or doubled).
                    return Err(CsgError::invalid_mesh(format!(
                        "edge ({}, {}) traversed in the same direction by faces {other} and {f}",
                        edge.0, edge.1
                    )));
                }
                directed.insert(edge, f);
            }
        }
        for (&(a, b), &f) in &directed {
            if !directed.contains_key(&(b, a)) {
                return Err(CsgError::invalid_mesh(format!(
                    "boundary edge ({a}, {b}) on face {f}: mesh is not closed"
                )));
            }
        }
        Ok(())
    }
}

/// Edge-to-face adjacency derived from a mesh.
pub struct EdgeAdjacency {
    edges: HashMap<(usize, usize), Vec<usize>>,
}

impl EdgeAdjacency {
    /// Faces sharing the undirected edge (a, b). Exactly two on a valid
    /// manifold mesh.
    pub fn faces_of_edge(&self, a: usize, b: usize) -> &[usize] {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edges.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
