// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Boolean pipeline
//!
//! Orchestrates the full operation: validate inputs, build one BVH per
//! mesh, cut the faces of each mesh along the intersection curve,
//! classify the resulting fragments against the other solid, select the
//! fragments the operator keeps, and weld the survivors into the output
//! mesh. The output is validated before it is returned; a result that
//! fails the closed-manifold check is reported as an error, never
//! silently repaired.

use super::bvh::Bvh;
use super::classify::{classify_fragments, FragmentClass};
use super::intersection::intersect_meshes;
use super::mesh::{Mesh, DEGENERATE_AREA};
use super::predicates::WELD_EPS;
use super::retriangulate::retriangulate_mesh;
use crate::error::CsgError;
use nalgebra::Point3;
use std::collections::HashMap;

/// The three regularized boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersect,
    Subtract,
}

/// Compute `a op b`. Both inputs must be closed 2-manifold meshes; the
/// result is one as well (possibly empty, e.g. subtracting a solid from
/// itself).
pub fn boolean(a: &Mesh, b: &Mesh, op: BooleanOp) -> Result<Mesh, CsgError> {
    a.validate()?;
    b.validate()?;

    if a.is_empty() {
        return Ok(match op {
            BooleanOp::Union => b.clone(),
            BooleanOp::Intersect | BooleanOp::Subtract => Mesh::empty(),
        });
    }
    if b.is_empty() {
        return Ok(match op {
            BooleanOp::Union | BooleanOp::Subtract => a.clone(),
            BooleanOp::Intersect => Mesh::empty(),
        });
    }

    let (bvh_a, bvh_b) = rayon::join(|| Bvh::build(a), || Bvh::build(b));

    let cuts = intersect_meshes(a, b, &bvh_b)?;
    let (frags_a, frags_b) = rayon::join(
        || retriangulate_mesh(a, &cuts.on_a),
        || retriangulate_mesh(b, &cuts.on_b),
    );

    let (classes_a, classes_b) = rayon::join(
        || classify_fragments(&frags_a, b, &bvh_b),
        || classify_fragments(&frags_b, a, &bvh_a),
    );
    let (classes_a, classes_b) = (classes_a?, classes_b?);

    // Assembly is single-threaded: the welder is one shared dedup table.
    let mut assembler = Assembler::new();
    for (frags, classes) in frags_a.iter().zip(&classes_a) {
        for (frag, &class) in frags.iter().zip(classes) {
            if keep_from_a(op, class) {
                assembler.add(frag, false);
            }
        }
    }
    // For Subtract the kept piece of B becomes the cavity wall, so its
    // orientation flips to face out of the result.
    let flip_b = op == BooleanOp::Subtract;
    for (frags, classes) in frags_b.iter().zip(&classes_b) {
        for (frag, &class) in frags.iter().zip(classes) {
            if keep_from_b(op, class) {
                assembler.add(frag, flip_b);
            }
        }
    }

    let result = assembler.finish();
    result.validate().map_err(|e| CsgError::NonManifoldResult {
        reason: e.to_string(),
    })?;
    Ok(result)
}

fn keep_from_a(op: BooleanOp, class: FragmentClass) -> bool {
    match op {
        BooleanOp::Union => matches!(
            class,
            FragmentClass::Outside | FragmentClass::BoundarySame
        ),
        BooleanOp::Intersect => matches!(
            class,
            FragmentClass::Inside | FragmentClass::BoundarySame
        ),
        BooleanOp::Subtract => matches!(
            class,
            FragmentClass::Outside | FragmentClass::BoundaryOpposite
        ),
    }
}

fn keep_from_b(op: BooleanOp, class: FragmentClass) -> bool {
    // Boundary fragments of B are never kept: where the surfaces
    // coincide, A's fragment already represents the shared area once.
    match op {
        BooleanOp::Union => class == FragmentClass::Outside,
        BooleanOp::Intersect | BooleanOp::Subtract => class == FragmentClass::Inside,
    }
}

impl Mesh {
    pub fn union(&self, other: &Mesh) -> Result<Mesh, CsgError> {
        boolean(self, other, BooleanOp::Union)
    }

    pub fn intersect(&self, other: &Mesh) -> Result<Mesh, CsgError> {
        boolean(self, other, BooleanOp::Intersect)
    }

    pub fn subtract(&self, other: &Mesh) -> Result<Mesh, CsgError> {
        boolean(self, other, BooleanOp::Subtract)
    }
}

/// Builds the output mesh from kept fragments: welds vertices within
/// `WELD_EPS` through a quantized spatial hash, drops triangles that
/// collapse under welding, and compacts the vertex array to the vertices
/// the surviving faces reference.
struct Assembler {
    welder: VertexWelder,
    faces: Vec<[usize; 3]>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            welder: VertexWelder::new(WELD_EPS),
            faces: Vec::new(),
        }
    }

    fn add(&mut self, frag: &[Point3<f64>; 3], flip: bool) {
        let corners = if flip {
            [frag[0], frag[2], frag[1]]
        } else {
            *frag
        };
        let i0 = self.welder.add(&corners[0]);
        let i1 = self.welder.add(&corners[1]);
        let i2 = self.welder.add(&corners[2]);
        if i0 == i1 || i1 == i2 || i0 == i2 {
            return;
        }
        let [v0, v1, v2] = [
            self.welder.vertices[i0],
            self.welder.vertices[i1],
            self.welder.vertices[i2],
        ];
        if (v1 - v0).cross(&(v2 - v0)).norm() / 2.0 < DEGENERATE_AREA {
            return;
        }
        self.faces.push([i0, i1, i2]);
    }

    fn finish(self) -> Mesh {
        // Compact: keep only vertices some surviving face references, so
        // welded-away positions do not distort the Euler characteristic.
        let mut remap: Vec<Option<usize>> = vec![None; self.welder.vertices.len()];
        let mut vertices = Vec::new();
        let mut faces = Vec::with_capacity(self.faces.len());
        for face in &self.faces {
            let mut mapped = [0usize; 3];
            for (slot, &old) in mapped.iter_mut().zip(face) {
                *slot = *remap[old].get_or_insert_with(|| {
                    vertices.push(self.welder.vertices[old]);
                    vertices.len() - 1
                });
            }
            faces.push(mapped);
        }
        Mesh::from_parts_unchecked(vertices, faces)
    }
}

/// Merges vertices closer than the weld tolerance. Positions are hashed
/// into a grid with cell size equal to the tolerance; a match can then
/// only live in the 27 cells around the query point's cell.
struct VertexWelder {
    tolerance: f64,
    grid: HashMap<(i64, i64, i64), Vec<usize>>,
    vertices: Vec<Point3<f64>>,
}

impl VertexWelder {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            grid: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    fn cell(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
            (p.z / self.tolerance).floor() as i64,
        )
    }

    fn add(&mut self, p: &Point3<f64>) -> usize {
        let (cx, cy, cz) = self.cell(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &i in bucket {
                            if (self.vertices[i] - p).norm() < self.tolerance {
                                return i;
                            }
                        }
                    }
                }
            }
        }
        let index = self.vertices.len();
        self.vertices.push(*p);
        self.grid.entry((cx, cy, cz)).or_default().push(index);
        index
    }
}
