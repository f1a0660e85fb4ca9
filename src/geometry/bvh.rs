// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Bounding volume hierarchy for broad-phase candidate queries
//!
//! Immutable after construction. Nodes live in a flat array and reference
//! each other by integer index rather than owning pointers, so parallel
//! readers can share the structure without any locking.

use super::BoundingBox;
use super::Mesh;
use nalgebra::{Point3, Vector3};

const LEAF_SIZE: usize = 4;
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone)]
struct BvhNode {
    bbox: BoundingBox,
    /// Child node indices. Children are not guaranteed to be adjacent in
    /// storage order, so both are stored explicitly.
    left: u32,
    right: u32,
    /// Leaf payload: range into `items`. Interior nodes have `count == 0`.
    start: u32,
    count: u32,
}

impl BvhNode {
    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

/// BVH over the faces of one mesh.
pub struct Bvh {
    nodes: Vec<BvhNode>,
    items: Vec<u32>,
}

impl Bvh {
    /// Build from a mesh's face list in O(F log F).
    pub fn build(mesh: &Mesh) -> Self {
        let face_boxes: Vec<BoundingBox> = (0..mesh.face_count())
            .map(|f| BoundingBox::from_triangle(&mesh.face_points(f)))
            .collect();
        Self::build_from_boxes(face_boxes)
    }

    pub fn build_from_boxes(face_boxes: Vec<BoundingBox>) -> Self {
        let mut bvh = Self {
            nodes: Vec::new(),
            items: (0..face_boxes.len() as u32).collect(),
        };
        if face_boxes.is_empty() {
            bvh.nodes.push(BvhNode {
                bbox: BoundingBox::empty(),
                left: 0,
                right: 0,
                start: 0,
                count: 0,
            });
            return bvh;
        }
        let n = face_boxes.len();
        bvh.build_range(&face_boxes, 0, n, 0);
        bvh
    }

    /// Recursively partition `items[start..end]`, appending nodes. Returns
    /// the index of the node built for the range.
    fn build_range(
        &mut self,
        face_boxes: &[BoundingBox],
        start: usize,
        end: usize,
        depth: usize,
    ) -> u32 {
        let mut bbox = BoundingBox::empty();
        for &item in &self.items[start..end] {
            bbox = bbox.merged(&face_boxes[item as usize]);
        }

        let node_index = self.nodes.len() as u32;
        if end - start <= LEAF_SIZE || depth >= MAX_DEPTH {
            self.nodes.push(BvhNode {
                bbox,
                left: 0,
                right: 0,
                start: start as u32,
                count: (end - start) as u32,
            });
            return node_index;
        }

        // Median split along the longest axis of the centroid spread.
        let size = bbox.size();
        let axis = if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        };
        self.items[start..end].sort_by(|&a, &b| {
            let ca = face_boxes[a as usize].center()[axis];
            let cb = face_boxes[b as usize].center()[axis];
            ca.total_cmp(&cb)
        });
        let mid = (start + end) / 2;

        // Reserve the slot so children index relative to a stable parent.
        self.nodes.push(BvhNode {
            bbox,
            left: 0,
            right: 0,
            start: 0,
            count: 0,
        });
        let left = self.build_range(face_boxes, start, mid, depth + 1);
        let right = self.build_range(face_boxes, mid, end, depth + 1);
        self.nodes[node_index as usize].left = left;
        self.nodes[node_index as usize].right = right;
        node_index
    }

    /// Faces whose bounding box overlaps `query`.
    pub fn query_box(&self, query: &BoundingBox, out: &mut Vec<usize>) {
        out.clear();
        if self.items.is_empty() {
            return;
        }
        let mut stack = vec![0u32];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if !node.bbox.intersects(query) {
                continue;
            }
            if node.is_leaf() {
                let start = node.start as usize;
                let end = start + node.count as usize;
                out.extend(self.items[start..end].iter().map(|&i| i as usize));
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
    }

    /// Faces whose bounding box is crossed by the ray `origin + t * dir`,
    /// t >= 0. Used for containment parity tests.
    pub fn query_ray(&self, origin: &Point3<f64>, dir: &Vector3<f64>, out: &mut Vec<usize>) {
        out.clear();
        if self.items.is_empty() {
            return;
        }
        let mut stack = vec![0u32];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if !ray_hits_box(origin, dir, &node.bbox) {
                continue;
            }
            if node.is_leaf() {
                let start = node.start as usize;
                let end = start + node.count as usize;
                out.extend(self.items[start..end].iter().map(|&i| i as usize));
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
    }
}

/// Slab test for a forward ray against a box. Axes where the direction is
/// (near) zero degrade to an interval containment check, which avoids the
/// 0 * inf pitfall of the naive formulation.
fn ray_hits_box(origin: &Point3<f64>, dir: &Vector3<f64>, bbox: &BoundingBox) -> bool {
    let mut t_min = 0.0f64;
    let mut t_max = f64::INFINITY;
    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < 1e-300 {
            if o < bbox.min[axis] || o > bbox.max[axis] {
                return false;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (bbox.min[axis] - o) * inv;
        let mut t1 = (bbox.max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::cuboid;

    #[test]
    fn test_query_box_returns_all_on_full_overlap() {
        let mesh = cuboid(Vector3::new(10.0, 10.0, 10.0));
        let bvh = Bvh::build(&mesh);

        let mut out = Vec::new();
        bvh.query_box(&mesh.bounding_box(), &mut out);
        out.sort_unstable();
        assert_eq!(out, (0..mesh.face_count()).collect::<Vec<_>>());
    }

    #[test]
    fn test_query_box_prunes_disjoint() {
        let mesh = cuboid(Vector3::new(10.0, 10.0, 10.0));
        let bvh = Bvh::build(&mesh);

        let far = BoundingBox::new(
            Point3::new(100.0, 100.0, 100.0),
            Point3::new(101.0, 101.0, 101.0),
        );
        let mut out = Vec::new();
        bvh.query_box(&far, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_query_ray_through_cube() {
        let mesh = cuboid(Vector3::new(2.0, 2.0, 2.0));
        let bvh = Bvh::build(&mesh);

        let mut out = Vec::new();
        bvh.query_ray(
            &Point3::new(-1.0, 1.0, 1.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &mut out,
        );
        assert!(!out.is_empty());

        bvh.query_ray(
            &Point3::new(-1.0, 1.0, 1.0),
            &Vector3::new(-1.0, 0.0, 0.0),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_mesh() {
        let bvh = Bvh::build(&Mesh::empty());
        let mut out = Vec::new();
        bvh.query_box(
            &BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)),
            &mut out,
        );
        assert!(out.is_empty());
    }
}
