// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Geometry kernel: meshes, spatial indexing, and the boolean pipeline.

pub mod bbox;
pub mod boolean;
pub mod bvh;
pub mod classify;
pub mod intersection;
pub mod mesh;
pub mod predicates;
pub mod primitives;
pub mod retriangulate;

pub use bbox::BoundingBox;
pub use boolean::{boolean, BooleanOp};
pub use bvh::Bvh;
pub use classify::FragmentClass;
pub use mesh::Mesh;
pub use primitives::cuboid;
