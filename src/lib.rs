// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Solidcut
//!
//! Robust boolean operations (union, intersection, subtraction) on
//! watertight triangle meshes. Inputs and outputs are closed 2-manifold
//! meshes; an operation either returns one or reports an error, never a
//! leaky approximation.

pub mod error;
pub mod geometry;
pub mod io;

pub use error::CsgError;
pub use geometry::{boolean, cuboid, BooleanOp, Mesh};
pub use io::{export_stl, import_stl};

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_basic_subtract() {
        let outer = cuboid(Vector3::new(4.0, 4.0, 4.0));
        let inner = cuboid(Vector3::new(2.0, 2.0, 2.0)).translated(Vector3::new(1.0, 1.0, 1.0));
        let result = boolean(&outer, &inner, BooleanOp::Subtract);
        assert!(result.is_ok());
    }
}
