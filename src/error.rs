// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Error taxonomy for the boolean engine.

use thiserror::Error;

/// Failures the engine reports instead of producing a broken mesh.
#[derive(Debug, Error)]
pub enum CsgError {
    /// An input mesh violates the closed 2-manifold contract.
    #[error("invalid mesh: {reason}")]
    InvalidMesh { reason: String },

    /// A face pair (or a containment cast) could not be resolved by the
    /// predicates within tolerance.
    #[error("degenerate geometry between face {face_a} and face {face_b}: {reason}")]
    DegenerateGeometry {
        face_a: usize,
        face_b: usize,
        reason: String,
    },

    /// The assembled output failed its own manifold validation. Reported,
    /// never silently repaired.
    #[error("boolean result is not a closed 2-manifold: {reason}")]
    NonManifoldResult { reason: String },
}

impl CsgError {
    pub(crate) fn invalid_mesh(reason: impl Into<String>) -> Self {
        CsgError::InvalidMesh {
            reason: reason.into(),
        }
    }
}
