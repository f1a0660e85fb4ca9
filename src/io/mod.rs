// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! I/O module - importing and exporting meshes

mod stl;

pub use stl::{export_stl, import_stl};
