// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("Degenerate geometry: {0}")]
    Degenerate(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Mesh face references vertex {index} but the mesh has {count} vertices")]
    MeshIndexOutOfRange { index: usize, count: usize },

    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid geometry record: {0}")]
    InvalidRecord(String),
}
