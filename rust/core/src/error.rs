// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::element::ElementType;
use crate::validation::ValidationError;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the building model
#[derive(Error, Debug)]
pub enum Error {
    #[error("Illegal identifier \"{value}\": {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("{element_type} \"{identifier}\" already has a parent and cannot be re-parented")]
    AlreadyParented {
        element_type: ElementType,
        identifier: String,
    },

    #[error("{0}")]
    UnacceptableSubFace(String),

    #[error("Invalid boundary condition: {0}")]
    InvalidBoundaryCondition(String),

    #[error("Adjacency error: {0}")]
    Adjacency(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("No {element_type} found in the model with identifier(s): {}", identifiers.join(", "))]
    NotFound {
        element_type: ElementType,
        identifiers: Vec<String>,
    },

    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<ValidationError>,
    },

    #[error("{element_type} \"{full_id}\" is not valid:\n{source}")]
    InvalidRecord {
        element_type: ElementType,
        full_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] honeybee_geometry::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
