//! Error types for model projection and reference naming

use thiserror::Error;

use crate::graph::{Diagnostics, ShapeId, SourceLocation};

/// Result type for projection operations
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Projection and conversion errors
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// Two non-elidable shapes claim the same pointer and neither may be renamed.
    #[error("Shape {shape} conflicts with {existing} using a JSON schema pointer of {pointer}")]
    ConflictingShapeName {
        shape: ShapeId,
        existing: ShapeId,
        pointer: String,
    },

    #[error("Invalid reference to {id}: {reason}")]
    InvalidReference { id: ShapeId, reason: String },

    #[error("Malformed configuration for `{context}` at `{key}` ({location}): {message}")]
    MalformedConfiguration {
        context: String,
        key: String,
        message: String,
        location: SourceLocation,
    },

    #[error("Invalid shape ID: {0}")]
    InvalidShapeId(String),

    #[error("Invalid model:\n{0}")]
    InvalidModel(Diagnostics),

    #[error("Malformed model document ({location}): {message}")]
    MalformedModel {
        location: SourceLocation,
        message: String,
    },

    #[error("Unknown projection transform: {0}")]
    UnknownTransform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl ProjectionError {
    pub(crate) fn invalid_reference(id: &ShapeId, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            id: id.clone(),
            reason: reason.into(),
        }
    }
}
