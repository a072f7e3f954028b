//! Error types for the model crate.

use thiserror::Error;

/// Errors that can occur while building descriptors or mutating records.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The record type has no field with this name.
    #[error("type {type_name} has no field named {field}")]
    UnknownField { type_name: String, field: String },

    /// A type descriptor declared the same field name twice.
    #[error("type {type_name} declares duplicate field {field}")]
    DuplicateField { type_name: String, field: String },
}

/// Convenience alias for model results.
pub type Result<T> = std::result::Result<T, ModelError>;
