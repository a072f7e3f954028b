//! Error types for selector operations.
//!
//! Every traversal error carries the rendered path of the failure location,
//! so callers never have to reconstruct where inside the tree an operation
//! went wrong.

use thiserror::Error;

/// Errors that can occur while resolving or mutating through a selector.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// A step had no corresponding field, index, or key. Recoverable:
    /// callers commonly treat this as "no value".
    #[error("nothing at {path}: no {step} here")]
    NotFound { step: String, path: String },

    /// A step expected one node shape but found another.
    #[error("type mismatch at {path}: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
        path: String,
    },

    /// A single-value operation was applied to a selector containing a
    /// wildcard, which fans out over many values.
    #[error("selector {path} contains a wildcard and addresses many values")]
    FanOut { path: String },

    /// Auto-vivification tried to extend an ordered collection somewhere
    /// other than its end.
    #[error("cannot create index [{index}] at {path}: collection has {len} item(s)")]
    OutOfOrder {
        index: usize,
        len: usize,
        path: String,
    },

    /// Auto-vivification could not synthesize an intermediate record because
    /// a required field lies off the target path.
    #[error("cannot auto-vivify {type_name} at {path}: required field {field} cannot be synthesized")]
    AutoVivify {
        type_name: String,
        field: String,
        path: String,
    },

    /// The textual path notation could not be parsed.
    #[error("cannot parse selector {input:?} at byte {pos}: {reason}")]
    Parse {
        input: String,
        pos: usize,
        reason: String,
    },
}

/// Convenience alias for selector results.
pub type Result<T> = std::result::Result<T, SelectorError>;
