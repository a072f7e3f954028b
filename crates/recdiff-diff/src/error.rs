//! Error types for the diff engine.

use recdiff_selector::Selector;
use thiserror::Error;

pub type DiffResult<T> = std::result::Result<T, DiffError>;

#[derive(Debug, Error, PartialEq)]
pub enum DiffError {
    /// The two roots are records of different types and duck typing is off.
    #[error("cannot compare {base_type} with {other_type}")]
    TypeMismatch {
        base_type: String,
        other_type: String,
    },

    /// A value needed as a matching key cannot be hashed. Maps are the one
    /// value kind with no identity tuple.
    #[error("value at '{path}' cannot be used as a matching key: {kind} has no identity")]
    UnhashableValue { path: Selector, kind: &'static str },
}
