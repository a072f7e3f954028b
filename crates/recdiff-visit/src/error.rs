//! Error types for the visitor engine.

use recdiff_selector::Selector;
use thiserror::Error;

/// An error surfaced by a visitor callback. Callbacks return whatever error
/// type suits them; the driver boxes it and attaches the location.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, VisitError>;

#[derive(Debug, Error)]
pub enum VisitError {
    /// A callback failed; the selector names the node it was visiting.
    #[error("visitor failed at '{path}': {source}")]
    Callback {
        path: Selector,
        #[source]
        source: BoxError,
    },

    /// A JSON value could not be coerced to the declared shape.
    #[error("cannot cast {found} to {expected} at '{path}'")]
    Cast {
        expected: &'static str,
        found: &'static str,
        path: Selector,
    },
}

impl VisitError {
    /// The location the error was raised at.
    pub fn path(&self) -> &Selector {
        match self {
            VisitError::Callback { path, .. } | VisitError::Cast { path, .. } => path,
        }
    }
}
