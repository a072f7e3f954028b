//! Structural diff engine for recdiff.
//!
//! Walks a *base* and an *other* tree in lock-step and produces a lazy
//! sequence of differences, each tagged with the selector of the location
//! on both sides. Collection items match by primary key when the item
//! type declares one, by collection key for keyed maps, by whole-value
//! identity or (opt-in) pairwise similarity for unkeyed record lists, and
//! positionally for plain scalar lists. The similarity fallback is
//! quadratic in collection size.
//!
//! # Key Types
//!
//! - [`DiffOptions`] — Normalization, filtering, and matching knobs
//! - [`diff_iter`] / [`DiffIter`] — Lazy comparison, driven by a work stack
//! - [`diff`] / [`Diff`] — Eager wrapper with per-kind counts
//! - [`DiffEntry`] / [`DiffKind`] — One difference and its kind
//! - [`identity_key`] / [`IdentityKey`] — Hashable item identities for
//!   collection matching

mod collection;
pub mod entry;
pub mod error;
pub mod identity;
pub mod iter;
pub mod options;
mod record;

pub use entry::{Diff, DiffEntry, DiffKind};
pub use error::{DiffError, DiffResult};
pub use identity::{identity_key, record_key, IdentityKey};
pub use iter::{diff, diff_iter, DiffIter};
pub use options::DiffOptions;
