//! Path selectors for recdiff.
//!
//! A [`Selector`] names a single location inside a value tree as an ordered
//! sequence of [`Step`]s: record field names, collection indices, or
//! wildcards. Selectors resolve, assign, auto-vivify, and remove values at
//! the location they address, and render to a canonical textual notation
//! (`.field`, `[3]`, `['odd key']`, `[*]`) that parses back exactly.
//!
//! A [`SelectorSet`] collapses any number of selectors into one tree-shaped
//! inclusion filter, used to restrict traversal and diff to a subset of
//! locations, to extract filtered copies, and to patch values across trees.
//!
//! # Modules
//!
//! - [`error`] — Error types for selector operations
//! - [`selector`] — [`Step`], [`Selector`], and the resolution operations
//! - [`parse`] — Render/parse for the canonical path notation
//! - [`set`] — [`SelectorSet`] inclusion filters

pub mod error;
pub mod parse;
pub mod selector;
pub mod set;

pub use error::{Result, SelectorError};
pub use selector::{Resolved, Selector, Step};
pub use set::SelectorSet;
