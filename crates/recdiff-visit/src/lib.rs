//! Generic tree traversal for recdiff.
//!
//! A single reduce skeleton — classify, recurse, combine — parameterized by
//! a [`Visitor`]. The diff engine is its two-tree sibling; this crate also
//! carries the two JSON instantiations that demonstrate the contract in
//! each direction.
//!
//! # Key Types
//!
//! - [`Visitor`] / [`Flow`] — Per-node callbacks and their control value
//!   (`Prune` skips a subtree without error)
//! - [`visit`] — The driver: declaration-order field walk, filter
//!   push-down, location frames on every recursion
//! - [`JsonEmitter`] / [`to_json`] — Reduce a typed tree to `serde_json`
//! - [`from_json`] — Cast untyped JSON into a typed tree following a
//!   declared [`Shape`](recdiff_model::Shape)

pub mod error;
pub mod json;
pub mod visitor;

pub use error::{BoxError, Result, VisitError};
pub use json::{from_json, to_json, JsonEmitter};
pub use visitor::{visit, Flow, Visitor};
