//! Foundation types for recdiff.
//!
//! This crate provides the typed value tree that the rest of the workspace
//! traverses, compares, and filters. Every other recdiff crate depends on
//! `recdiff-model`.
//!
//! # Key Types
//!
//! - [`Scalar`] — Opaque leaf values (numbers, strings, booleans, dates)
//! - [`Value`] — A tree node: scalar, record, ordered list, or keyed map
//! - [`TypeDescriptor`] / [`FieldDescriptor`] — The static field table that
//!   gives a record type its shape, built once per type and shared via `Arc`
//! - [`RecordValue`] — A record instance: a descriptor plus filled slots
//! - [`classify`] / [`Node`] — The node classifier: pure dispatch of any
//!   value into scalar / record / collection, exposing children as
//!   (key, value) pairs

pub mod descriptor;
pub mod error;
pub mod node;
pub mod value;

pub use descriptor::{CompareFn, FieldDescriptor, Shape, TypeDescriptor};
pub use error::{ModelError, Result};
pub use node::{classify, CollKey, Collection, CollectionKind, Items, Node};
pub use value::{RecordValue, Scalar, Value};
