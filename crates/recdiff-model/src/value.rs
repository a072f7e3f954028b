//! The value tree: scalars, records, and collections.
//!
//! A [`Value`] is one node of a tree-shaped piece of data. Leaves are
//! [`Scalar`]s; interior nodes are either typed records ([`RecordValue`]),
//! ordered lists, or keyed maps.
//!
//! A record slot that holds [`Scalar::Null`] is *set to an empty value*; a
//! slot that is missing from the record entirely is *unset*. The diff engine
//! treats the two differently (an unset slot on one side is an addition or
//! removal, not a modification).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::error::{ModelError, Result};

/// An opaque leaf value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    /// An explicitly-empty slot.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(DateTime<Utc>),
}

impl Scalar {
    /// Short kind name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Str(_) => "string",
            Scalar::DateTime(_) => "datetime",
        }
    }

    /// Returns the string contents, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Str(s) => write!(f, "{s:?}"),
            Scalar::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

/// One node of a value tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Record(RecordValue),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// The null scalar.
    pub fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    /// Short kind name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Scalar(s) => s.kind_name(),
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// A readable type name: the declared record type for records, the kind
    /// name for everything else.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Record(r) => r.type_name(),
            other => other.kind_name(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(Scalar::Float(x))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::Str(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::Str(s))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::Scalar(Scalar::DateTime(dt))
    }
}

impl From<RecordValue> for Value {
    fn from(r: RecordValue) -> Self {
        Value::Record(r)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

/// A record instance: a shared type descriptor plus the slots that have
/// been filled in.
///
/// Slots are stored by field name; iteration always happens in the
/// descriptor's declaration order, never in storage order.
#[derive(Clone)]
pub struct RecordValue {
    ty: Arc<TypeDescriptor>,
    slots: BTreeMap<String, Value>,
}

impl RecordValue {
    /// Create an empty instance of the given type. All slots start unset.
    pub fn new(ty: Arc<TypeDescriptor>) -> Self {
        Self {
            ty,
            slots: BTreeMap::new(),
        }
    }

    /// The type descriptor this instance conforms to.
    pub fn ty(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    /// The declared type name.
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Get a slot by field name. `None` means the slot is unset (which is
    /// distinct from the slot holding `Scalar::Null`).
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.slots.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.slots.get_mut(field)
    }

    /// Set a slot. The field must exist on the type.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        if self.ty.field(field).is_none() {
            return Err(ModelError::UnknownField {
                type_name: self.ty.name().to_string(),
                field: field.to_string(),
            });
        }
        self.slots.insert(field.to_string(), value.into());
        Ok(())
    }

    /// Builder-style `set`, for concise construction in tests and callers.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(field, value)?;
        Ok(self)
    }

    /// Clear a slot, returning its previous contents.
    pub fn unset(&mut self, field: &str) -> Option<Value> {
        self.slots.remove(field)
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.slots.contains_key(field)
    }

    /// Every declared field in declaration order, paired with its slot
    /// contents (or `None` when unset).
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, Option<&Value>)> {
        self.ty
            .fields()
            .iter()
            .map(move |fd| (fd, self.slots.get(fd.name())))
    }

    /// Only the set slots, in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields()
            .filter_map(|(fd, v)| v.map(|v| (fd.name(), v)))
    }
}

impl PartialEq for RecordValue {
    /// Records compare equal when they have the same declared type name and
    /// the same slot contents. Unset slots participate (a record with a slot
    /// unset differs from one with that slot null).
    fn eq(&self, other: &Self) -> bool {
        self.ty.name() == other.ty.name() && self.slots == other.slots
    }
}

impl fmt::Debug for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.ty.name());
        for (name, value) in self.entries() {
            s.field(name, value);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, Shape};

    fn person_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::new(
            "Person",
            vec![
                FieldDescriptor::new("id", Shape::Scalar).primary_key(),
                FieldDescriptor::new("name", Shape::Scalar),
            ],
        )
        .unwrap()
    }

    #[test]
    fn set_and_get_slots() {
        let ty = person_type();
        let mut rec = RecordValue::new(ty);
        rec.set("id", 7i64).unwrap();
        assert_eq!(rec.get("id"), Some(&Value::from(7i64)));
        assert!(rec.get("name").is_none());
        assert!(!rec.is_set("name"));
    }

    #[test]
    fn unknown_field_rejected() {
        let ty = person_type();
        let mut rec = RecordValue::new(ty);
        let err = rec.set("age", 1i64).unwrap_err();
        assert!(matches!(err, ModelError::UnknownField { .. }));
    }

    #[test]
    fn unset_differs_from_null() {
        let ty = person_type();
        let a = RecordValue::new(ty.clone()).with("id", 1i64).unwrap();
        let b = RecordValue::new(ty)
            .with("id", 1i64)
            .unwrap()
            .with("name", Value::null())
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn scalars_serialize_round_trip() {
        for scalar in [
            Scalar::Null,
            Scalar::Bool(true),
            Scalar::Int(-3),
            Scalar::Float(2.5),
            Scalar::Str("hi".to_string()),
        ] {
            let encoded = serde_json::to_string(&scalar).unwrap();
            let decoded: Scalar = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, scalar);
        }
    }

    #[test]
    fn fields_iterate_in_declaration_order() {
        let ty = person_type();
        let rec = RecordValue::new(ty)
            .with("name", "Bob")
            .unwrap()
            .with("id", 1i64)
            .unwrap();
        let names: Vec<_> = rec.entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "name"]);
    }
}
