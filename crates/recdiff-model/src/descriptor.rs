//! Static type descriptors: the field table a record type exposes.
//!
//! The traversal and diff engines never discover fields at runtime; they
//! depend only on this table (declared once per type, shared via `Arc`). A
//! descriptor carries, per field: the name, the declared shape, whether the
//! field is required, whether it participates in the type's primary key,
//! whether it is extraneous (excluded from comparison), and an optional
//! comparison override.

use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::value::{RecordValue, Value};

/// A per-field comparison override. Returns `true` when the two values
/// should be considered equal for diff purposes.
pub type CompareFn = fn(&Value, &Value) -> bool;

/// The declared shape of a field's contents.
#[derive(Clone, Debug)]
pub enum Shape {
    /// An opaque leaf.
    Scalar,
    /// A nested record of the given type.
    Record(Arc<TypeDescriptor>),
    /// An ordered collection of items of the given shape.
    List(Box<Shape>),
    /// A keyed collection of items of the given shape.
    Map(Box<Shape>),
}

impl Shape {
    pub fn record(ty: Arc<TypeDescriptor>) -> Self {
        Shape::Record(ty)
    }

    pub fn list_of(item: Shape) -> Self {
        Shape::List(Box::new(item))
    }

    pub fn map_of(item: Shape) -> Self {
        Shape::Map(Box::new(item))
    }

    /// True for list and map shapes.
    pub fn is_collection(&self) -> bool {
        matches!(self, Shape::List(_) | Shape::Map(_))
    }

    /// The item shape, for collection shapes.
    pub fn item(&self) -> Option<&Shape> {
        match self {
            Shape::List(item) | Shape::Map(item) => Some(item),
            _ => None,
        }
    }

    /// The record descriptor, for record shapes (or record-item collections
    /// when `deep` digging is done by the caller).
    pub fn record_type(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            Shape::Record(ty) => Some(ty),
            _ => None,
        }
    }

    /// Short kind name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Scalar => "scalar",
            Shape::Record(_) => "record",
            Shape::List(_) => "list",
            Shape::Map(_) => "map",
        }
    }
}

/// Declared metadata for one field of a record type.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    name: String,
    shape: Shape,
    required: bool,
    primary_key: bool,
    extraneous: bool,
    compare: Option<CompareFn>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            required: false,
            primary_key: false,
            extraneous: false,
            compare: None,
        }
    }

    /// Mark the field required. Auto-vivification cannot synthesize an
    /// intermediate record whose required fields are off the target path.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field as part of the type's primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark the field extraneous: excluded from comparison and identity.
    pub fn extraneous(mut self) -> Self {
        self.extraneous = true;
        self
    }

    /// Install a comparison override used by the diff engine instead of
    /// normalized equality.
    pub fn with_compare(mut self, compare: CompareFn) -> Self {
        self.compare = Some(compare);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_extraneous(&self) -> bool {
        self.extraneous
    }

    pub fn is_collection(&self) -> bool {
        self.shape.is_collection()
    }

    pub fn compare(&self) -> Option<CompareFn> {
        self.compare
    }
}

/// The static field table for a record type. Built once, shared via `Arc`,
/// looked up by the engines instead of any runtime discovery.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Build a descriptor. Field names must be unique.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Arc<Self>> {
        let name = name.into();
        for (i, fd) in fields.iter().enumerate() {
            if fields[..i].iter().any(|prev| prev.name() == fd.name()) {
                return Err(ModelError::DuplicateField {
                    type_name: name,
                    field: fd.name().to_string(),
                });
            }
        }
        Ok(Arc::new(Self { name, fields }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|fd| fd.name() == name)
    }

    /// The primary key fields, in declaration order. Empty when the type
    /// declares no key.
    pub fn primary_key(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|fd| fd.is_primary_key())
    }

    pub fn has_primary_key(&self) -> bool {
        self.fields.iter().any(|fd| fd.is_primary_key())
    }

    /// Create an empty instance of this type.
    pub fn instance(self: &Arc<Self>) -> RecordValue {
        RecordValue::new(Arc::clone(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_fields_rejected() {
        let err = TypeDescriptor::new(
            "Dup",
            vec![
                FieldDescriptor::new("x", Shape::Scalar),
                FieldDescriptor::new("x", Shape::Scalar),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateField { .. }));
    }

    #[test]
    fn primary_key_in_declaration_order() {
        let ty = TypeDescriptor::new(
            "Pair",
            vec![
                FieldDescriptor::new("b", Shape::Scalar).primary_key(),
                FieldDescriptor::new("a", Shape::Scalar).primary_key(),
                FieldDescriptor::new("c", Shape::Scalar),
            ],
        )
        .unwrap();
        let pk: Vec<_> = ty.primary_key().map(|fd| fd.name()).collect();
        assert_eq!(pk, vec!["b", "a"]);
        assert!(ty.has_primary_key());
    }

    #[test]
    fn collection_flag_follows_shape() {
        let fd = FieldDescriptor::new("tags", Shape::list_of(Shape::Scalar));
        assert!(fd.is_collection());
        assert!(!FieldDescriptor::new("name", Shape::Scalar).is_collection());
    }
}
