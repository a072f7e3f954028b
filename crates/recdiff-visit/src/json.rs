//! JSON instantiations of the visitor contract.
//!
//! [`JsonEmitter`] is the reduce direction: a typed tree flattens to a
//! `serde_json::Value`. [`from_json`] is the cast direction: a declared
//! [`Shape`] drives coercion of untyped JSON into a typed tree, reporting
//! the selector of the first value that will not coerce.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use recdiff_model::{RecordValue, Scalar, Shape, Value};
use recdiff_model::CollectionKind;
use recdiff_selector::{Selector, SelectorSet, Step};
use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::error::{BoxError, Result, VisitError};
use crate::visitor::{visit, Flow, Visitor};

/// Visitor that reduces a tree to `serde_json::Value`.
///
/// Records and keyed collections become objects, ordered collections become
/// arrays, datetimes render as RFC 3339 strings. Non-finite floats have no
/// JSON representation and become null.
#[derive(Debug, Default)]
pub struct JsonEmitter;

impl Visitor for JsonEmitter {
    type Output = Json;

    fn visit_scalar(&mut self, scalar: &Scalar) -> std::result::Result<Flow<Json>, BoxError> {
        let out = match scalar {
            Scalar::Null => Json::Null,
            Scalar::Bool(b) => Json::Bool(*b),
            Scalar::Int(i) => Json::Number((*i).into()),
            Scalar::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Scalar::Str(s) => Json::String(s.clone()),
            Scalar::DateTime(dt) => Json::String(dt.to_rfc3339()),
        };
        Ok(Flow::Continue(out))
    }

    fn combine_record(
        &mut self,
        _: &RecordValue,
        fields: Vec<(String, Json)>,
    ) -> std::result::Result<Flow<Json>, BoxError> {
        Ok(Flow::Continue(Json::Object(JsonMap::from_iter(fields))))
    }

    fn combine_collection(
        &mut self,
        kind: CollectionKind,
        items: Vec<(Step, Json)>,
    ) -> std::result::Result<Flow<Json>, BoxError> {
        let out = match kind {
            CollectionKind::Ordered => {
                Json::Array(items.into_iter().map(|(_, item)| item).collect())
            }
            CollectionKind::Keyed => Json::Object(
                items
                    .into_iter()
                    .map(|(step, item)| match step {
                        Step::Field(key) => (key, item),
                        other => (other.to_string(), item),
                    })
                    .collect(),
            ),
        };
        Ok(Flow::Continue(out))
    }
}

/// Reduce `root` to JSON, optionally restricted by an inclusion filter.
pub fn to_json(root: &Value, filter: Option<&SelectorSet>) -> Result<Json> {
    Ok(visit(root, &mut JsonEmitter, filter)?.unwrap_or(Json::Null))
}

/// Coerce untyped JSON into a typed tree following the declared shape.
pub fn from_json(shape: &Shape, json: &Json) -> Result<Value> {
    let mut frames = Vec::new();
    cast(shape, json, &mut frames)
}

fn cast(shape: &Shape, json: &Json, frames: &mut Vec<Step>) -> Result<Value> {
    match shape {
        Shape::Scalar => match json {
            Json::Array(_) | Json::Object(_) => Err(cast_error("scalar", json, frames)),
            other => Ok(Value::Scalar(cast_scalar(other))),
        },
        Shape::Record(ty) => {
            let Json::Object(entries) = json else {
                return Err(cast_error("record object", json, frames));
            };
            let mut record = ty.instance();
            for key in entries.keys() {
                if ty.field(key).is_none() {
                    tracing::debug!(ty = ty.name(), field = %key, "skipping undeclared field");
                }
            }
            for fd in ty.fields() {
                let Some(slot) = entries.get(fd.name()) else {
                    continue;
                };
                frames.push(Step::field(fd.name()));
                let value = cast(fd.shape(), slot, frames);
                frames.pop();
                // Field names come from the descriptor; set cannot fail.
                let _ = record.set(fd.name(), value?);
            }
            Ok(Value::Record(record))
        }
        Shape::List(item) => {
            let Json::Array(items) = json else {
                return Err(cast_error("list", json, frames));
            };
            let mut out = Vec::with_capacity(items.len());
            for (i, slot) in items.iter().enumerate() {
                frames.push(Step::Index(i));
                let value = cast(item, slot, frames);
                frames.pop();
                out.push(value?);
            }
            Ok(Value::List(out))
        }
        Shape::Map(item) => {
            let Json::Object(entries) = json else {
                return Err(cast_error("map object", json, frames));
            };
            let mut out = BTreeMap::new();
            for (key, slot) in entries {
                frames.push(Step::field(key));
                let value = cast(item, slot, frames);
                frames.pop();
                out.insert(key.clone(), value?);
            }
            Ok(Value::Map(out))
        }
    }
}

/// JSON scalars cast without loss: integers stay integers, strings that
/// parse as RFC 3339 timestamps become datetimes, everything else maps
/// directly. Arrays and objects are rejected by the caller before this.
fn cast_scalar(json: &Json) -> Scalar {
    match json {
        Json::Null => Scalar::Null,
        Json::Bool(b) => Scalar::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Scalar::Int(i)
            } else {
                Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => Scalar::DateTime(dt.with_timezone(&Utc)),
            Err(_) => Scalar::Str(s.clone()),
        },
        Json::Array(_) | Json::Object(_) => Scalar::Null,
    }
}

fn cast_error(expected: &'static str, json: &Json, frames: &[Step]) -> VisitError {
    VisitError::Cast {
        expected,
        found: json_kind(json),
        path: Selector::from_steps(frames.to_vec()),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recdiff_model::{FieldDescriptor, TypeDescriptor};
    use serde_json::json;
    use std::sync::Arc;

    fn track_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::new(
            "Track",
            vec![
                FieldDescriptor::new("title", Shape::Scalar),
                FieldDescriptor::new("plays", Shape::Scalar),
                FieldDescriptor::new("tags", Shape::list_of(Shape::Scalar)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn emit_renders_records_and_collections() {
        let root = Value::Record(
            track_type()
                .instance()
                .with("title", "Holiday")
                .unwrap()
                .with("plays", 42i64)
                .unwrap()
                .with("tags", vec![Value::from("pop"), Value::from("summer")])
                .unwrap(),
        );
        let out = to_json(&root, None).unwrap();
        assert_eq!(
            out,
            json!({"title": "Holiday", "plays": 42, "tags": ["pop", "summer"]})
        );
    }

    #[test]
    fn emit_respects_the_filter() {
        let root = Value::Record(
            track_type()
                .instance()
                .with("title", "Holiday")
                .unwrap()
                .with("plays", 42i64)
                .unwrap(),
        );
        let filter: SelectorSet = ".title".parse().unwrap();
        let out = to_json(&root, Some(&filter)).unwrap();
        assert_eq!(out, json!({"title": "Holiday"}));
    }

    #[test]
    fn cast_follows_the_declared_shape() {
        let shape = Shape::record(track_type());
        let value = from_json(
            &shape,
            &json!({"title": "Holiday", "plays": 42, "tags": ["pop"]}),
        )
        .unwrap();
        let rec = value.as_record().unwrap();
        assert_eq!(rec.get("plays"), Some(&Value::from(42i64)));
        assert_eq!(
            rec.get("tags"),
            Some(&Value::List(vec![Value::from("pop")]))
        );
    }

    #[test]
    fn cast_reports_the_offending_selector() {
        let shape = Shape::record(track_type());
        let err = from_json(&shape, &json!({"tags": {"not": "a list"}})).unwrap_err();
        assert_eq!(err.path().to_string(), ".tags");
        assert!(matches!(err, VisitError::Cast { expected: "list", .. }));
    }

    #[test]
    fn cast_parses_rfc3339_strings_as_datetimes() {
        let value = from_json(&Shape::Scalar, &json!("2021-06-01T12:00:00Z")).unwrap();
        assert!(matches!(
            value,
            Value::Scalar(Scalar::DateTime(_))
        ));
        let plain = from_json(&Shape::Scalar, &json!("not a date")).unwrap();
        assert_eq!(plain, Value::from("not a date"));
    }
}
