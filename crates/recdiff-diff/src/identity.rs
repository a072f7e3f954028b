//! Identity keys for collection matching.
//!
//! Collection strategies need a hashable stand-in for "which item is
//! this". A record keys by its primary-key tuple when the type declares
//! one, and by every non-extraneous field otherwise; scalars key by their
//! normalized value; lists key item-wise. Maps have no identity tuple and
//! surface [`DiffError::UnhashableValue`] when they land in key position.

use chrono::{DateTime, Utc};
use recdiff_model::{RecordValue, Scalar, Value};
use recdiff_selector::Selector;

use crate::error::{DiffError, DiffResult};
use crate::options::DiffOptions;

/// A hashable identity for one value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    /// An unset slot inside a key tuple.
    Absent,
    Null,
    Bool(bool),
    Int(i64),
    /// Floats key by bit pattern. Whole floats fold into `Int` first so
    /// `1` and `1.0` share an identity.
    Float(u64),
    Str(String),
    DateTime(DateTime<Utc>),
    /// A record's field tuple or a list's item sequence.
    Seq(Vec<IdentityKey>),
}

/// Extract the identity key of `value`, normalizing scalars per the
/// options. `path` names the value's location for error reporting.
pub fn identity_key(
    value: &Value,
    options: &DiffOptions,
    path: &Selector,
) -> DiffResult<IdentityKey> {
    match value {
        Value::Scalar(scalar) => Ok(scalar_key(scalar, options)),
        Value::Record(record) => record_key(record, options, path),
        Value::List(items) => {
            let mut seq = Vec::with_capacity(items.len());
            for item in items {
                seq.push(identity_key(item, options, path)?);
            }
            Ok(IdentityKey::Seq(seq))
        }
        Value::Map(_) => Err(DiffError::UnhashableValue {
            path: path.clone(),
            kind: value.kind_name(),
        }),
    }
}

/// The primary-key tuple when one is declared, the full non-extraneous
/// field tuple otherwise.
pub fn record_key(
    record: &RecordValue,
    options: &DiffOptions,
    path: &Selector,
) -> DiffResult<IdentityKey> {
    let ty = record.ty();
    let mut seq = Vec::new();
    if ty.has_primary_key() {
        for fd in ty.primary_key() {
            seq.push(slot_key(record.get(fd.name()), options, path)?);
        }
    } else {
        for fd in ty.fields() {
            if fd.is_extraneous() && !options.include_extraneous {
                continue;
            }
            seq.push(slot_key(record.get(fd.name()), options, path)?);
        }
    }
    Ok(IdentityKey::Seq(seq))
}

fn slot_key(
    slot: Option<&Value>,
    options: &DiffOptions,
    path: &Selector,
) -> DiffResult<IdentityKey> {
    match options.present(slot) {
        Some(value) => identity_key(value, options, path),
        None => Ok(IdentityKey::Absent),
    }
}

fn scalar_key(scalar: &Scalar, options: &DiffOptions) -> IdentityKey {
    match scalar {
        Scalar::Null => IdentityKey::Null,
        Scalar::Bool(b) => IdentityKey::Bool(*b),
        Scalar::Int(i) => IdentityKey::Int(*i),
        Scalar::Float(f) => {
            // `i64::MAX as f64` rounds up to 2^63, which does not fit; the
            // bound must be strict so out-of-range floats keep their bit
            // pattern instead of saturating onto `Int(i64::MAX)`.
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                IdentityKey::Int(*f as i64)
            } else {
                IdentityKey::Float(f.to_bits())
            }
        }
        Scalar::Str(s) => IdentityKey::Str(options.normalize_str(s)),
        Scalar::DateTime(dt) => IdentityKey::DateTime(*dt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recdiff_model::{FieldDescriptor, Shape, TypeDescriptor};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn opts() -> DiffOptions {
        DiffOptions::default()
    }

    fn root() -> Selector {
        Selector::root()
    }

    #[test]
    fn whole_floats_fold_into_ints() {
        let a = identity_key(&Value::from(1i64), &opts(), &root()).unwrap();
        let b = identity_key(&Value::from(1.0f64), &opts(), &root()).unwrap();
        assert_eq!(a, b);
        let c = identity_key(&Value::from(1.5f64), &opts(), &root()).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn out_of_range_floats_keep_their_bit_pattern() {
        // 2^63 is whole but not representable as i64; it must not collide
        // with Int(i64::MAX) through a saturating cast.
        let big = identity_key(&Value::from(9.223372036854776e18), &opts(), &root()).unwrap();
        let max = identity_key(&Value::from(i64::MAX), &opts(), &root()).unwrap();
        assert_ne!(big, max);
        assert_eq!(big, IdentityKey::Float(9.223372036854776e18f64.to_bits()));
    }

    #[test]
    fn strings_key_after_normalization() {
        let a = identity_key(&Value::from("a  b"), &opts(), &root()).unwrap();
        let b = identity_key(&Value::from("a b"), &opts(), &root()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn primary_key_fields_win_over_the_full_tuple() {
        let ty = TypeDescriptor::new(
            "Row",
            vec![
                FieldDescriptor::new("id", Shape::Scalar).primary_key(),
                FieldDescriptor::new("payload", Shape::Scalar),
            ],
        )
        .unwrap();
        let a = ty
            .instance()
            .with("id", 1i64)
            .unwrap()
            .with("payload", "x")
            .unwrap();
        let b = ty
            .instance()
            .with("id", 1i64)
            .unwrap()
            .with("payload", "y")
            .unwrap();
        let ka = record_key(&a, &opts(), &root()).unwrap();
        let kb = record_key(&b, &opts(), &root()).unwrap();
        assert_eq!(ka, kb);
    }

    #[test]
    fn maps_in_key_position_are_unhashable() {
        let v = Value::Map(BTreeMap::new());
        let err = identity_key(&v, &opts(), &root()).unwrap_err();
        assert!(matches!(err, DiffError::UnhashableValue { kind: "map", .. }));
    }

    #[test]
    fn extraneous_fields_stay_out_of_identity() {
        let ty = TypeDescriptor::new(
            "Row",
            vec![
                FieldDescriptor::new("word", Shape::Scalar),
                FieldDescriptor::new("audit", Shape::Scalar).extraneous(),
            ],
        )
        .unwrap();
        let a = Arc::clone(&ty)
            .instance()
            .with("word", "same")
            .unwrap()
            .with("audit", "first")
            .unwrap();
        let b = ty
            .instance()
            .with("word", "same")
            .unwrap()
            .with("audit", "second")
            .unwrap();
        assert_eq!(
            record_key(&a, &opts(), &root()).unwrap(),
            record_key(&b, &opts(), &root()).unwrap()
        );
    }
}
