//! Diff configuration and normalized equality.
//!
//! [`DiffOptions`] is the bag of knobs threaded through every comparison.
//! It also owns the normalization pipeline: string values pass through
//! whitespace collapsing, case folding, and Unicode NFC (each independently
//! toggleable) before any equality or identity-key decision.

use recdiff_model::{Scalar, Value};
use recdiff_selector::SelectorSet;
use unicode_normalization::UnicodeNormalization;

/// Options threaded through a diff run.
///
/// The defaults compare strings whitespace-insensitively in NFC, honor
/// case, skip extraneous fields, and report only actual changes.
#[derive(Clone, Debug)]
pub struct DiffOptions {
    /// Collapse runs of whitespace (and strip the ends) before comparing
    /// strings.
    pub normalize_whitespace: bool,
    /// Fold case before comparing strings.
    pub normalize_case: bool,
    /// Normalize strings to Unicode NFC before comparing.
    pub normalize_unicode: bool,
    /// Treat null and empty-string slots as absent.
    pub ignore_empty_slots: bool,
    /// Emit `NoChange` entries for equal values instead of staying silent.
    pub emit_unchanged: bool,
    /// Allow records of different types to be compared field-by-field.
    pub duck_type: bool,
    /// Descend into fields marked extraneous.
    pub include_extraneous: bool,
    /// For unkeyed record collections, pair items by similarity instead of
    /// exact identity. O(n²) in collection size; expensive on large
    /// collections.
    pub fuzzy_match: bool,
    /// Report matched collection items whose position changed as `Moved`.
    pub emit_moved: bool,
    /// Minimum similarity for a fuzzy pairing, in `0.0..=1.0`.
    pub fuzzy_threshold: f64,
    /// Emit `Added`/`Removed` for one-side-only items even when the active
    /// filter excludes all of their content.
    pub report_filtered_presence: bool,
    /// Restrict the comparison to the locations this set includes.
    pub compare_filter: Option<SelectorSet>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            normalize_whitespace: true,
            normalize_case: false,
            normalize_unicode: true,
            ignore_empty_slots: false,
            emit_unchanged: false,
            duck_type: false,
            include_extraneous: false,
            fuzzy_match: false,
            emit_moved: false,
            fuzzy_threshold: 0.5,
            report_filtered_presence: false,
            compare_filter: None,
        }
    }
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the enabled string normalizations.
    pub fn normalize_str(&self, s: &str) -> String {
        let mut out = if self.normalize_whitespace {
            let mut collapsed = String::with_capacity(s.len());
            for (i, word) in s.split_whitespace().enumerate() {
                if i > 0 {
                    collapsed.push(' ');
                }
                collapsed.push_str(word);
            }
            collapsed
        } else {
            s.to_string()
        };
        if self.normalize_case {
            out = out.to_uppercase();
        }
        if self.normalize_unicode {
            out = out.nfc().collect();
        }
        out
    }

    /// Scalar equality after normalization. Integers and floats compare
    /// numerically across the variant boundary.
    pub fn scalars_equal(&self, a: &Scalar, b: &Scalar) -> bool {
        match (a, b) {
            (Scalar::Str(x), Scalar::Str(y)) => self.normalize_str(x) == self.normalize_str(y),
            (Scalar::Int(x), Scalar::Float(y)) | (Scalar::Float(y), Scalar::Int(x)) => {
                *x as f64 == *y
            }
            _ => a == b,
        }
    }

    /// Deep equality under these options: normalized scalars, per-field
    /// comparison overrides, extraneous fields skipped, record types
    /// required to match unless duck typing is on.
    pub fn values_equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Scalar(x), Value::Scalar(y)) => self.scalars_equal(x, y),
            (Value::Record(x), Value::Record(y)) => {
                if !self.duck_type && x.type_name() != y.type_name() {
                    return false;
                }
                x.ty().fields().iter().all(|fd| {
                    if fd.is_extraneous() && !self.include_extraneous {
                        return true;
                    }
                    let slot_a = self.present(x.get(fd.name()));
                    let slot_b = self.present(y.get(fd.name()));
                    match (slot_a, slot_b) {
                        (None, None) => true,
                        (Some(va), Some(vb)) => match fd.compare() {
                            Some(compare) => compare(va, vb),
                            None => self.values_equal(va, vb),
                        },
                        _ => false,
                    }
                })
            }
            (Value::List(x), Value::List(y)) => {
                x.len() == y.len()
                    && x.iter().zip(y.iter()).all(|(va, vb)| self.values_equal(va, vb))
            }
            (Value::Map(x), Value::Map(y)) => {
                x.len() == y.len()
                    && x.iter().zip(y.iter()).all(|((ka, va), (kb, vb))| {
                        ka == kb && self.values_equal(va, vb)
                    })
            }
            _ => false,
        }
    }

    /// Slot presence under `ignore_empty_slots`.
    pub(crate) fn present<'v>(&self, slot: Option<&'v Value>) -> Option<&'v Value> {
        match slot {
            Some(v) if self.ignore_empty_slots && value_is_empty(v) => None,
            other => other,
        }
    }
}

/// Empty for slot purposes: null, or the empty string.
pub(crate) fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Scalar(Scalar::Null) => true,
        Value::Scalar(Scalar::Str(s)) => s.is_empty(),
        _ => false,
    }
}
