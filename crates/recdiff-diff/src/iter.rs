//! The lazy diff driver.
//!
//! [`diff_iter`] walks a *base* and an *other* tree in lock-step, driven
//! by an explicit work stack instead of recursion: each stack unit is
//! either a ready-to-yield entry or a pair of nodes still to be expanded.
//! Entries come out in deterministic order — record fields in declaration
//! order, collection items in base order with other-only additions after —
//! and the caller may stop consuming at any point.

use recdiff_model::Value;
use recdiff_selector::{Selector, SelectorSet};

use crate::collection::collection_units;
use crate::entry::{Diff, DiffEntry, DiffKind};
use crate::error::{DiffError, DiffResult};
use crate::options::DiffOptions;
use crate::record::record_units;

/// One pending comparison.
pub(crate) struct Frame<'a> {
    pub base: &'a Value,
    pub other: &'a Value,
    pub base_sel: Selector,
    pub other_sel: Selector,
    pub filter: Option<&'a SelectorSet>,
}

/// One unit of work on the stack.
pub(crate) enum Unit<'a> {
    Emit(DiffEntry<'a>),
    Pair(Frame<'a>),
}

/// Lazily compare two trees. Entries are produced on demand; dropping the
/// iterator early abandons the remaining comparison at no cost.
pub fn diff_iter<'a>(
    base: &'a Value,
    other: &'a Value,
    options: &'a DiffOptions,
) -> DiffIter<'a> {
    DiffIter {
        options,
        stack: vec![Unit::Pair(Frame {
            base,
            other,
            base_sel: Selector::root(),
            other_sel: Selector::root(),
            filter: options.compare_filter.as_ref(),
        })],
        done: false,
    }
}

/// Eagerly compare two trees, collecting every entry.
pub fn diff<'a>(
    base: &'a Value,
    other: &'a Value,
    options: &'a DiffOptions,
) -> DiffResult<Diff<'a>> {
    let entries = diff_iter(base, other, options).collect::<DiffResult<Vec<_>>>()?;
    Ok(Diff {
        base_type: base.type_name().to_string(),
        other_type: other.type_name().to_string(),
        entries,
    })
}

/// Iterator over the differences between two trees.
pub struct DiffIter<'a> {
    options: &'a DiffOptions,
    stack: Vec<Unit<'a>>,
    done: bool,
}

impl<'a> Iterator for DiffIter<'a> {
    type Item = DiffResult<DiffEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while let Some(unit) = self.stack.pop() {
            match unit {
                Unit::Emit(entry) => return Some(Ok(entry)),
                Unit::Pair(frame) => match expand(frame, self.options) {
                    Ok(mut units) => {
                        // Stack order: reverse so the first child pops first.
                        units.reverse();
                        self.stack.extend(units);
                    }
                    Err(e) => {
                        self.done = true;
                        self.stack.clear();
                        return Some(Err(e));
                    }
                },
            }
        }
        None
    }
}

impl std::iter::FusedIterator for DiffIter<'_> {}

/// Expand one node pair into child units.
fn expand<'a>(frame: Frame<'a>, options: &DiffOptions) -> DiffResult<Vec<Unit<'a>>> {
    let Frame {
        base,
        other,
        base_sel,
        other_sel,
        filter,
    } = frame;
    match (base, other) {
        (Value::Scalar(a), Value::Scalar(b)) => {
            let kind = if options.scalars_equal(a, b) {
                if !options.emit_unchanged {
                    return Ok(Vec::new());
                }
                DiffKind::NoChange
            } else {
                DiffKind::Modified
            };
            Ok(vec![Unit::Emit(DiffEntry {
                kind,
                base: base_sel,
                other: other_sel,
                base_value: Some(base),
                other_value: Some(other),
            })])
        }
        (Value::Record(a), Value::Record(b)) => {
            if !options.duck_type && a.type_name() != b.type_name() {
                // At the root this is a caller error; below it, the value
                // was simply replaced with a record of another type.
                if base_sel.is_empty() && other_sel.is_empty() {
                    return Err(DiffError::TypeMismatch {
                        base_type: a.type_name().to_string(),
                        other_type: b.type_name().to_string(),
                    });
                }
                return Ok(vec![Unit::Emit(modified(
                    base, other, base_sel, other_sel,
                ))]);
            }
            Ok(record_units(a, b, &base_sel, &other_sel, filter, options))
        }
        (Value::List(_), Value::List(_)) | (Value::Map(_), Value::Map(_)) => {
            collection_units(base, other, &base_sel, &other_sel, filter, options)
        }
        // Different node kinds at the same location: a replacement.
        _ => Ok(vec![Unit::Emit(modified(base, other, base_sel, other_sel))]),
    }
}

fn modified<'a>(
    base: &'a Value,
    other: &'a Value,
    base_sel: Selector,
    other_sel: Selector,
) -> DiffEntry<'a> {
    DiffEntry {
        kind: DiffKind::Modified,
        base: base_sel,
        other: other_sel,
        base_value: Some(base),
        other_value: Some(other),
    }
}
