//! Field-by-field record comparison.

use recdiff_model::{RecordValue, Value};
use recdiff_selector::{Selector, SelectorSet, Step};

use crate::entry::{DiffEntry, DiffKind};
use crate::iter::{Frame, Unit};
use crate::options::DiffOptions;

/// Expand one record pair into per-field work units, in declaration
/// order. Absent-on-one-side fields yield `Added`/`Removed`; fields with
/// a comparison override are decided here; everything else recurses.
pub(crate) fn record_units<'a>(
    base: &'a RecordValue,
    other: &'a RecordValue,
    base_sel: &Selector,
    other_sel: &Selector,
    filter: Option<&'a SelectorSet>,
    options: &DiffOptions,
) -> Vec<Unit<'a>> {
    let mut units = Vec::new();
    // Same-type pairs share one descriptor; under duck typing the other
    // side may declare fields of its own, appended after the base walk.
    let base_fields = base.ty().fields().iter();
    let other_only = other
        .ty()
        .fields()
        .iter()
        .filter(|fd| base.ty().field(fd.name()).is_none());
    for fd in base_fields.chain(other_only) {
        if fd.is_extraneous() && !options.include_extraneous {
            continue;
        }
        let step = Step::field(fd.name());
        let sub_filter = match filter {
            None => None,
            Some(set) => match set.index(&step) {
                Some(sub) => Some(sub),
                None => continue,
            },
        };
        let slot_a = options.present(base.get(fd.name()));
        let slot_b = options.present(other.get(fd.name()));
        let field_base = base_sel.clone().field(fd.name());
        let field_other = other_sel.clone().field(fd.name());
        match (slot_a, slot_b) {
            (None, None) => {}
            (Some(va), None) => {
                if suppressed(sub_filter, va, options) {
                    continue;
                }
                units.push(Unit::Emit(DiffEntry {
                    kind: DiffKind::Removed,
                    base: field_base,
                    other: field_other,
                    base_value: Some(va),
                    other_value: None,
                }));
            }
            (None, Some(vb)) => {
                if suppressed(sub_filter, vb, options) {
                    continue;
                }
                units.push(Unit::Emit(DiffEntry {
                    kind: DiffKind::Added,
                    base: field_base,
                    other: field_other,
                    base_value: None,
                    other_value: Some(vb),
                }));
            }
            (Some(va), Some(vb)) => match fd.compare() {
                Some(compare) => {
                    let kind = if compare(va, vb) {
                        if !options.emit_unchanged {
                            continue;
                        }
                        DiffKind::NoChange
                    } else {
                        DiffKind::Modified
                    };
                    units.push(Unit::Emit(DiffEntry {
                        kind,
                        base: field_base,
                        other: field_other,
                        base_value: Some(va),
                        other_value: Some(vb),
                    }));
                }
                None => {
                    units.push(Unit::Pair(Frame {
                        base: va,
                        other: vb,
                        base_sel: field_base,
                        other_sel: field_other,
                        filter: sub_filter,
                    }));
                }
            },
        }
    }
    units
}

/// One-side-only presence is suppressed when an active filter excludes
/// all of the value's content, unless the caller opted out.
pub(crate) fn suppressed(
    filter: Option<&SelectorSet>,
    value: &Value,
    options: &DiffOptions,
) -> bool {
    if options.report_filtered_presence {
        return false;
    }
    match filter {
        None => false,
        Some(set) => !set.retains(value),
    }
}
