//! Collection matching strategies.
//!
//! Keyed collections join by collection key. Ordered collections of
//! records join by identity key — the primary-key tuple when the item
//! type declares one, the full field tuple otherwise — or, behind
//! `fuzzy_match`, by greedy pairwise similarity. Plain scalar lists
//! compare positionally. Output is deterministic: base items in base
//! order, then other-only items.

use std::collections::HashMap;

use recdiff_model::Value;
use recdiff_selector::{Selector, SelectorSet, Step};
use tracing::debug;

use crate::entry::{DiffEntry, DiffKind};
use crate::error::DiffResult;
use crate::identity::{identity_key, IdentityKey};
use crate::iter::{Frame, Unit};
use crate::options::DiffOptions;
use crate::record::suppressed;

pub(crate) fn collection_units<'a>(
    base: &'a Value,
    other: &'a Value,
    base_sel: &Selector,
    other_sel: &Selector,
    filter: Option<&'a SelectorSet>,
    options: &DiffOptions,
) -> DiffResult<Vec<Unit<'a>>> {
    match (base, other) {
        (Value::Map(a), Value::Map(b)) => {
            Ok(keyed_units(a, b, base_sel, other_sel, filter, options))
        }
        (Value::List(a), Value::List(b)) => {
            list_units(a, b, base_sel, other_sel, filter, options)
        }
        // The caller dispatches here only for same-kind collection pairs.
        _ => unreachable!("collection_units on non-collection pair"),
    }
}

/// Maps join by collection key: shared keys recurse, base-only keys are
/// removed, other-only keys are added after.
fn keyed_units<'a>(
    base: &'a std::collections::BTreeMap<String, Value>,
    other: &'a std::collections::BTreeMap<String, Value>,
    base_sel: &Selector,
    other_sel: &Selector,
    filter: Option<&'a SelectorSet>,
    options: &DiffOptions,
) -> Vec<Unit<'a>> {
    let mut units = Vec::new();
    for (key, va) in base {
        let Some(sub_filter) = descend(filter, &Step::field(key)) else {
            continue;
        };
        let item_base = base_sel.clone().field(key);
        match other.get(key) {
            Some(vb) => units.push(Unit::Pair(Frame {
                base: va,
                other: vb,
                base_sel: item_base,
                other_sel: other_sel.clone().field(key),
                filter: sub_filter,
            })),
            None => {
                if suppressed(sub_filter, va, options) {
                    continue;
                }
                units.push(Unit::Emit(DiffEntry {
                    kind: DiffKind::Removed,
                    base: item_base,
                    other: other_sel.clone(),
                    base_value: Some(va),
                    other_value: None,
                }));
            }
        }
    }
    for (key, vb) in other {
        if base.contains_key(key) {
            continue;
        }
        let Some(sub_filter) = descend(filter, &Step::field(key)) else {
            continue;
        };
        if suppressed(sub_filter, vb, options) {
            continue;
        }
        units.push(Unit::Emit(DiffEntry {
            kind: DiffKind::Added,
            base: base_sel.clone(),
            other: other_sel.clone().field(key),
            base_value: None,
            other_value: Some(vb),
        }));
    }
    units
}

fn list_units<'a>(
    base: &'a [Value],
    other: &'a [Value],
    base_sel: &Selector,
    other_sel: &Selector,
    filter: Option<&'a SelectorSet>,
    options: &DiffOptions,
) -> DiffResult<Vec<Unit<'a>>> {
    // Empty slots drop out of the comparison entirely when ignored; the
    // surviving items keep their original indices for selectors.
    let items_a = effective_items(base, options);
    let items_b = effective_items(other, options);

    if records_with_shared_key(&items_a, &items_b, options) {
        keyed_record_units(&items_a, &items_b, base_sel, other_sel, filter, options)
    } else if options.fuzzy_match && all_records(&items_a) && all_records(&items_b) {
        debug!(
            base_items = items_a.len(),
            other_items = items_b.len(),
            "pairing unkeyed items by similarity (quadratic in collection size)"
        );
        Ok(fuzzy_units(&items_a, &items_b, base_sel, other_sel, filter, options))
    } else if all_records(&items_a) && all_records(&items_b) {
        keyed_record_units(&items_a, &items_b, base_sel, other_sel, filter, options)
    } else {
        Ok(positional_units(&items_a, &items_b, base_sel, other_sel, filter, options))
    }
}

fn effective_items<'a>(items: &'a [Value], options: &DiffOptions) -> Vec<(usize, &'a Value)> {
    items
        .iter()
        .enumerate()
        .filter(|&(_, v)| options.present(Some(v)).is_some())
        .collect()
}

fn all_records(items: &[(usize, &Value)]) -> bool {
    items.iter().all(|(_, v)| matches!(v, Value::Record(_)))
}

/// True when every item on both sides is a record of one shared type that
/// declares a primary key. Duck typing relaxes the shared-type requirement
/// to "each item's own type declares a key".
fn records_with_shared_key(
    items_a: &[(usize, &Value)],
    items_b: &[(usize, &Value)],
    options: &DiffOptions,
) -> bool {
    let mut type_name: Option<&str> = None;
    let mut seen_any = false;
    for (_, v) in items_a.iter().chain(items_b.iter()) {
        let Value::Record(rec) = v else {
            return false;
        };
        if !rec.ty().has_primary_key() {
            return false;
        }
        seen_any = true;
        if !options.duck_type {
            match type_name {
                None => type_name = Some(rec.type_name()),
                Some(name) if name != rec.type_name() => return false,
                Some(_) => {}
            }
        }
    }
    seen_any
}

/// Identity-key matching, shared by the primary-key and whole-value
/// strategies: the key function already reflects whether the item type
/// declares a primary key. Matched pairs with a key recurse; whole-value
/// matches are content-identical and only report position.
fn keyed_record_units<'a>(
    items_a: &[(usize, &'a Value)],
    items_b: &[(usize, &'a Value)],
    base_sel: &Selector,
    other_sel: &Selector,
    filter: Option<&'a SelectorSet>,
    options: &DiffOptions,
) -> DiffResult<Vec<Unit<'a>>> {
    // Whole-value keys mean a matched pair has nothing left to compare.
    let pk_matching = records_with_shared_key(items_a, items_b, options);

    // Duplicate keys pair up by occurrence: the second "x" in base
    // matches the second "x" in other.
    let mut seen_b: HashMap<IdentityKey, usize> = HashMap::new();
    let mut by_key: HashMap<(IdentityKey, usize), usize> = HashMap::new();
    for (pos, &(j, vb)) in items_b.iter().enumerate() {
        let key = identity_key(vb, options, &other_sel.clone().index(j))?;
        let counter = seen_b.entry(key.clone()).or_insert(0);
        let occurrence = *counter;
        *counter += 1;
        by_key.insert((key, occurrence), pos);
    }

    let mut matched_b = vec![false; items_b.len()];
    let mut pairs: Vec<Option<usize>> = Vec::with_capacity(items_a.len());
    let mut seen_a: HashMap<IdentityKey, usize> = HashMap::new();
    for &(i, va) in items_a {
        let key = identity_key(va, options, &base_sel.clone().index(i))?;
        let counter = seen_a.entry(key.clone()).or_insert(0);
        let occurrence = *counter;
        *counter += 1;
        match by_key.get(&(key, occurrence)) {
            Some(&pos) if !matched_b[pos] => {
                matched_b[pos] = true;
                pairs.push(Some(pos));
            }
            _ => pairs.push(None),
        }
    }

    let mut units = Vec::new();
    for (&(i, va), pair) in items_a.iter().zip(&pairs) {
        let Some(sub_filter) = descend(filter, &Step::Index(i)) else {
            continue;
        };
        let item_base = base_sel.clone().index(i);
        match pair {
            Some(pos) => {
                let (j, vb) = items_b[*pos];
                let item_other = other_sel.clone().index(j);
                if options.emit_moved && i != j {
                    units.push(Unit::Emit(DiffEntry {
                        kind: DiffKind::Moved,
                        base: item_base.clone(),
                        other: item_other.clone(),
                        base_value: Some(va),
                        other_value: Some(vb),
                    }));
                }
                if pk_matching {
                    units.push(Unit::Pair(Frame {
                        base: va,
                        other: vb,
                        base_sel: item_base,
                        other_sel: item_other,
                        filter: sub_filter,
                    }));
                } else if options.emit_unchanged {
                    units.push(Unit::Emit(DiffEntry {
                        kind: DiffKind::NoChange,
                        base: item_base,
                        other: item_other,
                        base_value: Some(va),
                        other_value: Some(vb),
                    }));
                }
            }
            None => {
                if suppressed(sub_filter, va, options) {
                    continue;
                }
                units.push(Unit::Emit(DiffEntry {
                    kind: DiffKind::Removed,
                    base: item_base,
                    other: other_sel.clone(),
                    base_value: Some(va),
                    other_value: None,
                }));
            }
        }
    }
    for (pos, &(j, vb)) in items_b.iter().enumerate() {
        if matched_b[pos] {
            continue;
        }
        let Some(sub_filter) = descend(filter, &Step::Index(j)) else {
            continue;
        };
        if suppressed(sub_filter, vb, options) {
            continue;
        }
        units.push(Unit::Emit(DiffEntry {
            kind: DiffKind::Added,
            base: base_sel.clone(),
            other: other_sel.clone().index(j),
            base_value: None,
            other_value: Some(vb),
        }));
    }
    Ok(units)
}

/// Greedy similarity pairing: score every cross pair, take pairs in
/// descending score order (ties broken by index proximity, then index),
/// and keep those at or above the threshold.
fn fuzzy_units<'a>(
    items_a: &[(usize, &'a Value)],
    items_b: &[(usize, &'a Value)],
    base_sel: &Selector,
    other_sel: &Selector,
    filter: Option<&'a SelectorSet>,
    options: &DiffOptions,
) -> Vec<Unit<'a>> {
    struct Candidate {
        a: usize,
        b: usize,
        score: f64,
    }

    let mut candidates = Vec::new();
    for (a_pos, &(_, va)) in items_a.iter().enumerate() {
        for (b_pos, &(_, vb)) in items_b.iter().enumerate() {
            let score = similarity(va, vb, options);
            if score >= options.fuzzy_threshold {
                candidates.push(Candidate {
                    a: a_pos,
                    b: b_pos,
                    score,
                });
            }
        }
    }
    candidates.sort_by(|x, y| {
        y.score
            .total_cmp(&x.score)
            .then_with(|| {
                let dx = items_a[x.a].0.abs_diff(items_b[x.b].0);
                let dy = items_a[y.a].0.abs_diff(items_b[y.b].0);
                dx.cmp(&dy)
            })
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });

    let mut pair_of_a: Vec<Option<usize>> = vec![None; items_a.len()];
    let mut matched_b = vec![false; items_b.len()];
    for c in candidates {
        if pair_of_a[c.a].is_some() || matched_b[c.b] {
            continue;
        }
        pair_of_a[c.a] = Some(c.b);
        matched_b[c.b] = true;
    }

    let mut units = Vec::new();
    for (&(i, va), pair) in items_a.iter().zip(&pair_of_a) {
        let Some(sub_filter) = descend(filter, &Step::Index(i)) else {
            continue;
        };
        let item_base = base_sel.clone().index(i);
        match pair {
            Some(b_pos) => {
                let (j, vb) = items_b[*b_pos];
                let item_other = other_sel.clone().index(j);
                if options.emit_moved && i != j {
                    units.push(Unit::Emit(DiffEntry {
                        kind: DiffKind::Moved,
                        base: item_base.clone(),
                        other: item_other.clone(),
                        base_value: Some(va),
                        other_value: Some(vb),
                    }));
                }
                units.push(Unit::Pair(Frame {
                    base: va,
                    other: vb,
                    base_sel: item_base,
                    other_sel: item_other,
                    filter: sub_filter,
                }));
            }
            None => {
                if suppressed(sub_filter, va, options) {
                    continue;
                }
                units.push(Unit::Emit(DiffEntry {
                    kind: DiffKind::Removed,
                    base: item_base,
                    other: other_sel.clone(),
                    base_value: Some(va),
                    other_value: None,
                }));
            }
        }
    }
    for (b_pos, &(j, vb)) in items_b.iter().enumerate() {
        if matched_b[b_pos] {
            continue;
        }
        let Some(sub_filter) = descend(filter, &Step::Index(j)) else {
            continue;
        };
        if suppressed(sub_filter, vb, options) {
            continue;
        }
        units.push(Unit::Emit(DiffEntry {
            kind: DiffKind::Added,
            base: base_sel.clone(),
            other: other_sel.clone().index(j),
            base_value: None,
            other_value: Some(vb),
        }));
    }
    units
}

/// The fraction of compared fields that are equal. Non-record pairs score
/// all-or-nothing; records of different types score zero unless duck
/// typing is on.
fn similarity(a: &Value, b: &Value, options: &DiffOptions) -> f64 {
    let (Value::Record(ra), Value::Record(rb)) = (a, b) else {
        return if options.values_equal(a, b) { 1.0 } else { 0.0 };
    };
    if !options.duck_type && ra.type_name() != rb.type_name() {
        return 0.0;
    }
    let mut compared = 0usize;
    let mut equal = 0usize;
    for fd in ra.ty().fields() {
        if fd.is_extraneous() && !options.include_extraneous {
            continue;
        }
        let slot_a = options.present(ra.get(fd.name()));
        let slot_b = options.present(rb.get(fd.name()));
        match (slot_a, slot_b) {
            (None, None) => {}
            (Some(va), Some(vb)) => {
                compared += 1;
                let is_equal = match fd.compare() {
                    Some(compare) => compare(va, vb),
                    None => options.values_equal(va, vb),
                };
                if is_equal {
                    equal += 1;
                }
            }
            _ => compared += 1,
        }
    }
    if compared == 0 {
        1.0
    } else {
        equal as f64 / compared as f64
    }
}

/// Index-by-index comparison for lists without item identity: shared
/// positions recurse (scalars decide equality there), the trailing length
/// difference is added or removed.
fn positional_units<'a>(
    items_a: &[(usize, &'a Value)],
    items_b: &[(usize, &'a Value)],
    base_sel: &Selector,
    other_sel: &Selector,
    filter: Option<&'a SelectorSet>,
    options: &DiffOptions,
) -> Vec<Unit<'a>> {
    let shared = items_a.len().min(items_b.len());
    let mut units = Vec::new();
    for pos in 0..shared {
        let (i, va) = items_a[pos];
        let (j, vb) = items_b[pos];
        let Some(sub_filter) = descend(filter, &Step::Index(i)) else {
            continue;
        };
        units.push(Unit::Pair(Frame {
            base: va,
            other: vb,
            base_sel: base_sel.clone().index(i),
            other_sel: other_sel.clone().index(j),
            filter: sub_filter,
        }));
    }
    for &(i, va) in &items_a[shared..] {
        let Some(sub_filter) = descend(filter, &Step::Index(i)) else {
            continue;
        };
        if suppressed(sub_filter, va, options) {
            continue;
        }
        units.push(Unit::Emit(DiffEntry {
            kind: DiffKind::Removed,
            base: base_sel.clone().index(i),
            other: other_sel.clone(),
            base_value: Some(va),
            other_value: None,
        }));
    }
    for &(j, vb) in &items_b[shared..] {
        let Some(sub_filter) = descend(filter, &Step::Index(j)) else {
            continue;
        };
        if suppressed(sub_filter, vb, options) {
            continue;
        }
        units.push(Unit::Emit(DiffEntry {
            kind: DiffKind::Added,
            base: base_sel.clone(),
            other: other_sel.clone().index(j),
            base_value: None,
            other_value: Some(vb),
        }));
    }
    units
}

/// Push the filter down one step; `None` means the step is excluded.
fn descend<'f>(
    filter: Option<&'f SelectorSet>,
    step: &Step,
) -> Option<Option<&'f SelectorSet>> {
    match filter {
        None => Some(None),
        Some(set) => set.index(step).map(Some),
    }
}
