//! Selector sets: many selectors collapsed into one inclusion filter.
//!
//! A [`SelectorSet`] is a tree mirroring record-field / collection-key /
//! wildcard structure; the presence of a node means "this location and
//! everything reachable through it is included". The complete set (matches
//! everything) is a distinguished value. Sets are immutable once built and
//! freely shareable.
//!
//! A wildcard inserted at a depth that already carries specific steps (or
//! vice versa) widens the whole level to the wildcard — the union of every
//! sub-set — since a wildcard in any input selector means "all children
//! here". The widening is logged as a diagnostic rather than treated as an
//! error.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::str::FromStr;

use recdiff_model::{classify, Node, RecordValue, Value};
use tracing::debug;

use crate::error::{Result, SelectorError};
use crate::parse;
use crate::selector::{Selector, Step};

/// A set-union of selectors, represented as an inclusion tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorSet {
    /// Matches this location and everything beneath it.
    Complete,
    /// Matches the locations reachable through the listed steps. An empty
    /// branch map is the empty set.
    Branches(BTreeMap<Step, SelectorSet>),
}

impl Default for SelectorSet {
    fn default() -> Self {
        SelectorSet::empty()
    }
}

impl SelectorSet {
    /// The set that matches nothing.
    pub fn empty() -> Self {
        SelectorSet::Branches(BTreeMap::new())
    }

    /// The set that matches everything.
    pub fn complete() -> Self {
        SelectorSet::Complete
    }

    /// Build the union of the given selectors.
    pub fn from_selectors<I>(selectors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Selector>,
    {
        let mut set = SelectorSet::empty();
        for selector in selectors {
            set.insert(&selector.into());
        }
        set
    }

    /// Add one selector's inclusion tree to this set.
    pub fn insert(&mut self, selector: &Selector) {
        self.insert_steps(selector.steps());
    }

    fn insert_steps(&mut self, steps: &[Step]) {
        let SelectorSet::Branches(map) = self else {
            // Already complete; nothing can widen it further.
            return;
        };
        let Some((head, rest)) = steps.split_first() else {
            *self = SelectorSet::Complete;
            return;
        };
        if *head == Step::Wildcard && rest.is_empty() {
            // "Everything at this depth" swallows the whole level.
            *self = SelectorSet::Complete;
            return;
        }
        map.entry(head.clone())
            .or_insert_with(SelectorSet::empty)
            .insert_steps(rest);
        self.widen_conflicts();
    }

    /// Resolve mixed wildcard/specific steps at this level by widening to
    /// the wildcard.
    fn widen_conflicts(&mut self) {
        let SelectorSet::Branches(map) = self else {
            return;
        };
        if map.len() > 1 && map.contains_key(&Step::Wildcard) {
            debug!(
                steps = map.len() - 1,
                "selector set mixes a wildcard with specific steps; widening to the wildcard"
            );
            let mut merged = map
                .remove(&Step::Wildcard)
                .unwrap_or_else(SelectorSet::empty);
            for (_step, sub) in mem::take(map) {
                merged.union_with(sub);
            }
            map.insert(Step::Wildcard, merged);
        }
        if map.len() == 1 && map.get(&Step::Wildcard) == Some(&SelectorSet::Complete) {
            *self = SelectorSet::Complete;
        }
    }

    /// In-place union with another set.
    pub fn union_with(&mut self, other: SelectorSet) {
        match (&mut *self, other) {
            (SelectorSet::Complete, _) => {}
            (_, SelectorSet::Complete) => *self = SelectorSet::Complete,
            (SelectorSet::Branches(map), SelectorSet::Branches(other_map)) => {
                for (step, sub) in other_map {
                    match map.get_mut(&step) {
                        Some(existing) => existing.union_with(sub),
                        None => {
                            map.insert(step, sub);
                        }
                    }
                }
                self.widen_conflicts();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SelectorSet::Branches(map) if map.is_empty())
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SelectorSet::Complete)
    }

    /// The sub-set reachable after following one step, used to push a
    /// filter down one level during traversal. `None` means the step is
    /// excluded entirely.
    pub fn index(&self, step: &Step) -> Option<&SelectorSet> {
        match self {
            SelectorSet::Complete => Some(self),
            SelectorSet::Branches(map) => {
                map.get(step).or_else(|| map.get(&Step::Wildcard))
            }
        }
    }

    /// Whether a single step is included at the top level.
    pub fn contains_step(&self, step: &Step) -> bool {
        self.index(step).is_some()
    }

    /// Whether the set is a superset of the selector: applying the set as a
    /// filter and then the selector yields the same as the selector alone.
    /// A selector that stops at a partially-included interior location is
    /// *not* contained.
    pub fn contains(&self, selector: &Selector) -> bool {
        self.contains_steps(selector.steps())
    }

    fn contains_steps(&self, steps: &[Step]) -> bool {
        match self {
            SelectorSet::Complete => true,
            SelectorSet::Branches(map) => {
                let Some((head, rest)) = steps.split_first() else {
                    return false;
                };
                match map.get(head).or_else(|| map.get(&Step::Wildcard)) {
                    Some(sub) => sub.contains_steps(rest),
                    None => false,
                }
            }
        }
    }

    /// Every selector this set is the union of, in deterministic order.
    /// The complete set enumerates as the root selector.
    pub fn selectors(&self) -> Vec<Selector> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        self.collect_selectors(&mut prefix, &mut out);
        out
    }

    fn collect_selectors(&self, prefix: &mut Vec<Step>, out: &mut Vec<Selector>) {
        match self {
            SelectorSet::Complete => out.push(Selector::from_steps(prefix.clone())),
            SelectorSet::Branches(map) => {
                for (step, sub) in map {
                    prefix.push(step.clone());
                    sub.collect_selectors(prefix, out);
                    prefix.pop();
                }
            }
        }
    }

    /// A filtered copy of `root`: only the locations this set includes
    /// survive. Interior records whose every field is filtered out are
    /// omitted from their parent; the empty set yields an empty shell of
    /// the root (an empty record, list, or map).
    pub fn get(&self, root: &Value) -> Value {
        self.filtered(root).unwrap_or_else(|| empty_shell(root))
    }

    /// Filtered copy, or `None` when nothing under this set survives.
    pub fn filtered(&self, value: &Value) -> Option<Value> {
        match self {
            SelectorSet::Complete => Some(value.clone()),
            SelectorSet::Branches(map) if map.is_empty() => None,
            SelectorSet::Branches(_) => match classify(value) {
                Node::Scalar(_) => None,
                Node::Record(rec) => {
                    let mut copy = RecordValue::new(rec.ty().clone());
                    for (name, slot) in rec.entries() {
                        let step = Step::field(name);
                        let Some(sub) = self.index(&step) else {
                            continue;
                        };
                        if let Some(filtered) = sub.filtered(slot) {
                            // Field is declared on the type; set cannot fail.
                            let _ = copy.set(name, filtered);
                        }
                    }
                    if copy.entries().next().is_none() {
                        None
                    } else {
                        Some(Value::Record(copy))
                    }
                }
                Node::Collection(coll) => {
                    let mut list = Vec::new();
                    let mut entries = BTreeMap::new();
                    let mut keyed = false;
                    for (key, item) in coll.items() {
                        let step = Step::from(key);
                        let Some(sub) = self.index(&step) else {
                            continue;
                        };
                        let Some(filtered) = sub.filtered(item) else {
                            continue;
                        };
                        match step {
                            Step::Field(name) => {
                                keyed = true;
                                entries.insert(name, filtered);
                            }
                            _ => list.push(filtered),
                        }
                    }
                    if keyed {
                        if entries.is_empty() {
                            None
                        } else {
                            Some(Value::Map(entries))
                        }
                    } else if list.is_empty() {
                        None
                    } else {
                        Some(Value::List(list))
                    }
                }
            },
        }
    }

    /// `true` when filtering `value` under this set leaves any content.
    pub fn retains(&self, value: &Value) -> bool {
        self.filtered(value).is_some()
    }

    /// Copy into `target` only the values this set addresses, taken from
    /// `source`, auto-vivifying in `target` as needed. Locations the set
    /// addresses that are absent in `source` are removed from `target`.
    pub fn patch(&self, target: &mut Value, source: &Value) -> Result<()> {
        for selector in self.selectors() {
            for concrete in selector.expand(source) {
                match concrete.get(source) {
                    Ok(found) => {
                        concrete.assign_or_create(target, found.clone())?;
                    }
                    Err(SelectorError::NotFound { .. }) => match concrete.remove(target) {
                        Ok(()) | Err(SelectorError::NotFound { .. }) => {}
                        Err(e) => return Err(e),
                    },
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    /// Remove every location this set addresses from `root`. Missing
    /// locations are ignored.
    pub fn delete(&self, root: &mut Value) {
        let mut concrete: Vec<Selector> = self
            .selectors()
            .iter()
            .flat_map(|s| s.expand(root))
            .collect();
        // Delete deepest/highest-index first so earlier removals cannot
        // shift the indices of later ones.
        concrete.sort();
        for selector in concrete.iter().rev() {
            let _ = selector.remove(root);
        }
    }
}

/// An empty value of the same outer kind as `root`.
fn empty_shell(root: &Value) -> Value {
    match root {
        Value::Record(rec) => Value::Record(RecordValue::new(rec.ty().clone())),
        Value::List(_) => Value::List(Vec::new()),
        Value::Map(_) => Value::Map(BTreeMap::new()),
        Value::Scalar(_) => Value::null(),
    }
}

impl fmt::Display for SelectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorSet::Complete => f.write_str("[*]"),
            SelectorSet::Branches(map) if map.len() == 1 => {
                let (step, sub) = map.iter().next().ok_or(fmt::Error)?;
                f.write_str(&parse::render_step(step))?;
                fmt_tail(sub, f)
            }
            SelectorSet::Branches(map) => {
                f.write_str("(")?;
                for (i, (step, sub)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    f.write_str(&parse::render_step(step))?;
                    fmt_tail(sub, f)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A complete tail renders as nothing; anything else renders recursively.
fn fmt_tail(sub: &SelectorSet, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match sub {
        SelectorSet::Complete => Ok(()),
        other => write!(f, "{other}"),
    }
}

impl FromStr for SelectorSet {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "[*]" {
            return Ok(SelectorSet::Complete);
        }
        let paths = parse::parse_set_paths(s)?;
        Ok(SelectorSet::from_selectors(
            paths.into_iter().map(Selector::from_steps),
        ))
    }
}

impl FromIterator<Selector> for SelectorSet {
    fn from_iter<I: IntoIterator<Item = Selector>>(iter: I) -> Self {
        SelectorSet::from_selectors(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recdiff_model::{FieldDescriptor, Shape, TypeDescriptor};
    use std::sync::Arc;

    fn sel(path: &str) -> Selector {
        path.parse().unwrap()
    }

    fn abc_set() -> SelectorSet {
        SelectorSet::from_selectors([sel(".a.b"), sel(".a.d"), sel(".c")])
    }

    fn point_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::new(
            "Point",
            vec![
                FieldDescriptor::new("x", Shape::Scalar),
                FieldDescriptor::new("y", Shape::Scalar),
            ],
        )
        .unwrap()
    }

    fn sketch_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::new(
            "Sketch",
            vec![
                FieldDescriptor::new("name", Shape::Scalar),
                FieldDescriptor::new(
                    "points",
                    Shape::list_of(Shape::record(point_type())),
                ),
            ],
        )
        .unwrap()
    }

    fn sample_sketch() -> Value {
        let p0 = point_type()
            .instance()
            .with("x", 1i64)
            .unwrap()
            .with("y", 2i64)
            .unwrap();
        let p1 = point_type()
            .instance()
            .with("x", 3i64)
            .unwrap()
            .with("y", 4i64)
            .unwrap();
        Value::Record(
            sketch_type()
                .instance()
                .with("name", "squiggle")
                .unwrap()
                .with("points", vec![Value::Record(p0), Value::Record(p1)])
                .unwrap(),
        )
    }

    #[test]
    fn contains_follows_full_paths_only() {
        let set = abc_set();
        assert!(set.contains(&sel(".a.b")));
        assert!(set.contains(&sel(".c")));
        assert!(set.contains(&sel(".c.anything")));
        // Partial interior coverage does not count as containment.
        assert!(!set.contains(&sel(".a")));
        assert!(!set.contains(&sel(".a.e")));
    }

    #[test]
    fn index_descends_one_level() {
        let set = abc_set();
        let under_a = set.index(&Step::field("a")).unwrap();
        assert!(under_a.contains(&sel(".b")));
        assert!(!under_a.contains(&sel(".x")));
        assert!(set.index(&Step::field("z")).is_none());
        assert!(set.index(&Step::field("c")).unwrap().is_complete());
    }

    #[test]
    fn wildcard_widens_specific_steps() {
        let set = SelectorSet::from_selectors([sel("[0].x"), sel("[*].y")]);
        // Widening folds [0].x into the wildcard.
        assert!(set.contains(&sel("[4].y")));
        assert!(set.contains(&sel("[4].x")));
        assert!(!set.contains(&sel("[4].z")));
    }

    #[test]
    fn complete_swallows_everything() {
        let set = SelectorSet::from_selectors([sel(".a.b"), sel("[*]")]);
        assert!(set.is_complete());
        assert!(set.contains(&sel(".anything[3]")));
    }

    #[test]
    fn display_round_trips() {
        let set = abc_set();
        let rendered = set.to_string();
        let back: SelectorSet = rendered.parse().unwrap();
        assert_eq!(back, set);

        let complete: SelectorSet = "[*]".parse().unwrap();
        assert!(complete.is_complete());
        assert_eq!(complete.to_string(), "[*]");
    }

    #[test]
    fn get_filters_copies() {
        let root = sample_sketch();
        let set = SelectorSet::from_selectors([sel(".points[*].x")]);
        let filtered = set.get(&root);
        let rec = filtered.as_record().unwrap();
        assert!(rec.get("name").is_none());
        let points = rec.get("points").unwrap().as_list().unwrap();
        assert_eq!(points.len(), 2);
        let p0 = points[0].as_record().unwrap();
        assert_eq!(p0.get("x"), Some(&Value::from(1i64)));
        assert!(p0.get("y").is_none());
    }

    #[test]
    fn empty_set_yields_empty_shell() {
        let root = sample_sketch();
        let filtered = SelectorSet::empty().get(&root);
        let rec = filtered.as_record().unwrap();
        assert_eq!(rec.entries().count(), 0);
    }

    #[test]
    fn filter_containment_property() {
        // Every scalar leaf reachable in F.get(T) satisfies F.contains.
        let root = sample_sketch();
        let set = SelectorSet::from_selectors([sel(".points[*].x"), sel(".name")]);
        let filtered = set.get(&root);
        let mut leaves = Vec::new();
        collect_leaves(&filtered, Selector::root(), &mut leaves);
        assert!(!leaves.is_empty());
        for leaf in &leaves {
            assert!(set.contains(leaf), "leaked location {leaf}");
        }
        // And the excluded location is not reachable.
        assert!(leaves.iter().all(|l| l != &sel(".points[0].y")));
    }

    fn collect_leaves(value: &Value, at: Selector, out: &mut Vec<Selector>) {
        match classify(value) {
            Node::Scalar(_) => out.push(at),
            Node::Record(rec) => {
                for (name, slot) in rec.entries() {
                    collect_leaves(slot, at.clone().field(name), out);
                }
            }
            Node::Collection(coll) => {
                for (key, item) in coll.items() {
                    let mut next = at.clone();
                    next.push(Step::from(key));
                    collect_leaves(item, next, out);
                }
            }
        }
    }

    #[test]
    fn patch_copies_and_deletes() {
        let source = sample_sketch();
        let mut target = Value::Record(sketch_type().instance());
        let set = SelectorSet::from_selectors([sel(".name"), sel(".points[*].x")]);
        set.patch(&mut target, &source).unwrap();
        assert_eq!(
            sel(".name").get(&target).unwrap(),
            &Value::from("squiggle")
        );
        assert_eq!(
            sel(".points[1].x").get(&target).unwrap(),
            &Value::from(3i64)
        );

        // A location absent in source is removed from target.
        let mut target = sample_sketch();
        let bare = Value::Record(sketch_type().instance());
        SelectorSet::from_selectors([sel(".name")])
            .patch(&mut target, &bare)
            .unwrap();
        assert!(sel(".name").get(&target).is_err());
    }

    #[test]
    fn delete_removes_addressed_locations() {
        let mut root = sample_sketch();
        SelectorSet::from_selectors([sel(".points[*].y"), sel(".name")]).delete(&mut root);
        assert!(sel(".name").get(&root).is_err());
        assert!(sel(".points[0].y").get(&root).is_err());
        assert_eq!(
            sel(".points[0].x").get(&root).unwrap(),
            &Value::from(1i64)
        );
    }
}
