//! Single-path selectors.
//!
//! A [`Selector`] is an immutable, ordered sequence of [`Step`]s addressing
//! one location in a value tree. A wildcard step fans a resolve out over
//! every child at that depth, so a selector with *k* wildcards resolves to a
//! *k*-level nested sequence of values ([`Resolved`]).
//!
//! Selectors order lexicographically over their step sequence, using each
//! step's natural comparison (`Field < Index < Wildcard` across variants).
//! Mutating a collection while a wildcard iteration over the same collection
//! is outstanding is the caller's responsibility to avoid.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use recdiff_model::{classify, CollKey, Node, Shape, Value};

use crate::error::{Result, SelectorError};
use crate::parse;

/// One step of a selector path.
///
/// Map keys reuse [`Step::Field`]; an integer index only ever addresses an
/// ordered collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    /// A record field name or map key.
    Field(String),
    /// An index into an ordered collection.
    Index(usize),
    /// All children at this depth.
    Wildcard,
}

impl Step {
    pub fn field(name: impl Into<String>) -> Self {
        Step::Field(name.into())
    }

    /// Resolve this step against a value, if the child exists.
    pub fn child_of<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match (self, value) {
            (Step::Field(name), Value::Record(rec)) => rec.get(name),
            (Step::Field(name), Value::Map(entries)) => entries.get(name.as_str()),
            (Step::Index(i), Value::List(items)) => items.get(*i),
            _ => None,
        }
    }

    fn child_of_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        match (self, value) {
            (Step::Field(name), Value::Record(rec)) => rec.get_mut(name),
            (Step::Field(name), Value::Map(entries)) => entries.get_mut(name.as_str()),
            (Step::Index(i), Value::List(items)) => items.get_mut(*i),
            _ => None,
        }
    }

    /// `true` when the value's kind can carry this step at all. Separates
    /// "not found" (right kind, missing child) from "type mismatch".
    fn fits(&self, value: &Value) -> bool {
        match self {
            Step::Field(_) => matches!(value, Value::Record(_) | Value::Map(_)),
            Step::Index(_) => matches!(value, Value::List(_)),
            Step::Wildcard => value.is_collection(),
        }
    }

    /// The node kind this step expects, for error messages.
    fn expects(&self) -> &'static str {
        match self {
            Step::Field(_) => "record or map",
            Step::Index(_) => "list",
            Step::Wildcard => "collection",
        }
    }
}

impl From<CollKey<'_>> for Step {
    fn from(key: CollKey<'_>) -> Self {
        match key {
            CollKey::Index(i) => Step::Index(i),
            CollKey::Key(k) => Step::Field(k.to_string()),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&parse::render_step(self))
    }
}

/// The result of resolving a selector: one value per wildcard-free path,
/// one nesting level per wildcard.
#[derive(Debug, PartialEq)]
pub enum Resolved<'a> {
    /// A single resolved value.
    One(&'a Value),
    /// A wildcard fan-out item that did not resolve. Present so sibling
    /// positions stay aligned with the collection iterated over.
    Missing,
    /// One entry per child of a wildcard fan-out.
    Many(Vec<Resolved<'a>>),
}

impl<'a> Resolved<'a> {
    /// All resolved values, depth-first, skipping missing fan-out slots.
    pub fn flatten(&self) -> Vec<&'a Value> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<&'a Value>) {
        match self {
            Resolved::One(v) => out.push(v),
            Resolved::Missing => {}
            Resolved::Many(items) => {
                for item in items {
                    item.collect_into(out);
                }
            }
        }
    }
}

/// An immutable path into a value tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector {
    steps: Vec<Step>,
}

impl Selector {
    /// The empty selector, addressing the root itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Extend with a field-name step.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.steps.push(Step::Field(name.into()));
        self
    }

    /// Extend with an index step.
    pub fn index(mut self, index: usize) -> Self {
        self.steps.push(Step::Index(index));
        self
    }

    /// Extend with a wildcard step.
    pub fn wildcard(mut self) -> Self {
        self.steps.push(Step::Wildcard);
        self
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Concatenate: the result addresses `other` relative to where `self`
    /// points.
    pub fn join(&self, other: &Selector) -> Selector {
        let mut steps = self.steps.clone();
        steps.extend(other.steps.iter().cloned());
        Selector { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.steps.iter().any(|s| matches!(s, Step::Wildcard))
    }

    /// The selector minus its final step, or `None` for the root.
    pub fn parent(&self) -> Option<Selector> {
        if self.steps.is_empty() {
            None
        } else {
            Some(Selector {
                steps: self.steps[..self.steps.len() - 1].to_vec(),
            })
        }
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// `true` when `prefix` is a leading sub-sequence of this selector.
    pub fn starts_with(&self, prefix: &Selector) -> bool {
        self.steps.len() >= prefix.steps.len() && self.steps[..prefix.steps.len()] == prefix.steps
    }

    fn not_found(&self, pos: usize) -> SelectorError {
        SelectorError::NotFound {
            step: parse::render_step(&self.steps[pos]),
            path: parse::render_steps(&self.steps[..=pos]),
        }
    }

    fn mismatch(&self, pos: usize, actual: &Value) -> SelectorError {
        SelectorError::TypeMismatch {
            expected: self.steps[pos].expects(),
            actual: actual.kind_name(),
            path: parse::render_steps(&self.steps[..pos]),
        }
    }

    /// Resolve the selector against `root`.
    ///
    /// Wildcards fan out; a fan-out in which some children fail to resolve
    /// still succeeds (with [`Resolved::Missing`] in the failed slots) so
    /// long as at least one child resolves, or the collection is empty. If
    /// every child fails, the first failure is returned.
    pub fn resolve<'a>(&self, root: &'a Value) -> Result<Resolved<'a>> {
        self.resolve_at(root, 0)
    }

    fn resolve_at<'a>(&self, value: &'a Value, pos: usize) -> Result<Resolved<'a>> {
        let Some(step) = self.steps.get(pos) else {
            return Ok(Resolved::One(value));
        };
        match step {
            Step::Wildcard => {
                let Node::Collection(coll) = classify(value) else {
                    return Err(self.mismatch(pos, value));
                };
                let mut out = Vec::new();
                let mut first_err = None;
                let mut any_ok = false;
                for (_key, item) in coll.items() {
                    match self.resolve_at(item, pos + 1) {
                        Ok(r) => {
                            any_ok = true;
                            out.push(r);
                        }
                        Err(e) => {
                            first_err.get_or_insert(e);
                            out.push(Resolved::Missing);
                        }
                    }
                }
                match (any_ok, first_err) {
                    (false, Some(e)) => Err(e),
                    _ => Ok(Resolved::Many(out)),
                }
            }
            step => {
                if !step.fits(value) {
                    return Err(self.mismatch(pos, value));
                }
                match step.child_of(value) {
                    Some(child) => self.resolve_at(child, pos + 1),
                    None => Err(self.not_found(pos)),
                }
            }
        }
    }

    /// Resolve to exactly one value. Fails with [`SelectorError::FanOut`]
    /// when the selector contains a wildcard.
    pub fn get<'a>(&self, root: &'a Value) -> Result<&'a Value> {
        if self.has_wildcard() {
            return Err(SelectorError::FanOut {
                path: parse::render_steps(&self.steps),
            });
        }
        match self.resolve(root)? {
            Resolved::One(v) => Ok(v),
            // Unreachable without wildcards, checked above.
            _ => Err(SelectorError::FanOut {
                path: parse::render_steps(&self.steps),
            }),
        }
    }

    /// Like [`Selector::get`], with any resolution failure collapsed to
    /// `None`.
    pub fn get_or_none<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.get(root).ok()
    }

    /// Replace the contents of the terminal location. The path up to (but
    /// not including) the final step must already resolve.
    ///
    /// A non-terminal wildcard assigns into every child (cloning the value);
    /// a terminal wildcard replaces a collection's contents wholesale and
    /// requires the value to be a collection of the same kind.
    pub fn assign(&self, root: &mut Value, value: Value) -> Result<()> {
        if self.steps.is_empty() {
            *root = value;
            return Ok(());
        }
        self.assign_at(root, 0, value)
    }

    fn assign_at(&self, value: &mut Value, pos: usize, new: Value) -> Result<()> {
        if pos + 1 == self.steps.len() {
            return self.set_terminal(value, pos, new);
        }
        match &self.steps[pos] {
            Step::Wildcard => match value {
                Value::List(items) => {
                    for item in items.iter_mut() {
                        self.assign_at(item, pos + 1, new.clone())?;
                    }
                    Ok(())
                }
                Value::Map(entries) => {
                    for item in entries.values_mut() {
                        self.assign_at(item, pos + 1, new.clone())?;
                    }
                    Ok(())
                }
                other => Err(self.mismatch(pos, other)),
            },
            step => {
                if !step.fits(value) {
                    return Err(self.mismatch(pos, value));
                }
                match step.child_of_mut(value) {
                    Some(child) => self.assign_at(child, pos + 1, new),
                    None => Err(self.not_found(pos)),
                }
            }
        }
    }

    fn set_terminal(&self, value: &mut Value, pos: usize, new: Value) -> Result<()> {
        match (&self.steps[pos], &mut *value) {
            (Step::Field(name), Value::Record(rec)) => {
                rec.set(name, new).map_err(|_| self.not_found(pos))
            }
            (Step::Field(name), Value::Map(entries)) => {
                entries.insert(name.clone(), new);
                Ok(())
            }
            (Step::Index(i), Value::List(items)) => match items.get_mut(*i) {
                Some(slot) => {
                    *slot = new;
                    Ok(())
                }
                None => Err(self.not_found(pos)),
            },
            (Step::Wildcard, Value::List(items)) => match new {
                Value::List(new_items) => {
                    *items = new_items;
                    Ok(())
                }
                other => Err(SelectorError::TypeMismatch {
                    expected: "list",
                    actual: other.kind_name(),
                    path: parse::render_steps(&self.steps[..pos]),
                }),
            },
            (Step::Wildcard, Value::Map(entries)) => match new {
                Value::Map(new_entries) => {
                    *entries = new_entries;
                    Ok(())
                }
                other => Err(SelectorError::TypeMismatch {
                    expected: "map",
                    actual: other.kind_name(),
                    path: parse::render_steps(&self.steps[..pos]),
                }),
            },
            (_, other) => Err(self.mismatch(pos, other)),
        }
    }

    /// Auto-vivifying assign: missing intermediate records are synthesized
    /// from their declared [`Shape`], missing list slots are appended (only
    /// in order), and missing map entries are inserted.
    ///
    /// Synthesizing a record fails when the record type has a required field
    /// that is not the next step of this selector. Returns the number of
    /// terminal slots written; a wildcard over an empty collection writes
    /// zero.
    pub fn assign_or_create(&self, root: &mut Value, value: Value) -> Result<usize> {
        if self.steps.is_empty() {
            *root = value;
            return Ok(1);
        }
        self.post_at(root, None, 0, &value)
    }

    fn post_at(
        &self,
        value: &mut Value,
        shape: Option<&Shape>,
        pos: usize,
        new: &Value,
    ) -> Result<usize> {
        let last = pos + 1 == self.steps.len();
        match &self.steps[pos] {
            Step::Wildcard => {
                if last {
                    self.set_terminal(value, pos, new.clone())?;
                    return Ok(1);
                }
                let item_shape = shape.and_then(|s| s.item());
                let mut count = 0;
                match value {
                    Value::List(items) => {
                        for item in items.iter_mut() {
                            count += self.post_at(item, item_shape, pos + 1, new)?;
                        }
                    }
                    Value::Map(entries) => {
                        for item in entries.values_mut() {
                            count += self.post_at(item, item_shape, pos + 1, new)?;
                        }
                    }
                    other => return Err(self.mismatch(pos, other)),
                }
                Ok(count)
            }
            Step::Field(name) => match value {
                Value::Record(rec) => {
                    let fd = rec
                        .ty()
                        .field(name)
                        .ok_or_else(|| self.not_found(pos))?;
                    let field_shape = fd.shape().clone();
                    if last {
                        rec.set(name, new.clone()).map_err(|_| self.not_found(pos))?;
                        return Ok(1);
                    }
                    if !rec.is_set(name) {
                        let seeded = self.vivify(Some(&field_shape), pos)?;
                        rec.set(name, seeded).map_err(|_| self.not_found(pos))?;
                    }
                    let child = rec.get_mut(name).ok_or_else(|| self.not_found(pos))?;
                    self.post_at(child, Some(&field_shape), pos + 1, new)
                }
                Value::Map(entries) => {
                    if last {
                        entries.insert(name.clone(), new.clone());
                        return Ok(1);
                    }
                    let item_shape = shape.and_then(|s| s.item());
                    if !entries.contains_key(name.as_str()) {
                        let seeded = self.vivify(item_shape, pos)?;
                        entries.insert(name.clone(), seeded);
                    }
                    let child = entries
                        .get_mut(name.as_str())
                        .ok_or_else(|| self.not_found(pos))?;
                    self.post_at(child, item_shape, pos + 1, new)
                }
                other => Err(self.mismatch(pos, other)),
            },
            Step::Index(i) => match value {
                Value::List(items) => {
                    let item_shape = shape.and_then(|s| s.item());
                    if *i > items.len() {
                        return Err(SelectorError::OutOfOrder {
                            index: *i,
                            len: items.len(),
                            path: parse::render_steps(&self.steps[..=pos]),
                        });
                    }
                    if last {
                        if *i == items.len() {
                            items.push(new.clone());
                        } else {
                            items[*i] = new.clone();
                        }
                        return Ok(1);
                    }
                    if *i == items.len() {
                        items.push(self.vivify(item_shape, pos)?);
                    }
                    self.post_at(&mut items[*i], item_shape, pos + 1, new)
                }
                other => Err(self.mismatch(pos, other)),
            },
        }
    }

    /// Synthesize an empty intermediate value for `assign_or_create`. The
    /// step at `pos` is the one being vivified; `pos + 1` always exists.
    fn vivify(&self, shape: Option<&Shape>, pos: usize) -> Result<Value> {
        match shape {
            Some(Shape::Record(ty)) => {
                let next_field = match &self.steps[pos + 1] {
                    Step::Field(name) => Some(name.as_str()),
                    _ => None,
                };
                for fd in ty.fields() {
                    if fd.is_required() && Some(fd.name()) != next_field {
                        return Err(SelectorError::AutoVivify {
                            type_name: ty.name().to_string(),
                            field: fd.name().to_string(),
                            path: parse::render_steps(&self.steps[..=pos]),
                        });
                    }
                }
                Ok(Value::Record(ty.instance()))
            }
            Some(Shape::List(_)) => Ok(Value::List(Vec::new())),
            Some(Shape::Map(_)) => Ok(Value::Map(BTreeMap::new())),
            Some(Shape::Scalar) => Err(SelectorError::TypeMismatch {
                expected: "record or collection",
                actual: "scalar",
                path: parse::render_steps(&self.steps[..=pos]),
            }),
            // No descriptor available: pick the container the next step
            // implies. A record cannot be synthesized without a descriptor.
            None => match &self.steps[pos + 1] {
                Step::Field(_) => Ok(Value::Map(BTreeMap::new())),
                Step::Index(_) | Step::Wildcard => Ok(Value::List(Vec::new())),
            },
        }
    }

    /// Remove the value at the terminal location.
    ///
    /// Removing a record field unsets the slot (idempotent); removing a list
    /// index shifts later items down; a terminal wildcard clears the
    /// collection. A non-terminal wildcard removes from every child and only
    /// fails when every child fails.
    pub fn remove(&self, root: &mut Value) -> Result<()> {
        if self.steps.is_empty() {
            return Ok(());
        }
        self.remove_at(root, 0)
    }

    fn remove_at(&self, value: &mut Value, pos: usize) -> Result<()> {
        if pos + 1 == self.steps.len() {
            return self.remove_terminal(value, pos);
        }
        match &self.steps[pos] {
            Step::Wildcard => {
                let mut first_err = None;
                let mut any_ok = false;
                let mut tried = false;
                match value {
                    Value::List(items) => {
                        for item in items.iter_mut() {
                            tried = true;
                            match self.remove_at(item, pos + 1) {
                                Ok(()) => any_ok = true,
                                Err(e) => {
                                    first_err.get_or_insert(e);
                                }
                            }
                        }
                    }
                    Value::Map(entries) => {
                        for item in entries.values_mut() {
                            tried = true;
                            match self.remove_at(item, pos + 1) {
                                Ok(()) => any_ok = true,
                                Err(e) => {
                                    first_err.get_or_insert(e);
                                }
                            }
                        }
                    }
                    other => return Err(self.mismatch(pos, other)),
                }
                match (tried && !any_ok, first_err) {
                    (true, Some(e)) => Err(e),
                    _ => Ok(()),
                }
            }
            step => {
                if !step.fits(value) {
                    return Err(self.mismatch(pos, value));
                }
                match step.child_of_mut(value) {
                    Some(child) => self.remove_at(child, pos + 1),
                    None => Err(self.not_found(pos)),
                }
            }
        }
    }

    fn remove_terminal(&self, value: &mut Value, pos: usize) -> Result<()> {
        match (&self.steps[pos], &mut *value) {
            (Step::Field(name), Value::Record(rec)) => {
                rec.unset(name);
                Ok(())
            }
            (Step::Field(name), Value::Map(entries)) => {
                entries.remove(name.as_str());
                Ok(())
            }
            (Step::Index(i), Value::List(items)) => {
                if *i < items.len() {
                    items.remove(*i);
                    Ok(())
                } else {
                    Err(self.not_found(pos))
                }
            }
            (Step::Wildcard, Value::List(items)) => {
                items.clear();
                Ok(())
            }
            (Step::Wildcard, Value::Map(entries)) => {
                entries.clear();
                Ok(())
            }
            (_, other) => Err(self.mismatch(pos, other)),
        }
    }

    /// Expand wildcards against a concrete tree, producing the wildcard-free
    /// selectors for children that exist in `root`. Concrete steps that do
    /// not resolve are kept as-is (so callers can observe the absence);
    /// wildcards over missing subtrees expand to nothing.
    pub fn expand(&self, root: &Value) -> Vec<Selector> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        self.expand_at(root, 0, &mut prefix, &mut out);
        out
    }

    fn expand_at(
        &self,
        value: &Value,
        pos: usize,
        prefix: &mut Vec<Step>,
        out: &mut Vec<Selector>,
    ) {
        let Some(step) = self.steps.get(pos) else {
            out.push(Selector {
                steps: prefix.clone(),
            });
            return;
        };
        match step {
            Step::Wildcard => {
                if let Node::Collection(coll) = classify(value) {
                    for (key, item) in coll.items() {
                        prefix.push(Step::from(key));
                        self.expand_at(item, pos + 1, prefix, out);
                        prefix.pop();
                    }
                }
            }
            step => match step.child_of(value) {
                Some(child) => {
                    prefix.push(step.clone());
                    self.expand_at(child, pos + 1, prefix, out);
                    prefix.pop();
                }
                None => {
                    let mut steps = prefix.clone();
                    steps.extend(self.steps[pos..].iter().cloned());
                    out.push(Selector { steps });
                }
            },
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&parse::render_steps(&self.steps))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self> {
        parse::parse_steps(s).map(Selector::from_steps)
    }
}

impl From<Vec<Step>> for Selector {
    fn from(steps: Vec<Step>) -> Self {
        Selector::from_steps(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recdiff_model::{FieldDescriptor, RecordValue, Shape, TypeDescriptor};
    use std::sync::Arc;

    fn address_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::new(
            "Address",
            vec![
                FieldDescriptor::new("city", Shape::Scalar),
                FieldDescriptor::new("country", Shape::Scalar),
            ],
        )
        .unwrap()
    }

    fn person_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::new(
            "Person",
            vec![
                FieldDescriptor::new("name", Shape::Scalar),
                FieldDescriptor::new("address", Shape::record(address_type())),
                FieldDescriptor::new("tags", Shape::list_of(Shape::Scalar)),
            ],
        )
        .unwrap()
    }

    fn sample_person() -> Value {
        let address = address_type().instance().with("city", "Oslo").unwrap();
        Value::Record(
            person_type()
                .instance()
                .with("name", "Ada")
                .unwrap()
                .with("address", address)
                .unwrap()
                .with("tags", vec![Value::from("a"), Value::from("b")])
                .unwrap(),
        )
    }

    #[test]
    fn get_walks_fields_and_indices() {
        let root = sample_person();
        let sel = Selector::root().field("address").field("city");
        assert_eq!(sel.get(&root).unwrap(), &Value::from("Oslo"));
        let sel = Selector::root().field("tags").index(1);
        assert_eq!(sel.get(&root).unwrap(), &Value::from("b"));
    }

    #[test]
    fn missing_field_is_not_found() {
        let root = sample_person();
        let sel = Selector::root().field("address").field("country");
        assert!(matches!(
            sel.get(&root),
            Err(SelectorError::NotFound { .. })
        ));
    }

    #[test]
    fn step_into_scalar_is_type_mismatch() {
        let root = sample_person();
        let sel = Selector::root().field("name").field("x");
        assert!(matches!(
            sel.get(&root),
            Err(SelectorError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn wildcard_fans_out() {
        let root = sample_person();
        let sel = Selector::root().field("tags").wildcard();
        let resolved = sel.resolve(&root).unwrap();
        assert_eq!(
            resolved.flatten(),
            vec![&Value::from("a"), &Value::from("b")]
        );
        assert!(matches!(sel.get(&root), Err(SelectorError::FanOut { .. })));
    }

    #[test]
    fn wildcard_tolerates_partial_failure() {
        // One item resolves, one lacks the field: the failed slot becomes
        // Missing so positions stay aligned with the collection.
        let with_city = address_type().instance().with("city", "Oslo").unwrap();
        let without = address_type().instance().with("country", "NO").unwrap();
        let root = Value::List(vec![Value::Record(with_city), Value::Record(without)]);
        let sel = Selector::root().wildcard().field("city");
        assert_eq!(
            sel.resolve(&root).unwrap(),
            Resolved::Many(vec![Resolved::One(&Value::from("Oslo")), Resolved::Missing])
        );
    }

    #[test]
    fn wildcard_with_no_surviving_item_reports_the_first_error() {
        let a = address_type().instance().with("country", "NO").unwrap();
        let b = address_type().instance().with("country", "SE").unwrap();
        let root = Value::List(vec![Value::Record(a), Value::Record(b)]);
        let sel = Selector::root().wildcard().field("city");
        assert!(matches!(
            sel.resolve(&root),
            Err(SelectorError::NotFound { .. })
        ));
        // An empty collection fans out to an empty Many, not an error.
        let empty = Value::List(Vec::new());
        assert_eq!(sel.resolve(&empty).unwrap(), Resolved::Many(Vec::new()));
    }

    #[test]
    fn assign_replaces_terminal() {
        let mut root = sample_person();
        let sel = Selector::root().field("address").field("city");
        sel.assign(&mut root, Value::from("Bergen")).unwrap();
        assert_eq!(sel.get(&root).unwrap(), &Value::from("Bergen"));
    }

    #[test]
    fn assign_requires_existing_path() {
        let mut root = Value::Record(person_type().instance());
        let sel = Selector::root().field("address").field("city");
        assert!(matches!(
            sel.assign(&mut root, Value::from("Bergen")),
            Err(SelectorError::NotFound { .. })
        ));
    }

    #[test]
    fn assign_or_create_vivifies_records_and_lists() {
        let mut root = Value::Record(person_type().instance());
        Selector::root()
            .field("address")
            .field("city")
            .assign_or_create(&mut root, Value::from("Bergen"))
            .unwrap();
        Selector::root()
            .field("tags")
            .index(0)
            .assign_or_create(&mut root, Value::from("x"))
            .unwrap();
        assert_eq!(
            Selector::root()
                .field("address")
                .field("city")
                .get(&root)
                .unwrap(),
            &Value::from("Bergen")
        );
        assert_eq!(
            Selector::root().field("tags").index(0).get(&root).unwrap(),
            &Value::from("x")
        );
    }

    #[test]
    fn assign_or_create_rejects_list_gaps() {
        let mut root = Value::Record(person_type().instance());
        let err = Selector::root()
            .field("tags")
            .index(2)
            .assign_or_create(&mut root, Value::from("x"))
            .unwrap_err();
        assert!(matches!(err, SelectorError::OutOfOrder { .. }));
    }

    #[test]
    fn assign_or_create_reports_unsatisfiable_required_field() {
        let strict = TypeDescriptor::new(
            "Strict",
            vec![
                FieldDescriptor::new("token", Shape::Scalar).required(),
                FieldDescriptor::new("inner", Shape::Scalar),
            ],
        )
        .unwrap();
        let holder = TypeDescriptor::new(
            "Holder",
            vec![FieldDescriptor::new("strict", Shape::record(strict))],
        )
        .unwrap();
        let mut root = Value::Record(holder.instance());
        let err = Selector::root()
            .field("strict")
            .field("inner")
            .assign_or_create(&mut root, Value::from(1i64))
            .unwrap_err();
        match err {
            SelectorError::AutoVivify { field, .. } => assert_eq!(field, "token"),
            other => panic!("expected AutoVivify, got {other:?}"),
        }
    }

    #[test]
    fn remove_shifts_list_indices() {
        let mut root = sample_person();
        Selector::root()
            .field("tags")
            .index(0)
            .remove(&mut root)
            .unwrap();
        let sel = Selector::root().field("tags").index(0);
        assert_eq!(sel.get(&root).unwrap(), &Value::from("b"));
    }

    #[test]
    fn remove_unsets_record_field() {
        let mut root = sample_person();
        Selector::root().field("name").remove(&mut root).unwrap();
        assert!(matches!(
            Selector::root().field("name").get(&root),
            Err(SelectorError::NotFound { .. })
        ));
    }

    #[test]
    fn selectors_order_lexicographically() {
        let a: Selector = ".a".parse().unwrap();
        let ab: Selector = ".a.b".parse().unwrap();
        let b: Selector = ".b".parse().unwrap();
        assert!(a < ab);
        assert!(ab < b);
    }

    #[test]
    fn join_concatenates() {
        let a = Selector::root().field("a");
        let b = Selector::root().index(0);
        assert_eq!(a.join(&b), Selector::root().field("a").index(0));
    }

    #[test]
    fn expand_substitutes_wildcards() {
        let root = sample_person();
        let sel = Selector::root().field("tags").wildcard();
        let expanded = sel.expand(&root);
        assert_eq!(
            expanded,
            vec![
                Selector::root().field("tags").index(0),
                Selector::root().field("tags").index(1),
            ]
        );
    }
}
