//! The generic reduce over a single tree.
//!
//! A [`Visitor`] supplies three callbacks — map a scalar, combine a record's
//! field results, combine a collection's item results — and the [`visit`]
//! driver handles classification, declaration-order field iteration,
//! filter push-down, and location bookkeeping. Every error a callback
//! raises comes back tagged with the full selector of the node that was
//! being visited.

use recdiff_model::{classify, CollKey, Collection, CollectionKind, Node, RecordValue, Scalar, Value};
use recdiff_selector::{Selector, SelectorSet, Step};

use crate::error::{BoxError, Result, VisitError};

/// Control value returned by visitor callbacks.
///
/// `Prune` stops traversal of the current subtree without error: the
/// subtree contributes no result and sibling traversal continues.
pub enum Flow<T> {
    Continue(T),
    Prune,
}

/// Callbacks for one traversal. The driver owns dispatch and location
/// context; implementations own what a node reduces to.
pub trait Visitor {
    type Output;

    /// Reduce a scalar leaf.
    fn visit_scalar(&mut self, scalar: &Scalar) -> std::result::Result<Flow<Self::Output>, BoxError>;

    /// Combine the per-field results of a record. `fields` holds the
    /// declared name of every field that produced a result, in declaration
    /// order; filtered, extraneous, pruned, and unset fields are absent.
    fn combine_record(
        &mut self,
        record: &RecordValue,
        fields: Vec<(String, Self::Output)>,
    ) -> std::result::Result<Flow<Self::Output>, BoxError>;

    /// Combine the per-item results of a collection. Each item carries the
    /// step it was reached through.
    fn combine_collection(
        &mut self,
        kind: CollectionKind,
        items: Vec<(Step, Self::Output)>,
    ) -> std::result::Result<Flow<Self::Output>, BoxError>;

    /// Whether extraneous fields are descended into. Defaults to skipping
    /// them, matching the diff engine's view of a record.
    fn include_extraneous(&self) -> bool {
        false
    }

    /// The iteration order for a collection's items. The default walks
    /// ordered collections by index and keyed collections by key.
    fn collection_order<'a>(&self, collection: &Collection<'a>) -> Vec<(CollKey<'a>, &'a Value)> {
        collection.items().collect()
    }
}

/// Traverse `root`, reducing it through `visitor`. An active `filter`
/// restricts which children are descended into, pushed down one level per
/// step. Returns `None` when the root itself was pruned or fully filtered
/// out.
pub fn visit<V: Visitor>(
    root: &Value,
    visitor: &mut V,
    filter: Option<&SelectorSet>,
) -> Result<Option<V::Output>> {
    let mut frames = Vec::new();
    visit_node(root, visitor, filter, &mut frames)
}

fn visit_node<V: Visitor>(
    value: &Value,
    visitor: &mut V,
    filter: Option<&SelectorSet>,
    frames: &mut Vec<Step>,
) -> Result<Option<V::Output>> {
    match classify(value) {
        Node::Scalar(scalar) => {
            let flow = visitor
                .visit_scalar(scalar)
                .map_err(|source| callback_error(frames, source))?;
            Ok(flow_into(flow))
        }
        Node::Record(record) => {
            let mut fields = Vec::new();
            for fd in record.ty().fields() {
                if fd.is_extraneous() && !visitor.include_extraneous() {
                    continue;
                }
                let Some(slot) = record.get(fd.name()) else {
                    continue;
                };
                let step = Step::field(fd.name());
                let Some(sub_filter) = descend_filter(filter, &step) else {
                    continue;
                };
                frames.push(step);
                let result = visit_node(slot, visitor, sub_filter, frames);
                frames.pop();
                if let Some(out) = result? {
                    fields.push((fd.name().to_string(), out));
                }
            }
            let flow = visitor
                .combine_record(record, fields)
                .map_err(|source| callback_error(frames, source))?;
            Ok(flow_into(flow))
        }
        Node::Collection(collection) => {
            let kind = collection.kind();
            let mut items = Vec::new();
            for (key, item) in visitor.collection_order(&collection) {
                let step = Step::from(key);
                let Some(sub_filter) = descend_filter(filter, &step) else {
                    continue;
                };
                frames.push(step.clone());
                let result = visit_node(item, visitor, sub_filter, frames);
                frames.pop();
                if let Some(out) = result? {
                    items.push((step, out));
                }
            }
            let flow = visitor
                .combine_collection(kind, items)
                .map_err(|source| callback_error(frames, source))?;
            Ok(flow_into(flow))
        }
    }
}

/// Push the filter down one step. `Ok(None)` filter means unrestricted.
/// A `None` return means the step is excluded and must not be descended.
fn descend_filter<'f>(
    filter: Option<&'f SelectorSet>,
    step: &Step,
) -> Option<Option<&'f SelectorSet>> {
    match filter {
        None => Some(None),
        Some(set) => set.index(step).map(Some),
    }
}

fn flow_into<T>(flow: Flow<T>) -> Option<T> {
    match flow {
        Flow::Continue(out) => Some(out),
        Flow::Prune => None,
    }
}

fn callback_error(frames: &[Step], source: BoxError) -> VisitError {
    VisitError::Callback {
        path: Selector::from_steps(frames.to_vec()),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recdiff_model::{FieldDescriptor, Shape, TypeDescriptor};
    use std::sync::Arc;

    /// Counts scalar leaves, recording the order fields were combined in.
    struct LeafCounter {
        combined: Vec<Vec<String>>,
    }

    impl Visitor for LeafCounter {
        type Output = usize;

        fn visit_scalar(&mut self, _: &Scalar) -> std::result::Result<Flow<usize>, BoxError> {
            Ok(Flow::Continue(1))
        }

        fn combine_record(
            &mut self,
            _: &RecordValue,
            fields: Vec<(String, usize)>,
        ) -> std::result::Result<Flow<usize>, BoxError> {
            self.combined
                .push(fields.iter().map(|(name, _)| name.clone()).collect());
            Ok(Flow::Continue(fields.iter().map(|(_, n)| n).sum()))
        }

        fn combine_collection(
            &mut self,
            _: CollectionKind,
            items: Vec<(Step, usize)>,
        ) -> std::result::Result<Flow<usize>, BoxError> {
            Ok(Flow::Continue(items.iter().map(|(_, n)| n).sum()))
        }
    }

    fn person_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::new(
            "Person",
            vec![
                FieldDescriptor::new("name", Shape::Scalar),
                FieldDescriptor::new("age", Shape::Scalar),
                FieldDescriptor::new("tags", Shape::list_of(Shape::Scalar)),
                FieldDescriptor::new("audit", Shape::Scalar).extraneous(),
            ],
        )
        .unwrap()
    }

    fn sample_person() -> Value {
        Value::Record(
            person_type()
                .instance()
                .with("name", "Ada")
                .unwrap()
                .with("age", 36i64)
                .unwrap()
                .with("tags", vec![Value::from("x"), Value::from("y")])
                .unwrap()
                .with("audit", "ignored")
                .unwrap(),
        )
    }

    #[test]
    fn counts_leaves_in_declaration_order() {
        let root = sample_person();
        let mut counter = LeafCounter { combined: Vec::new() };
        let total = visit(&root, &mut counter, None).unwrap();
        // Extraneous "audit" is skipped.
        assert_eq!(total, Some(4));
        assert_eq!(counter.combined, vec![vec!["name", "age", "tags"]]);
    }

    #[test]
    fn filter_excludes_subtrees() {
        let root = sample_person();
        let filter: SelectorSet = ".name".parse().unwrap();
        let mut counter = LeafCounter { combined: Vec::new() };
        let total = visit(&root, &mut counter, Some(&filter)).unwrap();
        assert_eq!(total, Some(1));
        assert_eq!(counter.combined, vec![vec!["name"]]);
    }

    #[test]
    fn callback_errors_carry_the_failure_location() {
        struct FailOnInt;
        impl Visitor for FailOnInt {
            type Output = ();
            fn visit_scalar(&mut self, s: &Scalar) -> std::result::Result<Flow<()>, BoxError> {
                if matches!(s, Scalar::Int(_)) {
                    Err("integers are unwelcome".into())
                } else {
                    Ok(Flow::Continue(()))
                }
            }
            fn combine_record(
                &mut self,
                _: &RecordValue,
                _: Vec<(String, ())>,
            ) -> std::result::Result<Flow<()>, BoxError> {
                Ok(Flow::Continue(()))
            }
            fn combine_collection(
                &mut self,
                _: CollectionKind,
                _: Vec<(Step, ())>,
            ) -> std::result::Result<Flow<()>, BoxError> {
                Ok(Flow::Continue(()))
            }
        }

        let root = sample_person();
        let err = visit(&root, &mut FailOnInt, None).unwrap_err();
        assert_eq!(err.path().to_string(), ".age");
    }

    #[test]
    fn prune_skips_a_subtree_without_error() {
        struct PruneTags;
        impl Visitor for PruneTags {
            type Output = usize;
            fn visit_scalar(&mut self, _: &Scalar) -> std::result::Result<Flow<usize>, BoxError> {
                Ok(Flow::Continue(1))
            }
            fn combine_record(
                &mut self,
                _: &RecordValue,
                fields: Vec<(String, usize)>,
            ) -> std::result::Result<Flow<usize>, BoxError> {
                Ok(Flow::Continue(fields.iter().map(|(_, n)| n).sum()))
            }
            fn combine_collection(
                &mut self,
                _: CollectionKind,
                _: Vec<(Step, usize)>,
            ) -> std::result::Result<Flow<usize>, BoxError> {
                Ok(Flow::Prune)
            }
        }

        let root = sample_person();
        let total = visit(&root, &mut PruneTags, None).unwrap();
        // The tags collection pruned itself; name and age still counted.
        assert_eq!(total, Some(2));
    }
}
