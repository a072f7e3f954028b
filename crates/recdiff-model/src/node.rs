//! The node classifier.
//!
//! [`classify`] sorts any [`Value`] into one of three roles — scalar,
//! record, or collection — and, for the latter two, exposes children as
//! (key, value) pairs. Classification is pure dispatch on the value's
//! discriminant: an empty list is still a collection.

use std::collections::btree_map;
use std::fmt;
use std::iter::Enumerate;
use std::slice;

use crate::value::{RecordValue, Scalar, Value};

/// Whether a collection is indexed by position or by key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    /// Items addressed by integer index, iterated in index order.
    Ordered,
    /// Items addressed by arbitrary key, iterated in key order.
    Keyed,
}

/// The key of one collection item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollKey<'a> {
    Index(usize),
    Key(&'a str),
}

impl fmt::Display for CollKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollKey::Index(i) => write!(f, "[{i}]"),
            CollKey::Key(k) => write!(f, "[{k:?}]"),
        }
    }
}

/// A classified collection node.
#[derive(Clone, Copy)]
pub struct Collection<'a> {
    value: &'a Value,
}

impl<'a> Collection<'a> {
    pub fn kind(&self) -> CollectionKind {
        match self.value {
            Value::List(_) => CollectionKind::Ordered,
            Value::Map(_) => CollectionKind::Keyed,
            // Constructed only by classify() on a collection variant.
            _ => unreachable!("Collection built from non-collection value"),
        }
    }

    pub fn len(&self) -> usize {
        match self.value {
            Value::List(items) => items.len(),
            Value::Map(entries) => entries.len(),
            _ => unreachable!("Collection built from non-collection value"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate items as (key, value) pairs in iteration order.
    pub fn items(&self) -> Items<'a> {
        match self.value {
            Value::List(items) => Items::Ordered(items.iter().enumerate()),
            Value::Map(entries) => Items::Keyed(entries.iter()),
            _ => unreachable!("Collection built from non-collection value"),
        }
    }
}

/// Iterator over collection items.
pub enum Items<'a> {
    Ordered(Enumerate<slice::Iter<'a, Value>>),
    Keyed(btree_map::Iter<'a, String, Value>),
}

impl<'a> Iterator for Items<'a> {
    type Item = (CollKey<'a>, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Items::Ordered(iter) => iter.next().map(|(i, v)| (CollKey::Index(i), v)),
            Items::Keyed(iter) => iter.next().map(|(k, v)| (CollKey::Key(k), v)),
        }
    }
}

/// The role a value plays in the tree.
pub enum Node<'a> {
    Scalar(&'a Scalar),
    Record(&'a RecordValue),
    Collection(Collection<'a>),
}

/// Classify a value. Pure dispatch; never fails.
pub fn classify(value: &Value) -> Node<'_> {
    match value {
        Value::Scalar(s) => Node::Scalar(s),
        Value::Record(r) => Node::Record(r),
        Value::List(_) | Value::Map(_) => Node::Collection(Collection { value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn empty_list_is_still_a_collection() {
        let v = Value::List(Vec::new());
        match classify(&v) {
            Node::Collection(coll) => {
                assert_eq!(coll.kind(), CollectionKind::Ordered);
                assert!(coll.is_empty());
            }
            _ => panic!("expected collection"),
        }
    }

    #[test]
    fn map_items_iterate_in_key_order() {
        let mut entries = BTreeMap::new();
        entries.insert("b".to_string(), Value::from(2i64));
        entries.insert("a".to_string(), Value::from(1i64));
        let v = Value::Map(entries);
        match classify(&v) {
            Node::Collection(coll) => {
                assert_eq!(coll.kind(), CollectionKind::Keyed);
                let keys: Vec<_> = coll.items().map(|(k, _)| format!("{k}")).collect();
                assert_eq!(keys, vec!["[\"a\"]", "[\"b\"]"]);
            }
            _ => panic!("expected collection"),
        }
    }

    #[test]
    fn scalars_classify_as_scalars() {
        let v = Value::from("leaf");
        assert!(matches!(classify(&v), Node::Scalar(_)));
    }
}
