//! Diff output types.
//!
//! A [`DiffEntry`] records one difference: its kind plus the selector of
//! the location on *each* side — collection matching can pair items that
//! live at different keys, so the two paths are kept separately. [`Diff`]
//! is the eager container with per-kind counts.

use std::fmt;

use recdiff_model::Value;
use recdiff_selector::Selector;
use serde::{Deserialize, Serialize};

/// The kind of one difference. Serializes as its canonical name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// The values compare equal. Emitted only when unchanged reporting is
    /// requested.
    #[serde(rename = "none")]
    NoChange,
    /// Present in *other* only.
    Added,
    /// Present in *base* only.
    Removed,
    /// Present on both sides with different values.
    Modified,
    /// The same item at a different collection position. Emitted only when
    /// move reporting is requested.
    Moved,
}

impl DiffKind {
    /// Lowercase machine name.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            DiffKind::NoChange => "none",
            DiffKind::Added => "added",
            DiffKind::Removed => "removed",
            DiffKind::Modified => "modified",
            DiffKind::Moved => "moved",
        }
    }

    /// Uppercase display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            DiffKind::NoChange => "UNCHANGED",
            DiffKind::Added => "ADDED",
            DiffKind::Removed => "REMOVED",
            DiffKind::Modified => "MODIFIED",
            DiffKind::Moved => "MOVED",
        }
    }

    pub fn from_canonical(name: &str) -> Option<Self> {
        match name {
            "none" => Some(DiffKind::NoChange),
            "added" => Some(DiffKind::Added),
            "removed" => Some(DiffKind::Removed),
            "modified" => Some(DiffKind::Modified),
            "moved" => Some(DiffKind::Moved),
            _ => None,
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One difference, with enough information to reconstruct the values
/// diffed: the location on each side and a borrow of each side's value
/// where one exists.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffEntry<'a> {
    pub kind: DiffKind,
    /// Location in the base tree. For `Added`, the parent collection.
    pub base: Selector,
    /// Location in the other tree. For `Removed`, the parent collection.
    pub other: Selector,
    pub base_value: Option<&'a Value>,
    pub other_value: Option<&'a Value>,
}

impl fmt::Display for DiffEntry<'_> {
    /// Renders `MODIFIED .name`. When the two paths differ, the longer one
    /// wins if it extends the other (the parent-side selector of an
    /// added/removed item carries no extra information); genuinely
    /// diverged paths render as `(base/other)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind)?;
        if self.base == self.other {
            return write!(f, "{}", self.other);
        }
        if self.base.len() > self.other.len() && self.base.starts_with(&self.other) {
            write!(f, "{}", self.base)
        } else if self.other.len() > self.base.len() && self.other.starts_with(&self.base) {
            write!(f, "{}", self.other)
        } else {
            write!(f, "({}/{})", self.base, self.other)
        }
    }
}

/// The result of an eager diff: every entry, in deterministic order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diff<'a> {
    /// Type name of the base root.
    pub base_type: String,
    /// Type name of the other root.
    pub other_type: String,
    /// The differences, record fields in declaration order and collection
    /// items in base order with other-only additions after.
    pub entries: Vec<DiffEntry<'a>>,
}

impl<'a> Diff<'a> {
    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn count(&self, kind: DiffKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Number of added locations.
    pub fn additions(&self) -> usize {
        self.count(DiffKind::Added)
    }

    /// Number of removed locations.
    pub fn removals(&self) -> usize {
        self.count(DiffKind::Removed)
    }

    /// Number of modified locations.
    pub fn modifications(&self) -> usize {
        self.count(DiffKind::Modified)
    }

    /// Number of moved items.
    pub fn moves(&self) -> usize {
        self.count(DiffKind::Moved)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffEntry<'a>> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for Diff<'a> {
    type Item = DiffEntry<'a>;
    type IntoIter = std::vec::IntoIter<DiffEntry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, 'd> IntoIterator for &'d Diff<'a> {
    type Item = &'d DiffEntry<'a>;
    type IntoIter = std::slice::Iter<'d, DiffEntry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Diff<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.base_type == self.other_type {
            write!(f, "Diff [{}]; {} entries", self.base_type, self.len())
        } else {
            write!(
                f,
                "Diff [{} vs {}]; {} entries",
                self.base_type,
                self.other_type,
                self.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(path: &str) -> Selector {
        path.parse().unwrap()
    }

    #[test]
    fn canonical_names_round_trip() {
        for kind in [
            DiffKind::NoChange,
            DiffKind::Added,
            DiffKind::Removed,
            DiffKind::Modified,
            DiffKind::Moved,
        ] {
            assert_eq!(DiffKind::from_canonical(kind.canonical_name()), Some(kind));
        }
        assert_eq!(DiffKind::from_canonical("bogus"), None);
    }

    #[test]
    fn kinds_serialize_as_canonical_names() {
        assert_eq!(
            serde_json::to_string(&DiffKind::NoChange).unwrap(),
            "\"none\""
        );
        assert_eq!(
            serde_json::from_str::<DiffKind>("\"moved\"").unwrap(),
            DiffKind::Moved
        );
    }

    #[test]
    fn display_collapses_identical_paths() {
        let entry = DiffEntry {
            kind: DiffKind::Modified,
            base: sel(".name"),
            other: sel(".name"),
            base_value: None,
            other_value: None,
        };
        assert_eq!(entry.to_string(), "MODIFIED .name");
    }

    #[test]
    fn display_prefers_the_extending_path() {
        let removed = DiffEntry {
            kind: DiffKind::Removed,
            base: sel(".tags[2]"),
            other: sel(".tags"),
            base_value: None,
            other_value: None,
        };
        assert_eq!(removed.to_string(), "REMOVED .tags[2]");

        let moved = DiffEntry {
            kind: DiffKind::Moved,
            base: sel(".tags[2]"),
            other: sel(".tags[0]"),
            base_value: None,
            other_value: None,
        };
        assert_eq!(moved.to_string(), "MOVED (.tags[2]/.tags[0])");
    }
}
