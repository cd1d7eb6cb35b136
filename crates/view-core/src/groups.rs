//! Visibility groups and the inclusion predicate.
//!
//! A request names the groups it is authorized to see (or write). A field is
//! visible when it shares at least one group with the request. An empty
//! request set switches filtering off entirely; that mode is reserved for
//! trusted internal paths.

use std::collections::BTreeSet;
use std::fmt;

use crate::metadata::FieldDescriptor;

/// Separator used both in group annotations and in canonical cache keys.
pub const GROUP_SEPARATOR: char = ',';

/// A normalized (sorted, de-duplicated) set of group names.
///
/// Two sets built from the same names in a different order compare equal
/// and produce the same [`canonical`](GroupSet::canonical) string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupSet(BTreeSet<String>);

impl GroupSet {
    /// The empty set: no filtration.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a comma-separated annotation such as `"read, write"`.
    ///
    /// Whitespace around names is trimmed and empty entries are dropped, so a
    /// blank or malformed annotation yields the empty set.
    pub fn parse(annotation: &str) -> Self {
        annotation
            .split(GROUP_SEPARATOR)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, group: &str) -> bool {
        self.0.contains(group)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// `true` when the two sets share at least one group.
    pub fn intersects(&self, other: &GroupSet) -> bool {
        // Walk the smaller set.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|g| large.contains(g))
    }

    /// Lexicographically sorted names joined with [`GROUP_SEPARATOR`].
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for (i, name) in self.iter().enumerate() {
            if i > 0 {
                out.push(GROUP_SEPARATOR);
            }
            out.push_str(name);
        }
        out
    }
}

impl<S: Into<String>> FromIterator<S> for GroupSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        GroupSet(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for GroupSet {
    fn from(names: [S; N]) -> Self {
        names.into_iter().collect()
    }
}

impl fmt::Display for GroupSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.canonical())
    }
}

/// Whether `field` is visible to a request authorized for `groups`.
///
/// With no requested groups every field is included. Otherwise the field must
/// carry at least one of the requested groups; an untagged field is excluded.
pub fn included_by_group(field: &FieldDescriptor, groups: &GroupSet) -> bool {
    groups.is_empty() || field.groups.intersects(groups)
}
