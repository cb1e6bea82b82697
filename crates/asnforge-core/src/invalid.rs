//! Sentinel values marking an attribute as missing.

use std::collections::BTreeSet;

use crate::item::ItemValue;

/// Strings a pool uses to say "no value here".
///
/// Pool writers fill empty cells with markers such as `NULL` or `N/A`.
/// Constraint lookups skip attributes holding one of these markers as if the
/// attribute were absent. An empty explicit list is always treated as missing.
///
/// # Example
///
/// ```
/// use asnforge_core::{InvalidValues, ItemValue};
///
/// let invalid = InvalidValues::common();
/// assert!(invalid.is_invalid(&ItemValue::from("NULL")));
/// assert!(!invalid.is_invalid(&ItemValue::from("f200w")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidValues {
    values: BTreeSet<String>,
}

impl InvalidValues {
    /// Creates an empty set: every present attribute is valid.
    pub fn new() -> Self {
        Self::default()
    }

    /// The markers written by the standard pool generator.
    pub fn common() -> Self {
        ["", "NULL", "N/A", "N", "n"].into_iter().collect()
    }

    /// Registers another marker.
    pub fn with(mut self, value: impl Into<String>) -> Self {
        self.values.insert(value.into());
        self
    }

    /// Returns true if the string is a missing-value marker.
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    /// Returns true if the attribute value should be treated as missing.
    pub fn is_invalid(&self, value: &ItemValue) -> bool {
        match value {
            ItemValue::Text(s) => self.contains(s),
            ItemValue::List(values) => values.is_empty(),
        }
    }

    /// Iterates the registered markers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Number of markers.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no markers are registered.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for InvalidValues {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_markers() {
        let invalid = InvalidValues::common();
        assert_eq!(invalid.len(), 5);
        assert!(invalid.contains(""));
        assert!(invalid.contains("n"));
        assert!(!invalid.contains("NONE"));
    }

    #[test]
    fn test_empty_list_is_missing() {
        let invalid = InvalidValues::new();
        assert!(invalid.is_invalid(&ItemValue::List(Vec::new())));
        assert!(!invalid.is_invalid(&ItemValue::from(vec!["a"])));
    }

    #[test]
    fn test_with_adds_marker() {
        let invalid = InvalidValues::new().with("NONE");
        assert!(invalid.is_invalid(&ItemValue::from("NONE")));
    }
}
