//! Pool items.
//!
//! An [`Item`] is one row of an association pool: a flat mapping from
//! attribute name to string value. Items are immutable once built; value
//! expansion produces modified copies through [`Item::with_value`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::invalid::InvalidValues;

/// A single attribute value of a pool item.
///
/// Pool readers deliver plain strings. Multi-valued attributes arrive either
/// as a bracketed text list (`"[a, b]"`) or as an explicit [`ItemValue::List`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ItemValue {
    /// A single string value.
    Text(String),
    /// An explicit list of string values.
    List(Vec<String>),
}

impl ItemValue {
    /// Returns the value as a string slice if it is a single value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ItemValue::Text(s) => Some(s),
            ItemValue::List(_) => None,
        }
    }

    /// Returns true if this is an explicit list.
    pub fn is_list(&self) -> bool {
        matches!(self, ItemValue::List(_))
    }
}

impl fmt::Display for ItemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemValue::Text(s) => f.write_str(s),
            ItemValue::List(values) => {
                f.write_str("[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}'", value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for ItemValue {
    fn from(value: &str) -> Self {
        ItemValue::Text(value.to_string())
    }
}

impl From<String> for ItemValue {
    fn from(value: String) -> Self {
        ItemValue::Text(value)
    }
}

impl From<Vec<String>> for ItemValue {
    fn from(values: Vec<String>) -> Self {
        ItemValue::List(values)
    }
}

impl From<Vec<&str>> for ItemValue {
    fn from(values: Vec<&str>) -> Self {
        ItemValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// One pool row: attribute name to value, plus the pool index it came from.
///
/// Two items are equal when their attributes and their origin match, so two
/// identical rows read from different pool positions remain distinct members.
///
/// # Example
///
/// ```
/// use asnforge_core::{Item, ItemValue};
///
/// let item = Item::new()
///     .with("instrument", "nircam")
///     .with("filter", "f200w")
///     .with_origin(0);
///
/// assert_eq!(item.text("filter"), Some("f200w"));
/// assert_eq!(item.origin(), Some(0));
///
/// let narrowed = item.with_value("filter", "f444w");
/// assert_eq!(narrowed.get("filter"), Some(&ItemValue::from("f444w")));
/// assert_eq!(narrowed.origin(), Some(0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    #[cfg_attr(feature = "serde", serde(flatten))]
    attributes: BTreeMap<String, ItemValue>,
    #[cfg_attr(feature = "serde", serde(skip))]
    origin: Option<usize>,
    #[cfg_attr(feature = "serde", serde(skip))]
    expanded: BTreeSet<String>,
}

impl Item {
    /// Creates an empty item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this item with the attribute set.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ItemValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns a copy of this item tagged with its pool row index.
    pub fn with_origin(mut self, origin: usize) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Returns a copy of this item with `key` replaced by `value`.
    ///
    /// The origin is preserved so derived items still refer to their row.
    pub fn with_value(&self, key: &str, value: impl Into<ItemValue>) -> Self {
        let mut copy = self.clone();
        copy.attributes.insert(key.to_string(), value.into());
        copy
    }

    /// Returns a copy with `key` set to one element of a multi-valued
    /// attribute.
    ///
    /// The attribute is marked as expanded: its new value is taken as is,
    /// even if it looks like a list itself.
    pub fn with_expanded_value(&self, key: &str, value: impl Into<ItemValue>) -> Self {
        let mut copy = self.with_value(key, value);
        copy.expanded.insert(key.to_string());
        copy
    }

    /// Returns true if `key` holds one element of an expanded list.
    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    /// Returns the value of an attribute.
    pub fn get(&self, key: &str) -> Option<&ItemValue> {
        self.attributes.get(key)
    }

    /// Returns the value of an attribute if it is a single string.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ItemValue::as_text)
    }

    /// Returns true if the attribute is present (valid or not).
    pub fn contains_key(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Finds the first source attribute that is present and valid.
    ///
    /// Sources are scanned in order. An attribute whose value is one of the
    /// `invalid` sentinels is treated as missing and the scan continues.
    /// Returns the matching source name along with its value.
    pub fn first_valid<'a, S>(
        &'a self,
        sources: &'a [S],
        invalid: &InvalidValues,
    ) -> Option<(&'a str, &'a ItemValue)>
    where
        S: AsRef<str>,
    {
        sources.iter().find_map(|source| {
            let source = source.as_ref();
            match self.attributes.get(source) {
                Some(value) if !invalid.is_invalid(value) => Some((source, value)),
                _ => None,
            }
        })
    }

    /// Returns the pool row index this item was read from, if known.
    pub fn origin(&self) -> Option<usize> {
        self.origin
    }

    /// Iterates attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the item has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Item
where
    K: Into<String>,
    V: Into<ItemValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            attributes: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            origin: None,
            expanded: BTreeSet::new(),
        }
    }
}

/// Canonical rendering: `{key: value, ...}` in key order.
impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (key, value)) in self.attributes.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        f.write_str("}")
    }
}
