//! Member bookkeeping hooks.

use asnforge_core::Item;

use crate::association::Association;

/// Callbacks a rule supplies to manage association members.
///
/// The engine calls these with no assumptions beyond their contracts:
/// [`RuleHooks::is_item_member`] decides idempotence of `add`,
/// [`RuleHooks::add_member`] stores an accepted item and
/// [`RuleHooks::init_hook`] runs once, on the first accepted item.
pub trait RuleHooks: Send + Sync {
    /// Returns true if `item` is already one of `members`.
    fn is_item_member(&self, members: &[Item], item: &Item) -> bool;

    /// Appends an accepted item.
    fn add_member(&self, members: &mut Vec<Item>, item: Item) {
        members.push(item);
    }

    /// Runs before the first member is added.
    ///
    /// During [`Association::create`] the hook runs before the association
    /// is numbered: `asn.sequence()` is 0 and names built from the sequence
    /// are not final yet. Record per-association metadata here, not names.
    fn init_hook(&self, asn: &mut Association, item: &Item) {
        let _ = (asn, item);
    }
}

/// Items are members when equal, attributes and pool row alike.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemEquality;

impl RuleHooks for ItemEquality {
    fn is_item_member(&self, members: &[Item], item: &Item) -> bool {
        members.contains(item)
    }
}

/// Items are members when they agree on a set of identifying attributes.
///
/// # Example
///
/// ```
/// use asnforge_core::Item;
/// use asnforge_engine::{KeyedMembers, RuleHooks};
///
/// let hooks = KeyedMembers::new(["expname"]);
/// let members = vec![Item::new().with("expname", "jw01_cal").with("filter", "F200W")];
///
/// assert!(hooks.is_item_member(&members, &Item::new().with("expname", "jw01_cal")));
/// assert!(!hooks.is_item_member(&members, &Item::new().with("expname", "jw02_cal")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyedMembers {
    keys: Vec<String>,
}

impl KeyedMembers {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl RuleHooks for KeyedMembers {
    fn is_item_member(&self, members: &[Item], item: &Item) -> bool {
        members.iter().any(|member| {
            self.keys
                .iter()
                .all(|key| member.get(key) == item.get(key))
        })
    }
}
