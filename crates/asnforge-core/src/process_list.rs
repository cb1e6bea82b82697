//! Deferred reprocessing requests.
//!
//! Constraints that cannot decide on an item right away, for example because
//! an attribute holds several candidate values, hand back a [`ProcessList`]:
//! a batch of items to offer again, restricted to a [`WorkOver`] scope and
//! optionally to a subset of rules.

use crate::item::Item;

/// What a reprocessing pass should work on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WorkOver {
    /// Existing associations and rule prototypes.
    #[default]
    Both,
    /// Only associations that already exist.
    Existing,
    /// Only rule prototypes, creating new associations.
    Rules,
}

impl WorkOver {
    /// Returns true if something configured with `self` may run when
    /// invoked with `requested`.
    ///
    /// `Both` on either side always admits.
    ///
    /// # Example
    ///
    /// ```
    /// use asnforge_core::WorkOver;
    ///
    /// assert!(WorkOver::Both.admits(WorkOver::Rules));
    /// assert!(WorkOver::Rules.admits(WorkOver::Both));
    /// assert!(!WorkOver::Existing.admits(WorkOver::Rules));
    /// ```
    pub fn admits(self, requested: WorkOver) -> bool {
        self == WorkOver::Both || requested == WorkOver::Both || self == requested
    }

    /// Returns true if this scope includes existing associations.
    pub fn includes_existing(self) -> bool {
        matches!(self, WorkOver::Both | WorkOver::Existing)
    }

    /// Returns true if this scope includes rule prototypes.
    pub fn includes_rules(self) -> bool {
        matches!(self, WorkOver::Both | WorkOver::Rules)
    }

    /// Lower-case name used in logs and configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkOver::Both => "both",
            WorkOver::Existing => "existing",
            WorkOver::Rules => "rules",
        }
    }
}

/// A batch of items to process (again).
///
/// # Example
///
/// ```
/// use asnforge_core::{Item, ProcessList, WorkOver};
///
/// let list = ProcessList::new(vec![Item::new().with("a", "1")])
///     .with_work_over(WorkOver::Existing)
///     .with_rules(["Asn_Image"]);
///
/// assert!(list.allows_rule("Asn_Image"));
/// assert!(!list.allows_rule("Asn_WFSCMB"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessList {
    /// Items to process.
    pub items: Vec<Item>,
    /// Scope to process the items over.
    pub work_over: WorkOver,
    /// Rules to restrict processing to. `None` means every rule.
    pub rules: Option<Vec<String>>,
    /// Only keep this request if the enclosing constraint matched as a whole.
    pub only_on_match: bool,
}

impl ProcessList {
    /// Creates a list over both scopes and all rules.
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            work_over: WorkOver::Both,
            rules: None,
            only_on_match: false,
        }
    }

    /// Sets the work-over scope.
    pub fn with_work_over(mut self, work_over: WorkOver) -> Self {
        self.work_over = work_over;
        self
    }

    /// Restricts processing to the named rules.
    pub fn with_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules = Some(rules.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the only-on-match flag.
    pub fn with_only_on_match(mut self, only_on_match: bool) -> Self {
        self.only_on_match = only_on_match;
        self
    }

    /// Returns true if the named rule may process these items.
    pub fn allows_rule(&self, rule: &str) -> bool {
        match &self.rules {
            Some(rules) => rules.iter().any(|r| r == rule),
            None => true,
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there is nothing to process.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_matrix() {
        use WorkOver::*;
        assert!(Existing.admits(Existing));
        assert!(Existing.admits(Both));
        assert!(!Existing.admits(Rules));
        assert!(Rules.admits(Rules));
        assert!(!Rules.admits(Existing));
        assert!(Both.admits(Existing));
    }

    #[test]
    fn test_scope_includes() {
        assert!(WorkOver::Both.includes_existing());
        assert!(WorkOver::Both.includes_rules());
        assert!(!WorkOver::Rules.includes_existing());
        assert!(!WorkOver::Existing.includes_rules());
    }

    #[test]
    fn test_defaults() {
        let list = ProcessList::new(Vec::new());
        assert!(list.is_empty());
        assert_eq!(list.work_over, WorkOver::Both);
        assert!(list.allows_rule("anything"));
        assert!(!list.only_on_match);
    }
}
