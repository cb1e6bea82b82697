//! The constraint variant and check results.

use std::collections::BTreeSet;

use asnforge_core::{Item, ProcessList, Result, WorkOver};

use crate::attr::AttrConstraint;
use crate::simple::SimpleConstraint;
use crate::tree::ConstraintTree;

/// Outcome of checking one item against a constraint.
///
/// - `matched: Some(c)`: the item satisfied the constraint; `c` is the
///   narrowed copy to keep.
/// - `matched: None` with empty `reprocess`: no match.
/// - `matched: None` with non-empty `reprocess`: the decision is deferred to
///   the listed items.
#[derive(Debug, Clone)]
pub struct CheckResult<C> {
    /// The narrowed constraint on success.
    pub matched: Option<C>,
    /// Items to process again.
    pub reprocess: Vec<ProcessList>,
}

impl<C> CheckResult<C> {
    /// A successful check.
    pub fn matched(constraint: C, reprocess: Vec<ProcessList>) -> Self {
        Self {
            matched: Some(constraint),
            reprocess,
        }
    }

    /// A failed check, possibly deferring to reprocessing.
    pub fn failed(reprocess: Vec<ProcessList>) -> Self {
        Self {
            matched: None,
            reprocess,
        }
    }

    /// A failed check with nothing to reprocess.
    pub fn no_match() -> Self {
        Self::failed(Vec::new())
    }

    /// Returns true if the check succeeded.
    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }

    /// Maps the matched constraint.
    pub fn map<D>(self, f: impl FnOnce(C) -> D) -> CheckResult<D> {
        CheckResult {
            matched: self.matched.map(f),
            reprocess: self.reprocess,
        }
    }
}

/// Any node of a constraint tree.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Tests named attributes of the item.
    Attr(AttrConstraint),
    /// Tests a value computed from the whole item.
    Simple(SimpleConstraint),
    /// Combines child constraints.
    Tree(ConstraintTree),
}

impl Constraint {
    /// The constraint's name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Constraint::Attr(c) => c.name(),
            Constraint::Simple(c) => c.name(),
            Constraint::Tree(c) => c.name(),
        }
    }

    /// Checks `item` and returns the narrowed constraint on success.
    ///
    /// `work_over` only matters to trees; leaves ignore it.
    pub fn check_and_set(&self, item: &Item, work_over: WorkOver) -> CheckResult<Constraint> {
        match self {
            Constraint::Attr(c) => c.check_and_set(item).map(Constraint::Attr),
            Constraint::Simple(c) => c.check_and_set(item).map(Constraint::Simple),
            Constraint::Tree(c) => c.check_and_set(item, work_over).map(Constraint::Tree),
        }
    }

    /// The current value of a leaf: the locked value if one has been bound,
    /// otherwise the configured pattern. Trees have no value.
    pub fn value(&self) -> Option<String> {
        match self {
            Constraint::Attr(c) => c.value(),
            Constraint::Simple(c) => c.value().map(str::to_string),
            Constraint::Tree(_) => None,
        }
    }

    /// Values matched so far (escaped). Trees have none.
    pub fn found_values(&self) -> Option<&BTreeSet<String>> {
        match self {
            Constraint::Attr(c) => Some(c.found_values()),
            Constraint::Simple(c) => Some(c.found_values()),
            Constraint::Tree(_) => None,
        }
    }

    /// Returns true for attribute and simple constraints.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Constraint::Tree(_))
    }

    /// Returns the tree if this is one.
    pub fn as_tree(&self) -> Option<&ConstraintTree> {
        match self {
            Constraint::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Checks that the constraint is well formed.
    pub fn validate(&self, rule: &str) -> Result<()> {
        match self {
            Constraint::Attr(c) => c.validate(rule),
            Constraint::Simple(_) => Ok(()),
            Constraint::Tree(c) => c.validate(rule),
        }
    }
}

impl From<AttrConstraint> for Constraint {
    fn from(c: AttrConstraint) -> Self {
        Constraint::Attr(c)
    }
}

impl From<SimpleConstraint> for Constraint {
    fn from(c: SimpleConstraint) -> Self {
        Constraint::Simple(c)
    }
}

impl From<ConstraintTree> for Constraint {
    fn from(c: ConstraintTree) -> Self {
        Constraint::Tree(c)
    }
}
