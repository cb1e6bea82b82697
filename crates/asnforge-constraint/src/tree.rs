//! Composite constraints.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use asnforge_core::{AsnError, Item, ProcessList, Result, WorkOver};
use tracing::trace;

use crate::constraint::{CheckResult, Constraint};

/// How a tree combines the results of its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Reduce {
    /// Every child must match.
    #[default]
    All,
    /// At least one child must match.
    Any,
}

impl Reduce {
    /// Lower-case name used in logs and configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Reduce::All => "all",
            Reduce::Any => "any",
        }
    }
}

impl FromStr for Reduce {
    type Err = AsnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Reduce::All),
            "any" => Ok(Reduce::Any),
            other => Err(AsnError::Config(format!("unknown reduction '{}'", other))),
        }
    }
}

/// A constraint made of other constraints.
///
/// Every child is checked on every call; results are then combined per
/// [`Reduce`]:
///
/// - `All` matches only if every child matched. On failure, the first
///   non-empty reprocess list among the failing children is returned on its
///   own; lists from other children are dropped.
/// - `Any` matches if at least one child matched. Reprocess lists of all
///   children are concatenated whatever the outcome.
///
/// A tree scoped to [`WorkOver::Existing`] or [`WorkOver::Rules`] fails
/// outright when checked for the other scope.
///
/// # Example
///
/// ```
/// use asnforge_constraint::{AttrConstraint, ConstraintTree};
/// use asnforge_core::{Item, WorkOver};
///
/// let tree = ConstraintTree::all(vec![
///     AttrConstraint::new(["instrument"]).pattern("nircam").into(),
///     AttrConstraint::new(["filter"]).named("opt_elem").into(),
/// ]);
///
/// let item = Item::new().with("instrument", "NIRCAM").with("filter", "F200W");
/// let narrowed = tree.check_and_set(&item, WorkOver::Both).matched.unwrap();
///
/// assert_eq!(narrowed.get("opt_elem").unwrap().value().as_deref(), Some("F200W"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConstraintTree {
    name: Option<String>,
    reduce: Reduce,
    work_over: WorkOver,
    children: Vec<Constraint>,
}

impl ConstraintTree {
    /// Creates a tree with the given reduction.
    pub fn new(reduce: Reduce, children: Vec<Constraint>) -> Self {
        Self {
            name: None,
            reduce,
            work_over: WorkOver::Both,
            children,
        }
    }

    /// Creates a tree requiring every child.
    pub fn all(children: Vec<Constraint>) -> Self {
        Self::new(Reduce::All, children)
    }

    /// Creates a tree requiring any child.
    pub fn any(children: Vec<Constraint>) -> Self {
        Self::new(Reduce::Any, children)
    }

    /// Sets the tree name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restricts the scope this tree works over.
    pub fn with_work_over(mut self, work_over: WorkOver) -> Self {
        self.work_over = work_over;
        self
    }

    /// Appends a child.
    pub fn with(mut self, child: impl Into<Constraint>) -> Self {
        self.children.push(child.into());
        self
    }

    /// The tree name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The reduction mode.
    pub fn reduce(&self) -> Reduce {
        self.reduce
    }

    /// The configured scope.
    pub fn work_over(&self) -> WorkOver {
        self.work_over
    }

    /// Direct children.
    pub fn children(&self) -> &[Constraint] {
        &self.children
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the tree has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Checks `item` against every child and combines the results.
    pub fn check_and_set(&self, item: &Item, work_over: WorkOver) -> CheckResult<ConstraintTree> {
        if !self.work_over.admits(work_over) {
            trace!(
                tree = ?self.name,
                configured = self.work_over.as_str(),
                requested = work_over.as_str(),
                "scope not admitted"
            );
            return CheckResult::no_match();
        }

        let results: Vec<CheckResult<Constraint>> = self
            .children
            .iter()
            .map(|child| child.check_and_set(item, work_over))
            .collect();

        let result = match self.reduce {
            Reduce::All => self.reduce_all(results),
            Reduce::Any => self.reduce_any(results),
        };

        trace!(
            tree = ?self.name,
            reduce = self.reduce.as_str(),
            matched = result.is_match(),
            reprocess = result.reprocess.len(),
        );
        result
    }

    fn reduce_all(&self, results: Vec<CheckResult<Constraint>>) -> CheckResult<ConstraintTree> {
        let mut children = Vec::with_capacity(results.len());
        let mut reprocess = Vec::new();
        let mut blocking: Option<Vec<ProcessList>> = None;
        let mut all_matched = true;

        for result in results {
            match result.matched {
                Some(child) => {
                    children.push(child);
                    reprocess.extend(result.reprocess);
                }
                None => {
                    all_matched = false;
                    if blocking.is_none() && !result.reprocess.is_empty() {
                        blocking = Some(result.reprocess);
                    }
                }
            }
        }

        if all_matched {
            CheckResult::matched(self.with_children(children), reprocess)
        } else {
            CheckResult::failed(blocking.unwrap_or_default())
        }
    }

    fn reduce_any(&self, results: Vec<CheckResult<Constraint>>) -> CheckResult<ConstraintTree> {
        let mut any_matched = false;
        let mut reprocess = Vec::new();
        let children = self
            .children
            .iter()
            .zip(results)
            .map(|(child, result)| {
                reprocess.extend(result.reprocess);
                match result.matched {
                    Some(narrowed) => {
                        any_matched = true;
                        narrowed
                    }
                    None => child.clone(),
                }
            })
            .collect();

        if any_matched {
            CheckResult::matched(self.with_children(children), reprocess)
        } else {
            CheckResult::failed(reprocess)
        }
    }

    fn with_children(&self, children: Vec<Constraint>) -> ConstraintTree {
        ConstraintTree {
            name: self.name.clone(),
            reduce: self.reduce,
            work_over: self.work_over,
            children,
        }
    }

    /// Finds a named constraint, searching depth first.
    ///
    /// A named subtree is returned itself; otherwise its children are
    /// searched before moving on to the next sibling.
    pub fn find(&self, name: &str) -> Option<&Constraint> {
        self.children.iter().find_map(|child| {
            if child.name() == Some(name) {
                return Some(child);
            }
            child.as_tree().and_then(|tree| tree.find(name))
        })
    }

    /// Finds a named constraint or fails with [`AsnError::ConstraintNotFound`].
    pub fn get(&self, name: &str) -> Result<&Constraint> {
        self.find(name)
            .ok_or_else(|| AsnError::ConstraintNotFound(name.to_string()))
    }

    /// All leaves in depth-first order.
    pub fn leaves(&self) -> Vec<&Constraint> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Constraint>) {
        for child in &self.children {
            match child {
                Constraint::Tree(tree) => tree.collect_leaves(out),
                leaf => out.push(leaf),
            }
        }
    }

    /// Checks that the tree is well formed.
    ///
    /// Rejects empty trees, invalid patterns and names used more than once.
    pub fn validate(&self, rule: &str) -> Result<()> {
        let mut seen = HashSet::new();
        self.validate_into(rule, &mut seen)
    }

    fn validate_into<'a>(&'a self, rule: &str, seen: &mut HashSet<&'a str>) -> Result<()> {
        if self.children.is_empty() {
            return Err(AsnError::malformed(
                rule,
                format!("{} tree {:?} has no children", self.reduce.as_str(), self.name),
            ));
        }
        for child in &self.children {
            if let Some(name) = child.name() {
                if !seen.insert(name) {
                    return Err(AsnError::malformed(
                        rule,
                        format!("constraint name '{}' is used more than once", name),
                    ));
                }
            }
            match child {
                Constraint::Tree(tree) => tree.validate_into(rule, seen)?,
                leaf => leaf.validate(rule)?,
            }
        }
        Ok(())
    }
}

/// Lists named leaves as `name: value`, one per line.
impl fmt::Display for ConstraintTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for leaf in self.leaves() {
            let Some(name) = leaf.name() else {
                continue;
            };
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{}: {}", name, leaf.value().unwrap_or_else(|| "*".to_string()))?;
        }
        Ok(())
    }
}
