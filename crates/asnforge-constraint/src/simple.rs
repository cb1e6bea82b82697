//! Constraints over values computed from the whole item.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use asnforge_core::{Item, ProcessList, WorkOver};

use crate::constraint::CheckResult;

/// Computes the value a [`SimpleConstraint`] tests.
pub type ValueFn = Arc<dyn Fn(&Item) -> String + Send + Sync>;

/// Compares the constraint value (first) with the computed value (second).
pub type TestFn = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// A constraint on a value derived from the item.
///
/// By default the value is the item's canonical rendering and the test is
/// exact string equality. With no `value`, any item matches; with
/// `force_unique` (the default) the first match locks the value.
///
/// # Example
///
/// ```
/// use asnforge_constraint::SimpleConstraint;
/// use asnforge_core::Item;
///
/// let program = SimpleConstraint::new()
///     .named("program")
///     .source(|item: &Item| item.text("program").unwrap_or_default().to_string());
///
/// let item = Item::new().with("program", "01234");
/// let locked = program.check_and_set(&item).matched.unwrap();
/// assert_eq!(locked.value(), Some("01234"));
///
/// let other = Item::new().with("program", "99999");
/// assert!(!locked.check_and_set(&other).is_match());
/// ```
#[derive(Clone)]
pub struct SimpleConstraint {
    name: Option<String>,
    value: Option<String>,
    source: Option<ValueFn>,
    test: Option<TestFn>,
    force_unique: bool,
    force_reprocess: Option<WorkOver>,
    found_values: BTreeSet<String>,
}

impl Default for SimpleConstraint {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleConstraint {
    /// Creates a force-unique constraint with no value.
    pub fn new() -> Self {
        Self {
            name: None,
            value: None,
            source: None,
            test: None,
            force_unique: true,
            force_reprocess: None,
            found_values: BTreeSet::new(),
        }
    }

    /// A constraint every item satisfies, which never locks.
    pub fn always() -> Self {
        Self::new().force_unique(false)
    }

    /// Sets the constraint name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the value that must be matched.
    pub fn value_eq(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets how the tested value is computed from an item.
    pub fn source<F>(mut self, f: F) -> Self
    where
        F: Fn(&Item) -> String + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(f));
        self
    }

    /// Sets the comparison between the constraint value and the computed value.
    pub fn test<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.test = Some(Arc::new(f));
        self
    }

    /// Sets whether the first matched value locks the constraint.
    pub fn force_unique(mut self, force_unique: bool) -> Self {
        self.force_unique = force_unique;
        self
    }

    /// Puts every checked item back on the reprocess list over `work_over`.
    pub fn force_reprocess(mut self, work_over: WorkOver) -> Self {
        self.force_reprocess = Some(work_over);
        self
    }

    /// The constraint name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The value that must be matched, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Values matched so far.
    pub fn found_values(&self) -> &BTreeSet<String> {
        &self.found_values
    }

    /// Checks `item` and returns the narrowed copy on success.
    pub fn check_and_set(&self, item: &Item) -> CheckResult<SimpleConstraint> {
        let source_value = match &self.source {
            Some(source) => source(item),
            None => item.to_string(),
        };

        let satisfied = match &self.value {
            Some(value) => match &self.test {
                Some(test) => test(value, &source_value),
                None => *value == source_value,
            },
            None => true,
        };

        let mut reprocess = Vec::new();
        if let Some(work_over) = self.force_reprocess {
            reprocess.push(ProcessList::new(vec![item.clone()]).with_work_over(work_over));
        }

        if !satisfied {
            return CheckResult::failed(reprocess);
        }

        let mut narrowed = self.clone();
        if narrowed.force_unique {
            narrowed.found_values.insert(source_value.clone());
            narrowed.value = Some(source_value);
        }
        CheckResult::matched(narrowed, reprocess)
    }
}

impl fmt::Debug for SimpleConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleConstraint")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("force_unique", &self.force_unique)
            .finish_non_exhaustive()
    }
}
