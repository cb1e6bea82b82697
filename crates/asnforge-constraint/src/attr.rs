//! Constraints over named item attributes.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use asnforge_core::{evaluate, AsnError, Evaluated, InvalidValues, Item, ProcessList, Result, WorkOver};
use tracing::trace;

use crate::constraint::CheckResult;
use crate::pattern::Pattern;

/// Decides whether a constraint applies to an item at all.
pub type ItemPredicate = Arc<dyn Fn(&Item) -> bool + Send + Sync>;

/// Tests one attribute of an item against a pattern.
///
/// The attribute is the first of `sources` present in the item and not one
/// of the `invalid_values`. With no pattern, any value matches and becomes
/// the locked value: later checks of the narrowed copy only accept that same
/// value.
///
/// # Example
///
/// ```
/// use asnforge_constraint::AttrConstraint;
/// use asnforge_core::Item;
///
/// let filter = AttrConstraint::new(["filter"]).named("opt_elem");
///
/// let first = Item::new().with("filter", "F200W");
/// let locked = filter.check_and_set(&first).matched.unwrap();
/// assert_eq!(locked.value().as_deref(), Some("F200W"));
///
/// let other = Item::new().with("filter", "F444W");
/// assert!(!locked.check_and_set(&other).is_match());
/// assert!(locked.check_and_set(&first).is_match());
/// ```
#[derive(Clone)]
pub struct AttrConstraint {
    name: Option<String>,
    sources: Vec<String>,
    pattern: Option<Pattern>,
    invalid_values: InvalidValues,
    required: bool,
    evaluate: bool,
    force_unique: bool,
    force_undefined: bool,
    force_reprocess: Option<WorkOver>,
    only_on_match: bool,
    onlyif: Option<ItemPredicate>,
    found_values: BTreeSet<String>,
}

impl AttrConstraint {
    /// Creates a required, force-unique constraint over `sources`.
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            sources: sources.into_iter().map(Into::into).collect(),
            pattern: None,
            invalid_values: InvalidValues::new(),
            required: true,
            evaluate: false,
            force_unique: true,
            force_undefined: false,
            force_reprocess: None,
            only_on_match: false,
            onlyif: None,
            found_values: BTreeSet::new(),
        }
    }

    /// Sets the constraint name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the value pattern (a regular expression).
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(Pattern::new(pattern));
        self
    }

    /// Sets a pattern computed at check time.
    pub fn dynamic_pattern<F>(mut self, f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.pattern = Some(Pattern::dynamic(f));
        self
    }

    /// Sets the markers treated as missing values.
    pub fn invalid_values(mut self, invalid_values: InvalidValues) -> Self {
        self.invalid_values = invalid_values;
        self
    }

    /// Sets whether a missing attribute fails the constraint.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets whether list values are expanded into reprocess items.
    ///
    /// Each derived item carries one element, marked as expanded so it is
    /// never split again.
    pub fn evaluate(mut self, evaluate: bool) -> Self {
        self.evaluate = evaluate;
        self
    }

    /// Sets whether the first matched value locks the constraint.
    pub fn force_unique(mut self, force_unique: bool) -> Self {
        self.force_unique = force_unique;
        self
    }

    /// Sets whether the attribute must be absent.
    pub fn force_undefined(mut self, force_undefined: bool) -> Self {
        self.force_undefined = force_undefined;
        self
    }

    /// Requeues skipped items (see [`AttrConstraint::onlyif`]) over `work_over`.
    pub fn force_reprocess(mut self, work_over: WorkOver) -> Self {
        self.force_reprocess = Some(work_over);
        self
    }

    /// Keeps forced reprocessing only if the whole rule matched.
    pub fn only_on_match(mut self, only_on_match: bool) -> Self {
        self.only_on_match = only_on_match;
        self
    }

    /// Only check items for which `f` is true; other items pass untouched.
    pub fn onlyif<F>(mut self, f: F) -> Self
    where
        F: Fn(&Item) -> bool + Send + Sync + 'static,
    {
        self.onlyif = Some(Arc::new(f));
        self
    }

    /// The constraint name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The candidate attribute names.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// The current pattern.
    pub fn current_pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// The locked value if bound, otherwise the pattern text.
    pub fn value(&self) -> Option<String> {
        self.pattern.as_ref().map(|pattern| match pattern.locked_value() {
            Some(value) => value.to_string(),
            None => pattern.source(),
        })
    }

    /// Escaped values matched so far.
    pub fn found_values(&self) -> &BTreeSet<String> {
        &self.found_values
    }

    /// Returns true once a value has been locked in.
    pub fn is_locked(&self) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|p| p.locked_value().is_some())
    }

    /// Checks `item` and returns the narrowed copy on success.
    pub fn check_and_set(&self, item: &Item) -> CheckResult<AttrConstraint> {
        let mut reprocess = Vec::new();

        if let Some(onlyif) = &self.onlyif {
            if !onlyif(item) {
                if let Some(work_over) = self.force_reprocess {
                    reprocess.push(
                        ProcessList::new(vec![item.clone()])
                            .with_work_over(work_over)
                            .with_only_on_match(self.only_on_match),
                    );
                }
                return CheckResult::matched(self.clone(), reprocess);
            }
        }

        let Some((source, value)) = item.first_valid(&self.sources, &self.invalid_values) else {
            if self.required && !self.force_undefined {
                trace!(constraint = ?self.name, "required attribute missing");
                return CheckResult::failed(reprocess);
            }
            return CheckResult::matched(self.clone(), reprocess);
        };

        if self.force_undefined {
            return CheckResult::failed(reprocess);
        }

        let value = if self.evaluate && !item.is_expanded(source) {
            match evaluate(value) {
                Evaluated::Multiple(values) => {
                    trace!(
                        constraint = ?self.name,
                        source,
                        count = values.len(),
                        "expanding multi-valued attribute"
                    );
                    let items = values
                        .into_iter()
                        .map(|single| item.with_expanded_value(source, single))
                        .collect();
                    reprocess.push(ProcessList::new(items));
                    return CheckResult::failed(reprocess);
                }
                Evaluated::Single(single) => single,
            }
        } else {
            value.to_string()
        };

        if let Some(pattern) = &self.pattern {
            if !pattern.matches(&value) {
                return CheckResult::failed(reprocess);
            }
        }

        let mut narrowed = self.clone();
        narrowed.found_values.insert(regex::escape(&value));
        if narrowed.pattern.is_none() || narrowed.force_unique {
            narrowed.pattern = Some(Pattern::literal(value));
            narrowed.sources = vec![source.to_string()];
            narrowed.force_unique = false;
        }

        CheckResult::matched(narrowed, reprocess)
    }

    /// Checks that the constraint is well formed.
    pub fn validate(&self, rule: &str) -> Result<()> {
        if self.sources.is_empty() {
            return Err(AsnError::malformed(
                rule,
                format!("constraint {:?} has no sources", self.name),
            ));
        }
        if let Some(error) = self.pattern.as_ref().and_then(Pattern::error) {
            return Err(AsnError::malformed(
                rule,
                format!("constraint {:?} has an invalid pattern: {}", self.name, error),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for AttrConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrConstraint")
            .field("name", &self.name)
            .field("sources", &self.sources)
            .field("pattern", &self.pattern)
            .field("required", &self.required)
            .field("evaluate", &self.evaluate)
            .field("force_unique", &self.force_unique)
            .field("found_values", &self.found_values)
            .finish_non_exhaustive()
    }
}
