//! The rule registry.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use asnforge_constraint::{Constraint, SimpleConstraint};
use asnforge_core::{AsnError, Item, ProcessList, Result, SequenceCounter, WorkOver};
use tracing::{info, trace};

use crate::association::Association;
use crate::rule::Rule;

/// Post-processing applied to the associations of a run.
pub type FinalizeFn = Arc<dyn Fn(Vec<Association>) -> Vec<Association> + Send + Sync>;

/// Builds a [`Registry`].
///
/// # Example
///
/// ```
/// use asnforge_constraint::{AttrConstraint, ConstraintTree};
/// use asnforge_engine::{Registry, Rule};
///
/// let registry = Registry::builder()
///     .register(Rule::new(
///         "Asn_Image",
///         ConstraintTree::all(vec![AttrConstraint::new(["filter"]).into()]),
///     ))
///     .build()
///     .unwrap();
///
/// assert_eq!(registry.rule_names(), vec!["Asn_Image"]);
/// assert!(Registry::builder().build().is_err());
/// ```
pub struct RegistryBuilder {
    prefix: Option<String>,
    rules: Vec<Rule>,
    global: Constraint,
    finalizers: Vec<FinalizeFn>,
    version_id: Option<String>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            prefix: None,
            rules: Vec::new(),
            global: SimpleConstraint::always().into(),
            finalizers: Vec::new(),
            version_id: None,
        }
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes every rule name with `prefix` and an underscore.
    pub fn named(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Adds a rule. Rules are tried in registration order.
    pub fn register(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Sets a constraint every rule must satisfy in addition to its own.
    pub fn global_constraint(mut self, constraint: impl Into<Constraint>) -> Self {
        self.global = constraint.into();
        self
    }

    /// Adds a finalize callback. Callbacks run in the order added.
    pub fn on_finalize<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Association>) -> Vec<Association> + Send + Sync + 'static,
    {
        self.finalizers.push(Arc::new(f));
        self
    }

    /// Sets the version id given to every association.
    pub fn version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    /// Validates every rule and builds the registry.
    ///
    /// # Errors
    ///
    /// - [`AsnError::NoRules`] if no rule was registered
    /// - [`AsnError::MalformedRule`] for an invalid rule or a duplicate name
    pub fn build(self) -> Result<Registry> {
        if self.rules.is_empty() {
            return Err(AsnError::NoRules);
        }

        let mut names = HashSet::new();
        let mut rules = Vec::with_capacity(self.rules.len());
        for rule in self.rules {
            let rule = match &self.prefix {
                Some(prefix) => rule.prefixed(prefix),
                None => rule,
            };
            let rule = rule.with_global(&self.global);
            rule.validate()?;
            if !names.insert(rule.name().to_string()) {
                return Err(AsnError::malformed(rule.name(), "rule is registered twice"));
            }
            rules.push(Arc::new(rule));
        }

        info!(
            event = "registry_built",
            rule_count = rules.len(),
            finalizers = self.finalizers.len(),
        );

        Ok(Registry {
            rules,
            counter: SequenceCounter::new(),
            finalizers: self.finalizers,
            version_id: self.version_id,
        })
    }
}

/// Outcome of offering one item to the registry.
pub type MatchResult = (Vec<Association>, Vec<ProcessList>);

/// The set of rule prototypes new associations are created from.
///
/// Each registry owns its sequence counter, so association numbering is
/// independent between registries.
pub struct Registry {
    rules: Vec<Arc<Rule>>,
    counter: SequenceCounter,
    finalizers: Vec<FinalizeFn>,
    version_id: Option<String>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Rules in registration order.
    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    /// Looks up a rule by name.
    pub fn rule(&self, name: &str) -> Option<&Arc<Rule>> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    /// The counter association sequence numbers are drawn from.
    pub fn sequence(&self) -> &SequenceCounter {
        &self.counter
    }

    /// Offers `item` to every candidate rule, creating an association for
    /// each rule it matches.
    ///
    /// Candidates are the rules named in `allow` (all rules if `None`) minus
    /// those named in `ignore`. Rules outside that set are never tried.
    pub fn match_item(
        &self,
        item: &Item,
        allow: Option<&[String]>,
        ignore: Option<&[String]>,
    ) -> Result<MatchResult> {
        let mut associations = Vec::new();
        let mut reprocess = Vec::new();

        for rule in &self.rules {
            let name = rule.name();
            let allowed = allow.map_or(true, |allow| allow.iter().any(|a| a == name));
            let ignored = ignore.is_some_and(|ignore| ignore.iter().any(|i| i == name));
            if !allowed || ignored {
                trace!(rule = name, allowed, ignored, "rule skipped");
                continue;
            }

            let (asn, rule_reprocess) = rule.create(
                item,
                WorkOver::Rules,
                &self.counter,
                self.version_id.as_deref(),
            )?;
            reprocess.extend(rule_reprocess);
            associations.extend(asn);
        }

        Ok((associations, reprocess))
    }

    /// Names of the rules `asn` is valid under.
    pub fn validate(&self, asn: &Association) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.validates(asn))
            .map(|rule| rule.name())
            .collect()
    }

    /// Runs the finalize callbacks over a run's associations.
    pub fn finalize(&self, associations: Vec<Association>) -> Vec<Association> {
        self.finalizers
            .iter()
            .fold(associations, |associations, finalize| finalize(associations))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("rules", &self.rule_names())
            .field("finalizers", &self.finalizers.len())
            .field("version_id", &self.version_id)
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
