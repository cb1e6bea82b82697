//! Associations: growing, typed collections of matched items.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use asnforge_constraint::{CheckResult, ConstraintTree};
use asnforge_core::{AsnError, Item, ProcessList, Result, SequenceCounter, WorkOver};
use tracing::{debug, trace};

use crate::rule::Rule;

/// Version of the engine recorded in association data.
pub const CODE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lifecycle of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsnState {
    /// Constructed, no member yet.
    Empty,
    /// At least one member; the init hook has run.
    Active,
    /// Closed to further members.
    Finalized,
}

/// A collection of items matched by one rule.
///
/// The association keeps the rule's constraint tree narrowed by every item
/// it accepted: a value bound by the first member stays bound, and later
/// items must agree with it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use asnforge_constraint::{AttrConstraint, ConstraintTree};
/// use asnforge_core::{Item, SequenceCounter, WorkOver};
/// use asnforge_engine::{Association, Rule};
///
/// let rule = Arc::new(Rule::new(
///     "Asn_Image",
///     ConstraintTree::all(vec![AttrConstraint::new(["filter"]).named("opt_elem").into()]),
/// ));
/// let counter = SequenceCounter::new();
///
/// let first = Item::new().with("filter", "F200W").with_origin(0);
/// let (asn, _) = Association::create(&rule, &first, WorkOver::Rules, &counter, None).unwrap();
/// let mut asn = asn.unwrap();
///
/// let second = Item::new().with("filter", "F444W").with_origin(1);
/// assert!(!asn.add(&second, true).unwrap().is_match());
/// assert_eq!(asn.name().unwrap(), "Asn_Image_001");
/// ```
#[derive(Clone)]
pub struct Association {
    rule: Arc<Rule>,
    sequence: u32,
    version_id: Option<String>,
    constraints: ConstraintTree,
    members: Vec<Item>,
    satisfied: Vec<bool>,
    meta: BTreeMap<String, String>,
    state: AsnState,
}

impl Association {
    fn new(rule: &Arc<Rule>, version_id: Option<&str>) -> Self {
        Self {
            rule: Arc::clone(rule),
            sequence: 0,
            version_id: version_id.map(str::to_string),
            constraints: rule.constraints().clone(),
            members: Vec::new(),
            satisfied: vec![false; rule.validity().len()],
            meta: BTreeMap::new(),
            state: AsnState::Empty,
        }
    }

    /// Attempts to start an association of `rule` from `item`.
    ///
    /// Returns the association only if `item` matched the whole constraint
    /// tree. Reprocess requests are returned either way. The sequence number
    /// is drawn after the first member is in, so the rule's init hook sees an
    /// unnumbered association.
    pub fn create(
        rule: &Arc<Rule>,
        item: &Item,
        work_over: WorkOver,
        counter: &SequenceCounter,
        version_id: Option<&str>,
    ) -> Result<(Option<Self>, Vec<ProcessList>)> {
        let mut asn = Self::new(rule, version_id);
        let result = asn.add_over(item, true, work_over)?;
        if !result.is_match() {
            return Ok((None, result.reprocess));
        }

        asn.sequence = counter.next(rule.name());
        debug!(
            event = "association_created",
            rule = rule.name(),
            sequence = asn.sequence,
            reprocess = result.reprocess.len(),
        );
        Ok((Some(asn), result.reprocess))
    }

    /// Adds `item` if it satisfies the constraints, checking over both scopes.
    ///
    /// See [`Association::add_over`].
    pub fn add(&mut self, item: &Item, check_constraints: bool) -> Result<CheckResult<ConstraintTree>> {
        self.add_over(item, check_constraints, WorkOver::Both)
    }

    /// Adds `item` if it satisfies the constraints checked over `work_over`.
    ///
    /// An item that is already a member is accepted again without change.
    /// With `check_constraints` false the item is added unchecked. A failed
    /// add leaves the association untouched.
    ///
    /// Reprocess requests without a rule subset are restricted to this
    /// association's rule. Requests flagged `only_on_match` are dropped when
    /// the item does not match.
    ///
    /// # Errors
    ///
    /// Returns [`AsnError::InvalidState`] if the association is finalized.
    pub fn add_over(
        &mut self,
        item: &Item,
        check_constraints: bool,
        work_over: WorkOver,
    ) -> Result<CheckResult<ConstraintTree>> {
        if self.state == AsnState::Finalized {
            return Err(AsnError::InvalidState(format!(
                "association {} of rule '{}' is finalized",
                self.sequence,
                self.rule.name()
            )));
        }

        if self.rule.hooks().is_item_member(&self.members, item) {
            trace!(rule = self.rule.name(), item = %item, "already a member");
            return Ok(CheckResult::matched(self.constraints.clone(), Vec::new()));
        }

        let (narrowed, reprocess) = if check_constraints {
            let result = self.constraints.check_and_set(item, work_over);
            let matched = result.is_match();
            let reprocess = self.scope_reprocess(result.reprocess, matched);
            match result.matched {
                Some(narrowed) => (narrowed, reprocess),
                None => return Ok(CheckResult::failed(reprocess)),
            }
        } else {
            (self.constraints.clone(), Vec::new())
        };

        if self.state == AsnState::Empty {
            let hooks = Arc::clone(self.rule.hooks());
            hooks.init_hook(self, item);
            self.state = AsnState::Active;
        }

        for (check, satisfied) in self.rule.validity().iter().zip(self.satisfied.iter_mut()) {
            if !*satisfied && check.is_satisfied_by(item) {
                *satisfied = true;
            }
        }

        let hooks = Arc::clone(self.rule.hooks());
        hooks.add_member(&mut self.members, item.clone());
        self.constraints = narrowed;

        Ok(CheckResult::matched(self.constraints.clone(), reprocess))
    }

    fn scope_reprocess(&self, reprocess: Vec<ProcessList>, matched: bool) -> Vec<ProcessList> {
        reprocess
            .into_iter()
            .filter(|list| matched || !list.only_on_match)
            .map(|list| {
                if list.rules.is_some() {
                    list
                } else {
                    list.with_rules([self.rule.name()])
                }
            })
            .collect()
    }

    /// Returns true if `item` is already a member.
    pub fn is_item_member(&self, item: &Item) -> bool {
        self.rule.hooks().is_item_member(&self.members, item)
    }

    /// The association name, produced by the rule's naming strategy.
    pub fn name(&self) -> Result<String> {
        self.rule.naming().name(self)
    }

    /// Returns true once every validity check of the rule has been
    /// satisfied by some member.
    pub fn is_valid(&self) -> bool {
        self.satisfied.iter().all(|s| *s)
    }

    /// Each validity check with whether it has been satisfied.
    pub fn validity(&self) -> Vec<(&str, bool)> {
        self.rule
            .validity()
            .iter()
            .map(|check| check.name())
            .zip(self.satisfied.iter().copied())
            .collect()
    }

    /// Closes the association and returns its data.
    ///
    /// # Errors
    ///
    /// Fails with [`AsnError::InvalidState`] on an association without
    /// members, and propagates naming errors.
    pub fn finalize(&mut self) -> Result<AsnData> {
        if self.state == AsnState::Empty {
            return Err(AsnError::InvalidState(format!(
                "association of rule '{}' has no members",
                self.rule.name()
            )));
        }
        let data = self.data()?;
        self.state = AsnState::Finalized;
        Ok(data)
    }

    /// The ordered data mapping consumed by validators and serializers.
    pub fn data(&self) -> Result<AsnData> {
        Ok(AsnData {
            asn_type: self.rule.asn_type().to_string(),
            asn_rule: self.rule.name().to_string(),
            asn_id: self.name()?,
            version_id: self.version_id.clone(),
            code_version: CODE_VERSION.to_string(),
            meta: self.meta.clone(),
            members: self.members.clone(),
        })
    }

    /// Records a metadata entry, typically from an init hook.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), value.into());
    }

    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    pub fn rule_name(&self) -> &str {
        self.rule.name()
    }

    pub fn asn_type(&self) -> &str {
        self.rule.asn_type()
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    /// The constraint tree, narrowed by every member so far.
    pub fn constraints(&self) -> &ConstraintTree {
        &self.constraints
    }

    pub fn members(&self) -> &[Item] {
        &self.members
    }

    pub fn state(&self) -> AsnState {
        self.state
    }
}

impl fmt::Debug for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Association")
            .field("rule", &self.rule.name())
            .field("sequence", &self.sequence)
            .field("state", &self.state)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}

/// Finalized association content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AsnData {
    pub asn_type: String,
    pub asn_rule: String,
    pub asn_id: String,
    pub version_id: Option<String>,
    pub code_version: String,
    pub meta: BTreeMap<String, String>,
    pub members: Vec<Item>,
}
