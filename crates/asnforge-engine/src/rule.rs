//! Rule prototypes.

use std::fmt;
use std::sync::Arc;

use asnforge_constraint::{Constraint, ConstraintTree};
use asnforge_core::{AsnError, Item, ProcessList, Result, SequenceCounter, WorkOver};

use crate::association::Association;
use crate::members::{ItemEquality, RuleHooks};
use crate::naming::{NamingStrategy, TemplateNaming};
use crate::validity::ValidityCheck;

/// An association rule: the prototype every association of one type is
/// created from.
///
/// A rule couples a constraint tree template with the strategies its
/// associations use: member hooks, naming and validity checks.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use asnforge_constraint::{AttrConstraint, ConstraintTree};
/// use asnforge_core::{Item, SequenceCounter, WorkOver};
/// use asnforge_engine::Rule;
///
/// let rule = Arc::new(Rule::new(
///     "Asn_Image",
///     ConstraintTree::all(vec![
///         AttrConstraint::new(["instrument"]).pattern("nircam").into(),
///         AttrConstraint::new(["filter"]).named("opt_elem").into(),
///     ]),
/// ));
///
/// let counter = SequenceCounter::new();
/// let item = Item::new().with("instrument", "NIRCAM").with("filter", "F200W");
/// let (asn, reprocess) = rule.create(&item, WorkOver::Rules, &counter, None).unwrap();
///
/// assert!(reprocess.is_empty());
/// assert_eq!(asn.unwrap().members().len(), 1);
/// ```
#[derive(Clone)]
pub struct Rule {
    name: String,
    asn_type: String,
    constraints: ConstraintTree,
    hooks: Arc<dyn RuleHooks>,
    naming: Arc<dyn NamingStrategy>,
    validity: Vec<ValidityCheck>,
}

impl Rule {
    /// Creates a rule whose associations are typed after the rule name,
    /// compare members by equality and use the default naming.
    pub fn new(name: impl Into<String>, constraints: ConstraintTree) -> Self {
        let name = name.into();
        Self {
            asn_type: name.clone(),
            name,
            constraints,
            hooks: Arc::new(ItemEquality),
            naming: Arc::new(TemplateNaming::default()),
            validity: Vec::new(),
        }
    }

    /// Sets the association type.
    pub fn with_asn_type(mut self, asn_type: impl Into<String>) -> Self {
        self.asn_type = asn_type.into();
        self
    }

    /// Sets the member hooks.
    pub fn with_hooks(mut self, hooks: impl RuleHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Sets the naming strategy.
    pub fn with_naming(mut self, naming: impl NamingStrategy + 'static) -> Self {
        self.naming = Arc::new(naming);
        self
    }

    /// Adds a validity check.
    pub fn with_validity(mut self, check: ValidityCheck) -> Self {
        self.validity.push(check);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn asn_type(&self) -> &str {
        &self.asn_type
    }

    /// The constraint template associations start from.
    pub fn constraints(&self) -> &ConstraintTree {
        &self.constraints
    }

    pub fn hooks(&self) -> &Arc<dyn RuleHooks> {
        &self.hooks
    }

    pub fn naming(&self) -> &Arc<dyn NamingStrategy> {
        &self.naming
    }

    pub fn validity(&self) -> &[ValidityCheck] {
        &self.validity
    }

    /// Prefixes the rule name, keeping the association type.
    pub(crate) fn prefixed(mut self, prefix: &str) -> Self {
        self.name = format!("{}_{}", prefix, self.name);
        self
    }

    /// Requires `global` on top of the rule's own constraints.
    pub(crate) fn with_global(mut self, global: &Constraint) -> Self {
        self.constraints = ConstraintTree::all(vec![self.constraints.into(), global.clone()]);
        self
    }

    /// Checks the constraint tree and that every constraint the naming
    /// strategy reads exists.
    pub fn validate(&self) -> Result<()> {
        self.constraints.validate(&self.name)?;
        for name in self.naming.referenced_constraints() {
            if self.constraints.find(name).is_none() {
                return Err(AsnError::malformed(
                    &self.name,
                    format!("name template refers to unknown constraint '{}'", name),
                ));
            }
        }
        Ok(())
    }

    /// Attempts to start a new association from `item`.
    ///
    /// On a match, the association takes the next sequence number from
    /// `counter`. On failure nothing is created and the counter is untouched.
    pub fn create(
        self: &Arc<Self>,
        item: &Item,
        work_over: WorkOver,
        counter: &SequenceCounter,
        version_id: Option<&str>,
    ) -> Result<(Option<Association>, Vec<ProcessList>)> {
        Association::create(self, item, work_over, counter, version_id)
    }

    /// Returns true if `asn` is of this rule's type and satisfies every
    /// validity check.
    pub fn validates(&self, asn: &Association) -> bool {
        asn.asn_type() == self.asn_type
            && self
                .validity
                .iter()
                .all(|check| asn.members().iter().any(|m| check.is_satisfied_by(m)))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("asn_type", &self.asn_type)
            .field("constraints", &self.constraints)
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}
