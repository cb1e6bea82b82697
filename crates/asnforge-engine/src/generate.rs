//! The driving loop.
//!
//! [`generate`] feeds a pool through a registry. Items are first offered to
//! the associations created so far, then to the rule prototypes. Reprocess
//! requests go to the back of the worklist, so expansion proceeds breadth
//! first and the order items are seen in is the pool order.

use std::collections::{HashSet, VecDeque};

use asnforge_config::EngineConfig;
use asnforge_core::{AsnError, Item, ProcessList, Result, WorkOver};
use tracing::{debug, info, warn};

use crate::association::Association;
use crate::registry::Registry;
use crate::stats::GenerateStats;

/// Settings for a [`generate`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Scope the pool items are first offered over.
    pub seed_scope: WorkOver,
    /// Maximum number of process lists to handle before giving up.
    pub worklist_limit: Option<usize>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed_scope: WorkOver::Both,
            worklist_limit: None,
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the seed scope and worklist limit from an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            seed_scope: config.seed_scope.into(),
            worklist_limit: config.worklist_limit,
        }
    }

    pub fn with_seed_scope(mut self, scope: WorkOver) -> Self {
        self.seed_scope = scope;
        self
    }

    pub fn with_worklist_limit(mut self, limit: usize) -> Self {
        self.worklist_limit = Some(limit);
        self
    }
}

/// How a run ended, for drivers that report through process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    /// Every pool row joined at least one association.
    Success,
    /// Some pool rows matched no rule.
    Unmatched,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Unmatched => 1,
        }
    }
}

/// Result of a [`generate`] run.
#[derive(Debug)]
pub struct GenerateResult {
    /// Associations after the registry's finalize callbacks.
    pub associations: Vec<Association>,
    /// Pool rows that joined no association, in pool order.
    pub orphans: Vec<Item>,
    pub stats: GenerateStats,
}

impl GenerateResult {
    pub fn exit_status(&self) -> ExitStatus {
        if self.orphans.is_empty() {
            ExitStatus::Success
        } else {
            ExitStatus::Unmatched
        }
    }
}

/// Groups `pool` into associations.
///
/// Items without an origin are tagged with their pool index.
///
/// # Errors
///
/// Returns [`AsnError::InvalidState`] if the worklist limit is exceeded, and
/// propagates errors from adding items to associations.
///
/// # Example
///
/// ```
/// use asnforge_constraint::{AttrConstraint, ConstraintTree};
/// use asnforge_core::Item;
/// use asnforge_engine::{generate, GenerateOptions, Registry, Rule};
///
/// let registry = Registry::builder()
///     .register(Rule::new(
///         "Asn_Image",
///         ConstraintTree::all(vec![
///             AttrConstraint::new(["instrument"]).pattern("nircam").into(),
///             AttrConstraint::new(["filter"]).into(),
///         ]),
///     ))
///     .build()
///     .unwrap();
///
/// let pool = vec![
///     Item::new().with("instrument", "NIRCAM").with("filter", "F200W"),
///     Item::new().with("instrument", "NIRCAM").with("filter", "F200W"),
///     Item::new().with("instrument", "MIRI").with("filter", "F770W"),
/// ];
///
/// let result = generate(&pool, &registry, &GenerateOptions::default()).unwrap();
/// assert_eq!(result.associations.len(), 1);
/// assert_eq!(result.associations[0].members().len(), 2);
/// assert_eq!(result.orphans.len(), 1);
/// ```
pub fn generate(
    pool: &[Item],
    registry: &Registry,
    options: &GenerateOptions,
) -> Result<GenerateResult> {
    let mut stats = GenerateStats::new(pool.len());
    stats.start();

    info!(
        event = "generate_start",
        item_count = pool.len(),
        rule_count = registry.len(),
        seed_scope = options.seed_scope.as_str(),
    );

    let items: Vec<Item> = pool
        .iter()
        .enumerate()
        .map(|(row, item)| match item.origin() {
            Some(_) => item.clone(),
            None => item.clone().with_origin(row),
        })
        .collect();

    let mut worklist = VecDeque::new();
    worklist.push_back(ProcessList::new(items.clone()).with_work_over(options.seed_scope));

    let mut associations: Vec<Association> = Vec::new();
    let mut matched_rows: HashSet<usize> = HashSet::new();

    while let Some(list) = worklist.pop_front() {
        if let Some(limit) = options.worklist_limit {
            if stats.process_lists >= limit as u64 {
                return Err(AsnError::InvalidState(format!(
                    "worklist limit of {} process lists exceeded",
                    limit
                )));
            }
        }
        stats.record_process_list(list.items.len());
        debug!(
            event = "process_list",
            items = list.items.len(),
            work_over = list.work_over.as_str(),
            rules = ?list.rules,
            pending = worklist.len(),
        );

        for item in &list.items {
            let mut reprocess = Vec::new();
            let mut accepted_by: Vec<String> = Vec::new();

            if list.work_over.includes_existing() {
                for asn in associations.iter_mut() {
                    if !list.allows_rule(asn.rule_name()) {
                        continue;
                    }
                    let result = asn.add_over(item, true, WorkOver::Existing)?;
                    if result.is_match() {
                        stats.record_extended();
                        accepted_by.push(asn.rule_name().to_string());
                    }
                    reprocess.extend(result.reprocess);
                }
            }

            if list.work_over.includes_rules() {
                let (created, rule_reprocess) = registry.match_item(
                    item,
                    list.rules.as_deref(),
                    Some(accepted_by.as_slice()),
                )?;
                stats.record_created(created.len());
                if !created.is_empty() {
                    accepted_by.extend(created.iter().map(|asn| asn.rule_name().to_string()));
                }
                associations.extend(created);
                reprocess.extend(rule_reprocess);
            }

            if !accepted_by.is_empty() {
                if let Some(row) = item.origin() {
                    matched_rows.insert(row);
                }
            }

            stats.record_reprocess(reprocess.len());
            worklist.extend(reprocess);
        }
    }

    let associations = registry.finalize(associations);
    let orphans: Vec<Item> = items
        .into_iter()
        .filter(|item| item.origin().is_some_and(|row| !matched_rows.contains(&row)))
        .collect();

    stats.orphans = orphans.len();
    stats.stop();

    if !orphans.is_empty() {
        warn!(
            event = "orphans",
            count = orphans.len(),
            "pool items matched no rule"
        );
    }
    info!(
        event = "generate_end",
        associations = associations.len(),
        orphans = orphans.len(),
        process_lists = stats.process_lists,
        duration_ms = stats.elapsed_ms(),
    );

    Ok(GenerateResult {
        associations,
        orphans,
        stats,
    })
}
