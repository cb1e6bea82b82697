//! asnforge Engine - Rules, associations and the driving loop
//!
//! This crate turns constraint trees into association generation:
//! - [`Rule`]: a prototype pairing a constraint tree with member hooks,
//!   naming and validity strategies
//! - [`Association`]: a collection of items matched by one rule
//! - [`Registry`]: the explicit set of rules items are offered to
//! - [`generate`]: the worklist loop grouping a whole pool
//!
//! # Example
//!
//! ```
//! use asnforge_constraint::{AttrConstraint, ConstraintTree};
//! use asnforge_core::Item;
//! use asnforge_engine::{generate, ExitStatus, GenerateOptions, Registry, Rule};
//!
//! let registry = Registry::builder()
//!     .register(Rule::new(
//!         "Asn_Image",
//!         ConstraintTree::all(vec![AttrConstraint::new(["filter"]).named("opt_elem").into()]),
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let pool = vec![Item::new().with("filter", "F200W")];
//! let result = generate(&pool, &registry, &GenerateOptions::default()).unwrap();
//!
//! assert_eq!(result.exit_status(), ExitStatus::Success);
//! assert_eq!(result.associations[0].name().unwrap(), "Asn_Image_001");
//! ```

pub mod association;
pub mod builder;
pub mod generate;
pub mod members;
pub mod naming;
pub mod registry;
pub mod rule;
pub mod stats;
pub mod validity;

#[cfg(test)]
mod association_tests;
#[cfg(test)]
mod generate_tests;

pub use association::{AsnData, AsnState, Association, CODE_VERSION};
pub use builder::{build_rule, version_id, TIMESTAMP_FORMAT};
pub use generate::{generate, ExitStatus, GenerateOptions, GenerateResult};
pub use members::{ItemEquality, KeyedMembers, RuleHooks};
pub use naming::{NamingStrategy, TemplateNaming};
pub use registry::{FinalizeFn, MatchResult, Registry, RegistryBuilder};
pub use rule::Rule;
pub use stats::GenerateStats;
pub use validity::ValidityCheck;
