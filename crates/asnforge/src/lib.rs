//! asnforge - Rule-driven association generation in Rust
//!
//! Groups a pool of items into associations, each produced by a rule
//! whose constraint tree decides which items belong together.
//!
//! # Example
//!
//! ```rust
//! use asnforge::prelude::*;
//!
//! let rule = Rule::new(
//!     "Asn_Image",
//!     ConstraintTree::all(vec![
//!         AttrConstraint::new(["instrument"]).pattern("nircam").into(),
//!         AttrConstraint::new(["filter"]).named("opt_elem").into(),
//!     ]),
//! );
//! let registry = Registry::builder().register(rule).build().unwrap();
//!
//! let pool = vec![
//!     Item::new().with("instrument", "NIRCAM").with("filter", "F200W"),
//!     Item::new().with("instrument", "NIRCAM").with("filter", "F444W"),
//! ];
//! let result = generate(&pool, &registry, &GenerateOptions::new()).unwrap();
//! assert_eq!(result.associations.len(), 2);
//! assert!(result.orphans.is_empty());
//! ```

// Items, process lists and errors
pub use asnforge_core::{
    AsnError, Evaluated, InvalidValues, Item, ItemValue, ProcessList, Result, SequenceCounter,
    WorkOver,
};

// Constraints
pub use asnforge_constraint::{
    AttrConstraint, CheckResult, Constraint, ConstraintTree, Pattern, Reduce, SimpleConstraint,
};

// Rules, registry and the generation loop
pub use asnforge_engine::{
    generate, AsnData, AsnState, Association, ExitStatus, GenerateOptions, GenerateResult,
    GenerateStats, ItemEquality, KeyedMembers, NamingStrategy, Registry, RegistryBuilder, Rule,
    RuleHooks, TemplateNaming, ValidityCheck,
};

// Configuration
pub use asnforge_config::{ConfigError, EngineConfig};

#[cfg(feature = "console")]
pub use asnforge_console as console;

mod runner;
pub use runner::{run, run_from_file};

pub mod prelude {
    pub use super::{
        AttrConstraint, Constraint, ConstraintTree, Reduce, SimpleConstraint,
    };
    pub use super::{generate, Association, GenerateOptions, GenerateResult, Registry, Rule};
    pub use super::{AsnError, Item, ProcessList, WorkOver};
    pub use super::{run, EngineConfig};
}
