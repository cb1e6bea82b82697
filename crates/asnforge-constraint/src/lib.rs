//! asnforge Constraint - Deciding whether items belong together
//!
//! Rules describe their membership criteria as a tree of constraints:
//! - [`AttrConstraint`]: tests one item attribute against a pattern
//! - [`SimpleConstraint`]: tests a value computed from the whole item
//! - [`ConstraintTree`]: combines children with [`Reduce::All`] or [`Reduce::Any`]
//!
//! Checking never mutates a constraint. A successful check returns a
//! narrowed copy in [`CheckResult::matched`]; the caller keeps that copy so
//! later items must agree with the values bound so far.

pub mod attr;
pub mod constraint;
pub mod pattern;
pub mod simple;
pub mod tree;


pub use attr::{AttrConstraint, ItemPredicate};
pub use constraint::{CheckResult, Constraint};
pub use pattern::{Pattern, PatternFn};
pub use simple::{SimpleConstraint, TestFn, ValueFn};
pub use tree::{ConstraintTree, Reduce};
