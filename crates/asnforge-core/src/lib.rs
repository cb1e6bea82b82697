//! asnforge Core - Core types for association generation
//!
//! This crate provides the fundamental abstractions shared by every other
//! asnforge crate:
//! - [`Item`] and [`ItemValue`]: one pool row's attributes
//! - [`InvalidValues`]: sentinel strings that mean "attribute missing"
//! - [`WorkOver`] and [`ProcessList`]: deferred reprocessing requests
//! - [`SequenceCounter`]: per-rule association numbering
//! - [`AsnError`]: the error taxonomy for rule construction and lookup

pub mod error;
pub mod evaluate;
pub mod invalid;
pub mod item;
pub mod process_list;
pub mod sequence;

#[cfg(test)]
mod item_tests;

pub use error::{AsnError, Result};
pub use evaluate::{evaluate, Evaluated};
pub use invalid::InvalidValues;
pub use item::{Item, ItemValue};
pub use process_list::{ProcessList, WorkOver};
pub use sequence::SequenceCounter;
