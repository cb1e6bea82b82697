//! Shared test fixtures for asnforge crates.
//!
//! This crate provides pool items and call-counting helpers for testing.
//! It depends only on `asnforge-core` to avoid circular dependencies.
//!
//! - [`items`] - exposure items and small pools
//! - [`spy`] - call counters for checking evaluation totality
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! asnforge-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use asnforge_test::items::{exposure, nircam_miri_pool};
//! use asnforge_test::spy::CallCounter;
//! ```

pub mod items;
pub mod spy;

pub use items::{exposure, nircam_miri_pool, pool};
pub use spy::CallCounter;
