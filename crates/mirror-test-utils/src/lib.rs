//! Shared test utilities for the tree-mirror workspace.
//!
//! This crate provides directory-tree fixtures so crate test suites do not
//! each reinvent them. It is a dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`tree`]: [`TestTree`], a temporary directory with file helpers
//! - [`perms`]: helpers for permission-based failure tests

pub mod perms;
pub mod tree;

pub use tree::TestTree;
