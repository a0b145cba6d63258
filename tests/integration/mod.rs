//! Integration test suite for slngen
//!
//! End-to-end tests over real source trees written to temporary
//! directories.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **generation**: library API, from configuration to written solution
//! - **failures**: cycles, duplicates and policy failures abort without output
//! - **cli**: the `slngen` binary, its output and exit status

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod failures;
mod generation;
