//! Integration test suite for modep
//!
//! End-to-end tests of the dependency analysis: the library driven through
//! real artifacts on disk, and the `modep` binary driven through a shell
//! script standing in for the dependency-extraction tool.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolution**: resolver and graphs over a temporary directory
//! - **cli**: `modep order`, `modep deps` and `modep clean` (Unix only)

#[cfg(unix)]
#[path = "../common/mod.rs"]
mod common;

#[cfg(unix)]
mod cli;
mod resolution;
