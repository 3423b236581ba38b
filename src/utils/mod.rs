//! Shared helpers.
//!
//! - [`fs`] - atomic artifact writes, line reads and artifact cleanup

pub mod fs;

pub use fs::{atomic_write, read_lines, remove_artifacts};
