//! Core types shared by every layer of modep.
//!
//! Currently this is the error system: [`ModepError`] for typed failures,
//! [`ErrorContext`] for terminal display, and [`user_friendly_error`] to turn
//! an arbitrary [`anyhow::Error`] into something worth showing a user.

pub mod error;

pub use error::{ErrorContext, ModepError, user_friendly_error};

/// Result type used throughout the library layers.
pub type Result<T, E = ModepError> = std::result::Result<T, E>;
