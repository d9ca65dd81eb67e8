//! Core types, config, and errors for Reagent.

pub mod config;
pub mod error;
pub mod types;

pub use error::{ReagentError, Result};
