//! Utility modules for credmatch
//!
//! This module contains error types, progress indicators, and other utilities.

pub mod error;
pub mod progress;

pub use error::{ComparisonError, ConfigError, ProbeError, VerifyError};
