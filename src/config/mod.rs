//! Configuration module for credmatch
//!
//! Handles loading settings from TOML files.

pub mod settings;

pub use settings::{
    require_local_file, ProbeSettings, Settings, VerifyOverrides, VerifyPlan, VerifySettings,
};

use crate::utils::ConfigError;
use std::path::Path;

/// Load settings from `path`, or from the default location when no path is
/// given. An explicitly named file must exist.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    match path {
        Some(p) => Settings::load_from_file(p),
        None => Settings::load_default(),
    }
}
