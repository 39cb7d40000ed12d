// src/config/mod.rs
//! Configuration management for the Aquachain miner
//!
//! This module handles all configuration-related functionality including:
//! - Loading, parsing and validating configuration files
//! - Generating configuration templates
//! - Parsing command-line values (refresh rate, argon triplet)
//!
//! The configuration uses TOML format; every field has a default so an
//! empty file is a valid pool-mining configuration.

/// Core configuration implementation
///
/// Contains the [`Config`] struct and related types that define
/// the miner's configuration structure and behavior.
#[allow(clippy::module_inception)]
pub mod config;

// Re-export key items for easy access
pub use config::{ArgonConfig, Config, DEFAULT_NODE_URL, parse_argon, parse_refresh_rate};

use crate::utils::error::MinerError;
use std::path::PathBuf;

/// Loads miner configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the configuration file (anything convertible to PathBuf)
///
/// # Returns
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(MinerError)` - If the file couldn't be read, parsed or validated
pub fn load(path: impl Into<PathBuf>) -> Result<Config, MinerError> {
    Config::load(path)
}

/// Generates a commented configuration template
///
/// # Arguments
/// * `solo` - Whether the template targets solo mining
///
/// # Returns
/// String containing a ready-to-use TOML configuration template
pub fn generate_template(solo: bool) -> String {
    Config::generate_template(solo)
}
