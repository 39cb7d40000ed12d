// src/cli/mod.rs
//! Command-line interface definitions

/// `clap` derive structures for the `start`, `benchmark` and `config` commands
pub mod commands;

pub use commands::{Action, BenchmarkOptions, Commands, ConfigOptions, StartOptions};
