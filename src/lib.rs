//! Aqua Miner - Argon2id proof-of-work mining worker pool in Rust
//!
//! This crate provides the device-independent half of an Aquachain miner:
//! - Process-wide Argon2id parameters with a freeze guard
//! - Per-worker mining loops that follow a job feed and manage nonces
//! - A serialized submission channel with solo and pool policies
//! - Lock-free counters and periodic statistics reporting

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Miner core implementation including the hash primitive and workers
pub mod miner;

/// Network communication components for node and pool connections
pub mod network;

/// Statistics collection and reporting functionality
pub mod stats;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::Config;
pub use miner::{
    Argon2idHasher, CpuSearch, HashParameters, HashSearch, KeyedHasher, MiningWorker, Supervisor,
    Target, WorkerContext,
};
pub use network::{NodeClient, SharedJobFeed, SubmissionChannel, WorkUpdater};
pub use stats::{GlobalCounters, MiningStats, StatsReporter};
pub use types::MiningMode;
pub use utils::{MinerError, init_logging};
