// src/miner/mod.rs
//! Core mining functionality
//!
//! This module contains all components related to the mining process:
//! - Hash parameters and the keyed Argon2id primitive
//! - Seed layout and target comparison
//! - Batched search devices and per-worker working memory
//! - The worker state machine and its supervisor

/// Keyed hash primitives
pub mod algorithm;

/// Working memory blocks for the hash primitive
pub mod memory;

/// Process-wide Argon2id cost parameters
///
/// Settable once at startup, frozen when the first hasher is built.
pub mod params;

/// Batched nonce search devices
pub mod search;

/// Seed layout: job hash followed by a little-endian nonce
pub mod seed;

/// Starts and stops worker threads
pub mod supervisor;

/// 256-bit target comparison
pub mod target;

/// Per-device mining loop
///
/// Follows the job feed, manages the nonce and reacts to rejects.
pub mod worker;

// Re-export main components for cleaner imports
pub use self::algorithm::{Argon2idHasher, KeyedHasher, network_verifier};
pub use self::memory::{HeapAllocator, MemoryAllocator, WorkingMemory, WorkingMemoryPool};
pub use self::params::{ArgonParams, CANONICAL_PARAMS, HashParameters, ParamState};
pub use self::search::{CpuSearch, DeviceFactory, HashSearch};
pub use self::seed::{Seed, nonce_to_hex};
pub use self::supervisor::{Supervisor, WorkerSummary};
pub use self::target::{Target, meets_target};
pub use self::worker::{MiningWorker, RejectFlag, WorkerContext, WorkerState, WorkerStats};
