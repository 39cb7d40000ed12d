// src/miner/algorithm/mod.rs
//! Keyed hash primitive
//!
//! The miner never hashes directly; it goes through [`KeyedHasher`] so the
//! primitive can be swapped (tests, alternative bindings) and so that all
//! scratch memory is supplied by the caller's
//! [`WorkingMemoryPool`](crate::miner::memory::WorkingMemoryPool).

/// Argon2id binding on the `argon2` crate
pub mod argon2id;

use crate::miner::memory::WorkingMemory;
use crate::miner::params::HashParameters;
use crate::miner::seed::Seed;
use crate::miner::target::HASH_LEN;
use crate::utils::error::MinerError;
use std::sync::Arc;

pub use argon2id::Argon2idHasher;

/// Fixed-contract hash: 40-byte seed in, 32-byte digest out
pub trait KeyedHasher: Send + Sync {
    /// Hashes `seed` into `out` using `memory` as scratch space
    ///
    /// # Errors
    /// `HashComputationError` when the primitive fails; results from the
    /// calling thread cannot be trusted afterwards.
    fn hash(
        &self,
        seed: &Seed,
        memory: &mut WorkingMemory,
        out: &mut [u8; HASH_LEN],
    ) -> Result<(), MinerError>;

    /// Number of 1 KiB blocks of working memory one hash needs
    fn memory_blocks(&self) -> usize;

    /// Short name for logs
    fn name(&self) -> &'static str;

    /// True iff digests are bit-identical to the ones the network computes
    fn network_exact(&self) -> bool;
}

/// Returns `hasher` if it may vouch for device winners
///
/// An inexact hasher is not used for verification, and `params` are marked
/// so its winners stay local unless `--force-submit` is set.
pub fn network_verifier(
    hasher: Arc<dyn KeyedHasher>,
    params: &HashParameters,
) -> Option<Arc<dyn KeyedHasher>> {
    if hasher.network_exact() {
        return Some(hasher);
    }
    params.mark_primitive_inexact();
    log::warn!(
        "{} hasher does not reproduce network digests; {}",
        hasher.name(),
        if params.submit_enabled() {
            "submitting anyway (--force-submit)"
        } else {
            "winners will not be submitted"
        }
    );
    None
}
