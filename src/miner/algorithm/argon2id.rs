// src/miner/algorithm/argon2id.rs
//! Argon2id keyed hash
//!
//! Builds one `argon2::Argon2` context from the frozen [`HashParameters`]
//! and hashes into caller-provided blocks with
//! `hash_password_into_with_memory`, so no allocation happens per hash.

use crate::miner::algorithm::KeyedHasher;
use crate::miner::memory::WorkingMemory;
use crate::miner::params::HashParameters;
use crate::miner::seed::Seed;
use crate::miner::target::HASH_LEN;
use crate::utils::error::MinerError;
use argon2::{Algorithm, Argon2, Params, Version};

/// The `argon2` crate refuses salts shorter than 8 bytes.
const SALT: &[u8; 8] = &[0u8; 8];

/// Argon2id v1.3 with 32-byte output
pub struct Argon2idHasher {
    argon: Argon2<'static>,
    block_count: usize,
}

impl Argon2idHasher {
    /// Creates the hashing context, freezing `parameters`
    ///
    /// Memory below the Argon2 minimum of 8 KiB per lane is raised to it,
    /// the same clamping the node applies.
    pub fn new(parameters: &HashParameters) -> Result<Self, MinerError> {
        let p = parameters.freeze();
        let lanes = p.lanes.max(1);
        let memory_cost = p.memory_cost.max(Params::MIN_M_COST.max(8 * lanes));
        let params = Params::new(memory_cost, p.time_cost, lanes, Some(HASH_LEN)).map_err(|e| {
            MinerError::ConfigError(format!("invalid argon2 parameters {:?}: {}", p, e))
        })?;
        let block_count = params.block_count();

        log::debug!(
            "argon2id context: t_cost={} m_cost={}KiB lanes={} blocks={}",
            p.time_cost,
            memory_cost,
            lanes,
            block_count
        );

        Ok(Argon2idHasher {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            block_count,
        })
    }
}

impl KeyedHasher for Argon2idHasher {
    fn hash(
        &self,
        seed: &Seed,
        memory: &mut WorkingMemory,
        out: &mut [u8; HASH_LEN],
    ) -> Result<(), MinerError> {
        self.argon
            .hash_password_into_with_memory(seed.as_ref(), SALT, out, memory)
            .map_err(|e| MinerError::HashComputationError(format!("argon2id failed: {}", e)))
    }

    fn memory_blocks(&self) -> usize {
        self.block_count
    }

    fn name(&self) -> &'static str {
        "argon2id"
    }

    /// The network hashes with an empty salt and unclamped memory, neither of
    /// which the `argon2` crate accepts.
    fn network_exact(&self) -> bool {
        false
    }
}
