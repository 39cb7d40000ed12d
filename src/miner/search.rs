// src/miner/search.rs
//! Batched hash search
//!
//! A device takes a seed, a starting nonce and a batch size and reports the
//! first nonce in `[start, start + batch)` whose hash beats the target.
//! GPU backends live outside this crate; [`CpuSearch`] is the in-crate
//! reference device used for benchmarking and CPU mining.

use crate::miner::algorithm::KeyedHasher;
use crate::miner::memory::{MemoryAllocator, WorkingMemoryPool};
use crate::miner::seed::Seed;
use crate::miner::target::{HASH_LEN, Target, meets_target};
use crate::utils::error::MinerError;
use std::sync::Arc;

/// One compute device able to search a nonce batch
pub trait HashSearch: Send {
    /// Returns the first winning nonce of the batch, if any
    ///
    /// The job hash is taken from `seed`; its nonce suffix is ignored.
    fn search(
        &mut self,
        seed: &Seed,
        nonce_start: u64,
        batch_size: u64,
        target: &Target,
    ) -> Result<Option<u64>, MinerError>;

    /// Human readable device name
    fn name(&self) -> String;
}

/// Opens the device for worker `index`; called on the worker's own thread
pub type DeviceFactory = Arc<dyn Fn(usize) -> Result<Box<dyn HashSearch>, MinerError> + Send + Sync>;

/// Sequential CPU search over the keyed hash
pub struct CpuSearch {
    index: usize,
    hasher: Arc<dyn KeyedHasher>,
    memory: WorkingMemoryPool,
}

impl CpuSearch {
    /// Creates a CPU device with its own working memory
    pub fn new(index: usize, hasher: Arc<dyn KeyedHasher>, allocator: Arc<dyn MemoryAllocator>) -> Self {
        let memory = WorkingMemoryPool::new(allocator, hasher.memory_blocks());
        CpuSearch {
            index,
            hasher,
            memory,
        }
    }

    /// Factory producing one CPU device per worker
    pub fn factory(hasher: Arc<dyn KeyedHasher>, allocator: Arc<dyn MemoryAllocator>) -> DeviceFactory {
        Arc::new(move |index| {
            Ok(Box::new(CpuSearch::new(index, hasher.clone(), allocator.clone())) as Box<dyn HashSearch>)
        })
    }
}

impl HashSearch for CpuSearch {
    fn search(
        &mut self,
        seed: &Seed,
        nonce_start: u64,
        batch_size: u64,
        target: &Target,
    ) -> Result<Option<u64>, MinerError> {
        let mut candidate = *seed;
        let mut out = [0u8; HASH_LEN];
        let memory = self.memory.acquire();

        for offset in 0..batch_size {
            let nonce = nonce_start.wrapping_add(offset);
            candidate.update_nonce(nonce);
            self.hasher.hash(&candidate, memory, &mut out)?;
            if meets_target(&out, target) {
                return Ok(Some(nonce));
            }
        }
        Ok(None)
    }

    fn name(&self) -> String {
        format!("cpu{} ({})", self.index, self.hasher.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::algorithm::Argon2idHasher;
    use crate::miner::memory::HeapAllocator;
    use crate::miner::params::HashParameters;

    fn cpu_device() -> CpuSearch {
        let hasher = Arc::new(Argon2idHasher::new(&HashParameters::new()).unwrap());
        CpuSearch::new(0, hasher, Arc::new(HeapAllocator))
    }

    #[test]
    fn max_target_wins_on_first_nonce() {
        let mut device = cpu_device();
        let seed = Seed::derive(&[3u8; 32], 0).unwrap();
        let found = device.search(&seed, 1000, 4, &Target::max()).unwrap();
        assert_eq!(found, Some(1000));
    }

    #[test]
    fn zero_target_never_wins() {
        let mut device = cpu_device();
        let seed = Seed::derive(&[3u8; 32], 0).unwrap();
        assert_eq!(device.search(&seed, 0, 16, &Target::zero()).unwrap(), None);
    }

    #[test]
    fn search_wraps_around_the_nonce_space() {
        let mut device = cpu_device();
        let seed = Seed::derive(&[9u8; 32], 0).unwrap();
        assert_eq!(
            device.search(&seed, u64::MAX, 2, &Target::max()).unwrap(),
            Some(u64::MAX)
        );
    }

    #[test]
    fn factory_names_devices_by_index() {
        let hasher: Arc<dyn KeyedHasher> = Arc::new(Argon2idHasher::new(&HashParameters::new()).unwrap());
        let factory = CpuSearch::factory(hasher, Arc::new(HeapAllocator));
        let device = factory(3).unwrap();
        assert_eq!(device.name(), "cpu3 (argon2id)");
    }
}
