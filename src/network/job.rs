// src/network/job.rs
//! Current-job feed
//!
//! The updater publishes the latest job; workers only read snapshots. Each
//! successful publish bumps a generation counter, even when the job hash is
//! unchanged, which is what parked workers wait on after a reject.

use crate::miner::seed::JOB_HASH_LEN;
use crate::miner::target::Target;
use crate::utils::error::MinerError;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A job as published by the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription {
    /// Job hash in wire form (`0x` + 64 hex digits)
    pub job_hash: String,
    /// Win threshold
    pub target: Target,
}

impl JobDescription {
    /// Creates a job; the hash is kept as received
    pub fn new(job_hash: impl Into<String>, target: Target) -> Self {
        JobDescription {
            job_hash: job_hash.into(),
            target,
        }
    }

    /// Decodes the job hash, failing with `InvalidJobHash` unless it is 32 bytes
    pub fn job_hash_bytes(&self) -> Result<[u8; JOB_HASH_LEN], MinerError> {
        let raw = hex::decode(self.job_hash.trim_start_matches("0x"))?;
        raw.as_slice().try_into().map_err(|_| {
            MinerError::InvalidJobHash(format!(
                "{} decodes to {} bytes, expected {}",
                self.job_hash,
                raw.len(),
                JOB_HASH_LEN
            ))
        })
    }
}

/// Read side of the job feed
pub trait JobFeed: Send + Sync {
    /// Latest job, or `None` before the first publish
    fn current_job(&self) -> Option<Arc<JobDescription>>;

    /// Number of successful publishes so far
    fn generation(&self) -> u64;
}

/// In-memory feed written by the updater
#[derive(Default)]
pub struct SharedJobFeed {
    job: ArcSwapOption<JobDescription>,
    generation: AtomicU64,
}

impl SharedJobFeed {
    /// Creates an empty feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current job and bumps the generation
    pub fn publish(&self, job: JobDescription) {
        self.job.store(Some(Arc::new(job)));
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl JobFeed for SharedJobFeed {
    fn current_job(&self) -> Option<Arc<JobDescription>> {
        self.job.load_full()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
