// src/miner/worker.rs
//! Per-device mining loop
//!
//! A worker follows the job feed, owns its nonce and seed, drives one
//! search device batch by batch and hands winners to the submission
//! channel. States:
//!
//! ```text
//! AwaitingJob -> Active <-> RejectWait (pool only)
//!                  |
//!               Stopped
//! ```
//!
//! The reject flag is the only worker field written by another thread.

use crate::miner::algorithm::KeyedHasher;
use crate::miner::memory::{MemoryAllocator, WorkingMemoryPool};
use crate::miner::search::HashSearch;
use crate::miner::seed::{Seed, nonce_to_hex};
use crate::miner::target::{HASH_LEN, meets_target};
use crate::network::job::{JobDescription, JobFeed};
use crate::network::submit::{Submission, SubmissionChannel};
use crate::stats::counters::GlobalCounters;
use crate::types::MiningMode;
use crate::utils::error::MinerError;
use crate::utils::logging::hash_prefix;
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Longest single sleep, so a stop request is noticed quickly
const MAX_SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Set by the submission channel when the node rejects a worker's share
///
/// Single setter role (submission completion) and single clearer role (the
/// owning worker). Clearing uses `swap`, so a set racing with a clear is
/// either observed by that clear or survives it.
#[derive(Debug, Default)]
pub struct RejectFlag(AtomicBool);

impl RejectFlag {
    /// Creates a cleared flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the last submission as rejected
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clears the flag, returning whether it was set
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Reads the flag without clearing it
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-worker counters readable from other threads
#[derive(Debug, Default)]
pub struct WorkerStats {
    hashes: AtomicU64,
    found: AtomicU64,
}

impl WorkerStats {
    /// Hashes computed by this worker
    pub fn hashes(&self) -> u64 {
        self.hashes.load(Ordering::Relaxed)
    }

    /// Winners this worker handed to the submission channel
    pub fn found(&self) -> u64 {
        self.found.load(Ordering::Relaxed)
    }
}

/// Where a worker is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No valid job seen yet
    AwaitingJob,
    /// Hashing
    Active,
    /// Parked after a pool reject until the feed generation moves past `since`
    RejectWait {
        /// Feed generation observed when the reject was noticed
        since: u64,
    },
    /// Loop exited; terminal
    Stopped,
}

/// Process-scoped state every worker is constructed with
pub struct WorkerContext {
    /// Solo or pool
    pub mode: MiningMode,
    /// Nonces per device call
    pub batch_size: u64,
    /// Sleep between feed checks while awaiting the first usable job
    pub poll_interval: Duration,
    /// Sleep between feed checks while parked after a pool reject
    pub reject_wait: Duration,
    /// Cleared to stop every worker
    pub run: Arc<AtomicBool>,
    /// Current job source
    pub feed: Arc<dyn JobFeed>,
    /// Process-wide counters
    pub counters: Arc<GlobalCounters>,
    /// Where winners go
    pub submissions: Arc<SubmissionChannel>,
    /// CPU re-verification of device winners; `None` trusts the device
    pub verifier: Option<Arc<dyn KeyedHasher>>,
    /// Source of working memory for re-verification
    pub allocator: Arc<dyn MemoryAllocator>,
}

impl WorkerContext {
    fn running(&self) -> bool {
        self.run.load(Ordering::Relaxed)
    }
}

/// One mining loop bound to one device
pub struct MiningWorker {
    tag: String,
    ctx: Arc<WorkerContext>,
    device: Box<dyn HashSearch>,
    reject: Arc<RejectFlag>,
    stats: Arc<WorkerStats>,
    memory: WorkingMemoryPool,
    rng: Box<dyn RngCore + Send>,
    state: WorkerState,
    job: Option<Arc<JobDescription>>,
    bad_job_hash: Option<String>,
    seed: Option<Seed>,
    nonce: u64,
    last_batch: u64,
    regenerations: u64,
}

impl MiningWorker {
    /// Creates worker `index` with OS randomness for nonces
    pub fn new(
        index: usize,
        ctx: Arc<WorkerContext>,
        device: Box<dyn HashSearch>,
        reject: Arc<RejectFlag>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self::with_rng(index, ctx, device, reject, stats, Box::new(OsRng))
    }

    /// Creates a worker drawing nonces from `rng`
    pub fn with_rng(
        index: usize,
        ctx: Arc<WorkerContext>,
        device: Box<dyn HashSearch>,
        reject: Arc<RejectFlag>,
        stats: Arc<WorkerStats>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        let block_count = ctx.verifier.as_ref().map_or(0, |h| h.memory_blocks());
        let memory = WorkingMemoryPool::new(ctx.allocator.clone(), block_count);
        MiningWorker {
            tag: worker_tag(index),
            ctx,
            device,
            reject,
            stats,
            memory,
            rng,
            state: WorkerState::AwaitingJob,
            job: None,
            bad_job_hash: None,
            seed: None,
            nonce: 0,
            last_batch: 0,
            regenerations: 0,
        }
    }

    /// `MINER_NN` log tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Current state
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Start of the next batch to search
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Current seed, once a job has been seen
    pub fn seed(&self) -> Option<&Seed> {
        self.seed.as_ref()
    }

    /// Number of random nonce draws so far (new jobs and rejects)
    pub fn nonce_regenerations(&self) -> u64 {
        self.regenerations
    }

    /// Runs until the run flag clears or the hash primitive fails
    ///
    /// Working memory is released on every exit path.
    pub fn run(mut self) -> Result<(), MinerError> {
        log::info!("[{}] started on {}", self.tag, self.device.name());

        let result = loop {
            if !self.ctx.running() {
                break Ok(());
            }
            if let Err(e) = self.step() {
                break Err(e);
            }
        };

        self.state = WorkerState::Stopped;
        self.memory.release();
        match &result {
            Ok(()) => log::info!("[{}] stopped", self.tag),
            Err(e) => log::error!("[{}] aborted: {}", self.tag, e),
        }
        result
    }

    /// Performs one loop iteration and returns the resulting state
    ///
    /// Either one search batch, one poll while waiting, or nothing when
    /// stopped.
    pub fn step(&mut self) -> Result<WorkerState, MinerError> {
        if self.state == WorkerState::Stopped {
            return Ok(self.state);
        }

        if let WorkerState::RejectWait { since } = self.state {
            if self.ctx.feed.generation() == since {
                self.pause(self.ctx.reject_wait);
                return Ok(self.state);
            }
            log::info!("[{}] resumes mining", self.tag);
            self.state = WorkerState::Active;
        }

        if !self.observe_job() {
            self.pause(self.ctx.poll_interval);
            return Ok(self.state);
        }

        if self.state == WorkerState::Active {
            self.search_batch()?;
        }
        Ok(self.state)
    }

    /// Applies the latest feed snapshot; false while there is nothing to mine
    fn observe_job(&mut self) -> bool {
        if let Some(latest) = self.ctx.feed.current_job() {
            let changed = self
                .job
                .as_ref()
                .is_none_or(|current| current.job_hash != latest.job_hash);
            if changed
                && self.bad_job_hash.as_deref() != Some(latest.job_hash.as_str())
                && self.switch_job(latest)
            {
                return true;
            }
        }

        if self.job.is_none() {
            return false;
        }

        if self.reject.take() {
            let since = self.ctx.feed.generation();
            self.regenerate_nonce();
            if self.ctx.mode.is_solo() {
                log::info!("[{}] regenerated nonce after a reject", self.tag);
            } else {
                log::info!(
                    "[{}] Thread stopped mining because last share rejected, waiting for new work from pool",
                    self.tag
                );
                self.state = WorkerState::RejectWait { since };
            }
        } else {
            self.advance_nonce();
        }
        true
    }

    /// Moves past the last batch, redrawing when the next one would not fit
    fn advance_nonce(&mut self) {
        let batch = self.ctx.batch_size;
        let next = self
            .nonce
            .checked_add(self.last_batch)
            .filter(|start| start.checked_add(batch).is_some());
        match next {
            Some(start) => {
                self.nonce = start;
                self.last_batch = 0;
            }
            None => {
                log::debug!("[{}] nonce range exhausted, drawing a new start", self.tag);
                self.regenerate_nonce();
            }
        }
    }

    /// Random batch start; a full batch always fits below `u64::MAX`
    fn draw_nonce(&mut self) -> u64 {
        self.rng.next_u64().min(u64::MAX - self.ctx.batch_size)
    }

    /// Adopts `job` with a fresh random nonce; false if its hash is malformed
    fn switch_job(&mut self, job: Arc<JobDescription>) -> bool {
        let nonce = self.draw_nonce();
        let seed = match job
            .job_hash_bytes()
            .and_then(|hash| Seed::derive(&hash, nonce))
        {
            Ok(seed) => seed,
            Err(e) => {
                log::warn!(
                    "[{}] ignoring job {}, keeping previous work: {}",
                    self.tag,
                    hash_prefix(&job.job_hash),
                    e
                );
                self.bad_job_hash = Some(job.job_hash.clone());
                return false;
            }
        };

        self.nonce = nonce;
        self.seed = Some(seed);
        self.regenerations += 1;
        self.last_batch = 0;
        log::debug!(
            "[{}] new work {} starting nonce {}",
            self.tag,
            hash_prefix(&job.job_hash),
            nonce_to_hex(self.nonce)
        );
        self.bad_job_hash = None;
        self.reject.take();
        self.job = Some(job);
        self.state = WorkerState::Active;
        true
    }

    fn regenerate_nonce(&mut self) {
        self.nonce = self.draw_nonce();
        self.regenerations += 1;
        self.last_batch = 0;
        if let Some(seed) = self.seed.as_mut() {
            seed.update_nonce(self.nonce);
        }
        log::debug!("[{}] regen nonce: {}", self.tag, nonce_to_hex(self.nonce));
    }

    fn search_batch(&mut self) -> Result<(), MinerError> {
        let (Some(job), Some(seed)) = (self.job.clone(), self.seed) else {
            return Ok(());
        };
        let batch = self.ctx.batch_size;
        let start = self.nonce;

        let found = self.device.search(&seed, start, batch, &job.target)?;

        self.ctx.counters.add_hashes(batch);
        self.stats.hashes.fetch_add(batch, Ordering::Relaxed);
        self.last_batch = batch;

        if let Some(nonce) = found {
            self.handle_winner(nonce, &job)?;
        }
        Ok(())
    }

    fn handle_winner(&mut self, nonce: u64, job: &JobDescription) -> Result<(), MinerError> {
        let Some(seed) = self.seed.as_mut() else {
            return Ok(());
        };
        seed.update_nonce(nonce);

        if let Some(hasher) = &self.ctx.verifier {
            let mut digest = [0u8; HASH_LEN];
            hasher.hash(seed, self.memory.acquire(), &mut digest)?;
            if !meets_target(&digest, &job.target) {
                log::warn!(
                    "[{}] device reported nonce {} for job {} but it does not beat the target",
                    self.tag,
                    nonce_to_hex(nonce),
                    hash_prefix(&job.job_hash)
                );
                return Ok(());
            }
        }

        self.stats.found.fetch_add(1, Ordering::Relaxed);
        self.ctx.submissions.dispatch(Submission {
            nonce,
            job_hash: job.job_hash.clone(),
            worker_tag: self.tag.clone(),
            reject: self.reject.clone(),
        });
        Ok(())
    }

    /// Sleeps `interval` in short slices, returning early on stop
    fn pause(&self, interval: Duration) {
        let deadline = Instant::now() + interval;
        while self.ctx.running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(MAX_SLEEP_SLICE));
        }
    }
}

/// Log tag for worker `index`
pub fn worker_tag(index: usize) -> String {
    format!("MINER_{:02}", index)
}
