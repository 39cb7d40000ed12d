// src/miner/supervisor.rs
//! Starts and stops the worker threads
//!
//! One OS thread per device. The supervisor owns the shared run flag through
//! the [`WorkerContext`]; stopping clears it, joins every worker and closes
//! the submission connection.

use crate::miner::search::DeviceFactory;
use crate::miner::worker::{MiningWorker, RejectFlag, WorkerContext, WorkerStats, worker_tag};
use crate::utils::error::MinerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Per-worker totals as seen by the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    /// `MINER_NN` tag
    pub tag: String,
    /// Hashes computed
    pub hashes: u64,
    /// Winners handed to the submission channel
    pub found: u64,
}

struct WorkerSlot {
    tag: String,
    stats: Arc<WorkerStats>,
    handle: JoinHandle<Result<(), MinerError>>,
}

/// Owns the lifecycle of all mining workers
pub struct Supervisor {
    ctx: Arc<WorkerContext>,
    factory: DeviceFactory,
    workers: Mutex<Vec<WorkerSlot>>,
    started: AtomicBool,
}

impl Supervisor {
    /// Creates a supervisor; nothing runs until [`start`](Self::start)
    ///
    /// # Arguments
    /// * `ctx` - State shared by every worker, including the run flag
    /// * `factory` - Opens the search device for worker `index`
    pub fn new(ctx: Arc<WorkerContext>, factory: DeviceFactory) -> Self {
        Supervisor {
            ctx,
            factory,
            workers: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Whether workers are running
    pub fn is_running(&self) -> bool {
        self.ctx.run.load(Ordering::SeqCst)
    }

    /// Spawns `worker_count` workers with indices `0..worker_count`
    ///
    /// # Errors
    /// `AlreadyRunning` if called twice without a [`stop`](Self::stop) in
    /// between, `IoError` if a thread cannot be spawned (workers already
    /// spawned are stopped again).
    pub fn start(&self, worker_count: usize) -> Result<(), MinerError> {
        if self
            .ctx
            .run
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MinerError::AlreadyRunning);
        }
        self.started.store(true, Ordering::SeqCst);

        let mut workers = self.lock_workers();
        for index in 0..worker_count {
            match self.spawn_worker(index) {
                Ok(slot) => workers.push(slot),
                Err(e) => {
                    self.ctx.run.store(false, Ordering::SeqCst);
                    join_all(workers.drain(..));
                    return Err(e);
                }
            }
        }

        log::info!("started {} mining workers ({})", worker_count, self.ctx.mode);
        Ok(())
    }

    fn spawn_worker(&self, index: usize) -> Result<WorkerSlot, MinerError> {
        let tag = worker_tag(index);
        let stats = Arc::new(WorkerStats::default());
        let ctx = Arc::clone(&self.ctx);
        let factory = Arc::clone(&self.factory);
        let worker_stats = Arc::clone(&stats);
        let thread_tag = tag.clone();

        let handle = std::thread::Builder::new()
            .name(tag.clone())
            .spawn(move || {
                let device = factory(index).inspect_err(|e| {
                    log::error!("[{}] cannot open device: {}", thread_tag, e);
                })?;
                MiningWorker::new(index, ctx, device, Arc::new(RejectFlag::new()), worker_stats)
                    .run()
            })?;

        Ok(WorkerSlot { tag, stats, handle })
    }

    /// Stops every worker, waits for them and closes the submission connection
    ///
    /// Stopping a supervisor that never started is a no-op.
    ///
    /// # Returns
    /// Final per-worker totals, counted after each worker has exited
    ///
    /// # Errors
    /// `NotRunning` if the workers were already stopped.
    pub fn stop(&self) -> Result<Vec<WorkerSummary>, MinerError> {
        if self
            .ctx
            .run
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            if !self.started.load(Ordering::SeqCst) {
                log::debug!("stop requested before any worker was started");
                return Ok(Vec::new());
            }
            return Err(MinerError::NotRunning);
        }

        let summaries = join_all(self.lock_workers().drain(..));
        for summary in &summaries {
            log::info!(
                "[{}] hashes={} found={}",
                summary.tag,
                summary.hashes,
                summary.found
            );
        }
        self.ctx.submissions.close_blocking();
        log::info!("all mining workers stopped");
        Ok(summaries)
    }

    /// Per-worker totals, in index order
    pub fn worker_summaries(&self) -> Vec<WorkerSummary> {
        summarize(&self.lock_workers())
    }

    fn lock_workers(&self) -> std::sync::MutexGuard<'_, Vec<WorkerSlot>> {
        self.workers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn summarize(workers: &[WorkerSlot]) -> Vec<WorkerSummary> {
    workers
        .iter()
        .map(|slot| WorkerSummary {
            tag: slot.tag.clone(),
            hashes: slot.stats.hashes(),
            found: slot.stats.found(),
        })
        .collect()
}

/// Joins each worker, then reads its totals so the last batch is included
fn join_all(workers: impl Iterator<Item = WorkerSlot>) -> Vec<WorkerSummary> {
    workers
        .map(|slot| {
            match slot.handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("[{}] exited with error: {}", slot.tag, e),
                Err(_) => log::error!("[{}] panicked", slot.tag),
            }
            WorkerSummary {
                tag: slot.tag,
                hashes: slot.stats.hashes(),
                found: slot.stats.found(),
            }
        })
        .collect()
}
