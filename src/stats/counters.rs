// src/stats/counters.rs
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the process-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiningStats {
    /// Hashes computed by all workers
    pub hashes_total: u64,
    /// Submissions that reached the transport
    pub submissions_sent: u64,
    /// Submissions the node accepted
    pub submissions_accepted: u64,
}

impl MiningStats {
    /// Sent but not accepted, transport failures included
    pub fn rejected(&self) -> u64 {
        self.submissions_sent.saturating_sub(self.submissions_accepted)
    }

    /// Rejected share of all sent submissions, in percent
    pub fn rejected_percent(&self) -> f64 {
        if self.submissions_sent == 0 {
            0.0
        } else {
            100.0 * self.rejected() as f64 / self.submissions_sent as f64
        }
    }
}

/// Monotonic counters shared by workers and submission tasks
///
/// Lock-free increments only; safe to read from any thread at any time.
#[derive(Debug, Default)]
pub struct GlobalCounters {
    hashes: AtomicU64,
    sent: AtomicU64,
    accepted: AtomicU64,
}

impl GlobalCounters {
    /// Creates zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a finished batch
    pub fn add_hashes(&self, count: u64) {
        self.hashes.fetch_add(count, Ordering::Relaxed);
    }

    /// Counts one submission attempt
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one accepted submission
    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Hashes computed so far
    pub fn total_hashes_computed(&self) -> u64 {
        self.hashes.load(Ordering::Relaxed)
    }

    /// Submissions sent so far
    pub fn total_submissions_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Submissions accepted so far
    pub fn total_submissions_accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Reads all three counters
    pub fn snapshot(&self) -> MiningStats {
        MiningStats {
            hashes_total: self.total_hashes_computed(),
            submissions_sent: self.total_submissions_sent(),
            submissions_accepted: self.total_submissions_accepted(),
        }
    }
}
