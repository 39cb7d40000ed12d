// src/stats/reporter.rs
use crate::stats::counters::GlobalCounters;
use crate::types::MiningMode;
use crossbeam_channel::{Sender, bounded, select, tick};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Periodically logs hashrate and accept/reject totals
pub struct StatsReporter {
    counters: Arc<GlobalCounters>,
    report_interval: Duration,
    devices: usize,
    mode: MiningMode,
}

/// Running reporter thread
pub struct ReporterHandle {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

impl ReporterHandle {
    /// Stops the reporter and waits for its thread
    pub fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.thread.join();
    }
}

impl StatsReporter {
    /// Creates a reporter over the shared counters
    pub fn new(
        counters: Arc<GlobalCounters>,
        report_interval: Duration,
        devices: usize,
        mode: MiningMode,
    ) -> Self {
        StatsReporter {
            counters,
            report_interval,
            devices,
            mode,
        }
    }

    /// Formats one report line from the hashes done since the last one
    pub fn report_line(&self, hashes_since_last: u64, elapsed: Duration) -> String {
        let stats = self.counters.snapshot();
        let khs = hashes_since_last as f64 / elapsed.as_secs_f64().max(f64::EPSILON) / 1000.0;
        let noun = match self.mode {
            MiningMode::Solo => "Blocks",
            MiningMode::Pool => "Shares",
        };
        format!(
            "{} devices | {:6.2} kH/s | {}={:5} | Rejected={:5} ({:4.1}%)",
            self.devices,
            khs,
            noun,
            stats.submissions_accepted,
            stats.rejected(),
            stats.rejected_percent()
        )
    }

    /// Spawns the background reporting thread
    pub fn start(self) -> ReporterHandle {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let thread = std::thread::spawn(move || {
            let ticker = tick(self.report_interval);
            let mut last = Instant::now();
            let mut last_hashes = self.counters.total_hashes_computed();

            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => {
                        let hashes = self.counters.total_hashes_computed();
                        if hashes > 0 {
                            let now = Instant::now();
                            log::info!("{}", self.report_line(hashes - last_hashes, now - last));
                            last = now;
                            last_hashes = hashes;
                        }
                    }
                }
            }
        });

        ReporterHandle {
            stop: stop_tx,
            thread,
        }
    }
}
