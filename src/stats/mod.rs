//! Statistics collection and reporting module
//!
//! [`GlobalCounters`] is the lock-free read surface for hashes computed and
//! submissions sent/accepted. [`StatsReporter`] turns it into a periodic
//! log line.

/// Process-wide atomic counters
pub mod counters;

/// Periodic statistics reporter
pub mod reporter;

// Re-export main components
pub use counters::{GlobalCounters, MiningStats};
pub use reporter::{ReporterHandle, StatsReporter};
