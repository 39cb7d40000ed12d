// src/utils/logging.rs
//! Logging configuration and utilities
//!
//! Uses `env_logger` with a compact `[ts LEVEL module:line] msg` format.
//! Worker threads prefix their messages with their `MINER_NN` tag, so the
//! format itself stays tag-agnostic.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Initializes logging for a mining session
///
/// Default level is Info; `RUST_LOG` overrides it when set.
pub fn init_logging() {
    let mut builder = common_log_config();
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // A second init (tests, benchmark after start) is harmless.
    let _ = builder.try_init();
}

/// Configures benchmark-specific logging
///
/// Same format as [`init_logging`] but defaults to Debug so per-thread
/// hashrates are visible.
pub fn init_bench_logging() {
    let mut builder = common_log_config();

    if env::var("RUST_LOG").is_err() {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.parse_env("RUST_LOG");
    }

    let _ = builder.try_init();
}

/// Shortens a job hash for log lines
///
/// Keeps the first 8 characters after an optional `0x`. Malformed hashes
/// reach the log too, so the cut always lands on a char boundary.
pub fn hash_prefix(job_hash_hex: &str) -> &str {
    let trimmed = job_hash_hex.trim_start_matches("0x");
    match trimmed.char_indices().nth(8) {
        Some((end, _)) => &trimmed[..end],
        None => trimmed,
    }
}

fn common_log_config() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            let ts = buf.timestamp_seconds();
            let level = record.level();
            let module = record.module_path().unwrap_or_default();
            let line = record.line().unwrap_or(0);

            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                ts,
                level,
                module,
                line,
                record.args()
            )
        })
        .target(Target::Stdout);

    builder
}
