// src/miner/params.rs
//! Argon2id cost parameters and their freeze guard
//!
//! Parameters may be changed during startup only. The first consumer that
//! builds a hashing context freezes them; any later change is a fatal
//! configuration error because working memory sized for the old parameters
//! may already exist on running workers.

use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Argon2id cost parameters
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgonParams {
    /// Number of passes over memory
    pub time_cost: u32,
    /// Memory size in KiB
    pub memory_cost: u32,
    /// Degree of parallelism
    pub lanes: u32,
}

/// The protocol parameter set (hard fork 7). Only hashes computed with it
/// are accepted by the network.
pub const CANONICAL_PARAMS: ArgonParams = ArgonParams {
    time_cost: 1,
    memory_cost: 1,
    lanes: 1,
};

impl Default for ArgonParams {
    fn default() -> Self {
        CANONICAL_PARAMS
    }
}

/// Lifecycle state of the parameter set
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamState {
    /// Still writable
    Unset,
    /// A hashing context exists; writes are fatal
    Frozen,
}

/// Process-scoped, write-once-before-use hash parameters
///
/// One writer (the startup sequence), many readers. The sentinel is a
/// plain atomic flag, not a lock.
#[derive(Debug)]
pub struct HashParameters {
    time_cost: AtomicU32,
    memory_cost: AtomicU32,
    lanes: AtomicU32,
    frozen: AtomicBool,
    force_submit: AtomicBool,
    inexact_primitive: AtomicBool,
}

impl Default for HashParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl HashParameters {
    /// Creates a writable parameter set holding the canonical values
    pub fn new() -> Self {
        HashParameters {
            time_cost: AtomicU32::new(CANONICAL_PARAMS.time_cost),
            memory_cost: AtomicU32::new(CANONICAL_PARAMS.memory_cost),
            lanes: AtomicU32::new(CANONICAL_PARAMS.lanes),
            frozen: AtomicBool::new(false),
            force_submit: AtomicBool::new(false),
            inexact_primitive: AtomicBool::new(false),
        }
    }

    /// Replaces the parameters, failing once they are frozen
    pub fn try_set(&self, time_cost: u32, memory_cost: u32, lanes: u32) -> Result<(), MinerError> {
        if self.frozen.load(Ordering::Acquire) {
            return Err(MinerError::ConfigError(
                "argon parameters changed while hashing contexts already exist".into(),
            ));
        }

        self.time_cost.store(time_cost, Ordering::Relaxed);
        self.memory_cost.store(memory_cost, Ordering::Relaxed);
        self.lanes.store(lanes, Ordering::Relaxed);

        log::info!("--- Custom Argon Parameters ---");
        log::info!("t_cost        : {}", time_cost);
        log::info!("m_cost        : {}", memory_cost);
        log::info!("lanes         : {}", lanes);
        log::info!(
            "submit        : {}",
            if self.submit_enabled() { "yes" } else { "no" }
        );
        Ok(())
    }

    /// Replaces the parameters, aborting the process once they are frozen
    pub fn set(&self, time_cost: u32, memory_cost: u32, lanes: u32) {
        if let Err(e) = self.try_set(time_cost, memory_cost, lanes) {
            log::error!("{}, aborting", e);
            log::logger().flush();
            std::process::exit(1);
        }
    }

    /// Allows submissions even with non-canonical parameters
    pub fn force_submit(&self) {
        self.force_submit.store(true, Ordering::Relaxed);
    }

    /// Records that the hasher in use cannot reproduce network digests
    pub fn mark_primitive_inexact(&self) {
        self.inexact_primitive.store(true, Ordering::Relaxed);
    }

    /// Current parameter values, without freezing
    pub fn get(&self) -> ArgonParams {
        ArgonParams {
            time_cost: self.time_cost.load(Ordering::Relaxed),
            memory_cost: self.memory_cost.load(Ordering::Relaxed),
            lanes: self.lanes.load(Ordering::Relaxed),
        }
    }

    /// Freezes the parameters and returns the values hashing must use
    pub fn freeze(&self) -> ArgonParams {
        self.frozen.store(true, Ordering::Release);
        self.get()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ParamState {
        if self.frozen.load(Ordering::Acquire) {
            ParamState::Frozen
        } else {
            ParamState::Unset
        }
    }

    /// True iff the parameters are the protocol set
    pub fn is_mineable(&self) -> bool {
        self.get() == CANONICAL_PARAMS
    }

    /// True when found candidates should actually reach the network
    pub fn submit_enabled(&self) -> bool {
        let exact = self.is_mineable() && !self.inexact_primitive.load(Ordering::Relaxed);
        exact || self.force_submit.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_canonical_and_mineable() {
        let params = HashParameters::new();
        assert_eq!(params.get(), CANONICAL_PARAMS);
        assert!(params.is_mineable());
        assert!(params.submit_enabled());
        assert_eq!(params.state(), ParamState::Unset);
    }

    #[test]
    fn custom_params_suppress_submission_unless_forced() {
        let params = HashParameters::new();
        params.try_set(2, 64, 1).unwrap();
        assert!(!params.is_mineable());
        assert!(!params.submit_enabled(), "calibration params must not submit");

        params.force_submit();
        assert!(!params.is_mineable());
        assert!(params.submit_enabled(), "force-submit overrides calibration");
    }

    #[test]
    fn inexact_primitive_suppresses_protocol_params_unless_forced() {
        let params = HashParameters::new();
        params.mark_primitive_inexact();
        assert!(params.is_mineable());
        assert!(!params.submit_enabled());

        params.force_submit();
        assert!(params.submit_enabled());
    }

    #[test]
    fn setting_before_freeze_is_allowed_repeatedly() {
        let params = HashParameters::new();
        params.try_set(3, 16, 2).unwrap();
        params.try_set(1, 1, 1).unwrap();
        assert!(params.is_mineable());
    }

    #[test]
    fn freeze_rejects_later_writes() {
        let params = HashParameters::new();
        let snapshot = params.freeze();
        assert_eq!(snapshot, CANONICAL_PARAMS);
        assert_eq!(params.state(), ParamState::Frozen);

        let err = params.try_set(2, 2, 2).unwrap_err();
        assert!(err.is_fatal(), "write after freeze must be a fatal ConfigError");
        assert_eq!(params.get(), CANONICAL_PARAMS, "frozen values must not change");
    }
}
