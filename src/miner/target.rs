// src/miner/target.rs
//! Hash-vs-target comparison
//!
//! The 32-byte Argon2id output is read as a **big-endian** unsigned integer,
//! the same way the node re-derives it (`big.Int.SetBytes` on the node side,
//! most significant byte first). A candidate wins iff `hash < target`.
//!
//! Targets range over `[0, 2^256]`; `2^256` does not fit in 256 bits, so
//! they are held in a 320-bit integer.

use crate::utils::error::MinerError;
use std::fmt;
use uint::construct_uint;

construct_uint! {
    /// 320-bit unsigned integer, wide enough for `2^256`
    pub struct U320(5);
}

/// Width of a hash output in bytes
pub const HASH_LEN: usize = 32;

/// A job's win threshold
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target(U320);

impl Target {
    /// The largest allowed target, `2^256`; every hash beats it
    pub fn max() -> Self {
        Target(U320::one() << 256)
    }

    /// Zero target; no hash beats it
    pub fn zero() -> Self {
        Target(U320::zero())
    }

    /// Builds a target from an integer, rejecting anything above `2^256`
    pub fn new(value: U320) -> Result<Self, MinerError> {
        if value > Self::max().0 {
            return Err(MinerError::ProtocolError(format!(
                "target {:#x} exceeds 2^256",
                value
            )));
        }
        Ok(Target(value))
    }

    /// `2^exp`, for `exp <= 256`
    pub fn pow2(exp: usize) -> Result<Self, MinerError> {
        if exp > 256 {
            return Err(MinerError::ProtocolError(format!("target 2^{} exceeds 2^256", exp)));
        }
        Ok(Target(U320::one() << exp))
    }

    /// Parses a hex target, with or without `0x`
    pub fn from_hex(text: &str) -> Result<Self, MinerError> {
        let digits = text.trim().trim_start_matches("0x").trim_start_matches("0X");
        if digits.is_empty() {
            return Err(MinerError::ProtocolError("empty target".into()));
        }
        let value = U320::from_str_radix(digits, 16)
            .map_err(|e| MinerError::ProtocolError(format!("bad target {:?}: {:?}", text, e)))?;
        Self::new(value)
    }

    /// Big-endian 32-byte encoding, or `None` for `2^256`
    pub fn to_be_bytes(&self) -> Option<[u8; HASH_LEN]> {
        if self.0.bits() > HASH_LEN * 8 {
            return None;
        }
        let mut out = [0u8; HASH_LEN];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0.byte(HASH_LEN - 1 - i);
        }
        Some(out)
    }

    /// Underlying integer
    pub fn value(&self) -> U320 {
        self.0
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({:#x})", self.0)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Reads a hash output as a big-endian integer
pub fn hash_to_int(hash: &[u8; HASH_LEN]) -> U320 {
    U320::from_big_endian(hash)
}

/// True iff `hash < target` under big-endian interpretation
#[inline]
pub fn meets_target(hash: &[u8; HASH_LEN], target: &Target) -> bool {
    hash_to_int(hash) < target.0
}

/// Same rule as [`meets_target`] via a fixed-width byte comparison
///
/// Big-endian byte strings of equal length order exactly like the integers
/// they encode, so a lexicographic compare is enough once `2^256` is
/// handled.
pub fn meets_target_bytes(hash: &[u8; HASH_LEN], target: &Target) -> bool {
    match target.to_be_bytes() {
        Some(limit) => hash.as_slice() < limit.as_slice(),
        None => true,
    }
}
