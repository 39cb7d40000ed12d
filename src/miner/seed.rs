// src/miner/seed.rs
//! Hash input derivation
//!
//! A seed is the 32-byte job hash followed by the 8-byte little-endian
//! nonce. Only the nonce suffix changes between candidates, so it is
//! rewritten in place.

use crate::utils::error::MinerError;

/// Length of a job hash in bytes
pub const JOB_HASH_LEN: usize = 32;
/// Offset of the nonce inside a seed
pub const NONCE_OFFSET: usize = JOB_HASH_LEN;
/// Total seed length
pub const SEED_LEN: usize = NONCE_OFFSET + 8;

/// Keyed hash input: `job_hash || nonce_le`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    /// Builds a seed from a job hash and a starting nonce
    ///
    /// Fails with `InvalidJobHash` unless `job_hash` is exactly 32 bytes.
    pub fn derive(job_hash: &[u8], nonce: u64) -> Result<Self, MinerError> {
        if job_hash.len() != JOB_HASH_LEN {
            return Err(MinerError::InvalidJobHash(format!(
                "expected {} bytes, got {}",
                JOB_HASH_LEN,
                job_hash.len()
            )));
        }
        let mut bytes = [0u8; SEED_LEN];
        bytes[..NONCE_OFFSET].copy_from_slice(job_hash);
        bytes[NONCE_OFFSET..].copy_from_slice(&nonce.to_le_bytes());
        Ok(Seed(bytes))
    }

    /// Overwrites the nonce suffix, leaving the job hash prefix untouched
    #[inline]
    pub fn update_nonce(&mut self, nonce: u64) {
        self.0[NONCE_OFFSET..].copy_from_slice(&nonce.to_le_bytes());
    }

    /// Nonce currently stored in the suffix
    pub fn nonce(&self) -> u64 {
        let mut le = [0u8; 8];
        le.copy_from_slice(&self.0[NONCE_OFFSET..]);
        u64::from_le_bytes(le)
    }

    /// The job hash prefix
    pub fn job_hash(&self) -> &[u8] {
        &self.0[..NONCE_OFFSET]
    }

    /// Raw seed bytes
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seed({})", hex::encode(self.0))
    }
}

/// Formats a nonce the way the node expects it: `0x` + 16 zero-padded hex digits
pub fn nonce_to_hex(nonce: u64) -> String {
    format!("0x{:016x}", nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const JOB: [u8; 32] = hex!("0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20");

    #[test]
    fn derive_concatenates_hash_and_le_nonce() {
        let seed = Seed::derive(&JOB, 0x0807060504030201).unwrap();
        assert_eq!(&seed.as_bytes()[..32], &JOB);
        assert_eq!(&seed.as_bytes()[32..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn nonce_suffix_round_trips() {
        for nonce in [0u64, 1, 42, u32::MAX as u64 + 7, u64::MAX - 1, u64::MAX] {
            let seed = Seed::derive(&JOB, nonce).unwrap();
            assert_eq!(seed.nonce(), nonce, "nonce {nonce:#x} must survive derive");
        }
    }

    #[test]
    fn update_nonce_leaves_prefix_alone() {
        let mut seed = Seed::derive(&JOB, 0).unwrap();
        seed.update_nonce(0xdead_beef);
        assert_eq!(seed.job_hash(), &JOB);
        assert_eq!(seed.nonce(), 0xdead_beef);
        assert_eq!(seed, Seed::derive(&JOB, 0xdead_beef).unwrap());
    }

    #[test]
    fn wrong_length_job_hash_is_rejected() {
        for len in [0usize, 31, 33, 64] {
            let err = Seed::derive(&vec![0u8; len], 1).unwrap_err();
            assert!(
                matches!(err, MinerError::InvalidJobHash(_)),
                "length {len} must fail with InvalidJobHash"
            );
        }
    }

    #[test]
    fn nonce_hex_is_zero_padded() {
        assert_eq!(nonce_to_hex(42), "0x000000000000002a");
        assert_eq!(nonce_to_hex(u64::MAX), "0xffffffffffffffff");
    }
}
