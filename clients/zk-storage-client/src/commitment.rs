//! Hiding commitments over sensor payloads.
//!
//! `digest = SHA-256(payload || secret || nonce)` where `nonce` is 16 fresh
//! random bytes per commitment. The digest alone reveals nothing about the
//! payload; revealing `(payload, secret, nonce)` lets anyone re-check it.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::base58::digest_to_hex;
use crate::constants::{DIGEST_LEN, NONCE_LEN};
use crate::error::{Result, ZkStorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commitment {
    pub digest: [u8; DIGEST_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Creation time in unix milliseconds.
    pub timestamp: u64,
    pub payload: String,
}

impl Commitment {
    pub fn digest_hex(&self) -> String {
        digest_to_hex(&self.digest)
    }

    pub fn nonce_hex(&self) -> String {
        hex::encode(self.nonce)
    }

    /// Re-checks this commitment against a revealed secret.
    pub fn verify(&self, secret: &str) -> bool {
        verify(&self.payload, secret, &self.nonce, &self.digest)
    }
}

pub fn create(payload: &str, secret: &str) -> Result<Commitment> {
    let nonce = fresh_nonce()?;
    let commitment = create_with(payload, secret, nonce, now_millis());
    debug!(
        digest = %commitment.digest_hex(),
        timestamp = commitment.timestamp,
        "created commitment"
    );
    Ok(commitment)
}

/// Deterministic core of [`create`].
pub fn create_with(
    payload: &str,
    secret: &str,
    nonce: [u8; NONCE_LEN],
    timestamp: u64,
) -> Commitment {
    Commitment {
        digest: commitment_digest(payload.as_bytes(), secret.as_bytes(), &nonce),
        nonce,
        timestamp,
        payload: payload.to_owned(),
    }
}

/// One independent commitment per payload, in input order.
pub fn create_batch<S: AsRef<str>>(payloads: &[S], secret: &str) -> Result<Vec<Commitment>> {
    payloads
        .iter()
        .map(|payload| create(payload.as_ref(), secret))
        .collect()
}

pub fn verify(payload: &str, secret: &str, nonce: &[u8], digest: &[u8; DIGEST_LEN]) -> bool {
    let expected = commitment_digest(payload.as_bytes(), secret.as_bytes(), nonce);
    expected[..].ct_eq(&digest[..]).into()
}

/// Digest layout recomputed by the program's `verify_commitment`:
/// the UTF-8 concatenation of payload, secret, nonce text and the decimal
/// timestamp stored on the account.
pub fn ledger_digest(payload: &str, secret: &str, nonce: &str, timestamp: u64) -> [u8; DIGEST_LEN] {
    let input = format!("{payload}{secret}{nonce}{timestamp}");
    Sha256::digest(input.as_bytes()).into()
}

fn commitment_digest(payload: &[u8], secret: &[u8], nonce: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.update(secret);
    hasher.update(nonce);
    hasher.finalize().into()
}

fn fresh_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|err| ZkStorageError::Entropy(err.to_string()))?;
    Ok(nonce)
}

fn now_millis() -> u64 {
    // clamp pre-epoch clocks to zero
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fixed_nonce() -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        for (i, b) in nonce.iter_mut().enumerate() {
            *b = i as u8;
        }
        nonce
    }

    #[test]
    fn digest_layout_is_payload_secret_nonce() {
        let commitment = create_with("temp:25.7", "sensor_secret", fixed_nonce(), 1);
        assert_eq!(
            commitment.digest_hex(),
            "238afbbf838e939b2f486d7cce048e8f786d3e95c358074ce03d34109dc67f2e"
        );
        assert_eq!(commitment.nonce_hex(), "000102030405060708090a0b0c0d0e0f");
    }

    #[test]
    fn created_commitment_verifies() {
        let commitment = create("temp:25.7", "sensor_secret").unwrap();
        assert_eq!(commitment.digest_hex().len(), 64);
        assert!(verify(
            "temp:25.7",
            "sensor_secret",
            &commitment.nonce,
            &commitment.digest
        ));
        assert!(commitment.verify("sensor_secret"));
    }

    #[test]
    fn wrong_secret_payload_or_nonce_fail() {
        let commitment = create("temp:25.7", "sensor_secret").unwrap();
        assert!(!verify("temp:25.8", "sensor_secret", &commitment.nonce, &commitment.digest));
        assert!(!verify("temp:25.7", "other_secret", &commitment.nonce, &commitment.digest));
        let mut nonce = commitment.nonce;
        nonce[0] ^= 1;
        assert!(!verify("temp:25.7", "sensor_secret", &nonce, &commitment.digest));
    }

    #[test]
    fn nonces_are_fresh() {
        let first = create("temp:25.7", "sensor_secret").unwrap();
        let second = create("temp:25.7", "sensor_secret").unwrap();
        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.digest, second.digest);
    }

    #[test]
    fn timestamp_is_creation_time() {
        let before = now_millis();
        let commitment = create("light:750", "s").unwrap();
        let after = now_millis();
        assert!(commitment.timestamp >= before && commitment.timestamp <= after);
    }

    #[test]
    fn empty_payload_is_accepted() {
        let commitment = create("", "sensor_secret").unwrap();
        assert!(verify("", "sensor_secret", &commitment.nonce, &commitment.digest));
    }

    #[test]
    fn batch_preserves_order_with_distinct_nonces() {
        let payloads = [
            "reading1:value1",
            "reading2:value2",
            "reading3:value3",
            "reading4:value4",
            "reading5:value5",
        ];
        let batch = create_batch(&payloads, "batch_secret").unwrap();
        assert_eq!(batch.len(), payloads.len());
        for (commitment, payload) in batch.iter().zip(payloads) {
            assert_eq!(commitment.payload, payload);
            assert!(commitment.verify("batch_secret"));
        }
        let nonces: HashSet<_> = batch.iter().map(|c| c.nonce).collect();
        assert_eq!(nonces.len(), payloads.len());
    }

    #[test]
    fn ledger_digest_concatenates_decimal_timestamp() {
        let digest = ledger_digest(
            "temp:25.7",
            "sensor_secret",
            "000102030405060708090a0b0c0d0e0f",
            1_700_000_000_000,
        );
        assert_eq!(
            hex::encode(digest),
            "96af79a956020412575dff7c632212de51dada6068c603fe74edfbc663907b11"
        );
    }
}
