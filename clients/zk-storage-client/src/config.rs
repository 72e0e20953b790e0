use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use serde::{Deserialize, Serialize};

use crate::base58::decode_pubkey;
use crate::error::{Result, ZkStorageError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Client configuration, built once and handed to [`crate::ZkStorageClient::new`].
///
/// Every field has a default, so `{}` is a valid configuration targeting the
/// deployed `zk_storage` program at `confirmed` commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base58 program id
    pub program_id: String,

    pub commitment: CommitmentLevel,

    pub confirmation: ConfirmationPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program_id: crate::ID.to_string(),
            commitment: CommitmentLevel::default(),
            confirmation: ConfirmationPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ZkStorageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn program_id(&self) -> Result<Pubkey> {
        decode_pubkey(&self.program_id)
            .map_err(|e| ZkStorageError::Config(format!("program_id: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        self.program_id()?;
        if self.confirmation.max_attempts == 0 {
            return Err(ZkStorageError::Config(
                "confirmation.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// How long to wait for a submitted transaction to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationPolicy {
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ConfirmationPolicy {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Ledger commitment levels, weakest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentLevel {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl CommitmentLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitmentLevel::Processed => "processed",
            CommitmentLevel::Confirmed => "confirmed",
            CommitmentLevel::Finalized => "finalized",
        }
    }

    /// Parses a `confirmationStatus` value from `getSignatureStatuses`.
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "processed" => Some(CommitmentLevel::Processed),
            "confirmed" => Some(CommitmentLevel::Confirmed),
            "finalized" => Some(CommitmentLevel::Finalized),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = ClientConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.program_id().unwrap(), crate::ID);
        assert_eq!(config.confirmation.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.confirmation.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.commitment, CommitmentLevel::Confirmed);
    }

    #[test]
    fn partial_overrides() {
        let config = ClientConfig::from_json_str(
            r#"{ "commitment": "finalized", "confirmation": { "max_attempts": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.commitment, CommitmentLevel::Finalized);
        assert_eq!(config.confirmation.max_attempts, 5);
        assert_eq!(config.confirmation.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn rejects_invalid_values() {
        for json in [
            r#"{ "program_id": "not-base58!" }"#,
            r#"{ "program_id": "3dQsx7p1Fcxzr69vaewmYdb56FWtmjGzTXkxpLxo8Qf" }"#,
            r#"{ "confirmation": { "max_attempts": 0 } }"#,
            r#"{ "commitment": "recent" }"#,
            "not json",
        ] {
            assert!(
                matches!(ClientConfig::from_json_str(json), Err(ZkStorageError::Config(_))),
                "{json}"
            );
        }
    }

    #[test]
    fn commitment_levels_are_ordered() {
        assert!(CommitmentLevel::Processed < CommitmentLevel::Confirmed);
        assert!(CommitmentLevel::Confirmed < CommitmentLevel::Finalized);
        for level in [
            CommitmentLevel::Processed,
            CommitmentLevel::Confirmed,
            CommitmentLevel::Finalized,
        ] {
            assert_eq!(CommitmentLevel::from_status(level.as_str()), Some(level));
        }
        assert_eq!(CommitmentLevel::from_status("recent"), None);
    }
}
