use anchor_lang::error_code;
use thiserror::Error;

use crate::constants::PROGRAM_ERROR_OFFSET;
use crate::rpc::Rejection;

pub type Result<T> = std::result::Result<T, ZkStorageError>;

/// Failures surfaced by the client library.
///
/// Rejected and timed-out submissions are not errors; they are reported
/// through [`crate::SubmissionStatus`] so callers can keep going.
#[derive(Debug, Error)]
pub enum ZkStorageError {
    /// Malformed base58/hex input or a value of the wrong fixed size.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid seeds: {0}")]
    InvalidSeeds(String),

    /// No bump in 0..=255 produced an off-curve address. Use different seeds.
    #[error("no viable bump seed found for the given seeds")]
    DerivationExhausted,

    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("cannot build a merkle root from zero leaves")]
    EmptyTree,

    #[error("{field} is {len} bytes, maximum is {max}")]
    PayloadTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Network-level failure passed through from the RPC transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// A node refused a request outside the submit lifecycle, such as a
    /// blockhash or account lookup.
    #[error("request rejected: {0}")]
    Rejected(Rejection),

    /// The message needs a signature the client cannot produce.
    #[error("signing error: {0}")]
    Signing(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<std::io::Error> for ZkStorageError {
    fn from(err: std::io::Error) -> Self {
        ZkStorageError::Serialization(err.to_string())
    }
}

/// Custom errors raised by the on-chain `zk_storage` program.
#[error_code]
#[derive(PartialEq, Eq)]
pub enum ZkStorageErrorCode {
    #[msg("Invalid commitment - verification failed")]
    InvalidCommitment,

    #[msg("Metadata exceeds maximum length")]
    MetadataTooLong,

    #[msg("Unauthorized access - not the account authority")]
    Unauthorized,

    #[msg("Storage account not initialized")]
    StorageNotInitialized,

    #[msg("Seed name too long (max 50 characters)")]
    SeedNameTooLong,
}

impl ZkStorageErrorCode {
    const ALL: [ZkStorageErrorCode; 5] = [
        ZkStorageErrorCode::InvalidCommitment,
        ZkStorageErrorCode::MetadataTooLong,
        ZkStorageErrorCode::Unauthorized,
        ZkStorageErrorCode::StorageNotInitialized,
        ZkStorageErrorCode::SeedNameTooLong,
    ];

    /// Maps a raw `Custom(n)` program error back to the enum.
    pub fn from_code(code: u32) -> Option<Self> {
        if code < PROGRAM_ERROR_OFFSET {
            return None;
        }
        Self::ALL.into_iter().find(|variant| u32::from(*variant) == code)
    }
}
