//! The boundary to the ledger network.
//!
//! [`RpcTransport`] is everything the transaction client needs from a node.
//! [`JsonRpcTransport`] implements it on top of Solana's JSON-RPC methods,
//! leaving the actual HTTP exchange to a caller-supplied [`JsonRpcSender`].

mod json;

pub use json::*;

use std::fmt;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::hash::Hash;
use async_trait::async_trait;
use thiserror::Error;

use crate::error::{ZkStorageError, ZkStorageErrorCode};
use crate::transaction::{Signature, SignedEnvelope};

/// The ledger refused a transaction, e.g. because the account already exists.
///
/// Recoverable: callers usually treat it as "already in the desired state".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Custom program error code, when the failure carried one.
    pub code: Option<u32>,
    pub reason: String,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: reason.into(),
        }
    }

    pub fn with_code(code: u32, reason: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            reason: reason.into(),
        }
    }

    /// The `zk_storage` error behind this rejection, if any.
    pub fn program_error(&self) -> Option<ZkStorageErrorCode> {
        self.code.and_then(ZkStorageErrorCode::from_code)
    }

    /// System program `AccountAlreadyInUse` (custom error 0) raised when an
    /// `init` targets an existing account.
    pub fn is_already_initialized(&self) -> bool {
        self.code == Some(0) || self.reason.contains("already in use")
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.program_error()) {
            (_, Some(program_error)) => write!(f, "{} ({program_error})", self.reason),
            (Some(code), None) => write!(f, "{} (code {code})", self.reason),
            (None, None) => f.write_str(&self.reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// Network-level failure; the request may be retried with backoff.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("rejected: {0}")]
    Rejected(Rejection),
}

/// For calls outside `submit`, which handles both variants itself.
impl From<RpcError> for ZkStorageError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Transport(message) => ZkStorageError::Transport(message),
            RpcError::Rejected(rejection) => ZkStorageError::Rejected(rejection),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed(Rejection),
}

#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// A recent blockhash; fetched fresh for every submission.
    async fn get_recent_anchor(&self) -> Result<Hash, RpcError>;

    async fn send_transaction(&self, envelope: &SignedEnvelope) -> Result<Signature, RpcError>;

    async fn get_transaction_status(
        &self,
        signature: &Signature,
    ) -> Result<TransactionStatus, RpcError>;

    /// Raw account data, or `None` if the account does not exist.
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, RpcError>;
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for Box<T> {
    async fn get_recent_anchor(&self) -> Result<Hash, RpcError> {
        (**self).get_recent_anchor().await
    }

    async fn send_transaction(&self, envelope: &SignedEnvelope) -> Result<Signature, RpcError> {
        (**self).send_transaction(envelope).await
    }

    async fn get_transaction_status(
        &self,
        signature: &Signature,
    ) -> Result<TransactionStatus, RpcError> {
        (**self).get_transaction_status(signature).await
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, RpcError> {
        (**self).get_account_data(address).await
    }
}
