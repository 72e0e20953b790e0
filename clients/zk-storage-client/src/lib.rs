use anchor_lang::prelude::*;

pub mod base58;
pub mod client;
pub mod commitment;
pub mod config;
pub mod constants;
pub mod error;
pub mod instructions;
pub mod keys;
pub mod merkle;
pub mod pda;
pub mod rpc;
pub mod security;
pub mod state;
pub mod transaction;
pub mod utils;

pub use client::{
    SubmissionResult, SubmissionStatus, TransactionClient, WorkflowOutcome, ZkStorageClient,
};
pub use commitment::Commitment;
pub use config::{ClientConfig, CommitmentLevel, ConfirmationPolicy};
pub use error::{Result, ZkStorageError, ZkStorageErrorCode};
pub use keys::KeyMaterial;
pub use merkle::{MerkleProof, MerkleRoot, MerkleTree};
pub use pda::DerivedAddress;
pub use rpc::{
    JsonRpcSender, JsonRpcTransport, Rejection, RpcError, RpcTransport, TransactionStatus,
};
pub use transaction::{Signature, SignedEnvelope};

declare_id!("3dQsx7p1Fcxzr69vaewmYdb56FWtmjGzTXkxpLxo8Qfu");
