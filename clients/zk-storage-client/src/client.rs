//! Transaction submission and the storage workflows built on top of it.

use std::fmt;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use tracing::{debug, info, warn};

use crate::commitment::Commitment;
use crate::config::{ClientConfig, ConfirmationPolicy};
use crate::error::{Result, ZkStorageError};
use crate::instructions;
use crate::keys::KeyMaterial;
use crate::merkle::MerkleRoot;
use crate::pda::{self, DerivedAddress};
use crate::rpc::{Rejection, RpcError, RpcTransport, TransactionStatus};
use crate::state::{decode_account, BatchStorage, ZKStorage};
use crate::transaction::{Message, Signature, SignedEnvelope};

/// Lifecycle of one submission. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmissionState {
    Built,
    Signed,
    Submitted,
    Confirmed,
    Rejected,
    TimedOut,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionState::Built => "built",
            SubmissionState::Signed => "signed",
            SubmissionState::Submitted => "submitted",
            SubmissionState::Confirmed => "confirmed",
            SubmissionState::Rejected => "rejected",
            SubmissionState::TimedOut => "timed_out",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Confirmed,
    /// Refused by the ledger, either at preflight or after landing.
    Rejected(Rejection),
    /// Still unconfirmed after every polling attempt. The transaction may
    /// yet land; this is not a rejection.
    TimedOut { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub signature: Signature,
    pub status: SubmissionStatus,
}

impl SubmissionResult {
    pub fn confirmed(&self) -> bool {
        self.status == SubmissionStatus::Confirmed
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.status {
            SubmissionStatus::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.status, SubmissionStatus::TimedOut { .. })
    }
}

/// Builds, signs, sends and confirms transactions one at a time.
///
/// `submit` takes `&mut self`, so a single client never has two submissions
/// in flight.
pub struct TransactionClient<T> {
    transport: T,
    policy: ConfirmationPolicy,
}

impl<T: RpcTransport> TransactionClient<T> {
    pub fn new(transport: T, policy: ConfirmationPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    pub async fn submit(
        &mut self,
        instructions: &[Instruction],
        signer: &KeyMaterial,
    ) -> Result<SubmissionResult> {
        if instructions.is_empty() {
            return Err(ZkStorageError::Serialization(
                "transaction has no instructions".into(),
            ));
        }

        let anchor = self.transport.get_recent_anchor().await?;
        let message = Message::compile(instructions, &signer.pubkey(), anchor)?;
        trace_state(None, SubmissionState::Built);

        let envelope = SignedEnvelope::sign(message, signer)?;
        let signature = envelope.signature();
        trace_state(Some(&signature), SubmissionState::Signed);

        match self.transport.send_transaction(&envelope).await {
            Ok(returned) if returned != signature => {
                warn!(%signature, %returned, "node returned a different signature");
            }
            Ok(_) => {}
            Err(RpcError::Rejected(rejection)) => {
                return Ok(self.rejected(signature, rejection));
            }
            Err(RpcError::Transport(message)) => {
                warn!(%signature, error = %message, "send failed");
                return Err(ZkStorageError::Transport(message));
            }
        }
        trace_state(Some(&signature), SubmissionState::Submitted);

        self.await_confirmation(signature).await
    }

    async fn await_confirmation(&self, signature: Signature) -> Result<SubmissionResult> {
        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.poll_interval()).await;
            // A transport error after sending uses up an attempt, nothing more.
            match self.transport.get_transaction_status(&signature).await {
                Ok(TransactionStatus::Pending) => {
                    debug!(%signature, attempt, "awaiting confirmation");
                }
                Err(RpcError::Transport(message)) => {
                    warn!(%signature, attempt, error = %message, "status poll failed");
                }
                Err(RpcError::Rejected(rejection)) => {
                    return Ok(self.rejected(signature, rejection));
                }
                Ok(TransactionStatus::Confirmed) => {
                    trace_state(Some(&signature), SubmissionState::Confirmed);
                    return Ok(SubmissionResult {
                        signature,
                        status: SubmissionStatus::Confirmed,
                    });
                }
                Ok(TransactionStatus::Failed(rejection)) => {
                    return Ok(self.rejected(signature, rejection));
                }
            }
        }

        trace_state(Some(&signature), SubmissionState::TimedOut);
        Ok(SubmissionResult {
            signature,
            status: SubmissionStatus::TimedOut {
                attempts: self.policy.max_attempts,
            },
        })
    }

    fn rejected(&self, signature: Signature, rejection: Rejection) -> SubmissionResult {
        warn!(%signature, reason = %rejection, "transaction rejected");
        trace_state(Some(&signature), SubmissionState::Rejected);
        SubmissionResult {
            signature,
            status: SubmissionStatus::Rejected(rejection),
        }
    }
}

fn trace_state(signature: Option<&Signature>, state: SubmissionState) {
    match signature {
        Some(signature) => debug!(%signature, %state, "submission state"),
        None => debug!(%state, "submission state"),
    }
}

/// Result of a storage workflow: where it wrote, and how the write went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
    pub address: DerivedAddress,
    pub submission: SubmissionResult,
}

impl WorkflowOutcome {
    pub fn confirmed(&self) -> bool {
        self.submission.confirmed()
    }
}

/// High-level operations against the `zk_storage` program.
///
/// Key material stays with the caller and is only borrowed per call.
pub struct ZkStorageClient<T> {
    program_id: Pubkey,
    client: TransactionClient<T>,
}

impl<T: RpcTransport> ZkStorageClient<T> {
    pub fn new(config: &ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            program_id: config.program_id()?,
            client: TransactionClient::new(transport, config.confirmation),
        })
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn transaction_client(&mut self) -> &mut TransactionClient<T> {
        &mut self.client
    }

    pub fn storage_address(&self, seed_name: &str, authority: &Pubkey) -> Result<DerivedAddress> {
        pda::storage_address(seed_name, authority, &self.program_id)
    }

    pub fn batch_address(
        &self,
        batch_root: &MerkleRoot,
        authority: &Pubkey,
    ) -> Result<DerivedAddress> {
        pda::batch_address(&batch_root.to_bytes(), authority, &self.program_id)
    }

    /// Creates the storage account for `seed_name`.
    ///
    /// An account that already exists comes back as `Rejected` with
    /// [`Rejection::is_already_initialized`] set; callers can carry on.
    pub async fn initialize_storage(
        &mut self,
        seed_name: &str,
        signer: &KeyMaterial,
    ) -> Result<WorkflowOutcome> {
        let authority = signer.pubkey();
        let address = self.storage_address(seed_name, &authority)?;
        let instruction = instructions::initialize_storage(
            &self.program_id,
            &authority,
            &address.address,
            seed_name,
        )?;
        info!(seed_name, storage = %address.address, "initializing storage");
        self.run(address, instruction, signer).await
    }

    pub async fn store_commitment(
        &mut self,
        seed_name: &str,
        commitment: &Commitment,
        metadata: &str,
        signer: &KeyMaterial,
    ) -> Result<WorkflowOutcome> {
        let authority = signer.pubkey();
        let address = self.storage_address(seed_name, &authority)?;
        let instruction = instructions::store_commitment(
            &self.program_id,
            &authority,
            &address.address,
            &commitment.digest,
            metadata,
            commitment.timestamp,
        )?;
        info!(seed_name, digest = %commitment.digest_hex(), "storing commitment");
        self.run(address, instruction, signer).await
    }

    pub async fn update_commitment(
        &mut self,
        seed_name: &str,
        commitment: &Commitment,
        metadata: &str,
        signer: &KeyMaterial,
    ) -> Result<WorkflowOutcome> {
        let authority = signer.pubkey();
        let address = self.storage_address(seed_name, &authority)?;
        let instruction = instructions::update_commitment(
            &self.program_id,
            &authority,
            &address.address,
            &commitment.digest,
            metadata,
            commitment.timestamp,
        )?;
        info!(seed_name, digest = %commitment.digest_hex(), "updating commitment");
        self.run(address, instruction, signer).await
    }

    pub async fn store_merkle_root(
        &mut self,
        seed_name: &str,
        root: &MerkleRoot,
        leaf_count: usize,
        metadata: &str,
        signer: &KeyMaterial,
    ) -> Result<WorkflowOutcome> {
        let authority = signer.pubkey();
        let address = self.storage_address(seed_name, &authority)?;
        let instruction = instructions::store_merkle_root(
            &self.program_id,
            &authority,
            &address.address,
            &root.to_bytes(),
            leaf_count,
            metadata,
        )?;
        info!(seed_name, %root, leaf_count, "storing merkle root");
        self.run(address, instruction, signer).await
    }

    /// Anchors a batch root in its own account, derived from the root itself.
    pub async fn store_batch(
        &mut self,
        batch_root: &MerkleRoot,
        commitment_count: usize,
        metadata: &str,
        signer: &KeyMaterial,
    ) -> Result<WorkflowOutcome> {
        let authority = signer.pubkey();
        let address = self.batch_address(batch_root, &authority)?;
        let instruction = instructions::store_batch(
            &self.program_id,
            &authority,
            &address.address,
            &batch_root.to_bytes(),
            commitment_count,
            metadata,
        )?;
        info!(root = %batch_root, commitment_count, "storing batch");
        self.run(address, instruction, signer).await
    }

    /// Asks the program to recompute the stored digest from a reveal.
    ///
    /// Succeeds only if the account holds [`crate::commitment::ledger_digest`]
    /// of the same inputs; a mismatch is rejected with `InvalidCommitment`.
    pub async fn verify_commitment(
        &mut self,
        seed_name: &str,
        data: &str,
        secret: &str,
        nonce: &str,
        signer: &KeyMaterial,
    ) -> Result<WorkflowOutcome> {
        let authority = signer.pubkey();
        let address = self.storage_address(seed_name, &authority)?;
        let instruction = instructions::verify_commitment(
            &self.program_id,
            &authority,
            &address.address,
            data,
            secret,
            nonce,
        )?;
        info!(seed_name, "verifying commitment on-chain");
        self.run(address, instruction, signer).await
    }

    /// Reads back a storage account, or `None` if it has not been created.
    pub async fn fetch_storage(
        &self,
        seed_name: &str,
        authority: &Pubkey,
    ) -> Result<Option<ZKStorage>> {
        let address = self.storage_address(seed_name, authority)?;
        self.fetch(&address.address).await
    }

    pub async fn fetch_batch(
        &self,
        batch_root: &MerkleRoot,
        authority: &Pubkey,
    ) -> Result<Option<BatchStorage>> {
        let address = self.batch_address(batch_root, authority)?;
        self.fetch(&address.address).await
    }

    async fn fetch<A: anchor_lang::AccountDeserialize>(&self, address: &Pubkey) -> Result<Option<A>> {
        match self.client.transport().get_account_data(address).await? {
            Some(data) => decode_account(&data).map(Some),
            None => Ok(None),
        }
    }

    async fn run(
        &mut self,
        address: DerivedAddress,
        instruction: Instruction,
        signer: &KeyMaterial,
    ) -> Result<WorkflowOutcome> {
        let submission = self.client.submit(&[instruction], signer).await?;
        Ok(WorkflowOutcome {
            address,
            submission,
        })
    }
}
