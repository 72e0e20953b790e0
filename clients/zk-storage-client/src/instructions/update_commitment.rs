use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::InstructionData;

use super::StorageAuthorityAccounts;
use crate::error::Result;
use crate::security::validation;

/// Same layout as [`super::StoreCommitment`]; targets an already-initialized account.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct UpdateCommitment {
    pub new_commitment: [u8; 32],
    pub metadata: String,
    pub timestamp: u64,
}

super::impl_instruction_data!(
    UpdateCommitment,
    "update_commitment",
    [57, 185, 84, 54, 212, 14, 153, 0]
);

pub fn update_commitment(
    program_id: &Pubkey,
    authority: &Pubkey,
    storage: &Pubkey,
    new_commitment: &[u8; 32],
    metadata: &str,
    timestamp: u64,
) -> Result<Instruction> {
    validation::validate_metadata(metadata)?;

    let accounts = StorageAuthorityAccounts {
        storage: *storage,
        authority: *authority,
    };
    let args = UpdateCommitment {
        new_commitment: *new_commitment,
        metadata: metadata.to_owned(),
        timestamp,
    };

    Ok(Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: args.data(),
    })
}
