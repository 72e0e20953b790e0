use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::InstructionData;

use super::StorageAuthorityAccounts;
use crate::error::Result;
use crate::security::validation;

/// Stores one Merkle-summarized sensor batch in an initialized storage PDA.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct StoreMerkleRoot {
    pub merkle_root: [u8; 32],
    pub leaf_count: u32,
    pub metadata: String,
}

super::impl_instruction_data!(
    StoreMerkleRoot,
    "store_merkle_root",
    [40, 216, 196, 20, 103, 172, 74, 95]
);

pub fn store_merkle_root(
    program_id: &Pubkey,
    authority: &Pubkey,
    storage: &Pubkey,
    merkle_root: &[u8; 32],
    leaf_count: usize,
    metadata: &str,
) -> Result<Instruction> {
    validation::validate_metadata(metadata)?;
    let leaf_count = validation::validate_count("leaf_count", leaf_count)?;

    let accounts = StorageAuthorityAccounts {
        storage: *storage,
        authority: *authority,
    };
    let args = StoreMerkleRoot {
        merkle_root: *merkle_root,
        leaf_count,
        metadata: metadata.to_owned(),
    };

    Ok(Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: args.data(),
    })
}
