use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::system_program;
use anchor_lang::InstructionData;

use crate::error::Result;
use crate::security::validation;

/// Many independent commitments compressed into one root.
///
/// Same shape as [`super::StoreMerkleRoot`], but it creates its own
/// `[b"batch", batch_root, authority]` account rather than writing to a
/// storage PDA.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct StoreBatch {
    pub batch_root: [u8; 32],
    pub batch_size: u32,
    pub metadata: String,
}

super::impl_instruction_data!(
    StoreBatch,
    "store_batch",
    [76, 65, 183, 124, 253, 177, 208, 199]
);

#[derive(Clone, Copy, Debug)]
pub struct StoreBatchAccounts {
    pub batch_storage: Pubkey,
    pub authority: Pubkey,
    pub system_program: Pubkey,
}

impl ToAccountMetas for StoreBatchAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.batch_storage, false),
            AccountMeta::new(self.authority, true),
            AccountMeta::new_readonly(self.system_program, false),
        ]
    }
}

pub fn store_batch(
    program_id: &Pubkey,
    authority: &Pubkey,
    batch_storage: &Pubkey,
    batch_root: &[u8; 32],
    commitment_count: usize,
    metadata: &str,
) -> Result<Instruction> {
    validation::validate_batch_metadata(metadata)?;
    let batch_size = validation::validate_count("commitment_count", commitment_count)?;

    let accounts = StoreBatchAccounts {
        batch_storage: *batch_storage,
        authority: *authority,
        system_program: system_program::ID,
    };
    let args = StoreBatch {
        batch_root: *batch_root,
        batch_size,
        metadata: metadata.to_owned(),
    };

    Ok(Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: args.data(),
    })
}
