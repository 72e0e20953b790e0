use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::InstructionData;

use crate::error::Result;
use crate::security::validation;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct StoreCommitment {
    pub commitment: [u8; 32],
    pub metadata: String,
    /// Commitment creation time, not submission time.
    pub timestamp: u64,
}

super::impl_instruction_data!(
    StoreCommitment,
    "store_commitment",
    [188, 162, 140, 134, 138, 242, 159, 54]
);

/// Accounts shared by every instruction that mutates an initialized storage PDA.
#[derive(Clone, Copy, Debug)]
pub struct StorageAuthorityAccounts {
    pub storage: Pubkey,
    pub authority: Pubkey,
}

impl ToAccountMetas for StorageAuthorityAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.storage, false),
            AccountMeta::new_readonly(self.authority, true),
        ]
    }
}

pub fn store_commitment(
    program_id: &Pubkey,
    authority: &Pubkey,
    storage: &Pubkey,
    commitment: &[u8; 32],
    metadata: &str,
    timestamp: u64,
) -> Result<Instruction> {
    validation::validate_metadata(metadata)?;

    let accounts = StorageAuthorityAccounts {
        storage: *storage,
        authority: *authority,
    };
    let args = StoreCommitment {
        commitment: *commitment,
        metadata: metadata.to_owned(),
        timestamp,
    };

    Ok(Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: args.data(),
    })
}
