use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::InstructionData;

use crate::error::Result;

/// Reveals a commitment so the program can recompute it on-chain.
///
/// The program checks `sha256(data || secret || nonce || timestamp)` against
/// the stored digest, see [`crate::commitment::ledger_digest`].
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VerifyCommitment {
    pub data: String,
    pub secret: String,
    pub nonce: String,
}

super::impl_instruction_data!(
    VerifyCommitment,
    "verify_commitment",
    [174, 124, 14, 57, 60, 80, 196, 146]
);

#[derive(Clone, Copy, Debug)]
pub struct VerifyCommitmentAccounts {
    pub storage: Pubkey,
    pub authority: Pubkey,
}

impl ToAccountMetas for VerifyCommitmentAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new_readonly(self.storage, false),
            AccountMeta::new_readonly(self.authority, true),
        ]
    }
}

pub fn verify_commitment(
    program_id: &Pubkey,
    authority: &Pubkey,
    storage: &Pubkey,
    data: &str,
    secret: &str,
    nonce: &str,
) -> Result<Instruction> {
    let accounts = VerifyCommitmentAccounts {
        storage: *storage,
        authority: *authority,
    };
    let args = VerifyCommitment {
        data: data.to_owned(),
        secret: secret.to_owned(),
        nonce: nonce.to_owned(),
    };

    Ok(Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: args.data(),
    })
}
