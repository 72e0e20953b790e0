use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::system_program;
use anchor_lang::InstructionData;

use crate::error::Result;
use crate::security::validation;

/// Creates the storage PDA `[seed_name, authority]`, paid for by the authority.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct InitializeStorage {
    pub seed_name: String,
}

super::impl_instruction_data!(
    InitializeStorage,
    "initialize_storage",
    [190, 129, 110, 149, 188, 153, 142, 131]
);

#[derive(Clone, Copy, Debug)]
pub struct InitializeStorageAccounts {
    pub storage: Pubkey,
    pub authority: Pubkey,
    pub system_program: Pubkey,
}

impl ToAccountMetas for InitializeStorageAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.storage, false),
            // fee payer
            AccountMeta::new(self.authority, true),
            AccountMeta::new_readonly(self.system_program, false),
        ]
    }
}

pub fn initialize_storage(
    program_id: &Pubkey,
    authority: &Pubkey,
    storage: &Pubkey,
    seed_name: &str,
) -> Result<Instruction> {
    validation::validate_seed_name(seed_name)?;

    let accounts = InitializeStorageAccounts {
        storage: *storage,
        authority: *authority,
        system_program: system_program::ID,
    };
    let args = InitializeStorage {
        seed_name: seed_name.to_owned(),
    };

    Ok(Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: args.data(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZkStorageError;
    use crate::pda;
    use anchor_lang::Discriminator;

    #[test]
    fn encodes_seed_name_after_discriminator() {
        let authority = Pubkey::new_from_array([3u8; 32]);
        let storage = pda::storage_address("zk_test_123456", &authority, &crate::ID).unwrap();
        let ix = initialize_storage(&crate::ID, &authority, &storage.address, "zk_test_123456")
            .unwrap();

        assert_eq!(ix.program_id, crate::ID);
        assert_eq!(&ix.data[..8], InitializeStorage::DISCRIMINATOR);
        // borsh string: u32 little-endian length, then bytes
        assert_eq!(&ix.data[8..12], &14u32.to_le_bytes());
        assert_eq!(&ix.data[12..], b"zk_test_123456");

        assert_eq!(ix.accounts.len(), 3);
        assert_eq!(ix.accounts[0], AccountMeta::new(storage.address, false));
        assert_eq!(ix.accounts[1], AccountMeta::new(authority, true));
        assert_eq!(ix.accounts[2], AccountMeta::new_readonly(system_program::ID, false));
    }

    #[test]
    fn rejects_seed_names_that_cannot_be_pda_seeds() {
        let authority = Pubkey::new_from_array([3u8; 32]);
        let err = initialize_storage(&crate::ID, &authority, &authority, &"n".repeat(33))
            .unwrap_err();
        assert!(matches!(err, ZkStorageError::PayloadTooLarge { .. }));
    }
}
