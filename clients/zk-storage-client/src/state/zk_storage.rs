use anchor_lang::prelude::*;

/// Storage PDA written by `initialize_storage` and the store/update instructions
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct ZKStorage {
    pub authority: Pubkey,
    pub seed_name: String,
    /// Latest commitment digest or Merkle root
    pub commitment: [u8; 32],
    pub metadata: String,
    pub timestamp: u64,
    pub bump: u8,
    pub is_initialized: bool,
}

impl ZKStorage {
    /// Prefix the program puts in front of metadata when storing a Merkle root.
    pub const MERKLE_METADATA_PREFIX: &'static str = "merkle_leaves:";

    /// Leaf count recorded by `store_merkle_root`, if the account holds a root.
    pub fn merkle_leaf_count(&self) -> Option<u32> {
        let rest = self.metadata.strip_prefix(Self::MERKLE_METADATA_PREFIX)?;
        let (count, _) = rest.split_once(',')?;
        count.parse().ok()
    }
}
