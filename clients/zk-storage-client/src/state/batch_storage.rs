use anchor_lang::prelude::*;

/// Account created per batch by `store_batch`
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct BatchStorage {
    pub authority: Pubkey,
    pub batch_root: [u8; 32],
    pub batch_size: u32,
    pub metadata: String,
    pub timestamp: u64,
    pub bump: u8,
}
