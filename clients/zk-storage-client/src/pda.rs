//! Program-derived address search.
//!
//! Mirrors the runtime's `find_program_address`: bumps are tried from 255
//! downwards and the first digest that is *not* a valid edwards25519 point
//! wins. Both the direction and the off-curve test decide which address the
//! program will accept.

use anchor_lang::prelude::Pubkey;
use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::constants::{BATCH_SEED, MAX_SEEDS, MAX_SEED_LEN, PDA_MARKER};
use crate::error::{Result, ZkStorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

impl DerivedAddress {
    /// The bump as a one-byte seed, for signing as the PDA.
    pub fn bump_seed(&self) -> [u8; 1] {
        [self.bump]
    }
}

/// Hashes `seeds || [bump] || program_id || PDA_MARKER`.
///
/// Returns `Ok(None)` when the digest lands on the curve and therefore
/// cannot be used as a PDA.
pub fn create_program_address(
    seeds: &[&[u8]],
    bump: u8,
    program_id: &Pubkey,
) -> Result<Option<Pubkey>> {
    validate_seeds(seeds)?;
    Ok(hash_candidate(seeds, bump, program_id))
}

pub fn derive(seeds: &[&[u8]], program_id: &Pubkey) -> Result<DerivedAddress> {
    validate_seeds(seeds)?;
    for bump in (0..=u8::MAX).rev() {
        if let Some(address) = hash_candidate(seeds, bump, program_id) {
            debug!(%address, bump, %program_id, "derived program address");
            return Ok(DerivedAddress { address, bump });
        }
    }
    Err(ZkStorageError::DerivationExhausted)
}

/// Storage account: `[seed_name, authority]`.
pub fn storage_address(
    seed_name: &str,
    authority: &Pubkey,
    program_id: &Pubkey,
) -> Result<DerivedAddress> {
    derive(&[seed_name.as_bytes(), authority.as_ref()], program_id)
}

/// Batch account: `[b"batch", batch_root, authority]`.
pub fn batch_address(
    batch_root: &[u8; 32],
    authority: &Pubkey,
    program_id: &Pubkey,
) -> Result<DerivedAddress> {
    derive(&[BATCH_SEED, &batch_root[..], authority.as_ref()], program_id)
}

pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

fn hash_candidate(seeds: &[&[u8]], bump: u8, program_id: &Pubkey) -> Option<Pubkey> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);
    let digest: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&digest) {
        None
    } else {
        Some(Pubkey::new_from_array(digest))
    }
}

fn validate_seeds(seeds: &[&[u8]]) -> Result<()> {
    // the bump occupies the last seed slot
    if seeds.len() >= MAX_SEEDS {
        return Err(ZkStorageError::InvalidSeeds(format!(
            "{} seeds given, at most {} allowed",
            seeds.len(),
            MAX_SEEDS - 1
        )));
    }
    if let Some((index, seed)) = seeds
        .iter()
        .enumerate()
        .find(|(_, seed)| seed.len() > MAX_SEED_LEN)
    {
        return Err(ZkStorageError::InvalidSeeds(format!(
            "seed {index} is {} bytes, maximum is {MAX_SEED_LEN}",
            seed.len()
        )));
    }
    Ok(())
}
