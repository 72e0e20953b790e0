use anchor_lang::solana_program::hash::hash;

use crate::constants::DISCRIMINATOR_LEN;

/// Anchor discriminator: the first 8 bytes of `sha256("<namespace>:<name>")`.
///
/// Instructions use the `global` namespace, accounts the `account` namespace
/// with the struct name.
pub fn sighash(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let preimage = format!("{namespace}:{name}");
    let mut sighash = [0u8; DISCRIMINATOR_LEN];
    sighash.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..DISCRIMINATOR_LEN]);
    sighash
}
