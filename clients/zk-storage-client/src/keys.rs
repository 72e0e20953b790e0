use anchor_lang::prelude::Pubkey;
use ed25519_dalek::{Signer, SigningKey};

use crate::base58;
use crate::error::{Result, ZkStorageError};

/// Signing key and the address it controls.
///
/// Immutable once built. The transaction client only borrows it while signing.
pub struct KeyMaterial {
    signing_key: SigningKey,
    pubkey: Pubkey,
}

impl KeyMaterial {
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let pubkey = Pubkey::new_from_array(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            pubkey,
        }
    }

    /// Builds key material from a base58 private key and the base58 address it
    /// is expected to control.
    ///
    /// The private key may be the bare 32-byte secret or the 64-byte
    /// `secret || public` keypair layout used by Solana tooling.
    pub fn from_base58(private_key: &str, public_key: &str) -> Result<Self> {
        let expected = base58::decode_pubkey(public_key)?;
        let raw = base58::decode(private_key)?;

        let secret: [u8; 32] = match raw.len() {
            32 => raw[..].try_into().map_err(|_| bad_length(raw.len()))?,
            64 => {
                if raw[32..] != expected.to_bytes()[..] {
                    return Err(ZkStorageError::Decode(
                        "keypair public half does not match public key".into(),
                    ));
                }
                raw[..32].try_into().map_err(|_| bad_length(raw.len()))?
            }
            len => return Err(bad_length(len)),
        };

        let keys = Self::from_secret_bytes(&secret);
        if keys.pubkey != expected {
            return Err(ZkStorageError::Decode(format!(
                "private key controls {}, not {}",
                keys.pubkey, expected
            )));
        }
        Ok(keys)
    }

    pub fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}

fn bad_length(len: usize) -> ZkStorageError {
    ZkStorageError::Decode(format!("private key must be 32 or 64 bytes, decoded {len}"))
}
