mod batch_storage;
mod zk_storage;

pub use batch_storage::*;
pub use zk_storage::*;

use anchor_lang::AccountDeserialize;

use crate::error::{Result, ZkStorageError};

/// Decodes raw account data, checking the 8-byte account discriminator.
pub fn decode_account<T: AccountDeserialize>(data: &[u8]) -> Result<T> {
    let mut cursor = data;
    T::try_deserialize(&mut cursor).map_err(|err| ZkStorageError::Decode(err.to_string()))
}
