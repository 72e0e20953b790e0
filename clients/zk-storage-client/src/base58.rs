//! Base58 (Bitcoin alphabet) and digest-hex codecs.
//!
//! Fixed-size decoders never pad or truncate: a string that decodes to the
//! wrong number of bytes is a [`ZkStorageError::Decode`].

use anchor_lang::prelude::Pubkey;

use crate::constants::DIGEST_LEN;
use crate::error::{Result, ZkStorageError};

pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    bs58::encode(bytes).into_string()
}

pub fn decode(text: &str) -> Result<Vec<u8>> {
    bs58::decode(text)
        .into_vec()
        .map_err(|err| ZkStorageError::Decode(format!("invalid base58: {err}")))
}

/// Decodes into exactly `N` bytes.
pub fn decode_array<const N: usize>(text: &str) -> Result<[u8; N]> {
    let bytes = decode(text)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        ZkStorageError::Decode(format!("expected {N} bytes, decoded {len}"))
    })
}

pub fn decode_32(text: &str) -> Result<[u8; 32]> {
    decode_array::<32>(text)
}

pub fn decode_pubkey(text: &str) -> Result<Pubkey> {
    decode_32(text).map(Pubkey::new_from_array)
}

/// 64 lowercase hex characters.
pub fn digest_to_hex(digest: &[u8; DIGEST_LEN]) -> String {
    hex::encode(digest)
}

pub fn digest_from_hex(text: &str) -> Result<[u8; DIGEST_LEN]> {
    if text.len() != DIGEST_LEN * 2 {
        return Err(ZkStorageError::Decode(format!(
            "digest hex must be {} characters, got {}",
            DIGEST_LEN * 2,
            text.len()
        )));
    }
    let mut digest = [0u8; DIGEST_LEN];
    hex::decode_to_slice(text, &mut digest)
        .map_err(|err| ZkStorageError::Decode(format!("invalid hex digest: {err}")))?;
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM_ID: &str = "3dQsx7p1Fcxzr69vaewmYdb56FWtmjGzTXkxpLxo8Qfu";

    #[test]
    fn round_trips_32_bytes() {
        for seed in [0u8, 1, 0x7f, 0xff] {
            let bytes = [seed; 32];
            assert_eq!(decode_32(&encode(bytes)).unwrap(), bytes);
        }
        let mut ascending = [0u8; 32];
        for (i, b) in ascending.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        assert_eq!(encode(ascending), "4wBqpZM9xaSheZzJSMawUKKwhdpChKbZ5eu5ky4Vigw");
        assert_eq!(decode_32(&encode(ascending)).unwrap(), ascending);
    }

    #[test]
    fn agrees_with_pubkey_display() {
        let key = decode_pubkey(PROGRAM_ID).unwrap();
        assert_eq!(key.to_string(), PROGRAM_ID);
        assert_eq!(key, crate::ID);
    }

    #[test]
    fn leading_zero_bytes_become_ones() {
        assert_eq!(encode([0u8; 32]), "11111111111111111111111111111111");
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        for bad in ["0OIl", "abc0", "O", "Il"] {
            assert!(matches!(decode(bad), Err(ZkStorageError::Decode(_))));
        }
    }

    #[test]
    fn rejects_wrong_length() {
        let short = encode([9u8; 31]);
        let long = encode([9u8; 33]);
        assert!(matches!(decode_32(&short), Err(ZkStorageError::Decode(_))));
        assert!(matches!(decode_32(&long), Err(ZkStorageError::Decode(_))));
        assert!(matches!(decode_32(""), Err(ZkStorageError::Decode(_))));
    }

    #[test]
    fn hex_digest_round_trip() {
        let digest = [0xabu8; 32];
        let text = digest_to_hex(&digest);
        assert_eq!(text.len(), 64);
        assert_eq!(text, text.to_lowercase());
        assert_eq!(digest_from_hex(&text).unwrap(), digest);
    }

    #[test]
    fn hex_digest_rejects_bad_input() {
        assert!(digest_from_hex("ab").is_err());
        assert!(digest_from_hex(&"zz".repeat(32)).is_err());
        assert!(digest_from_hex(&"ab".repeat(33)).is_err());
    }
}
