//! Legacy transaction envelope: message compilation, wire format and signing.
//!
//! Wire layout (all array lengths are compact-u16):
//!
//! ```text
//! transaction = [signature] || message
//! message     = header(3) || [account key] || recent blockhash(32) || [instruction]
//! instruction = program id index(1) || [account index] || [data byte]
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::hash::Hash;
use anchor_lang::solana_program::instruction::Instruction;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::base58;
use crate::error::{Result, ZkStorageError};
use crate::keys::KeyMaterial;

/// Largest serialized transaction the network accepts.
pub const PACKET_DATA_SIZE: usize = 1232;

pub const SIGNATURE_LEN: usize = 64;

/// Account indices are a single byte.
const MAX_ACCOUNT_KEYS: usize = 256;

/// Ed25519 signature; the first one on a transaction is its identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub const fn new(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = ZkStorageError;

    fn from_str(s: &str) -> Result<Self> {
        base58::decode_array::<SIGNATURE_LEN>(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

#[derive(Debug, Clone, Copy, Default)]
struct KeyFlags {
    is_signer: bool,
    is_writable: bool,
}

impl Message {
    /// Orders keys the way the runtime expects: fee payer, writable signers,
    /// read-only signers, writable non-signers, read-only non-signers. Keys
    /// inside a class are sorted by their bytes.
    pub fn compile(
        instructions: &[Instruction],
        payer: &Pubkey,
        recent_blockhash: Hash,
    ) -> Result<Self> {
        let mut flags: BTreeMap<Pubkey, KeyFlags> = BTreeMap::new();
        for ix in instructions {
            flags.entry(ix.program_id).or_default();
            for meta in &ix.accounts {
                let entry = flags.entry(meta.pubkey).or_default();
                entry.is_signer |= meta.is_signer;
                entry.is_writable |= meta.is_writable;
            }
        }
        flags.remove(payer);

        let class = |signer: bool, writable: bool| -> Vec<Pubkey> {
            flags
                .iter()
                .filter(|(_, f)| f.is_signer == signer && f.is_writable == writable)
                .map(|(key, _)| *key)
                .collect()
        };
        let writable_signers = class(true, true);
        let readonly_signers = class(true, false);
        let writable_unsigned = class(false, true);
        let readonly_unsigned = class(false, false);

        let mut account_keys = Vec::with_capacity(flags.len() + 1);
        account_keys.push(*payer);
        account_keys.extend(writable_signers.iter().copied());
        account_keys.extend(readonly_signers.iter().copied());
        account_keys.extend(writable_unsigned);
        account_keys.extend(readonly_unsigned.iter().copied());

        if account_keys.len() > MAX_ACCOUNT_KEYS {
            return Err(ZkStorageError::PayloadTooLarge {
                field: "account_keys",
                len: account_keys.len(),
                max: MAX_ACCOUNT_KEYS,
            });
        }

        let header = MessageHeader {
            num_required_signatures: (1 + writable_signers.len() + readonly_signers.len()) as u8,
            num_readonly_signed_accounts: readonly_signers.len() as u8,
            num_readonly_unsigned_accounts: readonly_unsigned.len() as u8,
        };

        let positions = key_positions(&account_keys);
        let instructions = instructions
            .iter()
            .map(|ix| compile_instruction(ix, &positions))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    pub fn fee_payer(&self) -> &Pubkey {
        &self.account_keys[0]
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PACKET_DATA_SIZE);
        out.push(self.header.num_required_signatures);
        out.push(self.header.num_readonly_signed_accounts);
        out.push(self.header.num_readonly_unsigned_accounts);

        encode_compact_u16(self.account_keys.len() as u16, &mut out);
        for key in &self.account_keys {
            out.extend_from_slice(key.as_ref());
        }
        out.extend_from_slice(self.recent_blockhash.as_ref());

        encode_compact_u16(self.instructions.len() as u16, &mut out);
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            encode_compact_u16(ix.accounts.len() as u16, &mut out);
            out.extend_from_slice(&ix.accounts);
            encode_compact_u16(ix.data.len() as u16, &mut out);
            out.extend_from_slice(&ix.data);
        }
        out
    }
}

/// Index of every key in `account_keys`; callers cap the list at 256 keys.
fn key_positions(account_keys: &[Pubkey]) -> HashMap<Pubkey, u8> {
    account_keys
        .iter()
        .enumerate()
        .map(|(index, key)| (*key, index as u8))
        .collect()
}

fn compile_instruction(
    ix: &Instruction,
    positions: &HashMap<Pubkey, u8>,
) -> Result<CompiledInstruction> {
    let index_of = |key: &Pubkey| {
        positions.get(key).copied().ok_or_else(|| {
            ZkStorageError::Serialization(format!("account {key} is missing from the message keys"))
        })
    };
    Ok(CompiledInstruction {
        program_id_index: index_of(&ix.program_id)?,
        accounts: ix
            .accounts
            .iter()
            .map(|meta| index_of(&meta.pubkey))
            .collect::<Result<Vec<_>>>()?,
        data: ix.data.clone(),
    })
}

/// A message signed by its fee payer, ready for `sendTransaction`.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

impl SignedEnvelope {
    pub fn sign(message: Message, signer: &KeyMaterial) -> Result<Self> {
        if message.fee_payer() != &signer.pubkey() {
            return Err(ZkStorageError::Signing(format!(
                "fee payer {} is not the signer {}",
                message.fee_payer(),
                signer.pubkey()
            )));
        }
        if message.header.num_required_signatures != 1 {
            return Err(ZkStorageError::Signing(format!(
                "message needs {} signatures, only the fee payer signs",
                message.header.num_required_signatures
            )));
        }

        let signature = Signature(signer.sign(&message.serialize()));
        let envelope = Self {
            signatures: vec![signature],
            message,
        };

        let len = envelope.serialize().len();
        if len > PACKET_DATA_SIZE {
            return Err(ZkStorageError::PayloadTooLarge {
                field: "transaction",
                len,
                max: PACKET_DATA_SIZE,
            });
        }
        Ok(envelope)
    }

    /// Transaction identifier.
    pub fn signature(&self) -> Signature {
        self.signatures[0]
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PACKET_DATA_SIZE);
        encode_compact_u16(self.signatures.len() as u16, &mut out);
        for signature in &self.signatures {
            out.extend_from_slice(signature.as_bytes());
        }
        out.extend_from_slice(&self.message.serialize());
        out
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.serialize())
    }
}

pub fn encode_compact_u16(mut value: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}
