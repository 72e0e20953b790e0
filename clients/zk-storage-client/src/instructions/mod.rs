//! Instruction encoders for the `zk_storage` program.
//!
//! Every builder is pure: it validates sizes, then returns an
//! [`Instruction`](anchor_lang::solana_program::instruction::Instruction)
//! whose data is the 8-byte Anchor discriminator followed by the
//! borsh-encoded arguments.

pub mod initialize_storage;
pub mod store_batch;
pub mod store_commitment;
pub mod store_merkle_root;
pub mod update_commitment;
pub mod verify_commitment;

pub use initialize_storage::*;
pub use store_batch::*;
pub use store_commitment::*;
pub use store_merkle_root::*;
pub use update_commitment::*;
pub use verify_commitment::*;

/// Wires an argument struct to its instruction discriminator.
macro_rules! impl_instruction_data {
    ($t:ty, $name:literal, $discriminator:expr) => {
        impl anchor_lang::Discriminator for $t {
            const DISCRIMINATOR: &'static [u8] = &$discriminator;
        }

        impl anchor_lang::InstructionData for $t {}

        impl $t {
            /// Instruction name in the program's IDL.
            pub const NAME: &'static str = $name;
        }
    };
}

pub(crate) use impl_instruction_data;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sighash;
    use anchor_lang::Discriminator;

    fn assert_discriminator<T: Discriminator>(name: &str) {
        assert_eq!(T::DISCRIMINATOR, &sighash("global", name)[..], "{name}");
    }

    #[test]
    fn discriminators_follow_anchor_sighash() {
        assert_discriminator::<InitializeStorage>(InitializeStorage::NAME);
        assert_discriminator::<StoreCommitment>(StoreCommitment::NAME);
        assert_discriminator::<UpdateCommitment>(UpdateCommitment::NAME);
        assert_discriminator::<StoreMerkleRoot>(StoreMerkleRoot::NAME);
        assert_discriminator::<StoreBatch>(StoreBatch::NAME);
        assert_discriminator::<VerifyCommitment>(VerifyCommitment::NAME);
    }
}
