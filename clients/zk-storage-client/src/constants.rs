/// Domain separator appended after the program id when hashing PDA seeds.
pub const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Maximum length of a single PDA seed.
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds accepted by the runtime (the bump counts as one).
pub const MAX_SEEDS: usize = 16;

pub const BATCH_SEED: &[u8] = b"batch";

/// Width of the random nonce drawn for every commitment.
pub const NONCE_LEN: usize = 16;

pub const DIGEST_LEN: usize = 32;

/// Seed name cap enforced by the program. PDA seeds are tighter still, see [`MAX_SEED_LEN`].
pub const MAX_SEED_NAME_LEN: usize = 50;

pub const MAX_METADATA_LEN: usize = 500;

pub const MAX_BATCH_METADATA_LEN: usize = 200;

/// Anchor offsets custom program errors by this much.
pub const PROGRAM_ERROR_OFFSET: u32 = 6000;

/// Length of an Anchor instruction / account discriminator.
pub const DISCRIMINATOR_LEN: usize = 8;
