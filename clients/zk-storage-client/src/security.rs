use crate::constants::{MAX_BATCH_METADATA_LEN, MAX_METADATA_LEN, MAX_SEED_LEN, MAX_SEED_NAME_LEN};
use crate::error::{Result, ZkStorageError};

// Size limits enforced client-side before anything is sent

/// Security validation functions
pub mod validation {
    use super::*;

    /// Seed names double as PDA seeds, so the PDA limit applies on top of the
    /// program's own cap.
    pub fn validate_seed_name(seed_name: &str) -> Result<()> {
        let max = MAX_SEED_NAME_LEN.min(MAX_SEED_LEN);
        require_len("seed_name", seed_name.len(), max)
    }

    /// Metadata attached to store/update/merkle-root instructions
    pub fn validate_metadata(metadata: &str) -> Result<()> {
        require_len("metadata", metadata.len(), MAX_METADATA_LEN)
    }

    /// Metadata attached to store-batch instructions
    pub fn validate_batch_metadata(metadata: &str) -> Result<()> {
        require_len("metadata", metadata.len(), MAX_BATCH_METADATA_LEN)
    }

    /// Leaf / commitment counts travel as `u32`
    pub fn validate_count(field: &'static str, count: usize) -> Result<u32> {
        u32::try_from(count).map_err(|_| ZkStorageError::PayloadTooLarge {
            field,
            len: count,
            max: u32::MAX as usize,
        })
    }

    fn require_len(field: &'static str, len: usize, max: usize) -> Result<()> {
        if len > max {
            return Err(ZkStorageError::PayloadTooLarge { field, len, max });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn seed_name_is_capped_by_pda_seed_limit() {
        assert!(validate_seed_name(&"s".repeat(MAX_SEED_LEN)).is_ok());
        assert!(matches!(
            validate_seed_name(&"s".repeat(MAX_SEED_LEN + 1)),
            Err(ZkStorageError::PayloadTooLarge { field: "seed_name", max: 32, .. })
        ));
    }

    #[test]
    fn metadata_limits() {
        assert!(validate_metadata(&"m".repeat(500)).is_ok());
        assert!(validate_metadata(&"m".repeat(501)).is_err());
        assert!(validate_batch_metadata(&"m".repeat(200)).is_ok());
        assert!(matches!(
            validate_batch_metadata(&"m".repeat(201)),
            Err(ZkStorageError::PayloadTooLarge { len: 201, max: 200, .. })
        ));
    }

    #[test]
    fn counts_fit_u32() {
        assert_eq!(validate_count("leaf_count", 5).unwrap(), 5);
        assert_eq!(validate_count("leaf_count", u32::MAX as usize).unwrap(), u32::MAX);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn counts_beyond_u32_are_too_large() {
        let count = u32::MAX as usize + 1;
        assert!(matches!(
            validate_count("leaf_count", count),
            Err(ZkStorageError::PayloadTooLarge { field: "leaf_count", len, max })
                if len == count && max == u32::MAX as usize
        ));
    }
}
