use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Largest number of delete requests the store accepts in a single batch write.
pub const MAX_DELETE_BATCH_SIZE: usize = 25;

/// Settings for the scan-delete loop that drains each table.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainConfig {
    /// Name of the primary key attribute used to address records for deletion.
    pub primary_key: String,
    /// Maximum number of records requested per scan page.
    ///
    /// When `None` the store's own page size is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// A progress line is emitted every time the deleted count reaches a multiple of this value.
    pub progress_interval: u64,
    /// Number of keys sent per batch delete request.
    pub delete_batch_size: usize,
}

impl DrainConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.primary_key.trim().is_empty() {
            return Err(ValidationError::EmptyPrimaryKey);
        }

        if self.page_size == Some(0) {
            return Err(ValidationError::PageSizeZero);
        }

        if self.progress_interval == 0 {
            return Err(ValidationError::ProgressIntervalZero);
        }

        if self.delete_batch_size == 0 || self.delete_batch_size > MAX_DELETE_BATCH_SIZE {
            return Err(ValidationError::InvalidDeleteBatchSize {
                actual: self.delete_batch_size,
                max: MAX_DELETE_BATCH_SIZE,
            });
        }

        Ok(())
    }
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            page_size: None,
            progress_interval: 100,
            delete_batch_size: MAX_DELETE_BATCH_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reset_scripts() {
        let config = DrainConfig::default();
        assert_eq!(config.primary_key, "id");
        assert_eq!(config.page_size, None);
        assert_eq!(config.progress_interval, 100);
        assert_eq!(config.delete_batch_size, 25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_oversized_delete_batches() {
        let config = DrainConfig {
            delete_batch_size: 26,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidDeleteBatchSize {
                actual: 26,
                max: 25
            })
        );
    }

    #[test]
    fn rejects_zero_values() {
        let config = DrainConfig {
            page_size: Some(0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::PageSizeZero));

        let config = DrainConfig {
            progress_interval: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::ProgressIntervalZero));

        let config = DrainConfig {
            primary_key: " ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyPrimaryKey));
    }
}
