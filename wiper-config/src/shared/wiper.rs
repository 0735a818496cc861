use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::Config;
use crate::shared::{DrainConfig, DynamoDbConfig, RetryConfig, SentryConfig, ValidationError};

/// Complete configuration for a wipe run.
///
/// Loaded once at startup. The ordered `tables` list is processed front to back, so tables that
/// reference others should come first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WiperConfig {
    /// Store connection and credentials.
    pub store: DynamoDbConfig,
    /// Tables to drain, in order.
    pub tables: Vec<String>,
    /// Scan-delete loop settings.
    #[serde(default)]
    pub drain: DrainConfig,
    /// Backoff used when the store leaves deletes unprocessed.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Scan and count every table without deleting anything.
    #[serde(default)]
    pub dry_run: bool,
    /// Probe every drained table once more after the run and report leftover records.
    #[serde(default = "default_verify")]
    pub verify: bool,
    /// Hint printed with the completion banner, e.g. the import command to run next.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<String>,
    /// Optional Sentry configuration for error tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentry: Option<SentryConfig>,
}

fn default_verify() -> bool {
    true
}

impl WiperConfig {
    /// Validates the complete wiper configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tables.is_empty() {
            return Err(ValidationError::NoTables);
        }

        let mut seen = HashSet::with_capacity(self.tables.len());
        for table in &self.tables {
            if table.trim().is_empty() {
                return Err(ValidationError::BlankTableName);
            }

            if !seen.insert(table.as_str()) {
                return Err(ValidationError::DuplicateTable(table.clone()));
            }
        }

        self.store.validate()?;
        self.drain.validate()?;
        self.retry.validate()?;

        Ok(())
    }
}

impl Config for WiperConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["tables"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::CredentialsConfig;

    fn config(tables: &[&str]) -> WiperConfig {
        WiperConfig {
            store: DynamoDbConfig {
                region: "us-east-1".to_string(),
                credentials: CredentialsConfig::Profile {
                    name: "admin".to_string(),
                },
                endpoint_url: None,
            },
            tables: tables.iter().map(|t| t.to_string()).collect(),
            drain: DrainConfig::default(),
            retry: RetryConfig::default(),
            dry_run: false,
            verify: true,
            next_steps: None,
            sentry: None,
        }
    }

    #[test]
    fn accepts_ordered_table_list() {
        assert!(config(&["Assignment", "Consent", "Address"]).validate().is_ok());
    }

    #[test]
    fn rejects_empty_blank_and_duplicate_tables() {
        assert_eq!(config(&[]).validate(), Err(ValidationError::NoTables));
        assert_eq!(
            config(&["Orders", ""]).validate(),
            Err(ValidationError::BlankTableName)
        );
        assert_eq!(
            config(&["Orders", "Orders"]).validate(),
            Err(ValidationError::DuplicateTable("Orders".to_string()))
        );
    }

    #[test]
    fn nested_sections_are_validated() {
        let mut config = config(&["Orders"]);
        config.drain.progress_interval = 0;
        assert_eq!(
            config.validate(),
            Err(ValidationError::ProgressIntervalZero)
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "store": {
                "region": "us-east-1",
                "credentials": { "profile": { "name": "admin" } }
            },
            "tables": ["Assignment", "Address"]
        }"#;

        let config: WiperConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tables, vec!["Assignment", "Address"]);
        assert_eq!(config.drain.primary_key, "id");
        assert!(!config.dry_run);
        assert!(config.verify);
        assert!(config.next_steps.is_none());
        assert!(config.validate().is_ok());
    }
}
