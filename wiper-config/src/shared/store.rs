use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SerializableSecretString;
use crate::shared::ValidationError;

/// Connection settings for the DynamoDB store that holds the tables to wipe.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DynamoDbConfig {
    /// AWS region hosting the tables, e.g. `us-east-1`.
    pub region: String,
    /// How the client authenticates.
    pub credentials: CredentialsConfig,
    /// Endpoint override, used for DynamoDB Local and similar emulators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

impl DynamoDbConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.region.trim().is_empty() {
            return Err(ValidationError::EmptyRegion);
        }

        if let Some(endpoint_url) = &self.endpoint_url
            && endpoint_url.trim().is_empty()
        {
            return Err(ValidationError::EmptyEndpointUrl);
        }

        self.credentials.validate()
    }
}

/// Credential source for the store client.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsConfig {
    /// Named profile from the shared AWS config and credentials files.
    Profile {
        /// Profile name, e.g. `admin`.
        name: String,
    },
    /// Static access key pair.
    Static {
        /// AWS access key id.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: SerializableSecretString,
    },
}

impl CredentialsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Profile { name } => {
                if name.trim().is_empty() {
                    return Err(ValidationError::EmptyProfileName);
                }
            }
            Self::Static {
                access_key_id,
                secret_access_key,
            } => {
                if access_key_id.is_empty() || secret_access_key.expose_secret().is_empty() {
                    return Err(ValidationError::EmptyStaticCredentials);
                }
            }
        }

        Ok(())
    }
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile { name } => f.debug_struct("Profile").field("name", name).finish(),
            Self::Static {
                access_key_id,
                secret_access_key: _,
            } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"REDACTED")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_config() -> DynamoDbConfig {
        DynamoDbConfig {
            region: "us-east-1".to_string(),
            credentials: CredentialsConfig::Profile {
                name: "admin".to_string(),
            },
            endpoint_url: None,
        }
    }

    #[test]
    fn profile_config_is_valid() {
        assert!(profile_config().validate().is_ok());
    }

    #[test]
    fn rejects_empty_region_and_endpoint() {
        let mut config = profile_config();
        config.region = String::new();
        assert_eq!(config.validate(), Err(ValidationError::EmptyRegion));

        let mut config = profile_config();
        config.endpoint_url = Some("  ".to_string());
        assert_eq!(config.validate(), Err(ValidationError::EmptyEndpointUrl));
    }

    #[test]
    fn rejects_empty_credentials() {
        let credentials = CredentialsConfig::Profile {
            name: String::new(),
        };
        assert_eq!(
            credentials.validate(),
            Err(ValidationError::EmptyProfileName)
        );

        let credentials = CredentialsConfig::Static {
            access_key_id: "AKIA".to_string(),
            secret_access_key: String::new().into(),
        };
        assert_eq!(
            credentials.validate(),
            Err(ValidationError::EmptyStaticCredentials)
        );
    }

    #[test]
    fn debug_redacts_static_secret() {
        let credentials = CredentialsConfig::Static {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "very-secret".to_string().into(),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("AKIA"));
        assert!(!debug.contains("very-secret"));
    }
}
