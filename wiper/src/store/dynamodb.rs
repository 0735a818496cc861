use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, WriteRequest};
use secrecy::ExposeSecret;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;
use tracing::{debug, info};
use wiper_config::shared::{CredentialsConfig, DynamoDbConfig};

use crate::error::{ErrorKind, WipeError, WipeResult};
use crate::store::TableStore;
use crate::types::{KeyValue, PageToken, PrimaryKey, Record, ScanPage, ScanRequest, TableName};
use crate::{bail, wipe_error};

/// Placeholder used in the projection expression, so reserved words work as key names.
const KEY_PLACEHOLDER: &str = "#pk";

/// Provider name attached to credentials that come from the configuration file.
const STATIC_CREDENTIALS_PROVIDER: &str = "wiper-config";

/// [`TableStore`] backed by Amazon DynamoDB.
///
/// The client is built once from configuration and shared by every table operation.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Builds a client for the configured region, credentials and optional endpoint override.
    pub async fn connect(config: &DynamoDbConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        match &config.credentials {
            CredentialsConfig::Profile { name } => {
                loader = loader.profile_name(name);
            }
            CredentialsConfig::Static {
                access_key_id,
                secret_access_key,
            } => {
                let credentials = Credentials::new(
                    access_key_id.clone(),
                    secret_access_key.expose_secret().clone(),
                    None,
                    None,
                    STATIC_CREDENTIALS_PROVIDER,
                );
                loader = loader.credentials_provider(credentials);
            }
        }

        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let sdk_config = loader.load().await;
        info!(region = %config.region, "dynamodb client configured");

        Self::from_client(Client::new(&sdk_config))
    }

    /// Wraps an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl TableStore for DynamoDbStore {
    async fn scan_page(&self, table: &TableName, request: ScanRequest) -> WipeResult<ScanPage> {
        let limit = match request.limit {
            Some(limit) => Some(i32::try_from(limit).map_err(|err| {
                wipe_error!(ErrorKind::ConfigError, "Scan page size is too large", err)
            })?),
            None => None,
        };

        let output = self
            .client
            .scan()
            .table_name(table.as_str())
            .projection_expression(KEY_PLACEHOLDER)
            .expression_attribute_names(KEY_PLACEHOLDER, request.key_attribute)
            .set_limit(limit)
            .set_exclusive_start_key(request.start_token.map(token_to_item))
            .send()
            .await
            .map_err(|err| store_error(err, "Scan request failed"))?;

        let records = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(record_from_item)
            .collect::<Vec<_>>();

        let next_token = output
            .last_evaluated_key
            .map(token_from_item)
            .transpose()?;

        debug!(
            %table,
            records = records.len(),
            truncated = next_token.is_some(),
            "scanned dynamodb page"
        );

        Ok(ScanPage {
            records,
            next_token,
        })
    }

    async fn delete_batch(
        &self,
        table: &TableName,
        keys: Vec<PrimaryKey>,
    ) -> WipeResult<Vec<PrimaryKey>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let requests = keys
            .into_iter()
            .map(delete_request)
            .collect::<WipeResult<Vec<_>>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table.as_str(), requests)
            .send()
            .await
            .map_err(|err| store_error(err, "Batch delete request failed"))?;

        let unprocessed = output
            .unprocessed_items
            .and_then(|mut items| items.remove(table.as_str()))
            .unwrap_or_default();

        unprocessed
            .into_iter()
            .filter_map(|request| request.delete_request)
            .map(|request| primary_key_from_item(request.key))
            .collect()
    }
}

fn delete_request(key: PrimaryKey) -> WipeResult<WriteRequest> {
    let delete = DeleteRequest::builder()
        .key(key.attribute, attribute_from_key_value(key.value))
        .build()
        .map_err(|err| wipe_error!(ErrorKind::InvalidData, "Failed to build delete request", err))?;

    Ok(WriteRequest::builder().delete_request(delete).build())
}

fn attribute_from_key_value(value: KeyValue) -> AttributeValue {
    match value {
        KeyValue::String(value) => AttributeValue::S(value),
        KeyValue::Number(value) => AttributeValue::N(value),
        KeyValue::Binary(value) => AttributeValue::B(Blob::new(value)),
    }
}

fn key_value_from_attribute(value: AttributeValue) -> Option<KeyValue> {
    match value {
        AttributeValue::S(value) => Some(KeyValue::String(value)),
        AttributeValue::N(value) => Some(KeyValue::Number(value)),
        AttributeValue::B(value) => Some(KeyValue::Binary(value.into_inner())),
        _ => None,
    }
}

/// Keeps the attributes that can act as keys, the scan only projects the key anyway.
fn record_from_item(item: HashMap<String, AttributeValue>) -> Record {
    item.into_iter()
        .filter_map(|(name, value)| key_value_from_attribute(value).map(|value| (name, value)))
        .collect()
}

fn token_from_item(item: HashMap<String, AttributeValue>) -> WipeResult<PageToken> {
    let mut key = BTreeMap::new();
    for (name, value) in item {
        let Some(value) = key_value_from_attribute(value) else {
            bail!(
                ErrorKind::UnsupportedKeyType,
                "Continuation key holds a non-key attribute type",
                format!("attribute `{name}`")
            );
        };
        key.insert(name, value);
    }

    Ok(PageToken(key))
}

fn token_to_item(token: PageToken) -> HashMap<String, AttributeValue> {
    token
        .0
        .into_iter()
        .map(|(name, value)| (name, attribute_from_key_value(value)))
        .collect()
}

fn primary_key_from_item(item: HashMap<String, AttributeValue>) -> WipeResult<PrimaryKey> {
    if item.len() != 1 {
        bail!(
            ErrorKind::InvalidData,
            "Unprocessed delete does not hold a single key attribute",
            format!("{} attributes", item.len())
        );
    }

    let Some((attribute, value)) = item.into_iter().next() else {
        bail!(ErrorKind::InvalidData, "Unprocessed delete has an empty key");
    };

    match key_value_from_attribute(value) {
        Some(value) => Ok(PrimaryKey { attribute, value }),
        None => bail!(
            ErrorKind::UnsupportedKeyType,
            "Unprocessed delete key has a non-key attribute type",
            format!("attribute `{attribute}`")
        ),
    }
}

/// Converts an SDK error into a [`WipeError`], classifying it by transport failure or service
/// error code. The detail carries the full error chain.
fn store_error<E, R>(err: SdkError<E, R>, description: &'static str) -> WipeError
where
    E: ProvideErrorMetadata + Error + 'static,
    R: fmt::Debug,
{
    let kind = match &err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            ErrorKind::StoreConnectionFailed
        }
        _ => kind_for_error_code(err.code()),
    };

    wipe_error!(kind, description, DisplayErrorContext(&err))
}

/// Maps a DynamoDB error code to an [`ErrorKind`].
fn kind_for_error_code(code: Option<&str>) -> ErrorKind {
    match code {
        Some("ResourceNotFoundException") => ErrorKind::TableNotFound,
        Some(
            "ProvisionedThroughputExceededException"
            | "ThrottlingException"
            | "RequestLimitExceeded",
        ) => ErrorKind::StoreThrottled,
        Some(
            "UnrecognizedClientException"
            | "AccessDeniedException"
            | "ExpiredTokenException"
            | "InvalidSignatureException"
            | "MissingAuthenticationTokenException",
        ) => ErrorKind::AuthenticationError,
        _ => ErrorKind::StoreOperationFailed,
    }
}
