use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// No tables were configured for wiping.
    #[error("`tables` must contain at least one table name")]
    NoTables,
    /// A table name is empty or only whitespace.
    #[error("`tables` contains a blank table name")]
    BlankTableName,
    /// The same table appears more than once.
    #[error("table `{0}` is listed more than once in `tables`")]
    DuplicateTable(String),
    /// The primary key attribute name is empty.
    #[error("`drain.primary_key` cannot be empty")]
    EmptyPrimaryKey,
    /// A page size of zero was configured.
    #[error("`drain.page_size` cannot be zero")]
    PageSizeZero,
    /// A progress interval of zero was configured.
    #[error("`drain.progress_interval` cannot be zero")]
    ProgressIntervalZero,
    /// Delete batch size is outside of what the store accepts.
    #[error("`drain.delete_batch_size` must be between 1 and {max}, got {actual}")]
    InvalidDeleteBatchSize { actual: usize, max: usize },
    /// The store region is empty.
    #[error("`store.region` cannot be empty")]
    EmptyRegion,
    /// The store endpoint override is empty.
    #[error("`store.endpoint_url` cannot be empty when set")]
    EmptyEndpointUrl,
    /// A credential profile without a name.
    #[error("`store.credentials.profile.name` cannot be empty")]
    EmptyProfileName,
    /// Static credentials with an empty key id or secret.
    #[error("`store.credentials.static` requires a non-empty access key id and secret")]
    EmptyStaticCredentials,
    /// Retry policy values that cannot produce a sane backoff.
    #[error("Invalid retry config: {0}")]
    InvalidRetry(&'static str),
}
