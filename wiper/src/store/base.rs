use std::future::Future;

use crate::error::WipeResult;
use crate::types::{PrimaryKey, ScanPage, ScanRequest, TableName};

/// Remote key-value table service reachable through scan and batched delete calls.
pub trait TableStore {
    /// Reads one page of records from `table`.
    fn scan_page(
        &self,
        table: &TableName,
        request: ScanRequest,
    ) -> impl Future<Output = WipeResult<ScanPage>> + Send;

    /// Deletes the records addressed by `keys` in a single batch request.
    ///
    /// Returns the keys the store accepted but did not process, which the caller is expected to
    /// submit again. Deleting a key that no longer exists is not an error.
    fn delete_batch(
        &self,
        table: &TableName,
        keys: Vec<PrimaryKey>,
    ) -> impl Future<Output = WipeResult<Vec<PrimaryKey>>> + Send;
}
