use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bail;
use crate::error::{ErrorKind, WipeResult};
use crate::store::TableStore;
use crate::types::{PrimaryKey, ScanPage, ScanRequest, TableName};

/// Faults injected by a [`FaultyStore`]. Call numbers start at 1.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Only calls against this table are counted and faulted. Every table when `None`.
    pub table: Option<TableName>,
    /// The scan call that fails.
    pub fail_scan_call: Option<u64>,
    /// The delete call that fails.
    pub fail_delete_call: Option<u64>,
    /// Number of delete calls, from the first, that leave every key unprocessed.
    pub unprocessed_delete_calls: u64,
}

/// A test wrapper around any [`TableStore`] that fails or stalls selected calls.
#[derive(Debug, Clone)]
pub struct FaultyStore<S> {
    inner: S,
    faults: Faults,
    scan_calls: Arc<AtomicU64>,
    delete_calls: Arc<AtomicU64>,
}

impl<S> FaultyStore<S> {
    pub fn wrap(inner: S, faults: Faults) -> Self {
        Self {
            inner,
            faults,
            scan_calls: Arc::new(AtomicU64::new(0)),
            delete_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Scan calls seen against the faulted table(s).
    pub fn scan_calls(&self) -> u64 {
        self.scan_calls.load(Ordering::SeqCst)
    }

    /// Delete calls seen against the faulted table(s).
    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn applies_to(&self, table: &TableName) -> bool {
        self.faults
            .table
            .as_ref()
            .is_none_or(|faulted| faulted == table)
    }
}

impl<S> TableStore for FaultyStore<S>
where
    S: TableStore + Sync,
{
    async fn scan_page(&self, table: &TableName, request: ScanRequest) -> WipeResult<ScanPage> {
        if self.applies_to(table) {
            let call = self.scan_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.faults.fail_scan_call == Some(call) {
                bail!(
                    ErrorKind::StoreOperationFailed,
                    "Injected scan failure",
                    format!("scan call {call} on `{table}`")
                );
            }
        }

        self.inner.scan_page(table, request).await
    }

    async fn delete_batch(
        &self,
        table: &TableName,
        keys: Vec<PrimaryKey>,
    ) -> WipeResult<Vec<PrimaryKey>> {
        if self.applies_to(table) {
            let call = self.delete_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.faults.fail_delete_call == Some(call) {
                bail!(
                    ErrorKind::StoreOperationFailed,
                    "Injected delete failure",
                    format!("delete call {call} on `{table}`")
                );
            }

            if call <= self.faults.unprocessed_delete_calls {
                return Ok(keys);
            }
        }

        self.inner.delete_batch(table, keys).await
    }
}
