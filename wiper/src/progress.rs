use tracing::info;

use crate::types::TableName;

/// Receives progress notifications from the drain loop.
pub trait ProgressReporter: Send + Sync {
    /// A non-empty page of `records` was read from `table`. Pages are numbered from 1.
    fn page_scanned(&self, table: &TableName, page: u64, records: usize);

    /// The deleted count of `table` reached `deleted`, a multiple of the progress interval.
    fn deleted(&self, table: &TableName, deleted: u64);
}

/// [`ProgressReporter`] that emits one log line per notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn page_scanned(&self, table: &TableName, page: u64, records: usize) {
        info!(%table, page, records, "found {records} items to delete");
    }

    fn deleted(&self, table: &TableName, deleted: u64) {
        info!(%table, deleted, "deleted {deleted} items");
    }
}
