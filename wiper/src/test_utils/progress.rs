use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::progress::ProgressReporter;
use crate::types::TableName;

#[derive(Debug, Default)]
struct Inner {
    pages: HashMap<TableName, Vec<usize>>,
    checkpoints: HashMap<TableName, Vec<u64>>,
}

/// [`ProgressReporter`] that remembers every notification per table.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingProgress {
    /// Sizes of the pages scanned from `table`, in order.
    pub fn pages(&self, table: &TableName) -> Vec<usize> {
        let inner = self.inner.lock().unwrap();
        inner.pages.get(table).cloned().unwrap_or_default()
    }

    /// Deleted counts reported for `table`, in order.
    pub fn checkpoints(&self, table: &TableName) -> Vec<u64> {
        let inner = self.inner.lock().unwrap();
        inner.checkpoints.get(table).cloned().unwrap_or_default()
    }
}

impl ProgressReporter for RecordingProgress {
    fn page_scanned(&self, table: &TableName, _page: u64, records: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.pages.entry(table.clone()).or_default().push(records);
    }

    fn deleted(&self, table: &TableName, deleted: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .checkpoints
            .entry(table.clone())
            .or_default()
            .push(deleted);
    }
}
