use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, WipeResult};
use crate::store::TableStore;
use crate::types::{KeyValue, PageToken, PrimaryKey, Record, ScanPage, ScanRequest, TableName};

/// Page size used when a scan does not ask for one.
const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug)]
struct MemoryTable {
    key_attribute: String,
    records: BTreeMap<KeyValue, Record>,
}

#[derive(Debug)]
struct Inner {
    tables: HashMap<TableName, MemoryTable>,
    default_page_size: u32,
}

/// In-memory [`TableStore`] with DynamoDB-like scan semantics.
///
/// Records are scanned in key order. A page that is filled up to its limit always carries a
/// continuation token, even when it happens to hold the last record, so the caller only learns
/// that the table is exhausted from a following empty page.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    scan_calls: Arc<AtomicU64>,
    delete_calls: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_default_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates a store whose scans return at most `default_page_size` records when the request
    /// carries no limit.
    pub fn with_default_page_size(default_page_size: u32) -> Self {
        let inner = Inner {
            tables: HashMap::new(),
            default_page_size: default_page_size.max(1),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            scan_calls: Arc::new(AtomicU64::new(0)),
            delete_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates an empty table keyed by `key_attribute`, replacing any existing table.
    pub async fn create_table(&self, table: TableName, key_attribute: &str) {
        let mut inner = self.inner.lock().await;
        inner.tables.insert(
            table,
            MemoryTable {
                key_attribute: key_attribute.to_string(),
                records: BTreeMap::new(),
            },
        );
    }

    /// Inserts or replaces a record.
    pub async fn insert(&self, table: &TableName, record: Record) -> WipeResult<()> {
        self.insert_many(table, [record]).await
    }

    /// Inserts or replaces several records.
    pub async fn insert_many(
        &self,
        table: &TableName,
        records: impl IntoIterator<Item = Record>,
    ) -> WipeResult<()> {
        let mut inner = self.inner.lock().await;
        let memory_table = table_mut(&mut inner, table)?;

        for record in records {
            let key = record.primary_key(&memory_table.key_attribute)?;
            memory_table.records.insert(key.value, record);
        }

        Ok(())
    }

    /// Returns the number of records currently stored in `table`.
    pub async fn len(&self, table: &TableName) -> WipeResult<usize> {
        let mut inner = self.inner.lock().await;
        Ok(table_mut(&mut inner, table)?.records.len())
    }

    /// Returns a snapshot of the records in `table`, in key order.
    pub async fn records(&self, table: &TableName) -> WipeResult<Vec<Record>> {
        let mut inner = self.inner.lock().await;
        Ok(table_mut(&mut inner, table)?
            .records
            .values()
            .cloned()
            .collect())
    }

    /// Total number of scan requests served so far.
    pub fn scan_calls(&self) -> u64 {
        self.scan_calls.load(Ordering::SeqCst)
    }

    /// Total number of batch delete requests served so far.
    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn table_mut<'a>(inner: &'a mut Inner, table: &TableName) -> WipeResult<&'a mut MemoryTable> {
    match inner.tables.get_mut(table) {
        Some(memory_table) => Ok(memory_table),
        None => bail!(
            ErrorKind::TableNotFound,
            "Requested resource not found",
            format!("table `{table}` does not exist")
        ),
    }
}

impl TableStore for MemoryStore {
    async fn scan_page(&self, table: &TableName, request: ScanRequest) -> WipeResult<ScanPage> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.inner.lock().await;
        let limit = request.limit.unwrap_or(inner.default_page_size) as usize;
        let memory_table = table_mut(&mut inner, table)?;

        let lower = match &request.start_token {
            Some(token) => match token.0.get(&memory_table.key_attribute) {
                Some(start) => Bound::Excluded(start.clone()),
                None => bail!(
                    ErrorKind::InvalidData,
                    "Page token does not match the table key schema",
                    format!("token has no `{}` attribute", memory_table.key_attribute)
                ),
            },
            None => Bound::Unbounded,
        };

        let records: Vec<Record> = memory_table
            .records
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect();

        let next_token = if records.len() == limit {
            records
                .last()
                .and_then(|record| record.get(&memory_table.key_attribute))
                .map(|value| {
                    PageToken(BTreeMap::from([(
                        memory_table.key_attribute.clone(),
                        value.clone(),
                    )]))
                })
        } else {
            None
        };

        debug!(%table, records = records.len(), "served memory scan page");

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
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.inner.lock().await;
        let memory_table = table_mut(&mut inner, table)?;

        // The whole batch is validated before anything is removed, like a rejected batch write.
        if let Some(key) = keys
            .iter()
            .find(|key| key.attribute != memory_table.key_attribute)
        {
            bail!(
                ErrorKind::InvalidData,
                "The provided key element does not match the schema",
                format!(
                    "expected key attribute `{}`, got `{}`",
                    memory_table.key_attribute, key.attribute
                )
            );
        }

        for key in keys {
            memory_table.records.remove(&key.value);
        }

        Ok(Vec::new())
    }
}
