//! The scan-delete loop that empties a single table.

use futures::TryStreamExt;
use std::pin::pin;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use wiper_config::shared::{DrainConfig, RetryConfig, WiperConfig};

use crate::bail;
use crate::error::{ErrorKind, WipeError, WipeResult};
use crate::progress::ProgressReporter;
use crate::store::{TableStore, scan_pages};
use crate::types::{PrimaryKey, Record, TableName};

/// Whether the drain deletes what it scans or only counts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainMode {
    #[default]
    Delete,
    DryRun,
}

/// Everything the drain loop needs besides the store and the table.
#[derive(Debug, Clone, Default)]
pub struct DrainOptions {
    pub drain: DrainConfig,
    pub retry: RetryConfig,
    pub mode: DrainMode,
}

impl DrainOptions {
    pub fn from_config(config: &WiperConfig) -> Self {
        let mode = if config.dry_run {
            DrainMode::DryRun
        } else {
            DrainMode::Delete
        };

        Self {
            drain: config.drain.clone(),
            retry: config.retry.clone(),
            mode,
        }
    }
}

/// Counters of a single drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Records deleted, or counted in [`DrainMode::DryRun`].
    pub records: u64,
    /// Non-empty pages scanned.
    pub pages: u64,
}

/// A drain that stopped on a store error.
///
/// Deletions issued before the failure are not rolled back, `stats` tells how far it got.
#[derive(Debug, Error)]
#[error("drain of `{table}` stopped after {} records: {error}", .stats.records)]
pub struct DrainError {
    pub table: TableName,
    pub stats: DrainStats,
    #[source]
    pub error: WipeError,
}

/// Removes every record currently stored in `table`.
///
/// Pages are read one at a time and every record in a page is deleted by primary key before the
/// next page is requested. The first store error stops the drain.
#[tracing::instrument(skip_all, fields(table = %table))]
pub async fn drain_table<S, P>(
    store: &S,
    table: &TableName,
    options: &DrainOptions,
    reporter: &P,
) -> Result<DrainStats, DrainError>
where
    S: TableStore + ?Sized,
    P: ProgressReporter + ?Sized,
{
    let mut drain = Drain {
        store,
        table,
        options,
        reporter,
        stats: DrainStats::default(),
    };

    match drain.run().await {
        Ok(()) => Ok(drain.stats),
        Err(error) => Err(DrainError {
            table: table.clone(),
            stats: drain.stats,
            error,
        }),
    }
}

struct Drain<'a, S: ?Sized, P: ?Sized> {
    store: &'a S,
    table: &'a TableName,
    options: &'a DrainOptions,
    reporter: &'a P,
    stats: DrainStats,
}

impl<S, P> Drain<'_, S, P>
where
    S: TableStore + ?Sized,
    P: ProgressReporter + ?Sized,
{
    async fn run(&mut self) -> WipeResult<()> {
        let (store, table, options) = (self.store, self.table, self.options);
        let mut pages = pin!(scan_pages(
            store,
            table,
            &options.drain.primary_key,
            options.drain.page_size,
            None,
        ));

        while let Some(page) = pages.try_next().await? {
            self.stats.pages += 1;
            self.reporter
                .page_scanned(table, self.stats.pages, page.records.len());

            match options.mode {
                DrainMode::Delete => self.delete_page(&page.records).await?,
                DrainMode::DryRun => self.stats.records += page.records.len() as u64,
            }
        }

        Ok(())
    }

    async fn delete_page(&mut self, records: &[Record]) -> WipeResult<()> {
        let keys = records
            .iter()
            .map(|record| record.primary_key(&self.options.drain.primary_key))
            .collect::<WipeResult<Vec<_>>>()?;

        let batch_size = self.options.drain.delete_batch_size.max(1);
        for chunk in keys.chunks(batch_size) {
            self.delete_with_retry(chunk.to_vec()).await?;
        }

        Ok(())
    }

    /// Submits `keys` and re-submits whatever the store leaves unprocessed, backing off between
    /// attempts. Fails once the retry budget is spent with keys still pending.
    async fn delete_with_retry(&mut self, keys: Vec<PrimaryKey>) -> WipeResult<()> {
        let options = self.options;
        let retry = &options.retry;
        let mut pending = keys;
        let mut attempt = 0;

        loop {
            let submitted = pending.len();
            let unprocessed = self.store.delete_batch(self.table, pending).await?;
            self.record_deleted(submitted.saturating_sub(unprocessed.len()) as u64);

            if unprocessed.is_empty() {
                return Ok(());
            }

            if attempt >= retry.max_attempts {
                bail!(
                    ErrorKind::UnprocessedDeletes,
                    "Store kept leaving deletes unprocessed",
                    format!(
                        "{} of {submitted} deletes still unprocessed after {attempt} retries",
                        unprocessed.len()
                    )
                );
            }

            let delay = backoff_delay(retry, attempt);
            warn!(
                table = %self.table,
                unprocessed = unprocessed.len(),
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "store left deletes unprocessed, retrying"
            );
            tokio::time::sleep(delay).await;

            attempt += 1;
            pending = unprocessed;
        }
    }

    /// Adds `count` to the deleted count and reports every progress interval crossed.
    fn record_deleted(&mut self, count: u64) {
        let interval = self.options.drain.progress_interval.max(1);
        let before = self.stats.records;
        self.stats.records += count;

        for checkpoint in (before / interval + 1)..=(self.stats.records / interval) {
            self.reporter.deleted(self.table, checkpoint * interval);
        }

        debug!(table = %self.table, deleted = self.stats.records, "deleted batch");
    }
}

/// Delay before retry number `attempt + 1`: exponential from the initial delay, capped.
fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let delay = retry.initial_delay_ms as f64 * f64::from(retry.backoff_factor).powi(exponent);

    Duration::from_millis(delay.min(retry.max_delay_ms as f64) as u64)
}
