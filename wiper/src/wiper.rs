//! Runs the drain over an ordered list of tables and aggregates the outcomes.

use tracing::{error, info, warn};

use crate::drain::{DrainMode, DrainOptions, DrainStats, drain_table};
use crate::error::{WipeError, WipeResult};
use crate::progress::{LogProgress, ProgressReporter};
use crate::store::TableStore;
use crate::types::{ScanRequest, TableName};

/// How a single table ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TableStatus {
    Drained,
    Failed(WipeError),
}

/// Result of probing a drained table once more after the run.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// The probe found no records.
    Empty,
    /// The probe still found records, most likely written while the table was being drained.
    RecordsRemain { sampled: u64 },
    /// The probe itself failed.
    Failed(WipeError),
}

/// Outcome of one table in a [`WipeReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableOutcome {
    pub table: TableName,
    pub stats: DrainStats,
    pub status: TableStatus,
    /// Set when verification ran for this table.
    pub verification: Option<Verification>,
}

impl TableOutcome {
    pub fn is_drained(&self) -> bool {
        matches!(self.status, TableStatus::Drained)
    }
}

/// Outcomes of a wipe run, in the order the tables were given.
#[derive(Debug, Clone, PartialEq)]
pub struct WipeReport {
    pub mode: DrainMode,
    pub outcomes: Vec<TableOutcome>,
}

impl WipeReport {
    /// Number of tables drained without error.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_drained()).count()
    }

    /// Number of tables whose drain stopped on an error.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Records deleted across all tables, or counted in a dry run.
    pub fn total_records(&self) -> u64 {
        self.outcomes.iter().map(|o| o.stats.records).sum()
    }

    pub fn outcome(&self, table: &TableName) -> Option<&TableOutcome> {
        self.outcomes.iter().find(|o| &o.table == table)
    }

    /// Aggregates the errors of every failed table, `None` when all tables were drained.
    pub fn error(&self) -> Option<WipeError> {
        let errors = self
            .outcomes
            .iter()
            .filter_map(|o| match &o.status {
                TableStatus::Failed(err) => Some(err.clone()),
                TableStatus::Drained => None,
            })
            .collect::<Vec<_>>();

        if errors.is_empty() {
            None
        } else {
            Some(WipeError::many(errors))
        }
    }
}

/// Drains tables one after the other against a single store.
///
/// A table that fails is recorded and the next table is still attempted.
#[derive(Debug)]
pub struct TableWiper<S, P = LogProgress> {
    store: S,
    options: DrainOptions,
    verify: bool,
    reporter: P,
}

impl<S> TableWiper<S>
where
    S: TableStore + Sync,
{
    pub fn new(store: S, options: DrainOptions) -> Self {
        Self::with_reporter(store, options, LogProgress)
    }
}

impl<S, P> TableWiper<S, P>
where
    S: TableStore + Sync,
    P: ProgressReporter,
{
    pub fn with_reporter(store: S, options: DrainOptions, reporter: P) -> Self {
        Self {
            store,
            options,
            verify: false,
            reporter,
        }
    }

    /// Probes every drained table with one scan page once all tables are processed.
    ///
    /// Has no effect in [`DrainMode::DryRun`].
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Drains `tables` in order and returns one outcome per table.
    pub async fn wipe(&self, tables: &[TableName]) -> WipeReport {
        let mode = self.options.mode;
        match mode {
            DrainMode::Delete => info!(tables = tables.len(), "starting to drain tables"),
            DrainMode::DryRun => {
                info!(tables = tables.len(), "starting dry run, nothing will be deleted")
            }
        }

        let mut outcomes = Vec::with_capacity(tables.len());
        for table in tables {
            info!(%table, "processing table");
            outcomes.push(self.wipe_table(table).await);
        }

        if self.verify && mode == DrainMode::Delete {
            for outcome in outcomes.iter_mut().filter(|o| o.is_drained()) {
                outcome.verification = Some(self.verify_table(&outcome.table).await);
            }
        }

        let report = WipeReport { mode, outcomes };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            records = report.total_records(),
            "finished processing {} tables",
            report.outcomes.len()
        );

        report
    }

    async fn wipe_table(&self, table: &TableName) -> TableOutcome {
        match drain_table(&self.store, table, &self.options, &self.reporter).await {
            Ok(stats) => {
                match self.options.mode {
                    DrainMode::Delete => info!(
                        %table,
                        deleted = stats.records,
                        "deleted {} items from {table}",
                        stats.records
                    ),
                    DrainMode::DryRun => info!(
                        %table,
                        records = stats.records,
                        "would delete {} items from {table}",
                        stats.records
                    ),
                }

                TableOutcome {
                    table: table.clone(),
                    stats,
                    status: TableStatus::Drained,
                    verification: None,
                }
            }
            Err(err) => {
                error!(
                    %table,
                    deleted = err.stats.records,
                    error = %err.error,
                    "failed to drain table"
                );

                TableOutcome {
                    table: table.clone(),
                    stats: err.stats,
                    status: TableStatus::Failed(err.error),
                    verification: None,
                }
            }
        }
    }

    async fn verify_table(&self, table: &TableName) -> Verification {
        match self.probe(table).await {
            Ok(0) => {
                info!(%table, "verified table is empty");
                Verification::Empty
            }
            Ok(sampled) => {
                warn!(%table, sampled, "records still remain, run again");
                Verification::RecordsRemain { sampled }
            }
            Err(err) => {
                warn!(%table, error = %err, "failed to verify table");
                Verification::Failed(err)
            }
        }
    }

    async fn probe(&self, table: &TableName) -> WipeResult<u64> {
        let request = ScanRequest {
            key_attribute: self.options.drain.primary_key.clone(),
            limit: self.options.drain.page_size,
            start_token: None,
        };
        let page = self.store.scan_page(table, request).await?;

        Ok(page.records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::memory::MemoryStore;
    use crate::test_utils::faulty_store::{FaultyStore, Faults};
    use crate::test_utils::progress::RecordingProgress;
    use crate::test_utils::table::seed_table;

    #[tokio::test]
    async fn empty_list_produces_empty_report() {
        let wiper = TableWiper::new(MemoryStore::new(), DrainOptions::default());

        let report = wiper.wipe(&[]).await;

        assert!(report.outcomes.is_empty());
        assert_eq!(report.total_records(), 0);
        assert!(report.error().is_none());
    }

    #[tokio::test]
    async fn outcomes_follow_table_order() {
        let store = MemoryStore::new();
        let orders = seed_table(&store, "Orders", 3).await;
        let empty = seed_table(&store, "Empty", 0).await;

        let wiper = TableWiper::with_reporter(
            store.clone(),
            DrainOptions::default(),
            RecordingProgress::default(),
        );
        let report = wiper.wipe(&[orders.clone(), empty.clone()]).await;

        let tables = report
            .outcomes
            .iter()
            .map(|o| o.table.clone())
            .collect::<Vec<_>>();
        assert_eq!(tables, vec![orders.clone(), empty.clone()]);
        assert_eq!(report.outcome(&orders).unwrap().stats.records, 3);
        assert_eq!(report.outcome(&empty).unwrap().stats.records, 0);
        assert_eq!(report.succeeded(), 2);
    }

    #[tokio::test]
    async fn missing_table_fails_without_stopping_the_run() {
        let store = MemoryStore::new();
        let orders = seed_table(&store, "Orders", 5).await;

        let wiper = TableWiper::with_reporter(
            store.clone(),
            DrainOptions::default(),
            RecordingProgress::default(),
        );
        let report = wiper.wipe(&[TableName::new("Missing"), orders.clone()]).await;

        assert_eq!(report.failed(), 1);
        assert!(report.outcome(&orders).unwrap().is_drained());
        assert_eq!(
            report.error().unwrap().kinds(),
            vec![ErrorKind::TableNotFound]
        );
    }

    #[tokio::test]
    async fn verification_reports_failed_probe() {
        let memory = MemoryStore::new();
        let orders = seed_table(&memory, "Orders", 2).await;
        // Scan 1 reads the page, scan 2 ends the drain, scan 3 is the probe.
        let store = FaultyStore::wrap(
            memory,
            Faults {
                fail_scan_call: Some(3),
                ..Default::default()
            },
        );

        let wiper = TableWiper::with_reporter(
            store.clone(),
            DrainOptions {
                drain: wiper_config::shared::DrainConfig {
                    page_size: Some(2),
                    ..Default::default()
                },
                ..Default::default()
            },
            RecordingProgress::default(),
        )
        .with_verification(true);
        let report = wiper.wipe(std::slice::from_ref(&orders)).await;

        let outcome = report.outcome(&orders).unwrap();
        assert!(outcome.is_drained());
        assert!(matches!(
            outcome.verification,
            Some(Verification::Failed(_))
        ));
        assert!(report.error().is_none());
        assert_eq!(store.scan_calls(), 3);
    }

    #[tokio::test]
    async fn verification_is_skipped_in_dry_run() {
        let store = MemoryStore::new();
        let orders = seed_table(&store, "Orders", 4).await;

        let wiper = TableWiper::with_reporter(
            store.clone(),
            DrainOptions {
                mode: DrainMode::DryRun,
                ..Default::default()
            },
            RecordingProgress::default(),
        )
        .with_verification(true);
        let report = wiper.wipe(std::slice::from_ref(&orders)).await;

        assert_eq!(report.mode, DrainMode::DryRun);
        assert_eq!(report.total_records(), 4);
        assert_eq!(report.outcome(&orders).unwrap().verification, None);
        assert_eq!(store.len(&orders).await.unwrap(), 4);
    }
}
