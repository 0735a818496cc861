use wiper::drain::{DrainMode, DrainOptions};
use wiper::error::{ErrorKind, WipeResult};
use wiper::store::TableStore;
use wiper::store::memory::MemoryStore;
use wiper::test_utils::faulty_store::{FaultyStore, Faults};
use wiper::test_utils::progress::RecordingProgress;
use wiper::test_utils::table::{seed_table, seed_table_with_ids};
use wiper::types::{PrimaryKey, Record, ScanPage, ScanRequest, TableName};
use wiper::wiper::{TableStatus, TableWiper, Verification};
use wiper_config::shared::DrainConfig;
use wiper_telemetry::init_test_tracing;

fn options(page_size: u32) -> DrainOptions {
    DrainOptions {
        drain: DrainConfig {
            page_size: Some(page_size),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_table_does_not_stop_the_others() {
    init_test_tracing();

    let memory = MemoryStore::new();
    let a = seed_table(&memory, "A", 30).await;
    let b = seed_table(&memory, "B", 30).await;
    let c = seed_table(&memory, "C", 30).await;

    // B fails on its second page request, after its first page was deleted.
    let store = FaultyStore::wrap(
        memory.clone(),
        Faults {
            table: Some(b.clone()),
            fail_scan_call: Some(2),
            ..Default::default()
        },
    );

    let progress = RecordingProgress::default();
    let wiper = TableWiper::with_reporter(store, options(10), progress.clone());
    let report = wiper.wipe(&[a.clone(), b.clone(), c.clone()]).await;

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    assert_eq!(memory.len(&a).await.unwrap(), 0);
    assert_eq!(memory.len(&b).await.unwrap(), 20);
    assert_eq!(memory.len(&c).await.unwrap(), 0);

    let outcome = report.outcome(&b).unwrap();
    assert_eq!(outcome.stats.records, 10);
    assert!(matches!(
        &outcome.status,
        TableStatus::Failed(err) if err.kind() == ErrorKind::StoreOperationFailed
    ));

    assert_eq!(report.outcome(&c).unwrap().stats.records, 30);
    assert_eq!(progress.pages(&c), vec![10, 10, 10]);
}

#[tokio::test(flavor = "multi_thread")]
async fn report_error_aggregates_every_failed_table() {
    init_test_tracing();

    let memory = MemoryStore::new();
    let orders = seed_table(&memory, "Orders", 5).await;

    let wiper = TableWiper::with_reporter(memory, options(10), RecordingProgress::default());
    let report = wiper
        .wipe(&[
            TableName::new("Missing1"),
            orders.clone(),
            TableName::new("Missing2"),
        ])
        .await;

    let err = report.error().unwrap();
    assert_eq!(
        err.kinds(),
        vec![ErrorKind::TableNotFound, ErrorKind::TableNotFound]
    );
    assert!(err.to_string().starts_with("Multiple errors occurred (2 total):"));
    assert_eq!(report.total_records(), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn orders_and_empty_scenarios() {
    init_test_tracing();

    let store = MemoryStore::new();
    let orders = seed_table_with_ids(&store, "Orders", [1, 2, 3]).await;
    let empty = seed_table(&store, "Empty", 0).await;

    let wiper = TableWiper::with_reporter(
        store.clone(),
        DrainOptions::default(),
        RecordingProgress::default(),
    );
    let report = wiper.wipe(&[orders.clone(), empty.clone()]).await;

    assert!(report.error().is_none());
    assert_eq!(report.outcome(&orders).unwrap().stats.records, 3);
    assert_eq!(report.outcome(&empty).unwrap().stats.records, 0);
    assert_eq!(store.len(&orders).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn verification_marks_tables_as_empty() {
    init_test_tracing();

    let store = MemoryStore::new();
    let orders = seed_table(&store, "Orders", 25).await;

    let wiper = TableWiper::with_reporter(store, options(10), RecordingProgress::default())
        .with_verification(true);
    let report = wiper.wipe(std::slice::from_ref(&orders)).await;

    assert_eq!(
        report.outcome(&orders).unwrap().verification,
        Some(Verification::Empty)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn verification_reports_records_written_after_the_drain() {
    init_test_tracing();

    let memory = MemoryStore::new();
    let first = seed_table(&memory, "First", 5).await;
    let second = seed_table(&memory, "Second", 5).await;

    // A writer refills the first table while the second one is being drained.
    let store = RefillingStore {
        inner: memory.clone(),
        refill: first.clone(),
        trigger: second.clone(),
    };

    let wiper = TableWiper::with_reporter(store, options(10), RecordingProgress::default())
        .with_verification(true);
    let report = wiper.wipe(&[first.clone(), second.clone()]).await;

    // Leftovers are reported but the table still counts as drained.
    let outcome = report.outcome(&first).unwrap();
    assert!(outcome.is_drained());
    assert_eq!(
        outcome.verification,
        Some(Verification::RecordsRemain { sampled: 2 })
    );
    assert_eq!(
        report.outcome(&second).unwrap().verification,
        Some(Verification::Empty)
    );
    assert!(report.error().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn dry_run_leaves_every_table_untouched() {
    init_test_tracing();

    let store = MemoryStore::new();
    let a = seed_table(&store, "A", 12).await;
    let b = seed_table(&store, "B", 0).await;

    let mut options = options(5);
    options.mode = DrainMode::DryRun;

    let wiper = TableWiper::with_reporter(store.clone(), options, RecordingProgress::default())
        .with_verification(true);
    let report = wiper.wipe(&[a.clone(), b.clone()]).await;

    assert_eq!(report.mode, DrainMode::DryRun);
    assert_eq!(report.outcome(&a).unwrap().stats.records, 12);
    assert_eq!(report.outcome(&b).unwrap().stats.records, 0);
    assert_eq!(store.len(&a).await.unwrap(), 12);
    assert_eq!(store.delete_calls(), 0);
}

/// Re-inserts two records into `refill` every time a batch of `trigger` is deleted.
struct RefillingStore {
    inner: MemoryStore,
    refill: TableName,
    trigger: TableName,
}

impl TableStore for RefillingStore {
    async fn scan_page(&self, table: &TableName, request: ScanRequest) -> WipeResult<ScanPage> {
        self.inner.scan_page(table, request).await
    }

    async fn delete_batch(
        &self,
        table: &TableName,
        keys: Vec<PrimaryKey>,
    ) -> WipeResult<Vec<PrimaryKey>> {
        if table == &self.trigger {
            self.inner
                .insert_many(
                    &self.refill,
                    [100, 101].map(|id| Record::new().with("id", id)),
                )
                .await?;
        }

        self.inner.delete_batch(table, keys).await
    }
}
