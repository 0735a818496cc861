use tracing::{debug, info, warn};
use wiper::drain::{DrainMode, DrainOptions};
use wiper::store::dynamodb::DynamoDbStore;
use wiper::types::TableName;
use wiper::wiper::{TableWiper, Verification, WipeReport};
use wiper_config::shared::{
    CredentialsConfig, DrainConfig, DynamoDbConfig, RetryConfig, WiperConfig,
};

/// Starts the table wiper with the provided configuration.
///
/// Builds the DynamoDB client once, drains every configured table in order and fails when at
/// least one table could not be drained.
pub async fn start_wiper_with_config(wiper_config: WiperConfig) -> anyhow::Result<()> {
    info!("starting table wiper");

    log_config(&wiper_config);

    let store = DynamoDbStore::connect(&wiper_config.store).await;
    let tables = wiper_config
        .tables
        .iter()
        .map(TableName::new)
        .collect::<Vec<_>>();

    let wiper = TableWiper::new(store, DrainOptions::from_config(&wiper_config))
        .with_verification(wiper_config.verify);
    let report = wiper.wipe(&tables).await;

    conclude(&report, wiper_config.next_steps.as_deref())?;

    info!("table wiper completed");

    Ok(())
}

/// Logs the summary of `report` and fails when any table could not be drained, so the process
/// exits with a non-zero status.
fn conclude(report: &WipeReport, next_steps: Option<&str>) -> anyhow::Result<()> {
    log_report(report, next_steps);

    match report.error() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn log_report(report: &WipeReport, next_steps: Option<&str>) {
    let leftovers = report
        .outcomes
        .iter()
        .filter(|o| matches!(o.verification, Some(Verification::RecordsRemain { .. })))
        .count();

    match report.mode {
        DrainMode::Delete if report.failed() == 0 => info!(
            tables = report.outcomes.len(),
            deleted = report.total_records(),
            "database reset complete"
        ),
        DrainMode::Delete => warn!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            deleted = report.total_records(),
            "database reset finished with failed tables"
        ),
        DrainMode::DryRun => info!(
            tables = report.outcomes.len(),
            records = report.total_records(),
            "dry run complete, set dry_run to false to delete these records"
        ),
    }

    if leftovers > 0 {
        warn!(tables = leftovers, "some tables still hold records, run the wiper again");
    }

    if report.mode == DrainMode::Delete
        && report.failed() == 0
        && let Some(next_steps) = next_steps
    {
        info!("next steps: {next_steps}");
    }
}

fn log_config(config: &WiperConfig) {
    debug!(
        tables = ?config.tables,
        dry_run = config.dry_run,
        verify = config.verify,
        "wiper config"
    );
    log_store_config(&config.store);
    log_drain_config(&config.drain);
    log_retry_config(&config.retry);
}

fn log_store_config(config: &DynamoDbConfig) {
    match &config.credentials {
        CredentialsConfig::Profile { name } => debug!(
            region = config.region,
            endpoint_url = config.endpoint_url,
            profile = name,
            "using dynamodb store config"
        ),
        CredentialsConfig::Static {
            access_key_id,
            secret_access_key: _,
        } => debug!(
            region = config.region,
            endpoint_url = config.endpoint_url,
            access_key_id,
            "using dynamodb store config with static credentials"
        ),
    }
}

fn log_drain_config(config: &DrainConfig) {
    debug!(
        primary_key = config.primary_key,
        page_size = config.page_size,
        progress_interval = config.progress_interval,
        delete_batch_size = config.delete_batch_size,
        "drain config"
    );
}

fn log_retry_config(config: &RetryConfig) {
    debug!(
        max_attempts = config.max_attempts,
        initial_delay_ms = config.initial_delay_ms,
        max_delay_ms = config.max_delay_ms,
        backoff_factor = config.backoff_factor,
        "retry config"
    );
}

#[cfg(test)]
mod tests {
    use wiper::error::{ErrorKind, WipeError};
    use wiper::store::memory::MemoryStore;
    use wiper::types::Record;

    use super::*;

    async fn report_for(store: MemoryStore, tables: &[&str]) -> WipeReport {
        let tables = tables.iter().map(|t| TableName::new(*t)).collect::<Vec<_>>();
        TableWiper::new(store, DrainOptions::default())
            .with_verification(true)
            .wipe(&tables)
            .await
    }

    #[tokio::test]
    async fn drained_tables_conclude_successfully() {
        let store = MemoryStore::new();
        let orders = TableName::new("Orders");
        store.create_table(orders.clone(), "id").await;
        store
            .insert_many(&orders, (0..3).map(|id| Record::new().with("id", id)))
            .await
            .unwrap();

        let report = report_for(store, &["Orders"]).await;

        assert!(conclude(&report, Some("npm run reset:import")).is_ok());
    }

    #[tokio::test]
    async fn failed_table_concludes_with_an_error() {
        let store = MemoryStore::new();
        store.create_table(TableName::new("Orders"), "id").await;

        let report = report_for(store, &["Orders", "Missing"]).await;
        assert_eq!(report.succeeded(), 1);

        let err = conclude(&report, Some("npm run reset:import")).unwrap_err();
        let err = err.downcast_ref::<WipeError>().unwrap();
        assert_eq!(err.kinds(), vec![ErrorKind::TableNotFound]);
    }
}
