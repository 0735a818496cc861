use crate::config::load_wiper_config;
use crate::core::start_wiper_with_config;
use std::sync::Arc;
use tracing::{error, info};
use wiper_config::Environment;
use wiper_config::shared::WiperConfig;
use wiper_telemetry::init_tracing;

mod config;
mod core;

fn main() -> anyhow::Result<()> {
    let wiper_config = load_wiper_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;
    // Sentry has to be up before the runtime spawns any thread.
    let _sentry_guard = init_sentry(&wiper_config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(wiper_config))?;

    Ok(())
}

async fn async_main(wiper_config: WiperConfig) -> anyhow::Result<()> {
    if let Err(err) = start_wiper_with_config(wiper_config).await {
        let source: &(dyn std::error::Error + 'static) = err.as_ref();
        sentry::capture_error(source);
        error!("an error occurred in the table wiper: {err:#}");

        return Err(err);
    }

    Ok(())
}

/// Initializes Sentry when the configuration carries a DSN.
///
/// Tags every event with the "table-wiper" service and captures panics.
fn init_sentry(config: &WiperConfig) -> anyhow::Result<Option<sentry::ClientInitGuard>> {
    let Some(sentry_config) = &config.sentry else {
        info!("sentry not configured for table wiper, skipping initialization");
        return Ok(None);
    };

    info!("initializing sentry with supplied dsn");

    let environment = Environment::load()?;
    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(sentry_config.dsn.parse()?),
        environment: Some(environment.to_string().into()),
        integrations: vec![Arc::new(
            sentry::integrations::panic::PanicIntegration::new(),
        )],
        ..Default::default()
    });

    sentry::configure_scope(|scope| {
        scope.set_tag("service", "table-wiper");
    });

    Ok(Some(guard))
}
