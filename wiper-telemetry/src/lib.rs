//! Tracing setup for the table wiper.
//!
//! Production-like environments log JSON lines, development logs pretty text. Both go to stdout.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::PanicHookInfo;
use std::sync::Once;
use thiserror::Error;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::{LogTracer, log_tracer::SetLoggerError};
use tracing_subscriber::{EnvFilter, FmtSubscriber, Registry, fmt, layer::SubscriberExt};
use wiper_config::Environment;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("could not bridge `log` records into tracing: {0}")]
    InitLogTracer(#[from] SetLoggerError),

    #[error("a global tracing subscriber is already installed: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),

    #[error("could not determine the environment: {0}")]
    Io(#[from] std::io::Error),
}

/// Keeps buffered log lines alive until dropped. Hold it until the end of `main`.
#[must_use]
pub enum LogFlusher {
    /// Flushes the non-blocking JSON writer on drop.
    Flusher(WorkerGuard),
    /// Logs are written synchronously.
    NullFlusher,
}

static TEST_TRACING: Once = Once::new();

/// Enables pretty tracing output in tests when `ENABLE_TRACING` is set.
///
/// Safe to call from every test, only the first call installs the subscriber.
pub fn init_test_tracing() {
    TEST_TRACING.call_once(|| {
        if std::env::var_os("ENABLE_TRACING").is_some() {
            let _flusher = init_tracing_for_environment("test", Environment::Dev)
                .expect("Failed to initialize tracing for tests");
        }
    });
}

/// Installs the global subscriber for `app_name`, choosing the format from `APP_ENVIRONMENT`.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    init_tracing_for_environment(app_name, Environment::load()?)
}

/// Installs the global subscriber for `app_name` in `environment`.
pub fn init_tracing_for_environment(
    app_name: &str,
    environment: Environment,
) -> Result<LogFlusher, TracingError> {
    LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let flusher = if environment.is_prod() {
        init_json_tracing(filter)?
    } else {
        init_pretty_tracing(filter)?
    };

    install_panic_hook();
    tracing::debug!(app_name, %environment, "tracing initialized");

    Ok(flusher)
}

fn init_json_tracing(filter: EnvFilter) -> Result<LogFlusher, TracingError> {
    let (stdout, guard) = tracing_appender::non_blocking(std::io::stdout());

    let json = fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(stdout);
    set_global_default(Registry::default().with(filter).with(json))?;

    Ok(LogFlusher::Flusher(guard))
}

fn init_pretty_tracing(filter: EnvFilter) -> Result<LogFlusher, TracingError> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_target(false)
        .pretty()
        .with_file(false)
        .with_line_number(false)
        .finish();
    set_global_default(subscriber)?;

    Ok(LogFlusher::NullFlusher)
}

/// Logs panics through tracing before handing them to the previous hook.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log_panic(info);
        previous(info);
    }));
}

fn log_panic(info: &PanicHookInfo) {
    let message = info
        .payload()
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    let location = info.location().map(ToString::to_string);

    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => tracing::error!(
            panic.message = message,
            panic.location = location,
            panic.backtrace = %backtrace,
            "panicked"
        ),
        _ => tracing::error!(
            panic.message = message,
            panic.location = location,
            "panicked, set RUST_BACKTRACE=1 for a backtrace"
        ),
    }
}
