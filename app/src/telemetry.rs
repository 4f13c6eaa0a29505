//! Logging setup (spec.md §2 ambient stack: every silently-swallowed error
//! path in the core emits a `tracing` line instead of vanishing noiselessly).

use crate::config::TelemetryConfig;
use anyhow::{Context, Result};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initializes the global `tracing` subscriber from `config`.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    let subscriber = match config.log_format.as_str() {
        "json" => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true);
            subscriber.with(fmt_layer).boxed()
        }
        _ => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);
            subscriber.with(fmt_layer).boxed()
        }
    };

    subscriber.try_init().context("failed to initialize tracing subscriber")?;
    tracing::info!(log_level = %config.log_level, log_format = %config.log_format, "telemetry initialized");
    Ok(())
}
