//! Logging setup for errata
//!
//! Installs a process-wide `tracing` subscriber. Everything else in the
//! workspace only emits events through the `tracing` macros.

use errata_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging from configuration
///
/// The filter comes from `telemetry.log_filter`, then `RUST_LOG`, then
/// `fallback_filter`.
///
/// # Errors
///
/// Returns an error if the filter directives are invalid or a global
/// subscriber is already installed
pub fn init(config: &TelemetryConfig, fallback_filter: &str) -> anyhow::Result<()> {
    let filter = build_filter(config, fallback_filter)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Text => registry.with(fmt_layer).try_init(),
        LogFormat::Json => registry.with(fmt_layer.json().flatten_event(true)).try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

fn build_filter(config: &TelemetryConfig, fallback_filter: &str) -> anyhow::Result<EnvFilter> {
    if let Some(ref directives) = config.log_filter
        && !directives.trim().is_empty()
    {
        return EnvFilter::try_new(directives).map_err(|e| anyhow::anyhow!("invalid telemetry.log_filter: {e}"));
    }

    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_filter)))
}
