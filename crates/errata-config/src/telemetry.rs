use serde::Deserialize;

/// Log output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives, e.g. `info,errata_server=debug`
    ///
    /// Falls back to `RUST_LOG`, then `info`.
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Output encoding for log lines
    #[serde(default)]
    pub format: LogFormat,
}

/// Log line encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}
