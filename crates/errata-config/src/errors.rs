use errata_core::WireFormat;
use serde::Deserialize;

/// Error response configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorsConfig {
    /// Force one wire shape for every error response
    ///
    /// When unset, each error uses the shape of the constructor that built it.
    #[serde(default)]
    pub format: Option<WireFormat>,
}
