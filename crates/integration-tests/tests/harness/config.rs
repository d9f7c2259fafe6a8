//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use errata_config::{AnyOrArray, Config, CorsConfig};
use errata_core::WireFormat;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Defaults with a loopback listen address
    pub fn new() -> Self {
        let mut config = Config::default();
        config.server.listen_address = Some(SocketAddr::from(([127, 0, 0, 1], 0)));
        Self { config }
    }

    /// Allow every origin, method and header
    pub fn with_permissive_cors(self) -> Self {
        self.with_cors(CorsConfig::default())
    }

    /// Allow only the given origins
    pub fn with_cors_origins(self, origins: &[&str]) -> Self {
        self.with_cors(CorsConfig {
            origins: AnyOrArray::List(origins.iter().map(|o| (*o).to_owned()).collect()),
            methods: AnyOrArray::List(vec!["GET".to_owned(), "POST".to_owned()]),
            max_age: Some(600),
            ..CorsConfig::default()
        })
    }

    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Force one error body shape for every response
    pub fn with_error_format(mut self, format: WireFormat) -> Self {
        self.config.errors.format = Some(format);
        self
    }

    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config, validated like a loaded file
    pub fn build(self) -> Config {
        self.config.validate().expect("test config is valid");
        self.config
    }
}
