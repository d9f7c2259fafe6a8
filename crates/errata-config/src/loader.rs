use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then parses and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// expanded, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder cannot be expanded, TOML parsing
    /// fails, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the CORS section or the health path is unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(ref cors) = self.server.cors {
            cors.validate()?;
        }

        if self.server.health.enabled && !self.server.health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use errata_core::WireFormat;

    use crate::{AnyOrArray, Config, LogFormat};

    #[test]
    fn empty_file_is_valid() {
        let config = Config::from_toml("").unwrap();
        assert!(config.server.cors.is_none());
        assert!(config.errors.format.is_none());
        assert_eq!(config.telemetry.format, LogFormat::Text);
    }

    #[test]
    fn full_file() {
        let config = Config::from_toml(
            r#"
            [server]
            listen_address = "0.0.0.0:3000"

            [server.health]
            enabled = false

            [server.cors]
            origins = ["https://app.example"]
            methods = ["GET", "POST", "OPTIONS"]
            credentials = true

            [errors]
            format = "map"

            [telemetry]
            log_filter = "debug"
            format = "json"
        "#,
        )
        .unwrap();

        assert!(!config.server.health.enabled);
        let cors = config.server.cors.unwrap();
        assert_eq!(cors.origins, AnyOrArray::List(vec!["https://app.example".to_owned()]));
        assert!(cors.headers.is_any());
        assert_eq!(config.errors.format, Some(WireFormat::Map));
        assert_eq!(config.telemetry.log_filter.as_deref(), Some("debug"));
        assert_eq!(config.telemetry.format, LogFormat::Json);
    }

    #[test]
    fn unknown_section_rejected() {
        let err = Config::from_toml("[llm]\n").unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn invalid_cors_fails_validation() {
        let err = Config::from_toml("[server.cors]\ncredentials = true\n").unwrap_err();
        assert!(err.to_string().contains("wildcard origin"));
    }

    #[test]
    fn relative_health_path_rejected() {
        assert!(Config::from_toml("[server.health]\npath = \"health\"\n").is_err());
    }

    #[test]
    fn env_placeholders_expand_before_parsing() {
        temp_env::with_var("ERRATA_TEST_FORMAT", Some("list"), || {
            let config = Config::from_toml("[errors]\nformat = \"{{ env.ERRATA_TEST_FORMAT }}\"\n").unwrap();
            assert_eq!(config.errors.format, Some(WireFormat::List));
        });
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[errors]\nformat = \"jsonapi\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.errors.format, Some(WireFormat::JsonApi));
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = Config::load(std::path::Path::new("/nonexistent/errata.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/errata.toml"));
    }
}
