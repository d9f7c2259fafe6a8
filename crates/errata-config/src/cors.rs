use http::{HeaderValue, Method, header::HeaderName};
use serde::Deserialize;

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins (wildcard "*" or explicit list)
    #[serde(default)]
    pub origins: AnyOrArray,
    /// Allowed HTTP methods (wildcard "*" or explicit list)
    #[serde(default)]
    pub methods: AnyOrArray,
    /// Allowed request headers; the wildcard echoes what the browser asks for
    #[serde(default)]
    pub headers: AnyOrArray,
    /// Headers the browser may read from responses
    #[serde(default)]
    pub expose_headers: Vec<String>,
    /// Send `Access-Control-Allow-Credentials: true`
    #[serde(default)]
    pub credentials: bool,
    /// Preflight cache lifetime in seconds
    #[serde(default)]
    pub max_age: Option<u64>,
}

/// Either a wildcard "*" or explicit list of values
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawAnyOrArray")]
pub enum AnyOrArray {
    /// Match any value
    #[default]
    Any,
    /// Explicit list
    List(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnyOrArray {
    One(String),
    Many(Vec<String>),
}

impl From<RawAnyOrArray> for AnyOrArray {
    fn from(raw: RawAnyOrArray) -> Self {
        let values = match raw {
            RawAnyOrArray::One(value) => vec![value],
            RawAnyOrArray::Many(values) => values,
        };

        if values.iter().any(|v| v == "*") {
            Self::Any
        } else {
            Self::List(values)
        }
    }
}

impl AnyOrArray {
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    fn values(&self) -> &[String] {
        match self {
            Self::Any => &[],
            Self::List(values) => values,
        }
    }
}

impl CorsConfig {
    /// Check that every configured value is usable in a response header
    ///
    /// # Errors
    ///
    /// Returns an error if an origin, method or header name does not parse,
    /// or if credentials are enabled together with a wildcard origin
    pub fn validate(&self) -> anyhow::Result<()> {
        for origin in self.origins.values() {
            HeaderValue::from_str(origin).map_err(|e| anyhow::anyhow!("invalid CORS origin '{origin}': {e}"))?;
        }

        for method in self.methods.values() {
            Method::from_bytes(method.as_bytes())
                .map_err(|e| anyhow::anyhow!("invalid CORS method '{method}': {e}"))?;
        }

        for header in self.headers.values().iter().chain(&self.expose_headers) {
            HeaderName::from_bytes(header.as_bytes())
                .map_err(|e| anyhow::anyhow!("invalid CORS header name '{header}': {e}"))?;
        }

        if self.credentials && self.origins.is_any() {
            anyhow::bail!("CORS credentials cannot be combined with a wildcard origin");
        }

        Ok(())
    }
}
