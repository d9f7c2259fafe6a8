use std::sync::Arc;

use axum::extract::Request;
use errata_config::{AnyOrArray, CorsConfig};
use futures::future::BoxFuture;
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
    ACCESS_CONTROL_REQUEST_HEADERS, ORIGIN, VARY,
};
use http::{HeaderMap, HeaderValue, Method};

use crate::handler::{FallibleHandler, HandlerResult};
use crate::sink::ResponseSink;

/// CORS policy applied in front of a [`FallibleHandler`]
///
/// Headers are set before the inner handler runs, so they are present on
/// error responses too. Preflight (`OPTIONS`) requests are answered without
/// calling the inner handler.
#[derive(Debug, Clone)]
pub struct Cors {
    policy: Arc<Policy>,
}

#[derive(Debug)]
struct Policy {
    origins: Origins,
    methods: HeaderValue,
    headers: AllowHeaders,
    expose_headers: Option<HeaderValue>,
    credentials: bool,
    max_age: Option<HeaderValue>,
}

#[derive(Debug)]
enum Origins {
    Any,
    List(Vec<HeaderValue>),
}

#[derive(Debug)]
enum AllowHeaders {
    Mirror,
    List(HeaderValue),
}

impl Cors {
    /// Build the policy from the `server.cors` section
    ///
    /// # Errors
    ///
    /// Returns an error if a configured value cannot be used as a header value
    pub fn from_config(config: &CorsConfig) -> anyhow::Result<Self> {
        let origins = match config.origins {
            AnyOrArray::Any => Origins::Any,
            AnyOrArray::List(ref origins) => Origins::List(
                origins
                    .iter()
                    .map(|o| HeaderValue::from_str(o).map_err(|e| anyhow::anyhow!("invalid CORS origin '{o}': {e}")))
                    .collect::<anyhow::Result<_>>()?,
            ),
        };

        let methods = match config.methods {
            AnyOrArray::Any => HeaderValue::from_static("*"),
            AnyOrArray::List(ref methods) => joined(methods, "methods")?,
        };

        let headers = match config.headers {
            AnyOrArray::Any => AllowHeaders::Mirror,
            AnyOrArray::List(ref headers) => AllowHeaders::List(joined(headers, "headers")?),
        };

        let expose_headers = if config.expose_headers.is_empty() {
            None
        } else {
            Some(joined(&config.expose_headers, "expose_headers")?)
        };

        Ok(Self {
            policy: Arc::new(Policy {
                origins,
                methods,
                headers,
                expose_headers,
                credentials: config.credentials,
                max_age: config.max_age.map(HeaderValue::from),
            }),
        })
    }

    /// Allow any origin, method and header
    pub fn permissive() -> Self {
        Self {
            policy: Arc::new(Policy {
                origins: Origins::Any,
                methods: HeaderValue::from_static("*"),
                headers: AllowHeaders::Mirror,
                expose_headers: None,
                credentials: false,
                max_age: None,
            }),
        }
    }

    pub fn wrap<H: FallibleHandler>(&self, inner: H) -> CorsHandler<H> {
        CorsHandler {
            cors: self.clone(),
            inner,
        }
    }

    fn annotate(&self, request: &HeaderMap, response: &mut HeaderMap) {
        let policy = &self.policy;

        match policy.origins {
            Origins::Any => {
                response.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            }
            Origins::List(ref allowed) => {
                response.append(VARY, HeaderValue::from_static("origin"));
                if let Some(origin) = request.get(ORIGIN).filter(|o| allowed.contains(o)) {
                    response.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
                }
            }
        }

        response.insert(ACCESS_CONTROL_ALLOW_METHODS, policy.methods.clone());

        let allow_headers = match policy.headers {
            AllowHeaders::Mirror => {
                response.append(VARY, HeaderValue::from_static("access-control-request-headers"));
                request
                    .get(ACCESS_CONTROL_REQUEST_HEADERS)
                    .cloned()
                    .unwrap_or_else(|| HeaderValue::from_static("*"))
            }
            AllowHeaders::List(ref headers) => headers.clone(),
        };
        response.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);

        if let Some(ref expose) = policy.expose_headers {
            response.insert(ACCESS_CONTROL_EXPOSE_HEADERS, expose.clone());
        }

        if policy.credentials {
            response.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }

        if let Some(ref max_age) = policy.max_age {
            response.insert(ACCESS_CONTROL_MAX_AGE, max_age.clone());
        }
    }
}

fn joined(values: &[String], key: &str) -> anyhow::Result<HeaderValue> {
    HeaderValue::from_str(&values.join(", ")).map_err(|e| anyhow::anyhow!("invalid CORS {key}: {e}"))
}

/// A handler behind a [`Cors`] policy
#[derive(Debug, Clone)]
pub struct CorsHandler<H> {
    cors: Cors,
    inner: H,
}

impl<H: FallibleHandler> FallibleHandler for CorsHandler<H> {
    fn call<'a>(&'a self, sink: &'a mut dyn ResponseSink, request: Request) -> BoxFuture<'a, HandlerResult> {
        self.cors.annotate(request.headers(), sink.headers_mut());

        if request.method() == Method::OPTIONS {
            return Box::pin(async { Ok(()) });
        }

        self.inner.call(sink, request)
    }
}
