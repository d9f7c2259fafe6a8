//! HTTP surface for errata
//!
//! Handlers here return `Result<(), ErrorValue>` instead of building error
//! responses themselves. The [`Adapter`] logs the failure, sets the status
//! and writes the error document, and [`Cors`] adds cross-origin headers and
//! answers preflight requests in front of any handler.

#![allow(clippy::must_use_candidate)]

mod adapter;
mod cors;
mod handler;
mod health;
mod report;
mod sink;
mod widgets;

use std::net::SocketAddr;

use axum::Router;
use axum::extract::Request;
use errata_config::Config;
use errata_core::error_value;
use futures::future::BoxFuture;
use tower_http::trace::TraceLayer;

pub use adapter::{Adapted, Adapter};
pub use cors::{Cors, CorsHandler};
pub use handler::{FallibleHandler, HandlerFn, HandlerResult, handler_fn};
pub use health::Health;
pub use report::{ErrorReporter, TracingReporter};
pub use sink::{BufferedSink, ResponseSink, SinkError, write_json, write_text};

use crate::widgets::{LegacyWidgetCollection, WidgetCollection, WidgetItem, WidgetStore};

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the CORS section cannot be turned into headers
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let adapter = Adapter::from_config(&config.errors);
        let cors = config.server.cors.as_ref().map(Cors::from_config).transpose()?;
        let routes = Routes { adapter, cors };

        let mut app = Router::new();

        // Health check, never behind CORS
        if config.server.health.enabled {
            app = app.route_service(&config.server.health.path, routes.adapter.wrap(Health));
        }

        // Widget catalogue
        let store = WidgetStore::seeded();
        app = routes.mount(app, "/widgets", WidgetCollection::new(store.clone()));
        app = routes.mount(app, "/widgets/{id}", WidgetItem::new(store.clone()));
        app = routes.mount(app, "/v0/widgets", LegacyWidgetCollection::new(store));

        app = routes.fallback(app, RouteNotFound);

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

/// Mounts fallible handlers behind the adapter, and behind CORS when configured
struct Routes {
    adapter: Adapter,
    cors: Option<Cors>,
}

impl Routes {
    fn mount<H: FallibleHandler>(&self, app: Router, path: &str, handler: H) -> Router {
        match self.cors {
            Some(ref cors) => app.route_service(path, self.adapter.wrap(cors.wrap(handler))),
            None => app.route_service(path, self.adapter.wrap(handler)),
        }
    }

    fn fallback<H: FallibleHandler>(&self, app: Router, handler: H) -> Router {
        match self.cors {
            Some(ref cors) => app.fallback_service(self.adapter.wrap(cors.wrap(handler))),
            None => app.fallback_service(self.adapter.wrap(handler)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RouteNotFound;

impl FallibleHandler for RouteNotFound {
    fn call<'a>(&'a self, _sink: &'a mut dyn ResponseSink, request: Request) -> BoxFuture<'a, HandlerResult> {
        let path = request.uri().path().to_owned();
        Box::pin(async move { Err(error_value!(404, "route not found", format!("no route for {path}"))) })
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
    use http::{Method, StatusCode};
    use tower::ServiceExt;

    use super::*;

    fn request(method: Method, uri: &str) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn router(toml: &str) -> Router {
        let config = Config::from_toml(toml).unwrap();
        Server::new(&config).unwrap().into_router()
    }

    #[test]
    fn default_listen_address() {
        let server = Server::new(&Config::default()).unwrap();
        assert_eq!(server.listen_address(), SocketAddr::from(([0, 0, 0, 0], 3000)));
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let response = router("").oneshot(request(Method::GET, "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn disabled_health_falls_through_to_404() {
        let response = router("[server.health]\nenabled = false\n")
            .oneshot(request(Method::GET, "/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = router("").oneshot(request(Method::GET, "/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["errors"][0]["title"], "route not found");
        assert_eq!(body["errors"][0]["detail"], "no route for /nope");
    }

    #[tokio::test]
    async fn configured_format_is_used() {
        let response = router("[errors]\nformat = \"list\"\n")
            .oneshot(request(Method::GET, "/widgets/42"))
            .await
            .unwrap();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"errors":["widget not found"],"status_code":404}"#);
    }

    #[tokio::test]
    async fn cors_wraps_routes_when_configured() {
        let app = router("[server.cors]\norigins = \"*\"\n");

        let response = app
            .clone()
            .oneshot(request(Method::OPTIONS, "/widgets"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let response = app.oneshot(request(Method::GET, "/health")).await.unwrap();
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn no_cors_headers_without_config() {
        let response = router("").oneshot(request(Method::GET, "/widgets")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
