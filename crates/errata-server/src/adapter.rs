use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Bytes;
use axum::extract::Request;
use axum::response::Response;
use errata_config::ErrorsConfig;
use errata_core::{JsonEncoder, WireEncoder};
use futures::future::BoxFuture;
use http::header::{CONTENT_TYPE, HeaderValue};
use tower::Service;

use crate::handler::FallibleHandler;
use crate::report::{ErrorReporter, TracingReporter};
use crate::sink::{BufferedSink, ResponseSink};

/// Turns fallible handlers into plain request handlers
///
/// A failed handler is logged through the [`ErrorReporter`], its status is
/// applied and its error document is written as the response body.
#[derive(Clone)]
pub struct Adapter {
    reporter: Arc<dyn ErrorReporter>,
    encoder: Arc<dyn WireEncoder>,
}

impl Adapter {
    pub fn new(reporter: impl ErrorReporter + 'static, encoder: impl WireEncoder + 'static) -> Self {
        Self {
            reporter: Arc::new(reporter),
            encoder: Arc::new(encoder),
        }
    }

    /// Adapter that logs with `tracing` and encodes in the configured shape
    pub fn from_config(config: &ErrorsConfig) -> Self {
        Self::new(TracingReporter, JsonEncoder::new(config.format))
    }

    /// Wrap a handler into a `tower` service mountable on an axum router
    pub fn wrap<H: FallibleHandler>(&self, handler: H) -> Adapted<H> {
        Adapted {
            adapter: self.clone(),
            handler,
        }
    }

    /// Run `handler` for one request against `sink`
    pub async fn dispatch<H: FallibleHandler>(&self, sink: &mut dyn ResponseSink, request: Request, handler: &H) {
        sink.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let Err(error) = handler.call(sink, request).await else {
            return;
        };

        self.reporter.domain_error(&error);
        sink.set_status(error.status_code());

        let body = match self.encoder.encode(&error) {
            Ok(body) => body,
            Err(e) => {
                self.reporter.encode_failed(&error, &e);
                return;
            }
        };

        if let Err(e) = sink.write(Bytes::from(body)) {
            self.reporter.write_failed(&error, &e);
        }
    }
}

impl Default for Adapter {
    fn default() -> Self {
        Self::new(TracingReporter, JsonEncoder::default())
    }
}

/// A [`FallibleHandler`] served through an [`Adapter`]
#[derive(Clone)]
pub struct Adapted<H> {
    adapter: Adapter,
    handler: H,
}

impl<H: FallibleHandler> Service<Request> for Adapted<H> {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let this = self.clone();

        Box::pin(async move {
            let mut sink = BufferedSink::new();
            this.adapter.dispatch(&mut sink, request, &this.handler).await;
            Ok(sink.into_response())
        })
    }
}
