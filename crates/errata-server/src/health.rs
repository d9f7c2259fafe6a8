use axum::extract::Request;
use futures::future::BoxFuture;
use http::StatusCode;

use crate::handler::{FallibleHandler, HandlerResult};
use crate::sink::{ResponseSink, write_text};

/// Liveness probe, always answers `200 ok`
#[derive(Debug, Clone, Copy, Default)]
pub struct Health;

impl FallibleHandler for Health {
    fn call<'a>(&'a self, sink: &'a mut dyn ResponseSink, _request: Request) -> BoxFuture<'a, HandlerResult> {
        write_text(sink, StatusCode::OK, "ok");
        Box::pin(async { Ok(()) })
    }
}
