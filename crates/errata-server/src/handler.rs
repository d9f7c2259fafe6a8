use axum::extract::Request;
use errata_core::ErrorValue;
use futures::future::BoxFuture;

use crate::sink::ResponseSink;

/// Outcome of a fallible handler
pub type HandlerResult = Result<(), ErrorValue>;

/// A request handler that may fail with an [`ErrorValue`]
///
/// On success the handler owns status and body. On failure it must not have
/// written a body; the [`Adapter`](crate::Adapter) turns the error into the
/// response.
pub trait FallibleHandler: Clone + Send + Sync + 'static {
    fn call<'a>(&'a self, sink: &'a mut dyn ResponseSink, request: Request) -> BoxFuture<'a, HandlerResult>;
}

/// Handler built from a closure, see [`handler_fn`]
#[derive(Clone)]
pub struct HandlerFn<F>(F);

/// Turn a closure into a [`FallibleHandler`]
///
/// ```
/// use errata_core::error_value;
/// use errata_server::handler_fn;
///
/// let teapot = handler_fn(|_sink, _request| Box::pin(async { Err(error_value!(418, "short and stout")) }));
/// # let _ = teapot;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseSink, Request) -> BoxFuture<'a, HandlerResult> + Clone + Send + Sync + 'static,
{
    HandlerFn(f)
}

impl<F> FallibleHandler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseSink, Request) -> BoxFuture<'a, HandlerResult> + Clone + Send + Sync + 'static,
{
    fn call<'a>(&'a self, sink: &'a mut dyn ResponseSink, request: Request) -> BoxFuture<'a, HandlerResult> {
        (self.0)(sink, request)
    }
}
