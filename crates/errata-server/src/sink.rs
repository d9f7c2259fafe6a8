use axum::body::{Body, Bytes};
use axum::response::Response;
use errata_core::ErrorValue;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use thiserror::Error;

use crate::handler::HandlerResult;

/// Errors raised by a response sink
#[derive(Debug, Error)]
pub enum SinkError {
    /// The peer is gone or the response was already finished
    #[error("response sink is closed")]
    Closed,
}

/// Response writer handed to fallible handlers
///
/// Headers can be changed until the response is finished. The status can be
/// changed until the first body write; after that it is committed.
pub trait ResponseSink: Send {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn set_status(&mut self, status: StatusCode);

    /// Append a chunk to the body
    ///
    /// # Errors
    ///
    /// Returns an error if the sink no longer accepts writes
    fn write(&mut self, chunk: Bytes) -> Result<(), SinkError>;
}

/// In-memory sink that finishes into an axum [`Response`]
#[derive(Debug, Default)]
pub struct BufferedSink {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    committed: bool,
    closed: bool,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status the response will be sent with
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Stop accepting body writes
    pub const fn close(&mut self) {
        self.closed = true;
    }

    /// Finish the response
    ///
    /// A sink nobody wrote to becomes `200 OK` with an empty body.
    pub fn into_response(self) -> Response {
        let status = self.status();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseSink for BufferedSink {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        if self.committed {
            tracing::warn!(
                committed = %self.status(),
                ignored = %status,
                "superfluous status after body write"
            );
            return;
        }
        self.status = Some(status);
    }

    fn write(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.committed = true;
        self.body.extend_from_slice(&chunk);
        Ok(())
    }
}

/// Write `value` as the JSON body of a successful response
///
/// A value that fails to serialize becomes a 500 error for the adapter to
/// report. A failed write is logged and otherwise ignored; the client is gone.
///
/// # Errors
///
/// Returns a 500 [`ErrorValue`] if `value` cannot be
/// serialized
pub fn write_json<T: Serialize>(sink: &mut dyn ResponseSink, status: StatusCode, value: &T) -> HandlerResult {
    let body = serde_json::to_vec(value).map_err(ErrorValue::internal)?;

    sink.set_status(status);
    finish_write(sink, Bytes::from(body));
    Ok(())
}

/// Write a plain-text body
pub fn write_text(sink: &mut dyn ResponseSink, status: StatusCode, text: &'static str) {
    sink.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    sink.set_status(status);
    finish_write(sink, Bytes::from_static(text.as_bytes()));
}

fn finish_write(sink: &mut dyn ResponseSink, body: Bytes) {
    if let Err(e) = sink.write(body) {
        tracing::warn!(error = %e, "failed to write response body");
    }
}
