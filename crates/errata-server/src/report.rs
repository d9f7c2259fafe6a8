use errata_core::{EncodeError, ErrorValue};

use crate::sink::SinkError;

/// Where the adapter sends what went wrong
///
/// Reporting is best-effort and cannot fail the request.
pub trait ErrorReporter: Send + Sync {
    /// A handler returned an error
    fn domain_error(&self, error: &ErrorValue);

    /// The error could not be serialized; the response goes out without a body
    fn encode_failed(&self, error: &ErrorValue, cause: &EncodeError);

    /// The serialized error could not be written
    fn write_failed(&self, error: &ErrorValue, cause: &SinkError);
}

/// Reports through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn domain_error(&self, error: &ErrorValue) {
        let errors = error.to_log_string();

        if error.status_code().is_server_error() {
            tracing::error!(status = error.status(), errors = %errors, "request failed");
        } else {
            tracing::warn!(status = error.status(), errors = %errors, "request failed");
        }
    }

    fn encode_failed(&self, error: &ErrorValue, cause: &EncodeError) {
        tracing::error!(status = error.status(), error = %cause, "failed to encode error response");
    }

    fn write_failed(&self, error: &ErrorValue, cause: &SinkError) {
        tracing::warn!(status = error.status(), error = %cause, "failed to write error response");
    }
}
