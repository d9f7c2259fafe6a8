use http::StatusCode;

use crate::{ErrorValue, Problem};

/// Trait for domain errors that can be returned from fallible handlers
///
/// Implemented by each feature's error enum. Any implementor converts into an
/// [`ErrorValue`], so handlers can use `?` on domain results.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Short title safe to expose to API consumers
    fn title(&self) -> String {
        self.to_string()
    }

    /// Longer explanation, if any
    fn detail(&self) -> Option<String> {
        None
    }

    /// Offending input field, if the error is tied to one
    fn pointer(&self) -> Option<String> {
        None
    }
}

impl<E: HttpError> From<E> for ErrorValue {
    fn from(error: E) -> Self {
        let mut problem = Problem::new(error.title());
        if let Some(detail) = error.detail() {
            problem = problem.with_detail(detail);
        }
        if let Some(pointer) = error.pointer() {
            problem = problem.with_pointer(pointer);
        }

        Self::from_problems(error.status_code().as_u16(), [problem])
    }
}
