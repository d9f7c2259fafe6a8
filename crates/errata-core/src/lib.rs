//! Structured HTTP error values for fallible request handlers
//!
//! An [`ErrorValue`] carries one status code and an ordered set of problems.
//! It renders to a log line and to a JSON error document in one of the
//! [`WireFormat`] shapes.

#![allow(clippy::must_use_candidate)]

mod encode;
mod error;
mod http_error;
mod macros;

pub use encode::{EncodeError, JsonEncoder, WireEncoder, WireFormat};
pub use error::{ErrorValue, Payload, Problem};
pub use http_error::HttpError;
