use std::borrow::Cow;
use std::fmt::{self, Write as _};

use http::StatusCode;
use indexmap::IndexMap;

use crate::WireFormat;

/// One human-readable issue within an [`ErrorValue`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Problem {
    title: String,
    detail: Option<String>,
    source_pointer: Option<String>,
}

impl Problem {
    /// Create a problem with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: None,
            source_pointer: None,
        }
    }

    /// Attach a longer explanation
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Point at the offending input, e.g. `/data/attributes/name`
    #[must_use]
    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.source_pointer = Some(pointer.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn source_pointer(&self) -> Option<&str> {
        self.source_pointer.as_deref()
    }
}

/// Error payload, fixed by the constructor that built the value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Ordered problems (JSON:API style)
    Problems(Vec<Problem>),
    /// Field name to message, in insertion order
    Fields(IndexMap<String, String>),
    /// Plain messages, in order
    Messages(Vec<String>),
}

/// A failed request outcome: status code plus problems
///
/// Built once inside a fallible handler and consumed once by the adapter.
/// Nothing can mutate it after construction.
///
/// The `Display` output is the log string: every problem rendered as
/// `error #<n>: <title>` and concatenated in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    status: u16,
    payload: Payload,
}

impl ErrorValue {
    /// Build a single-problem error from positional arguments
    ///
    /// The first argument is the title, the second the detail and the third
    /// the source pointer. Missing arguments stay empty and extra ones are
    /// ignored. See [`error_value!`](crate::error_value) for the variadic form.
    pub fn new<I, S>(status: u16, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);

        let problem = Problem {
            title: args.next().unwrap_or_default(),
            detail: args.next(),
            source_pointer: args.next(),
        };

        Self::from_problems(status, [problem])
    }

    /// Build an error carrying several problems, one per failed check
    pub fn from_problems(status: u16, problems: impl IntoIterator<Item = Problem>) -> Self {
        Self {
            status,
            payload: Payload::Problems(problems.into_iter().collect()),
        }
    }

    /// Build an error from a field name to message map
    pub fn from_fields<K, V>(status: u16, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            status,
            payload: Payload::Fields(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    /// Build an error from a list of plain messages
    pub fn from_messages<S: Into<String>>(status: u16, messages: impl IntoIterator<Item = S>) -> Self {
        Self {
            status,
            payload: Payload::Messages(messages.into_iter().map(Into::into).collect()),
        }
    }

    /// Build a 500 from any error the handler cannot classify
    ///
    /// The cause's message becomes the detail.
    pub fn internal(cause: impl fmt::Display) -> Self {
        Self::new(500, ["internal server error".to_owned(), cause.to_string()])
    }

    /// Status code exactly as constructed
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Status code for the HTTP response line
    ///
    /// Codes `http` cannot represent are sent as 500.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Problems in order, whatever the payload shape
    ///
    /// Field entries become problems titled with the message and pointing
    /// at the field. Messages become title-only problems.
    pub fn problems(&self) -> Cow<'_, [Problem]> {
        match &self.payload {
            Payload::Problems(problems) => Cow::Borrowed(problems),
            Payload::Fields(fields) => Cow::Owned(
                fields
                    .iter()
                    .map(|(field, message)| Problem::new(message.as_str()).with_pointer(field.as_str()))
                    .collect(),
            ),
            Payload::Messages(messages) => Cow::Owned(messages.iter().map(|m| Problem::new(m.as_str())).collect()),
        }
    }

    /// Wire shape matching the constructor used
    pub const fn preferred_format(&self) -> WireFormat {
        match self.payload {
            Payload::Problems(_) => WireFormat::JsonApi,
            Payload::Fields(_) => WireFormat::Map,
            Payload::Messages(_) => WireFormat::List,
        }
    }

    /// Render every problem as `error #<n>: <title>`, back to back
    pub fn to_log_string(&self) -> String {
        self.problems()
            .iter()
            .enumerate()
            .fold(String::new(), |mut out, (i, problem)| {
                let _ = write!(out, "error #{}: {}", i + 1, problem.title);
                out
            })
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_log_string())
    }
}

impl std::error::Error for ErrorValue {}
