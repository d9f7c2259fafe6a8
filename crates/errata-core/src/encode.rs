use std::borrow::Cow;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ErrorValue, Problem};

/// JSON shape of an error response body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// `{"errors":[{"status","title","detail","source":{"pointer"}}]}`
    #[default]
    #[serde(rename = "jsonapi")]
    JsonApi,
    /// `{"errors":{"<field>":"<message>"},"status_code":N}`
    Map,
    /// `{"errors":["<message>"],"status_code":N}`
    List,
}

/// Errors raised while serializing an error document
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize error document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
#[serde(untagged)]
enum Document<'a> {
    JsonApi {
        errors: Vec<JsonApiError<'a>>,
    },
    Map {
        errors: IndexMap<Cow<'a, str>, Cow<'a, str>>,
        status_code: u16,
    },
    List {
        errors: Vec<&'a str>,
        status_code: u16,
    },
}

// Absent optional members are written as "", never skipped
#[derive(Serialize)]
struct JsonApiError<'a> {
    status: String,
    title: &'a str,
    detail: &'a str,
    source: JsonApiSource<'a>,
}

#[derive(Serialize)]
struct JsonApiSource<'a> {
    pointer: &'a str,
}

impl<'a> Document<'a> {
    fn build(status: u16, problems: &'a [Problem], format: WireFormat) -> Self {
        match format {
            WireFormat::JsonApi => Self::JsonApi {
                errors: problems
                    .iter()
                    .map(|p| JsonApiError {
                        status: status.to_string(),
                        title: p.title(),
                        detail: p.detail().unwrap_or_default(),
                        source: JsonApiSource {
                            pointer: p.source_pointer().unwrap_or_default(),
                        },
                    })
                    .collect(),
            },
            WireFormat::Map => Self::Map {
                errors: field_map(problems),
                status_code: status,
            },
            WireFormat::List => Self::List {
                errors: problems.iter().map(Problem::title).collect(),
                status_code: status,
            },
        }
    }
}

// Problems sharing a key are joined with "; " so none is lost
fn field_map(problems: &[Problem]) -> IndexMap<Cow<'_, str>, Cow<'_, str>> {
    let mut errors: IndexMap<Cow<'_, str>, Cow<'_, str>> = IndexMap::with_capacity(problems.len());

    for (i, problem) in problems.iter().enumerate() {
        let key = problem
            .source_pointer()
            .map_or_else(|| Cow::Owned((i + 1).to_string()), Cow::Borrowed);

        match errors.entry(key) {
            Entry::Occupied(mut entry) => {
                let merged = format!("{}; {}", entry.get(), problem.title());
                *entry.get_mut() = Cow::Owned(merged);
            }
            Entry::Vacant(entry) => {
                entry.insert(Cow::Borrowed(problem.title()));
            }
        }
    }

    errors
}

impl ErrorValue {
    /// Render the error as a JSON document in the given shape
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be represented as JSON
    pub fn to_wire_document(&self, format: WireFormat) -> Result<serde_json::Value, EncodeError> {
        let problems = self.problems();
        let document = Document::build(self.status(), &problems, format);
        Ok(serde_json::to_value(document)?)
    }

    /// Serialize the error document to bytes in the given shape
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails
    pub fn encode(&self, format: WireFormat) -> Result<Vec<u8>, EncodeError> {
        let problems = self.problems();
        let document = Document::build(self.status(), &problems, format);
        Ok(serde_json::to_vec(&document)?)
    }
}

/// Serialization strategy used by the handler adapter
pub trait WireEncoder: Send + Sync {
    /// Encode the response body for a failed request
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be produced; the adapter
    /// then answers with the status code alone
    fn encode(&self, error: &ErrorValue) -> Result<Vec<u8>, EncodeError>;
}

/// JSON encoder with an optional forced shape
///
/// Without a forced shape every error is written in the shape implied by its
/// constructor (see [`ErrorValue::preferred_format`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder {
    format: Option<WireFormat>,
}

impl JsonEncoder {
    pub const fn new(format: Option<WireFormat>) -> Self {
        Self { format }
    }

    /// Shape used for the given error
    pub fn format_for(&self, error: &ErrorValue) -> WireFormat {
        self.format.unwrap_or_else(|| error.preferred_format())
    }
}

impl WireEncoder for JsonEncoder {
    fn encode(&self, error: &ErrorValue) -> Result<Vec<u8>, EncodeError> {
        error.encode(self.format_for(error))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error_value;

    #[test]
    fn jsonapi_full_problem() {
        let err = error_value!(400, "title", "detail", "source");
        let doc = err.to_wire_document(WireFormat::JsonApi).unwrap();

        assert_eq!(
            doc,
            json!({
                "errors": [
                    {"status": "400", "title": "title", "detail": "detail", "source": {"pointer": "source"}}
                ]
            })
        );
    }

    #[test]
    fn jsonapi_absent_fields_are_empty_strings() {
        let err = error_value!(500, "boom");
        let doc = err.to_wire_document(WireFormat::JsonApi).unwrap();

        assert_eq!(doc["errors"][0]["detail"], "");
        assert_eq!(doc["errors"][0]["source"]["pointer"], "");
    }

    #[test]
    fn jsonapi_status_round_trips() {
        for status in [400_u16, 404, 418, 503] {
            let err = error_value!(status, "x");
            let bytes = err.encode(WireFormat::JsonApi).unwrap();
            let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

            let decoded: u16 = doc["errors"][0]["status"].as_str().unwrap().parse().unwrap();
            assert_eq!(decoded, status);
        }
    }

    #[test]
    fn jsonapi_preserves_problem_order() {
        let err = ErrorValue::from_problems(
            422,
            [
                Problem::new("volume").with_pointer("/data/attributes/volume"),
                Problem::new("reputation").with_detail("service not responding"),
            ],
        );
        let doc = err.to_wire_document(WireFormat::JsonApi).unwrap();

        assert_eq!(doc["errors"][0]["title"], "volume");
        assert_eq!(doc["errors"][1]["title"], "reputation");
        assert_eq!(doc["errors"][1]["status"], "422");
    }

    #[test]
    fn map_shape_from_fields() {
        let err = ErrorValue::from_fields(422, [("name", "is required"), ("price", "must be positive")]);
        let bytes = err.encode(WireFormat::Map).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"errors":{"name":"is required","price":"must be positive"},"status_code":422}"#
        );
    }

    #[test]
    fn map_shape_keys_unpointed_problems_by_position() {
        let err = ErrorValue::from_problems(
            400,
            [Problem::new("first"), Problem::new("second").with_pointer("/data/x")],
        );
        let doc = err.to_wire_document(WireFormat::Map).unwrap();

        assert_eq!(doc, json!({"errors": {"1": "first", "/data/x": "second"}, "status_code": 400}));
    }

    #[test]
    fn map_shape_joins_problems_sharing_a_pointer() {
        let err = ErrorValue::from_problems(
            422,
            [
                Problem::new("name is required").with_pointer("/data/attributes/name"),
                Problem::new("name too long").with_pointer("/data/attributes/name"),
                Problem::new("price missing").with_pointer("/data/attributes/price"),
            ],
        );
        let doc = err.to_wire_document(WireFormat::Map).unwrap();

        assert_eq!(
            doc,
            json!({
                "errors": {
                    "/data/attributes/name": "name is required; name too long",
                    "/data/attributes/price": "price missing"
                },
                "status_code": 422
            })
        );
    }

    #[test]
    fn map_shape_position_key_colliding_with_pointer_keeps_both() {
        let err = ErrorValue::from_problems(
            422,
            [Problem::new("unpointed"), Problem::new("pointer one").with_pointer("1")],
        );
        let doc = err.to_wire_document(WireFormat::Map).unwrap();

        assert_eq!(doc, json!({"errors": {"1": "unpointed; pointer one"}, "status_code": 422}));
    }

    #[test]
    fn list_shape_from_messages() {
        let err = ErrorValue::from_messages(400, ["msg1", "msg2"]);
        let bytes = err.encode(WireFormat::List).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"errors":["msg1","msg2"],"status_code":400}"#
        );
    }

    #[test]
    fn encoder_uses_constructor_shape_by_default() {
        let encoder = JsonEncoder::default();

        let list = ErrorValue::from_messages(400, ["a"]);
        let doc: serde_json::Value = serde_json::from_slice(&encoder.encode(&list).unwrap()).unwrap();
        assert_eq!(doc, json!({"errors": ["a"], "status_code": 400}));

        let single = error_value!(404, "missing");
        let doc: serde_json::Value = serde_json::from_slice(&encoder.encode(&single).unwrap()).unwrap();
        assert_eq!(doc["errors"][0]["status"], "404");
    }

    #[test]
    fn encoder_forced_shape_overrides_constructor() {
        let encoder = JsonEncoder::new(Some(WireFormat::List));
        let err = ErrorValue::from_fields(422, [("name", "is required")]);

        let doc: serde_json::Value = serde_json::from_slice(&encoder.encode(&err).unwrap()).unwrap();
        assert_eq!(doc, json!({"errors": ["is required"], "status_code": 422}));
    }

    #[test]
    fn wire_format_names() {
        let parsed: Vec<WireFormat> = serde_json::from_str(r#"["jsonapi","map","list"]"#).unwrap();
        assert_eq!(parsed, [WireFormat::JsonApi, WireFormat::Map, WireFormat::List]);
    }
}
