//! In-memory widget catalogue served through fallible handlers
//!
//! `/widgets` speaks a JSON:API style document and reports validation
//! failures as one problem per field. `/v0/widgets` is the older flat API and
//! reports the same failures as a field map.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{FromRequestParts, Path, Request};
use errata_core::{ErrorValue, HttpError, Problem};
use futures::future::BoxFuture;
use http::header::{HeaderValue, LOCATION};
use http_body_util::LengthLimitError;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::handler::{FallibleHandler, HandlerResult};
use crate::sink::{ResponseSink, write_json};

const MAX_BODY_BYTES: usize = 64 * 1024;
const MAX_NAME_CHARS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Widget {
    pub id: u64,
    pub name: String,
    pub price_cents: u64,
    pub tags: Vec<String>,
}

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("widget not found")]
    NotFound(u64),
    #[error("invalid widget id")]
    InvalidId(String),
    #[error("malformed request body")]
    MalformedBody(String),
    #[error("request body too large")]
    BodyTooLarge,
    #[error("method not allowed")]
    MethodNotAllowed(Method),
}

impl HttpError for WidgetError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidId(_) | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::NotFound(id) => Some(format!("no widget with id {id}")),
            Self::InvalidId(reason) | Self::MalformedBody(reason) => Some(reason.clone()),
            Self::MethodNotAllowed(method) => Some(format!("{method} is not supported here")),
            Self::BodyTooLarge => Some(format!("limit is {MAX_BODY_BYTES} bytes")),
        }
    }

    fn pointer(&self) -> Option<String> {
        match self {
            Self::MalformedBody(_) => Some("/data".to_owned()),
            _ => None,
        }
    }
}

/// Shared widget storage
#[derive(Debug, Clone, Default)]
pub struct WidgetStore {
    inner: Arc<RwLock<Catalogue>>,
}

#[derive(Debug, Default)]
struct Catalogue {
    next_id: u64,
    widgets: BTreeMap<u64, Widget>,
}

impl WidgetStore {
    /// Store pre-filled with a couple of widgets
    pub fn seeded() -> Self {
        let mut catalogue = Catalogue::default();
        catalogue.insert(Attributes {
            name: "sprocket".to_owned(),
            price_cents: 250,
            tags: vec!["metal".to_owned()],
        });
        catalogue.insert(Attributes {
            name: "flange".to_owned(),
            price_cents: 1200,
            tags: Vec::new(),
        });

        Self {
            inner: Arc::new(RwLock::new(catalogue)),
        }
    }

    pub async fn get(&self, id: u64) -> Result<Widget, WidgetError> {
        self.inner
            .read()
            .await
            .widgets
            .get(&id)
            .cloned()
            .ok_or(WidgetError::NotFound(id))
    }

    pub async fn list(&self) -> Vec<Widget> {
        self.inner.read().await.widgets.values().cloned().collect()
    }

    async fn create(&self, attributes: Attributes) -> Widget {
        self.inner.write().await.insert(attributes)
    }
}

impl Catalogue {
    fn insert(&mut self, attributes: Attributes) -> Widget {
        self.next_id += 1;
        let widget = Widget {
            id: self.next_id,
            name: attributes.name,
            price_cents: attributes.price_cents,
            tags: attributes.tags,
        };
        self.widgets.insert(widget.id, widget.clone());
        widget
    }
}

/// Validated widget fields
struct Attributes {
    name: String,
    price_cents: u64,
    tags: Vec<String>,
}

/// Widget fields as sent by clients, before validation
#[derive(Debug, Default, Deserialize)]
struct RawAttributes {
    name: Option<String>,
    price_cents: Option<i64>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Deserialize)]
struct CreateDocument {
    data: CreateData,
}

#[derive(Deserialize)]
struct CreateData {
    #[serde(default)]
    attributes: RawAttributes,
}

#[derive(Serialize)]
struct Document<T> {
    data: T,
}

impl RawAttributes {
    /// Check every field, collecting `(field, message)` for each failure
    fn validate(self) -> Result<Attributes, Vec<(&'static str, String)>> {
        let mut failures = Vec::new();

        let name = self.name.unwrap_or_default();
        let name = name.trim();
        if name.is_empty() {
            failures.push(("name", "name is required".to_owned()));
        } else if name.chars().count() > MAX_NAME_CHARS {
            failures.push(("name", format!("name must be at most {MAX_NAME_CHARS} characters")));
        }

        let price_cents = match self.price_cents.map(u64::try_from) {
            Some(Ok(price)) => price,
            Some(Err(_)) => {
                failures.push(("price_cents", "price_cents must not be negative".to_owned()));
                0
            }
            None => {
                failures.push(("price_cents", "price_cents is required".to_owned()));
                0
            }
        };

        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            failures.push(("tags", "tags must not contain blank entries".to_owned()));
        }

        if failures.is_empty() {
            Ok(Attributes {
                name: name.to_owned(),
                price_cents,
                tags: self.tags,
            })
        } else {
            Err(failures)
        }
    }
}

async fn read_json<T: DeserializeOwned>(request: Request) -> Result<T, ErrorValue> {
    let bytes = to_bytes(request.into_body(), MAX_BODY_BYTES).await.map_err(|err| {
        if std::error::Error::source(&err).is_some_and(|source| source.is::<LengthLimitError>()) {
            ErrorValue::from(WidgetError::BodyTooLarge)
        } else {
            ErrorValue::internal(err)
        }
    })?;

    Ok(serde_json::from_slice(&bytes).map_err(|e| WidgetError::MalformedBody(e.to_string()))?)
}

fn set_location(sink: &mut dyn ResponseSink, prefix: &str, id: u64) {
    if let Ok(location) = HeaderValue::from_str(&format!("{prefix}/{id}")) {
        sink.headers_mut().insert(LOCATION, location);
    }
}

/// `GET /widgets` and `POST /widgets`
#[derive(Debug, Clone)]
pub struct WidgetCollection {
    store: WidgetStore,
}

impl WidgetCollection {
    pub const fn new(store: WidgetStore) -> Self {
        Self { store }
    }

    async fn handle(&self, sink: &mut dyn ResponseSink, request: Request) -> HandlerResult {
        let method = request.method().clone();

        if method == Method::GET {
            let widgets = self.store.list().await;
            return write_json(sink, StatusCode::OK, &Document { data: widgets });
        }

        if method != Method::POST {
            return Err(WidgetError::MethodNotAllowed(method).into());
        }

        let document: CreateDocument = read_json(request).await?;

        let attributes = document.data.attributes.validate().map_err(|failures| {
            ErrorValue::from_problems(
                StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
                failures.into_iter().map(|(field, message)| {
                    Problem::new("invalid attribute")
                        .with_detail(message)
                        .with_pointer(format!("/data/attributes/{field}"))
                }),
            )
        })?;

        let widget = self.store.create(attributes).await;
        tracing::debug!(id = widget.id, name = %widget.name, "widget created");

        set_location(sink, "/widgets", widget.id);
        write_json(sink, StatusCode::CREATED, &Document { data: widget })
    }
}

impl FallibleHandler for WidgetCollection {
    fn call<'a>(&'a self, sink: &'a mut dyn ResponseSink, request: Request) -> BoxFuture<'a, HandlerResult> {
        Box::pin(self.handle(sink, request))
    }
}

/// `GET /widgets/{id}`
#[derive(Debug, Clone)]
pub struct WidgetItem {
    store: WidgetStore,
}

impl WidgetItem {
    pub const fn new(store: WidgetStore) -> Self {
        Self { store }
    }

    async fn handle(&self, sink: &mut dyn ResponseSink, request: Request) -> HandlerResult {
        if request.method() != Method::GET {
            return Err(WidgetError::MethodNotAllowed(request.method().clone()).into());
        }

        let (mut parts, _body) = request.into_parts();
        let Path(id) = Path::<u64>::from_request_parts(&mut parts, &())
            .await
            .map_err(|rejection| WidgetError::InvalidId(rejection.body_text()))?;

        let widget = self.store.get(id).await?;
        write_json(sink, StatusCode::OK, &Document { data: widget })
    }
}

impl FallibleHandler for WidgetItem {
    fn call<'a>(&'a self, sink: &'a mut dyn ResponseSink, request: Request) -> BoxFuture<'a, HandlerResult> {
        Box::pin(self.handle(sink, request))
    }
}

/// `POST /v0/widgets`, the flat legacy API
///
/// Validation failures are reported as a `field -> message` map.
#[derive(Debug, Clone)]
pub struct LegacyWidgetCollection {
    store: WidgetStore,
}

impl LegacyWidgetCollection {
    pub const fn new(store: WidgetStore) -> Self {
        Self { store }
    }

    async fn handle(&self, sink: &mut dyn ResponseSink, request: Request) -> HandlerResult {
        if request.method() != Method::POST {
            return Err(WidgetError::MethodNotAllowed(request.method().clone()).into());
        }

        let raw: RawAttributes = read_json(request).await?;
        let attributes = raw
            .validate()
            .map_err(|failures| ErrorValue::from_fields(StatusCode::UNPROCESSABLE_ENTITY.as_u16(), failures))?;

        let widget = self.store.create(attributes).await;

        set_location(sink, "/widgets", widget.id);
        write_json(sink, StatusCode::CREATED, &widget)
    }
}

impl FallibleHandler for LegacyWidgetCollection {
    fn call<'a>(&'a self, sink: &'a mut dyn ResponseSink, request: Request) -> BoxFuture<'a, HandlerResult> {
        Box::pin(self.handle(sink, request))
    }
}
