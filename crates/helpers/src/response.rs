//! Raw response writers.
//!
//! Handlers write into a [`ResponseSink`] instead of building responses ad hoc.
//! The sink tracks whether a response has already been sent and ignores every
//! write after the first one, so a helper can never clobber a reply that an
//! earlier step produced.

use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

/// Body written by the response helpers.
///
/// Structured values are serialized as JSON text; everything else is written
/// raw, without a content type.
#[derive(Debug, Clone, Default)]
pub enum ResponseBody {
    /// No body.
    #[default]
    Empty,
    /// Raw text.
    Text(String),
    /// Raw bytes, relayed verbatim.
    Bytes(Bytes),
    /// Structured value, serialized as `application/json`.
    Json(serde_json::Value),
}

impl From<&str> for ResponseBody {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Bytes> for ResponseBody {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<serde_json::Value> for ResponseBody {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl ResponseBody {
    fn into_response_with(self, status: StatusCode) -> Response {
        match self {
            Self::Empty => (status, Body::empty()).into_response(),
            Self::Text(text) => (status, Body::from(text)).into_response(),
            Self::Bytes(bytes) => (status, Body::from(bytes)).into_response(),
            Self::Json(value) => {
                let mut response = (status, Body::from(value.to_string())).into_response();
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                response
            }
        }
    }
}

/// Output sink for a single request.
///
/// Starts out pending and becomes sent on the first write. Later writes are
/// dropped and logged.
#[derive(Debug, Default)]
pub struct ResponseSink {
    state: SinkState,
}

#[derive(Debug, Default)]
enum SinkState {
    #[default]
    Pending,
    Sent(Response),
}

impl ResponseSink {
    /// Create an empty, unsent sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a response has already been written.
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self.state, SinkState::Sent(_))
    }

    /// Status of the written response, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match &self.state {
            SinkState::Pending => None,
            SinkState::Sent(response) => Some(response.status()),
        }
    }

    /// Write a complete response.
    ///
    /// Returns `false` and leaves the first response untouched if the sink was
    /// already sent.
    pub fn send(&mut self, response: impl IntoResponse) -> bool {
        if let SinkState::Sent(existing) = &self.state {
            tracing::debug!(
                status = %existing.status(),
                "Response already sent, ignoring write"
            );
            return false;
        }

        self.state = SinkState::Sent(response.into_response());
        true
    }
}

impl IntoResponse for ResponseSink {
    fn into_response(self) -> Response {
        match self.state {
            SinkState::Sent(response) => response,
            // Nothing handled the request
            SinkState::Pending => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

/// Write a status with an empty body.
pub fn respond_status(res: &mut ResponseSink, status: StatusCode) -> bool {
    respond_status_body(res, status, ResponseBody::Empty)
}

/// Write a status followed by `body`, then complete the response.
pub fn respond_status_body(
    res: &mut ResponseSink,
    status: StatusCode,
    body: impl Into<ResponseBody>,
) -> bool {
    res.send(body.into().into_response_with(status))
}

/// Write `body` with `200 OK`.
pub fn respond_success_body(res: &mut ResponseSink, body: impl Into<ResponseBody>) -> bool {
    respond_status_body(res, StatusCode::OK, body)
}
