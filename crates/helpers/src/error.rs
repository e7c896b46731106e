//! Centralized error replies with Sentry integration.
//!
//! Every error that reaches the client goes through [`error_handler`], which
//! picks the status, hides internal detail behind a generic message for 500s,
//! and reports the error through an injected [`ErrorReporter`]. Route handlers
//! return `Result<T, AppError>`; the `IntoResponse` impl routes through the
//! same function with the default [`TracingReporter`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::response::{ResponseSink, respond_status_body};

/// Message sent to clients in place of the real one for 500 replies.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Application-level error type for the request helpers.
#[derive(Debug, Error)]
pub enum AppError {
    /// No customer identity could be resolved for the request.
    #[error("User not logged in.")]
    Unauthenticated,

    /// The outbound GET failed, either in transport or with a non-2xx status.
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),

    /// Error carrying an explicit HTTP status; its message is shown to clients.
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Build an error that replies with `status` and `message`.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Unauthenticated | Self::Upstream(_) | Self::Session(_) | Self::Internal(_) => {
                None
            }
        }
    }
}

/// Sink for error diagnostics.
///
/// Injected into [`error_handler`] so callers decide where error detail goes.
pub trait ErrorReporter: Send + Sync {
    /// Record `err`, which is about to be answered with `status`.
    fn report(&self, err: &AppError, status: StatusCode);
}

/// Reports errors through `tracing`, capturing server errors to Sentry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, err: &AppError, status: StatusCode) {
        if status.is_server_error() {
            let event_id = sentry::capture_error(err);
            tracing::error!(
                error = %err,
                detail = ?err,
                status = status.as_u16(),
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %err, status = status.as_u16(), "Request error");
        }
    }
}

/// Turn `err` into the reply written to `res`.
///
/// The status is the error's own or 500. The body is `{"message": ...}`, with
/// the message replaced by [`INTERNAL_ERROR_MESSAGE`] for 500s. If `res` was
/// already sent the error is still reported but nothing is written.
pub fn error_handler(err: &AppError, res: &mut ResponseSink, reporter: &dyn ErrorReporter) {
    let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    reporter.report(err, status);

    if res.is_sent() {
        tracing::warn!(error = %err, "Response already sent, dropping error reply");
        return;
    }

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        INTERNAL_ERROR_MESSAGE.to_string()
    } else {
        err.to_string()
    };

    respond_status_body(res, status, json!({ "message": message }));
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut res = ResponseSink::new();
        error_handler(&self, &mut res, &TracingReporter);
        res.into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
