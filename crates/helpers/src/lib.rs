//! Request helpers library.
//!
//! Small, independent HTTP helpers bound to the axum request/response
//! lifecycle: error replies, session normalization, raw response writers,
//! trailing-slash redirects, an upstream GET relay, and customer lookup.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod response;
pub mod routes;
pub mod state;

pub use error::{AppError, ErrorReporter, Result, TracingReporter, error_handler};
pub use response::{
    ResponseBody, ResponseSink, respond_status, respond_status_body, respond_success_body,
};
