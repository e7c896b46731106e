//! HTTP middleware for the request helpers.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, binary only)
//! 2. `TraceLayer` (request tracing)
//! 3. Trailing-slash redirect
//! 4. Session layer (tower-sessions with in-memory store)
//! 5. Session normalization (clear customer id for anonymous visitors)

pub mod customer;
pub mod rewrite_slash;
pub mod session;

pub use customer::{CurrentCustomerId, CustomerIdResolver, CustomerLookup, get_customer_id};
pub use rewrite_slash::rewrite_slash;
pub use session::{create_session_layer, session_middleware};
