//! Customer identity resolution.
//!
//! Resolves the customer a request acts for, in priority order:
//!
//! 1. The `custId` query parameter, only when the resolver was built for
//!    [`Environment::Development`]. This lets anyone impersonate any customer,
//!    so it is fixed at startup and never enabled in other environments.
//! 2. For visitors without the `logged_in` cookie, the session's own ID. A
//!    session that was never stored is saved first so it has one.
//! 3. For logged-in visitors, the customer ID stored in the session.

use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::config::Environment;
use crate::error::{AppError, Result};
use crate::middleware::session::{customer_id, is_logged_in};

/// Request data that customer resolution reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerLookup<'a> {
    /// Value of the `custId` query parameter.
    pub query_customer_id: Option<&'a str>,
    /// Whether the `logged_in` cookie is present.
    pub logged_in: bool,
    /// The request's session, if the session layer ran.
    pub session: Option<&'a Session>,
}

/// Resolves customer IDs. Built once at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerIdResolver {
    query_override: bool,
}

impl CustomerIdResolver {
    /// Build the resolver for `environment`.
    ///
    /// Only development honors the `custId` query parameter.
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            query_override: environment == Environment::Development,
        }
    }

    /// Whether the `custId` query parameter is honored.
    #[must_use]
    pub const fn allows_query_override(self) -> bool {
        self.query_override
    }

    /// Resolve the customer for `lookup`.
    ///
    /// Logged-in visitors whose session holds no customer ID resolve to `None`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthenticated` if the visitor is not logged in and
    /// has no session, or `AppError::Session` if the session cannot be read or
    /// stored.
    pub async fn resolve(self, lookup: &CustomerLookup<'_>) -> Result<Option<String>> {
        if self.query_override
            && let Some(id) = lookup.query_customer_id
        {
            tracing::debug!(customer_id = id, "Using customer id from query string");
            return Ok(Some(id.to_string()));
        }

        if !lookup.logged_in {
            let session = lookup.session.ok_or(AppError::Unauthenticated)?;
            // New sessions only get an id once stored
            if session.id().is_none() {
                session.save().await?;
            }
            return session
                .id()
                .map(|id| Some(id.to_string()))
                .ok_or(AppError::Unauthenticated);
        }

        match lookup.session {
            Some(session) => Ok(customer_id(session).await?),
            None => Ok(None),
        }
    }
}

/// Resolve the customer for `lookup` as configured for `environment`.
///
/// # Errors
///
/// See [`CustomerIdResolver::resolve`].
pub async fn get_customer_id(
    lookup: &CustomerLookup<'_>,
    environment: Environment,
) -> Result<Option<String>> {
    CustomerIdResolver::for_environment(environment)
        .resolve(lookup)
        .await
}

#[derive(Debug, Deserialize)]
struct CustomerQuery {
    #[serde(rename = "custId")]
    cust_id: Option<String>,
}

/// Extractor that resolves the current customer ID.
///
/// Rejects with `AppError`, so an unauthenticated request becomes a 500 reply
/// unless the handler takes `Result<CurrentCustomerId, AppError>` instead.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentCustomerId(customer): CurrentCustomerId) -> impl IntoResponse {
///     customer.unwrap_or_default()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentCustomerId(pub Option<String>);

impl<S> FromRequestParts<S> for CurrentCustomerId
where
    CustomerIdResolver: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let resolver = CustomerIdResolver::from_ref(state);

        // A malformed query string just means no override
        let query_customer_id = Query::<CustomerQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.cust_id);

        let lookup = CustomerLookup {
            query_customer_id: query_customer_id.as_deref(),
            logged_in: is_logged_in(&parts.headers),
            session: parts.extensions.get::<Session>(),
        };

        resolver.resolve(&lookup).await.map(Self)
    }
}
