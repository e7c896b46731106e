//! Session layer configuration and anonymous-session normalization.

use axum::{
    extract::Request,
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::Response,
};
use tower_sessions::{
    Expiry, MemoryStore, Session, SessionManagerLayer,
    cookie::{Cookie, SameSite, time::Duration},
};

use crate::config::HelpersConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "helpers_session";

/// Cookie set by the login flow while a customer is signed in.
pub const LOGGED_IN_COOKIE: &str = "logged_in";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session keys used by the helpers.
pub mod keys {
    /// Key for the signed-in customer's ID (`null` for anonymous visitors).
    pub const CUSTOMER_ID: &str = "customer_id";
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &HelpersConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Whether the request carries a non-empty `logged_in` cookie.
#[must_use]
pub fn is_logged_in(headers: &HeaderMap) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .any(|cookie| cookie.name() == LOGGED_IN_COOKIE && !cookie.value().is_empty())
}

/// Clear the session's customer ID unless the visitor is logged in.
///
/// Does nothing when there is no session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn normalize_session(
    logged_in: bool,
    session: Option<&Session>,
) -> Result<(), tower_sessions::session::Error> {
    if logged_in {
        return Ok(());
    }

    if let Some(session) = session {
        session.insert(keys::CUSTOMER_ID, None::<String>).await?;
    }
    Ok(())
}

/// Middleware that clears the customer ID of anonymous sessions.
///
/// Always passes the request on exactly once, even if the session store fails.
pub async fn session_middleware(request: Request, next: Next) -> Response {
    let logged_in = is_logged_in(request.headers());
    let session = request.extensions().get::<Session>().cloned();

    if let Err(e) = normalize_session(logged_in, session.as_ref()).await {
        tracing::warn!(error = %e, "Failed to clear customer id from session");
    }

    next.run(request).await
}

/// Read the customer ID stored in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn customer_id(session: &Session) -> Result<Option<String>, tower_sessions::session::Error> {
    Ok(session
        .get::<Option<String>>(keys::CUSTOMER_ID)
        .await?
        .flatten())
}

/// Helper to set the signed-in customer's ID in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_customer_id(
    session: &Session,
    customer_id: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CUSTOMER_ID, customer_id).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::HeaderValue;

    use super::*;

    fn anonymous_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_is_logged_in() {
        assert!(is_logged_in(&headers_with_cookie("logged_in=true")));
        assert!(is_logged_in(&headers_with_cookie(
            "helpers_session=abc; logged_in=1"
        )));
    }

    #[test]
    fn test_is_logged_in_rejects_missing_or_empty() {
        assert!(!is_logged_in(&HeaderMap::new()));
        assert!(!is_logged_in(&headers_with_cookie("logged_in=")));
        assert!(!is_logged_in(&headers_with_cookie("logged_out=true")));
    }

    #[test]
    fn test_is_logged_in_checks_every_cookie_header() {
        let mut headers = headers_with_cookie("theme=dark");
        headers.append(COOKIE, HeaderValue::from_static("logged_in=true"));
        assert!(is_logged_in(&headers));
    }

    #[tokio::test]
    async fn test_normalize_clears_customer_for_anonymous_visitor() {
        let session = anonymous_session();
        set_customer_id(&session, "stale-customer").await.unwrap();

        normalize_session(false, Some(&session)).await.unwrap();

        assert_eq!(customer_id(&session).await.unwrap(), None);
        // Stored as an explicit null, not removed
        assert_eq!(
            session
                .get::<Option<String>>(keys::CUSTOMER_ID)
                .await
                .unwrap(),
            Some(None)
        );
    }

    #[tokio::test]
    async fn test_normalize_leaves_logged_in_customer_alone() {
        let session = anonymous_session();
        set_customer_id(&session, "existing-customer-id").await.unwrap();

        normalize_session(true, Some(&session)).await.unwrap();

        assert_eq!(
            customer_id(&session).await.unwrap().as_deref(),
            Some("existing-customer-id")
        );
    }

    #[tokio::test]
    async fn test_normalize_without_session_is_noop() {
        assert!(normalize_session(false, None).await.is_ok());
    }
}
