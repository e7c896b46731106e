//! Trailing-slash redirect.

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode, header::LOCATION, uri::PathAndQuery},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Where a request for `url` should be redirected, if anywhere.
///
/// Any URL longer than `/` that ends with a slash maps to the same URL with
/// that one slash removed. Targets starting with `//` are refused, since
/// browsers read them as a link to another host.
#[must_use]
pub fn redirect_target(url: &str) -> Option<&str> {
    if url.len() > 1 {
        url.strip_suffix('/').filter(|target| !target.starts_with("//"))
    } else {
        None
    }
}

/// Middleware that answers `301 Moved Permanently` for URLs ending in `/`.
///
/// The check runs on the path and query as received, so `/cart/?x=1` passes
/// through untouched.
pub async fn rewrite_slash(request: Request, next: Next) -> Response {
    let uri = request.uri();
    let url = uri.path_and_query().map_or_else(|| uri.path(), PathAndQuery::as_str);

    // axum's Redirect::permanent is a 308
    if let Some(location) = redirect_target(url).and_then(|t| HeaderValue::from_str(t).ok()) {
        tracing::debug!(from = url, "Redirecting trailing slash");
        return (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_target_strips_one_slash() {
        assert_eq!(redirect_target("/products/"), Some("/products"));
        assert_eq!(redirect_target("/a/b/"), Some("/a/b"));
        assert_eq!(redirect_target("//"), Some("/"));
    }

    #[test]
    fn test_redirect_target_refuses_other_host() {
        assert_eq!(redirect_target("//evil.example/"), None);
        assert_eq!(redirect_target("///evil.example/"), None);
    }

    #[test]
    fn test_redirect_target_keeps_root_and_plain_paths() {
        assert_eq!(redirect_target("/"), None);
        assert_eq!(redirect_target(""), None);
        assert_eq!(redirect_target("/products"), None);
    }

    #[test]
    fn test_redirect_target_uses_full_url() {
        assert_eq!(redirect_target("/cart/?x=1"), None);
        assert_eq!(redirect_target("/search?q=a/"), Some("/search?q=a"));
    }
}
