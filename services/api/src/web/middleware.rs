//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use messenger_core::session::SESSION_COOKIE;
use std::sync::Arc;
use tracing::debug;

use crate::web::state::AppState;

/// Pulls the session token out of the request's `Cookie` header, if any.
pub fn extract_session_token(headers: &HeaderMap) -> Option<&str> {
    let cookie_header = headers.get(header::COOKIE).and_then(|v| v.to_str().ok())?;
    cookie_header.split(';').find_map(|c| {
        let c = c.trim();
        c.strip_prefix(SESSION_COOKIE)?.strip_prefix('=')
    })
}

/// Middleware that validates the session cookie against the store and
/// attaches the resolved `AuthenticatedSession` to the request.
///
/// Every validation failure (missing cookie, unknown or expired token,
/// revoked session, and storage failures alike) maps to 401 and is treated
/// by clients as "logged out". A store outage reads as logged out, never as
/// logged in.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_session_token(req.headers());

    let authed = state
        .sessions
        .validate_session(token)
        .await
        .map_err(|e| {
            debug!("session validation failed: {e}");
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(authed);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::extract_session_token;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn finds_token_among_other_cookies() {
        let headers = headers_with_cookie("theme=dark; session_id=abc123; lang=en");
        assert_eq!(extract_session_token(&headers), Some("abc123"));
    }

    #[test]
    fn missing_cookie_header_yields_none() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn unrelated_cookies_yield_none() {
        let headers = headers_with_cookie("theme=dark; other_session_id=x");
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn empty_token_is_preserved_for_the_validator() {
        let headers = headers_with_cookie("session_id=");
        assert_eq!(extract_session_token(&headers), Some(""));
    }
}
