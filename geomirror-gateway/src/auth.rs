//! API-key guard for mutating routes.

use crate::api::error::{ApiError, api_forbidden};
use crate::app::AppState;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Methods that never change upstream or local state.
pub fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// The key presented by the caller, if any.
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

/// Lets read-only requests through; anything else needs `X-API-KEY` equal
/// to the configured key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_read_only(request.method()) {
        return Ok(next.run(request).await);
    }
    let presented = presented_key(request.headers());
    let authorized =
        !state.api_key.is_empty() && presented.is_some_and(|key| key == &*state.api_key);
    if !authorized {
        tracing::warn!(
            method = %request.method(),
            path = request.uri().path(),
            key_present = presented.is_some(),
            "rejected request without a valid API key"
        );
        return Err(api_forbidden());
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn read_only_methods() {
        assert!(is_read_only(&Method::GET));
        assert!(is_read_only(&Method::HEAD));
        assert!(!is_read_only(&Method::POST));
        assert!(!is_read_only(&Method::PUT));
        assert!(!is_read_only(&Method::DELETE));
        assert!(!is_read_only(&Method::PATCH));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.insert("X-API-KEY", HeaderValue::from_static("secret"));
        assert_eq!(presented_key(&headers), Some("secret"));
        assert_eq!(presented_key(&HeaderMap::new()), None);
    }
}
