//! API error type and the mapping from crate errors onto HTTP responses.
//!
//! Every error body is `{code, message, layer}` so a caller can tell whether
//! the upstream, the local mirror or the gateway itself refused the request.

use crate::api::types::{ErrorLayer, ErrorResponse};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use geomirror_storage::StorageError;
use geomirror_sync::SyncError;
use geomirror_upstream::UpstreamError;

pub const FORBIDDEN_MESSAGE: &str = "Invalid or missing API Key";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>, layer: ErrorLayer) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.into(),
                layer,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Where a malformed feature payload came from. Decides the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// The caller sent it: 400.
    Caller,
    /// The upstream answered with it: 502.
    Upstream,
}

pub fn api_forbidden() -> ApiError {
    ApiError::new(
        StatusCode::FORBIDDEN,
        "forbidden",
        FORBIDDEN_MESSAGE,
        ErrorLayer::Gateway,
    )
}

pub fn api_validation_error(message: impl Into<String>) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "validation_error",
        message,
        ErrorLayer::Gateway,
    )
}

pub fn api_bad_gateway(message: impl Into<String>) -> ApiError {
    ApiError::new(
        StatusCode::BAD_GATEWAY,
        "upstream_malformed",
        message,
        ErrorLayer::Upstream,
    )
}

pub fn api_json_rejection(rejection: JsonRejection) -> ApiError {
    api_validation_error(rejection.body_text())
}

pub fn api_upstream(err: UpstreamError) -> ApiError {
    match err {
        UpstreamError::Transport(message) => {
            tracing::warn!(%message, "upstream unreachable");
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                "upstream_unreachable",
                message,
                ErrorLayer::Upstream,
            )
        }
        UpstreamError::Status { status, body } => ApiError::new(
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            "upstream_status",
            body,
            ErrorLayer::Upstream,
        ),
        UpstreamError::Decode(message) => api_bad_gateway(message),
        UpstreamError::Config(message) => {
            tracing::error!(%message, "upstream client misconfigured");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                message,
                ErrorLayer::Gateway,
            )
        }
    }
}

pub fn api_storage(err: StorageError) -> ApiError {
    match err {
        StorageError::NotFound(message) => {
            ApiError::new(StatusCode::NOT_FOUND, "not_found", message, ErrorLayer::Local)
        }
        StorageError::Conflict(message) => {
            ApiError::new(StatusCode::CONFLICT, "already_exists", message, ErrorLayer::Local)
        }
        other => {
            tracing::error!(error = %other, "local store failure");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "local store failure",
                ErrorLayer::Local,
            )
        }
    }
}

pub fn api_sync(err: SyncError, source: PayloadSource) -> ApiError {
    match err {
        SyncError::Upstream(e) => api_upstream(e),
        SyncError::Storage(e) => api_storage(e),
        SyncError::NotFound(message) => {
            ApiError::new(StatusCode::NOT_FOUND, "not_found", message, ErrorLayer::Local)
        }
        SyncError::MalformedPayload(message) => match source {
            PayloadSource::Caller => ApiError::new(
                StatusCode::BAD_REQUEST,
                "malformed_payload",
                message,
                ErrorLayer::Gateway,
            ),
            PayloadSource::Upstream => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "malformed_payload",
                message,
                ErrorLayer::Upstream,
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_passes_through() {
        let err = api_upstream(UpstreamError::Status {
            status: 404,
            body: "{\"message\":\"no such feature\"}".into(),
        });
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.body.code, "upstream_status");
        assert_eq!(err.body.layer, ErrorLayer::Upstream);
        assert!(err.body.message.contains("no such feature"));
    }

    #[test]
    fn odd_upstream_status_becomes_bad_gateway() {
        let err = api_upstream(UpstreamError::Status {
            status: 42,
            body: String::new(),
        });
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn transport_is_bad_gateway() {
        let err = api_upstream(UpstreamError::Transport("refused".into()));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.body.code, "upstream_unreachable");
    }

    #[test]
    fn malformed_status_depends_on_source() {
        let caller = api_sync(SyncError::MalformedPayload("x".into()), PayloadSource::Caller);
        assert_eq!(caller.status, StatusCode::BAD_REQUEST);
        assert_eq!(caller.body.layer, ErrorLayer::Gateway);

        let upstream = api_sync(SyncError::MalformedPayload("x".into()), PayloadSource::Upstream);
        assert_eq!(upstream.status, StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.body.layer, ErrorLayer::Upstream);
    }

    #[test]
    fn storage_errors_are_local() {
        let missing = api_storage(StorageError::NotFound("feature 1".into()));
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.body.layer, ErrorLayer::Local);

        let conflict = api_storage(StorageError::Conflict("name".into()));
        assert_eq!(conflict.status, StatusCode::CONFLICT);

        let internal = api_storage(StorageError::Constraint("size".into()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.body.message, "local store failure");
    }

    #[test]
    fn forbidden_is_fixed() {
        let err = api_forbidden();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.body.message, FORBIDDEN_MESSAGE);
    }
}
