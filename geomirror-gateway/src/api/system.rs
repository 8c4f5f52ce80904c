//! Liveness check. Unguarded and never calls the upstream.

use crate::api::types::HealthStatus;
use axum::Json;

pub(crate) async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}
