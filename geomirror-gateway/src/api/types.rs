//! HTTP request/response shapes.

use serde::{Deserialize, Serialize};

/// Which side of the gateway a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLayer {
    Upstream,
    Local,
    Gateway,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub layer: ErrorLayer,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// `?layer_id=` on upstream-backed routes; absent means the configured
/// default layer.
#[derive(Debug, Default, Deserialize)]
pub struct LayerQuery {
    pub layer_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub layer_id: Option<u64>,
    pub name: Option<String>,
}

/// Result of pushing a file to the upstream and linking it to a feature.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttachmentUploadResponse {
    /// Upstream upload id.
    pub id: String,
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    /// Upstream response to the attach call.
    pub attachment: serde_json::Value,
}
