//! Row types for the mirror database.

use serde::{Deserialize, Serialize};

/// Columns projected from an upstream feature payload.
///
/// Every sync overwrites all of these at once; there is no per-column merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumns {
    pub geom: String,
    pub version: Option<i64>,
    pub description: Option<String>,
    pub fid_1: Option<String>,
    pub num: Option<i64>,
    pub n_raion: Option<String>,
    pub fio: Option<String>,
    pub years: Option<String>,
    pub info: Option<String>,
    pub kontrakt: Option<String>,
    pub nagrads: Option<String>,
}

/// A mirrored feature row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalFeature {
    /// Local primary key.
    pub id: i64,
    /// Upstream identifier (unique).
    pub external_id: i64,
    #[serde(flatten)]
    pub columns: FeatureColumns,
    pub created_at: String,
}

/// Attachment fields copied verbatim from the upstream payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentColumns {
    pub name: String,
    pub keyname: Option<String>,
    pub size: i64,
    pub mime_type: String,
    pub description: Option<String>,
    pub is_image: bool,
    /// Opaque upstream metadata; `Null` is stored as SQL NULL.
    pub file_meta: serde_json::Value,
}

/// A mirrored attachment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalAttachment {
    pub id: i64,
    pub external_id: i64,
    /// Local id of the owning feature row.
    pub feature_id: i64,
    #[serde(flatten)]
    pub columns: AttachmentColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
    pub id: i64,
    pub name: String,
    pub geom: String,
    pub created_at: String,
}

/// Input for creating or replacing a municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityDraft {
    pub name: String,
    pub geom: String,
}

/// One call observed by the audit sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// API key presented by the caller, or `"unknown"`.
    pub actor: String,
    pub operation: String,
    pub endpoint: String,
    pub method: String,
    pub params: serde_json::Value,
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationEntry {
    pub id: i64,
    #[serde(flatten)]
    pub record: OperationRecord,
    pub timestamp: String,
}

/// One mutating call, as recorded in the admin log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLogRecord {
    pub actor: String,
    pub action: String,
    pub endpoint: String,
    pub method: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLogEntry {
    pub id: i64,
    #[serde(flatten)]
    pub record: AdminLogRecord,
    pub timestamp: String,
}
