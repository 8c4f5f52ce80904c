//! Attachment routes. Upload pushes the raw request body to the upstream
//! file component and links it to the feature; delete is gated on the
//! upstream like feature deletion.

use crate::api::error::{ApiError, PayloadSource, api_sync, api_upstream, api_validation_error};
use crate::api::types::{AttachmentUploadResponse, LayerQuery, UploadQuery};
use crate::app::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use serde_json::Value;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub(crate) async fn upload_attachment(
    State(state): State<AppState>,
    Path(feature_id): Path<i64>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AttachmentUploadResponse>, ApiError> {
    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| api_validation_error("missing file name (?name=)"))?;
    if body.is_empty() {
        return Err(api_validation_error("empty upload body"));
    }
    let mime_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string();
    let size = i64::try_from(body.len())
        .map_err(|_| api_validation_error("upload too large"))?;
    let layer_id = state.layer_or_default(query.layer_id);

    let upload = state
        .upstream
        .upload_file(&name, &mime_type, body.to_vec())
        .await
        .map_err(api_upstream)?;
    let attachment = state
        .upstream
        .attach_file(layer_id, feature_id, &name, size, &mime_type, &upload)
        .await
        .map_err(api_upstream)?
        .into_json();

    tracing::info!(layer_id, feature_id, upload_id = %upload.id, size, "attachment uploaded");
    Ok(Json(AttachmentUploadResponse {
        id: upload.id,
        name,
        size,
        mime_type,
        attachment,
    }))
}

pub(crate) async fn delete_attachment(
    State(state): State<AppState>,
    Path((feature_id, attachment_id)): Path<(i64, i64)>,
    Query(query): Query<LayerQuery>,
) -> Result<Json<Value>, ApiError> {
    let layer_id = state.layer_or_default(query.layer_id);
    let outcome = state
        .deletion
        .delete_attachment(layer_id, feature_id, attachment_id)
        .await
        .map_err(|e| api_sync(e, PayloadSource::Caller))?;
    Ok(Json(outcome.upstream))
}
