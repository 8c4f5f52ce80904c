//! Mirror-only routes. Nothing here talks to the upstream.

use crate::api::error::{ApiError, PayloadSource, api_json_rejection, api_sync};
use crate::api::types::PageQuery;
use crate::app::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use geomirror_sync::FeatureView;
use serde_json::Value;

pub const DEFAULT_PAGE_LIMIT: u32 = 100;

pub(crate) async fn list_local_features(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<FeatureView>>, ApiError> {
    let views = state
        .enricher
        .list(page.skip.unwrap_or(0), page.limit.unwrap_or(DEFAULT_PAGE_LIMIT))
        .map_err(|e| api_sync(e, PayloadSource::Caller))?;
    Ok(Json(views))
}

pub(crate) async fn get_local_feature(
    State(state): State<AppState>,
    Path(feature_id): Path<i64>,
) -> Result<Json<FeatureView>, ApiError> {
    let view = state
        .enricher
        .get(feature_id)
        .map_err(|e| api_sync(e, PayloadSource::Caller))?;
    Ok(Json(view))
}

/// Mirrors a full upstream feature payload supplied by the caller.
pub(crate) async fn sync_feature(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<FeatureView>, ApiError> {
    let Json(payload) = payload.map_err(api_json_rejection)?;
    let row = state
        .synchronizer
        .sync_one(&payload)
        .map_err(|e| api_sync(e, PayloadSource::Caller))?;
    let view = state
        .enricher
        .enrich(row)
        .map_err(|e| api_sync(e, PayloadSource::Caller))?;
    Ok(Json(view))
}
