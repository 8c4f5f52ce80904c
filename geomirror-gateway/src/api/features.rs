//! Upstream feature routes.
//!
//! Each handler forwards to the upstream first. Whatever the upstream
//! accepts or returns is then mirrored locally before the upstream body goes
//! back to the caller. A mirror write failure fails the request.

use crate::api::error::{
    ApiError, PayloadSource, api_bad_gateway, api_json_rejection, api_sync, api_upstream,
    api_validation_error,
};
use crate::api::types::LayerQuery;
use crate::app::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use geomirror_upstream::{FeatureDraft, FeatureWriteResponse, Payload};
use serde_json::Value;
use std::collections::BTreeMap;

pub const SYNC_FAILURES_HEADER: &str = "x-geomirror-sync-failures";

/// Query keys consumed by the gateway rather than forwarded verbatim.
const GATEWAY_KEYS: [&str; 3] = ["layer_id", "kontrakt", "n_raion"];

/// Upstream query for a list call: passthrough params plus the field
/// filters the upstream understands.
fn upstream_list_query(params: &BTreeMap<String, String>) -> Vec<(String, String)> {
    let mut query: Vec<(String, String)> = params
        .iter()
        .filter(|(k, _)| !GATEWAY_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for field in ["kontrakt", "n_raion"] {
        if let Some(value) = params.get(field).filter(|v| !v.is_empty()) {
            query.push((format!("fields__{field}"), value.clone()));
        }
    }
    query
}

/// The upstream may ignore the field filters, so they are applied again here.
fn matches_filters(item: &Value, params: &BTreeMap<String, String>) -> bool {
    ["kontrakt", "n_raion"].iter().all(|field| {
        match params.get(*field).filter(|v| !v.is_empty()) {
            Some(wanted) => item
                .get("fields")
                .and_then(|f| f.get(*field))
                .and_then(Value::as_str)
                == Some(wanted.as_str()),
            None => true,
        }
    })
}

fn parse_layer(state: &AppState, params: &BTreeMap<String, String>) -> Result<u64, ApiError> {
    match params.get("layer_id") {
        Some(raw) => raw
            .parse()
            .map_err(|_| api_validation_error(format!("invalid layer_id: {raw}"))),
        None => Ok(state.layer_or_default(None)),
    }
}

fn write_response(payload: Payload) -> Result<(Value, FeatureWriteResponse), ApiError> {
    let body = payload.into_json();
    let parsed: FeatureWriteResponse = serde_json::from_value(body.clone())
        .map_err(|e| api_bad_gateway(format!("upstream write response has no feature id: {e}")))?;
    Ok((body, parsed))
}

pub(crate) async fn list_features(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let layer_id = parse_layer(&state, &params)?;
    let payload = state
        .upstream
        .list_features(layer_id, &upstream_list_query(&params))
        .await
        .map_err(api_upstream)?;

    let items = match payload {
        Payload::Json(Value::Array(items)) => items,
        Payload::Json(other) => {
            return Err(api_bad_gateway(format!(
                "expected a feature list, got {}",
                geomirror_upstream::json_kind(&other)
            )));
        }
        Payload::Text(_) => return Err(api_bad_gateway("expected a feature list, got text")),
    };
    let filtered = Value::Array(
        items
            .into_iter()
            .filter(|item| matches_filters(item, &params))
            .collect(),
    );

    let report = state
        .synchronizer
        .sync_many(&filtered)
        .map_err(|e| api_sync(e, PayloadSource::Upstream))?;

    let mut response = Json(filtered).into_response();
    if !report.is_complete() {
        tracing::warn!(
            layer_id,
            failures = report.failures.len(),
            "some listed features were not mirrored"
        );
        if let Ok(value) = HeaderValue::from_str(&report.failures.len().to_string()) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(SYNC_FAILURES_HEADER), value);
        }
    }
    Ok(response)
}

pub(crate) async fn get_feature(
    State(state): State<AppState>,
    Path(feature_id): Path<i64>,
    Query(query): Query<LayerQuery>,
) -> Result<Json<Value>, ApiError> {
    let layer_id = state.layer_or_default(query.layer_id);
    let body = state
        .upstream
        .get_feature(layer_id, feature_id)
        .await
        .map_err(api_upstream)?
        .into_json();

    state
        .synchronizer
        .sync_one(&body)
        .map_err(|e| api_sync(e, PayloadSource::Upstream))?;
    Ok(Json(body))
}

pub(crate) async fn create_feature(
    State(state): State<AppState>,
    Query(query): Query<LayerQuery>,
    draft: Result<Json<FeatureDraft>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(draft) = draft.map_err(api_json_rejection)?;
    let layer_id = state.layer_or_default(query.layer_id);
    let payload = state
        .upstream
        .create_feature(layer_id, &draft)
        .await
        .map_err(api_upstream)?;
    let (body, created) = write_response(payload)?;

    state
        .synchronizer
        .sync_from_request(created.id, &draft, created.version)
        .map_err(|e| api_sync(e, PayloadSource::Caller))?;
    tracing::info!(layer_id, feature_id = created.id, "feature created");
    Ok(Json(body))
}

pub(crate) async fn update_feature(
    State(state): State<AppState>,
    Path(feature_id): Path<i64>,
    Query(query): Query<LayerQuery>,
    draft: Result<Json<FeatureDraft>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(draft) = draft.map_err(api_json_rejection)?;
    let layer_id = state.layer_or_default(query.layer_id);
    let payload = state
        .upstream
        .update_feature(layer_id, feature_id, &draft)
        .await
        .map_err(api_upstream)?;
    let (body, updated) = write_response(payload)?;

    state
        .synchronizer
        .sync_from_request(feature_id, &draft, updated.version)
        .map_err(|e| api_sync(e, PayloadSource::Caller))?;
    Ok(Json(body))
}

pub(crate) async fn delete_features(
    State(state): State<AppState>,
    Query(query): Query<LayerQuery>,
    ids: Result<Json<Vec<i64>>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(ids) = ids.map_err(api_json_rejection)?;
    let layer_id = state.layer_or_default(query.layer_id);
    let outcome = state
        .deletion
        .delete_features(layer_id, &ids)
        .await
        .map_err(|e| api_sync(e, PayloadSource::Caller))?;
    Ok(Json(outcome.upstream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn filters_are_renamed_for_upstream() {
        let query = upstream_list_query(&params(&[
            ("layer_id", "1"),
            ("kontrakt", "SVO"),
            ("limit", "10"),
        ]));
        assert_eq!(
            query,
            vec![
                ("limit".to_string(), "10".to_string()),
                ("fields__kontrakt".to_string(), "SVO".to_string()),
            ]
        );
    }

    #[test]
    fn local_filter_requires_exact_match() {
        let p = params(&[("n_raion", "Orsk")]);
        assert!(matches_filters(&json!({"fields": {"n_raion": "Orsk"}}), &p));
        assert!(!matches_filters(&json!({"fields": {"n_raion": "orsk"}}), &p));
        assert!(!matches_filters(&json!({"id": 1}), &p));
        assert!(matches_filters(&json!({"id": 1}), &params(&[])));
    }
}
