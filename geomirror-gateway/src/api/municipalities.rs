//! Municipality reference data CRUD.

use crate::api::error::{ApiError, api_json_rejection, api_storage, api_validation_error};
use crate::app::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use geomirror_storage::{Municipality, MunicipalityDraft};

fn validated(draft: Result<Json<MunicipalityDraft>, JsonRejection>) -> Result<MunicipalityDraft, ApiError> {
    let Json(draft) = draft.map_err(api_json_rejection)?;
    if draft.name.trim().is_empty() {
        return Err(api_validation_error("municipality name must not be empty"));
    }
    if draft.geom.trim().is_empty() {
        return Err(api_validation_error("municipality geometry must not be empty"));
    }
    Ok(draft)
}

pub(crate) async fn list_municipalities(
    State(state): State<AppState>,
) -> Result<Json<Vec<Municipality>>, ApiError> {
    let items = state.store.list_municipalities().map_err(api_storage)?;
    Ok(Json(items))
}

pub(crate) async fn create_municipality(
    State(state): State<AppState>,
    draft: Result<Json<MunicipalityDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = validated(draft)?;
    let created = state.store.create_municipality(&draft).map_err(api_storage)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(crate) async fn get_municipality(
    State(state): State<AppState>,
    Path(municipality_id): Path<i64>,
) -> Result<Json<Municipality>, ApiError> {
    let found = state
        .store
        .get_municipality(municipality_id)
        .map_err(api_storage)?;
    Ok(Json(found))
}

pub(crate) async fn update_municipality(
    State(state): State<AppState>,
    Path(municipality_id): Path<i64>,
    draft: Result<Json<MunicipalityDraft>, JsonRejection>,
) -> Result<Json<Municipality>, ApiError> {
    let draft = validated(draft)?;
    let updated = state
        .store
        .update_municipality(municipality_id, &draft)
        .map_err(api_storage)?;
    Ok(Json(updated))
}

pub(crate) async fn delete_municipality(
    State(state): State<AppState>,
    Path(municipality_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_municipality(municipality_id)
        .map_err(api_storage)?;
    Ok(StatusCode::NO_CONTENT)
}
