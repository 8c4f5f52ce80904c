//! Audit sidecar.
//!
//! Wraps every route. After the handler has produced its response, one
//! operation-history row is appended, plus an admin-log row for mutating
//! methods. Audit writes are best effort: a failure is logged and the
//! response goes out unchanged.

use crate::app::AppState;
use crate::auth::{is_read_only, presented_key};
use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use geomirror_storage::{AdminLogRecord, LocalStore, OperationRecord};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const UNKNOWN_ACTOR: &str = "unknown";

/// Query string as a JSON object; unparseable strings give `{}`.
pub fn query_params(uri: &axum::http::Uri) -> Value {
    let parsed = Query::<BTreeMap<String, String>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default();
    Value::Object(
        parsed
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>(),
    )
}

pub async fn record_operation(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let endpoint = request.uri().path().to_string();
    let actor = presented_key(request.headers())
        .unwrap_or(UNKNOWN_ACTOR)
        .to_string();
    let params = query_params(request.uri());

    let response = next.run(request).await;

    let entry = AuditEntry {
        actor,
        method: method.to_string(),
        endpoint,
        params,
        status_code: response.status().as_u16(),
        mutating: !is_read_only(&method),
    };
    entry.write(&state.store);

    response
}

struct AuditEntry {
    actor: String,
    method: String,
    endpoint: String,
    params: Value,
    status_code: u16,
    mutating: bool,
}

impl AuditEntry {
    fn write(self, store: &LocalStore) {
        let operation = OperationRecord {
            actor: self.actor.clone(),
            operation: self.method.clone(),
            endpoint: self.endpoint.clone(),
            method: self.method.clone(),
            params: self.params.clone(),
            status_code: Some(self.status_code),
        };
        if let Err(err) = store.append_operation(&operation) {
            tracing::error!(error = %err, endpoint = %self.endpoint, "failed to record operation history");
        }

        if !self.mutating {
            return;
        }
        let admin = AdminLogRecord {
            actor: self.actor,
            action: self.method.clone(),
            endpoint: self.endpoint.clone(),
            method: self.method,
            details: Some(format!("query params: {}", self.params)),
        };
        if let Err(err) = store.append_admin_log(&admin) {
            tracing::error!(error = %err, endpoint = %self.endpoint, "failed to record admin log");
        }
    }
}
