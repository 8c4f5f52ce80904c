//! Gateway HTTP application wiring.
//!
//! Builds the axum router, composes the API-key guard, audit sidecar and
//! tracing layers, and defines the state injected into handlers.

use crate::api;
use crate::audit;
use crate::auth;
use crate::config::GatewayConfig;
use crate::observability;
use anyhow::Context;
use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};
use geomirror_storage::LocalStore;
use geomirror_sync::{DeletionGate, Enricher, FeatureSynchronizer};
use geomirror_upstream::UpstreamClient;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: LocalStore,
    pub upstream: UpstreamClient,
    pub synchronizer: FeatureSynchronizer,
    pub deletion: DeletionGate,
    pub enricher: Enricher,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(store: LocalStore, upstream: UpstreamClient, api_key: &str) -> Self {
        Self {
            synchronizer: FeatureSynchronizer::new(store.clone()),
            deletion: DeletionGate::new(Arc::new(upstream.clone()), store.clone()),
            enricher: Enricher::new(store.clone()),
            store,
            upstream,
            api_key: Arc::from(api_key),
        }
    }

    /// Layer used when a request does not name one.
    pub fn layer_or_default(&self, layer_id: Option<u64>) -> u64 {
        layer_id.unwrap_or_else(|| self.upstream.default_layer_id())
    }
}

/// Opens the mirror database and upstream client named by `config`.
pub fn build_state(config: &GatewayConfig) -> anyhow::Result<AppState> {
    let store = LocalStore::open(&config.database_path).with_context(|| {
        format!("open mirror database {}", config.database_path.display())
    })?;
    let upstream =
        UpstreamClient::new(config.upstream.clone()).with_context(|| "build upstream client")?;
    Ok(AppState::new(store, upstream, &config.api_key))
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
            )
        });

    let guarded = Router::new()
        .route(
            "/features/",
            get(api::features::list_features)
                .post(api::features::create_feature)
                .delete(api::features::delete_features),
        )
        .route(
            "/features/:feature_id",
            get(api::features::get_feature).put(api::features::update_feature),
        )
        .route(
            "/features/:feature_id/attachments/",
            post(api::attachments::upload_attachment),
        )
        .route(
            "/features/:feature_id/attachments/:attachment_id",
            delete(api::attachments::delete_attachment),
        )
        .route("/db/features/", get(api::local::list_local_features))
        .route("/db/features/:feature_id", get(api::local::get_local_feature))
        .route("/db/sync-feature/", post(api::local::sync_feature))
        .route(
            "/municipalities/",
            get(api::municipalities::list_municipalities)
                .post(api::municipalities::create_municipality),
        )
        .route(
            "/municipalities/:municipality_id",
            get(api::municipalities::get_municipality)
                .put(api::municipalities::update_municipality)
                .delete(api::municipalities::delete_municipality),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(api::system::health))
        .merge(guarded)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            audit::record_operation,
        ))
        .layer(middleware::from_fn(observability::request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
}
