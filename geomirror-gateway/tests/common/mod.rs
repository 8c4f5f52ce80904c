#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use geomirror_gateway::app::{AppState, build_router};
use geomirror_storage::LocalStore;
use geomirror_upstream::{UpstreamClient, UpstreamConfig};
use wiremock::MockServer;

pub const API_KEY: &str = "test-key";

pub struct TestApp {
    pub router: Router,
    pub store: LocalStore,
    pub server: MockServer,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_store(LocalStore::open_in_memory().expect("store")).await
}

pub async fn spawn_app_with_store(store: LocalStore) -> TestApp {
    let server = MockServer::start().await;
    let upstream = UpstreamClient::new(UpstreamConfig::for_base_url(server.uri())).expect("client");
    let state = AppState::new(store.clone(), upstream, API_KEY);
    TestApp {
        router: build_router(state),
        store,
        server,
    }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
