use async_trait::async_trait;
use geomirror_storage::LocalStore;
use geomirror_sync::{DeletionGate, FeatureApi, FeatureSynchronizer, SyncError};
use geomirror_upstream::{Payload, UpstreamClient, UpstreamConfig, UpstreamError, UpstreamResult};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Upstream stand-in that answers every delete the same way.
struct FixedApi {
    fail_with: Option<u16>,
    calls: AtomicUsize,
}

impl FixedApi {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail_with: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(status),
            calls: AtomicUsize::new(0),
        })
    }

    fn answer(&self) -> UpstreamResult<Payload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_with {
            Some(status) => Err(UpstreamError::Status {
                status,
                body: "nope".into(),
            }),
            None => Ok(Payload::Text("ok".into())),
        }
    }
}

#[async_trait]
impl FeatureApi for FixedApi {
    async fn delete_features(&self, _layer_id: u64, _ids: &[i64]) -> UpstreamResult<Payload> {
        self.answer()
    }

    async fn delete_attachment(
        &self,
        _layer_id: u64,
        _feature_id: i64,
        _attachment_id: i64,
    ) -> UpstreamResult<Payload> {
        self.answer()
    }
}

fn seeded_store() -> LocalStore {
    let store = LocalStore::open_in_memory().unwrap();
    let sync = FeatureSynchronizer::new(store.clone());
    for id in [1, 2] {
        sync.sync_one(&json!({
            "id": id,
            "geom": "POINT (0 0)",
            "attachments": [{"id": 7, "name": "a.jpg", "size": 1, "mime_type": "image/jpeg"}]
        }))
        .unwrap();
    }
    store
}

// ── Features ─────────────────────────────────────────────────────

#[tokio::test]
async fn successful_upstream_delete_removes_rows_and_attachments() {
    let store = seeded_store();
    let gate = DeletionGate::new(FixedApi::ok(), store.clone());

    let outcome = gate.delete_features(8863, &[1, 404]).await.unwrap();
    assert_eq!(outcome.local_removed, 1);
    assert_eq!(outcome.upstream["status"], "success");
    assert!(store.find_feature_by_external_id(1).unwrap().is_none());
    assert_eq!(store.count_attachments().unwrap(), 1);
}

#[tokio::test]
async fn upstream_failure_leaves_mirror_untouched() {
    let store = seeded_store();
    let api = FixedApi::failing(500);
    let gate = DeletionGate::new(api.clone(), store.clone());

    let err = gate.delete_features(8863, &[1, 2]).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Upstream(UpstreamError::Status { status: 500, .. })
    ));
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.count_features().unwrap(), 2);
    assert_eq!(store.count_attachments().unwrap(), 2);
}

#[tokio::test]
async fn empty_id_list_never_reaches_upstream() {
    let store = seeded_store();
    let api = FixedApi::ok();
    let gate = DeletionGate::new(api.clone(), store.clone());

    let err = gate.delete_features(8863, &[]).await.unwrap_err();
    assert!(err.is_malformed());
    assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.count_features().unwrap(), 2);
}

// ── Attachments ──────────────────────────────────────────────────

#[tokio::test]
async fn attachment_delete_only_touches_owning_feature() {
    let store = seeded_store();
    let gate = DeletionGate::new(FixedApi::ok(), store.clone());

    let outcome = gate.delete_attachment(8863, 1, 7).await.unwrap();
    assert_eq!(outcome.local_removed, 1);

    let one = store.find_feature_by_external_id(1).unwrap().unwrap();
    let two = store.find_feature_by_external_id(2).unwrap().unwrap();
    assert!(store.list_attachments(one.id).unwrap().is_empty());
    assert_eq!(store.list_attachments(two.id).unwrap().len(), 1);
}

#[tokio::test]
async fn attachment_delete_for_unmirrored_feature() {
    let store = seeded_store();
    let gate = DeletionGate::new(FixedApi::ok(), store.clone());

    let outcome = gate.delete_attachment(8863, 999, 7).await.unwrap();
    assert_eq!(outcome.local_removed, 0);
    assert_eq!(store.count_attachments().unwrap(), 2);
}

#[tokio::test]
async fn failed_attachment_delete_keeps_row() {
    let store = seeded_store();
    let gate = DeletionGate::new(FixedApi::failing(404), store.clone());

    assert!(gate.delete_attachment(8863, 1, 7).await.is_err());
    assert_eq!(store.count_attachments().unwrap(), 2);
}

// ── Against a real HTTP upstream ─────────────────────────────────

#[tokio::test]
async fn http_upstream_error_keeps_local_rows() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/resource/8863/feature/"))
        .and(body_json(json!([{"id": 1}])))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let store = seeded_store();
    let client = UpstreamClient::new(UpstreamConfig::for_base_url(server.uri())).unwrap();
    let gate = DeletionGate::new(Arc::new(client), store.clone());

    let err = gate.delete_features(8863, &[1]).await.unwrap_err();
    match err {
        SyncError::Upstream(UpstreamError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.find_feature_by_external_id(1).unwrap().is_some());
}

#[tokio::test]
async fn http_upstream_success_deletes_locally() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/resource/8863/feature/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let store = seeded_store();
    let client = UpstreamClient::new(UpstreamConfig::for_base_url(server.uri())).unwrap();
    let gate = DeletionGate::new(Arc::new(client), store.clone());

    let outcome = gate.delete_features(8863, &[1, 2]).await.unwrap();
    assert_eq!(outcome.local_removed, 2);
    assert_eq!(store.count_features().unwrap(), 0);
    assert_eq!(store.count_attachments().unwrap(), 0);
}
