//! Upstream seam for the deletion gate.

use async_trait::async_trait;
use geomirror_upstream::{Payload, UpstreamClient, UpstreamResult};

/// Upstream deletes that must succeed before the mirror is touched.
#[async_trait]
pub trait FeatureApi: Send + Sync {
    async fn delete_features(&self, layer_id: u64, ids: &[i64]) -> UpstreamResult<Payload>;

    async fn delete_attachment(
        &self,
        layer_id: u64,
        feature_id: i64,
        attachment_id: i64,
    ) -> UpstreamResult<Payload>;
}

#[async_trait]
impl FeatureApi for UpstreamClient {
    async fn delete_features(&self, layer_id: u64, ids: &[i64]) -> UpstreamResult<Payload> {
        UpstreamClient::delete_features(self, layer_id, ids).await
    }

    async fn delete_attachment(
        &self,
        layer_id: u64,
        feature_id: i64,
        attachment_id: i64,
    ) -> UpstreamResult<Payload> {
        UpstreamClient::delete_attachment(self, layer_id, feature_id, attachment_id).await
    }
}
