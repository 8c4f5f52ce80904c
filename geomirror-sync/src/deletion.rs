//! Upstream-gated deletion.
//!
//! The upstream delete always goes first. Local rows are removed only after
//! it succeeds; on any upstream failure the mirror is left as it was.

use crate::api::FeatureApi;
use crate::error::{SyncError, SyncResult};
use geomirror_storage::LocalStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a gated delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    /// Upstream response body, as returned to the caller.
    pub upstream: Value,
    /// Mirror rows removed after the upstream confirmed.
    pub local_removed: usize,
}

#[derive(Clone)]
pub struct DeletionGate {
    api: Arc<dyn FeatureApi>,
    store: LocalStore,
}

impl DeletionGate {
    pub fn new(api: Arc<dyn FeatureApi>, store: LocalStore) -> Self {
        Self { api, store }
    }

    /// Deletes features upstream, then their mirror rows and attachments.
    pub async fn delete_features(&self, layer_id: u64, ids: &[i64]) -> SyncResult<DeleteOutcome> {
        if ids.is_empty() {
            return Err(SyncError::MalformedPayload(
                "no feature ids to delete".to_string(),
            ));
        }

        let upstream = match self.api.delete_features(layer_id, ids).await {
            Ok(payload) => payload.into_json(),
            Err(e) => {
                warn!(layer_id, count = ids.len(), error = %e, "upstream delete failed, mirror untouched");
                return Err(e.into());
            }
        };

        let local_removed = self.store.delete_features_by_external_ids(ids)?;
        info!(layer_id, requested = ids.len(), local_removed, "features deleted");
        Ok(DeleteOutcome {
            upstream,
            local_removed,
        })
    }

    /// Deletes one attachment upstream, then its mirror row if the owning
    /// feature is mirrored.
    pub async fn delete_attachment(
        &self,
        layer_id: u64,
        feature_external_id: i64,
        attachment_id: i64,
    ) -> SyncResult<DeleteOutcome> {
        let upstream = match self
            .api
            .delete_attachment(layer_id, feature_external_id, attachment_id)
            .await
        {
            Ok(payload) => payload.into_json(),
            Err(e) => {
                warn!(
                    layer_id,
                    feature_id = feature_external_id,
                    attachment_id,
                    error = %e,
                    "upstream attachment delete failed, mirror untouched"
                );
                return Err(e.into());
            }
        };

        let local_removed = match self.store.find_feature_by_external_id(feature_external_id)? {
            Some(owner) => usize::from(self.store.delete_attachment(owner.id, attachment_id)?),
            None => 0,
        };
        info!(
            layer_id,
            feature_id = feature_external_id,
            attachment_id,
            local_removed,
            "attachment deleted"
        );
        Ok(DeleteOutcome {
            upstream,
            local_removed,
        })
    }
}
