//! Feature synchronization: upstream payload in, mirror rows out.
//!
//! Every sync is an upsert keyed by the upstream feature id. All projected
//! columns are overwritten from the payload (last write wins; `version` is
//! copied, never compared). Attachments listed on the payload are reconciled
//! afterwards.

use crate::error::{SyncError, SyncResult};
use crate::reconciler::AttachmentReconciler;
use geomirror_storage::{FeatureColumns, LocalFeature, LocalStore, MirrorWriter, StorageError};
use geomirror_upstream::{FeatureDraft, RemoteFeature, json_kind};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// One batch element that was not mirrored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItemFailure {
    /// Position in the input array.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_id: Option<i64>,
    pub reason: String,
}

/// Outcome of [`FeatureSynchronizer::sync_many`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSyncReport {
    pub synced: Vec<LocalFeature>,
    pub failures: Vec<BatchItemFailure>,
}

impl BatchSyncReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Maps an upstream feature onto the mirror's projected columns.
pub fn project(remote: &RemoteFeature) -> FeatureColumns {
    let fields = &remote.fields;
    FeatureColumns {
        geom: remote.geom.clone(),
        version: remote.version,
        description: remote.extensions.description.clone(),
        fid_1: fields.fid_1.clone(),
        num: fields.num,
        n_raion: fields.n_raion.clone(),
        fio: fields.fio.clone(),
        years: fields.years.clone(),
        info: fields.info.clone(),
        kontrakt: fields.kontrakt.clone(),
        nagrads: fields.nagrads.clone(),
    }
}

#[derive(Clone)]
pub struct FeatureSynchronizer {
    store: LocalStore,
    reconciler: AttachmentReconciler,
}

impl FeatureSynchronizer {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            reconciler: AttachmentReconciler::new(),
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Mirrors one raw upstream feature payload.
    ///
    /// Fails with [`SyncError::MalformedPayload`] before any write when the
    /// payload is not an object or carries no integer `id`.
    pub fn sync_one(&self, payload: &Value) -> SyncResult<LocalFeature> {
        let remote = RemoteFeature::from_value(payload).map_err(SyncError::MalformedPayload)?;
        self.sync_remote(&remote)
    }

    /// Mirrors an already-parsed upstream feature.
    ///
    /// The feature row and its attachments are written in one transaction:
    /// either all of them land or none do. A value the store's constraints
    /// refuse (a negative attachment size, say) is reported as
    /// [`SyncError::MalformedPayload`].
    pub fn sync_remote(&self, remote: &RemoteFeature) -> SyncResult<LocalFeature> {
        let (row, summary) = self
            .store
            .write_transaction(|writer| {
                let row = upsert_feature(writer, remote)?;
                let summary = self.reconciler.reconcile(writer, &row, remote)?;
                Ok::<_, SyncError>((row, summary))
            })
            .map_err(|e| match e {
                SyncError::Storage(StorageError::Constraint(reason)) => {
                    SyncError::MalformedPayload(reason)
                }
                other => other,
            })?;
        debug!(
            feature_id = row.id,
            external_id = row.external_id,
            attachments = summary.written(),
            "feature synced"
        );
        Ok(row)
    }

    /// Mirrors each element of an upstream array independently.
    ///
    /// Malformed elements, including ones the store's constraints refuse,
    /// are reported in the result, leave no rows behind and do not stop the
    /// batch. Any other store failure aborts the whole call.
    pub fn sync_many(&self, payload: &Value) -> SyncResult<BatchSyncReport> {
        let items = payload.as_array().ok_or_else(|| {
            SyncError::MalformedPayload(format!(
                "expected an array of features, got {}",
                json_kind(payload)
            ))
        })?;

        let mut report = BatchSyncReport::default();
        for (index, item) in items.iter().enumerate() {
            match self.sync_one(item) {
                Ok(row) => report.synced.push(row),
                Err(SyncError::MalformedPayload(reason)) => {
                    let upstream_id = item.get("id").and_then(Value::as_i64);
                    warn!(index, ?upstream_id, %reason, "skipping malformed feature in batch");
                    report.failures.push(BatchItemFailure {
                        index,
                        upstream_id,
                        reason,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            total = items.len(),
            synced = report.synced.len(),
            failed = report.failures.len(),
            "batch synced"
        );
        Ok(report)
    }

    /// Mirrors a create/update the gateway just sent upstream, using the
    /// request body together with the id and version the upstream assigned.
    pub fn sync_from_request(
        &self,
        upstream_id: i64,
        draft: &FeatureDraft,
        version: Option<i64>,
    ) -> SyncResult<LocalFeature> {
        let remote = RemoteFeature {
            id: upstream_id,
            geom: draft.geom.clone(),
            version,
            fields: draft.fields.clone(),
            extensions: draft.extensions.clone(),
            attachments: Vec::new(),
        };
        self.sync_remote(&remote)
    }
}

fn upsert_feature(writer: &MirrorWriter<'_>, remote: &RemoteFeature) -> SyncResult<LocalFeature> {
    let columns = project(remote);
    if let Some(existing) = writer.find_feature_by_external_id(remote.id)? {
        return Ok(writer.update_feature(existing.id, &columns)?);
    }
    match writer.insert_feature(remote.id, &columns) {
        Ok(row) => Ok(row),
        Err(e) if e.is_conflict() => {
            // Another writer on the same database file inserted this
            // upstream id between our lookup and insert.
            debug!(external_id = remote.id, "feature insert lost a race, updating");
            let winner = writer
                .find_feature_by_external_id(remote.id)?
                .ok_or(SyncError::Storage(e))?;
            Ok(writer.update_feature(winner.id, &columns)?)
        }
        Err(e) => Err(e.into()),
    }
}
