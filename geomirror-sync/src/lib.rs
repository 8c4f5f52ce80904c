//! Mirror synchronization for geomirror.
//!
//! Provides:
//! - [`FeatureSynchronizer`]: upsert of upstream feature payloads into the
//!   local store, one at a time or in batches
//! - [`AttachmentReconciler`]: merge, dedup and upsert of the attachments a
//!   payload lists
//! - [`DeletionGate`]: deletes that only touch the mirror after the upstream
//!   confirmed
//! - [`Enricher`]: local read views joined with attachments and municipality

pub mod api;
pub mod deletion;
pub mod enrichment;
pub mod error;
pub mod reconciler;
pub mod synchronizer;

pub use api::FeatureApi;
pub use deletion::{DeleteOutcome, DeletionGate};
pub use enrichment::{Enricher, FeatureView, MunicipalityInfo};
pub use error::{SyncError, SyncResult};
pub use reconciler::{AttachmentReconciler, ReconcileSummary, dedup_attachments};
pub use synchronizer::{BatchItemFailure, BatchSyncReport, FeatureSynchronizer, project};
