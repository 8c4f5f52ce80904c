//! Attachment reconciliation.
//!
//! A feature payload can list attachments in two places: top-level
//! `attachments` and `extensions.attachment`. Both are merged, collapsed to
//! one entry per upstream attachment id (the later occurrence wins), and
//! upserted under the owning feature row. Attachments absent from the payload
//! are left alone.

use crate::error::SyncResult;
use geomirror_storage::{AttachmentColumns, LocalFeature, MirrorWriter};
use geomirror_upstream::{RemoteAttachment, RemoteFeature};
use std::collections::HashMap;
use tracing::debug;

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl ReconcileSummary {
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Collapses attachment candidates to one per id.
///
/// Keeps the position where an id was first seen, with the value of its last
/// occurrence.
pub fn dedup_attachments<'a, I>(candidates: I) -> Vec<&'a RemoteAttachment>
where
    I: IntoIterator<Item = &'a RemoteAttachment>,
{
    let mut slots: Vec<&'a RemoteAttachment> = Vec::new();
    let mut index_of: HashMap<i64, usize> = HashMap::new();
    for att in candidates {
        match index_of.get(&att.id) {
            Some(&slot) => slots[slot] = att,
            None => {
                index_of.insert(att.id, slots.len());
                slots.push(att);
            }
        }
    }
    slots
}

pub(crate) fn attachment_columns(att: &RemoteAttachment) -> AttachmentColumns {
    AttachmentColumns {
        name: att.name.clone(),
        keyname: att.keyname.clone(),
        size: att.size,
        mime_type: att.mime_type.clone(),
        description: att.description.clone(),
        is_image: att.is_image,
        file_meta: att.file_meta.clone(),
    }
}

/// Upserts the attachments a feature payload lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentReconciler;

impl AttachmentReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Upserts every attachment listed on `remote` under `owner`, inside the
    /// caller's transaction.
    pub fn reconcile(
        &self,
        writer: &MirrorWriter<'_>,
        owner: &LocalFeature,
        remote: &RemoteFeature,
    ) -> SyncResult<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();
        for att in dedup_attachments(remote.attachment_candidates()) {
            let columns = attachment_columns(att);
            if upsert(writer, owner.id, att.id, &columns)? {
                summary.inserted += 1;
            } else {
                summary.updated += 1;
            }
        }
        debug!(
            feature_id = owner.id,
            inserted = summary.inserted,
            updated = summary.updated,
            "attachments reconciled"
        );
        Ok(summary)
    }
}

/// Returns `true` when a new row was inserted.
fn upsert(
    writer: &MirrorWriter<'_>,
    feature_id: i64,
    attachment_id: i64,
    columns: &AttachmentColumns,
) -> SyncResult<bool> {
    if let Some(existing) = writer.find_attachment(feature_id, attachment_id)? {
        writer.update_attachment(existing.id, columns)?;
        return Ok(false);
    }
    match writer.insert_attachment(feature_id, attachment_id, columns) {
        Ok(_) => Ok(true),
        Err(e) if e.is_conflict() => {
            debug!(feature_id, attachment_id, "attachment insert lost a race, updating");
            match writer.find_attachment(feature_id, attachment_id)? {
                Some(winner) => {
                    writer.update_attachment(winner.id, columns)?;
                    Ok(false)
                }
                None => Err(e.into()),
            }
        }
        Err(e) => Err(e.into()),
    }
}
