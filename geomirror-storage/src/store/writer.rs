//! Transactional write handle for mirroring a feature with its attachments.

use super::{LocalStore, attachments, features};
use crate::error::{StorageError, StorageResult};
use crate::types::{AttachmentColumns, FeatureColumns, LocalAttachment, LocalFeature};
use rusqlite::Connection;

/// Feature and attachment writes bound to one open transaction.
///
/// Only reachable through [`LocalStore::write_transaction`]; the store lock
/// is held for the writer's whole lifetime, so calling other `LocalStore`
/// methods from inside the closure would deadlock.
pub struct MirrorWriter<'c> {
    conn: &'c Connection,
}

impl MirrorWriter<'_> {
    pub fn find_feature_by_external_id(
        &self,
        external_id: i64,
    ) -> StorageResult<Option<LocalFeature>> {
        features::find_by_external_id(self.conn, external_id)
    }

    pub fn insert_feature(
        &self,
        external_id: i64,
        columns: &FeatureColumns,
    ) -> StorageResult<LocalFeature> {
        features::insert(self.conn, external_id, columns)
    }

    pub fn update_feature(&self, id: i64, columns: &FeatureColumns) -> StorageResult<LocalFeature> {
        features::update(self.conn, id, columns)
    }

    pub fn find_attachment(
        &self,
        feature_id: i64,
        external_id: i64,
    ) -> StorageResult<Option<LocalAttachment>> {
        attachments::find(self.conn, feature_id, external_id)
    }

    pub fn insert_attachment(
        &self,
        feature_id: i64,
        external_id: i64,
        columns: &AttachmentColumns,
    ) -> StorageResult<LocalAttachment> {
        attachments::insert(self.conn, feature_id, external_id, columns)
    }

    pub fn update_attachment(
        &self,
        id: i64,
        columns: &AttachmentColumns,
    ) -> StorageResult<LocalAttachment> {
        attachments::update(self.conn, id, columns)
    }
}

impl LocalStore {
    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`. Any error rolls back every write `f`
    /// made and is returned unchanged.
    pub fn write_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&MirrorWriter<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let mut conn = self.lock_conn();
        let tx = conn.transaction().map_err(StorageError::from)?;
        let out = f(&MirrorWriter { conn: &tx })?;
        tx.commit().map_err(StorageError::from)?;
        Ok(out)
    }
}
