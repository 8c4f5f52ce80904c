//! Attachment row operations, keyed by (owning feature row, upstream attachment id).

use super::LocalStore;
use super::helpers::{classify, column_to_json, json_to_column};
use crate::error::{StorageError, StorageResult};
use crate::types::{AttachmentColumns, LocalAttachment};
use rusqlite::{Connection, OptionalExtension, Row, params};

const ATTACHMENT_SELECT: &str = "SELECT id, external_id, feature_id, name, keyname, size, mime_type, description, is_image, file_meta FROM attachments";

fn attachment_from_row(row: &Row<'_>) -> rusqlite::Result<LocalAttachment> {
    Ok(LocalAttachment {
        id: row.get(0)?,
        external_id: row.get(1)?,
        feature_id: row.get(2)?,
        columns: AttachmentColumns {
            name: row.get(3)?,
            keyname: row.get(4)?,
            size: row.get(5)?,
            mime_type: row.get(6)?,
            description: row.get(7)?,
            is_image: row.get(8)?,
            file_meta: column_to_json(row.get(9)?),
        },
    })
}

pub(super) fn find(
    conn: &Connection,
    feature_id: i64,
    external_id: i64,
) -> StorageResult<Option<LocalAttachment>> {
    let found = conn
        .query_row(
            &format!("{ATTACHMENT_SELECT} WHERE feature_id = ? AND external_id = ?"),
            params![feature_id, external_id],
            attachment_from_row,
        )
        .optional()?;
    Ok(found)
}

pub(super) fn insert(
    conn: &Connection,
    feature_id: i64,
    external_id: i64,
    columns: &AttachmentColumns,
) -> StorageResult<LocalAttachment> {
    conn.execute(
        r#"INSERT INTO attachments (external_id, feature_id, name, keyname, size, mime_type, description, is_image, file_meta)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        params![
            external_id,
            feature_id,
            columns.name,
            columns.keyname.as_deref(),
            columns.size,
            columns.mime_type,
            columns.description.as_deref(),
            columns.is_image,
            json_to_column(&columns.file_meta),
        ],
    )
    .map_err(|e| {
        classify(
            e,
            &format!("attachment feature_id={feature_id} external_id={external_id}"),
        )
    })?;

    Ok(LocalAttachment {
        id: conn.last_insert_rowid(),
        external_id,
        feature_id,
        columns: columns.clone(),
    })
}

pub(super) fn update(
    conn: &Connection,
    id: i64,
    columns: &AttachmentColumns,
) -> StorageResult<LocalAttachment> {
    let updated = conn
        .execute(
            r#"UPDATE attachments SET name = ?, keyname = ?, size = ?, mime_type = ?, description = ?,
                   is_image = ?, file_meta = ?
               WHERE id = ?"#,
            params![
                columns.name,
                columns.keyname.as_deref(),
                columns.size,
                columns.mime_type,
                columns.description.as_deref(),
                columns.is_image,
                json_to_column(&columns.file_meta),
                id,
            ],
        )
        .map_err(|e| classify(e, &format!("attachment {id}")))?;

    if updated == 0 {
        return Err(StorageError::NotFound(format!("attachment {id}")));
    }

    conn.query_row(
        &format!("{ATTACHMENT_SELECT} WHERE id = ?"),
        params![id],
        attachment_from_row,
    )
    .map_err(Into::into)
}

impl LocalStore {
    pub fn find_attachment(
        &self,
        feature_id: i64,
        external_id: i64,
    ) -> StorageResult<Option<LocalAttachment>> {
        find(&self.lock_conn(), feature_id, external_id)
    }

    /// Insert an attachment under `feature_id`.
    ///
    /// `Conflict` if the pair already exists, `NotFound` if the feature row
    /// does not.
    pub fn insert_attachment(
        &self,
        feature_id: i64,
        external_id: i64,
        columns: &AttachmentColumns,
    ) -> StorageResult<LocalAttachment> {
        insert(&self.lock_conn(), feature_id, external_id, columns)
    }

    /// Overwrite every field of an existing attachment row.
    pub fn update_attachment(
        &self,
        id: i64,
        columns: &AttachmentColumns,
    ) -> StorageResult<LocalAttachment> {
        update(&self.lock_conn(), id, columns)
    }

    /// All attachments of one feature row, in insertion order.
    pub fn list_attachments(&self, feature_id: i64) -> StorageResult<Vec<LocalAttachment>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!("{ATTACHMENT_SELECT} WHERE feature_id = ? ORDER BY id"))?;
        let rows = stmt
            .query_map(params![feature_id], attachment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_attachments(&self) -> StorageResult<i64> {
        let conn = self.lock_conn();
        let count = conn.query_row("SELECT COUNT(*) FROM attachments", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Remove one attachment. Returns whether a row was removed.
    pub fn delete_attachment(&self, feature_id: i64, external_id: i64) -> StorageResult<bool> {
        let conn = self.lock_conn();
        let deleted = conn.execute(
            "DELETE FROM attachments WHERE feature_id = ? AND external_id = ?",
            params![feature_id, external_id],
        )?;
        Ok(deleted > 0)
    }
}
