//! Feature row operations: lookup by upstream id, insert, overwrite, list, delete.

use super::LocalStore;
use super::helpers::{classify, now_rfc3339};
use crate::error::{StorageError, StorageResult};
use crate::types::{FeatureColumns, LocalFeature};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use tracing::{debug, info};

const FEATURE_SELECT: &str = "SELECT id, external_id, geom, version, description, fid_1, num, n_raion, fio, years, info, kontrakt, nagrads, created_at FROM features";

fn feature_from_row(row: &Row<'_>) -> rusqlite::Result<LocalFeature> {
    Ok(LocalFeature {
        id: row.get(0)?,
        external_id: row.get(1)?,
        columns: FeatureColumns {
            geom: row.get(2)?,
            version: row.get(3)?,
            description: row.get(4)?,
            fid_1: row.get(5)?,
            num: row.get(6)?,
            n_raion: row.get(7)?,
            fio: row.get(8)?,
            years: row.get(9)?,
            info: row.get(10)?,
            kontrakt: row.get(11)?,
            nagrads: row.get(12)?,
        },
        created_at: row.get(13)?,
    })
}

pub(super) fn find_by_external_id(
    conn: &Connection,
    external_id: i64,
) -> StorageResult<Option<LocalFeature>> {
    let found = conn
        .query_row(
            &format!("{FEATURE_SELECT} WHERE external_id = ?"),
            params![external_id],
            feature_from_row,
        )
        .optional()?;
    Ok(found)
}

pub(super) fn insert(
    conn: &Connection,
    external_id: i64,
    columns: &FeatureColumns,
) -> StorageResult<LocalFeature> {
    let now = now_rfc3339();
    conn.execute(
        r#"INSERT INTO features (external_id, geom, version, description, fid_1, num, n_raion, fio, years, info, kontrakt, nagrads, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        params![
            external_id,
            columns.geom,
            columns.version,
            columns.description.as_deref(),
            columns.fid_1.as_deref(),
            columns.num,
            columns.n_raion.as_deref(),
            columns.fio.as_deref(),
            columns.years.as_deref(),
            columns.info.as_deref(),
            columns.kontrakt.as_deref(),
            columns.nagrads.as_deref(),
            now,
        ],
    )
    .map_err(|e| classify(e, &format!("feature external_id={external_id}")))?;

    let id = conn.last_insert_rowid();
    info!(feature_id = id, external_id, "Feature mirrored");

    Ok(LocalFeature {
        id,
        external_id,
        columns: columns.clone(),
        created_at: now,
    })
}

pub(super) fn update(
    conn: &Connection,
    id: i64,
    columns: &FeatureColumns,
) -> StorageResult<LocalFeature> {
    let updated = conn.execute(
        r#"UPDATE features SET geom = ?, version = ?, description = ?, fid_1 = ?, num = ?, n_raion = ?,
               fio = ?, years = ?, info = ?, kontrakt = ?, nagrads = ?
           WHERE id = ?"#,
        params![
            columns.geom,
            columns.version,
            columns.description.as_deref(),
            columns.fid_1.as_deref(),
            columns.num,
            columns.n_raion.as_deref(),
            columns.fio.as_deref(),
            columns.years.as_deref(),
            columns.info.as_deref(),
            columns.kontrakt.as_deref(),
            columns.nagrads.as_deref(),
            id,
        ],
    )?;

    if updated == 0 {
        return Err(StorageError::NotFound(format!("feature {id}")));
    }
    debug!(feature_id = id, "Feature overwritten");

    conn.query_row(
        &format!("{FEATURE_SELECT} WHERE id = ?"),
        params![id],
        feature_from_row,
    )
    .map_err(Into::into)
}

impl LocalStore {
    /// Look up the mirror row for an upstream feature id.
    pub fn find_feature_by_external_id(
        &self,
        external_id: i64,
    ) -> StorageResult<Option<LocalFeature>> {
        find_by_external_id(&self.lock_conn(), external_id)
    }

    /// Get a feature by its local id.
    pub fn get_feature(&self, id: i64) -> StorageResult<LocalFeature> {
        let conn = self.lock_conn();
        conn.query_row(
            &format!("{FEATURE_SELECT} WHERE id = ?"),
            params![id],
            feature_from_row,
        )
        .optional()?
        .ok_or_else(|| StorageError::NotFound(format!("feature {id}")))
    }

    /// Insert a new mirror row.
    ///
    /// Fails with [`StorageError::Conflict`] when a row for `external_id`
    /// already exists.
    pub fn insert_feature(
        &self,
        external_id: i64,
        columns: &FeatureColumns,
    ) -> StorageResult<LocalFeature> {
        insert(&self.lock_conn(), external_id, columns)
    }

    /// Overwrite every projected column of an existing row.
    pub fn update_feature(&self, id: i64, columns: &FeatureColumns) -> StorageResult<LocalFeature> {
        update(&self.lock_conn(), id, columns)
    }

    /// List mirror rows ordered by local id.
    pub fn list_features(&self, skip: u32, limit: u32) -> StorageResult<Vec<LocalFeature>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!("{FEATURE_SELECT} ORDER BY id LIMIT ? OFFSET ?"))?;
        let rows = stmt
            .query_map(params![limit, skip], feature_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_features(&self) -> StorageResult<i64> {
        let conn = self.lock_conn();
        let count = conn.query_row("SELECT COUNT(*) FROM features", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete the mirror rows for the given upstream ids. Attachments go with
    /// them. Ids with no mirror row are ignored. Returns the number of rows
    /// removed.
    pub fn delete_features_by_external_ids(&self, external_ids: &[i64]) -> StorageResult<usize> {
        if external_ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; external_ids.len()].join(", ");
        let mut conn = self.lock_conn();
        let tx = conn.transaction()?;
        let deleted = tx.execute(
            &format!("DELETE FROM features WHERE external_id IN ({placeholders})"),
            params_from_iter(external_ids.iter()),
        )?;
        tx.commit()?;

        info!(requested = external_ids.len(), deleted, "Mirrored features deleted");
        Ok(deleted)
    }
}
