//! Municipality reference data CRUD.

use super::LocalStore;
use super::helpers::{classify, now_rfc3339};
use crate::error::{StorageError, StorageResult};
use crate::types::{Municipality, MunicipalityDraft};
use rusqlite::{OptionalExtension, Row, params};
use tracing::info;

const MUNICIPALITY_SELECT: &str = "SELECT id, name, geom, created_at FROM municipalities";

fn municipality_from_row(row: &Row<'_>) -> rusqlite::Result<Municipality> {
    Ok(Municipality {
        id: row.get(0)?,
        name: row.get(1)?,
        geom: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl LocalStore {
    /// Create a municipality. Names are unique.
    pub fn create_municipality(&self, draft: &MunicipalityDraft) -> StorageResult<Municipality> {
        let now = now_rfc3339();
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO municipalities (name, geom, created_at) VALUES (?, ?, ?)",
            params![draft.name, draft.geom, now],
        )
        .map_err(|e| classify(e, &format!("municipality {}", draft.name)))?;

        let id = conn.last_insert_rowid();
        info!(municipality_id = id, name = %draft.name, "Municipality created");
        Ok(Municipality {
            id,
            name: draft.name.clone(),
            geom: draft.geom.clone(),
            created_at: now,
        })
    }

    pub fn list_municipalities(&self) -> StorageResult<Vec<Municipality>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!("{MUNICIPALITY_SELECT} ORDER BY id"))?;
        let rows = stmt
            .query_map([], municipality_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_municipality(&self, id: i64) -> StorageResult<Municipality> {
        let conn = self.lock_conn();
        conn.query_row(
            &format!("{MUNICIPALITY_SELECT} WHERE id = ?"),
            params![id],
            municipality_from_row,
        )
        .optional()?
        .ok_or_else(|| StorageError::NotFound(format!("municipality {id}")))
    }

    /// Exact, case-sensitive name match.
    pub fn find_municipality_by_name(&self, name: &str) -> StorageResult<Option<Municipality>> {
        let conn = self.lock_conn();
        let found = conn
            .query_row(
                &format!("{MUNICIPALITY_SELECT} WHERE name = ?"),
                params![name],
                municipality_from_row,
            )
            .optional()?;
        Ok(found)
    }

    pub fn update_municipality(
        &self,
        id: i64,
        draft: &MunicipalityDraft,
    ) -> StorageResult<Municipality> {
        {
            let conn = self.lock_conn();
            let updated = conn
                .execute(
                    "UPDATE municipalities SET name = ?, geom = ? WHERE id = ?",
                    params![draft.name, draft.geom, id],
                )
                .map_err(|e| classify(e, &format!("municipality {}", draft.name)))?;
            if updated == 0 {
                return Err(StorageError::NotFound(format!("municipality {id}")));
            }
        }
        self.get_municipality(id)
    }

    pub fn delete_municipality(&self, id: i64) -> StorageResult<()> {
        let conn = self.lock_conn();
        let deleted = conn.execute("DELETE FROM municipalities WHERE id = ?", params![id])?;
        if deleted == 0 {
            return Err(StorageError::NotFound(format!("municipality {id}")));
        }
        info!(municipality_id = id, "Municipality deleted");
        Ok(())
    }
}
