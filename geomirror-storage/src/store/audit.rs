//! Append-only audit tables. There is deliberately no update or delete here.

use super::LocalStore;
use super::helpers::{column_to_json, json_to_column, now_rfc3339};
use crate::error::StorageResult;
use crate::types::{AdminLogEntry, AdminLogRecord, OperationEntry, OperationRecord};
use rusqlite::params;

impl LocalStore {
    /// Append one operation-history row. Returns its id.
    pub fn append_operation(&self, record: &OperationRecord) -> StorageResult<i64> {
        let conn = self.lock_conn();
        conn.execute(
            r#"INSERT INTO operation_history (actor, operation, endpoint, method, params, status_code, timestamp)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                record.actor,
                record.operation,
                record.endpoint,
                record.method,
                json_to_column(&record.params),
                record.status_code,
                now_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Append one admin-log row. Returns its id.
    pub fn append_admin_log(&self, record: &AdminLogRecord) -> StorageResult<i64> {
        let conn = self.lock_conn();
        conn.execute(
            r#"INSERT INTO admin_logs (actor, action, endpoint, method, details, timestamp)
               VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                record.actor,
                record.action,
                record.endpoint,
                record.method,
                record.details.as_deref(),
                now_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent operation rows first.
    pub fn list_operations(&self, limit: u32) -> StorageResult<Vec<OperationEntry>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT id, actor, operation, endpoint, method, params, status_code, timestamp FROM operation_history ORDER BY id DESC LIMIT ?",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(OperationEntry {
                    id: row.get(0)?,
                    record: OperationRecord {
                        actor: row.get(1)?,
                        operation: row.get(2)?,
                        endpoint: row.get(3)?,
                        method: row.get(4)?,
                        params: column_to_json(row.get(5)?),
                        status_code: row.get(6)?,
                    },
                    timestamp: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Most recent admin-log rows first.
    pub fn list_admin_logs(&self, limit: u32) -> StorageResult<Vec<AdminLogEntry>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT id, actor, action, endpoint, method, details, timestamp FROM admin_logs ORDER BY id DESC LIMIT ?",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(AdminLogEntry {
                    id: row.get(0)?,
                    record: AdminLogRecord {
                        actor: row.get(1)?,
                        action: row.get(2)?,
                        endpoint: row.get(3)?,
                        method: row.get(4)?,
                        details: row.get(5)?,
                    },
                    timestamp: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
