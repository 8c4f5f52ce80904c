//! DDL for the mirror database.

use crate::error::StorageResult;
use rusqlite::Connection;

/// Mirrored features. `external_id` is the upstream identifier.
const FEATURES_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS features (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id INTEGER NOT NULL UNIQUE,
    geom TEXT NOT NULL,
    version INTEGER,
    description TEXT,
    fid_1 TEXT,
    num INTEGER,
    n_raion TEXT,
    fio TEXT,
    years TEXT,
    info TEXT,
    kontrakt TEXT,
    nagrads TEXT,
    created_at TEXT NOT NULL
);
"#;

/// Mirrored attachments, owned by a feature row.
const ATTACHMENTS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS attachments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id INTEGER NOT NULL,
    feature_id INTEGER NOT NULL REFERENCES features(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    keyname TEXT,
    size INTEGER NOT NULL CHECK (size >= 0),
    mime_type TEXT NOT NULL,
    description TEXT,
    is_image BOOLEAN NOT NULL,
    file_meta TEXT,
    UNIQUE (feature_id, external_id)
);
CREATE INDEX IF NOT EXISTS idx_attachments_feature ON attachments(feature_id);
"#;

/// Reference data keyed by name; joined against `features.n_raion`.
const MUNICIPALITIES_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS municipalities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    geom TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

const OPERATION_HISTORY_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS operation_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    actor TEXT NOT NULL,
    operation TEXT NOT NULL,
    endpoint TEXT NOT NULL,
    method TEXT NOT NULL,
    params TEXT,
    status_code INTEGER,
    timestamp TEXT NOT NULL
);
"#;

const ADMIN_LOGS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS admin_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    actor TEXT NOT NULL,
    action TEXT NOT NULL,
    endpoint TEXT NOT NULL,
    method TEXT NOT NULL,
    details TEXT,
    timestamp TEXT NOT NULL
);
"#;

/// Initialize all mirror tables.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(FEATURES_DDL)?;
    conn.execute_batch(ATTACHMENTS_DDL)?;
    conn.execute_batch(MUNICIPALITIES_DDL)?;
    conn.execute_batch(OPERATION_HISTORY_DDL)?;
    conn.execute_batch(ADMIN_LOGS_DDL)?;
    Ok(())
}
