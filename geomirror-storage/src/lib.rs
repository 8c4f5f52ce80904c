//! SQLite-backed local mirror for geomirror.
//!
//! Holds normalized copies of upstream features and their attachments, the
//! locally administered municipality reference table, and two append-only
//! audit tables (operation history and admin log).
//!
//! # Architecture
//!
//! - One `features` row per upstream feature id (unique), projected columns only
//! - `attachments` keyed by (owning feature row, upstream attachment id),
//!   cascade-deleted with their feature
//! - Audit tables have insert and read APIs only

mod error;
mod schema;
mod store;
mod types;

pub use error::{StorageError, StorageResult};
pub use schema::initialize_schema;
pub use store::{LocalStore, MirrorWriter};
pub use types::{
    AdminLogEntry, AdminLogRecord, AttachmentColumns, FeatureColumns, LocalAttachment,
    LocalFeature, Municipality, MunicipalityDraft, OperationEntry, OperationRecord,
};

/// Open a SQLite connection for the mirror database with the pragmas the
/// schema relies on (foreign keys for attachment cascade, WAL for readers).
pub fn open_mirror_db(path: &std::path::Path) -> StorageResult<rusqlite::Connection> {
    let conn = rusqlite::Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;",
    )?;
    Ok(conn)
}
