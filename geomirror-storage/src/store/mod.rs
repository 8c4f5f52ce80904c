//! Local store: thread-safe SQLite wrapper, one impl block per table group.

mod attachments;
mod audit;
mod features;
pub(crate) mod helpers;
mod municipalities;
mod writer;

use crate::error::StorageResult;
use crate::schema::initialize_schema;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub use writer::MirrorWriter;

/// Handle to the mirror database.
///
/// Cheap to clone; each request takes its own clone. Every operation takes
/// the connection lock for its own statements only, so a read followed by a
/// write from the same caller is not atomic with respect to other callers.
#[derive(Clone)]
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStore {
    /// Open (or create) the mirror database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = crate::open_mirror_db(path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory mirror database (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Acquire the connection lock, recovering from poison if a prior
    /// holder panicked.
    pub(crate) fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("LocalStore recovering from poisoned mutex");
            poisoned.into_inner()
        })
    }
}
