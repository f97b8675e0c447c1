//! Single serialized connection shared by every store operation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::pragmas::apply_pragmas;
use crate::to_storage_err;

/// The one connection allowed to write. Access is serialized by a mutex,
/// which also makes multi-statement operations atomic within this process.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open the database file, applying pragmas.
    pub fn open(path: &Path, busy_timeout_ms: u64) -> WardenResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> WardenResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, 0)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a closure with exclusive access to the connection.
    pub fn with_conn_sync<F, T>(&self, f: F) -> WardenResult<T>
    where
        F: FnOnce(&Connection) -> WardenResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("write connection lock poisoned: {e}")))?;
        f(&guard)
    }
}
