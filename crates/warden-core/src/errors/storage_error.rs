/// Storage-layer errors for the case store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("store busy: {details}")]
    Busy { details: String },

    #[error("corrupt record {id}: {details}")]
    CorruptRecord { id: String, details: String },
}
