//! Knowledge-base store
//!
//! A persistent key-value table (`entities(id, record)`) in SQLite, read
//! through a read-only connection so any number of engines can share one
//! store without locking. `KbStoreWriter` is the ingestion-side handle used
//! by dump loaders and test fixtures.

use std::path::PathBuf;
use std::sync::Mutex;

use directories::ProjectDirs;
use rusqlite::{Connection, OpenFlags, OptionalExtension};

use super::record::EntityRecord;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// KB store error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum KbError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Record encoding error
    #[error("Record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// KB result type
pub type Result<T> = std::result::Result<T, KbError>;

// ============================================================================
// READ-ONLY STORE
// ============================================================================

/// Read-only view of the entity key-value store.
///
/// The connection sits behind a `Mutex` so the store is `Send + Sync`; reads
/// are point lookups and the critical section is tiny.
pub struct KbStore {
    reader: Mutex<Connection>,
}

impl KbStore {
    fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "tabsem", "core")
            .ok_or_else(|| KbError::Init("Could not determine project directories".to_string()))?;
        Ok(proj_dirs.data_dir().join("kb.db"))
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA query_only = ON;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA mmap_size = 268435456;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Open an existing store read-only. `None` resolves the default
    /// platform data directory.
    pub fn open(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_path()?,
        };
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::configure_connection(&conn)?;
        Ok(Self {
            reader: Mutex::new(conn),
        })
    }

    /// Raw point lookup. `Ok(None)` when the id is not in the store.
    pub fn get_raw(&self, entity_id: &str) -> Result<Option<Vec<u8>>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| KbError::Init("Reader lock poisoned".to_string()))?;
        let blob: Option<Vec<u8>> = reader
            .query_row(
                "SELECT record FROM entities WHERE id = ?1",
                [entity_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(blob)
    }

    /// Decoded point lookup. Missing ids and corrupt blobs both yield the
    /// empty record; only I/O errors surface.
    pub fn get(&self, entity_id: &str) -> Result<EntityRecord> {
        Ok(self
            .get_raw(entity_id)?
            .map(|bytes| EntityRecord::decode(entity_id, &bytes))
            .unwrap_or_default())
    }

    /// Whether the id has a stored record at all.
    pub fn contains(&self, entity_id: &str) -> Result<bool> {
        Ok(self.get_raw(entity_id)?.is_some())
    }
}

// ============================================================================
// INGESTION-SIDE WRITER
// ============================================================================

/// Write handle used by dump-ingestion tooling and test fixtures.
pub struct KbStoreWriter {
    conn: Connection,
}

impl KbStoreWriter {
    /// Create (or open) a store for writing and ensure the schema exists.
    pub fn create(path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        // rollback journal, not WAL: readers open the finished store
        // strictly read-only and never need the -shm/-wal side files
        conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             CREATE TABLE IF NOT EXISTS entities (
                 id TEXT PRIMARY KEY,
                 record BLOB NOT NULL
             );",
        )?;
        Ok(Self { conn })
    }

    /// Insert or replace one entity record.
    pub fn put(&self, entity_id: &str, record: &EntityRecord) -> Result<()> {
        let bytes = record.encode()?;
        self.conn.execute(
            "INSERT OR REPLACE INTO entities (id, record) VALUES (?1, ?2)",
            rusqlite::params![entity_id, bytes],
        )?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
