//! String key-value storage backends.
//!
//! The store sees storage as one flat namespace of string keys holding
//! string values — the whole todo list lives under a single key. The redb
//! backend is the real medium; the in-memory backend stands in for it in
//! tests and in contexts with no persistent storage at all.

use redb::{Database, TableDefinition};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

const KV: TableDefinition<&str, &str> = TableDefinition::new("kv");

/// One flat string-to-string namespace. Implementations report failures as
/// `StorageError`; the store decides how to degrade.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ── redb backend ───────────────────────────────────────────────

/// Thin handle to the redb file. Cloneable (Arc inside).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open (or create) the database at the given path.
    /// Creates the kv table if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path)?;

        // Ensure the table exists so reads never hit a missing table
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(KV)?;
        }
        txn.commit()?;

        Ok(RedbStorage { db: Arc::new(db) })
    }
}

impl Storage for RedbStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }
}

// ── In-memory backend ──────────────────────────────────────────

/// HashMap-backed storage for tests and storage-less contexts.
#[derive(Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map.lock().unwrap().insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug)]
pub enum StorageError {
    Redb(String),
    /// The medium cannot be used at all in this context.
    Unavailable,
}

// redb 2.x has many error types. Blanket them all into StorageError::Redb.
macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for StorageError {
            fn from(e: $t) -> Self { StorageError::Redb(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Redb(e) => write!(f, "redb: {e}"),
            StorageError::Unavailable => write!(f, "storage unavailable"),
        }
    }
}

impl std::error::Error for StorageError {}

// ── Tests ──────────────────────────────────────────────────────
