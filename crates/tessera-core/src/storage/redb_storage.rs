//! # redb-backed Filter State Storage
//!
//! Persists the filter state blob in an embedded redb database, so a
//! dashboard's filters survive restarts of the server or CLI.
//!
//! One table maps a storage key to the JSON blob. Several dashboards can
//! share a file by using different keys.

use crate::primitives::DEFAULT_STORAGE_KEY;
use crate::state::PersistenceAdapter;
use crate::TesseraError;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;

/// Table for filter state: storage key -> JSON blob.
pub const FILTER_STATE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("filter_state");

fn storage_err(e: impl std::fmt::Display) -> TesseraError {
    TesseraError::StorageError(e.to_string())
}

/// A `PersistenceAdapter` over a redb database file.
pub struct RedbStorage {
    db: Database,
    key: String,
}

impl std::fmt::Debug for RedbStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStorage")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl RedbStorage {
    /// Open or create a database at `path`, storing under `key`.
    pub fn open(path: impl AsRef<Path>, key: impl Into<String>) -> Result<Self, TesseraError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize the table so reads never see a missing table.
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn
                .open_table(FILTER_STATE_TABLE)
                .map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        let key = key.into();
        tracing::debug!(
            path = %path.as_ref().display(),
            key = %key,
            "opened filter state database"
        );
        Ok(Self { db, key })
    }

    /// Open a database using the default storage key.
    pub fn open_default(path: impl AsRef<Path>) -> Result<Self, TesseraError> {
        Self::open(path, DEFAULT_STORAGE_KEY)
    }

    /// The storage key in use.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PersistenceAdapter for RedbStorage {
    fn load(&self) -> Result<Option<String>, TesseraError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn
            .open_table(FILTER_STATE_TABLE)
            .map_err(storage_err)?;
        Ok(table
            .get(self.key.as_str())
            .map_err(storage_err)?
            .map(|v| v.value().to_string()))
    }

    fn save(&self, blob: &str) -> Result<(), TesseraError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn
                .open_table(FILTER_STATE_TABLE)
                .map_err(storage_err)?;
            table
                .insert(self.key.as_str(), blob)
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }

    fn remove(&self) -> Result<(), TesseraError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn
                .open_table(FILTER_STATE_TABLE)
                .map_err(storage_err)?;
            table.remove(self.key.as_str()).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }
}

// =============================================================================
// TESTS
// =============================================================================
