use redb::{
    Database as RedbDatabase, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::tables::*;

/// Errors from the record store. redb errors are boxed to keep the enum small.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Database error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Database error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Record decode error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Record encode error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
}

macro_rules! boxed_from {
    ($($source:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$source> for DatabaseError {
                fn from(e: $source) -> Self {
                    DatabaseError::$variant(Box::new(e))
                }
            }
        )+
    };
}

boxed_from! {
    redb::CommitError => Commit,
    redb::DatabaseError => RedbDatabase,
    redb::Error => Redb,
    redb::StorageError => Storage,
    redb::TableError => Table,
    redb::TransactionError => Transaction,
}

/// Shared handle to the redb file holding media and setting records.
#[derive(Clone)]
pub struct Database {
    db: Arc<RedbDatabase>,
}

/// Statistics from a purge operation
#[derive(Debug, Default)]
pub struct PurgeStats {
    pub media: u64,
    pub settings: u64,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("troupe-cms.redb");
        let db = Arc::new(RedbDatabase::create(db_path)?);

        // Initialize application tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(MEDIA)?;
            let _ = write_txn.open_table(MEDIA_PATHS)?;
            let _ = write_txn.open_table(SETTINGS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    /// Purge all data - for testing only
    pub fn purge_all(&self) -> Result<PurgeStats, DatabaseError> {
        let write_txn = self.begin_write()?;
        let stats = PurgeStats {
            media: clear_table(&write_txn, MEDIA)?,
            settings: clear_table(&write_txn, SETTINGS)?,
        };
        clear_table(&write_txn, MEDIA_PATHS)?;
        write_txn.commit()?;
        Ok(stats)
    }
}

/// Remove every entry of a string-keyed table, returning how many were removed.
fn clear_table<V: redb::Value + 'static>(
    write_txn: &WriteTransaction,
    definition: TableDefinition<&'static str, V>,
) -> Result<u64, DatabaseError> {
    let keys: Vec<String> = {
        let table = write_txn.open_table(definition)?;
        let keys = table
            .iter()?
            .map(|r| r.map(|(k, _)| k.value().to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        keys
    };

    let mut table = write_txn.open_table(definition)?;
    for key in &keys {
        table.remove(key.as_str())?;
    }
    Ok(keys.len() as u64)
}
