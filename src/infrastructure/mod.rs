//! Ledger store backends.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
mod staging;

use crate::domain::ports::LedgerStoreRef;
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// Opens the store selected by configuration.
///
/// A `db_path` selects RocksDB when the `storage-rocksdb` feature is enabled.
/// Without the feature the request is logged and in-memory storage is used.
pub fn open_store(db_path: Option<&Path>) -> Result<LedgerStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Arc::new(rocksdb::RocksDBStore::open(path)?)),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(in_memory::InMemoryLedgerStore::new()))
        }
        None => Ok(Arc::new(in_memory::InMemoryLedgerStore::new())),
    }
}
