//! RocksDB storage for triple stores that outlive the export run.

use super::{prefix_upper_bound, BatchWrite, KeyValue, StorageBackend};
use crate::error::{ExportError, Result};
use log::debug;
use rocksdb::{Direction, IteratorMode, Options, ReadOptions, WriteBatch, WriteOptions, DB};
use std::path::Path;
use std::sync::Arc;

/// Triple store directory backed by RocksDB.
///
/// Writes skip the write-ahead log; [`flush`](StorageBackend::flush) persists
/// them. A store that was not closed through
/// [`TripleStore::close`](crate::graph::TripleStore::close) may miss its
/// latest statements, never part of one.
#[derive(Clone)]
pub struct RocksDBBackend {
    db: Arc<DB>,
}

impl RocksDBBackend {
    /// Open the store directory at `path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Storage`] if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path.as_ref()).map_err(|e| {
            ExportError::storage(
                format!("Failed to open triple store at {:?}", path.as_ref()),
                Some(e),
            )
        })?;
        debug!("Opened RocksDB triple store at {:?}", path.as_ref());

        Ok(Self { db: Arc::new(db) })
    }

    fn bulk_write_options() -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.disable_wal(true);
        opts
    }
}

impl StorageBackend for RocksDBBackend {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db
            .put_opt(key, value, &Self::bulk_write_options())
            .map_err(|e| ExportError::storage("Failed to store triple store entry", Some(e)))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| ExportError::storage("Failed to read triple store entry", Some(e)))
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        if !self.db.key_may_exist(key) {
            return Ok(false);
        }
        self.db
            .get_pinned(key)
            .map(|value| value.is_some())
            .map_err(|e| ExportError::storage("Failed to look up triple store entry", Some(e)))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        let mut read = ReadOptions::default();
        if let Some(bound) = prefix_upper_bound(prefix) {
            read.set_iterate_upper_bound(bound);
        }

        self.db
            .iterator_opt(IteratorMode::From(prefix, Direction::Forward), read)
            .map(|item| {
                item.map(|(key, value)| (key.to_vec(), value.to_vec()))
                    .map_err(|e| ExportError::storage("Failed to scan triple store index", Some(e)))
            })
            .collect()
    }

    fn write_batch(&mut self, writes: Vec<BatchWrite>) -> Result<()> {
        let mut batch = WriteBatch::default();
        for write in writes {
            match write {
                BatchWrite::Put { key, value } => batch.put(&key, &value),
                BatchWrite::Delete { key } => batch.delete(&key),
            }
        }

        self.db
            .write_opt(batch, &Self::bulk_write_options())
            .map_err(|e| ExportError::storage("Failed to write triple store batch", Some(e)))
    }

    fn flush(&mut self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| ExportError::storage("Failed to flush triple store", Some(e)))
    }
}
