//! Byte-keyed storage under the triple store.
//!
//! The [`TripleStore`](crate::graph::TripleStore) keeps terms, index entries
//! and counters as ordered byte keys (see `graph::keys`). A backend only has
//! to offer point reads, bounded prefix scans and atomic batches; every
//! statement insert is one batch, so a backend never sees half a statement.
//!
//! - [`RocksDBBackend`]: on-disk store directory that a later run can reopen (feature `rocksdb-backend`)
//! - [`MemoryBackend`]: scratch graph for tests and serialized graph output

mod memory;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use memory::MemoryBackend;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDBBackend;

use crate::error::Result;

/// Key and value of one stored entry.
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Ordered byte map holding one triple store.
///
/// Keys compare lexicographically. Index keys are built so that all
/// statements sharing a subject, predicate or context form one contiguous
/// key range, which [`scan_prefix`](Self::scan_prefix) has to return whole
/// and in order.
pub trait StorageBackend: Send + Sync {
    /// Store a single entry outside a batch. Used for namespace prefixes,
    /// which carry no counters.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Storage`](crate::ExportError::Storage) if the write fails.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Value stored under `key`, `Ok(None)` if there is none.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Whether `key` is stored. The insert path uses this to detect a
    /// statement that is already present without decoding it.
    fn exists(&self, key: &[u8]) -> Result<bool>;

    /// Every entry whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>>;

    /// Apply `writes` atomically.
    fn write_batch(&mut self, writes: Vec<BatchWrite>) -> Result<()>;

    /// Make everything written so far durable.
    fn flush(&mut self) -> Result<()>;
}

/// One write inside an atomic [`StorageBackend::write_batch`].
///
/// A statement insert is a batch of index puts plus the counter update; a
/// clear is a batch of deletes over every statement and term range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchWrite {
    /// Store `value` under `key`, replacing what was there
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove `key` if present
    Delete { key: Vec<u8> },
}

impl BatchWrite {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self::Delete { key: key.into() }
    }
}

/// Smallest key greater than every key starting with `prefix`, or `None`
/// when no such key exists (empty prefix or all `0xff` bytes).
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut bound = prefix.to_vec();
    while let Some(last) = bound.pop() {
        if last < u8::MAX {
            bound.push(last + 1);
            return Some(bound);
        }
    }
    None
}
