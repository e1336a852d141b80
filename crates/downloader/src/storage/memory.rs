//! In-memory storage backend.
//!
//! Holds a scratch graph for the lifetime of one export. All data is lost
//! when the last clone is dropped.

use super::{BatchWrite, KeyValue, StorageBackend};
use crate::error::{ExportError, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// Storage backend over a shared `BTreeMap`.
///
/// Clones share the same map, so a test can keep a handle and inspect what
/// the store wrote. A batch is applied under one write lock, which makes it
/// atomic to every other clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<Map>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Map>> {
        self.data.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Map>> {
        self.data.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> ExportError {
    ExportError::storage("Memory backend lock poisoned", None::<std::io::Error>)
}

impl StorageBackend for MemoryBackend {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.read()?.contains_key(key))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        let data = self.read()?;
        Ok(data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn write_batch(&mut self, writes: Vec<BatchWrite>) -> Result<()> {
        let mut data = self.write()?;
        for write in writes {
            match write {
                BatchWrite::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchWrite::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
