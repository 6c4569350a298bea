//! Document storage keyed by opaque ids

use crate::error::{Error, Result};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Byte storage for uploaded and produced documents.
///
/// Ids are opaque strings. A `get` after `remove` (or after eviction by an
/// implementation with limits) returns `None`.
pub trait DocumentStore: Send + Sync {
    /// Store bytes and return a fresh id. Fails when the bytes cannot be
    /// kept, so no id is handed out for a document that is not stored.
    fn put(&self, data: Vec<u8>) -> Result<String>;

    fn get(&self, id: &str) -> Option<Vec<u8>>;

    /// Remove an entry, returning whether it existed
    fn remove(&self, id: &str) -> bool;
}

struct StoreInner {
    lru: LruCache<String, Vec<u8>>,
    total_bytes: usize,
}

/// In-memory store with entry count and byte budget limits. The least
/// recently used documents are evicted first.
pub struct LruDocumentStore {
    inner: Mutex<StoreInner>,
    max_bytes: usize,
}

impl LruDocumentStore {
    /// Create a store with the given entry capacity and byte budget
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(StoreInner {
                lru: LruCache::new(capacity),
                total_bytes: 0,
            }),
            max_bytes,
        }
    }

    /// Insert under a caller-chosen id, evicting LRU entries until the byte
    /// budget holds. An entry larger than the whole budget is rejected.
    fn insert(&self, id: String, data: Vec<u8>) -> Result<()> {
        let new_size = data.len();
        if new_size > self.max_bytes {
            tracing::warn!(size = new_size, max = self.max_bytes, "Document exceeds store budget");
            return Err(Error::DocumentTooLarge {
                size: new_size,
                max: self.max_bytes,
            });
        }

        let mut inner = self.inner.lock();
        if let Some(old) = inner.lru.pop(&id) {
            inner.total_bytes = inner.total_bytes.saturating_sub(old.len());
        }

        while inner.total_bytes + new_size > self.max_bytes {
            match inner.lru.pop_lru() {
                Some((evicted, bytes)) => {
                    tracing::debug!(id = %evicted, "Evicted stored document");
                    inner.total_bytes = inner.total_bytes.saturating_sub(bytes.len());
                }
                None => break,
            }
        }

        inner.total_bytes += new_size;
        if let Some((evicted, bytes)) = inner.lru.push(id, data) {
            // Capacity eviction (a replaced key was popped above)
            tracing::debug!(id = %evicted, "Evicted stored document");
            inner.total_bytes = inner.total_bytes.saturating_sub(bytes.len());
        }
        Ok(())
    }

    /// Generate an id not currently in use
    fn unique_id(&self) -> String {
        let inner = self.inner.lock();
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !inner.lru.contains(&id) {
                return id;
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().lru.contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().lru.is_empty()
    }

    /// Total bytes currently stored
    pub fn total_bytes(&self) -> usize {
        self.inner.lock().total_bytes
    }
}

impl DocumentStore for LruDocumentStore {
    fn put(&self, data: Vec<u8>) -> Result<String> {
        let id = self.unique_id();
        self.insert(id.clone(), data)?;
        Ok(id)
    }

    fn get(&self, id: &str) -> Option<Vec<u8>> {
        self.inner.lock().lru.get(id).cloned()
    }

    fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.lru.pop(id) {
            Some(bytes) => {
                inner.total_bytes = inner.total_bytes.saturating_sub(bytes.len());
                true
            }
            None => false,
        }
    }
}
