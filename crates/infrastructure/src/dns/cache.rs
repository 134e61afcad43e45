pub mod key;

pub use key::CacheKey;

use hickory_proto::op::Message;
use lru::LruCache;
use rustc_hash::FxBuildHasher;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Capacity-bounded store of upstream responses keyed by question and
/// delegation context. Entries never expire; the least recently used one is
/// dropped when the cache is full.
pub struct ResponseCache {
    entries: Mutex<LruCache<CacheKey, Message, FxBuildHasher>>,
    capacity: NonZeroUsize,
}

impl ResponseCache {
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::with_hasher(capacity, FxBuildHasher)),
            capacity,
        }
    }

    /// Returns an owned copy of the cached message, so callers may mutate
    /// their result freely.
    pub fn get(&self, key: &CacheKey) -> Option<Message> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, message: Message) {
        self.lock().put(key, message);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panic while holding the lock cannot leave the LRU half-updated, so a
    // poisoned mutex is still safe to use.
    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, Message, FxBuildHasher>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
