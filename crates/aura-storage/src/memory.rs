//! In-memory adapter
//!
//! Non-persistent fallback. Sizes are tracked exactly since every record
//! is at hand; going over budget evicts the records closest to expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adapter::{settled, StorageAdapter, StorageFuture, StorageItem, StoredEntry};
use crate::clock::{Clock, SystemClock};
use crate::config::AdapterConfig;
use crate::error::StorageError;
use crate::size::estimate_item;

/// Registered adapter name
pub const MEMORY_ADAPTER: &str = "memory";

#[derive(Debug, Default)]
struct MemoryState {
    items: HashMap<String, (StorageItem, usize)>,
    size: usize,
}

impl MemoryState {
    fn remove(&mut self, key: &str) {
        if let Some((_, size)) = self.items.remove(key) {
            self.size -= size;
        }
    }

    /// Drop expired records, then the soonest-expiring ones until `needed`
    /// more bytes fit under `max_size`
    fn evict(&mut self, needed: usize, max_size: usize, now_ms: i64) {
        let mut by_expiry: Vec<(String, i64)> = self
            .items
            .iter()
            .map(|(key, (item, _))| (key.clone(), item.expires))
            .collect();
        by_expiry.sort_by_key(|(_, expires)| *expires);

        for (key, expires) in by_expiry {
            if expires > now_ms && self.size + needed <= max_size {
                break;
            }
            self.remove(&key);
        }
    }
}

/// In-memory storage adapter
pub struct MemoryAdapter {
    config: AdapterConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<MemoryState>,
}

impl MemoryAdapter {
    /// Create a new memory adapter
    pub fn new(config: AdapterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AdapterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageAdapter for MemoryAdapter {
    fn name(&self) -> &'static str {
        MEMORY_ADAPTER
    }

    fn is_persistent(&self) -> bool {
        false
    }

    fn get_size(&self) -> StorageFuture<f64> {
        settled(Ok(self.state().size as f64))
    }

    fn get_item(&self, key: &str) -> StorageFuture<Option<StorageItem>> {
        settled(Ok(self.state().items.get(key).map(|(item, _)| item.clone())))
    }

    fn get_all(&self) -> StorageFuture<Vec<StoredEntry>> {
        let entries = self
            .state()
            .items
            .iter()
            .map(|(key, (item, _))| StoredEntry {
                key: key.clone(),
                value: item.clone(),
                expires: item.expires,
            })
            .collect();
        settled(Ok(entries))
    }

    fn set_item(&self, key: &str, item: StorageItem) -> StorageFuture<()> {
        let size = estimate_item(key, &item);
        if size > self.config.max_size {
            return settled(Err(StorageError::ItemTooLarge {
                key: key.to_string(),
                size,
                limit: self.config.max_size,
            }));
        }

        let mut state = self.state();
        state.remove(key);
        if state.size + size > self.config.max_size {
            state.evict(size, self.config.max_size, self.clock.now_ms());
        }
        state.items.insert(key.to_string(), (item, size));
        state.size += size;
        if self.config.debug_logging_enabled {
            tracing::debug!(adapter = MEMORY_ADAPTER, key, size, total = state.size, "Item stored");
        }
        settled(Ok(()))
    }

    fn remove_item(&self, key: &str) -> StorageFuture<()> {
        self.state().remove(key);
        settled(Ok(()))
    }

    fn clear(&self) -> StorageFuture<()> {
        *self.state() = MemoryState::default();
        settled(Ok(()))
    }

    fn sweep(&self) -> StorageFuture<()> {
        let mut state = self.state();
        state.evict(0, self.config.max_size, self.clock.now_ms());
        settled(Ok(()))
    }

    fn delete_storage(&self) -> StorageFuture<()> {
        self.clear()
    }
}
