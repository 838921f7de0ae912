//! Named storage over an adapter

use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;

use crate::adapter::{StorageAdapter, StorageFuture, StorageItem};
use crate::clock::Clock;
use crate::config::StorageConfig;

/// A storage instance: an adapter plus expiration policy
pub struct AuraStorage {
    config: StorageConfig,
    adapter: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
}

impl AuraStorage {
    pub fn new(
        config: StorageConfig,
        adapter: Arc<dyn StorageAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { config, adapter, clock }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn adapter_name(&self) -> &'static str {
        self.adapter.name()
    }

    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.adapter
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn is_persistent(&self) -> bool {
        self.adapter.is_persistent()
    }

    pub fn get_max_size(&self) -> usize {
        self.config.max_size
    }

    pub fn get_size(&self) -> StorageFuture<f64> {
        self.adapter.get_size()
    }

    /// Store `value`, expiring after the default expiration
    pub fn put(&self, key: &str, value: Value) -> StorageFuture<()> {
        let now = self.clock.now_ms();
        let expires = now + self.config.default_expiration.as_millis() as i64;
        self.adapter.set_item(key, StorageItem::new(value, now, expires))
    }

    /// Value under `key`, if present and not expired
    pub fn get(&self, key: &str) -> StorageFuture<Option<Value>> {
        let clock = Arc::clone(&self.clock);
        let item = self.adapter.get_item(key);
        async move {
            let now = clock.now_ms();
            Ok(item.await?.filter(|item| !item.is_expired(now)).map(|item| item.value))
        }
        .boxed()
    }

    /// Every unexpired key and value
    pub fn get_all(&self) -> StorageFuture<Vec<(String, Value)>> {
        let clock = Arc::clone(&self.clock);
        let entries = self.adapter.get_all();
        async move {
            let now = clock.now_ms();
            Ok(entries
                .await?
                .into_iter()
                .filter(|entry| !entry.value.is_expired(now))
                .map(|entry| (entry.key, entry.value.value))
                .collect())
        }
        .boxed()
    }

    pub fn remove(&self, key: &str) -> StorageFuture<()> {
        self.adapter.remove_item(key)
    }

    pub fn clear(&self) -> StorageFuture<()> {
        self.adapter.clear()
    }

    pub fn sweep(&self) -> StorageFuture<()> {
        self.adapter.sweep()
    }

    pub fn delete_storage(&self) -> StorageFuture<()> {
        self.adapter.delete_storage()
    }
}

impl std::fmt::Debug for AuraStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuraStorage")
            .field("name", &self.config.name)
            .field("adapter", &self.adapter.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::AdapterConfig;
    use crate::memory::MemoryAdapter;
    use serde_json::json;
    use std::time::Duration;

    fn storage(clock: &ManualClock) -> AuraStorage {
        let config = StorageConfig {
            default_expiration: Duration::from_secs(60),
            ..StorageConfig::new("test")
        };
        let adapter = Arc::new(MemoryAdapter::new(AdapterConfig::new("test", 10_000)));
        AuraStorage::new(config, adapter, Arc::new(clock.clone()))
    }

    #[test]
    fn test_put_get() {
        let clock = ManualClock::new(0);
        let storage = storage(&clock);
        smol::block_on(storage.put("a", json!({"x": 1}))).unwrap();
        assert_eq!(smol::block_on(storage.get("a")).unwrap(), Some(json!({"x": 1})));
        assert_eq!(smol::block_on(storage.get("missing")).unwrap(), None);
    }

    #[test]
    fn test_expired_values_hidden() {
        let clock = ManualClock::new(0);
        let storage = storage(&clock);
        smol::block_on(storage.put("a", json!(1))).unwrap();

        clock.advance(Duration::from_secs(61));
        smol::block_on(storage.put("b", json!(2))).unwrap();

        assert_eq!(smol::block_on(storage.get("a")).unwrap(), None);
        let all = smol::block_on(storage.get_all()).unwrap();
        assert_eq!(all, vec![("b".to_string(), json!(2))]);
    }

    #[test]
    fn test_not_persistent_over_memory() {
        let clock = ManualClock::new(0);
        let storage = storage(&clock);
        assert!(!storage.is_persistent());
        assert_eq!(storage.adapter_name(), "memory");
        assert_eq!(storage.get_max_size(), StorageConfig::default().max_size);
    }
}
