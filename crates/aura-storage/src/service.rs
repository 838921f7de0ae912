//! Storage service
//!
//! Keeps the adapter registry and the named storages built on it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adapter::{settled, StorageAdapter, StorageFuture};
use crate::clock::{Clock, SystemClock};
use crate::config::{AdapterConfig, StorageConfig};
use crate::error::StorageError;
use crate::indexeddb::{DatabaseFactory, IndexedDbAdapter, INDEXEDDB_ADAPTER};
use crate::memory::{MemoryAdapter, MEMORY_ADAPTER};
use crate::storage::AuraStorage;

type AdapterConstructor = Box<dyn Fn(AdapterConfig) -> Arc<dyn StorageAdapter> + Send + Sync>;

struct AdapterRegistration {
    persistent: bool,
    secure: bool,
    create: AdapterConstructor,
}

/// Adapter registry and storage directory
pub struct StorageService {
    adapters: HashMap<String, AdapterRegistration>,
    storages: Mutex<HashMap<String, Arc<AuraStorage>>>,
    clock: Arc<dyn Clock>,
}

impl StorageService {
    /// Create a new storage service with no adapters
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            adapters: HashMap::new(),
            storages: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Service with the memory adapter and an IndexedDB adapter backed by
    /// `factory`
    pub fn with_defaults(factory: Arc<dyn DatabaseFactory>, clock: Arc<dyn Clock>) -> Self {
        let mut service = Self::with_clock(Arc::clone(&clock));

        let memory_clock = Arc::clone(&clock);
        service.register_adapter(MEMORY_ADAPTER, false, true, move |config| {
            Arc::new(MemoryAdapter::with_clock(config, Arc::clone(&memory_clock)))
        });

        service.register_adapter(INDEXEDDB_ADAPTER, true, false, move |config| {
            Arc::new(IndexedDbAdapter::with_options(
                config,
                Default::default(),
                Arc::clone(&factory),
                Arc::clone(&clock),
            ))
        });
        service
    }

    /// Register an adapter under `name`
    pub fn register_adapter<F>(&mut self, name: &str, persistent: bool, secure: bool, create: F)
    where
        F: Fn(AdapterConfig) -> Arc<dyn StorageAdapter> + Send + Sync + 'static,
    {
        tracing::debug!(adapter = name, persistent, secure, "Storage adapter registered");
        self.adapters.insert(
            name.to_string(),
            AdapterRegistration {
                persistent,
                secure,
                create: Box::new(create),
            },
        );
    }

    pub fn is_registered_adapter(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// Pick an adapter: the named one, else one matching the persistence
    /// and security requirements, else the memory adapter
    fn select_adapter(&self, config: &StorageConfig) -> Result<&str, StorageError> {
        if let Some(name) = &config.adapter {
            return self
                .adapters
                .get_key_value(name)
                .map(|(name, _)| name.as_str())
                .ok_or_else(|| StorageError::UnknownAdapter(name.clone()));
        }

        let mut candidates: Vec<&String> = self
            .adapters
            .iter()
            .filter(|(_, reg)| {
                reg.persistent == config.persistent && (!config.secure || reg.secure)
            })
            .map(|(name, _)| name)
            .collect();
        candidates.sort();
        if let Some(name) = candidates.first() {
            return Ok(name.as_str());
        }

        if self.adapters.contains_key(MEMORY_ADAPTER) {
            Ok(MEMORY_ADAPTER)
        } else {
            Err(StorageError::UnknownAdapter(MEMORY_ADAPTER.to_string()))
        }
    }

    fn storages(&self) -> MutexGuard<'_, HashMap<String, Arc<AuraStorage>>> {
        self.storages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create (or return the existing) storage named in `config`
    pub fn init_storage(&self, config: StorageConfig) -> Result<Arc<AuraStorage>, StorageError> {
        if let Some(existing) = self.storages().get(&config.name) {
            return Ok(Arc::clone(existing));
        }

        let adapter_name = self.select_adapter(&config)?;
        let registration = self
            .adapters
            .get(adapter_name)
            .ok_or_else(|| StorageError::UnknownAdapter(adapter_name.to_string()))?;
        let adapter = (registration.create)(config.adapter_config());
        let clear_on_init = config.clear_on_init;
        let storage = Arc::new(AuraStorage::new(config, adapter, Arc::clone(&self.clock)));

        if clear_on_init {
            // Takes effect immediately; nothing to wait for
            drop(storage.clear());
        }

        tracing::info!(
            storage = storage.name(),
            adapter = storage.adapter_name(),
            persistent = storage.is_persistent(),
            "Storage initialized"
        );
        self.storages()
            .insert(storage.name().to_string(), Arc::clone(&storage));
        Ok(storage)
    }

    pub fn get_storage(&self, name: &str) -> Option<Arc<AuraStorage>> {
        self.storages().get(name).cloned()
    }

    pub fn storage_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.storages().keys().cloned().collect();
        names.sort();
        names
    }

    /// Forget a storage and delete its backing store
    pub fn delete_storage(&self, name: &str) -> StorageFuture<()> {
        match self.storages().remove(name) {
            Some(storage) => storage.delete_storage(),
            None => settled(Err(StorageError::NotFound(name.to_string()))),
        }
    }
}

impl Default for StorageService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::indexeddb::IdbFactory;

    fn service() -> StorageService {
        StorageService::with_defaults(Arc::new(IdbFactory::new()), Arc::new(ManualClock::new(0)))
    }

    #[test]
    fn test_adapter_selection_by_persistence() {
        let service = service();
        let actions = service.init_storage(StorageConfig::new("actions").persistent(true)).unwrap();
        let scratch = service.init_storage(StorageConfig::new("scratch")).unwrap();
        assert_eq!(actions.adapter_name(), INDEXEDDB_ADAPTER);
        assert!(actions.is_persistent());
        assert_eq!(scratch.adapter_name(), MEMORY_ADAPTER);
    }

    #[test]
    fn test_explicit_unknown_adapter() {
        let service = service();
        let config = StorageConfig {
            adapter: Some("smartstore".into()),
            ..StorageConfig::new("x")
        };
        let err = service.init_storage(config).unwrap_err();
        assert_eq!(err, StorageError::UnknownAdapter("smartstore".into()));
    }

    #[test]
    fn test_init_returns_existing() {
        let service = service();
        let a = service.init_storage(StorageConfig::new("a")).unwrap();
        let again = service.init_storage(StorageConfig::new("a").persistent(true)).unwrap();
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(service.storage_names(), vec!["a"]);
    }

    #[test]
    fn test_delete_storage() {
        let service = service();
        service.init_storage(StorageConfig::new("a")).unwrap();
        smol::block_on(service.delete_storage("a")).unwrap();
        assert!(service.get_storage("a").is_none());

        let err = smol::block_on(service.delete_storage("a")).unwrap_err();
        assert_eq!(err, StorageError::NotFound("a".into()));
    }

    #[test]
    fn test_no_adapters_registered() {
        let service = StorageService::new();
        assert!(matches!(
            service.init_storage(StorageConfig::new("a")),
            Err(StorageError::UnknownAdapter(_))
        ));
    }
}
