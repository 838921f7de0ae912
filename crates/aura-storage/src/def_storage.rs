//! Component definition storage
//!
//! Persists component and library definitions so a later boot can restore
//! them without fetching them again. Definitions are only kept when both
//! this storage and the actions storage are persistent, since labels the
//! definitions depend on travel with cached actions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{try_join_all, BoxFuture, Shared};
use serde_json::Value;

use crate::adapter::{settled, StorageFuture};
use crate::error::StorageError;
use crate::service::StorageService;
use crate::storage::AuraStorage;

/// Name of the storage holding definitions
pub const DEF_STORAGE_NAME: &str = "ComponentDefStorage";

/// Name of the actions storage gating persistence
pub const ACTIONS_STORAGE_NAME: &str = "actions";

/// Key marking a stored definition as a library
const LIBRARY_MARKER: &str = "includes";

const DESCRIPTOR_KEY: &str = "descriptor";
const UUID_KEY: &str = "uuid";

/// Loaded-definition bookkeeping of the current context
pub trait LoadedContext: Send + Sync {
    /// UUID of the loaded definition for `descriptor`
    fn find_loaded(&self, descriptor: &str) -> Option<String>;

    fn add_loaded(&self, uuid: &str);
}

/// Registry definitions are restored into
pub trait ComponentRegistry: Send + Sync {
    fn has_component_def(&self, descriptor: &str) -> bool;

    fn save_component_config(&self, config: Value);

    fn has_library(&self, descriptor: &str) -> bool;

    fn save_library_config(&self, config: Value);
}

type RestoreFuture = Shared<BoxFuture<'static, ()>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn descriptor_of(config: &Value) -> Result<String, StorageError> {
    config
        .get(DESCRIPTOR_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StorageError::Encode(format!("definition without a descriptor: {config}")))
}

fn decode(key: &str, stored: &Value) -> Result<Value, StorageError> {
    let encoded = stored
        .as_str()
        .ok_or_else(|| StorageError::Decode(format!("{key}: stored definition is not a string")))?;
    serde_json::from_str(encoded).map_err(|err| StorageError::Decode(format!("{key}: {err}")))
}

/// Stores, removes and restores component definitions
pub struct ComponentDefStorage {
    storage: Mutex<Option<Arc<AuraStorage>>>,
    actions: Option<Arc<AuraStorage>>,
    use_storage: Mutex<Option<bool>>,
    restore_in_flight: Arc<Mutex<Option<RestoreFuture>>>,
    registry: Arc<dyn ComponentRegistry>,
}

impl ComponentDefStorage {
    pub fn new(
        storage: Option<Arc<AuraStorage>>,
        actions: Option<Arc<AuraStorage>>,
        registry: Arc<dyn ComponentRegistry>,
    ) -> Self {
        Self {
            storage: Mutex::new(storage),
            actions,
            use_storage: Mutex::new(None),
            restore_in_flight: Arc::new(Mutex::new(None)),
            registry,
        }
    }

    /// Definition storage over the service's definition and actions storages
    pub fn from_service(service: &StorageService, registry: Arc<dyn ComponentRegistry>) -> Self {
        Self::new(
            service.get_storage(DEF_STORAGE_NAME),
            service.get_storage(ACTIONS_STORAGE_NAME),
            registry,
        )
    }

    /// Whether definitions are persisted. Decided once; when persistence is
    /// not possible the definition storage is deleted.
    pub fn use_definition_storage(&self) -> bool {
        let mut use_storage = lock(&self.use_storage);
        if let Some(decided) = *use_storage {
            return decided;
        }

        let mut storage = lock(&self.storage);
        let actions_persistent = self.actions.as_ref().is_some_and(|a| a.is_persistent());
        let decided = match storage.as_ref() {
            Some(defs) if defs.is_persistent() && actions_persistent => true,
            Some(defs) => {
                tracing::info!(
                    storage = defs.name(),
                    actions_persistent,
                    "Definition storage disabled; deleting it"
                );
                // Takes effect when issued
                drop(defs.delete_storage());
                *storage = None;
                false
            }
            None => false,
        };
        *use_storage = Some(decided);
        decided
    }

    /// The definition storage, when in use
    pub fn get_storage(&self) -> Option<Arc<AuraStorage>> {
        if self.use_definition_storage() {
            lock(&self.storage).clone()
        } else {
            None
        }
    }

    /// Encode and write component and library definitions under their
    /// descriptors. Fails if any write fails.
    pub fn store_defs(
        &self,
        cmps: Vec<Value>,
        libs: Vec<Value>,
        context: &dyn LoadedContext,
    ) -> StorageFuture<()> {
        if cmps.is_empty() && libs.is_empty() {
            return settled(Ok(()));
        }
        let Some(storage) = self.get_storage() else {
            return settled(Ok(()));
        };

        let mut writes = Vec::with_capacity(cmps.len() + libs.len());
        for mut config in cmps.into_iter().chain(libs) {
            let descriptor = match descriptor_of(&config) {
                Ok(descriptor) => descriptor,
                Err(err) => return settled(Err(err)),
            };
            let uuid = context.find_loaded(&descriptor);
            if let (Some(uuid), Some(fields)) = (uuid, config.as_object_mut()) {
                fields.insert(UUID_KEY.to_string(), Value::String(uuid));
            }
            let encoded = match serde_json::to_string(&config) {
                Ok(encoded) => encoded,
                Err(err) => return settled(Err(StorageError::Encode(err.to_string()))),
            };
            writes.push(storage.put(&descriptor, Value::String(encoded)));
        }

        let count = writes.len();
        async move {
            match try_join_all(writes).await {
                Ok(_) => {
                    tracing::debug!(count, "Definitions stored");
                    Ok(())
                }
                Err(err) => {
                    tracing::warn!(%err, "Failed to store definitions");
                    Err(err)
                }
            }
        }
        .boxed()
    }

    /// Remove the definitions stored under `descriptors`. Fails if any
    /// removal fails.
    pub fn remove_defs(&self, descriptors: &[String]) -> StorageFuture<()> {
        let Some(storage) = self.get_storage() else {
            return settled(Ok(()));
        };
        let removals: Vec<_> = descriptors.iter().map(|d| storage.remove(d)).collect();
        async move {
            try_join_all(removals).await.map(|_| ()).inspect_err(|err| {
                tracing::warn!(%err, "Failed to remove definitions");
            })
        }
        .boxed()
    }

    /// Every stored definition, decoded. A storage failure yields nothing;
    /// a record that fails to decode fails the whole call.
    pub fn get_all(&self) -> StorageFuture<Vec<(String, Value)>> {
        let Some(storage) = self.get_storage() else {
            return settled(Ok(Vec::new()));
        };
        // Expiration is advisory for definitions
        let entries = storage.adapter().get_all();
        async move {
            let entries = match entries.await {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(%err, "Definition storage unavailable");
                    return Ok(Vec::new());
                }
            };
            let mut defs = Vec::with_capacity(entries.len());
            for entry in entries {
                let config = decode(&entry.key, &entry.value.value)?;
                defs.push((entry.key, config));
            }
            Ok(defs)
        }
        .boxed()
    }

    /// Restore stored definitions into the registry, skipping registered
    /// ones. Concurrent calls share one restore. Never fails.
    pub fn restore_all(&self, context: Arc<dyn LoadedContext>) -> BoxFuture<'static, ()> {
        let mut in_flight = lock(&self.restore_in_flight);
        if let Some(restore) = in_flight.as_ref() {
            return restore.clone().boxed();
        }

        let defs = self.get_all();
        let registry = Arc::clone(&self.registry);
        let slot = Arc::clone(&self.restore_in_flight);
        let restore = async move {
            match defs.await {
                Ok(defs) => restore_defs(defs, registry.as_ref(), context.as_ref()),
                Err(err) => tracing::error!(%err, "Failed to restore definitions"),
            }
            *lock(&slot) = None;
        }
        .boxed()
        .shared();

        *in_flight = Some(restore.clone());
        restore.boxed()
    }

    /// Empty the definition storage
    pub fn clear(&self) -> StorageFuture<()> {
        match self.get_storage() {
            Some(storage) => storage.clear(),
            None => settled(Ok(())),
        }
    }
}

fn restore_defs(
    defs: Vec<(String, Value)>,
    registry: &dyn ComponentRegistry,
    context: &dyn LoadedContext,
) {
    let (mut components, mut libraries) = (0usize, 0usize);
    for (descriptor, config) in defs {
        if let Some(uuid) = config.get(UUID_KEY).and_then(Value::as_str) {
            context.add_loaded(uuid);
        }
        if config.get(LIBRARY_MARKER).is_some() {
            if !registry.has_library(&descriptor) {
                registry.save_library_config(config);
                libraries += 1;
            }
        } else if !registry.has_component_def(&descriptor) {
            registry.save_component_config(config);
            components += 1;
        }
    }
    tracing::info!(components, libraries, "Definitions restored");
}

impl std::fmt::Debug for ComponentDefStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = lock(&self.storage).clone();
        let use_storage = *lock(&self.use_storage);
        f.debug_struct("ComponentDefStorage")
            .field("storage", &storage)
            .field("use_storage", &use_storage)
            .finish_non_exhaustive()
    }
}
