//! Aura Storage - key-value storages and component definition storage
//!
//! Storages wrap an adapter (`memory` or `indexeddb`) with an expiration
//! policy. The IndexedDB adapter keeps an approximate size and evicts the
//! soonest-expiring records when it crosses its high watermark.
//!
//! ```ignore
//! let service = StorageService::with_defaults(Arc::new(IdbFactory::new()), Arc::new(SystemClock));
//! let actions = service.init_storage(StorageConfig::new("actions").persistent(true))?;
//! actions.put("key", json!({"a": 1})).await?;
//! ```

mod adapter;
mod clock;
mod config;
mod def_storage;
mod error;
mod indexeddb;
mod memory;
mod service;
mod size;
mod storage;

pub use adapter::{settled, StorageAdapter, StorageFuture, StorageItem, StoredEntry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AdapterConfig, IndexedDbConfig, StorageConfig};
pub use def_storage::{
    ComponentDefStorage, ComponentRegistry, LoadedContext, ACTIONS_STORAGE_NAME, DEF_STORAGE_NAME,
};
pub use error::{StorageError, StorageResult};
pub use indexeddb::{
    lock_database, Database, DatabaseFactory, DatabaseHandle, IdbFactory, IndexedDbAdapter,
    ObjectStore, OpenCallback, Record, INDEXEDDB_ADAPTER,
};
pub use memory::{MemoryAdapter, MEMORY_ADAPTER};
pub use service::StorageService;
pub use size::{estimate_item, estimate_str, estimate_value, SizeEstimator};
pub use storage::AuraStorage;
