//! Storage adapter contract

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageError;

/// Result of an adapter operation, resolved asynchronously.
///
/// Operations take effect (or are queued) when called; awaiting only
/// observes the outcome.
pub type StorageFuture<T> = BoxFuture<'static, Result<T, StorageError>>;

/// Already-settled storage future
pub fn settled<T: Send + 'static>(result: Result<T, StorageError>) -> StorageFuture<T> {
    future::ready(result).boxed()
}

/// A stored value with its timestamps (milliseconds since the epoch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageItem {
    pub value: Value,
    pub created: i64,
    pub expires: i64,
}

impl StorageItem {
    pub fn new(value: Value, created: i64, expires: i64) -> Self {
        Self { value, created, expires }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires <= now_ms
    }
}

/// One record returned by a full scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub key: String,
    pub value: StorageItem,
    pub expires: i64,
}

/// Async key-value backend with a size budget
pub trait StorageAdapter: Send + Sync {
    /// Registered adapter name
    fn name(&self) -> &'static str;

    /// Whether data survives the process
    fn is_persistent(&self) -> bool;

    /// Current (approximate) size in bytes
    fn get_size(&self) -> StorageFuture<f64>;

    fn get_item(&self, key: &str) -> StorageFuture<Option<StorageItem>>;

    /// Every record, expired ones included
    fn get_all(&self) -> StorageFuture<Vec<StoredEntry>>;

    fn set_item(&self, key: &str, item: StorageItem) -> StorageFuture<()>;

    fn remove_item(&self, key: &str) -> StorageFuture<()>;

    fn clear(&self) -> StorageFuture<()>;

    /// Evict expired and excess records
    fn sweep(&self) -> StorageFuture<()>;

    /// Drop the backing store entirely
    fn delete_storage(&self) -> StorageFuture<()>;
}
