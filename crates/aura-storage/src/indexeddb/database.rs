//! In-process object-store database
//!
//! The physical layout the IndexedDB adapter works against: one database
//! per adapter instance name, one object store per table, records keyed by
//! `key` with a secondary index on `expires`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adapter::StorageItem;
use crate::error::StorageError;

/// A stored record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: String,
    pub item: StorageItem,
    /// Estimated size charged when the record was written
    pub size: usize,
    pub expires: i64,
}

/// Object store with an `expires` index
#[derive(Debug, Default)]
pub struct ObjectStore {
    records: BTreeMap<String, Record>,
    expires_index: BTreeSet<(i64, String)>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record
    pub fn put(&mut self, record: Record) {
        if let Some(old) = self.records.remove(&record.key) {
            self.expires_index.remove(&(old.expires, old.key));
        }
        self.expires_index.insert((record.expires, record.key.clone()));
        self.records.insert(record.key.clone(), record);
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn delete(&mut self, key: &str) -> Option<Record> {
        let record = self.records.remove(key)?;
        self.expires_index.remove(&(record.expires, record.key.clone()));
        Some(record)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.expires_index.clear();
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Records in key order
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Keys ordered by the `expires` index, soonest first
    pub fn keys_by_expires(&self) -> Vec<String> {
        self.expires_index.iter().map(|(_, key)| key.clone()).collect()
    }
}

/// A database: named object stores
#[derive(Debug)]
pub struct Database {
    pub name: String,
    stores: HashMap<String, ObjectStore>,
}

impl Database {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stores: HashMap::new(),
        }
    }

    /// Create the store if it does not exist yet
    pub fn ensure_store(&mut self, table: &str) -> &mut ObjectStore {
        self.stores.entry(table.to_string()).or_default()
    }

    pub fn store(&self, table: &str) -> Result<&ObjectStore, StorageError> {
        self.stores
            .get(table)
            .ok_or_else(|| {
                StorageError::Transaction(format!("no object store {table} in {}", self.name))
            })
    }

    pub fn store_mut(&mut self, table: &str) -> Result<&mut ObjectStore, StorageError> {
        let name = &self.name;
        self.stores
            .get_mut(table)
            .ok_or_else(|| StorageError::Transaction(format!("no object store {table} in {name}")))
    }

    pub fn store_names(&self) -> Vec<&str> {
        self.stores.keys().map(String::as_str).collect()
    }
}

/// Shared handle to an open database
pub type DatabaseHandle = Arc<Mutex<Database>>;

/// Lock a database, recovering from a poisoned lock
pub fn lock_database(db: &DatabaseHandle) -> MutexGuard<'_, Database> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Completion callback of an open request
pub type OpenCallback = Box<dyn FnOnce(Result<DatabaseHandle, StorageError>) + Send>;

/// Opens and deletes databases
pub trait DatabaseFactory: Send + Sync {
    /// Open (creating if needed) `name` with object store `table`.
    /// `on_open` may run before or after this call returns.
    fn open(&self, name: &str, table: &str, on_open: OpenCallback);

    fn delete_database(&self, name: &str) -> Result<(), StorageError>;
}

/// In-process database factory. Clones share the same databases.
#[derive(Debug, Clone, Default)]
pub struct IdbFactory {
    databases: Arc<Mutex<HashMap<String, DatabaseHandle>>>,
    unavailable: bool,
}

impl IdbFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory whose open requests always fail
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn databases(&self) -> MutexGuard<'_, HashMap<String, DatabaseHandle>> {
        self.databases.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.databases().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.databases().contains_key(name)
    }
}

impl DatabaseFactory for IdbFactory {
    fn open(&self, name: &str, table: &str, on_open: OpenCallback) {
        if self.unavailable {
            on_open(Err(StorageError::OpenFailed(format!("{name}: indexedDB unavailable"))));
            return;
        }
        let db = {
            let mut databases = self.databases();
            Arc::clone(
                databases
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(Database::new(name)))),
            )
        };
        lock_database(&db).ensure_store(table);
        on_open(Ok(db));
    }

    fn delete_database(&self, name: &str) -> Result<(), StorageError> {
        self.databases().remove(name);
        Ok(())
    }
}
