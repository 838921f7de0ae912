//! IndexedDB storage adapter
//!
//! Persistent key-value adapter with approximate-size eviction. The size
//! of the store is tracked by a [`SizeEstimator`] that is only reconciled
//! with the truth on full walks (`get_all` and sweeps).
//!
//! Operations issued while the database is opening are queued and replayed
//! in issue order once it is open. If opening fails, queued and later
//! operations all reject.

mod database;

pub use database::{
    lock_database, Database, DatabaseFactory, DatabaseHandle, IdbFactory, ObjectStore, OpenCallback,
    Record,
};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::channel::oneshot;

use crate::adapter::{StorageAdapter, StorageFuture, StorageItem, StoredEntry};
use crate::clock::{Clock, SystemClock};
use crate::config::{AdapterConfig, IndexedDbConfig};
use crate::error::{StorageError, StorageResult};
use crate::size::{estimate_item, SizeEstimator};

/// Registered adapter name
pub const INDEXEDDB_ADAPTER: &str = "indexeddb";

type Operation = Box<dyn FnOnce(Result<&mut Core, StorageError>) + Send>;

enum Readiness {
    Pending(VecDeque<Operation>),
    Ready,
    Failed(StorageError),
}

/// State the operations run against
struct Core {
    config: AdapterConfig,
    idb: IndexedDbConfig,
    clock: Arc<dyn Clock>,
    estimator: SizeEstimator,
    last_sweep: Option<i64>,
    db: Option<DatabaseHandle>,
}

struct Inner {
    core: Core,
    readiness: Readiness,
}

impl Core {
    fn db(&self) -> StorageResult<DatabaseHandle> {
        self.db
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| StorageError::NotReady(self.config.name.clone()))
    }

    fn budget(&self, ratio: f64) -> f64 {
        self.config.max_size as f64 * ratio
    }

    fn high_watermark(&self) -> f64 {
        self.budget(self.idb.high_watermark_ratio)
    }

    fn low_watermark(&self) -> f64 {
        self.budget(self.idb.low_watermark_ratio)
    }

    fn item_limit(&self) -> usize {
        self.budget(self.idb.item_limit_ratio) as usize
    }

    fn error_limit(&self) -> f64 {
        self.budget(self.idb.error_bar_ratio)
    }

    fn get_item(&mut self, key: &str) -> StorageResult<Option<StorageItem>> {
        let db = self.db()?;
        let db = lock_database(&db);
        Ok(db.store(&self.idb.table_name)?.get(key).map(|r| r.item.clone()))
    }

    /// Full scan; reconciles the estimator and sweeps when over the high
    /// watermark
    fn get_all(&mut self) -> StorageResult<Vec<StoredEntry>> {
        let (entries, size) = self.walk()?;
        if size as f64 > self.high_watermark() {
            if let Err(err) = self.sweep(0, false) {
                tracing::warn!(
                    adapter = INDEXEDDB_ADAPTER,
                    name = %self.config.name,
                    %err,
                    "Sweep after walk failed"
                );
            }
        }
        Ok(entries)
    }

    fn walk(&mut self) -> StorageResult<(Vec<StoredEntry>, usize)> {
        let db = self.db()?;
        let (entries, size) = {
            let db = lock_database(&db);
            let store = db.store(&self.idb.table_name)?;
            let size = store.records().map(|r| r.size).sum::<usize>();
            let entries: Vec<StoredEntry> = store
                .records()
                .map(|r| StoredEntry {
                    key: r.key.clone(),
                    value: r.item.clone(),
                    expires: r.expires,
                })
                .collect();
            (entries, size)
        };
        self.estimator.set_real(size, entries.len());
        Ok((entries, size))
    }

    fn set_item(&mut self, key: String, item: StorageItem) -> StorageResult<()> {
        let size = estimate_item(&key, &item);
        let limit = self.item_limit();
        if size > limit {
            tracing::warn!(
                adapter = INDEXEDDB_ADAPTER,
                key = %key,
                size,
                limit,
                "Item exceeds the per-item limit"
            );
            return Err(StorageError::ItemTooLarge { key, size, limit });
        }

        if self.estimator.projected(size) > self.high_watermark()
            || self.estimator.error_bar > self.error_limit()
        {
            if let Err(err) = self.sweep(size, false) {
                tracing::warn!(
                    adapter = INDEXEDDB_ADAPTER,
                    name = %self.config.name,
                    %err,
                    "Sweep before write failed"
                );
            }
        }

        let db = self.db()?;
        lock_database(&db).store_mut(&self.idb.table_name)?.put(Record {
            expires: item.expires,
            key: key.clone(),
            item,
            size,
        });
        self.estimator.record_set(size);
        if self.config.debug_logging_enabled {
            tracing::debug!(
                adapter = INDEXEDDB_ADAPTER,
                key = %key,
                size,
                guess = self.estimator.size_guess,
                error_bar = self.estimator.error_bar,
                "Item stored"
            );
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        let db = self.db()?;
        lock_database(&db).store_mut(&self.idb.table_name)?.delete(key);
        self.estimator.record_remove();
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        let db = self.db()?;
        lock_database(&db).store_mut(&self.idb.table_name)?.clear();
        self.estimator.reset();
        Ok(())
    }

    /// Evict expired records plus enough of the soonest-expiring ones to
    /// free `requested` bytes and get back under the low watermark.
    ///
    /// Runs a second pass at most once when the walk shows the store is
    /// still over the high watermark.
    fn sweep(&mut self, requested: usize, force: bool) -> StorageResult<()> {
        self.sweep_pass(requested, force, true)
    }

    fn sweep_pass(&mut self, requested: usize, force: bool, may_repeat: bool) -> StorageResult<()> {
        let now = self.clock.now_ms();
        let high = self.high_watermark();
        if let Some(last) = self.last_sweep {
            let interval = self.idb.sweep_interval.as_millis() as i64;
            if !force && now - last < interval && self.estimator.size_guess < high {
                tracing::trace!(adapter = INDEXEDDB_ADAPTER, "Sweep skipped; swept recently");
                return Ok(());
            }
        }

        let low = self.low_watermark();
        let excess = (self.estimator.size_guess - low).max(0.0);
        let target = requested as f64 + excess;
        let expire_before = now + self.idb.expire_fudge.as_millis() as i64;

        let db = self.db()?;
        let (kept_size, kept_count, evicted) = {
            let mut db = lock_database(&db);
            let store = db.store_mut(&self.idb.table_name)?;
            let mut removed = 0.0;
            let (mut kept_size, mut kept_count, mut evicted) = (0usize, 0usize, 0usize);
            for key in store.keys_by_expires() {
                let Some((size, expires)) = store.get(&key).map(|r| (r.size, r.expires)) else {
                    continue;
                };
                if expires < expire_before || removed < target {
                    store.delete(&key);
                    removed += size as f64;
                    evicted += 1;
                } else {
                    kept_size += size;
                    kept_count += 1;
                }
            }
            (kept_size, kept_count, evicted)
        };

        self.estimator.set_real(kept_size, kept_count);
        self.last_sweep = Some(now);
        tracing::debug!(
            adapter = INDEXEDDB_ADAPTER,
            name = %self.config.name,
            evicted,
            kept = kept_count,
            size = kept_size,
            target,
            "Sweep complete"
        );

        if kept_size as f64 > high && may_repeat {
            return self.sweep_pass(0, force, false);
        }
        Ok(())
    }
}

/// IndexedDB-backed storage adapter
pub struct IndexedDbAdapter {
    name: String,
    inner: Arc<Mutex<Inner>>,
    factory: Arc<dyn DatabaseFactory>,
}

impl IndexedDbAdapter {
    /// Create a new adapter and start opening its database
    pub fn new(config: AdapterConfig, factory: Arc<dyn DatabaseFactory>) -> Self {
        Self::with_options(config, IndexedDbConfig::default(), factory, Arc::new(SystemClock))
    }

    pub fn with_options(
        config: AdapterConfig,
        idb: IndexedDbConfig,
        factory: Arc<dyn DatabaseFactory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let name = config.name.clone();
        let table = idb.table_name.clone();
        let inner = Arc::new(Mutex::new(Inner {
            core: Core {
                estimator: SizeEstimator::new(idb.initial_average_item_size),
                config,
                idb,
                clock,
                last_sweep: None,
                db: None,
            },
            readiness: Readiness::Pending(VecDeque::new()),
        }));

        let handle = Arc::clone(&inner);
        factory.open(&name, &table, Box::new(move |result| Self::on_open(&handle, result)));

        Self { name, inner, factory }
    }

    fn on_open(inner: &Mutex<Inner>, result: Result<DatabaseHandle, StorageError>) {
        let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
        let inner = &mut *guard;
        let queued = match std::mem::replace(&mut inner.readiness, Readiness::Ready) {
            Readiness::Pending(queue) => queue,
            other => {
                inner.readiness = other;
                return;
            }
        };

        match result {
            Ok(db) => {
                inner.core.db = Some(db);
                if let Err(err) = inner.core.walk() {
                    tracing::warn!(
                        adapter = INDEXEDDB_ADAPTER,
                        name = %inner.core.config.name,
                        %err,
                        "Initial size walk failed"
                    );
                }
                tracing::debug!(
                    adapter = INDEXEDDB_ADAPTER,
                    name = %inner.core.config.name,
                    queued = queued.len(),
                    size = inner.core.estimator.real_size,
                    "Database open"
                );
                for op in queued {
                    op(Ok(&mut inner.core));
                }
            }
            Err(err) => {
                tracing::error!(
                    adapter = INDEXEDDB_ADAPTER,
                    name = %inner.core.config.name,
                    %err,
                    "Failed to open database"
                );
                inner.readiness = Readiness::Failed(err.clone());
                for op in queued {
                    op(Err(err.clone()));
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` now if the database is open, queue it while opening, reject
    /// it if opening failed
    fn request<T, F>(&self, f: F) -> StorageFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Core) -> StorageResult<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let op: Operation = Box::new(move |core| {
            let _ = tx.send(core.and_then(f));
        });

        {
            let mut guard = self.lock();
            let inner = &mut *guard;
            match &mut inner.readiness {
                Readiness::Ready => op(Ok(&mut inner.core)),
                Readiness::Pending(queue) => queue.push_back(op),
                Readiness::Failed(err) => op(Err(err.clone())),
            }
        }

        async move { rx.await.unwrap_or(Err(StorageError::Cancelled)) }.boxed()
    }

    /// `None` while opening, then whether the open succeeded
    pub fn ready(&self) -> Option<bool> {
        match self.lock().readiness {
            Readiness::Pending(_) => None,
            Readiness::Ready => Some(true),
            Readiness::Failed(_) => Some(false),
        }
    }

    /// Snapshot of the size estimator
    pub fn size_stats(&self) -> SizeEstimator {
        self.lock().core.estimator.clone()
    }

    pub fn instance_name(&self) -> &str {
        &self.name
    }
}

impl StorageAdapter for IndexedDbAdapter {
    fn name(&self) -> &'static str {
        INDEXEDDB_ADAPTER
    }

    fn is_persistent(&self) -> bool {
        true
    }

    fn get_size(&self) -> StorageFuture<f64> {
        self.request(|core| Ok(core.estimator.size_guess))
    }

    fn get_item(&self, key: &str) -> StorageFuture<Option<StorageItem>> {
        let key = key.to_string();
        self.request(move |core| core.get_item(&key))
    }

    fn get_all(&self) -> StorageFuture<Vec<StoredEntry>> {
        self.request(Core::get_all)
    }

    fn set_item(&self, key: &str, item: StorageItem) -> StorageFuture<()> {
        let key = key.to_string();
        self.request(move |core| core.set_item(key, item))
    }

    fn remove_item(&self, key: &str) -> StorageFuture<()> {
        let key = key.to_string();
        self.request(move |core| core.remove_item(&key))
    }

    fn clear(&self) -> StorageFuture<()> {
        self.request(Core::clear)
    }

    fn sweep(&self) -> StorageFuture<()> {
        self.request(|core| core.sweep(0, true))
    }

    fn delete_storage(&self) -> StorageFuture<()> {
        let factory = Arc::clone(&self.factory);
        let name = self.name.clone();
        self.request(move |core| {
            core.db = None;
            core.estimator.reset();
            tracing::info!(adapter = INDEXEDDB_ADAPTER, name = %name, "Deleting database");
            factory.delete_database(&name)
        })
    }
}
