//! IndexedDB adapter tests
//!
//! Open-queue replay, per-item limits, size estimation and sweeps.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use aura_storage::{
    estimate_item, lock_database, AdapterConfig, Clock, DatabaseFactory, IdbFactory,
    IndexedDbAdapter, IndexedDbConfig, ManualClock, OpenCallback, Record, StorageAdapter,
    StorageError, StorageItem,
};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Factory that holds open requests until told to finish them
#[derive(Default)]
struct DeferredFactory {
    idb: IdbFactory,
    pending: Mutex<Vec<(String, String, OpenCallback)>>,
}

impl DeferredFactory {
    fn finish(&self) {
        let pending = std::mem::take(&mut *self.pending.lock().unwrap());
        for (name, table, on_open) in pending {
            self.idb.open(&name, &table, on_open);
        }
    }

    fn fail(&self) {
        let pending = std::mem::take(&mut *self.pending.lock().unwrap());
        for (name, _, on_open) in pending {
            on_open(Err(StorageError::OpenFailed(format!("{name}: blocked"))));
        }
    }
}

impl DatabaseFactory for DeferredFactory {
    fn open(&self, name: &str, table: &str, on_open: OpenCallback) {
        self.pending
            .lock()
            .unwrap()
            .push((name.to_string(), table.to_string(), on_open));
    }

    fn delete_database(&self, name: &str) -> Result<(), StorageError> {
        self.idb.delete_database(name)
    }
}

const FAR_FUTURE: i64 = 1_000_000_000;

/// A string value whose item under `key` is charged exactly `size` bytes
fn item_of_size(key: &str, size: usize, expires: i64) -> StorageItem {
    let overhead = estimate_item(key, &StorageItem::new(json!(""), 0, expires));
    let chars = (size - overhead) / 2;
    let item = StorageItem::new(json!("x".repeat(chars)), 0, expires);
    assert_eq!(estimate_item(key, &item), size);
    item
}

fn adapter(
    max_size: usize,
    factory: Arc<dyn DatabaseFactory>,
    clock: &ManualClock,
) -> IndexedDbAdapter {
    init_tracing();
    IndexedDbAdapter::with_options(
        AdapterConfig::new("actions", max_size),
        IndexedDbConfig::default(),
        factory,
        Arc::new(clock.clone()),
    )
}

// ============================================================================
// Open queue
// ============================================================================

#[test]
fn test_operations_queued_until_open_replay_in_order() {
    let factory = Arc::new(DeferredFactory::default());
    let clock = ManualClock::new(0);
    let adapter = adapter(100_000, factory.clone(), &clock);
    assert_eq!(adapter.ready(), None);

    let set_a = adapter.set_item("a", StorageItem::new(json!(1), 0, FAR_FUTURE));
    let set_b = adapter.set_item("b", StorageItem::new(json!(2), 0, FAR_FUTURE));
    let get_a = adapter.get_item("a");
    let remove_b = adapter.remove_item("b");
    let all = adapter.get_all();

    factory.finish();
    assert_eq!(adapter.ready(), Some(true));

    smol::block_on(set_a).unwrap();
    smol::block_on(set_b).unwrap();
    assert_eq!(smol::block_on(get_a).unwrap().map(|i| i.value), Some(json!(1)));
    smol::block_on(remove_b).unwrap();
    let keys: Vec<_> = smol::block_on(all).unwrap().into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec!["a"]);
}

#[test]
fn test_open_failure_rejects_queued_and_later_operations() {
    let factory = Arc::new(DeferredFactory::default());
    let clock = ManualClock::new(0);
    let adapter = adapter(100_000, factory.clone(), &clock);

    let queued = adapter.set_item("a", StorageItem::new(json!(1), 0, FAR_FUTURE));
    factory.fail();
    assert_eq!(adapter.ready(), Some(false));

    assert!(matches!(smol::block_on(queued), Err(StorageError::OpenFailed(_))));
    assert!(matches!(smol::block_on(adapter.get_item("a")), Err(StorageError::OpenFailed(_))));
    assert!(matches!(smol::block_on(adapter.get_size()), Err(StorageError::OpenFailed(_))));
}

#[test]
fn test_failed_queued_operation_leaves_others_alone() {
    let factory = Arc::new(DeferredFactory::default());
    let clock = ManualClock::new(0);
    let adapter = adapter(4000, factory.clone(), &clock);

    let first = adapter.set_item("a", StorageItem::new(json!(1), 0, FAR_FUTURE));
    let too_big = adapter.set_item("big", item_of_size("big", 1200, FAR_FUTURE));
    let last = adapter.set_item("c", StorageItem::new(json!(3), 0, FAR_FUTURE));
    factory.finish();

    smol::block_on(first).unwrap();
    assert!(matches!(smol::block_on(too_big), Err(StorageError::ItemTooLarge { .. })));
    smol::block_on(last).unwrap();
    assert!(smol::block_on(adapter.get_item("c")).unwrap().is_some());
}

// ============================================================================
// Size estimation
// ============================================================================

#[test]
fn test_item_limit_and_half_credit() {
    let clock = ManualClock::new(0);
    let adapter = adapter(4000, Arc::new(IdbFactory::new()), &clock);

    smol::block_on(adapter.set_item("k", item_of_size("k", 600, FAR_FUTURE))).unwrap();
    let stats = adapter.size_stats();
    assert_eq!(stats.size_guess, 300.0);
    assert_eq!(stats.error_bar, 300.0);

    let huge = item_of_size("huge", 1100, FAR_FUTURE);
    let err = smol::block_on(adapter.set_item("huge", huge)).unwrap_err();
    assert_eq!(
        err,
        StorageError::ItemTooLarge {
            key: "huge".into(),
            size: 1100,
            limit: 1000
        }
    );
    assert_eq!(adapter.size_stats().size_guess, 300.0);
    assert_eq!(smol::block_on(adapter.get_size()).unwrap(), 300.0);
}

#[test]
fn test_get_all_reconciles_estimate() {
    let clock = ManualClock::new(0);
    let adapter = adapter(100_000, Arc::new(IdbFactory::new()), &clock);

    smol::block_on(adapter.set_item("a", item_of_size("a", 200, FAR_FUTURE))).unwrap();
    smol::block_on(adapter.set_item("b", item_of_size("b", 300, FAR_FUTURE))).unwrap();
    assert_eq!(adapter.size_stats().size_guess, 250.0);

    let entries = smol::block_on(adapter.get_all()).unwrap();
    assert_eq!(entries.len(), 2);

    let stats = adapter.size_stats();
    assert_eq!(stats.size_guess, 500.0);
    assert_eq!(stats.error_bar, 0.0);
    assert_eq!(stats.real_size, 500);
    assert_eq!(stats.real_count, 2);
    assert_eq!(stats.average_item_size, 250.0);
    assert_eq!(stats.max_misestimate, 250.0);
}

#[test]
fn test_remove_charges_average_size() {
    let clock = ManualClock::new(0);
    let adapter = adapter(100_000, Arc::new(IdbFactory::new()), &clock);

    smol::block_on(adapter.set_item("a", item_of_size("a", 400, FAR_FUTURE))).unwrap();
    smol::block_on(adapter.get_all()).unwrap();
    smol::block_on(adapter.remove_item("a")).unwrap();

    let stats = adapter.size_stats();
    assert_eq!(stats.size_guess, 0.0);
    assert_eq!(stats.error_bar, 400.0);
}

// ============================================================================
// Sweeps
// ============================================================================

fn seed(factory: &IdbFactory, name: &str, records: Vec<(String, usize, i64)>) {
    factory.open(name, "store", Box::new(move |db| {
        let db = db.unwrap();
        let mut db = lock_database(&db);
        let store = db.store_mut("store").unwrap();
        for (key, size, expires) in records {
            store.put(Record {
                item: StorageItem::new(json!(key), 0, expires),
                key,
                size,
                expires,
            });
        }
    }));
}

fn records(specs: &[(&str, usize, i64)]) -> Vec<(String, usize, i64)> {
    specs.iter().map(|&(key, size, expires)| (key.to_string(), size, expires)).collect()
}

#[test]
fn test_sweep_gets_back_under_high_watermark() {
    let factory = IdbFactory::new();
    let seeded = (0..8).map(|i| (format!("e{i}"), 500, 100_000 + i * 1000)).collect();
    seed(&factory, "actions", seeded);

    let clock = ManualClock::new(0);
    let adapter = adapter(4000, Arc::new(factory.clone()), &clock);
    assert_eq!(adapter.size_stats().real_size, 4000);

    smol::block_on(adapter.sweep()).unwrap();

    let stats = adapter.size_stats();
    assert!(stats.real_size as f64 <= 4000.0 * 0.9);
    assert_eq!(stats.real_size, 2500);
    assert_eq!(stats.real_count, 5);

    let keys: Vec<_> = smol::block_on(adapter.get_all())
        .unwrap()
        .into_iter()
        .map(|e| e.key)
        .collect();
    assert_eq!(keys, vec!["e3", "e4", "e5", "e6", "e7"]);
}

#[test]
fn test_get_all_over_high_watermark_sweeps() {
    let factory = IdbFactory::new();
    seed(
        &factory,
        "actions",
        records(&[
            ("a", 1000, 50_000),
            ("b", 1000, 60_000),
            ("c", 1000, 70_000),
            ("d", 800, 80_000),
        ]),
    );

    let clock = ManualClock::new(0);
    let adapter = adapter(4000, Arc::new(factory.clone()), &clock);

    // The walk sees 3800 and sweeps down to the low watermark
    let entries = smol::block_on(adapter.get_all()).unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(adapter.size_stats().real_size, 2800);
    assert!(smol::block_on(adapter.get_item("a")).unwrap().is_none());
    assert!(smol::block_on(adapter.get_item("b")).unwrap().is_some());
}

#[test]
fn test_sweep_evicts_expired() {
    let clock = ManualClock::new(0);
    let adapter = adapter(100_000, Arc::new(IdbFactory::new()), &clock);

    smol::block_on(adapter.set_item("old", StorageItem::new(json!("old"), 0, 1_000))).unwrap();
    smol::block_on(adapter.set_item("new", StorageItem::new(json!("new"), 0, FAR_FUTURE))).unwrap();

    clock.advance(Duration::from_secs(500));
    assert!(clock.now_ms() > 1_000);
    smol::block_on(adapter.sweep()).unwrap();

    let keys: Vec<_> = smol::block_on(adapter.get_all())
        .unwrap()
        .into_iter()
        .map(|e| e.key)
        .collect();
    assert_eq!(keys, vec!["new"]);
}

#[test]
fn test_records_inside_expire_fudge_count_as_expired() {
    let clock = ManualClock::new(0);
    let adapter = adapter(100_000, Arc::new(IdbFactory::new()), &clock);

    smol::block_on(adapter.set_item("soon", StorageItem::new(json!(1), 0, 5_000))).unwrap();
    smol::block_on(adapter.sweep()).unwrap();
    assert!(smol::block_on(adapter.get_item("soon")).unwrap().is_none());
}

#[test]
fn test_error_bar_sweep_then_rest_interval() {
    let clock = ManualClock::new(0);
    let adapter = adapter(4000, Arc::new(IdbFactory::new()), &clock);

    smol::block_on(adapter.set_item("k0", item_of_size("k0", 600, FAR_FUTURE))).unwrap();
    // Error bar is over 5% of the budget: this write sweeps first and frees room for itself
    smol::block_on(adapter.set_item("k1", item_of_size("k1", 600, FAR_FUTURE))).unwrap();
    assert!(smol::block_on(adapter.get_item("k0")).unwrap().is_none());

    // Swept moments ago and below the high watermark: no sweep this time
    smol::block_on(adapter.set_item("k2", item_of_size("k2", 600, FAR_FUTURE))).unwrap();
    assert!(smol::block_on(adapter.get_item("k1")).unwrap().is_some());
    assert!(smol::block_on(adapter.get_item("k2")).unwrap().is_some());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_clear_resets_estimate() {
    let clock = ManualClock::new(0);
    let adapter = adapter(100_000, Arc::new(IdbFactory::new()), &clock);
    smol::block_on(adapter.set_item("a", StorageItem::new(json!(1), 0, FAR_FUTURE))).unwrap();

    smol::block_on(adapter.clear()).unwrap();
    assert_eq!(adapter.size_stats().size_guess, 0.0);
    assert!(smol::block_on(adapter.get_all()).unwrap().is_empty());
}

#[test]
fn test_delete_storage_drops_database() {
    let factory = IdbFactory::new();
    let clock = ManualClock::new(0);
    let adapter = adapter(100_000, Arc::new(factory.clone()), &clock);
    smol::block_on(adapter.set_item("a", StorageItem::new(json!(1), 0, FAR_FUTURE))).unwrap();
    assert!(factory.has_database("actions"));

    smol::block_on(adapter.delete_storage()).unwrap();
    assert!(!factory.has_database("actions"));
    assert!(matches!(smol::block_on(adapter.get_item("a")), Err(StorageError::NotReady(_))));
}

#[test]
fn test_data_survives_new_adapter_instance() {
    let factory = IdbFactory::new();
    let clock = ManualClock::new(0);
    {
        let first = adapter(100_000, Arc::new(factory.clone()), &clock);
        let kept = StorageItem::new(json!("v"), 0, FAR_FUTURE);
        smol::block_on(first.set_item("kept", kept)).unwrap();
    }

    let second = adapter(100_000, Arc::new(factory), &clock);
    assert!(second.is_persistent());
    assert_eq!(second.size_stats().real_count, 1);
    let item = smol::block_on(second.get_item("kept")).unwrap().unwrap();
    assert_eq!(item.value, json!("v"));
}
