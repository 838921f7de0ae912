//! Component definition storage tests

use std::sync::{Arc, Mutex};

use aura_storage::{
    ComponentDefStorage, ComponentRegistry, IdbFactory, LoadedContext, ManualClock, StorageConfig,
    StorageError, StorageService, ACTIONS_STORAGE_NAME, DEF_STORAGE_NAME,
};
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct Registry {
    components: Mutex<Vec<Value>>,
    libraries: Mutex<Vec<Value>>,
    known: Mutex<Vec<String>>,
}

impl Registry {
    fn knowing(descriptors: &[&str]) -> Self {
        let registry = Self::default();
        registry
            .known
            .lock()
            .unwrap()
            .extend(descriptors.iter().map(|d| d.to_string()));
        registry
    }

    fn component_descriptors(&self) -> Vec<String> {
        descriptors(&self.components.lock().unwrap())
    }

    fn library_descriptors(&self) -> Vec<String> {
        descriptors(&self.libraries.lock().unwrap())
    }
}

fn descriptors(configs: &[Value]) -> Vec<String> {
    let mut out: Vec<_> = configs
        .iter()
        .filter_map(|c| c["descriptor"].as_str().map(str::to_string))
        .collect();
    out.sort();
    out
}

impl ComponentRegistry for Registry {
    fn has_component_def(&self, descriptor: &str) -> bool {
        self.known.lock().unwrap().iter().any(|d| d == descriptor)
    }

    fn save_component_config(&self, config: Value) {
        self.components.lock().unwrap().push(config);
    }

    fn has_library(&self, descriptor: &str) -> bool {
        self.known.lock().unwrap().iter().any(|d| d == descriptor)
    }

    fn save_library_config(&self, config: Value) {
        self.libraries.lock().unwrap().push(config);
    }
}

#[derive(Default)]
struct Context {
    loaded: Vec<(String, String)>,
    added: Mutex<Vec<String>>,
}

impl LoadedContext for Context {
    fn find_loaded(&self, descriptor: &str) -> Option<String> {
        self.loaded
            .iter()
            .find(|(d, _)| d == descriptor)
            .map(|(_, uuid)| uuid.clone())
    }

    fn add_loaded(&self, uuid: &str) {
        self.added.lock().unwrap().push(uuid.to_string());
    }
}

fn service(factory: IdbFactory, actions_persistent: bool) -> StorageService {
    init_tracing();
    let service = StorageService::with_defaults(Arc::new(factory), Arc::new(ManualClock::new(0)));
    service
        .init_storage(StorageConfig::new(ACTIONS_STORAGE_NAME).persistent(actions_persistent))
        .unwrap();
    service
        .init_storage(StorageConfig::new(DEF_STORAGE_NAME).persistent(true))
        .unwrap();
    service
}

fn component(descriptor: &str) -> Value {
    json!({"descriptor": descriptor, "attributes": {"label": descriptor}})
}

fn library(descriptor: &str) -> Value {
    json!({"descriptor": descriptor, "includes": {"util": "function() {}"}})
}

// ============================================================================
// Persistence gating
// ============================================================================

#[test]
fn test_enabled_when_both_storages_persistent() {
    let service = service(IdbFactory::new(), true);
    let defs = ComponentDefStorage::from_service(&service, Arc::new(Registry::default()));
    assert!(defs.use_definition_storage());
    assert!(defs.get_storage().is_some());
}

#[test]
fn test_disabled_without_persistent_actions_and_storage_deleted() {
    let factory = IdbFactory::new();
    let service = service(factory.clone(), false);
    assert!(factory.has_database(DEF_STORAGE_NAME));

    let defs = ComponentDefStorage::from_service(&service, Arc::new(Registry::default()));
    assert!(!defs.use_definition_storage());
    assert!(defs.get_storage().is_none());
    assert!(!factory.has_database(DEF_STORAGE_NAME));

    let context = Context::default();
    smol::block_on(defs.store_defs(vec![component("ui:button")], vec![], &context)).unwrap();
    assert!(smol::block_on(defs.get_all()).unwrap().is_empty());
    smol::block_on(defs.clear()).unwrap();
}

#[test]
fn test_disabled_without_actions_storage() {
    let factory = IdbFactory::new();
    let service = StorageService::with_defaults(Arc::new(factory), Arc::new(ManualClock::new(0)));
    service
        .init_storage(StorageConfig::new(DEF_STORAGE_NAME).persistent(true))
        .unwrap();
    let defs = ComponentDefStorage::from_service(&service, Arc::new(Registry::default()));
    assert!(!defs.use_definition_storage());
}

// ============================================================================
// Store and read back
// ============================================================================

#[test]
fn test_store_empty_resolves_without_storage() {
    let service = service(IdbFactory::unavailable(), true);
    let defs = ComponentDefStorage::from_service(&service, Arc::new(Registry::default()));
    smol::block_on(defs.store_defs(vec![], vec![], &Context::default())).unwrap();
}

#[test]
fn test_store_failure_propagates() {
    let service = service(IdbFactory::unavailable(), true);
    let defs = ComponentDefStorage::from_service(&service, Arc::new(Registry::default()));
    let context = Context::default();
    let result = smol::block_on(defs.store_defs(vec![component("ui:button")], vec![], &context));
    assert!(matches!(result, Err(StorageError::OpenFailed(_))));

    // Reading degrades to nothing cached
    assert!(smol::block_on(defs.get_all()).unwrap().is_empty());
}

#[test]
fn test_store_and_get_all() {
    let service = service(IdbFactory::new(), true);
    let defs = ComponentDefStorage::from_service(&service, Arc::new(Registry::default()));
    let context = Context {
        loaded: vec![("ui:button".into(), "uuid-1".into())],
        ..Default::default()
    };

    smol::block_on(defs.store_defs(
        vec![component("ui:button"), component("ui:card")],
        vec![library("ui:lib")],
        &context,
    ))
    .unwrap();

    let mut all = smol::block_on(defs.get_all()).unwrap();
    all.sort_by(|a, b| a.0.cmp(&b.0));
    let keys: Vec<_> = all.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["ui:button", "ui:card", "ui:lib"]);
    assert_eq!(all[0].1["uuid"], json!("uuid-1"));
    assert_eq!(all[0].1["attributes"]["label"], json!("ui:button"));
    assert!(all[1].1.get("uuid").is_none());
}

#[test]
fn test_store_without_descriptor_fails() {
    let service = service(IdbFactory::new(), true);
    let defs = ComponentDefStorage::from_service(&service, Arc::new(Registry::default()));
    let context = Context::default();
    let result = smol::block_on(defs.store_defs(vec![json!({"attributes": {}})], vec![], &context));
    assert!(matches!(result, Err(StorageError::Encode(_))));
}

#[test]
fn test_remove_defs() {
    let service = service(IdbFactory::new(), true);
    let defs = ComponentDefStorage::from_service(&service, Arc::new(Registry::default()));
    let context = Context::default();
    let cmps = vec![component("ui:a"), component("ui:b")];
    smol::block_on(defs.store_defs(cmps, vec![], &context)).unwrap();

    smol::block_on(defs.remove_defs(&["ui:a".to_string()])).unwrap();
    let keys: Vec<_> = smol::block_on(defs.get_all())
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec!["ui:b"]);

    smol::block_on(defs.clear()).unwrap();
    assert!(smol::block_on(defs.get_all()).unwrap().is_empty());
}

#[test]
fn test_corrupt_record_fails_get_all() {
    let service = service(IdbFactory::new(), true);
    let defs = ComponentDefStorage::from_service(&service, Arc::new(Registry::default()));
    smol::block_on(defs.store_defs(vec![component("ui:ok")], vec![], &Context::default())).unwrap();

    let storage = service.get_storage(DEF_STORAGE_NAME).unwrap();
    smol::block_on(storage.put("ui:broken", json!("{not json"))).unwrap();

    assert!(matches!(smol::block_on(defs.get_all()), Err(StorageError::Decode(_))));
}

// ============================================================================
// Restore
// ============================================================================

#[test]
fn test_restore_skips_registered() {
    let service = service(IdbFactory::new(), true);
    let registry = Arc::new(Registry::knowing(&["ui:known"]));
    let defs = ComponentDefStorage::from_service(&service, registry.clone());
    let store_context = Context {
        loaded: vec![("ui:new".into(), "uuid-new".into())],
        ..Default::default()
    };
    smol::block_on(defs.store_defs(
        vec![component("ui:new"), component("ui:known")],
        vec![library("ui:lib")],
        &store_context,
    ))
    .unwrap();

    let context = Arc::new(Context::default());
    smol::block_on(defs.restore_all(context.clone()));

    assert_eq!(registry.component_descriptors(), vec!["ui:new"]);
    assert_eq!(registry.library_descriptors(), vec!["ui:lib"]);
    assert_eq!(*context.added.lock().unwrap(), vec!["uuid-new".to_string()]);
}

#[test]
fn test_concurrent_restores_share_one_pass() {
    let service = service(IdbFactory::new(), true);
    let registry = Arc::new(Registry::default());
    let defs = ComponentDefStorage::from_service(&service, registry.clone());
    smol::block_on(defs.store_defs(vec![component("ui:a")], vec![], &Context::default())).unwrap();

    let context = Arc::new(Context::default());
    let first = defs.restore_all(context.clone());
    let second = defs.restore_all(context.clone());
    smol::block_on(futures::future::join(first, second));
    assert_eq!(registry.component_descriptors(), vec!["ui:a"]);

    // Finished restores are not reused
    smol::block_on(defs.restore_all(context));
    assert_eq!(registry.component_descriptors(), vec!["ui:a", "ui:a"]);
}

#[test]
fn test_restore_never_fails() {
    let service = service(IdbFactory::new(), true);
    let registry = Arc::new(Registry::default());
    let defs = ComponentDefStorage::from_service(&service, registry.clone());
    smol::block_on(defs.store_defs(vec![component("ui:ok")], vec![], &Context::default())).unwrap();
    let storage = service.get_storage(DEF_STORAGE_NAME).unwrap();
    smol::block_on(storage.put("ui:broken", json!("{not json"))).unwrap();

    smol::block_on(defs.restore_all(Arc::new(Context::default())));
    assert!(registry.component_descriptors().is_empty());
}
