//! Storage configuration

use std::time::Duration;

/// What every adapter is constructed with
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Instance name; one physical database per name
    pub name: String,
    /// Size budget in bytes
    pub max_size: usize,
    pub debug_logging_enabled: bool,
}

impl AdapterConfig {
    pub fn new(name: impl Into<String>, max_size: usize) -> Self {
        Self {
            name: name.into(),
            max_size,
            debug_logging_enabled: false,
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new("actions", 4 * 1024 * 1024)
    }
}

/// IndexedDB adapter tuning
#[derive(Debug, Clone)]
pub struct IndexedDbConfig {
    /// Object store holding the records
    pub table_name: String,
    /// Minimum time between two sweeps while below the high watermark
    pub sweep_interval: Duration,
    /// Records expiring within this window count as expired
    pub expire_fudge: Duration,
    /// Load ratio that triggers eviction
    pub high_watermark_ratio: f64,
    /// Load ratio eviction sweeps down to
    pub low_watermark_ratio: f64,
    /// Largest single item, as a share of the budget
    pub item_limit_ratio: f64,
    /// Error bar that forces a sweep, as a share of the budget
    pub error_bar_ratio: f64,
    /// Average item size assumed before the first full walk
    pub initial_average_item_size: f64,
}

impl Default for IndexedDbConfig {
    fn default() -> Self {
        Self {
            table_name: "store".to_string(),
            sweep_interval: Duration::from_secs(15 * 60),
            expire_fudge: Duration::from_secs(10),
            high_watermark_ratio: 0.9,
            low_watermark_ratio: 0.7,
            item_limit_ratio: 0.25,
            error_bar_ratio: 0.05,
            initial_average_item_size: 100.0,
        }
    }
}

/// Configuration of a storage created through the service
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub name: String,
    /// Adapter to use; picked from `persistent` when unset
    pub adapter: Option<String>,
    pub max_size: usize,
    /// Lifetime of stored items
    pub default_expiration: Duration,
    /// How often callers should refresh stored items
    pub default_auto_refresh_interval: Duration,
    pub persistent: bool,
    pub secure: bool,
    pub debug_logging_enabled: bool,
    /// Empty the storage right after creating it
    pub clear_on_init: bool,
}

impl StorageConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            name: self.name.clone(),
            max_size: self.max_size,
            debug_logging_enabled: self.debug_logging_enabled,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            adapter: None,
            max_size: 4 * 1024 * 1024,
            default_expiration: Duration::from_secs(10),
            default_auto_refresh_interval: Duration::from_secs(30),
            persistent: false,
            secure: false,
            debug_logging_enabled: false,
            clear_on_init: false,
        }
    }
}
