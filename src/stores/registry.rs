use crate::core::config::StoreConfig;
use crate::core::error::StoreError;
use crate::stores::memory;
use crate::stores::store::Store;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Constructor for one storage backend
pub type DriverFactory = fn(&StoreConfig) -> Result<Arc<dyn Store>, StoreError>;

/// Explicit mapping from driver name to constructor, built at startup
pub struct StoreRegistry {
    drivers: HashMap<&'static str, DriverFactory>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Registry with every driver compiled into this binary
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(memory::DRIVER_NAME, memory::build);
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        self.drivers.insert(name, factory);
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.drivers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Construct the driver named in `config.driver`
    pub fn build(&self, config: &StoreConfig) -> Result<Arc<dyn Store>, StoreError> {
        let factory = self
            .drivers
            .get(config.driver.as_str())
            .ok_or_else(|| StoreError::UnknownDriver(config.driver.clone()))?;

        let store = factory(config)?;
        info!(driver = store.name(), "Store driver initialized");
        Ok(store)
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
