//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::keys::KeyDeriver;
use crate::store::EntryStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: EntryStore,
    deriver: KeyDeriver,
}

impl AppState {
    pub fn new(config: Config, store: EntryStore) -> Self {
        let deriver = KeyDeriver::new(config.store.key_width);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                deriver,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the entry store
    pub fn store(&self) -> &EntryStore {
        &self.inner.store
    }

    /// Get the key deriver
    pub fn deriver(&self) -> &KeyDeriver {
        &self.inner.deriver
    }
}
