//! Holder of the last published configuration.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::dynamic::Configuration;

/// Atomically swappable configuration, shared between the builder loop and readers.
#[derive(Debug, Clone)]
pub struct ConfigurationStore {
    // ArcSwap is not Clone; the outer Arc lets tasks share one store.
    inner: Arc<ArcSwap<Configuration>>,
}

impl Default for ConfigurationStore {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl ConfigurationStore {
    pub fn new(initial: Configuration) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    /// Snapshot of the current generation. Stays valid after later swaps.
    pub fn get(&self) -> Arc<Configuration> {
        self.inner.load_full()
    }

    /// Replace the current generation.
    pub fn set(&self, config: Configuration) {
        self.inner.store(Arc::new(config));
    }

    /// Replace the current generation unless it is equal to `config`.
    /// Returns whether a new generation was published.
    pub fn publish(&self, config: Configuration) -> bool {
        if *self.inner.load_full() == config {
            return false;
        }
        self.set(config);
        true
    }
}
