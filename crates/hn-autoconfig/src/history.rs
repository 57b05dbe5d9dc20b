use std::sync::Arc;

use parking_lot::RwLock;

use hn_types::RuntimeConfiguration;

/// Append-only record of every accepted callback, in arrival order.
#[derive(Debug, Default)]
pub struct HistoricLog {
    entries: RwLock<Vec<Arc<RuntimeConfiguration>>>,
}

impl HistoricLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, config: RuntimeConfiguration) -> Arc<RuntimeConfiguration> {
        let entry = Arc::new(config);
        self.entries.write().push(Arc::clone(&entry));
        entry
    }

    /// Consistent copy of the log; later appends are not visible in it.
    pub fn snapshot(&self) -> Vec<Arc<RuntimeConfiguration>> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
