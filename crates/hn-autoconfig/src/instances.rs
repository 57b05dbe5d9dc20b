use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use hn_engine::{Instance, InstanceLoader};
use hn_types::HnResult;

type Slot<I> = Arc<Mutex<Option<Arc<I>>>>;

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub loads: u64,
}

/// Lazily populated instance cache keyed by instance path.
///
/// Concurrent first lookups of one path wait on the same slot, so every
/// instance is loaded at most once. Failed loads are not cached.
pub struct InstanceCache<I: Instance> {
    loader: Arc<dyn InstanceLoader<I>>,
    slots: DashMap<String, Slot<I>>,
    stats: RwLock<CacheStats>,
}

impl<I: Instance> InstanceCache<I> {
    pub fn new(loader: Arc<dyn InstanceLoader<I>>) -> Self {
        Self {
            loader,
            slots: DashMap::new(),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Blocking: may run the loader.
    pub fn get(&self, path: &str) -> HnResult<Arc<I>> {
        loop {
            // Clone the slot so the map shard is not locked while loading.
            let slot = Arc::clone(&*self.slots.entry(path.to_string()).or_default());
            let mut guard = slot.lock();

            if let Some(instance) = guard.as_ref() {
                self.stats.write().hits += 1;
                return Ok(Arc::clone(instance));
            }
            // Evicted by a failed load while we waited.
            if !self.is_current(path, &slot) {
                continue;
            }

            match self.loader.load(path) {
                Ok(instance) => {
                    let instance = Arc::new(instance);
                    debug!("Loaded instance {} from {}", instance.id(), path);
                    self.stats.write().loads += 1;
                    *guard = Some(Arc::clone(&instance));
                    return Ok(instance);
                }
                Err(e) => {
                    self.slots
                        .remove_if(path, |_, current| Arc::ptr_eq(current, &slot));
                    return Err(e);
                }
            }
        }
    }

    fn is_current(&self, path: &str, slot: &Slot<I>) -> bool {
        self.slots
            .get(path)
            .is_some_and(|current| Arc::ptr_eq(current.value(), slot))
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }

    pub fn len(&self) -> usize {
        // Slots are locked only after the map guards are released.
        let slots: Vec<Slot<I>> = self
            .slots
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
