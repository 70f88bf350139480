//! Shared latest-tick table

use common::PriceTick;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Latest tick per pair, shared between the feed client and consumers
#[derive(Clone, Default)]
pub struct TickStore {
    inner: Arc<RwLock<FxHashMap<String, PriceTick>>>,
}

impl TickStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, tick: PriceTick) {
        self.inner.write().insert(tick.pair.clone(), tick);
    }

    #[must_use]
    pub fn latest(&self, pair: &str) -> Option<PriceTick> {
        self.inner.read().get(pair).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
