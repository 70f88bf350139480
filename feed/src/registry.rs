//! Action-keyed listener registry

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

/// Callback invoked for every inbound frame matching a subscribed action
pub trait FeedListener: Send + Sync {
    fn on_message(&self, action: &str, data: &Value);
}

/// Topic pub/sub over inbound actions
///
/// Multiple listeners may register for the same action; removal drops
/// exactly one registration, matched by `Arc` identity.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<FxHashMap<String, Vec<Arc<dyn FeedListener>>>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, action: &str, listener: Arc<dyn FeedListener>) {
        self.listeners
            .write()
            .entry(action.to_string())
            .or_default()
            .push(listener);
    }

    /// Remove one registration of `listener` under `action`
    pub fn remove(&self, action: &str, listener: &Arc<dyn FeedListener>) -> bool {
        let mut listeners = self.listeners.write();
        let Some(entries) = listeners.get_mut(action) else {
            return false;
        };
        let Some(pos) = entries.iter().position(|l| Arc::ptr_eq(l, listener)) else {
            return false;
        };
        entries.remove(pos);
        if entries.is_empty() {
            listeners.remove(action);
        }
        true
    }

    pub fn dispatch(&self, action: &str, data: &Value) {
        let targets: Vec<Arc<dyn FeedListener>> = {
            let listeners = self.listeners.read();
            match listeners.get(action) {
                Some(entries) => entries.clone(),
                None => return,
            }
        };
        for listener in targets {
            listener.on_message(action, data);
        }
    }

    #[must_use]
    pub fn count(&self, action: &str) -> usize {
        self.listeners.read().get(action).map_or(0, Vec::len)
    }
}
