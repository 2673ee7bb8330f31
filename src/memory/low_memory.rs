use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use parking_lot::RwLock;

/// A component holding memory it can drop on demand
pub trait LowMemoryHandler: Send + Sync {
    fn handle_low_memory(&self);
}

struct NotifierInner {
    handlers: RwLock<HashMap<u64, Weak<dyn LowMemoryHandler>>>,
    next_id: AtomicU64,
}

/// Explicit subscribe/broadcast channel for memory pressure.
///
/// Handlers are held weakly: a handler that is dropped without deregistering
/// is skipped and pruned on the next broadcast.
#[derive(Clone)]
pub struct LowMemoryNotifier {
    inner: Arc<NotifierInner>,
}

/// Keeps a handler subscribed; dropping it deregisters the handler
pub struct LowMemoryRegistration {
    id: u64,
    notifier: Weak<NotifierInner>,
}

impl LowMemoryNotifier {
    pub fn new() -> Self {
        LowMemoryNotifier {
            inner: Arc::new(NotifierInner {
                handlers: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn register(&self, handler: Weak<dyn LowMemoryHandler>) -> LowMemoryRegistration {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers.write().insert(id, handler);
        LowMemoryRegistration {
            id,
            notifier: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every live handler. Returns how many ran.
    pub fn broadcast(&self) -> usize {
        // Collect first so handlers may (de)register without deadlocking
        let live: Vec<Arc<dyn LowMemoryHandler>> = {
            let handlers = self.inner.handlers.read();
            handlers.values().filter_map(Weak::upgrade).collect()
        };

        tracing::info!(
            target: "gendex::memory",
            handlers = live.len(),
            "Broadcasting low memory notification"
        );

        for handler in &live {
            handler.handle_low_memory();
        }

        self.inner.handlers.write().retain(|_, h| h.strong_count() > 0);
        live.len()
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.read().len()
    }
}

impl Default for LowMemoryNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LowMemoryRegistration {
    fn drop(&mut self) {
        if let Some(inner) = self.notifier.upgrade() {
            inner.handlers.write().remove(&self.id);
        }
    }
}
