//! Broadcast Event Channel.
//!
//! Fire-and-forget, in-process publish/subscribe between fragments that share
//! no store. Delivery is synchronous, in registration order, to the handlers
//! registered at emit time. Nothing is buffered or replayed: a handler
//! registered after an emit never sees it.
//!
//! A panicking handler unwinds out of [`BroadcastChannel::emit`] and the
//! remaining handlers for that event are skipped. Handlers should not panic.

use fragment_sync_core::broadcast::{BroadcastEvent, BroadcastMessage, EventName};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A registered event handler; identity is the `Arc` allocation
pub type EventHandler = Arc<dyn Fn(&BroadcastEvent) + Send + Sync>;

static GLOBAL: OnceLock<Arc<BroadcastChannel>> = OnceLock::new();

/// In-process event channel
#[derive(Default)]
pub struct BroadcastChannel {
    handlers: RwLock<HashMap<EventName, Vec<EventHandler>>>,
}

impl BroadcastChannel {
    /// Create an isolated channel
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide channel every fragment on the page shares
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Register `handler` for `name`.
    ///
    /// Registering the same handler twice under one name has no effect.
    pub fn on(&self, name: EventName, handler: EventHandler) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let registered = handlers.entry(name).or_default();
        if registered.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            tracing::trace!(event = %name, "Handler already registered");
            return;
        }
        registered.push(handler);
    }

    /// Remove `handler` from `name`; returns whether it was registered
    pub fn off(&self, name: EventName, handler: &EventHandler) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let Some(registered) = handlers.get_mut(&name) else {
            return false;
        };
        let before = registered.len();
        registered.retain(|h| !Arc::ptr_eq(h, handler));
        let removed = registered.len() != before;
        if registered.is_empty() {
            handlers.remove(&name);
        }
        removed
    }

    /// Register a handler for one payload type.
    ///
    /// Returns the handler so it can later be passed to [`off`](Self::off).
    pub fn on_message<M, F>(&self, f: F) -> EventHandler
    where
        M: BroadcastMessage,
        F: Fn(&M) + Send + Sync + 'static,
    {
        let handler: EventHandler = Arc::new(move |event: &BroadcastEvent| {
            if let Some(payload) = M::from_event(event) {
                f(payload);
            }
        });
        self.on(M::NAME, Arc::clone(&handler));
        handler
    }

    /// Deliver `event` to every handler registered for its name.
    ///
    /// Returns the number of handlers called. Emitting with no handlers is a
    /// no-op.
    pub fn emit(&self, event: impl Into<BroadcastEvent>) -> usize {
        let event = event.into();
        let name = event.name();

        // Snapshot so handlers may register, remove or emit while running.
        let handlers: SmallVec<[EventHandler; 4]> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name)
            .map(|registered| registered.iter().cloned().collect())
            .unwrap_or_default();

        metrics::counter!("broadcast.emits.total", "event" => name.as_str()).increment(1);
        tracing::debug!(event = %name, handlers = handlers.len(), "Emitting broadcast event");

        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    /// Number of handlers registered for `name`
    #[must_use]
    pub fn handler_count(&self, name: EventName) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for BroadcastChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut counts: Vec<(EventName, usize)> =
            handlers.iter().map(|(name, h)| (*name, h.len())).collect();
        counts.sort();
        f.debug_struct("BroadcastChannel")
            .field("handlers", &counts)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fragment_sync_core::broadcast::ProductSearch;
    use std::sync::Mutex;

    fn search(query: &str) -> ProductSearch {
        ProductSearch {
            query: query.to_string(),
        }
    }

    #[test]
    fn test_emit_without_handlers_is_noop() {
        let channel = BroadcastChannel::new();
        assert_eq!(channel.emit(search("mug")), 0);
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let channel = BroadcastChannel::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["a", "b"] {
            let order = Arc::clone(&order);
            channel.on_message(move |payload: &ProductSearch| {
                order.lock().unwrap().push(format!("{label}:{}", payload.query));
            });
        }

        assert_eq!(channel.emit(search("lamp")), 2);
        assert_eq!(*order.lock().unwrap(), vec!["a:lamp", "b:lamp"]);
    }

    #[test]
    fn test_duplicate_registration_ignored_and_off() {
        let channel = BroadcastChannel::new();
        let handler: EventHandler = Arc::new(|_event: &BroadcastEvent| {});
        channel.on(EventName::ProductSearch, Arc::clone(&handler));
        channel.on(EventName::ProductSearch, Arc::clone(&handler));
        assert_eq!(channel.handler_count(EventName::ProductSearch), 1);

        assert!(channel.off(EventName::ProductSearch, &handler));
        assert!(!channel.off(EventName::ProductSearch, &handler));
        assert_eq!(channel.emit(search("x")), 0);
    }

    #[test]
    fn test_no_replay_for_late_handlers() {
        let channel = BroadcastChannel::new();
        channel.emit(search("early"));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        channel.on_message(move |payload: &ProductSearch| {
            sink.lock().unwrap().push(payload.query.clone());
        });
        assert!(seen.lock().unwrap().is_empty());

        channel.emit(search("late"));
        assert_eq!(*seen.lock().unwrap(), vec!["late".to_string()]);
    }

    #[test]
    fn test_global_channel_is_shared() {
        assert!(Arc::ptr_eq(
            &BroadcastChannel::global(),
            &BroadcastChannel::global()
        ));
    }
}
