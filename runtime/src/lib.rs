//! # Fragment Sync Runtime
//!
//! Runtime for state shared between independently deployed UI fragments.
//!
//! ## Core Components
//!
//! - **`ReactiveStore`**: owns a state, applies actions through a reducer and
//!   notifies subscribers synchronously
//! - **`FederationRegistry`**: names stores that remote modules expose
//! - **`StoreResolver`**: finds the shared store or falls back to a local one
//! - **`BroadcastChannel`**: fire-and-forget events between fragments that
//!   share no store
//!
//! ## Example
//!
//! ```
//! use fragment_sync_core::contract::SharedStore;
//! use fragment_sync_core::environment::SystemClock;
//! use fragment_sync_runtime::store::CommerceStore;
//!
//! let store = CommerceStore::authoritative(SystemClock);
//! let subscription = store.subscribe(|| println!("changed"));
//!
//! store.add_to_cart("1", 2);
//! assert_eq!(store.get_snapshot().cart.item_count(), 2);
//!
//! subscription.unsubscribe();
//! ```

use fragment_sync_core::{effect::Effect, reducer::Reducer};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::{self, ThreadId};

/// Broadcast channel between fragments
pub mod channel;

/// Runtime configuration and environment loading
pub mod config;

/// Named registry of remotely exposed stores
pub mod registry;

/// Shared-or-fallback store resolution
pub mod resolver;

/// Debounced search publishing
pub mod search;

/// Error types for the runtime
pub mod error {
    use thiserror::Error;

    /// Errors raised while loading configuration
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum ConfigError {
        /// An environment variable is set but cannot be parsed
        #[error("Invalid environment variable {0}: {1}")]
        InvalidEnvVar(String, String),
    }
}

pub use channel::{BroadcastChannel, EventHandler};
pub use config::{ResolverConfig, SearchConfig};
pub use error::ConfigError;
pub use registry::{FederationRegistry, HOST_STORE_MODULE, RemoteStore};
pub use resolver::{Resolution, StoreOrigin, StoreResolver};
pub use search::DebouncedSearch;
pub use store::{CommerceStore, ReactiveStore};

/// Lock a mutex, recovering the data if a listener panicked while it was held
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Guard that releases dispatch ownership on drop, even when a listener unwinds.
///
/// Actions a listener queued during a pass that unwinds are discarded: the
/// pass that requested them never completed.
struct DispatchGuard<'a, A> {
    owner: &'a Mutex<Option<ThreadId>>,
    pending: &'a Mutex<VecDeque<A>>,
}

impl<'a, A> DispatchGuard<'a, A> {
    fn enter(owner: &'a Mutex<Option<ThreadId>>, pending: &'a Mutex<VecDeque<A>>) -> Self {
        *lock(owner) = Some(thread::current().id());
        Self { owner, pending }
    }
}

impl<A> Drop for DispatchGuard<'_, A> {
    fn drop(&mut self) {
        if thread::panicking() {
            let mut pending = lock(self.pending);
            if !pending.is_empty() {
                tracing::warn!(
                    discarded = pending.len(),
                    "Listener panicked, discarding queued actions"
                );
                pending.clear();
            }
        }
        *lock(self.owner) = None;
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicU64, DispatchGuard, Effect, Mutex, Ordering, PoisonError, Reducer,
        RwLock, ThreadId, VecDeque, Weak, lock, thread,
    };
    use fragment_sync_core::commerce::{CommerceEnvironment, CommerceReducer, StoreAction};
    use fragment_sync_core::contract::{Listener, SharedStore, Subscription};
    use fragment_sync_core::environment::Clock;
    use fragment_sync_core::model::{Product, StoreState};
    use fragment_sync_core::seed::{self, FragmentSeed};
    use smallvec::SmallVec;
    use std::fmt;

    struct ListenerEntry {
        id: u64,
        active: AtomicBool,
        callback: Listener,
    }

    #[derive(Default)]
    struct ListenerRegistry {
        entries: Vec<Arc<ListenerEntry>>,
    }

    /// A store that applies actions synchronously and notifies subscribers.
    ///
    /// # Semantics
    ///
    /// - `send` returns after the action is applied and every listener that
    ///   was subscribed when notification began has been called once, in
    ///   registration order.
    /// - Listeners may read the snapshot, subscribe, unsubscribe and send more
    ///   actions. A nested `send` is queued and applied after the current
    ///   notification pass completes, so listeners never observe a state
    ///   change mid-pass.
    /// - A `send` from any other thread blocks until the running dispatch is
    ///   over, then applies its own action and notifies before returning.
    ///   A listener must not wait on another thread that sends to the same
    ///   store.
    /// - If a listener panics, the panic reaches the caller of `send` and
    ///   actions queued during that pass are dropped.
    /// - Snapshots are immutable `Arc`s: state is copied on write only while
    ///   a snapshot is still held elsewhere.
    /// - No lock is held while listeners run.
    pub struct ReactiveStore<R: Reducer> {
        state: RwLock<Arc<R::State>>,
        reducer: R,
        environment: R::Environment,
        listeners: Arc<Mutex<ListenerRegistry>>,
        next_listener_id: AtomicU64,
        pending: Mutex<VecDeque<R::Action>>,
        dispatch: Mutex<()>,
        dispatcher: Mutex<Option<ThreadId>>,
    }

    impl<R> ReactiveStore<R>
    where
        R: Reducer,
        R::State: Clone,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: R::State, reducer: R, environment: R::Environment) -> Self {
            Self {
                state: RwLock::new(Arc::new(initial_state)),
                reducer,
                environment,
                listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
                next_listener_id: AtomicU64::new(0),
                pending: Mutex::new(VecDeque::new()),
                dispatch: Mutex::new(()),
                dispatcher: Mutex::new(None),
            }
        }

        /// Current state.
        ///
        /// Two calls with no action in between return the same `Arc`.
        #[must_use]
        pub fn snapshot(&self) -> Arc<R::State> {
            Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let lines = store.state(|s| s.cart.len());
        /// ```
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&R::State) -> T,
        {
            f(&self.snapshot())
        }

        /// Register a listener called after every state transition
        pub fn subscribe<F>(&self, listener: F) -> Subscription
        where
            F: Fn() + Send + Sync + 'static,
        {
            self.subscribe_listener(Box::new(listener))
        }

        fn subscribe_listener(&self, callback: Listener) -> Subscription {
            let entry = Arc::new(ListenerEntry {
                id: self.next_listener_id.fetch_add(1, Ordering::Relaxed),
                active: AtomicBool::new(true),
                callback,
            });
            lock(&self.listeners).entries.push(Arc::clone(&entry));
            tracing::trace!(listener = entry.id, "Listener subscribed");

            let registry: Weak<Mutex<ListenerRegistry>> = Arc::downgrade(&self.listeners);
            Subscription::new(move || {
                entry.active.store(false, Ordering::SeqCst);
                if let Some(registry) = registry.upgrade() {
                    lock(&registry).entries.retain(|e| e.id != entry.id);
                }
                tracing::trace!(listener = entry.id, "Listener unsubscribed");
            })
        }

        /// Number of currently registered listeners
        #[must_use]
        pub fn listener_count(&self) -> usize {
            lock(&self.listeners).entries.len()
        }

        /// Apply an action and notify listeners.
        ///
        /// Called from inside a listener, the action is queued and applied by
        /// the outer `send` once the current notification pass is over. From
        /// any other thread it waits for the running dispatch and returns
        /// only after its own action has been applied and notified.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub fn send(&self, action: R::Action) {
            metrics::counter!("store.actions.total").increment(1);

            if self.is_dispatching_thread() {
                tracing::trace!("Dispatch in progress, action deferred");
                metrics::counter!("store.actions.deferred").increment(1);
                lock(&self.pending).push_back(action);
                return;
            }

            let _dispatch = lock(&self.dispatch);
            let _guard = DispatchGuard::enter(&self.dispatcher, &self.pending);

            let mut next = Some(action);
            while let Some(action) = next {
                if self.apply(action).notifies() {
                    self.notify();
                }
                next = self.next_pending();
            }
        }

        fn is_dispatching_thread(&self) -> bool {
            *lock(&self.dispatcher) == Some(thread::current().id())
        }

        fn next_pending(&self) -> Option<R::Action> {
            lock(&self.pending).pop_front()
        }

        fn apply(&self, action: R::Action) -> Effect {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            tracing::trace!("Acquired write lock on state");

            let span = tracing::debug_span!("reducer_execution");
            let _enter = span.enter();
            self.reducer
                .reduce(Arc::make_mut(&mut *state), action, &self.environment)
        }

        fn notify(&self) {
            let listeners: SmallVec<[Arc<ListenerEntry>; 8]> =
                lock(&self.listeners).entries.iter().cloned().collect();
            metrics::counter!("store.notifications.total").increment(1);
            tracing::trace!(listeners = listeners.len(), "Notifying listeners");

            for entry in listeners {
                // Unsubscribed earlier in this pass.
                if entry.active.load(Ordering::SeqCst) {
                    (entry.callback)();
                }
            }
        }
    }

    impl<R: Reducer> fmt::Debug for ReactiveStore<R> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("ReactiveStore")
                .field("listeners", &lock(&self.listeners).entries.len())
                .field("dispatching", &lock(&self.dispatcher).is_some())
                .finish_non_exhaustive()
        }
    }

    /// The commerce store every fragment shares
    pub type CommerceStore<C> = ReactiveStore<CommerceReducer<C>>;

    impl<C: Clock> ReactiveStore<CommerceReducer<C>> {
        /// The host's authoritative store: full catalog, order ids from 1001
        #[must_use]
        pub fn authoritative(clock: C) -> Self {
            Self::new(
                seed::authoritative_state(),
                CommerceReducer::new(),
                CommerceEnvironment::authoritative(clock),
            )
        }

        /// A fragment's standalone store, seeded with its placeholder data
        #[must_use]
        pub fn fallback(seed: FragmentSeed, clock: C) -> Self {
            tracing::debug!(fragment = seed.name(), "Creating fallback store");
            Self::new(
                seed.state(),
                CommerceReducer::new(),
                CommerceEnvironment::fallback(clock),
            )
        }
    }

    impl<C: Clock + 'static> SharedStore for ReactiveStore<CommerceReducer<C>> {
        fn get_snapshot(&self) -> Arc<StoreState> {
            self.snapshot()
        }

        fn subscribe(&self, listener: Listener) -> Subscription {
            self.subscribe_listener(listener)
        }

        fn add_to_cart(&self, product_id: &str, qty: u32) {
            self.send(StoreAction::add_to_cart(product_id, qty));
        }

        fn remove_from_cart(&self, product_id: &str, qty: u32) {
            self.send(StoreAction::remove_from_cart(product_id, qty));
        }

        fn clear_cart(&self) {
            self.send(StoreAction::ClearCart);
        }

        fn complete_order(&self) {
            self.send(StoreAction::CompleteOrder);
        }

        fn get_product_by_id(&self, id: &str) -> Option<Product> {
            self.snapshot().product(id).cloned()
        }

        fn logout(&self) {
            self.send(StoreAction::Logout);
        }

        fn login_mock(&self) {
            self.send(StoreAction::LoginMock);
        }

        fn mark_notification_read(&self, id: &str) {
            self.send(StoreAction::MarkNotificationRead { id: id.to_string() });
        }

        fn mark_all_notifications_read(&self) {
            self.send(StoreAction::MarkAllNotificationsRead);
        }
    }
}
