//! # Fragment Sync Testing
//!
//! Testing utilities and helpers for fragment state synchronization.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - Recording listeners and scripted store providers
//! - Property-based testing strategies
//! - A Given-When-Then harness for reducers
//! - An in-memory paged data provider
//!
//! ## Example
//!
//! ```ignore
//! use fragment_sync_testing::{RecordingListener, test_clock};
//! use fragment_sync_runtime::store::CommerceStore;
//!
//! let store = CommerceStore::authoritative(test_clock());
//! let recorder = RecordingListener::new();
//! let _subscription = store.subscribe(recorder.listener());
//!
//! store.add_to_cart("1", 1);
//! assert_eq!(recorder.calls(), 1);
//! ```

use chrono::{DateTime, Utc};
use fragment_sync_core::environment::Clock;

/// Paged in-memory catalog and order records
pub mod data_provider;

/// Scripted [`StoreProvider`](fragment_sync_core::discovery::StoreProvider) implementations
pub mod providers;


/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use fragment_sync_testing::mocks::FixedClock;
    /// use fragment_sync_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use fragment_sync_core::contract::Listener;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how often a store notified it
    #[derive(Debug, Clone, Default)]
    pub struct RecordingListener {
        calls: Arc<AtomicUsize>,
    }

    impl RecordingListener {
        /// Create a recorder with no calls
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// A listener feeding this recorder; may be handed out many times
        #[must_use]
        pub fn listener(&self) -> Listener {
            let calls = Arc::clone(&self.calls);
            Box::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        }

        /// Notifications received so far
        #[must_use]
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Forget previous calls
        pub fn reset(&self) {
            self.calls.store(0, Ordering::SeqCst);
        }
    }

    /// Route `tracing` output through the test harness's captured writer.
    ///
    /// Safe to call from every test; only the first call installs a subscriber.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use fragment_sync_core::commerce::StoreAction;
    use proptest::prelude::*;

    /// Ids of the first `catalog_size` products, plus one id that matches nothing
    pub fn product_id(catalog_size: u32) -> impl Strategy<Value = String> {
        prop_oneof![
            9 => (1..=catalog_size.max(1)).prop_map(|id| id.to_string()),
            1 => Just("missing".to_string()),
        ]
    }

    /// Quantities a fragment might plausibly send, including zero
    pub fn quantity() -> impl Strategy<Value = u32> {
        prop_oneof![3 => 1..=3u32, 1 => Just(0u32), 1 => 4..=20u32]
    }

    /// Cart mutations against a catalog of `catalog_size` products
    pub fn cart_action(catalog_size: u32) -> impl Strategy<Value = StoreAction> {
        prop_oneof![
            6 => (product_id(catalog_size), quantity())
                .prop_map(|(id, qty)| StoreAction::add_to_cart(id, qty)),
            4 => (product_id(catalog_size), quantity())
                .prop_map(|(id, qty)| StoreAction::remove_from_cart(id, qty)),
            1 => Just(StoreAction::ClearCart),
        ]
    }

    /// Any store action, checkout and session changes included
    pub fn store_action(catalog_size: u32) -> impl Strategy<Value = StoreAction> {
        prop_oneof![
            10 => cart_action(catalog_size),
            2 => Just(StoreAction::CompleteOrder),
            1 => Just(StoreAction::Logout),
            1 => Just(StoreAction::LoginMock),
            1 => Just(StoreAction::MarkAllNotificationsRead),
        ]
    }
}

// Re-export commonly used items
pub use helpers::{RecordingListener, init_test_tracing};
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;
