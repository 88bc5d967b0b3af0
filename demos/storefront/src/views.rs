//! Views derived from a shared store.
//!
//! A [`DerivedView`] is what a rendering fragment holds: the last value it
//! computed from a snapshot, recomputed on every notification.

use fragment_sync_core::contract::{SharedStore, Subscription};
use fragment_sync_core::model::StoreState;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Latest value derived from a store, kept current by a subscription
pub struct DerivedView<T> {
    current: Arc<Mutex<T>>,
    renders: Arc<AtomicUsize>,
    subscription: Subscription,
}

impl<T: Clone + Send + 'static> DerivedView<T> {
    /// Derive once from the current snapshot, then again after every change
    pub fn attach<F>(store: &Arc<dyn SharedStore>, derive: F) -> Self
    where
        F: Fn(&StoreState) -> T + Send + Sync + 'static,
    {
        let current = Arc::new(Mutex::new(derive(&store.get_snapshot())));
        let renders = Arc::new(AtomicUsize::new(1));

        let weak = Arc::downgrade(store);
        let target = Arc::clone(&current);
        let counter = Arc::clone(&renders);
        let subscription = store.subscribe(Box::new(move || {
            let Some(store) = weak.upgrade() else {
                return;
            };
            let value = derive(&store.get_snapshot());
            *target.lock().unwrap_or_else(PoisonError::into_inner) = value;
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        Self {
            current,
            renders,
            subscription,
        }
    }

    /// Latest derived value
    #[must_use]
    pub fn current(&self) -> T {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times the value was derived
    #[must_use]
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Stop following the store
    pub fn detach(&self) {
        self.subscription.unsubscribe();
    }
}

impl<T> Drop for DerivedView<T> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

/// What the header shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    /// Signed-in user's name
    pub user: Option<String>,
    /// Unread notifications
    pub unread: usize,
    /// Units in the cart
    pub cart_count: u32,
}

/// Header: user, notification bell and cart badge
#[must_use]
pub fn header(state: &StoreState) -> HeaderView {
    HeaderView {
        user: state.user.as_ref().map(|user| user.name.clone()),
        unread: state.unread_notifications(),
        cart_count: state.cart.item_count(),
    }
}

/// Catalog grid: names of the products matching `query`
pub fn catalog(query: impl Into<String>) -> impl Fn(&StoreState) -> Vec<String> + Send + Sync {
    let query = query.into();
    move |state: &StoreState| {
        state
            .search(&query)
            .map(|product| product.name.clone())
            .collect()
    }
}

/// Cart widget: lines and total
#[must_use]
pub fn cart_widget(state: &StoreState) -> (usize, Decimal) {
    (state.cart.len(), state.cart_total())
}
