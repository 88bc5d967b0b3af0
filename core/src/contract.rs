//! The Store contract: the run-time ABI between a state owner and its consumers.
//!
//! No compiler is shared across fragments, so nothing checks this contract at
//! build time. It is versioned and append-only: operations and
//! [`StoreState`] fields are added, never removed or renamed, and
//! [`CONTRACT_VERSION`] is bumped on every addition.

use crate::commerce::DEFAULT_QUANTITY;
use crate::model::{Product, StoreState};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Current version of the [`SharedStore`] contract
///
/// A consumer built against version N accepts any store reporting N or later.
pub const CONTRACT_VERSION: u32 = 1;

/// Zero-argument callback invoked after every state change
pub type Listener = Box<dyn Fn() + Send + Sync>;

/// Object-safe store interface every fragment programs against.
///
/// All operations are synchronous and never fail: invalid input degrades to a
/// no-op or a clamped value. Callers that need feedback must validate before
/// calling.
pub trait SharedStore: Send + Sync {
    /// Contract version this store implements
    fn contract_version(&self) -> u32 {
        CONTRACT_VERSION
    }

    /// Current state. Cheap; the returned value never changes underneath the caller.
    fn get_snapshot(&self) -> Arc<StoreState>;

    /// Register a listener called after every state change
    fn subscribe(&self, listener: Listener) -> Subscription;

    /// Add `qty` units of a product to the cart
    fn add_to_cart(&self, product_id: &str, qty: u32);

    /// Remove `qty` units of a product, deleting the line at zero
    fn remove_from_cart(&self, product_id: &str, qty: u32);

    /// Empty the cart
    fn clear_cart(&self);

    /// Convert the cart into an order; silent no-op on an empty cart
    fn complete_order(&self);

    /// Catalog lookup
    fn get_product_by_id(&self, id: &str) -> Option<Product>;

    /// Sign the user out
    fn logout(&self);

    /// Sign in the placeholder identity
    fn login_mock(&self);

    /// Mark one notification read
    fn mark_notification_read(&self, id: &str);

    /// Mark every notification read
    fn mark_all_notifications_read(&self);

    /// Add a single unit
    fn add_one(&self, product_id: &str) {
        self.add_to_cart(product_id, DEFAULT_QUANTITY);
    }

    /// Remove a single unit
    fn remove_one(&self, product_id: &str) {
        self.remove_from_cart(product_id, DEFAULT_QUANTITY);
    }
}

type Cancel = Box<dyn FnOnce() + Send>;

/// Handle returned by [`SharedStore::subscribe`].
///
/// Calling [`Subscription::unsubscribe`] more than once is a no-op. Dropping the
/// handle leaves the listener registered.
pub struct Subscription {
    cancel: Mutex<Option<Cancel>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` on the first unsubscribe
    #[must_use]
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// A subscription that was never attached to anything
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            cancel: Mutex::new(None),
        }
    }

    /// Remove the listener. Idempotent.
    pub fn unsubscribe(&self) {
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Whether the listener is still registered through this handle
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
