//! Cart rules and the Order Completion Engine.
//!
//! [`CommerceReducer`] is the only code that writes a [`StoreState`]. Every
//! rule is lenient: unknown products, over-removal and empty checkouts degrade
//! to no-ops or clamped values instead of errors, because callers are
//! independently deployed fragments that cannot be trusted to send
//! well-formed input.

use crate::effect::Effect;
use crate::environment::Clock;
use crate::model::{CartItem, Order, OrderId, ProductId, StoreState, User, round_money};
use crate::reducer::Reducer;
use rust_decimal::Decimal;

/// Quantity used when a caller does not name one
pub const DEFAULT_QUANTITY: u32 = 1;

/// Every mutation a fragment may request from a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Add `qty` units of a product, appending a line if needed
    AddToCart {
        /// Product to add
        product_id: ProductId,
        /// Units to add
        qty: u32,
    },
    /// Remove `qty` units of a product, deleting the line at zero
    RemoveFromCart {
        /// Product to remove
        product_id: ProductId,
        /// Units to remove
        qty: u32,
    },
    /// Empty the cart
    ClearCart,
    /// Turn the cart into an order
    CompleteOrder,
    /// Sign the user out
    Logout,
    /// Sign in the placeholder identity
    LoginMock,
    /// Mark one notification as read
    MarkNotificationRead {
        /// Notification id
        id: String,
    },
    /// Mark every notification as read
    MarkAllNotificationsRead,
}

impl StoreAction {
    /// `AddToCart` helper
    #[must_use]
    pub fn add_to_cart(product_id: impl Into<ProductId>, qty: u32) -> Self {
        Self::AddToCart {
            product_id: product_id.into(),
            qty,
        }
    }

    /// `RemoveFromCart` helper
    #[must_use]
    pub fn remove_from_cart(product_id: impl Into<ProductId>, qty: u32) -> Self {
        Self::RemoveFromCart {
            product_id: product_id.into(),
            qty,
        }
    }
}

/// Order id allocation: `offset + existing orders + 1`.
///
/// A per-store counter, not a global identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderIdScheme {
    offset: u64,
}

impl OrderIdScheme {
    /// Offset used by the authoritative store
    pub const AUTHORITATIVE_OFFSET: u64 = 1000;

    /// Offset used by fallback stores
    pub const FALLBACK_OFFSET: u64 = 2000;

    /// Create a scheme with the given offset
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// Id for the next order given how many already exist
    #[must_use]
    pub fn next(&self, existing_orders: usize) -> OrderId {
        let count = u64::try_from(existing_orders).unwrap_or(u64::MAX);
        OrderId::new(self.offset.saturating_add(count).saturating_add(1))
    }
}

/// Placeholder identity installed by `LoginMock` on the authoritative store
#[must_use]
pub fn host_mock_user() -> User {
    User {
        id: "u1".to_string(),
        name: "Alex C".to_string(),
        avatar: "https://i.pravatar.cc/100?img=12".to_string(),
    }
}

/// Placeholder identity installed by `LoginMock` on fallback stores
#[must_use]
pub fn standalone_mock_user() -> User {
    User {
        id: "u-local".to_string(),
        name: "Standalone User".to_string(),
        avatar: "https://i.pravatar.cc/100?img=5".to_string(),
    }
}

/// Dependencies for [`CommerceReducer`]
#[derive(Debug, Clone)]
pub struct CommerceEnvironment<C: Clock> {
    /// Clock used to date new orders
    pub clock: C,
    /// Order id allocation
    pub order_ids: OrderIdScheme,
    /// Identity installed by `LoginMock`
    pub mock_user: User,
}

impl<C: Clock> CommerceEnvironment<C> {
    /// Create an environment
    #[must_use]
    pub const fn new(clock: C, order_ids: OrderIdScheme, mock_user: User) -> Self {
        Self {
            clock,
            order_ids,
            mock_user,
        }
    }

    /// Environment for the authoritative store
    #[must_use]
    pub fn authoritative(clock: C) -> Self {
        Self::new(
            clock,
            OrderIdScheme::new(OrderIdScheme::AUTHORITATIVE_OFFSET),
            host_mock_user(),
        )
    }

    /// Environment for a fragment's fallback store
    #[must_use]
    pub fn fallback(clock: C) -> Self {
        Self::new(
            clock,
            OrderIdScheme::new(OrderIdScheme::FALLBACK_OFFSET),
            standalone_mock_user(),
        )
    }
}

/// Convert the cart into an order.
///
/// Prices are read live from the catalog at checkout, not captured at
/// add-to-cart time. Lines whose product is not in the catalog count as zero.
/// Returns the assigned id, or `None` when the cart was empty and nothing
/// changed.
pub fn complete_order<C: Clock>(
    state: &mut StoreState,
    env: &CommerceEnvironment<C>,
) -> Option<OrderId> {
    if state.cart.is_empty() {
        return None;
    }

    let subtotal: Decimal = state
        .cart
        .items
        .iter()
        .filter_map(|item| {
            state
                .product(item.product_id.as_str())
                .map(|product| product.price * Decimal::from(item.qty))
        })
        .sum();

    let order = Order {
        id: env.order_ids.next(state.orders.len()),
        date: env.clock.now().date_naive(),
        total: round_money(subtotal),
        items: std::mem::take(&mut state.cart.items),
    };
    let id = order.id;
    state.orders.insert(0, order);
    Some(id)
}

/// Reducer implementing every store mutation
#[derive(Debug, Clone, Copy)]
pub struct CommerceReducer<C> {
    _phantom: std::marker::PhantomData<C>,
}

impl<C> CommerceReducer<C> {
    /// Create a new commerce reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<C> Default for CommerceReducer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Reducer for CommerceReducer<C> {
    type State = StoreState;
    type Action = StoreAction;
    type Environment = CommerceEnvironment<C>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effect {
        match action {
            StoreAction::AddToCart { product_id, qty } => {
                if let Some(item) = state
                    .cart
                    .items
                    .iter_mut()
                    .find(|item| item.product_id == product_id)
                {
                    item.qty = item.qty.saturating_add(qty);
                } else if qty > 0 {
                    state.cart.items.push(CartItem { product_id, qty });
                }
                Effect::Notify
            },
            StoreAction::RemoveFromCart { product_id, qty } => {
                // Notifies even when nothing matched.
                for item in &mut state.cart.items {
                    if item.product_id == product_id {
                        item.qty = item.qty.saturating_sub(qty);
                    }
                }
                state.cart.items.retain(|item| item.qty > 0);
                Effect::Notify
            },
            StoreAction::ClearCart => {
                state.cart.items.clear();
                Effect::Notify
            },
            StoreAction::CompleteOrder => match complete_order(state, env) {
                Some(_) => Effect::Notify,
                None => Effect::None,
            },
            StoreAction::Logout => {
                state.user = None;
                Effect::Notify
            },
            StoreAction::LoginMock => {
                state.user = Some(env.mock_user.clone());
                Effect::Notify
            },
            StoreAction::MarkNotificationRead { id } => {
                if let Some(notification) = state.notifications.iter_mut().find(|n| n.id == id) {
                    notification.read = true;
                }
                Effect::Notify
            },
            StoreAction::MarkAllNotificationsRead => {
                for notification in &mut state.notifications {
                    notification.read = true;
                }
                Effect::Notify
            },
        }
    }
}
