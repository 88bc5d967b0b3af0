//! State Model shared by every fragment.
//!
//! These types are the data half of the Store contract: a field removed or
//! renamed here breaks every independently deployed consumer at once, so the
//! model only ever grows.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round a money amount to cents, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Catalog product identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for ProductId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Order identifier
///
/// Unique and increasing within one store instance only. Two fallback stores
/// will happily hand out the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Create an order id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric value of the id
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog product. Seeded once, never edited by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Unit price, non-negative
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Image reference
    pub image: String,
    /// Long description
    pub description: String,
}

impl Product {
    /// Case-insensitive match of `query` against name or description.
    ///
    /// A blank query matches every product.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query) || self.description.to_lowercase().contains(&query)
    }
}

/// One cart line. `qty` is always positive while the item is in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Referenced product; not validated against the catalog
    pub product_id: ProductId,
    /// Quantity held
    pub qty: u32,
}

impl CartItem {
    /// Create a cart line
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, qty: u32) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
        }
    }
}

/// The shopping cart: ordered lines, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Lines in insertion order
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.qty).sum()
    }

    /// Quantity held for `product_id`, zero when absent
    #[must_use]
    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.items
            .iter()
            .find(|item| item.product_id == *product_id)
            .map_or(0, |item| item.qty)
    }
}

/// A completed order. The total is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Store-local identifier
    pub id: OrderId,
    /// Creation date
    pub date: NaiveDate,
    /// Total at completion time
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// Copy of the cart lines at completion time
    pub items: Vec<CartItem>,
}

/// A user-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Identifier
    pub id: String,
    /// Message text
    pub message: String,
    /// Whether the user has seen it
    pub read: bool,
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Avatar reference
    pub avatar: String,
}

/// Aggregate state held by one store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    /// Catalog
    pub products: Vec<Product>,
    /// Current cart
    pub cart: Cart,
    /// Orders, most recent first
    pub orders: Vec<Order>,
    /// Signed-in user, `None` when logged out
    pub user: Option<User>,
    /// Notifications
    pub notifications: Vec<Notification>,
}

impl StoreState {
    /// Catalog lookup by id
    #[must_use]
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.id == *id)
    }

    /// Products matching a search query, in catalog order
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products
            .iter()
            .filter(move |product| product.matches_query(query))
    }

    /// Number of unread notifications
    #[must_use]
    pub fn unread_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Live-priced cart total, rounded to cents.
    ///
    /// Lines whose product is missing from the catalog contribute nothing.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        let sum: Decimal = self
            .cart
            .items
            .iter()
            .filter_map(|item| {
                self.product(item.product_id.as_str())
                    .map(|product| product.price * Decimal::from(item.qty))
            })
            .sum();
        round_money(sum)
    }

    /// Whether a user is signed in
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}
