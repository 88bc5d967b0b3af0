//! Broadcast vocabulary for fragments that share no store reference.
//!
//! The vocabulary is closed and append-only: four event names, each bound to
//! exactly one payload shape. Publishing goes through [`BroadcastEvent`], so a
//! payload can never travel under the wrong name.
//!
//! Wire names and payload field names follow the host event conventions
//! (`add-to-cart`, `initialStock`, `orderId`) so payloads serialize the way
//! independently written listeners expect.

use crate::model::round_money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sales tax applied to cart summaries
pub const TAX_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Closed set of broadcast event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventName {
    /// `product-search`
    ProductSearch,
    /// `add-to-cart`
    AddToCart,
    /// `cart-updated`
    CartUpdated,
    /// `checkout-complete`
    CheckoutComplete,
}

impl EventName {
    /// Every event name, in vocabulary order
    pub const ALL: [Self; 4] = [
        Self::ProductSearch,
        Self::AddToCart,
        Self::CartUpdated,
        Self::CheckoutComplete,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductSearch => "product-search",
            Self::AddToCart => "add-to-cart",
            Self::CartUpdated => "cart-updated",
            Self::CheckoutComplete => "checkout-complete",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wire name outside the vocabulary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown broadcast event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventName {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// `product-search` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSearch {
    /// Trimmed search text; empty clears the filter
    pub query: String,
}

/// `add-to-cart` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartIntent {
    /// Product id
    pub id: String,
    /// Product name
    pub name: String,
    /// Unit price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Image reference
    pub image: String,
    /// Stock the publishing card started with
    pub initial_stock: u32,
}

/// One line of a [`CartSummary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product id
    pub id: String,
    /// Product name
    pub name: String,
    /// Unit price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Units in the cart
    pub qty: u32,
    /// Image reference
    pub image: String,
    /// Upper bound for `qty`
    pub initial_stock: u32,
}

impl CartLine {
    /// First unit of a product announced by an add-to-cart intent
    #[must_use]
    pub fn from_intent(intent: &AddToCartIntent) -> Self {
        Self {
            id: intent.id.clone(),
            name: intent.name.clone(),
            price: intent.price,
            qty: 1,
            image: intent.image.clone(),
            initial_stock: intent.initial_stock,
        }
    }
}

/// `cart-updated` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    /// Current lines
    pub items: Vec<CartLine>,
    /// Total units
    pub count: u32,
    /// Sum of line totals
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    /// Tax on the subtotal
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    /// Subtotal plus tax
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl CartSummary {
    /// Summarize cart lines. Tax is [`TAX_RATE`] of the unrounded line sum;
    /// subtotal, tax and total are each rounded to cents.
    #[must_use]
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let count = items.iter().map(|line| line.qty).sum();
        let raw: Decimal = items
            .iter()
            .map(|line| line.price * Decimal::from(line.qty))
            .sum();
        let tax = round_money(raw * TAX_RATE);
        let total = round_money(raw + tax);
        let subtotal = round_money(raw);
        Self {
            items,
            count,
            subtotal,
            tax,
            total,
        }
    }
}

/// One line of a [`CheckoutReceipt`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    /// Product id
    pub id: String,
    /// Product name
    pub name: String,
    /// Unit price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Units bought
    pub qty: u32,
}

impl From<&CartLine> for ReceiptLine {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.clone(),
            name: line.name.clone(),
            price: line.price,
            qty: line.qty,
        }
    }
}

/// `checkout-complete` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    /// Receipt id chosen by the publishing fragment
    pub order_id: String,
    /// Lines bought
    pub items: Vec<ReceiptLine>,
    /// Amount charged, tax included
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// When checkout completed
    pub timestamp: DateTime<Utc>,
}

impl CheckoutReceipt {
    /// Receipt for a summarized cart
    #[must_use]
    pub fn from_summary(
        order_id: impl Into<String>,
        summary: &CartSummary,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            items: summary.items.iter().map(ReceiptLine::from).collect(),
            total: summary.total,
            timestamp,
        }
    }
}

/// Tagged union of every broadcast message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "kebab-case")]
pub enum BroadcastEvent {
    /// A search query changed
    ProductSearch(ProductSearch),
    /// A product card asked for a unit to be added
    AddToCart(AddToCartIntent),
    /// The cart fragment's contents changed
    CartUpdated(CartSummary),
    /// A checkout finished
    CheckoutComplete(CheckoutReceipt),
}

impl BroadcastEvent {
    /// Name this event is delivered under
    #[must_use]
    pub const fn name(&self) -> EventName {
        match self {
            Self::ProductSearch(_) => EventName::ProductSearch,
            Self::AddToCart(_) => EventName::AddToCart,
            Self::CartUpdated(_) => EventName::CartUpdated,
            Self::CheckoutComplete(_) => EventName::CheckoutComplete,
        }
    }
}

/// A payload type bound to one [`EventName`]
pub trait BroadcastMessage: Sized + Send + Sync + 'static {
    /// Name the payload travels under
    const NAME: EventName;

    /// Borrow the payload if `event` carries this type
    fn from_event(event: &BroadcastEvent) -> Option<&Self>;

    /// Wrap the payload
    fn into_event(self) -> BroadcastEvent;
}

macro_rules! broadcast_message {
    ($payload:ty, $variant:ident) => {
        impl BroadcastMessage for $payload {
            const NAME: EventName = EventName::$variant;

            fn from_event(event: &BroadcastEvent) -> Option<&Self> {
                match event {
                    BroadcastEvent::$variant(payload) => Some(payload),
                    _ => None,
                }
            }

            fn into_event(self) -> BroadcastEvent {
                BroadcastEvent::$variant(self)
            }
        }

        impl From<$payload> for BroadcastEvent {
            fn from(payload: $payload) -> Self {
                payload.into_event()
            }
        }
    };
}

broadcast_message!(ProductSearch, ProductSearch);
broadcast_message!(AddToCartIntent, AddToCart);
broadcast_message!(CartSummary, CartUpdated);
broadcast_message!(CheckoutReceipt, CheckoutComplete);
