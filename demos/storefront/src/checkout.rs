//! Fragments that only talk over the broadcast channel.
//!
//! Product cards announce add-to-cart intents and hide themselves when a
//! search excludes them. The shopping cart keeps its own lines, bounded by
//! the stock each card announced, and publishes a summary after every change
//! and a receipt on checkout.

use chrono::Utc;
use fragment_sync_core::broadcast::{
    AddToCartIntent, CartLine, CartSummary, CheckoutReceipt, EventName, ProductSearch,
};
use fragment_sync_core::model::Product;
use fragment_sync_runtime::channel::{BroadcastChannel, EventHandler};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

const RECEIPT_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Receipt code: `ORD-` and six uppercase alphanumerics
pub fn receipt_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..6)
        .map(|_| char::from(RECEIPT_ALPHABET[rng.gen_range(0..RECEIPT_ALPHABET.len())]))
        .collect();
    format!("ORD-{suffix}")
}

/// A product tile with local stock
pub struct ProductCard {
    product: Product,
    initial_stock: u32,
    stock: Mutex<u32>,
    visible: AtomicBool,
    channel: Arc<BroadcastChannel>,
    search_handler: Mutex<Option<EventHandler>>,
}

impl ProductCard {
    /// Mount a card and start following searches
    pub fn attach(channel: &Arc<BroadcastChannel>, product: Product, stock: u32) -> Arc<Self> {
        let card = Arc::new(Self {
            product,
            initial_stock: stock,
            stock: Mutex::new(stock),
            visible: AtomicBool::new(true),
            channel: Arc::clone(channel),
            search_handler: Mutex::new(None),
        });

        let weak: Weak<Self> = Arc::downgrade(&card);
        let handler = channel.on_message(move |search: &ProductSearch| {
            if let Some(card) = weak.upgrade() {
                let visible = card.product.matches_query(&search.query);
                card.visible.store(visible, Ordering::SeqCst);
            }
        });
        *card
            .search_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
        card
    }

    /// Product shown on the card
    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    /// Units left on this card
    #[must_use]
    pub fn stock(&self) -> u32 {
        *self.stock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the last search matched this card
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Take one unit and announce it; `false` when out of stock
    pub fn add_to_cart(&self) -> bool {
        {
            let mut stock = self.stock.lock().unwrap_or_else(PoisonError::into_inner);
            if *stock == 0 {
                tracing::debug!(product = %self.product.id, "Out of stock");
                return false;
            }
            *stock -= 1;
        }

        self.channel.emit(AddToCartIntent {
            id: self.product.id.to_string(),
            name: self.product.name.clone(),
            price: self.product.price,
            image: self.product.image.clone(),
            initial_stock: self.initial_stock,
        });
        true
    }

    /// Stop following searches
    pub fn detach(&self) {
        let handler = self
            .search_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handler) = handler {
            self.channel.off(EventName::ProductSearch, &handler);
        }
    }
}

/// Cart kept entirely inside one fragment
pub struct ShoppingCart {
    lines: Mutex<Vec<CartLine>>,
    channel: Arc<BroadcastChannel>,
    add_handler: Mutex<Option<EventHandler>>,
}

impl ShoppingCart {
    /// Mount the cart and start accepting add-to-cart intents
    pub fn attach(channel: &Arc<BroadcastChannel>) -> Arc<Self> {
        let cart = Arc::new(Self {
            lines: Mutex::new(Vec::new()),
            channel: Arc::clone(channel),
            add_handler: Mutex::new(None),
        });

        let weak: Weak<Self> = Arc::downgrade(&cart);
        let handler = channel.on_message(move |intent: &AddToCartIntent| {
            if let Some(cart) = weak.upgrade() {
                cart.accept(intent);
            }
        });
        *cart
            .add_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
        cart
    }

    fn accept(&self, intent: &AddToCartIntent) {
        if intent.id.is_empty() {
            return;
        }
        {
            let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
            match lines.iter_mut().find(|line| line.id == intent.id) {
                Some(line) if line.qty < line.initial_stock => line.qty += 1,
                Some(_) => tracing::warn!(product = %intent.id, "Max stock reached"),
                None => lines.push(CartLine::from_intent(intent)),
            }
        }
        self.publish();
    }

    /// One more unit of a line, up to its stock
    pub fn increment(&self, id: &str) {
        self.update(id, |line| {
            if line.qty < line.initial_stock {
                line.qty += 1;
            }
        });
    }

    /// One less unit of a line; the line goes at zero
    pub fn decrement(&self, id: &str) {
        self.update(id, |line| line.qty = line.qty.saturating_sub(1));
    }

    /// Drop a line entirely
    pub fn remove(&self, id: &str) {
        self.update(id, |line| line.qty = 0);
    }

    fn update(&self, id: &str, change: impl FnOnce(&mut CartLine)) {
        {
            let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(line) = lines.iter_mut().find(|line| line.id == id) else {
                return;
            };
            change(line);
            lines.retain(|line| line.qty > 0);
        }
        self.publish();
    }

    /// Current summary
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from_lines(
            self.lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        )
    }

    /// Publish a receipt and empty the cart; `None` when the cart is empty
    pub fn checkout<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CheckoutReceipt> {
        let summary = self.summary();
        if summary.items.is_empty() {
            return None;
        }

        let receipt = CheckoutReceipt::from_summary(receipt_code(rng), &summary, Utc::now());
        tracing::info!(order_id = %receipt.order_id, total = %receipt.total, "Checkout complete");
        self.channel.emit(receipt.clone());

        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.publish();
        Some(receipt)
    }

    fn publish(&self) {
        self.channel.emit(self.summary());
    }

    /// Stop accepting intents
    pub fn detach(&self) {
        let handler = self
            .add_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handler) = handler {
            self.channel.off(EventName::AddToCart, &handler);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_receipt_code_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = receipt_code(&mut rng);
        assert_eq!(code.len(), 10);
        assert!(code.starts_with("ORD-"));
        assert!(
            code[4..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_update_ignores_unknown_line() {
        let channel = Arc::new(BroadcastChannel::new());
        let cart = ShoppingCart::attach(&channel);
        cart.increment("nope");
        assert!(cart.summary().items.is_empty());
    }
}
