//! Storefront composition root.
//!
//! Run with:
//! ```bash
//! RUST_LOG=info cargo run -p storefront-demo
//! ```

use anyhow::Result;
use fragment_sync_core::broadcast::{CartSummary, CheckoutReceipt, EventName};
use fragment_sync_core::contract::SharedStore;
use fragment_sync_core::environment::SystemClock;
use fragment_sync_core::seed::{self, FragmentSeed};
use fragment_sync_runtime::{
    BroadcastChannel, CommerceStore, DebouncedSearch, FederationRegistry, HOST_STORE_MODULE,
    ResolverConfig, SearchConfig, StoreResolver,
};
use std::sync::Arc;
use std::time::Duration;
use storefront_demo::views::{self, DerivedView};
use storefront_demo::{ProductCard, ShoppingCart};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let resolver_config = ResolverConfig::from_env()?;
    let search_config = SearchConfig::from_env()?;
    info!(?resolver_config, ?search_config, "Starting storefront");

    federated_fragments(&resolver_config).await?;
    broadcast_fragments(search_config).await;

    Ok(())
}

/// Fragments sharing the host's store through the module registry
async fn federated_fragments(config: &ResolverConfig) -> Result<()> {
    let registry = Arc::new(FederationRegistry::new());
    let host: Arc<dyn SharedStore> = Arc::new(CommerceStore::authoritative(SystemClock));
    registry.expose(HOST_STORE_MODULE, Arc::clone(&host));

    let catalog = StoreResolver::for_fragment(FragmentSeed::Catalog, config.clone())
        .with_provider(Arc::new(registry.remote(HOST_STORE_MODULE)));
    let cart = StoreResolver::for_fragment(FragmentSeed::CartOrders, config.clone())
        .with_provider(Arc::new(registry.remote(HOST_STORE_MODULE)));
    // Deployed without the host: must run standalone.
    let details = StoreResolver::for_fragment(FragmentSeed::Details, config.clone())
        .with_provider(Arc::new(registry.remote("details/host-store")));

    let catalog_store = catalog.resolve().await;
    let cart_store = cart.resolve().await;
    let details_store = details.resolve().await;

    anyhow::ensure!(
        Arc::ptr_eq(&catalog_store, &cart_store),
        "catalog and cart should share the host store"
    );
    info!(origin = ?details.origin(), "Details fragment resolved");

    let header = DerivedView::attach(&host, views::header);
    let grid = DerivedView::attach(&catalog_store, views::catalog("product 1"));
    let cart_widget = DerivedView::attach(&cart_store, views::cart_widget);

    catalog_store.add_to_cart("1", 2);
    catalog_store.add_one("10");
    cart_store.remove_one("1");
    info!(header = ?header.current(), cart = ?cart_widget.current(), "After catalog clicks");

    cart_store.complete_order();
    let snapshot = host.get_snapshot();
    if let Some(order) = snapshot.orders.first() {
        info!(order_id = %order.id, total = %order.total, "Order completed");
    }
    host.mark_all_notifications_read();

    details_store.add_one("1");
    info!(
        host_cart = host.get_snapshot().cart.item_count(),
        details_cart = details_store.get_snapshot().cart.item_count(),
        "Fallback store is isolated"
    );
    info!(
        visible = grid.current().len(),
        renders = grid.renders(),
        header = ?header.current(),
        "Final views"
    );
    Ok(())
}

/// Fragments that share nothing but the broadcast channel
async fn broadcast_fragments(search_config: SearchConfig) {
    let channel = BroadcastChannel::global();

    let cart = ShoppingCart::attach(&channel);
    let cards: Vec<Arc<ProductCard>> = seed::generated_products()
        .into_iter()
        .take(4)
        .zip([3, 1, 8, 0])
        .map(|(product, stock)| ProductCard::attach(&channel, product, stock))
        .collect();

    let badge = channel.on_message(|summary: &CartSummary| {
        info!(count = summary.count, total = %summary.total, "Cart badge updated");
    });
    let confirmation = channel.on_message(|receipt: &CheckoutReceipt| {
        info!(order_id = %receipt.order_id, lines = receipt.items.len(), "Order confirmation shown");
    });

    let search = DebouncedSearch::new(Arc::clone(&channel), search_config);
    search.input("prod");
    search.input("  product 2 ");
    tokio::time::sleep(search.delay() + Duration::from_millis(50)).await;
    let visible: Vec<&str> = cards
        .iter()
        .filter(|card| card.is_visible())
        .map(|card| card.product().name.as_str())
        .collect();
    info!(?visible, "Search applied");

    for card in &cards {
        card.add_to_cart();
        card.add_to_cart();
    }
    if let Some(card) = cards.first() {
        cart.increment(card.product().id.as_str());
    }

    let receipt = cart.checkout(&mut rand::thread_rng());
    info!(?receipt, "Checkout finished");

    channel.off(EventName::CartUpdated, &badge);
    channel.off(EventName::CheckoutComplete, &confirmation);
    for card in &cards {
        card.detach();
    }
    cart.detach();
}
