//! End-to-end flows across fragments.

#![allow(clippy::unwrap_used)]

use fragment_sync_core::broadcast::{CartSummary, CheckoutReceipt, EventName};
use fragment_sync_core::contract::SharedStore;
use fragment_sync_core::seed::{self, FragmentSeed};
use fragment_sync_runtime::{
    BroadcastChannel, CommerceStore, DebouncedSearch, FederationRegistry, HOST_STORE_MODULE,
    ResolverConfig, SearchConfig, StoreOrigin, StoreResolver,
};
use fragment_sync_testing::data_provider::{PAGE_SIZE, PagedSource};
use fragment_sync_testing::test_clock;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront_demo::views::{self, DerivedView};
use storefront_demo::{ProductCard, ShoppingCart};

fn cards(channel: &Arc<BroadcastChannel>, stocks: &[u32]) -> Vec<Arc<ProductCard>> {
    seed::generated_products()
        .into_iter()
        .zip(stocks.iter().copied())
        .map(|(product, stock)| ProductCard::attach(channel, product, stock))
        .collect()
}

#[tokio::test]
async fn test_fragments_share_one_host_store() {
    let registry = Arc::new(FederationRegistry::new());
    let host: Arc<dyn SharedStore> = Arc::new(CommerceStore::authoritative(test_clock()));
    registry.expose(HOST_STORE_MODULE, Arc::clone(&host));

    let catalog = StoreResolver::for_fragment(FragmentSeed::Catalog, ResolverConfig::default())
        .with_provider(Arc::new(registry.remote(HOST_STORE_MODULE)));
    let header = StoreResolver::for_fragment(FragmentSeed::Header, ResolverConfig::default())
        .with_provider(Arc::new(registry.remote(HOST_STORE_MODULE)));

    let catalog_store = catalog.resolve().await;
    let header_store = header.resolve().await;
    let badge = DerivedView::attach(&header_store, views::header);

    catalog_store.add_to_cart("3", 2);
    assert_eq!(badge.current().cart_count, 2);

    header_store.complete_order();
    let snapshot = catalog_store.get_snapshot();
    assert_eq!(snapshot.orders[0].id.value(), 1004);
    assert_eq!(snapshot.orders[0].total, Decimal::new(3500, 2));
    assert_eq!(badge.current().cart_count, 0);
}

#[tokio::test]
async fn test_standalone_fragment_is_isolated() {
    let registry = Arc::new(FederationRegistry::new());
    let host: Arc<dyn SharedStore> = Arc::new(CommerceStore::authoritative(test_clock()));
    registry.expose(HOST_STORE_MODULE, Arc::clone(&host));

    let details = StoreResolver::for_fragment(FragmentSeed::Details, ResolverConfig::default())
        .with_provider(Arc::new(registry.remote("details/host-store")));
    let store = details.resolve().await;
    assert!(matches!(details.origin(), Some(StoreOrigin::Fallback { .. })));

    store.add_one("1");
    store.complete_order();
    assert_eq!(store.get_snapshot().orders[0].id.value(), 2001);
    assert!(host.get_snapshot().cart.is_empty());
    assert_eq!(host.get_snapshot().orders.len(), 3);
}

#[test]
fn test_cart_respects_announced_stock() {
    let channel = Arc::new(BroadcastChannel::new());
    let cart = ShoppingCart::attach(&channel);
    let cards = cards(&channel, &[2, 0]);

    assert!(cards[0].add_to_cart());
    assert!(cards[0].add_to_cart());
    assert!(!cards[0].add_to_cart());
    assert!(!cards[1].add_to_cart());
    assert_eq!(cards[0].stock(), 0);

    cart.increment("1");
    let summary = cart.summary();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.subtotal, Decimal::new(2500, 2));
    assert_eq!(summary.tax, Decimal::new(250, 2));
    assert_eq!(summary.total, Decimal::new(2750, 2));
}

#[test]
fn test_summary_published_after_every_change() {
    let channel = Arc::new(BroadcastChannel::new());
    let cart = ShoppingCart::attach(&channel);
    let cards = cards(&channel, &[5, 5]);

    let counts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&counts);
    channel.on_message(move |summary: &CartSummary| sink.lock().unwrap().push(summary.count));

    cards[0].add_to_cart();
    cards[1].add_to_cart();
    cart.decrement("1");
    cart.remove("2");

    assert_eq!(*counts.lock().unwrap(), vec![1, 2, 1, 0]);
}

#[test]
fn test_checkout_publishes_receipt_and_empties_cart() {
    let channel = Arc::new(BroadcastChannel::new());
    let cart = ShoppingCart::attach(&channel);
    let cards = cards(&channel, &[3, 3]);

    let receipts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&receipts);
    channel.on_message(move |receipt: &CheckoutReceipt| sink.lock().unwrap().push(receipt.clone()));

    assert!(cart.checkout(&mut rand::thread_rng()).is_none());

    cards[0].add_to_cart();
    cards[1].add_to_cart();
    let receipt = cart.checkout(&mut rand::thread_rng()).unwrap();

    assert!(receipt.order_id.starts_with("ORD-"));
    assert_eq!(receipt.items.len(), 2);
    assert_eq!(receipt.total, Decimal::new(3025, 2));
    assert_eq!(*receipts.lock().unwrap(), vec![receipt]);
    assert!(cart.summary().items.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_search_hides_non_matching_cards() {
    let channel = Arc::new(BroadcastChannel::new());
    let cards = cards(&channel, &[1; 12]);
    let search = DebouncedSearch::new(Arc::clone(&channel), SearchConfig::default());

    search.input("Product 1");
    tokio::time::sleep(Duration::from_millis(301)).await;
    let visible: Vec<&str> = cards
        .iter()
        .filter(|card| card.is_visible())
        .map(|card| card.product().id.as_str())
        .collect();
    assert_eq!(visible, vec!["1", "10", "11", "12"]);

    search.input("   ");
    tokio::time::sleep(Duration::from_millis(301)).await;
    assert!(cards.iter().all(|card| card.is_visible()));
}

#[test]
fn test_detached_fragments_stop_listening() {
    let channel = Arc::new(BroadcastChannel::new());
    let cart = ShoppingCart::attach(&channel);
    let cards = cards(&channel, &[4]);
    assert_eq!(channel.handler_count(EventName::AddToCart), 1);
    assert_eq!(channel.handler_count(EventName::ProductSearch), 1);

    cart.detach();
    cards[0].detach();
    assert_eq!(channel.handler_count(EventName::AddToCart), 0);
    assert_eq!(channel.handler_count(EventName::ProductSearch), 0);

    cards[0].add_to_cart();
    assert!(cart.summary().items.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_catalog_pages_through_data_provider() {
    let source = PagedSource::new(seed::generated_products()).with_latency(Duration::from_millis(50));
    let started = tokio::time::Instant::now();

    let mut names = Vec::new();
    let mut number = 1;
    loop {
        let page = source.fetch_page(number).await;
        assert!(page.results.len() <= PAGE_SIZE);
        names.extend(page.results.into_iter().map(|record| record.fields.name));
        if !page.next {
            break;
        }
        number += 1;
    }

    assert_eq!(number, 2);
    assert_eq!(names.len(), 12);
    assert_eq!(names.last().map(String::as_str), Some("Product 12"));
    assert!(started.elapsed() >= Duration::from_millis(100));

    let seventh = source
        .find_by_code("7", |product| product.id.as_str())
        .unwrap();
    assert_eq!(seventh.id, "7");
    let fetched = source.fetch(7).await.unwrap();
    assert_eq!(fetched.fields, seventh.fields);
}
