//! Broadcast channel dispatch semantics.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use fragment_sync_core::broadcast::{
    AddToCartIntent, BroadcastEvent, CartLine, CartSummary, CheckoutReceipt, EventName,
    ProductSearch,
};
use fragment_sync_runtime::{BroadcastChannel, EventHandler};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

fn intent(id: &str) -> AddToCartIntent {
    AddToCartIntent {
        id: id.to_string(),
        name: format!("Product {id}"),
        price: Decimal::new(1250, 2),
        image: String::new(),
        initial_stock: 3,
    }
}

#[test]
fn test_handler_may_emit_other_events() {
    let channel = Arc::new(BroadcastChannel::new());
    let summaries = Arc::new(Mutex::new(Vec::new()));

    let weak = Arc::downgrade(&channel);
    channel.on_message(move |intent: &AddToCartIntent| {
        if let Some(channel) = weak.upgrade() {
            channel.emit(CartSummary::from_lines(vec![CartLine::from_intent(intent)]));
        }
    });
    let sink = Arc::clone(&summaries);
    channel.on_message(move |summary: &CartSummary| sink.lock().unwrap().push(summary.total));

    assert_eq!(channel.emit(intent("1")), 1);
    assert_eq!(*summaries.lock().unwrap(), vec![Decimal::new(1375, 2)]);
}

#[test]
fn test_handler_registered_during_dispatch_misses_current_event() {
    let channel = Arc::new(BroadcastChannel::new());
    let late_calls = Arc::new(Mutex::new(0));

    let weak = Arc::downgrade(&channel);
    let calls = Arc::clone(&late_calls);
    let registered = Arc::new(Mutex::new(false));
    channel.on_message(move |_: &ProductSearch| {
        let mut registered = registered.lock().unwrap();
        if *registered {
            return;
        }
        *registered = true;
        if let Some(channel) = weak.upgrade() {
            let calls = Arc::clone(&calls);
            channel.on_message(move |_: &ProductSearch| *calls.lock().unwrap() += 1);
        }
    });

    assert_eq!(
        channel.emit(ProductSearch {
            query: "a".into()
        }),
        1
    );
    assert_eq!(*late_calls.lock().unwrap(), 0);

    assert_eq!(
        channel.emit(ProductSearch {
            query: "b".into()
        }),
        2
    );
    assert_eq!(*late_calls.lock().unwrap(), 1);
}

#[test]
fn test_raw_handler_sees_only_its_event_name() {
    let channel = BroadcastChannel::new();
    let names = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&names);
    let handler: EventHandler = Arc::new(move |event: &BroadcastEvent| {
        sink.lock().unwrap().push(event.name());
    });
    channel.on(EventName::AddToCart, Arc::clone(&handler));

    channel.emit(ProductSearch {
        query: String::new(),
    });
    channel.emit(intent("2"));

    assert_eq!(*names.lock().unwrap(), vec![EventName::AddToCart]);
    assert!(channel.off(EventName::AddToCart, &handler));
}

#[test]
fn test_same_closure_under_two_names_is_two_registrations() {
    let channel = BroadcastChannel::new();
    let handler: EventHandler = Arc::new(|_: &BroadcastEvent| {});
    channel.on(EventName::CartUpdated, Arc::clone(&handler));
    channel.on(EventName::CheckoutComplete, Arc::clone(&handler));

    assert_eq!(channel.handler_count(EventName::CartUpdated), 1);
    assert_eq!(channel.handler_count(EventName::CheckoutComplete), 1);
    assert!(channel.off(EventName::CartUpdated, &handler));
    assert_eq!(channel.handler_count(EventName::CheckoutComplete), 1);
}

#[test]
fn test_checkout_complete_with_no_subscribers_is_silent() {
    let channel = BroadcastChannel::new();
    let summary = CartSummary::from_lines(vec![CartLine::from_intent(&intent("1"))]);
    let receipt = CheckoutReceipt::from_summary(
        "ORD-7Q2X9A",
        &summary,
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
    );

    assert_eq!(channel.handler_count(EventName::CheckoutComplete), 0);
    assert_eq!(channel.emit(receipt.clone()), 0);

    let receipts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&receipts);
    channel.on_message(move |receipt: &CheckoutReceipt| sink.lock().unwrap().push(receipt.clone()));
    assert!(receipts.lock().unwrap().is_empty());

    assert_eq!(channel.emit(receipt.clone()), 1);
    assert_eq!(*receipts.lock().unwrap(), vec![receipt]);
}
