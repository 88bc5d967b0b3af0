//! Discovery and fallback across fragments.

#![allow(clippy::unwrap_used)]

use fragment_sync_core::contract::SharedStore;
use fragment_sync_core::discovery::DiscoveryError;
use fragment_sync_core::seed::FragmentSeed;
use fragment_sync_runtime::{
    CommerceStore, FederationRegistry, HOST_STORE_MODULE, ResolverConfig, StoreOrigin,
    StoreResolver,
};
use fragment_sync_testing::providers::{
    CountingProvider, DelayedProvider, FailingProvider, PendingProvider, StaticProvider,
};
use fragment_sync_testing::test_clock;
use std::sync::Arc;
use std::time::Duration;

fn host() -> Arc<dyn SharedStore> {
    Arc::new(CommerceStore::authoritative(test_clock()))
}

#[tokio::test]
async fn test_every_fragment_gets_the_host_instance() {
    let registry = Arc::new(FederationRegistry::new());
    let host = host();
    registry.expose(HOST_STORE_MODULE, Arc::clone(&host));

    for seed in FragmentSeed::ALL {
        let resolver = StoreResolver::for_fragment(seed, ResolverConfig::default())
            .with_provider(Arc::new(registry.remote(HOST_STORE_MODULE)));
        let store = resolver.resolve().await;
        assert!(Arc::ptr_eq(&store, &host), "{}", seed.name());
        assert!(resolver.resolution().unwrap().is_shared());
    }
}

#[tokio::test]
async fn test_update_through_one_fragment_is_seen_by_another() {
    let registry = Arc::new(FederationRegistry::new());
    registry.expose(HOST_STORE_MODULE, host());

    let catalog = StoreResolver::for_fragment(FragmentSeed::Catalog, ResolverConfig::default())
        .with_provider(Arc::new(registry.remote(HOST_STORE_MODULE)));
    let cart = StoreResolver::for_fragment(FragmentSeed::CartOrders, ResolverConfig::default())
        .with_provider(Arc::new(registry.remote(HOST_STORE_MODULE)));

    catalog.resolve().await.add_to_cart("5", 1);
    assert_eq!(cart.resolve().await.get_snapshot().cart.quantity_of("5"), 1);
}

#[tokio::test]
async fn test_resolution_happens_once() {
    let provider = Arc::new(CountingProvider::new(StaticProvider::new(host())));
    let resolver = Arc::new(
        StoreResolver::for_fragment(FragmentSeed::Header, ResolverConfig::default())
            .with_provider(Arc::clone(&provider) as _),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.resolve().await })
        })
        .collect();
    let mut stores = Vec::new();
    for handle in handles {
        stores.push(handle.await.unwrap());
    }

    assert_eq!(provider.loads(), 1);
    assert!(stores.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[tokio::test]
async fn test_fallback_is_memoized() {
    let provider = Arc::new(CountingProvider::new(FailingProvider::new(
        DiscoveryError::ModuleNotFound(HOST_STORE_MODULE.into()),
    )));
    let resolver = StoreResolver::for_fragment(FragmentSeed::Catalog, ResolverConfig::default())
        .with_provider(Arc::clone(&provider) as _);

    let first = resolver.resolve().await;
    first.add_one("1");
    let second = resolver.resolve().await;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.get_snapshot().cart.quantity_of("1"), 1);
    assert_eq!(provider.loads(), 1);
}

#[tokio::test]
async fn test_host_exposed_after_fallback_is_not_picked_up() {
    let registry = Arc::new(FederationRegistry::new());
    let provider = Arc::new(CountingProvider::new(registry.remote(HOST_STORE_MODULE)));
    let resolver = StoreResolver::for_fragment(FragmentSeed::CartOrders, ResolverConfig::default())
        .with_provider(Arc::clone(&provider) as _);

    let fallback = resolver.resolve().await;
    assert!(matches!(
        resolver.origin(),
        Some(StoreOrigin::Fallback {
            reason: DiscoveryError::ModuleNotFound(_)
        })
    ));

    let host = host();
    registry.expose(HOST_STORE_MODULE, Arc::clone(&host));
    let again = resolver.resolve().await;

    assert!(Arc::ptr_eq(&again, &fallback));
    assert!(!Arc::ptr_eq(&again, &host));
    assert_eq!(provider.loads(), 1);
}

#[tokio::test]
async fn test_fallback_stores_of_two_fragments_are_independent() {
    let catalog = StoreResolver::for_fragment(FragmentSeed::Catalog, ResolverConfig::default());
    let details = StoreResolver::for_fragment(FragmentSeed::Details, ResolverConfig::default());

    let catalog_store = catalog.resolve().await;
    let details_store = details.resolve().await;
    catalog_store.add_one("1");

    assert!(!Arc::ptr_eq(&catalog_store, &details_store));
    assert!(details_store.get_snapshot().cart.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hung_provider_times_out_to_fallback() {
    let config = ResolverConfig::default().with_discovery_timeout(Duration::from_millis(250));
    let resolver = StoreResolver::for_fragment(FragmentSeed::Details, config)
        .with_provider(Arc::new(PendingProvider));

    let store = resolver.resolve().await;
    assert_eq!(store.get_snapshot().products.len(), 1);
    assert_eq!(
        resolver.origin(),
        Some(&StoreOrigin::Fallback {
            reason: DiscoveryError::Timeout(Duration::from_millis(250))
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_within_timeout_is_shared() {
    let host = host();
    let config = ResolverConfig::default().with_discovery_timeout(Duration::from_secs(2));
    let resolver = StoreResolver::for_fragment(FragmentSeed::Catalog, config).with_provider(
        Arc::new(DelayedProvider::new(Arc::clone(&host), Duration::from_millis(800))),
    );

    assert!(Arc::ptr_eq(&resolver.resolve().await, &host));
}

#[tokio::test(start_paused = true)]
async fn test_without_timeout_a_hung_provider_never_resolves() {
    let config = ResolverConfig::default().without_discovery_timeout();
    let resolver = StoreResolver::for_fragment(FragmentSeed::Catalog, config)
        .with_provider(Arc::new(PendingProvider));

    let outcome = tokio::time::timeout(Duration::from_secs(3600), resolver.resolve()).await;
    assert!(outcome.is_err());
    assert!(resolver.origin().is_none());
}

#[tokio::test]
async fn test_broken_module_falls_back_with_reason() {
    let registry = Arc::new(FederationRegistry::new());
    registry.expose_failure(
        HOST_STORE_MODULE,
        DiscoveryError::MalformedExport("default export is not a store".into()),
    );
    let resolver = StoreResolver::for_fragment(FragmentSeed::Header, ResolverConfig::default())
        .with_provider(Arc::new(registry.remote(HOST_STORE_MODULE)));

    let store = resolver.resolve().await;
    assert_eq!(store.get_snapshot().notifications.len(), 1);
    assert!(matches!(
        resolver.origin(),
        Some(StoreOrigin::Fallback {
            reason: DiscoveryError::MalformedExport(_)
        })
    ));
}
