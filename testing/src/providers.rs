use fragment_sync_core::contract::SharedStore;
use fragment_sync_core::discovery::{DiscoveryError, LoadFuture, StoreProvider};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Always yields the same store
#[derive(Clone)]
pub struct StaticProvider {
    store: Arc<dyn SharedStore>,
}

impl StaticProvider {
    /// Provide `store`
    #[must_use]
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }
}

impl StoreProvider for StaticProvider {
    fn load(&self) -> LoadFuture<'_> {
        Box::pin(futures::future::ready(Ok(Arc::clone(&self.store))))
    }
}

/// Always fails with the same error
#[derive(Debug, Clone)]
pub struct FailingProvider {
    error: DiscoveryError,
}

impl FailingProvider {
    /// Fail with `error`
    #[must_use]
    pub const fn new(error: DiscoveryError) -> Self {
        Self { error }
    }
}

impl StoreProvider for FailingProvider {
    fn load(&self) -> LoadFuture<'_> {
        Box::pin(futures::future::ready(Err(self.error.clone())))
    }
}

/// A load that never settles
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingProvider;

impl StoreProvider for PendingProvider {
    fn load(&self) -> LoadFuture<'_> {
        Box::pin(futures::future::pending())
    }
}

/// Yields a store after a delay on the Tokio clock
#[derive(Clone)]
pub struct DelayedProvider {
    store: Arc<dyn SharedStore>,
    delay: Duration,
}

impl DelayedProvider {
    /// Provide `store` once `delay` has elapsed
    #[must_use]
    pub fn new(store: Arc<dyn SharedStore>, delay: Duration) -> Self {
        Self { store, delay }
    }
}

impl StoreProvider for DelayedProvider {
    fn load(&self) -> LoadFuture<'_> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok(Arc::clone(&self.store))
        })
    }
}

/// Counts `load` calls made against another provider
pub struct CountingProvider<P> {
    inner: P,
    loads: AtomicUsize,
}

impl<P: StoreProvider> CountingProvider<P> {
    /// Wrap `inner`
    #[must_use]
    pub const fn new(inner: P) -> Self {
        Self {
            inner,
            loads: AtomicUsize::new(0),
        }
    }

    /// Loads started so far
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl<P: StoreProvider> StoreProvider for CountingProvider<P> {
    fn load(&self) -> LoadFuture<'_> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load()
    }
}
