//! Shared-or-fallback store resolution.
//!
//! Each fragment owns one [`StoreResolver`]. The first call to
//! [`StoreResolver::resolve`] asks the provider for the shared store, bounded
//! by the configured discovery timeout. Any failure yields a locally
//! constructed fallback store instead. The result is memoized: every later
//! call, concurrent or not, returns the same `Arc`.

use crate::config::ResolverConfig;
use crate::store::CommerceStore;
use fragment_sync_core::contract::SharedStore;
use fragment_sync_core::discovery::{DiscoveryError, StoreProvider};
use fragment_sync_core::environment::SystemClock;
use fragment_sync_core::seed::FragmentSeed;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Builds a fragment's fallback store
pub type FallbackFactory = Box<dyn Fn() -> Arc<dyn SharedStore> + Send + Sync>;

/// Where a resolved store came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOrigin {
    /// The store another module exposed
    Shared,
    /// A local store, because discovery failed
    Fallback {
        /// Why discovery failed
        reason: DiscoveryError,
    },
}

/// Outcome of the one resolution attempt
#[derive(Clone)]
pub struct Resolution {
    store: Arc<dyn SharedStore>,
    origin: StoreOrigin,
}

impl Resolution {
    /// The resolved store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SharedStore> {
        &self.store
    }

    /// Where the store came from
    #[must_use]
    pub const fn origin(&self) -> &StoreOrigin {
        &self.origin
    }

    /// Whether the fragment is connected to the shared store
    #[must_use]
    pub const fn is_shared(&self) -> bool {
        matches!(self.origin, StoreOrigin::Shared)
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Resolves one fragment's store, once.
///
/// # Example
///
/// ```
/// use fragment_sync_core::seed::FragmentSeed;
/// use fragment_sync_runtime::config::ResolverConfig;
/// use fragment_sync_runtime::resolver::StoreResolver;
///
/// # tokio_test::block_on(async {
/// // No provider: the fragment runs standalone.
/// let resolver = StoreResolver::for_fragment(FragmentSeed::Details, ResolverConfig::default());
/// let store = resolver.resolve().await;
/// assert!(store.get_snapshot().cart.is_empty());
/// assert!(!resolver.resolution().is_some_and(|r| r.is_shared()));
/// # });
/// ```
pub struct StoreResolver {
    fragment: String,
    config: ResolverConfig,
    provider: Option<Arc<dyn StoreProvider>>,
    fallback: FallbackFactory,
    resolved: OnceCell<Resolution>,
}

impl StoreResolver {
    /// Create a resolver with a custom fallback factory and no provider
    #[must_use]
    pub fn new<F>(fragment: impl Into<String>, config: ResolverConfig, fallback: F) -> Self
    where
        F: Fn() -> Arc<dyn SharedStore> + Send + Sync + 'static,
    {
        Self {
            fragment: fragment.into(),
            config,
            provider: None,
            fallback: Box::new(fallback),
            resolved: OnceCell::new(),
        }
    }

    /// Create a resolver whose fallback is the fragment's seeded commerce store
    #[must_use]
    pub fn for_fragment(seed: FragmentSeed, config: ResolverConfig) -> Self {
        Self::new(seed.name(), config, move || {
            Arc::new(CommerceStore::fallback(seed, SystemClock)) as Arc<dyn SharedStore>
        })
    }

    /// Ask `provider` for the shared store
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn StoreProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Fragment this resolver belongs to
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// One discovery attempt, without fallback.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::NoProvider`]: no provider was configured
    /// - any error the provider reports
    /// - [`DiscoveryError::Timeout`]: the provider did not answer in time
    /// - [`DiscoveryError::IncompatibleContract`]: the store is too old
    pub async fn negotiate(&self) -> Result<Arc<dyn SharedStore>, DiscoveryError> {
        let provider = self.provider.as_ref().ok_or(DiscoveryError::NoProvider)?;

        let store = match self.config.discovery_timeout {
            Some(limit) => tokio::time::timeout(limit, provider.load())
                .await
                .map_err(|_| DiscoveryError::Timeout(limit))??,
            None => provider.load().await?,
        };

        let found = store.contract_version();
        let required = self.config.required_contract_version;
        if found < required {
            return Err(DiscoveryError::IncompatibleContract { required, found });
        }
        Ok(store)
    }

    /// The fragment's store: shared if discovery succeeds, fallback otherwise.
    ///
    /// Never fails. Discovery runs at most once per resolver; concurrent
    /// callers wait for the same attempt.
    #[tracing::instrument(skip(self), fields(fragment = %self.fragment))]
    pub async fn resolve(&self) -> Arc<dyn SharedStore> {
        let resolution = self
            .resolved
            .get_or_init(|| async {
                match self.negotiate().await {
                    Ok(store) => {
                        tracing::info!("Connected to shared store");
                        metrics::counter!("discovery.shared.total").increment(1);
                        Resolution {
                            store,
                            origin: StoreOrigin::Shared,
                        }
                    },
                    Err(reason) => {
                        tracing::warn!(error = %reason, "Shared store unavailable, using fallback store");
                        metrics::counter!("discovery.fallback.total").increment(1);
                        Resolution {
                            store: (self.fallback)(),
                            origin: StoreOrigin::Fallback { reason },
                        }
                    },
                }
            })
            .await;
        Arc::clone(&resolution.store)
    }

    /// Outcome of the resolution, once it has happened
    #[must_use]
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolved.get()
    }

    /// Origin of the resolved store, once resolved
    #[must_use]
    pub fn origin(&self) -> Option<&StoreOrigin> {
        self.resolution().map(Resolution::origin)
    }
}

impl fmt::Debug for StoreResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreResolver")
            .field("fragment", &self.fragment)
            .field("config", &self.config)
            .field("has_provider", &self.provider.is_some())
            .field("resolution", &self.resolved.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragment_sync_testing::providers::{FailingProvider, StaticProvider};
    use fragment_sync_testing::test_clock;

    #[tokio::test]
    async fn test_no_provider_falls_back() {
        let resolver = StoreResolver::for_fragment(FragmentSeed::Catalog, ResolverConfig::default());
        assert!(resolver.origin().is_none());

        let store = resolver.resolve().await;
        assert_eq!(store.get_snapshot().products.len(), 8);
        assert_eq!(
            resolver.origin(),
            Some(&StoreOrigin::Fallback {
                reason: DiscoveryError::NoProvider
            })
        );
    }

    #[tokio::test]
    async fn test_shared_store_is_the_same_instance() {
        let host: Arc<dyn SharedStore> = Arc::new(CommerceStore::authoritative(test_clock()));
        let resolver = StoreResolver::for_fragment(FragmentSeed::Header, ResolverConfig::default())
            .with_provider(Arc::new(StaticProvider::new(Arc::clone(&host))));

        let store = resolver.resolve().await;
        assert!(Arc::ptr_eq(&store, &host));
        assert_eq!(resolver.origin(), Some(&StoreOrigin::Shared));
    }

    #[tokio::test]
    async fn test_failed_load_falls_back() {
        let resolver = StoreResolver::for_fragment(FragmentSeed::Details, ResolverConfig::default())
            .with_provider(Arc::new(FailingProvider::new(DiscoveryError::LoadFailed(
                "remoteEntry.js".into(),
            ))));

        let store = resolver.resolve().await;
        assert_eq!(store.get_snapshot().products.len(), 1);
        assert!(matches!(
            resolver.origin(),
            Some(StoreOrigin::Fallback {
                reason: DiscoveryError::LoadFailed(_)
            })
        ));
    }

    #[tokio::test]
    async fn test_incompatible_contract_rejected() {
        let host: Arc<dyn SharedStore> = Arc::new(CommerceStore::authoritative(test_clock()));
        let config = ResolverConfig::default().with_required_contract_version(2);
        let resolver = StoreResolver::for_fragment(FragmentSeed::Catalog, config)
            .with_provider(Arc::new(StaticProvider::new(host)));

        let result = resolver.negotiate().await;
        assert!(matches!(
            result,
            Err(DiscoveryError::IncompatibleContract {
                required: 2,
                found: 1
            })
        ));
    }
}
