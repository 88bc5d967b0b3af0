//! Discovery contract: how a fragment asks for a store someone else owns.
//!
//! A [`StoreProvider`] stands for "a store contributed by another,
//! independently loaded module". Loading it may fail in many ways; every
//! failure is a [`DiscoveryError`], which the resolver swallows and answers
//! with a fallback store.

use crate::contract::SharedStore;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a shared store could not be obtained
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The fragment was started without any provider to ask
    #[error("No store provider configured")]
    NoProvider,

    /// The remote module is not part of this deployment
    #[error("Remote module not found: {0}")]
    ModuleNotFound(String),

    /// The remote module exists but failed to load
    #[error("Remote module failed to load: {0}")]
    LoadFailed(String),

    /// The remote module loaded but did not export a usable store
    #[error("Malformed store export: {0}")]
    MalformedExport(String),

    /// The remote store implements an older contract than required
    #[error("Incompatible store contract: required v{required}, found v{found}")]
    IncompatibleContract {
        /// Version the consumer needs
        required: u32,
        /// Version the store reports
        found: u32,
    },

    /// The load neither resolved nor failed in time
    #[error("Store discovery timed out after {0:?}")]
    Timeout(Duration),
}

/// Future returned by [`StoreProvider::load`]
pub type LoadFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Arc<dyn SharedStore>, DiscoveryError>> + Send + 'a>>;

/// Source of a shared store owned elsewhere.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so providers can be held as `Arc<dyn StoreProvider>`.
pub trait StoreProvider: Send + Sync {
    /// Attempt to obtain the shared store
    ///
    /// # Errors
    ///
    /// Returns a [`DiscoveryError`] describing why the store is unavailable.
    fn load(&self) -> LoadFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DiscoveryError::ModuleNotFound("host/store".into()).to_string(),
            "Remote module not found: host/store"
        );
        assert_eq!(
            DiscoveryError::IncompatibleContract {
                required: 2,
                found: 1
            }
            .to_string(),
            "Incompatible store contract: required v2, found v1"
        );
    }
}
