//! Run-time module graph shared between a composition root and its fragments.
//!
//! The registry plays the part of a remote-module container: the host exposes
//! its store under a module name, and fragments ask for that name without
//! knowing at build time who, if anyone, provides it.

use fragment_sync_core::contract::SharedStore;
use fragment_sync_core::discovery::{DiscoveryError, LoadFuture, StoreProvider};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Module name the host exposes its authoritative store under
pub const HOST_STORE_MODULE: &str = "host/store";

#[derive(Clone)]
enum RemoteModule {
    Ready(Arc<dyn SharedStore>),
    Broken(DiscoveryError),
}

/// Named stores contributed by independently loaded modules
#[derive(Default)]
pub struct FederationRegistry {
    modules: RwLock<HashMap<String, RemoteModule>>,
}

impl FederationRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `store` under `module`, replacing any previous entry
    pub fn expose(&self, module: impl Into<String>, store: Arc<dyn SharedStore>) {
        let module = module.into();
        tracing::debug!(module = %module, "Exposing store");
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(module, RemoteModule::Ready(store));
    }

    /// Register a module that exists but fails to load with `error`
    pub fn expose_failure(&self, module: impl Into<String>, error: DiscoveryError) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(module.into(), RemoteModule::Broken(error));
    }

    /// Remove a module; returns whether it was present
    pub fn withdraw(&self, module: &str) -> bool {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(module)
            .is_some()
    }

    /// Whether a module is registered (loadable or not)
    #[must_use]
    pub fn contains(&self, module: &str) -> bool {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(module)
    }

    /// Look a module up
    ///
    /// # Errors
    ///
    /// [`DiscoveryError::ModuleNotFound`] if nothing is registered under `module`,
    /// or the error the module was registered with.
    pub fn lookup(&self, module: &str) -> Result<Arc<dyn SharedStore>, DiscoveryError> {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        match modules.get(module) {
            Some(RemoteModule::Ready(store)) => Ok(Arc::clone(store)),
            Some(RemoteModule::Broken(error)) => Err(error.clone()),
            None => Err(DiscoveryError::ModuleNotFound(module.to_string())),
        }
    }

    /// Provider that loads `module` from this registry
    #[must_use]
    pub fn remote(self: &Arc<Self>, module: impl Into<String>) -> RemoteStore {
        RemoteStore {
            registry: Arc::clone(self),
            module: module.into(),
        }
    }
}

impl fmt::Debug for FederationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&String> = modules.keys().collect();
        names.sort();
        f.debug_struct("FederationRegistry")
            .field("modules", &names)
            .finish()
    }
}

/// [`StoreProvider`] resolving one module name against a [`FederationRegistry`]
#[derive(Debug, Clone)]
pub struct RemoteStore {
    registry: Arc<FederationRegistry>,
    module: String,
}

impl RemoteStore {
    /// Module this provider loads
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }
}

impl StoreProvider for RemoteStore {
    fn load(&self) -> LoadFuture<'_> {
        Box::pin(futures::future::ready(self.registry.lookup(&self.module)))
    }
}
