//! Runtime configuration.
//!
//! Every setting has a default and a builder method. Binaries can also load
//! settings from the environment:
//!
//! - `FRAGMENT_SYNC_DISCOVERY_TIMEOUT_MS` - how long store discovery may take
//!   (default: 5000; `0` or `none` waits forever)
//! - `FRAGMENT_SYNC_SEARCH_DEBOUNCE_MS` - quiet period before a search query is
//!   published (default: 300)

use crate::error::ConfigError;
use fragment_sync_core::contract::CONTRACT_VERSION;
use std::time::Duration;

/// Environment variable holding the discovery timeout in milliseconds
pub const DISCOVERY_TIMEOUT_ENV: &str = "FRAGMENT_SYNC_DISCOVERY_TIMEOUT_MS";

/// Environment variable holding the search debounce in milliseconds
pub const SEARCH_DEBOUNCE_ENV: &str = "FRAGMENT_SYNC_SEARCH_DEBOUNCE_MS";

fn parse_millis(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), format!("{raw:?}: {e}")))
}

/// Configuration for [`StoreResolver`](crate::resolver::StoreResolver)
///
/// # Example
///
/// ```
/// use fragment_sync_runtime::config::ResolverConfig;
/// use std::time::Duration;
///
/// let config = ResolverConfig::default().with_discovery_timeout(Duration::from_millis(500));
/// assert_eq!(config.discovery_timeout, Some(Duration::from_millis(500)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Upper bound on one discovery attempt; `None` waits forever
    pub discovery_timeout: Option<Duration>,
    /// Oldest store contract this fragment can work with
    pub required_contract_version: u32,
}

impl ResolverConfig {
    /// Default bound on a discovery attempt
    pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a configuration with explicit values
    #[must_use]
    pub const fn new(discovery_timeout: Option<Duration>, required_contract_version: u32) -> Self {
        Self {
            discovery_timeout,
            required_contract_version,
        }
    }

    /// Bound discovery by `timeout`
    #[must_use]
    pub const fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = Some(timeout);
        self
    }

    /// Let discovery wait forever
    #[must_use]
    pub const fn without_discovery_timeout(mut self) -> Self {
        self.discovery_timeout = None;
        self
    }

    /// Require at least `version` of the store contract
    #[must_use]
    pub const fn with_required_contract_version(mut self, version: u32) -> Self {
        self.required_contract_version = version;
        self
    }

    /// Load from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(DISCOVERY_TIMEOUT_ENV) {
            config.discovery_timeout = if raw.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                match parse_millis(DISCOVERY_TIMEOUT_ENV, &raw)? {
                    0 => None,
                    ms => Some(Duration::from_millis(ms)),
                }
            };
        }
        Ok(config)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new(Some(Self::DEFAULT_DISCOVERY_TIMEOUT), CONTRACT_VERSION)
    }
}

/// Configuration for [`DebouncedSearch`](crate::search::DebouncedSearch)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Quiet period before a query is published
    pub debounce: Duration,
}

impl SearchConfig {
    /// Default quiet period
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

    /// Set the quiet period
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Load from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] if the variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(SEARCH_DEBOUNCE_ENV) {
            config.debounce = Duration::from_millis(parse_millis(SEARCH_DEBOUNCE_ENV, &raw)?);
        }
        Ok(config)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Self::DEFAULT_DEBOUNCE,
        }
    }
}
