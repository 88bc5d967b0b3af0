//! Debounced search publishing.
//!
//! Keystrokes arrive faster than a catalog should refilter. [`DebouncedSearch`]
//! waits for a quiet period and then publishes the trimmed query as a
//! `product-search` event. Input that arrives before the period elapses
//! cancels the pending publish.

use crate::channel::BroadcastChannel;
use crate::config::SearchConfig;
use fragment_sync_core::broadcast::ProductSearch;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Publishes search input after a quiet period
pub struct DebouncedSearch {
    channel: Arc<BroadcastChannel>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedSearch {
    /// Publish to `channel` after `config.debounce` of silence
    #[must_use]
    pub fn new(channel: Arc<BroadcastChannel>, config: SearchConfig) -> Self {
        Self {
            channel,
            delay: config.debounce,
            pending: Mutex::new(None),
        }
    }

    /// Quiet period before a query is published
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Record new input, restarting the quiet period.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn input(&self, raw: &str) {
        let query = raw.trim().to_string();
        let channel = Arc::clone(&self.channel);
        let delay = self.delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(query = %query, "Publishing search query");
            channel.emit(ProductSearch { query });
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drop any pending publish; returns whether one was pending
    pub fn cancel(&self) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        pending.is_some_and(|task| {
            let was_pending = !task.is_finished();
            task.abort();
            was_pending
        })
    }
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for DebouncedSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedSearch")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
