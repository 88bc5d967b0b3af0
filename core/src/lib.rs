//! # Fragment Sync Core
//!
//! Core types and contracts for sharing storefront state between independently
//! deployed UI fragments.
//!
//! A composed storefront is made of fragments (catalog, cart, header, details)
//! that are built and shipped separately. They agree on three things, all of
//! which live in this crate:
//!
//! - **State Model**: the shape of the shared state ([`model::StoreState`])
//! - **Store contract**: the run-time ABI every store exposes ([`contract::SharedStore`])
//! - **Broadcast vocabulary**: the closed set of events fragments exchange when they
//!   share nothing else ([`broadcast::BroadcastEvent`])
//!
//! ## Core Concepts
//!
//! - **State**: [`model::StoreState`], owned by exactly one store
//! - **Action**: [`commerce::StoreAction`], every mutation a fragment may request
//! - **Reducer**: `(State, Action, Environment) → Effect`, all business rules
//! - **Effect**: whether listeners must hear about the change
//! - **Environment**: injected dependencies (clock, order id scheme)
//!
//! The runtime that owns state and drives listeners lives in
//! `fragment-sync-runtime`.
//!
//! ## Example
//!
//! ```
//! use fragment_sync_core::commerce::{CommerceEnvironment, CommerceReducer, StoreAction};
//! use fragment_sync_core::environment::SystemClock;
//! use fragment_sync_core::reducer::Reducer;
//! use fragment_sync_core::seed;
//!
//! let mut state = seed::authoritative_state();
//! let env = CommerceEnvironment::authoritative(SystemClock);
//! let reducer = CommerceReducer::new();
//!
//! reducer.reduce(&mut state, StoreAction::add_to_cart("1", 2), &env);
//! assert_eq!(state.cart.quantity_of("1"), 2);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use rust_decimal::Decimal;

pub mod broadcast;
pub mod commerce;
pub mod contract;
pub mod discovery;
pub mod model;
pub mod seed;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → Effect`.
/// They mutate state in place and report whether anything observable happened.
pub mod reducer {
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for CartReducer {
    ///     type State = StoreState;
    ///     type Action = StoreAction;
    ///     type Environment = CommerceEnvironment<SystemClock>;
    ///
    ///     fn reduce(&self, state: &mut StoreState, action: StoreAction, env: &Self::Environment) -> Effect {
    ///         match action {
    ///             StoreAction::ClearCart => {
    ///                 state.cart.items.clear();
    ///                 Effect::Notify
    ///             }
    ///             _ => Effect::None,
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into a state change
        ///
        /// This is a deterministic function that:
        /// 1. Validates the action (leniently, invalid input degrades to a no-op)
        /// 2. Updates state in place
        /// 3. Returns whether subscribers must be notified
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Effect;
    }
}

/// Effect module - What a reduction asks of the runtime
pub mod effect {
    /// Effect type - describes what the runtime must do after a reduction
    ///
    /// Effects are descriptions, not execution. The store runtime reads them
    /// after the reducer returns and releases the state lock.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum Effect {
        /// Nothing observable happened; listeners are not called
        #[default]
        None,

        /// State transitioned; every current listener is called once
        Notify,
    }

    impl Effect {
        /// Combine two effects; a notify on either side wins
        #[must_use]
        pub const fn merge(self, other: Self) -> Self {
            match (self, other) {
                (Self::None, Self::None) => Self::None,
                _ => Self::Notify,
            }
        }

        /// Whether listeners must be notified
        #[must_use]
        pub const fn notifies(self) -> bool {
            matches!(self, Self::Notify)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic order dates
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[test]
    fn test_effect_merge_prefers_notify() {
        assert_eq!(Effect::None.merge(Effect::None), Effect::None);
        assert_eq!(Effect::None.merge(Effect::Notify), Effect::Notify);
        assert_eq!(Effect::Notify.merge(Effect::None), Effect::Notify);
        assert!(Effect::Notify.notifies());
        assert!(!Effect::default().notifies());
    }
}
