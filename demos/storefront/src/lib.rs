//! # Storefront Demo
//!
//! Fragments of a small storefront, written the way independently deployed
//! teams would write them:
//!
//! - [`views`]: fragments that resolve a [`SharedStore`] and re-derive their
//!   view whenever it notifies
//! - [`checkout`]: fragments that share nothing but the broadcast channel
//!
//! [`SharedStore`]: fragment_sync_core::contract::SharedStore

/// Broadcast-only product cards and shopping cart
pub mod checkout;

/// Store-backed derived views
pub mod views;

pub use checkout::{ProductCard, ShoppingCart, receipt_code};
pub use views::DerivedView;
