//! Seed data for authoritative and fallback stores.

use crate::commerce::{host_mock_user, standalone_mock_user};
use crate::model::{Cart, CartItem, Notification, Order, OrderId, Product, ProductId, StoreState};
use chrono::NaiveDate;
use rust_decimal::Decimal;

const DEFAULT_DESCRIPTION: &str = "Local product for standalone mode";

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn product(id: u32, name: String, price: Decimal, image: String, description: &str) -> Product {
    Product {
        id: ProductId::new(id.to_string()),
        name,
        price,
        image,
        description: description.to_string(),
    }
}

fn order(id: u64, on: NaiveDate, total: Decimal, items: Vec<CartItem>) -> Order {
    Order {
        id: OrderId::new(id),
        date: on,
        total,
        items,
    }
}

fn notification(id: &str, message: &str, read: bool) -> Notification {
    Notification {
        id: id.to_string(),
        message: message.to_string(),
        read,
    }
}

/// Generated catalog of the authoritative store: 12 products priced `10 + 2.5 * i`
#[must_use]
pub fn generated_products() -> Vec<Product> {
    (1..=12u32)
        .map(|i| {
            Product {
                id: ProductId::new(i.to_string()),
                name: format!("Product {i}"),
                price: Decimal::TEN + Decimal::new(25, 1) * Decimal::from(i),
                image: format!("https://picsum.photos/seed/p{i}/300/200"),
                description: format!(
                    "This is a great product number {i} with awesome features and premium quality."
                ),
            }
        })
        .collect()
}

/// Realistic state the authoritative store starts from
#[must_use]
pub fn authoritative_state() -> StoreState {
    StoreState {
        products: generated_products(),
        cart: Cart::default(),
        orders: vec![
            order(
                1003,
                date(2025, 8, 2),
                Decimal::new(12950, 2),
                vec![CartItem::new("4", 3), CartItem::new("5", 1)],
            ),
            order(
                1002,
                date(2025, 1, 18),
                Decimal::new(5999, 2),
                vec![CartItem::new("3", 1)],
            ),
            order(
                1001,
                date(2024, 12, 4),
                Decimal::new(8997, 2),
                vec![CartItem::new("1", 1), CartItem::new("2", 2)],
            ),
        ],
        user: Some(host_mock_user()),
        notifications: vec![
            notification("n1", "Your order #1003 has shipped", false),
            notification("n2", "New discount on Product 7", true),
        ],
    }
}

/// Fragments that carry their own placeholder data for standalone mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentSeed {
    /// Product catalog fragment
    Catalog,
    /// Cart widget and order history fragment
    CartOrders,
    /// Header with user and notification bell
    Header,
    /// Product details fragment
    Details,
}

impl FragmentSeed {
    /// Every known fragment seed
    pub const ALL: [Self; 4] = [Self::Catalog, Self::CartOrders, Self::Header, Self::Details];

    /// Fragment name used in logs and registry lookups
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::CartOrders => "cart-orders",
            Self::Header => "header",
            Self::Details => "details",
        }
    }

    /// Minimal placeholder state for this fragment's fallback store
    #[must_use]
    pub fn state(self) -> StoreState {
        match self {
            Self::Catalog => StoreState {
                products: (0..8u32)
                    .map(|i| {
                        product(
                            i + 1,
                            format!("Local P{}", i + 1),
                            Decimal::new(999, 2) + Decimal::from(i),
                            format!("https://picsum.photos/seed/cat{i}/300/200"),
                            DEFAULT_DESCRIPTION,
                        )
                    })
                    .collect(),
                ..StoreState::default()
            },
            Self::CartOrders => StoreState {
                products: (0..4u32)
                    .map(|i| {
                        product(
                            i + 1,
                            format!("Local Product {}", i + 1),
                            Decimal::new(125, 1) + Decimal::from(i * 3),
                            format!("https://picsum.photos/seed/cart{i}/300/200"),
                            DEFAULT_DESCRIPTION,
                        )
                    })
                    .collect(),
                cart: Cart {
                    items: vec![CartItem::new("1", 1), CartItem::new("2", 2)],
                },
                orders: vec![
                    order(2003, date(2025, 9, 10), Decimal::new(2200, 2), vec![
                        CartItem::new("3", 1),
                    ]),
                    order(2002, date(2025, 8, 18), Decimal::new(5949, 2), vec![
                        CartItem::new("2", 2),
                    ]),
                    order(2001, date(2025, 8, 1), Decimal::new(3999, 2), vec![
                        CartItem::new("1", 1),
                    ]),
                ],
                user: Some(standalone_mock_user()),
                notifications: Vec::new(),
            },
            Self::Header => StoreState {
                products: vec![product(
                    1,
                    "Local Product".to_string(),
                    Decimal::new(1999, 2),
                    "https://picsum.photos/seed/local/300/200".to_string(),
                    DEFAULT_DESCRIPTION,
                )],
                user: Some(standalone_mock_user()),
                notifications: vec![notification(
                    "n-local",
                    "Welcome to standalone header",
                    false,
                )],
                ..StoreState::default()
            },
            Self::Details => StoreState {
                products: vec![product(
                    1,
                    "Local Product 1".to_string(),
                    Decimal::new(1299, 2),
                    "https://picsum.photos/seed/d1/600/320".to_string(),
                    "Local details product",
                )],
                ..StoreState::default()
            },
        }
    }
}
