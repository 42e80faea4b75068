//! # gomarket-core: Pure Cart Logic for GoMarket
//!
//! This crate holds the cart reconciliation rules as pure functions with zero
//! I/O dependencies. Persistence lives in `gomarket-db`, orchestration in
//! `gomarket-cart`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GoMarket Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI layer (external)                          │   │
//! │  │    Catalog ──► "Add" button ──► Cart screen (+ / -)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ use_cart()                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 gomarket-cart (CartStore)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gomarket-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   cart    │  │   money   │  │ validation│  │   │
//! │  │   │ LineItem  │  │   Cart    │  │   Money   │  │ persisted │  │   │
//! │  │   │ NewLine.. │  │CartChange │  │  cents    │  │   data    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `LineItem`, `NewLineItem`, `CartTotals`
//! - [`cart`] - `Cart` and its merge/increment/decrement rules
//! - [`money`] - Integer-cents money for totals
//! - [`validation`] - Checks applied to persisted carts
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use gomarket_core::{Cart, NewLineItem};
//!
//! let mut cart = Cart::new();
//! let shirt = NewLineItem::new("a", "Shirt", "u", 10.0);
//!
//! cart.add_item(shirt.clone());
//! cart.add_item(shirt);
//! assert_eq!(cart.get("a").map(|i| i.quantity), Some(2));
//!
//! cart.decrement("a");
//! cart.decrement("a");
//! assert!(cart.is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartChange};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::{CartTotals, LineItem, NewLineItem};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Storage key the cart is persisted under.
///
/// Existing installations already hold data under this key, so it must not
/// change.
pub const CART_STORAGE_KEY: &str = "@GoMarketing/cart";
