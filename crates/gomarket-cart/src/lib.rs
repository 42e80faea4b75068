//! # gomarket-cart: Persisted Shopping Cart
//!
//! The cart store a UI layer talks to. It keeps the cart in memory, answers
//! reads synchronously and writes every change behind the caller's back.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Cart Data Flow                                 │
//! │                                                                         │
//! │  UI ──► use_cart()? ──► CartStore ──► Cart (gomarket-core rules)        │
//! │                            │    │                                      │
//! │                            │    └──► watch: re-render on change        │
//! │                            ▼                                            │
//! │                   PersistenceWorker ──► KeyValueStore (gomarket-db)    │
//! │                            │              MemoryStore | SqliteStore     │
//! │                            ▼                                            │
//! │                   broadcast: PersistenceFailure                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`store`] - `CartStore`: hydrate and the three mutations
//! - [`persistence`] - Background writer and failure reports
//! - [`provider`] - `CartProvider` scopes and `use_cart()`
//! - [`config`] - TOML + environment configuration
//! - [`telemetry`] - `tracing` subscriber setup
//! - [`error`] - `CartError`
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use gomarket_cart::{init_tracing, use_cart, CartConfig, CartProvider, CartStore, NewLineItem};
//!
//! let config = CartConfig::load_or_default(None);
//! init_tracing(&config.logging.filter);
//!
//! let store = CartStore::open_with_config(&config).await?;
//! CartProvider::new(store)
//!     .scope(async {
//!         let cart = use_cart()?;
//!         cart.add_to_cart(NewLineItem::new("sku-1", "Coffee", "https://…/c.png", 4.5));
//!         Ok::<_, gomarket_cart::CartError>(())
//!     })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod persistence;
pub mod provider;
pub mod store;
pub mod telemetry;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::{CartConfig, LoggingSettings, PersistenceSettings, StorageBackend, StorageSettings};
pub use error::{CartError, CartResult};
pub use persistence::PersistenceFailure;
pub use provider::{use_cart, CartProvider};
pub use store::{CartStore, HydrateOutcome};
pub use telemetry::init_tracing;

pub use gomarket_core::{Cart, CartChange, CartTotals, LineItem, Money, NewLineItem, CART_STORAGE_KEY};
pub use gomarket_db::{KeyValueStore, MemoryStore, SqliteStore};
