//! # gomarket-db: Key-Value Storage for GoMarket
//!
//! Persisted client state lives behind the [`KeyValueStore`] trait: an async
//! `get`/`set` string store, the same contract a mobile app's local storage
//! offers.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GoMarket Data Flow                               │
//! │                                                                         │
//! │  CartStore persistence worker                                          │
//! │       │                                                                 │
//! │       ▼  set("@GoMarketing/cart", "[...]")                              │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     gomarket-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ KeyValueStore │    │  MemoryStore  │    │ SqliteStore  │  │   │
//! │  │   │   (kv.rs)     │◄───│  (memory.rs)  │    │  (pool.rs)   │  │   │
//! │  │   │               │◄───┼───────────────┼────│ + migrations │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite file: <data dir>/cart.db  (table kv_store)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gomarket_db::{DbConfig, KeyValueStore, SqliteStore};
//!
//! let store = SqliteStore::new(DbConfig::new("./cart.db")).await?;
//! store.set("@GoMarketing/cart", "[]").await?;
//! assert_eq!(store.get("@GoMarketing/cart").await?, Some("[]".to_string()));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod kv;
pub mod memory;
pub mod migrations;
pub mod pool;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StorageError, StorageResult};
pub use kv::KeyValueStore;
pub use memory::MemoryStore;
pub use pool::{DbConfig, SqliteStore};
