//! # Cart Store
//!
//! The single owner of the shopping cart: in-memory state, hydration from
//! storage and write-behind persistence.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CartStore Lifecycle                              │
//! │                                                                         │
//! │  CartStore::open(storage, key)                                         │
//! │       │                                                                 │
//! │       ├── new(): empty cart, spawn persistence worker                  │
//! │       │                                                                 │
//! │       └── hydrate(): storage.get(key)                                  │
//! │              absent   → stay empty                                     │
//! │              valid    → replace state                                  │
//! │              corrupt  → warn!, stay empty (hydrate() alone returns Err)│
//! │                                                                         │
//! │  UI action           CartStore              Effect                     │
//! │  ─────────           ─────────              ──────                     │
//! │  Add button ───────► add_to_cart(item) ───► append or qty += 1        │
//! │  Plus button ──────► increment(id) ───────► qty += 1 (unknown: no-op) │
//! │  Minus button ─────► decrement(id) ───────► qty -= 1, remove at 0     │
//! │                                                                         │
//! │  Every mutation, including no-ops:                                     │
//! │    1. lock state, apply change                                         │
//! │    2. notify subscribers (watch) when something changed                │
//! │    3. queue snapshot for the persistence worker                        │
//! │    4. unlock, return without waiting for storage                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! The cart sits behind a `std::sync::Mutex`. The lock is never held across
//! an `.await`, and snapshots are queued while it is held, so the order
//! writes reach storage matches the order mutations were applied.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use gomarket_core::{Cart, CartChange, CartTotals, LineItem, NewLineItem};
use gomarket_db::{DbConfig, KeyValueStore, MemoryStore, SqliteStore};

use crate::config::{CartConfig, PersistenceSettings, StorageBackend};
use crate::error::{CartError, CartResult};
use crate::persistence::{PersistenceFailure, PersistenceHandle, PersistenceWorker};

/// Result of [`CartStore::hydrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateOutcome {
    /// Persisted state was found and loaded.
    Restored { items: usize },

    /// Nothing stored under the key; the cart was left as it was.
    Empty,
}

struct Inner {
    cart: Mutex<Cart>,
    key: String,
    storage: Arc<dyn KeyValueStore>,
    writer: PersistenceHandle,
    changes: watch::Sender<Cart>,
    errors: broadcast::Sender<PersistenceFailure>,
}

/// Shared handle to the cart. Clones refer to the same cart.
///
/// ## Usage
/// ```rust,ignore
/// let store = CartStore::open(MemoryStore::new(), CART_STORAGE_KEY).await?;
///
/// store.add_to_cart(NewLineItem::new("sku-1", "Coffee", "https://…/c.png", 4.5));
/// store.increment("sku-1");
/// store.decrement("sku-1");
///
/// for item in store.items() {
///     println!("{} × {}", item.title, item.quantity);
/// }
/// ```
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.inner.key)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Creates an empty store over `storage` with default persistence settings.
    ///
    /// Nothing is read from storage; call [`hydrate`](Self::hydrate) or use
    /// [`open`](Self::open).
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn new<S>(storage: S, key: impl Into<String>) -> Self
    where
        S: KeyValueStore + 'static,
    {
        Self::with_settings(storage, key, PersistenceSettings::default())
    }

    /// Creates an empty store with explicit persistence settings.
    pub fn with_settings<S>(storage: S, key: impl Into<String>, settings: PersistenceSettings) -> Self
    where
        S: KeyValueStore + 'static,
    {
        Self::from_shared(Arc::new(storage), key.into(), settings)
    }

    fn from_shared(
        storage: Arc<dyn KeyValueStore>,
        key: String,
        settings: PersistenceSettings,
    ) -> Self {
        let (errors, _) = broadcast::channel(settings.error_channel_capacity.max(1));
        let (changes, _) = watch::channel(Cart::new());
        let writer = PersistenceWorker::spawn(storage.clone(), key.clone(), settings, errors.clone());

        CartStore {
            inner: Arc::new(Inner {
                cart: Mutex::new(Cart::new()),
                key,
                storage,
                writer,
                changes,
                errors,
            }),
        }
    }

    /// Creates a store and restores whatever is persisted under `key`.
    ///
    /// Unreadable persisted data is logged and the cart starts empty; the
    /// next mutation overwrites it. A failing read is returned.
    pub async fn open<S>(storage: S, key: impl Into<String>) -> CartResult<Self>
    where
        S: KeyValueStore + 'static,
    {
        let store = Self::new(storage, key);
        store.hydrate_or_empty().await?;
        Ok(store)
    }

    /// Builds the configured backend and opens the store on it.
    pub async fn open_with_config(config: &CartConfig) -> CartResult<Self> {
        config.validate()?;

        let storage: Arc<dyn KeyValueStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Sqlite => {
                let path = config.database_path().ok_or_else(|| {
                    CartError::InvalidConfig("No database path available".into())
                })?;
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .map_err(|e| CartError::InvalidConfig(e.to_string()))?;
                    }
                }
                let db_config = DbConfig::new(path).connect_timeout(config.connect_timeout());
                Arc::new(SqliteStore::new(db_config).await?)
            }
        };

        info!(
            backend = %config.storage.backend,
            key = %config.key(),
            "Opening cart store"
        );

        let store = Self::from_shared(
            storage,
            config.key().to_string(),
            config.persistence.clone(),
        );
        store.hydrate_or_empty().await?;
        Ok(store)
    }

    async fn hydrate_or_empty(&self) -> CartResult<()> {
        match self.hydrate().await {
            Ok(_) => Ok(()),
            Err(CartError::Serialization(e)) => {
                warn!(
                    key = %self.inner.key,
                    error = %e,
                    "Discarding unreadable persisted cart, starting empty"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    /// Loads the persisted cart into memory.
    ///
    /// ## Returns
    /// * `Ok(Restored)` - State replaced with the persisted cart
    /// * `Ok(Empty)` - Nothing stored; state untouched
    /// * `Err(Serialization)` - Stored value is not a valid cart; state untouched
    /// * `Err(Storage)` - The read failed
    pub async fn hydrate(&self) -> CartResult<HydrateOutcome> {
        let Some(json) = self.inner.storage.get(&self.inner.key).await? else {
            info!(key = %self.inner.key, "No persisted cart found");
            return Ok(HydrateOutcome::Empty);
        };

        let cart = Cart::from_json(&json)?;
        let items = cart.len();

        {
            let mut state = self.lock();
            *state = cart.clone();
            self.inner.changes.send_replace(cart);
        }

        info!(key = %self.inner.key, items, "Cart hydrated");
        Ok(HydrateOutcome::Restored { items })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds a product, or bumps its quantity if it is already in the cart.
    pub fn add_to_cart(&self, item: NewLineItem) -> CartChange {
        self.mutate("add_to_cart", |cart| cart.add_item(item))
    }

    /// Increases the quantity of `id` by one. Unknown ids are ignored.
    pub fn increment(&self, id: &str) -> CartChange {
        self.mutate("increment", |cart| cart.increment(id))
    }

    /// Decreases the quantity of `id` by one, removing it when it reaches
    /// zero. Unknown ids are ignored.
    pub fn decrement(&self, id: &str) -> CartChange {
        self.mutate("decrement", |cart| cart.decrement(id))
    }

    fn mutate<F>(&self, operation: &'static str, f: F) -> CartChange
    where
        F: FnOnce(&mut Cart) -> CartChange,
    {
        let mut cart = self.lock();
        let change = f(&mut cart);

        if let CartChange::Rejected { id } = &change {
            warn!(operation, id = %id, "Refusing line item with a non-finite price");
        } else {
            debug!(operation, ?change, items = cart.len(), "Cart mutated");
        }

        if change.is_change() {
            self.inner.changes.send_replace(cart.clone());
        }
        // No-ops are persisted too
        self.inner.writer.persist(cart.clone());

        change
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the current line items, in insertion order.
    pub fn items(&self) -> Vec<LineItem> {
        self.lock().items().to_vec()
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let has_coffee = store.with_cart(|cart| cart.get("sku-1").is_some());
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.lock();
        f(&cart)
    }

    /// Item count, unit count and subtotal.
    pub fn totals(&self) -> CartTotals {
        self.lock().totals()
    }

    /// Receiver that sees the cart after every change and after hydration.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.changes.subscribe()
    }

    /// Receiver for writes that failed after all retries.
    ///
    /// Only failures that happen after subscribing are delivered.
    pub fn persistence_errors(&self) -> broadcast::Receiver<PersistenceFailure> {
        self.inner.errors.subscribe()
    }

    /// Waits until every write queued before this call has finished.
    pub async fn flush(&self) -> CartResult<()> {
        self.inner.writer.flush().await
    }

    /// Storage key the cart is persisted under.
    pub fn storage_key(&self) -> &str {
        &self.inner.key
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        // Only a panicking with_cart reader can poison the lock
        self.inner.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
