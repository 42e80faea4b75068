//! # Cart Provider
//!
//! Makes one [`CartStore`] available to everything running inside a scope,
//! without a global.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  provider.scope(async {                                                │
//! │      let cart = use_cart()?;   ← Ok(store)                             │
//! │      cart.add_to_cart(item);                                           │
//! │  })                                                                    │
//! │                                                                         │
//! │  use_cart()                    ← Err(OutsideProvider)                  │
//! │                                                                         │
//! │  Scopes nest; the innermost provider wins. tokio::spawn'd tasks start  │
//! │  outside every scope and need their own provider.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;

use crate::error::{CartError, CartResult};
use crate::store::CartStore;

tokio::task_local! {
    static CURRENT_CART: CartStore;
}

/// Installs a store for the duration of a scope.
#[derive(Debug, Clone)]
pub struct CartProvider {
    store: CartStore,
}

impl CartProvider {
    /// Wraps `store`; nothing is installed until a scope runs.
    pub fn new(store: CartStore) -> Self {
        CartProvider { store }
    }

    /// The provided store.
    pub fn store(&self) -> &CartStore {
        &self.store
    }

    /// Runs `future` with the store available to [`use_cart`].
    pub async fn scope<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_CART.scope(self.store.clone(), future).await
    }

    /// Runs `f` with the store available to [`use_cart`].
    pub fn sync_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT_CART.sync_scope(self.store.clone(), f)
    }
}

/// Returns the store of the innermost enclosing [`CartProvider`] scope.
///
/// ## Errors
/// [`CartError::OutsideProvider`] when no provider scope is active.
pub fn use_cart() -> CartResult<CartStore> {
    CURRENT_CART
        .try_with(CartStore::clone)
        .map_err(|_| CartError::OutsideProvider)
}
