//! # Key-Value Store Contract
//!
//! The storage collaborator every backend implements.

use async_trait::async_trait;

use crate::error::StorageResult;

/// An async string key-value store.
///
/// ## Contract
/// - `get` returns exactly the last value `set` under the key, or `None`
/// - `set` replaces any previous value
/// - `remove` on a missing key is not an error
///
/// Implementors must be `Send + Sync`; the cart store shares one instance
/// between its handle and its background writer.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Deletes the value stored under `key`.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}
