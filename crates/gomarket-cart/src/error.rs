//! # Cart Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │  Serialization  │  │       Storage           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  OutsideProvider│  │  Serialization  │  │  Storage                │ │
//! │  │  InvalidConfig  │  │  (hydrate only) │  │  (read/write failed)    │ │
//! │  │  ConfigLoad...  │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Mutations never return errors. Write failures go to the               │
//! │  persistence error channel instead (see PersistenceFailure).           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use gomarket_core::CoreError;
use gomarket_db::StorageError;
use thiserror::Error;

/// Result type alias for cart operations.
pub type CartResult<T> = Result<T, CartError>;

/// Errors surfaced by the cart store and its wiring.
#[derive(Debug, Error)]
pub enum CartError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// `use_cart()` was called with no store provided to the current scope.
    ///
    /// This is a wiring bug; callers should let it propagate.
    #[error("accessor used outside provider")]
    OutsideProvider,

    /// Invalid cart configuration.
    #[error("Invalid cart configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Serialization Errors
    // =========================================================================
    /// Persisted cart data exists but is not a valid cart.
    #[error("Persisted cart is unreadable: {0}")]
    Serialization(#[from] CoreError),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// The key-value store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// The background writer is gone (runtime shut down).
    #[error("Persistence worker has stopped")]
    WorkerStopped,
}

impl From<std::io::Error> for CartError {
    fn from(err: std::io::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CartError {
    fn from(err: toml::de::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CartError {
    fn from(err: toml::ser::Error) -> Self {
        CartError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl CartError {
    /// Returns true if this error indicates a wiring or settings problem.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CartError::OutsideProvider
                | CartError::InvalidConfig(_)
                | CartError::ConfigLoadFailed(_)
                | CartError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if persisted data could not be decoded.
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, CartError::Serialization(_))
    }

    /// Returns true if the underlying storage failed.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, CartError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomarket_core::ValidationError;

    #[test]
    fn test_outside_provider_message() {
        let err = CartError::OutsideProvider;
        assert_eq!(err.to_string(), "accessor used outside provider");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_categories() {
        let err: CartError = CoreError::MalformedCart("eof".into()).into();
        assert!(err.is_serialization_error());
        assert!(!err.is_storage_error());

        let err: CartError = StorageError::Closed.into();
        assert!(err.is_storage_error());
        assert!(!err.is_configuration_error());

        let err: CartError = CoreError::from(ValidationError::MustBePositive {
            field: "items[0].quantity".into(),
        })
        .into();
        assert!(err.to_string().contains("items[0].quantity must be positive"));
    }
}
