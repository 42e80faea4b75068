//! # Error Types
//!
//! Domain-specific error types for gomarket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gomarket-core errors (this file)                                      │
//! │  ├── CoreError        - Persisted cart could not be decoded            │
//! │  └── ValidationError  - Decoded cart breaks an invariant               │
//! │                                                                         │
//! │  gomarket-db errors (separate crate)                                   │
//! │  └── StorageError     - Key-value read/write failures                  │
//! │                                                                         │
//! │  gomarket-cart errors                                                  │
//! │  └── CartError        - What the UI layer sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CartError::Serialization          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while turning persisted data back into a [`crate::Cart`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// The stored value is not a JSON array of line items.
    ///
    /// ## When This Occurs
    /// - Storage was written by something other than this crate
    /// - A field is missing or has the wrong type
    /// - The value was truncated mid-write
    #[error("Malformed cart data: {0}")]
    MalformedCart(String),

    /// The stored value parsed but breaks a cart invariant.
    #[error("Invalid cart data: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::MalformedCart(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Cart invariant violations.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Duplicate value (e.g., two line items with the same id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Value is not a finite number.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
