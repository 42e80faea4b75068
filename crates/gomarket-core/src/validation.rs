//! # Validation Module
//!
//! Checks applied to a cart decoded from storage.
//!
//! Mutations through [`crate::Cart`] can never break these rules; only data
//! written by someone else (or an older build) can. A cart that fails here is
//! treated the same as one that does not parse.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::LineItem;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a single persisted line item.
///
/// ## Rules
/// - `quantity` must be at least 1
/// - `price` must be finite
///
/// ```rust
/// use gomarket_core::{validation::validate_line_item, LineItem, NewLineItem};
///
/// let mut item = LineItem::from_new(NewLineItem::new("a", "Shirt", "u", 10.0));
/// assert!(validate_line_item(0, &item).is_ok());
///
/// item.quantity = 0;
/// assert!(validate_line_item(0, &item).is_err());
/// ```
pub fn validate_line_item(index: usize, item: &LineItem) -> ValidationResult<()> {
    if item.quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: format!("items[{}].quantity", index),
        });
    }

    if !item.price.is_finite() {
        return Err(ValidationError::NotFinite {
            field: format!("items[{}].price", index),
        });
    }

    Ok(())
}

/// Validates a whole persisted cart: every item, plus id uniqueness.
pub fn validate_items(items: &[LineItem]) -> ValidationResult<()> {
    let mut seen = HashSet::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        validate_line_item(index, item)?;

        if !seen.insert(item.id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "id".to_string(),
                value: item.id.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewLineItem;

    fn item(id: &str, quantity: u32) -> LineItem {
        let mut item = LineItem::from_new(NewLineItem::new(id, "T", "u", 1.0));
        item.quantity = quantity;
        item
    }

    #[test]
    fn test_valid_items() {
        assert!(validate_items(&[]).is_ok());
        assert!(validate_items(&[item("a", 1), item("b", 7)]).is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = validate_items(&[item("a", 1), item("b", 0)]).unwrap_err();
        assert_eq!(err.to_string(), "items[1].quantity must be positive");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = validate_items(&[item("a", 1), item("a", 2)]).unwrap_err();
        assert!(matches!(err, ValidationError::Duplicate { .. }));
    }

    #[test]
    fn test_non_finite_price_rejected() {
        let mut bad = item("a", 1);
        bad.price = f64::NAN;
        assert!(matches!(
            validate_line_item(0, &bad),
            Err(ValidationError::NotFinite { .. })
        ));
    }
}
