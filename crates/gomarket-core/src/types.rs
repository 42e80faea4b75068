//! # Domain Types
//!
//! Line items and the derived cart totals.
//!
//! ## Persisted Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One LineItem in storage (JSON object inside the cart array)           │
//! │                                                                         │
//! │  {                                                                      │
//! │    "id": "a",              ← product id, unique within the cart        │
//! │    "title": "Shirt",                                                    │
//! │    "image_url": "u",       ← snake_case on the wire                    │
//! │    "price": 10,            ← JSON number (f64)                         │
//! │    "quantity": 2           ← always ≥ 1                                │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names are a compatibility contract with data already on devices.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// New Line Item
// =============================================================================

/// A product as handed to `add_to_cart`: a line item without a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLineItem {
    /// Product identifier. Must be non-empty; not validated here.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Product image location.
    pub image_url: String,

    /// Unit price in major currency units.
    pub price: f64,
}

impl NewLineItem {
    /// Creates a new line item description.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Self {
        NewLineItem {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product entry in the cart.
///
/// ## Invariants
/// - `quantity >= 1` while the item is in a cart
/// - descriptive fields are frozen at first add
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Product identifier, unique within a cart.
    pub id: String,

    /// Display title (frozen at first add).
    pub title: String,

    /// Product image location (frozen at first add).
    pub image_url: String,

    /// Unit price in major currency units (frozen at first add).
    pub price: f64,

    /// Units of this product in the cart.
    pub quantity: u32,
}

impl LineItem {
    /// Creates the line item for a first add (quantity 1).
    pub fn from_new(item: NewLineItem) -> Self {
        LineItem {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
            quantity: 1,
        }
    }

    /// Unit price rounded to cents.
    pub fn unit_price(&self) -> Money {
        Money::from_major(self.price)
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Cart summary for display. Derived, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    /// Number of distinct products.
    pub item_count: usize,

    /// Sum of all quantities.
    pub total_quantity: u64,

    /// Sum of all line totals.
    pub subtotal: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_new_starts_at_one() {
        let item = LineItem::from_new(NewLineItem::new("a", "Shirt", "u", 10.0));
        assert_eq!(item.quantity, 1);
        assert_eq!(item.id, "a");
        assert_eq!(item.title, "Shirt");
        assert_eq!(item.image_url, "u");
        assert_eq!(item.price, 10.0);
    }

    #[test]
    fn test_line_total() {
        let mut item = LineItem::from_new(NewLineItem::new("a", "Shirt", "u", 2.99));
        item.quantity = 3;
        assert_eq!(item.line_total().cents(), 897);
    }

    #[test]
    fn test_wire_field_names() {
        let item = LineItem::from_new(NewLineItem::new("a", "Shirt", "u", 10.0));
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": "a",
                "title": "Shirt",
                "image_url": "u",
                "price": 10.0,
                "quantity": 1
            })
        );
    }

    #[test]
    fn test_accepts_integer_price() {
        let item: LineItem = serde_json::from_str(
            r#"{"id":"a","title":"Shirt","image_url":"u","price":10,"quantity":2}"#,
        )
        .unwrap();
        assert_eq!(item.price, 10.0);
        assert_eq!(item.quantity, 2);
    }
}
