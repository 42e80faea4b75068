//! # Cart
//!
//! The ordered list of line items and the three rules that change it.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action              Cart Method            Change                  │
//! │  ─────────              ───────────            ──────                  │
//! │                                                                         │
//! │  "Add to cart" ───────► add_item(new) ───┬──► push(qty 1)   (new id)   │
//! │                                          └──► qty += 1      (known id) │
//! │                                                                         │
//! │  "+" ─────────────────► increment(id) ──────► qty += 1 | no-op         │
//! │                                                                         │
//! │  "-" ─────────────────► decrement(id) ───┬──► qty -= 1      (qty > 1)  │
//! │                                          ├──► remove        (qty == 1) │
//! │                                          └──► no-op         (unknown)  │
//! │                                                                         │
//! │  Positions never move: updates happen in place, removals close the gap │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{CartTotals, LineItem, NewLineItem};
use crate::validation;

/// What a cart operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// A new line item was appended with quantity 1.
    Added { id: String },

    /// An existing line item's quantity went up.
    Incremented { id: String, quantity: u32 },

    /// An existing line item's quantity went down and it stayed in the cart.
    Decremented { id: String, quantity: u32 },

    /// A line item reached quantity 0 and was removed.
    Removed { id: String },

    /// The id was not in the cart.
    Unchanged,

    /// A new item was refused because its price is not a finite number.
    Rejected { id: String },
}

impl CartChange {
    /// Returns true if the cart contents changed.
    pub fn is_change(&self) -> bool {
        !matches!(self, CartChange::Unchanged | CartChange::Rejected { .. })
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `id` (adding the same product increases quantity)
/// - Every item has `quantity >= 1`
/// - Insertion order is preserved
///
/// Serializes as a bare JSON array of line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from already-validated items.
    pub fn from_items(items: Vec<LineItem>) -> CoreResult<Self> {
        validation::validate_items(&items)?;
        Ok(Cart { items })
    }

    /// Decodes the persisted JSON array and checks the cart invariants.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let items: Vec<LineItem> = serde_json::from_str(json)?;
        Self::from_items(items)
    }

    /// Encodes the cart in its persisted form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Adds a product or bumps its quantity.
    ///
    /// ## Behavior
    /// - Known id: `quantity += 1`. The supplied title, image and price are
    ///   ignored; the first add wins.
    /// - Unknown id: appended at the end with quantity 1.
    /// - Unknown id with a NaN or infinite price: refused. Such a price would
    ///   persist as `null` and make the whole stored cart unreadable.
    pub fn add_item(&mut self, item: NewLineItem) -> CartChange {
        if let Some(existing) = self.get_mut(&item.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return CartChange::Incremented {
                id: item.id,
                quantity: existing.quantity,
            };
        }

        if !item.price.is_finite() {
            return CartChange::Rejected { id: item.id };
        }

        let id = item.id.clone();
        self.items.push(LineItem::from_new(item));
        CartChange::Added { id }
    }

    /// Raises the quantity of an item already in the cart by one.
    ///
    /// Unknown ids are ignored.
    pub fn increment(&mut self, id: &str) -> CartChange {
        match self.get_mut(id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1);
                CartChange::Incremented {
                    id: id.to_string(),
                    quantity: item.quantity,
                }
            }
            None => CartChange::Unchanged,
        }
    }

    /// Lowers the quantity of an item by one, removing it at zero.
    ///
    /// Unknown ids are ignored.
    pub fn decrement(&mut self, id: &str) -> CartChange {
        let Some(index) = self.position(id) else {
            return CartChange::Unchanged;
        };

        let item = &mut self.items[index];
        if item.quantity <= 1 {
            self.items.remove(index);
            return CartChange::Removed { id: id.to_string() };
        }

        item.quantity -= 1;
        CartChange::Decremented {
            id: id.to_string(),
            quantity: item.quantity,
        }
    }

    /// Returns the items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consumes the cart, returning its items.
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    /// Looks up an item by id.
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Index of an item by id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    /// Returns the number of distinct items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of all line totals.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Summary figures for display.
    pub fn totals(&self) -> CartTotals {
        CartTotals {
            item_count: self.len(),
            total_quantity: self.total_quantity(),
            subtotal: self.subtotal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn product(id: &str) -> NewLineItem {
        NewLineItem::new(id, format!("Product {}", id), format!("https://img/{}", id), 10.0)
    }

    fn ids(cart: &Cart) -> Vec<&str> {
        cart.items().iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_add_new_item_appends_with_quantity_one() {
        let mut cart = Cart::new();
        let input = NewLineItem::new("a", "Shirt", "u", 10.0);

        let change = cart.add_item(input.clone());

        assert_eq!(change, CartChange::Added { id: "a".into() });
        assert_eq!(cart.len(), 1);
        let item = &cart.items()[0];
        assert_eq!(item.id, input.id);
        assert_eq!(item.title, input.title);
        assert_eq!(item.image_url, input.image_url);
        assert_eq!(item.price, input.price);
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_add_existing_keeps_first_description() {
        let mut cart = Cart::new();
        cart.add_item(NewLineItem::new("a", "Shirt", "u", 10.0));

        let change = cart.add_item(NewLineItem::new("a", "Renamed", "other", 99.0));

        assert_eq!(
            change,
            CartChange::Incremented {
                id: "a".into(),
                quantity: 2
            }
        );
        assert_eq!(cart.len(), 1);
        let item = cart.get("a").unwrap();
        assert_eq!(item.title, "Shirt");
        assert_eq!(item.image_url, "u");
        assert_eq!(item.price, 10.0);
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_add_rejects_non_finite_price() {
        let mut cart = Cart::new();
        cart.add_item(NewLineItem::new("a", "Shirt", "u", 10.0));

        for price in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let change = cart.add_item(NewLineItem::new("b", "Hat", "u", price));
            assert_eq!(change, CartChange::Rejected { id: "b".into() });
            assert!(!change.is_change());
        }
        assert_eq!(cart.len(), 1);

        // The stored form stays readable
        let restored = Cart::from_json(&cart.to_json().unwrap()).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_add_existing_ignores_non_finite_price() {
        let mut cart = Cart::new();
        cart.add_item(NewLineItem::new("a", "Shirt", "u", 10.0));

        assert_eq!(
            cart.add_item(NewLineItem::new("a", "Shirt", "u", f64::NAN)),
            CartChange::Incremented { id: "a".into(), quantity: 2 }
        );
        assert_eq!(cart.get("a").map(|i| i.price), Some(10.0));
    }

    #[test]
    fn test_increment_unknown_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(product("a"));
        let before = cart.clone();

        assert_eq!(cart.increment("missing"), CartChange::Unchanged);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_decrement_unknown_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(product("a"));
        let before = cart.clone();

        assert_eq!(cart.decrement("missing"), CartChange::Unchanged);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_decrement_at_one_removes() {
        let mut cart = Cart::new();
        cart.add_item(product("a"));
        cart.add_item(product("b"));

        let change = cart.decrement("a");

        assert_eq!(change, CartChange::Removed { id: "a".into() });
        assert_eq!(cart.len(), 1);
        assert!(cart.get("a").is_none());
        assert_eq!(ids(&cart), vec!["b"]);
    }

    #[test]
    fn test_decrement_above_one_keeps_position() {
        let mut cart = Cart::new();
        cart.add_item(product("a"));
        cart.add_item(product("b"));
        cart.add_item(product("c"));
        cart.increment("b");
        cart.increment("b");

        let change = cart.decrement("b");

        assert_eq!(
            change,
            CartChange::Decremented {
                id: "b".into(),
                quantity: 2
            }
        );
        assert_eq!(cart.position("b"), Some(1));
        assert_eq!(cart.get("b").unwrap().quantity, 2);
    }

    #[test]
    fn test_increment_does_not_reorder() {
        let mut cart = Cart::new();
        cart.add_item(product("a"));
        cart.add_item(product("b"));
        assert_eq!(ids(&cart), vec!["a", "b"]);

        cart.increment("a");

        assert_eq!(ids(&cart), vec!["a", "b"]);
        assert_eq!(cart.get("a").unwrap().quantity, 2);
    }

    #[test]
    fn test_shirt_scenario() {
        let mut cart = Cart::new();
        let shirt = NewLineItem::new("a", "Shirt", "u", 10.0);

        cart.add_item(shirt.clone());
        assert_eq!(cart.get("a").unwrap().quantity, 1);

        cart.add_item(shirt);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("a").unwrap().quantity, 2);

        cart.decrement("a");
        assert_eq!(cart.get("a").unwrap().quantity, 1);

        cart.decrement("a");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_never_below_one() {
        let mut cart = Cart::new();
        let ops: [(&str, &str); 12] = [
            ("add", "a"),
            ("dec", "a"),
            ("dec", "a"),
            ("add", "b"),
            ("inc", "b"),
            ("add", "a"),
            ("dec", "b"),
            ("dec", "b"),
            ("dec", "b"),
            ("inc", "z"),
            ("add", "a"),
            ("dec", "a"),
        ];

        for (op, id) in ops {
            match op {
                "add" => {
                    cart.add_item(product(id));
                }
                "inc" => {
                    cart.increment(id);
                }
                _ => {
                    cart.decrement(id);
                }
            }
            assert!(cart.items().iter().all(|i| i.quantity >= 1));
        }

        assert_eq!(ids(&cart), vec!["a"]);
        assert_eq!(cart.get("a").unwrap().quantity, 1);
    }

    #[test]
    fn test_json_round_trip_preserves_order_and_fields() {
        let mut cart = Cart::new();
        cart.add_item(NewLineItem::new("b", "Mug", "m", 4.5));
        cart.add_item(NewLineItem::new("a", "Shirt", "u", 10.0));
        cart.increment("a");

        let json = cart.to_json().unwrap();
        assert!(json.starts_with('['));

        let restored = Cart::from_json(&json).unwrap();
        assert_eq!(restored, cart);
        assert_eq!(ids(&restored), vec!["b", "a"]);
    }

    #[test]
    fn test_from_json_rejects_wrong_shape() {
        let err = Cart::from_json(r#"{"id":"a"}"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedCart(_)));

        let err = Cart::from_json("not json").unwrap_err();
        assert!(matches!(err, CoreError::MalformedCart(_)));
    }

    #[test]
    fn test_from_json_rejects_zero_quantity() {
        let err = Cart::from_json(
            r#"[{"id":"a","title":"Shirt","image_url":"u","price":10,"quantity":0}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add_item(NewLineItem::new("a", "Shirt", "u", 10.0));
        cart.add_item(NewLineItem::new("b", "Mug", "m", 2.99));
        cart.increment("b");

        let totals = cart.totals();
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.subtotal.cents(), 1598);
    }

    #[test]
    fn test_increment_saturates() {
        let mut cart = Cart::from_items(vec![LineItem {
            id: "a".into(),
            title: "Shirt".into(),
            image_url: "u".into(),
            price: 1.0,
            quantity: u32::MAX,
        }])
        .unwrap();

        cart.increment("a");
        assert_eq!(cart.get("a").unwrap().quantity, u32::MAX);
    }
}
