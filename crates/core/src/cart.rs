//! Session-scoped shopping cart.
//!
//! The cart is a keyed collection of line items. Every operation is
//! synchronous and total: an unknown line id is ignored rather than reported.
//! Totals are recomputed on every read.

use serde::{Deserialize, Serialize};

use crate::types::Naira;

/// A product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Catalog product id.
    pub id: String,
    /// Product name at the time it was added.
    pub name: String,
    /// Unit price at the time it was added.
    pub price: Naira,
    /// Quantity, always at least 1.
    pub quantity: u32,
    /// Primary product image URL.
    pub image: Option<String>,
}

impl CartLine {
    /// Price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Naira {
        self.price * self.quantity
    }
}

/// Line items in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add an item.
    ///
    /// Adding an id that is already present increases that line's quantity
    /// instead of creating a second line. A quantity of zero counts as one.
    pub fn add(&mut self, mut item: CartLine) {
        item.quantity = item.quantity.max(1);
        if let Some(line) = self.line_mut(&item.id) {
            line.quantity = line.quantity.saturating_add(item.quantity);
        } else {
            self.lines.push(item);
        }
    }

    /// Increase a line's quantity by one.
    pub fn increment(&mut self, id: &str) {
        if let Some(line) = self.line_mut(id) {
            line.quantity = line.quantity.saturating_add(1);
        }
    }

    /// Decrease a line's quantity by one, never below one.
    pub fn decrement(&mut self, id: &str) {
        if let Some(line) = self.line_mut(id)
            && line.quantity > 1
        {
            line.quantity -= 1;
        }
    }

    /// Remove a line entirely.
    pub fn remove(&mut self, id: &str) {
        self.lines.retain(|line| line.id != id);
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Line items in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn line(&self, id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Naira {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    fn line_mut(&mut self, id: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.id == id)
    }
}
