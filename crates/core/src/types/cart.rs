//! Shopping cart record.
//!
//! The cart is a plain value: lines plus a derived total. Every mutator
//! recomputes the total before returning, and deserialization recomputes it
//! too, so a `Cart` never carries a stale total no matter where it came from.
//! Totals use checked arithmetic; a change whose total would not fit in a
//! [`Decimal`] is refused and leaves the cart as it was.

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;

/// Cart changes that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("cart total is too large")]
    TotalOverflow,
    #[error("price for {0} cannot be negative")]
    NegativePrice(ProductId),
}

/// One cart line: a product snapshot and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price captured when the line was created.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

impl CartItem {
    /// Price times quantity for this line, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

fn sum_lines(items: &[CartItem]) -> Result<Decimal, CartError> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        item.line_total()
            .and_then(|line| total.checked_add(line))
            .ok_or(CartError::TotalOverflow)
    })
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredCart")]
pub struct Cart {
    items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
    /// Last time the cart was written to storage, at millisecond precision.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Wire shape accepted on read; the stored total is ignored.
#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    items: Vec<CartItem>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    timestamp: Option<DateTime<Utc>>,
}

impl TryFrom<StoredCart> for Cart {
    type Error = CartError;

    fn try_from(stored: StoredCart) -> Result<Self, Self::Error> {
        if let Some(item) = stored.items.iter().find(|i| i.price.is_sign_negative()) {
            return Err(CartError::NegativePrice(item.product_id.clone()));
        }
        Ok(Self {
            total: sum_lines(&stored.items)?,
            items: stored.items,
            timestamp: stored.timestamp.unwrap_or_else(now_millis),
        })
    }
}

/// The current time truncated to what the stored form keeps.
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

impl Default for Cart {
    fn default() -> Self {
        Self::empty()
    }
}

impl Cart {
    /// An empty cart stamped with the current time.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Decimal::ZERO,
            timestamp: now_millis(),
        }
    }

    /// Stamp the cart with the current time.
    pub fn touch(&mut self) {
        self.timestamp = now_millis();
    }

    /// Cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of price × quantity over all lines.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the line for a product.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line for the same product has its quantity increased;
    /// otherwise a new line is appended. Adding zero units changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] for a negative price or a total that would
    /// overflow; the cart is left unchanged.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Ok(());
        }
        if product.price.is_sign_negative() {
            return Err(CartError::NegativePrice(product.id.clone()));
        }

        let mut items = self.items.clone();
        match items.iter_mut().find(|item| item.product_id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => items.push(CartItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                price: product.price,
                image: product.image.clone(),
                quantity,
            }),
        }
        self.replace_items(items)
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalOverflow`] if the remaining total does not
    /// fit; the cart is left unchanged.
    pub fn remove(&mut self, product_id: &ProductId) -> Result<bool, CartError> {
        let before = self.items.len();
        let items: Vec<_> = self
            .items
            .iter()
            .filter(|item| &item.product_id != product_id)
            .cloned()
            .collect();
        if items.len() == before {
            return Ok(false);
        }
        self.replace_items(items)?;
        Ok(true)
    }

    /// Set the quantity of an existing line.
    ///
    /// Zero removes the line. Returns `false` when no line matches.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalOverflow`] if the new total does not fit;
    /// the cart is left unchanged.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<bool, CartError> {
        if quantity == 0 {
            return self.remove(product_id);
        }

        let mut items = self.items.clone();
        let Some(item) = items.iter_mut().find(|item| &item.product_id == product_id) else {
            return Ok(false);
        };
        item.quantity = quantity;
        self.replace_items(items)?;
        Ok(true)
    }

    fn replace_items(&mut self, items: Vec<CartItem>) -> Result<(), CartError> {
        self.total = sum_lines(&items)?;
        self.items = items;
        Ok(())
    }
}
