//! Cart engine.
//!
//! The cart lives only in the local store; there is no server cart. Each
//! mutation loads the stored cart, applies the change, persists it and
//! publishes a [`CartUpdated`] event for whatever is rendering the cart badge
//! and totals.

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use karthik_core::{Cart, CartError, CurrencyConverter, Product, ProductId, format_usd};

use crate::storage::StorageManager;
use crate::store::{LocalStore, StoreError};

/// Buffered events per subscriber before slow receivers start lagging.
const EVENT_CAPACITY: usize = 32;

/// Errors from a cart mutation.
#[derive(Debug, Error)]
pub enum CartUpdateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The change was refused; the stored cart is untouched.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Published after every cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartUpdated {
    pub item_count: u64,
    /// Total in catalog currency (USD).
    pub total: Decimal,
    /// Total formatted for display, converted if the engine has a converter.
    pub display_total: String,
}

/// Cart operations over a [`StorageManager`].
pub struct CartEngine<S> {
    storage: StorageManager<S>,
    currency: Option<CurrencyConverter>,
    events: broadcast::Sender<CartUpdated>,
}

impl<S: LocalStore> CartEngine<S> {
    /// Create an engine. With a `currency` converter, display totals are
    /// shown in INR; without one they are shown in USD.
    #[must_use]
    pub fn new(storage: StorageManager<S>, currency: Option<CurrencyConverter>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage,
            currency,
            events,
        }
    }

    /// Receive a [`CartUpdated`] for every subsequent mutation.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartUpdated> {
        self.events.subscribe()
    }

    /// The current cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn cart(&self) -> Result<Cart, StoreError> {
        self.storage.cart()
    }

    /// Add `quantity` of `product`, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartUpdateError::Cart`] if the cart refuses the change, or
    /// [`CartUpdateError::Store`] if the store cannot be read or written.
    pub fn add_item(&self, product: &Product, quantity: u32) -> Result<Cart, CartUpdateError> {
        let mut cart = self.storage.cart()?;
        if let Err(e) = cart.add(product, quantity) {
            warn!(product_id = %product.id, quantity, error = %e, "cart add refused");
            return Err(e.into());
        }
        debug!(product_id = %product.id, quantity, "added to cart");
        self.commit(cart)
    }

    /// Drop the line for `product_id`.
    ///
    /// # Errors
    ///
    /// See [`CartEngine::add_item`].
    pub fn remove_item(&self, product_id: &ProductId) -> Result<Cart, CartUpdateError> {
        let mut cart = self.storage.cart()?;
        cart.remove(product_id)?;
        self.commit(cart)
    }

    /// Set the quantity of an existing line. Zero or less removes the line.
    ///
    /// An unknown `product_id` leaves the cart untouched and publishes
    /// nothing.
    ///
    /// # Errors
    ///
    /// See [`CartEngine::add_item`].
    pub fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, CartUpdateError> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let mut cart = self.storage.cart()?;
        if !cart.set_quantity(product_id, quantity)? {
            return Ok(cart);
        }
        self.commit(cart)
    }

    /// Total units across all lines.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn item_count(&self) -> Result<u64, StoreError> {
        Ok(self.storage.cart()?.item_count())
    }

    /// Sum of price times quantity, in USD.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn total(&self) -> Result<Decimal, StoreError> {
        Ok(self.storage.cart()?.total())
    }

    /// Empty the cart by dropping the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn clear_cart(&self) -> Result<Cart, StoreError> {
        self.storage.clear_cart()?;
        let cart = Cart::empty();
        self.publish(&cart);
        Ok(cart)
    }

    /// Format a USD amount the way this engine displays totals.
    ///
    /// Falls back to USD when the converted amount would overflow.
    #[must_use]
    pub fn display_amount(&self, usd: Decimal) -> String {
        self.currency
            .and_then(|c| c.format_usd_as_inr(usd))
            .unwrap_or_else(|| format_usd(usd))
    }

    /// The current total, formatted for display.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn display_total(&self) -> Result<String, StoreError> {
        Ok(self.display_amount(self.total()?))
    }

    fn commit(&self, mut cart: Cart) -> Result<Cart, CartUpdateError> {
        self.storage.save_cart(&mut cart)?;
        self.publish(&cart);
        Ok(cart)
    }

    fn publish(&self, cart: &Cart) {
        let event = CartUpdated {
            item_count: cart.item_count(),
            total: cart.total(),
            display_total: self.display_amount(cart.total()),
        };
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
