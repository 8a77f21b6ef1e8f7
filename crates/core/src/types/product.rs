//! Catalog products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product as shoppers and the admin panel see it.
///
/// `id` is the externally visible key. The database's own row key is never
/// exposed, so a product keeps the same identity on the server and in the
/// client's local snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price in USD.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
}

/// Largest price the catalog stores (`NUMERIC(12, 2)`).
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Problems with product input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("product name is required")]
    MissingName,
    #[error("product price cannot be negative")]
    NegativePrice,
    #[error("product price cannot exceed {}", MAX_PRICE)]
    PriceTooLarge,
}

fn check_price(price: Decimal) -> Result<(), ProductError> {
    if price.is_sign_negative() {
        return Err(ProductError::NegativePrice);
    }
    if price > MAX_PRICE {
        return Err(ProductError::PriceTooLarge);
    }
    Ok(())
}

/// Input for creating a product. The id is optional; one is generated when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
}

impl NewProduct {
    /// Check the fields every product must carry.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError`] for a blank name or a price outside
    /// `0..=MAX_PRICE`.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::MissingName);
        }
        check_price(self.price)
    }

    /// Turn the input into a product, minting an id when none was supplied.
    #[must_use]
    pub fn into_product(self) -> Product {
        Product {
            id: self.id.unwrap_or_else(ProductId::generate),
            name: self.name,
            description: self.description,
            price: self.price,
            image: self.image,
            category: self.category,
        }
    }
}

impl From<Product> for NewProduct {
    fn from(product: Product) -> Self {
        Self {
            id: Some(product.id),
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
            category: product.category,
        }
    }
}

/// Partial update; only the fields present are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductUpdate {
    /// Check the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError`] for a blank name or a price outside
    /// `0..=MAX_PRICE`.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ProductError::MissingName);
        }
        self.price.map_or(Ok(()), check_price)
    }

    /// Shallow-merge the present fields over `product`.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = &self.image {
            product.image.clone_from(image);
        }
        if let Some(category) = &self.category {
            product.category.clone_from(category);
        }
    }
}

fn seed(id: &str, name: &str, description: &str, cents: i64, image: &str, category: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        description: description.to_owned(),
        price: Decimal::new(cents, 2),
        image: image.to_owned(),
        category: category.to_owned(),
    }
}

/// The catalog shipped with a fresh install.
///
/// Used when neither the server nor the local snapshot has any products, and
/// by `karthik seed` to populate an empty database.
#[must_use]
pub fn default_catalog() -> Vec<Product> {
    const DISK_IMG: &str =
        "https://images.unsplash.com/photo-1587831990716-53e7f8c6c77a?w=400&h=300&fit=crop";
    const RAM_IMG: &str =
        "https://images.unsplash.com/photo-1591488320449-011701bb6704?w=400&h=300&fit=crop";
    const NET_IMG: &str =
        "https://images.unsplash.com/photo-1558494949-ef010cbdcc31?w=400&h=300&fit=crop";
    const CABLE_IMG: &str =
        "https://images.unsplash.com/photo-1581091226825-a6a2a5aee158?w=400&h=300&fit=crop";

    vec![
        seed(
            "prod_hdd_001",
            "HDD",
            "High-capacity Hard Disk Drive for reliable data storage",
            8999,
            DISK_IMG,
            "Storage",
        ),
        seed(
            "prod_ram_001",
            "RAM",
            "High-performance Random Access Memory for faster computing",
            12999,
            RAM_IMG,
            "Memory",
        ),
        seed(
            "prod_nic_001",
            "Network NIC Cards",
            "Network Interface Card for high-speed network connectivity",
            4599,
            NET_IMG,
            "Networking",
        ),
        seed(
            "prod_switch_001",
            "Network Switches (10 port)",
            "10-port network switch for efficient network management",
            15999,
            NET_IMG,
            "Networking",
        ),
        seed(
            "prod_cable_3m",
            "Shield Lan-Cables (3M)",
            "3-meter shielded LAN cable for reliable network connections",
            1299,
            CABLE_IMG,
            "Cables",
        ),
        seed(
            "prod_cable_5m",
            "Shield Lan-Cables (5M)",
            "5-meter shielded LAN cable for extended network connections",
            1899,
            CABLE_IMG,
            "Cables",
        ),
    ]
}
