//! Seed the products table with the default catalog.

use karthik_api::db::ProductRepository;
use karthik_core::{NewProduct, default_catalog};

/// Insert the default catalog if the products table is empty.
///
/// # Errors
///
/// Returns an error if the database cannot be reached or an insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let repo = ProductRepository::new(&pool);

    let existing = repo.count().await?;
    if existing > 0 {
        tracing::info!(existing, "Products table is not empty; nothing to seed");
        return Ok(());
    }

    let catalog = default_catalog();
    let total = catalog.len();
    for product in catalog {
        repo.create(NewProduct {
            id: Some(product.id),
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
            category: product.category,
        })
        .await?;
    }

    tracing::info!(count = total, "Seeded default catalog");
    Ok(())
}
