//! Client commands: the storefront managers driven from the terminal.
//!
//! State lives in `KARTHIK_DATA_DIR`. Each command reports whether the
//! server answered or the local store stood in for it.
//!
//! # Environment Variables
//!
//! - `KARTHIK_API_URL` - API base URL (default: `http://localhost:5000`)
//! - `KARTHIK_DATA_DIR` - Local store directory (default: `.karthik`)
//! - `KARTHIK_HTTP_TIMEOUT_SECS` - Request timeout (default: 10)
//! - `KARTHIK_INR_RATE` - Show prices in rupees at this rate

#![allow(clippy::print_stdout)]

use karthik_client::{ClientConfig, FileStore, Origin, Storefront, SyncError};
use karthik_core::{AdminUserId, NewProduct, ProductId, Registration, Username};

type Shop = Storefront<FileStore>;

/// Open the file-backed storefront from the environment.
pub fn open() -> Result<Shop, Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    tracing::debug!(api = %config.api_url, data_dir = %config.data_dir.display(), "Opening storefront");
    Ok(Storefront::open(&config)?)
}

const fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Remote => "server",
        Origin::Local => "local store (server unavailable)",
    }
}

pub async fn list_products(shop: &Shop) -> Result<(), SyncError> {
    let products = shop.catalog.initialize_products().await?;

    println!("{} products from {}", products.value.len(), origin_label(products.origin));
    for product in &products.value {
        println!(
            "  {:<16} {:<40} {:>12}  {}",
            product.id.as_str(),
            product.name,
            shop.cart.display_amount(product.price),
            product.category
        );
    }
    Ok(())
}

pub async fn add_product(shop: &Shop, product: NewProduct) -> Result<(), SyncError> {
    let created = shop.catalog.add_product(product).await?;
    println!(
        "Added {} ({}) to {}",
        created.value.name,
        created.value.id,
        origin_label(created.origin)
    );
    Ok(())
}

pub async fn delete_product(shop: &Shop, id: &str) -> Result<(), SyncError> {
    let deleted = shop.catalog.delete_product(&ProductId::new(id)).await?;
    println!("Deleted {id} from {}", origin_label(deleted.origin));
    Ok(())
}

pub fn show_cart(shop: &Shop) -> Result<(), Box<dyn std::error::Error>> {
    let cart = shop.cart.cart()?;
    if cart.is_empty() {
        println!("Cart is empty");
        return Ok(());
    }

    for item in cart.items() {
        println!(
            "  {:<16} {:<40} x{:<4} {:>12}",
            item.product_id.as_str(),
            item.name,
            item.quantity,
            item.line_total()
                .map_or_else(String::new, |t| shop.cart.display_amount(t))
        );
    }
    println!(
        "{} items, total {}",
        cart.item_count(),
        shop.cart.display_total()?
    );
    Ok(())
}

/// Add a product from the catalog, looked up by id.
pub async fn add_to_cart(
    shop: &Shop,
    product_id: &str,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let products = shop.catalog.initialize_products().await?.into_inner();
    let product = products
        .iter()
        .find(|p| p.id.as_str() == product_id)
        .ok_or_else(|| SyncError::NotFound(format!("product {product_id}")))?;

    shop.cart.add_item(product, quantity)?;
    show_cart(shop)
}

pub async fn register(shop: &Shop, registration: &Registration) -> Result<(), SyncError> {
    let user = shop.accounts.register(registration).await?;
    println!("Registered and signed in as {}", user.username);
    Ok(())
}

pub async fn login(shop: &Shop, username: &Username, password: &str) -> Result<(), SyncError> {
    let user = shop.accounts.login(username, password).await?;
    println!("Signed in as {}", user.username);
    Ok(())
}

pub fn whoami(shop: &Shop) -> Result<(), Box<dyn std::error::Error>> {
    if !shop.accounts.is_authenticated()? {
        println!("Not signed in");
        return Ok(());
    }
    match shop.accounts.current_user()? {
        Some(user) => println!("{} ({}) <{}>", user.username, user.full_name, user.email),
        None => {
            if let Some(username) = shop.accounts.current_username()? {
                println!("{username}");
            }
        }
    }
    Ok(())
}

pub fn provision_local_admin(
    shop: &Shop,
    userid: &AdminUserId,
    password: &str,
) -> Result<(), SyncError> {
    if shop.admin.register_local_admin(userid, password)? {
        println!("Local admin {userid} provisioned");
    } else {
        println!("Local admin {userid} already exists");
    }
    Ok(())
}

pub async fn admin_login(shop: &Shop, userid: &AdminUserId, password: &str) -> Result<(), SyncError> {
    let session = shop.admin.login(userid, password).await?;
    println!("Admin {userid} signed in via {}", origin_label(session.origin));
    Ok(())
}
