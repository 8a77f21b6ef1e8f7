//! Karthik CLI - server maintenance and a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! karthik migrate
//!
//! # Provision an admin and load the default catalog
//! karthik admin create --userid admin --password 'change-me-please'
//! karthik seed
//!
//! # Shop against the API, falling back to the local store when it is down
//! karthik products list
//! karthik cart add prod_hdd_001 --quantity 2
//! karthik cart show
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create an admin
//! - `admin provision-local` - Store a hashed admin for offline `admin-login`
//! - `seed` - Insert the default catalog into an empty products table
//! - `products`, `cart`, `register`, `login`, `logout`, `whoami`,
//!   `admin-login` - Client operations against `KARTHIK_DATA_DIR`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "karthik")]
#[command(author, version, about = "Karthik store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admins
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Insert the default catalog when the products table is empty
    Seed,
    /// Browse and edit the catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Inspect and edit the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Create a shopper account and sign in
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        #[arg(long, default_value = "")]
        full_name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Sign in as a shopper
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign out the current shopper
    Logout,
    /// Show the signed-in shopper
    Whoami,
    /// Sign in as an admin
    AdminLogin {
        #[arg(short, long)]
        userid: String,
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin in the database
    Create {
        #[arg(short, long)]
        userid: String,
        #[arg(short, long)]
        password: String,
    },
    /// Provision an admin in `KARTHIK_DATA_DIR` for offline sign-in
    ProvisionLocal {
        #[arg(short, long)]
        userid: String,
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List,
    /// Add a product
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        price: Decimal,
        /// Product id; generated when omitted
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        image: String,
        #[arg(long, default_value = "")]
        category: String,
    },
    /// Delete a product
    Delete { id: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and total
    Show,
    /// Add a catalog product
    Add {
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line
    Remove { product_id: String },
    /// Set a line's quantity; zero or less removes it
    Update {
        product_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    use commands::shop;

    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { userid, password } => {
                commands::admin::create(&userid, &password).await?;
            }
            AdminAction::ProvisionLocal { userid, password } => {
                shop::provision_local_admin(&shop::open()?, &userid.into(), &password)?;
            }
        },
        Commands::Seed => commands::seed::run().await?,
        Commands::Products { action } => {
            let client = shop::open()?;
            match action {
                ProductAction::List => shop::list_products(&client).await?,
                ProductAction::Add {
                    name,
                    price,
                    id,
                    description,
                    image,
                    category,
                } => {
                    let product = karthik_core::NewProduct {
                        id: id.map(karthik_core::ProductId::new),
                        name,
                        description,
                        price,
                        image,
                        category,
                    };
                    shop::add_product(&client, product).await?;
                }
                ProductAction::Delete { id } => shop::delete_product(&client, &id).await?,
            }
        }
        Commands::Cart { action } => {
            let client = shop::open()?;
            match action {
                CartAction::Show => shop::show_cart(&client)?,
                CartAction::Add {
                    product_id,
                    quantity,
                } => shop::add_to_cart(&client, &product_id, quantity).await?,
                CartAction::Remove { product_id } => {
                    client.cart.remove_item(&product_id.into())?;
                    shop::show_cart(&client)?;
                }
                CartAction::Update {
                    product_id,
                    quantity,
                } => {
                    client.cart.update_quantity(&product_id.into(), quantity)?;
                    shop::show_cart(&client)?;
                }
                CartAction::Clear => {
                    client.cart.clear_cart()?;
                    shop::show_cart(&client)?;
                }
            }
        }
        Commands::Register {
            username,
            password,
            full_name,
            email,
        } => {
            let registration = karthik_core::Registration {
                username: username.into(),
                password,
                full_name,
                email,
                ..Default::default()
            };
            shop::register(&shop::open()?, &registration).await?;
        }
        Commands::Login { username, password } => {
            shop::login(&shop::open()?, &username.into(), &password).await?;
        }
        Commands::Logout => shop::open()?.accounts.logout()?,
        Commands::Whoami => shop::whoami(&shop::open()?)?,
        Commands::AdminLogin { userid, password } => {
            shop::admin_login(&shop::open()?, &userid.into(), &password).await?;
        }
    }
    Ok(())
}
