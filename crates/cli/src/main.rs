//! PX Shop CLI - Database migrations and record administration.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront migrations (tables + session store)
//! px-cli migrate
//!
//! # Load the bundled catalog into the product table
//! px-cli seed products
//!
//! # Recent orders, optionally for one customer or status
//! px-cli orders list --status pending --limit 20
//! px-cli orders status 42 shipped
//!
//! # Saved cart lines for a user
//! px-cli carts show 7
//! px-cli carts clear 7
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed product records or sample orders
//! - `products` - Inspect and adjust product records
//! - `orders` - List orders and change their status
//! - `carts` - Inspect and manage saved cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "px-cli")]
#[command(author, version, about = "PX Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage product records
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Manage saved carts
    Carts {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert product records from a catalog JSON file
    Products {
        /// Catalog file (defaults to the bundled catalog)
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Create a sample order for a user
    Orders {
        /// User ID
        #[arg(short, long)]
        user: i32,

        /// Number of distinct products on the order
        #[arg(short, long, default_value_t = 2)]
        lines: usize,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List product records
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Set the stock level of a product
    Stock {
        /// Product ID
        id: i32,
        /// New stock level
        stock: u32,
    },
    /// Delete a product record
    Delete {
        /// Product ID
        id: i32,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List recent orders
    List {
        /// Only orders with this status
        #[arg(short, long)]
        status: Option<String>,

        /// Only orders placed by this email
        #[arg(short, long)]
        email: Option<String>,

        /// Maximum number of orders
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
    /// Show one order and its lines
    Show {
        /// Order ID
        id: i32,
    },
    /// Change the status of an order
    Status {
        /// Order ID
        id: i32,
        /// New status (`pending`, `processing`, `shipped`, `delivered`, `cancelled`)
        status: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the saved cart lines for a user
    Show {
        /// User ID
        user: i32,
    },
    /// Set the quantity of a saved line (0 removes it)
    Set {
        /// User ID
        user: i32,
        /// Product ID
        product: i32,
        /// Quantity
        quantity: u32,
    },
    /// Remove one product from a saved cart
    Remove {
        /// User ID
        user: i32,
        /// Product ID
        product: i32,
    },
    /// Remove every saved line for a user
    Clear {
        /// User ID
        user: i32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let pool = commands::connect().await?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => {
                commands::seed::products(&pool, file.as_deref()).await?;
            }
            SeedTarget::Orders { user, lines } => {
                commands::seed::orders(&pool, user, lines).await?;
            }
        },
        Commands::Products { action } => match action {
            ProductAction::List { category } => {
                commands::products::list(&pool, category.as_deref()).await?;
            }
            ProductAction::Stock { id, stock } => {
                commands::products::set_stock(&pool, id, stock).await?;
            }
            ProductAction::Delete { id } => commands::products::delete(&pool, id).await?,
        },
        Commands::Orders { action } => match action {
            OrderAction::List {
                status,
                email,
                limit,
            } => {
                commands::orders::list(&pool, status.as_deref(), email.as_deref(), limit).await?;
            }
            OrderAction::Show { id } => commands::orders::show(&pool, id).await?,
            OrderAction::Status { id, status } => {
                commands::orders::set_status(&pool, id, &status).await?;
            }
        },
        Commands::Carts { action } => match action {
            CartAction::Show { user } => commands::carts::show(&pool, user).await?,
            CartAction::Set {
                user,
                product,
                quantity,
            } => commands::carts::set(&pool, user, product, quantity).await?,
            CartAction::Remove { user, product } => {
                commands::carts::remove(&pool, user, product).await?;
            }
            CartAction::Clear { user } => commands::carts::clear(&pool, user).await?,
        },
    }
    Ok(())
}
