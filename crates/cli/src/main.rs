//! ArtHive CLI - local cart and moderation tools.
//!
//! # Usage
//!
//! ```bash
//! # Work with a cart stored on disk
//! arthive cart add --id p1 --title "Harbor Print" --price 100
//! arthive cart list
//! arthive --store-dir /tmp/carts cart clear
//!
//! # Moderate the marketplace (needs PLATFORM_SERVICE_KEY)
//! arthive admin approve 6f1c...
//! arthive admin promote 2b7e... --role artist
//! ```
//!
//! # Commands
//!
//! - `cart` - List and edit the file-backed cart
//! - `admin` - Approve, reject or delete products; change roles

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use arthive_core::{ProductStatus, UserRole};

mod commands;

use commands::admin::AdminContext;
use commands::cart::AddArgs;

#[derive(Parser)]
#[command(name = "arthive")]
#[command(author, version, about = "ArtHive command-line tools")]
struct Cli {
    /// Directory holding the local cart file
    #[arg(long, global = true, env = "ARTHIVE_CART_DIR", default_value = ".arthive")]
    store_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Moderate products and users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines, count and total
    List,
    /// Add a product (increments if already present)
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Unit price
        #[arg(long)]
        price: Decimal,

        /// Image URL
        #[arg(long, default_value = "")]
        image_url: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove {
        /// Product ID
        id: String,
    },
    /// Set a product's quantity (0 removes it)
    Update {
        /// Product ID
        id: String,
        /// New quantity
        quantity: u32,
    },
    /// Delete the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Approve a pending product
    Approve { product_id: String },
    /// Reject a product
    Reject { product_id: String },
    /// Delete a product
    Delete { product_id: String },
    /// Change a user's role
    Promote {
        profile_id: String,

        /// New role (`user`, `artist`, `admin`)
        #[arg(short, long, default_value = "artist")]
        role: UserRole,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arthive=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => {
            let store = commands::cart::open(&cli.store_dir)?;
            let items = match action {
                CartAction::List => commands::cart::list(&store)?,
                CartAction::Add {
                    id,
                    title,
                    price,
                    image_url,
                    quantity,
                } => commands::cart::add(
                    &store,
                    AddArgs {
                        id,
                        title,
                        price,
                        image_url,
                        quantity,
                    },
                )?,
                CartAction::Remove { id } => commands::cart::remove(&store, &id)?,
                CartAction::Update { id, quantity } => {
                    commands::cart::update(&store, &id, quantity)?
                }
                CartAction::Clear => commands::cart::clear(&store)?,
            };
            print_json(&commands::cart::summary(&items))?;
        }
        Commands::Admin { action } => {
            let ctx = AdminContext::from_env()?;
            match action {
                AdminAction::Approve { product_id } => {
                    print_json(&ctx.set_status(&product_id, ProductStatus::Approved).await?)?;
                }
                AdminAction::Reject { product_id } => {
                    print_json(&ctx.set_status(&product_id, ProductStatus::Rejected).await?)?;
                }
                AdminAction::Delete { product_id } => {
                    ctx.delete(&product_id).await?;
                    print_json(&serde_json::json!({ "deleted": product_id }))?;
                }
                AdminAction::Promote { profile_id, role } => {
                    print_json(&ctx.set_role(&profile_id, role).await?)?;
                }
            }
        }
    }
    Ok(())
}
