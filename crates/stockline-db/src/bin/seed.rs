//! # Seed Data Generator
//!
//! Populates the database with a demo restaurant catalog for development and
//! previews a few sales against it.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database (stockline.toml / STOCKLINE_DB_PATH)
//! cargo run -p stockline-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockline-db --bin seed -- --db ./stockline_dev.db
//!
//! # Also apply the demo sales instead of only simulating them
//! cargo run -p stockline-db --bin seed -- --db ./stockline_dev.db --apply
//! ```
//!
//! ## Generated Catalog (restaurant "demo")
//! - Spirits in 750 ml / 1 l bottles, lime juice without size data
//! - Canned soda sold directly through its POS name
//! - Rice in 50 lb bags, chicken by the lb, soy sauce in 500 ml bottles
//! - Recipes: Moscow Mule, Margarita, Rice Bowl

use chrono::Utc;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use stockline_core::{DeductionResult, Money, Product, Recipe, RecipeIngredient, SaleEvent};
use stockline_db::repository::product::generate_product_id;
use stockline_db::repository::recipe::generate_recipe_id;
use stockline_db::{Database, EngineConfig};

const RESTAURANT: &str = "demo";

/// (name, pos name, purchase unit, size, size unit, cost cents, stock)
type ProductRow = (
    &'static str,
    Option<&'static str>,
    &'static str,
    Option<f64>,
    &'static str,
    i64,
    f64,
);

const PRODUCTS: &[ProductRow] = &[
    ("Vodka", None, "bottle", Some(750.0), "ml", 2000, 12.0),
    ("Tequila Blanco", None, "bottle", Some(1.0), "l", 3200, 6.0),
    ("Triple Sec", None, "bottle", Some(750.0), "ml", 1400, 4.0),
    ("Lime Juice", None, "bottle", None, "", 800, 3.0),
    ("Ginger Beer", None, "case", Some(24.0 * 12.0), "oz", 2400, 5.0),
    ("Soda", Some("Soda Can"), "can", None, "", 250, 100.0),
    ("Jasmine Rice", None, "bag", Some(50.0), "lb", 4500, 2.0),
    ("Chicken Thigh", None, "lb", Some(1.0), "lb", 399, 40.0),
    ("Soy Sauce", None, "bottle", Some(500.0), "ml", 650, 6.0),
];

/// (recipe, pos name, [(product, quantity, unit)])
type RecipeRow = (
    &'static str,
    Option<&'static str>,
    &'static [(&'static str, f64, &'static str)],
);

const RECIPES: &[RecipeRow] = &[
    (
        "Moscow Mule",
        None,
        &[("Vodka", 1.5, "oz"), ("Lime Juice", 0.5, "oz"), ("Ginger Beer", 4.0, "oz")],
    ),
    (
        "Margarita",
        Some("Marg Rocks"),
        &[("Tequila Blanco", 2.0, "oz"), ("Triple Sec", 1.0, "oz"), ("Lime Juice", 1.0, "oz")],
    ),
    (
        "Rice Bowl",
        None,
        &[("Jasmine Rice", 1.0, "cup"), ("Chicken Thigh", 6.0, "oz"), ("Soy Sauce", 1.0, "tbsp")],
    ),
];

/// Demo sales previewed after seeding.
const SALES: &[(&str, f64)] = &[
    ("Moscow Mule", 2.0),
    ("Marg Rocks", 3.0),
    ("Rice Bowl", 4.0),
    ("Soda Can", 7.0),
    ("Unknown Combo", 1.0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut apply = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--apply" => apply = true,
            "--help" | "-h" => {
                println!("Stockline Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: from config)");
                println!("  -c, --config <PATH>  Config file (default: platform stockline.toml)");
                println!("      --apply          Deduct the demo sales instead of simulating");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = EngineConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = Some(path);
    }

    println!("🌱 Stockline Seed Data Generator");
    println!("================================");
    println!("Database: {}", config.database_path().display());
    println!();

    let db = config.connect().await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count(RESTAURANT).await?;
    if existing > 0 {
        println!("⚠ Restaurant '{}' already has {} products", RESTAURANT, existing);
        println!("  Skipping catalog seed.");
    } else {
        seed_catalog(&db).await?;
        println!(
            "✓ Seeded {} products and {} recipes",
            PRODUCTS.len(),
            RECIPES.len()
        );
    }

    println!();
    let service = config.deduction_service(&db);
    let today = Utc::now().date_naive();

    for (item, quantity) in SALES {
        let result = if apply {
            let event = SaleEvent::new(RESTAURANT, *item, *quantity, today);
            service.deduct(&event).await?
        } else {
            service.simulate(RESTAURANT, item, *quantity).await?
        };
        print_result(item, *quantity, &result);
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

async fn seed_catalog(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let mut ids = Vec::with_capacity(PRODUCTS.len());

    for (name, pos_name, unit, size, size_unit, cost, stock) in PRODUCTS {
        let mut product = Product::new(
            generate_product_id(),
            RESTAURANT,
            *name,
            *unit,
            Money::from_cents(*cost),
        )
        .with_stock(*stock);

        if let Some(size) = size {
            product = product.with_size(*size, *size_unit);
        }
        if let Some(pos_name) = pos_name {
            product = product.with_pos_item_name(*pos_name);
        }

        db.products().insert(&product).await?;
        ids.push((*name, product.id));
    }

    for (name, pos_name, lines) in RECIPES {
        let mut recipe = Recipe::new(generate_recipe_id(), RESTAURANT, *name);
        if let Some(pos_name) = pos_name {
            recipe = recipe.with_pos_item_name(*pos_name);
        }
        db.recipes().insert(&recipe).await?;

        for (product_name, quantity, unit) in lines.iter() {
            let Some((_, product_id)) = ids.iter().find(|(name, _)| name == product_name) else {
                eprintln!("Skipping unknown product {} in {}", product_name, recipe.name);
                continue;
            };
            let ingredient = RecipeIngredient::new(
                generate_recipe_id(),
                &recipe.id,
                product_id,
                *quantity,
                *unit,
            );
            db.recipes().add_ingredient(&ingredient).await?;
        }
    }

    Ok(())
}

fn print_result(item: &str, quantity: f64, result: &DeductionResult) {
    if !result.is_mapped() {
        println!("{} × {}: no mapping", item, quantity);
        return;
    }

    println!(
        "{} × {} → {} ({:?}, cost {})",
        item, quantity, result.target_name, result.outcome, result.total_cost
    );
    for line in &result.ingredients_deducted {
        println!(
            "  {:<16} {:>8.3} {:<4} → {:>8.4} {:<7} [{}] left {:.3}",
            line.product_name,
            line.quantity_recipe_units,
            line.recipe_unit,
            line.quantity_purchase_units,
            line.purchase_unit,
            line.conversion_method,
            line.remaining_stock_purchase_units,
        );
        if let Some(warning) = &line.warning {
            println!("    ⚠ {}", warning.message);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockline=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
