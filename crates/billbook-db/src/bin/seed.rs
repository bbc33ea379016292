//! # Seed Data Generator
//!
//! Populates a development database with a small salon catalog, an admin
//! who can sign in, and a few loyalty customers.
//!
//! ## Usage
//! ```bash
//! # Seed ./billbook_dev.db with the default admin phone
//! cargo run -p billbook-db --bin seed
//!
//! # Specify database path and admin phone
//! cargo run -p billbook-db --bin seed -- --db ./data/billbook.db --admin-phone 9876500000
//! ```
//!
//! ## Generated Catalog
//! Each service is generated in every tier listed in `TIERS`:
//! - Hair (cuts, colour, spa)
//! - Skin (facials, clean-ups)
//! - Nails (manicure, pedicure)
//! - Retail (shampoo, serum, combs) at the goods slabs
//!
//! Services carry SAC 9997 at 18%; retail goods carry their HSN and slab.

use billbook_core::validation::normalize_phone;
use billbook_core::{Customer, Product, Role, StaffMember, TaxRate};
use billbook_db::{Database, DbConfig};
use chrono::Utc;
use std::env;
use uuid::Uuid;

/// (sku prefix, category, HSN/SAC, tax slab, [(name, base price in rupees)])
type CategorySeed = (&'static str, &'static str, &'static str, TaxRate, &'static [(&'static str, i64)]);

const CATEGORIES: &[CategorySeed] = &[
    (
        "HAIR",
        "Hair",
        "999721",
        TaxRate::GST_18,
        &[
            ("Haircut", 300),
            ("Kids Haircut", 200),
            ("Beard Trim", 150),
            ("Hair Wash & Blow Dry", 400),
            ("Hair Colour Global", 1500),
            ("Hair Colour Roots", 900),
            ("Highlights", 2500),
            ("Hair Spa", 1200),
            ("Keratin Treatment", 4500),
            ("Head Massage", 400),
        ],
    ),
    (
        "SKIN",
        "Skin",
        "999722",
        TaxRate::GST_18,
        &[
            ("Clean-up", 700),
            ("Fruit Facial", 1200),
            ("Gold Facial", 2200),
            ("De-tan Pack", 600),
            ("Threading Eyebrows", 60),
            ("Threading Upper Lip", 40),
            ("Full Arms Waxing", 500),
            ("Full Legs Waxing", 700),
        ],
    ),
    (
        "NAIL",
        "Nails",
        "999722",
        TaxRate::GST_18,
        &[
            ("Manicure", 500),
            ("Pedicure", 700),
            ("Gel Polish", 900),
            ("Nail Art (per nail)", 100),
        ],
    ),
    (
        "RTL",
        "Retail",
        "3305",
        TaxRate::GST_18,
        &[
            ("Shampoo 200ml", 450),
            ("Conditioner 200ml", 480),
            ("Hair Serum 100ml", 650),
            ("Hair Oil 200ml", 250),
        ],
    ),
    (
        "ACC",
        "Accessories",
        "9615",
        TaxRate::GST_12,
        &[("Wide Tooth Comb", 120), ("Hair Clips (6 pcs)", 90), ("Scrunchie", 60)],
    ),
    (
        "HEN",
        "Retail",
        "1404",
        TaxRate::GST_5,
        &[("Henna Powder 100g", 80)],
    ),
];

/// Service tiers and the percentage they add to the base price
const TIERS: &[(&str, i64)] = &[("", 0), ("Senior Stylist", 30), ("Creative Director", 60)];

/// (name, phone, GST state code, opening points)
const CUSTOMERS: &[(&str, &str, &str, i64)] = &[
    ("Asha Rao", "9845012345", "29", 250),
    ("Vikram Shetty", "9845098765", "29", 40),
    ("Priya Kulkarni", "9820011223", "27", 120),
    ("Nikhil Menon", "9447055667", "32", 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./billbook_dev.db");
    let mut admin_phone = String::from("9876500000");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-phone" | "-p" => {
                if i + 1 < args.len() {
                    admin_phone = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Billbook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>            Database file path (default: ./billbook_dev.db)");
                println!("  -p, --admin-phone <PHONE>  Phone of the seeded admin (default: 9876500000)");
                println!("  -h, --help                 Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let admin_phone = normalize_phone(&admin_phone)?;

    println!("🌱 Billbook Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    println!();
    println!("Generating catalog...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    for (prefix, category, hsn, rate, items) in CATEGORIES {
        for (item_idx, (name, base_rupees)) in items.iter().enumerate() {
            // Goods are not tiered
            let tiers = if *rate == TaxRate::GST_18 && *prefix != "RTL" {
                TIERS
            } else {
                &TIERS[..1]
            };

            for (tier_idx, (tier, markup_pct)) in tiers.iter().enumerate() {
                let product = generate_product(
                    &format!("{}-{:02}{}", prefix, item_idx + 1, tier_idx),
                    name,
                    tier,
                    category,
                    hsn,
                    *rate,
                    base_rupees * (100 + markup_pct),
                );

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }
                generated += 1;
            }
        }
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    // Staff
    let admin = StaffMember {
        id: Uuid::new_v4().to_string(),
        name: "Store Admin".to_string(),
        phone: admin_phone.clone(),
        role: Role::Admin,
        is_active: true,
        created_at: Utc::now(),
    };
    db.staff().insert(&admin).await?;
    println!("✓ Admin staff member: {}", admin_phone);

    // Customers
    for (name, phone, state, points) in CUSTOMERS {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            state_code: Some(state.to_string()),
            gstin: None,
            loyalty_points: *points,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = db.customers().insert(&customer).await {
            eprintln!("Failed to insert customer {}: {}", name, e);
        }
    }
    println!("✓ {} loyalty customers", CUSTOMERS.len());

    // Verify FTS
    println!();
    println!("Verifying FTS index...");
    let search_results = db.products().search("hair col", 10).await?;
    println!("  Search 'hair col': {} results", search_results.len());

    let search_results = db.products().search("NAIL", 10).await?;
    println!("  Search 'NAIL': {} results", search_results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one catalog entry. `price_paise` is already tier-adjusted
/// (rupees × percent = paise).
fn generate_product(
    sku: &str,
    name: &str,
    tier: &str,
    category: &str,
    hsn: &str,
    rate: TaxRate,
    price_paise: i64,
) -> Product {
    let now = Utc::now();

    let full_name = if tier.is_empty() {
        name.to_string()
    } else {
        format!("{} ({})", name, tier)
    };

    Product {
        id: Uuid::new_v4().to_string(),
        sku: sku.to_string(),
        name: full_name,
        category: Some(category.to_string()),
        hsn_code: Some(hsn.to_string()),
        price_paise,
        tax_rate_bps: rate.bps(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
