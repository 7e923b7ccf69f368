//! Seed data script - populates the database with demo rental data
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 4 catalogue products (PS5, Xbox, Switch, Steam Deck)
//! - 12 console units across those categories
//! - 4 customer profiles (approved, returning, pending KYC, admin)
//! - a handful of rentals in various states
//!
//! Migrations must already be applied (`cargo run --bin migration`).

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::time::Duration as StdDuration;
use tracing::info;
use uuid::Uuid;

use console_rental_api::entities::{
    console::{self, ConsoleStatus},
    product,
    profile::{self, KycStatus, UserRole},
    rental::{self, DeliveryType, PaymentStatus, RentalStatus},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Console Rental Seed Data ===");

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("APP__DATABASE_URL"))
        .unwrap_or_else(|_| "sqlite://console_rental.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(StdDuration::from_secs(10))
        .acquire_timeout(StdDuration::from_secs(10));

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(options).await?;

    info!("Creating products...");
    let products = create_products(&db).await?;
    info!("  Created {} products", products.len());

    info!("Creating console units...");
    let units = create_units(&db).await?;
    info!("  Created {} units", units.len());

    info!("Creating profiles...");
    let profiles = create_profiles(&db).await?;
    info!("  Created {} profiles", profiles.len());

    info!("Creating rentals...");
    let rentals = create_rentals(&db, &products, &units).await?;
    info!("  Created {} rentals", rentals);

    info!("=== Seed Data Complete ===");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/stock");
    info!("  curl 'http://localhost:8080/api/availability?category=PS5&year=2025&month=1'");

    Ok(())
}

async fn create_products(db: &DatabaseConnection) -> anyhow::Result<Vec<product::Model>> {
    let catalogue = vec![
        ("PlayStation 5 Disc Edition", "PS5", dec!(18.00)),
        ("Xbox Series X", "Xbox", dec!(16.00)),
        ("Nintendo Switch OLED", "Switch", dec!(12.00)),
        ("Steam Deck 512GB", "SteamDeck", dec!(14.00)),
    ];

    let mut created = Vec::new();
    for (name, category, daily_rate) in catalogue {
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            category: Set(category.to_string()),
            daily_rate: Set(daily_rate),
            active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;
        created.push(model);
    }
    Ok(created)
}

async fn create_units(db: &DatabaseConnection) -> anyhow::Result<Vec<console::Model>> {
    let fleet = [
        ("PS5", 4, ConsoleStatus::Active),
        ("Xbox", 3, ConsoleStatus::Active),
        ("Switch", 3, ConsoleStatus::Active),
        ("SteamDeck", 1, ConsoleStatus::Active),
        ("SteamDeck", 1, ConsoleStatus::Maintenance),
    ];

    let mut created = Vec::new();
    let mut serial = 1;
    for (category, count, status) in fleet {
        for _ in 0..count {
            let model = console::ActiveModel {
                unit_id: Set(format!("{}-{:03}", category.to_uppercase(), serial)),
                category: Set(category.to_string()),
                status: Set(status),
                notes: Set(match status {
                    ConsoleStatus::Maintenance => Some("Fan noise, awaiting parts".to_string()),
                    _ => None,
                }),
                ..Default::default()
            }
            .insert(db)
            .await?;
            created.push(model);
            serial += 1;
        }
    }
    Ok(created)
}

async fn create_profiles(db: &DatabaseConnection) -> anyhow::Result<Vec<profile::Model>> {
    let people = vec![
        ("user-alice", "alice@example.com", "Alice Johnson", KycStatus::Approved, 3, UserRole::Customer),
        ("user-bob", "bob@example.com", "Bob Smith", KycStatus::Approved, 0, UserRole::Customer),
        ("user-carol", "carol@example.com", "Carol Williams", KycStatus::Pending, 0, UserRole::Customer),
        ("user-admin", "ops@example.com", "Shop Admin", KycStatus::Approved, 0, UserRole::Admin),
    ];

    let now = Utc::now();
    let mut created = Vec::new();
    for (id, email, name, kyc_status, total_bookings, role) in people {
        let model = profile::ActiveModel {
            id: Set(id.to_string()),
            email: Set(Some(email.to_string())),
            full_name: Set(Some(name.to_string())),
            phone: Set(None),
            kyc_status: Set(kyc_status),
            total_bookings: Set(total_bookings),
            xp: Set(total_bookings * 50),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(db)
        .await?;
        created.push(model);
    }
    Ok(created)
}

async fn create_rentals(
    db: &DatabaseConnection,
    products: &[product::Model],
    units: &[console::Model],
) -> anyhow::Result<usize> {
    // (unit index, starts in days, length in days, status, payment)
    let scenarios = [
        (0, -20, 4, RentalStatus::Completed, PaymentStatus::Paid),
        (1, -3, 7, RentalStatus::Active, PaymentStatus::Paid),
        (4, 2, 3, RentalStatus::Pending, PaymentStatus::Pending),
        (7, -10, 2, RentalStatus::Cancelled, PaymentStatus::Refunded),
    ];

    let now = Utc::now();
    let mut count = 0;
    for (unit_index, offset, days, status, payment_status) in scenarios {
        let Some(unit) = units.get(unit_index) else {
            continue;
        };
        let daily_rate = products
            .iter()
            .find(|p| p.category == unit.category)
            .map(|p| p.daily_rate)
            .unwrap_or(Decimal::ZERO);
        let start = now + Duration::days(offset);

        rental::ActiveModel {
            user_id: Set("user-alice".to_string()),
            console_id: Set(unit.id),
            product_id: Set(products.iter().find(|p| p.category == unit.category).map(|p| p.id)),
            plan_id: Set(Some(format!("{}-day", days))),
            start_date: Set(start),
            end_date: Set(start + Duration::days(days)),
            status: Set(status),
            payment_status: Set(payment_status),
            total_price: Set(daily_rate * Decimal::from(days)),
            delivery_type: Set(DeliveryType::Delivery),
            address: Set(Some("12 Example Street".to_string())),
            notes: Set(None),
            addons: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        if status.is_live() {
            let mut held: console::ActiveModel = unit.clone().into();
            held.status = Set(ConsoleStatus::Rented);
            held.update(db).await?;
        }
        count += 1;
    }
    Ok(count)
}
