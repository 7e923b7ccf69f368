//! Schema migration runner.
//!
//! Usage: `migration [up|down|status|fresh]` (default `up`). The database is
//! taken from `DATABASE_URL`, falling back to `APP__DATABASE_URL`.

use migrations::Migrator;
use sea_orm::{ConnectOptions, Database, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), DbErr> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("APP__DATABASE_URL"))
        .unwrap_or_else(|_| "sqlite://console_rental.db?mode=rwc".to_string());
    info!("Connecting to database: {}", database_url);

    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    let db = Database::connect(options).await?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        // one step at a time
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => {
            error!("unknown command '{}'; expected up, down, status or fresh", other);
            return Err(DbErr::Custom(format!("unknown command {}", other)));
        }
    }

    info!("Migration command '{}' completed", command);
    Ok(())
}
