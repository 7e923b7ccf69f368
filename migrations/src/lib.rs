pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_profiles_table;
mod m20250301_000002_create_products_table;
mod m20250301_000003_create_consoles_table;
mod m20250301_000004_create_rentals_table;
mod m20250301_000005_create_service_bookings_table;
mod m20250301_000006_create_trade_ins_table;
mod m20250301_000007_create_notifications_table;
mod m20250315_000008_add_rental_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_profiles_table::Migration),
            Box::new(m20250301_000002_create_products_table::Migration),
            Box::new(m20250301_000003_create_consoles_table::Migration),
            Box::new(m20250301_000004_create_rentals_table::Migration),
            Box::new(m20250301_000005_create_service_bookings_table::Migration),
            Box::new(m20250301_000006_create_trade_ins_table::Migration),
            Box::new(m20250301_000007_create_notifications_table::Migration),
            Box::new(m20250315_000008_add_rental_indexes::Migration),
        ]
    }
}
