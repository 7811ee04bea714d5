pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_table;
mod m20250301_000002_create_service_areas_table;
mod m20250301_000003_create_cast_profiles_table;
mod m20250301_000004_create_cast_gallery_images_table;
mod m20250301_000005_create_bookings_table;
mod m20250301_000006_create_messages_table;
mod m20250301_000007_create_reviews_table;
mod m20250301_000008_create_reports_and_blocks_tables;
mod m20250302_000001_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_service_areas_table::Migration),
            Box::new(m20250301_000003_create_cast_profiles_table::Migration),
            Box::new(m20250301_000004_create_cast_gallery_images_table::Migration),
            Box::new(m20250301_000005_create_bookings_table::Migration),
            Box::new(m20250301_000006_create_messages_table::Migration),
            Box::new(m20250301_000007_create_reviews_table::Migration),
            Box::new(m20250301_000008_create_reports_and_blocks_tables::Migration),
            Box::new(m20250302_000001_add_indexes::Migration),
        ]
    }
}
