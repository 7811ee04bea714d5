pub mod blocks;
pub mod bookings;
pub mod cast_profiles;
pub mod messages;
pub mod reports;
pub mod reviews;
pub mod search;
pub mod service_areas;
pub mod users;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Create a SeaORM connection pool for `database_url`.
pub async fn create_pool(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(25)
        .min_connections(5)
        .max_lifetime(Duration::from_secs(300))
        .sqlx_logging(false);

    Database::connect(options).await
}
