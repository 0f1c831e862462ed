//! # Scholaris DB
//!
//! PostgreSQL pool initialization and embedded migrations.
//!
//! ```ignore
//! let pool = scholaris_db::init_db_pool(&database_url).await?;
//! scholaris_db::run_migrations(&pool).await?;
//! ```

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use sqlx::PgPool;

/// Connects a pool sized by `DATABASE_MAX_CONNECTIONS` (default 10).
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    info!(db.max_connections = max_connections, "Database pool initialized");

    Ok(pool)
}

/// Applies every pending migration from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
