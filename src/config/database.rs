use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::env;
use std::time::Duration;

pub async fn get_database() -> Result<DatabaseConnection> {
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable must be set"))?;

    let max_connections: u32 = env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let sqlx_logging = env::var("DB_SQLX_LOGGING")
        .map(|v| v != "0" && v.to_ascii_lowercase() != "false")
        .unwrap_or(true);

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .connect_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(sqlx_logging);

    let db = Database::connect(opt).await?;
    Ok(db)
}
