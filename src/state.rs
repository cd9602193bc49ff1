use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::collector::IpInfoCollector;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub collector: IpInfoCollector,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .context("parse DATABASE_URL")?
            .create_if_missing(true)
            .foreign_keys(true);
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("connect to database")?;

        Ok(Self {
            db,
            config,
            collector: IpInfoCollector::new()?,
        })
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        Ok(Self {
            db,
            config,
            collector: IpInfoCollector::new()?,
        })
    }

    /// In-memory database with migrations applied, for tests. A single
    /// connection keeps every query on the same :memory: instance.
    #[cfg(test)]
    pub async fn for_tests() -> Self {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(
                SqliteConnectOptions::from_str("sqlite::memory:")
                    .expect("memory options")
                    .foreign_keys(true),
            )
            .await
            .expect("connect memory db");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("run migrations");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            session_ttl_minutes: 60,
        });
        Self::from_parts(db, config).expect("build state")
    }
}
