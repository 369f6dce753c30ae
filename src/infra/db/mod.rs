//! Postgres-backed repository implementations.

mod characters;
mod origins;
mod util;

pub use characters::{push_character_query, push_character_update};
pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query, query_scalar,
};
use tracing::info;

use crate::application::repos::RepoError;

/// Tables the service expects once migrations have run.
const REQUIRED_TABLES: [&str; 2] = ["characters", "origins"];

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// Confirm the migrated tables are present, returning the missing ones.
    pub async fn verify_schema(&self) -> Result<Vec<&'static str>, RepoError> {
        let mut missing = Vec::new();
        for table in REQUIRED_TABLES {
            let exists: bool = query_scalar(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = $1)",
            )
            .bind(table)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

            info!(target = "citadel::db", table, exists, "Checked table");
            if !exists {
                missing.push(table);
            }
        }
        Ok(missing)
    }
}
