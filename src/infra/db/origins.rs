use async_trait::async_trait;
use sqlx::query_as;

use crate::{
    application::repos::{OriginStore, RepoError},
    domain::entities::OriginRecord,
};

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct OriginRow {
    id: i32,
    name: String,
}

impl From<OriginRow> for OriginRecord {
    fn from(row: OriginRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

impl PostgresRepositories {
    async fn find_origin_by_name(&self, name: &str) -> Result<Option<OriginRecord>, RepoError> {
        let row = query_as::<_, OriginRow>("SELECT id, name FROM origins WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(OriginRecord::from))
    }
}

#[async_trait]
impl OriginStore for PostgresRepositories {
    async fn find_or_create_by_name(&self, name: &str) -> Result<OriginRecord, RepoError> {
        if let Some(existing) = self.find_origin_by_name(name).await? {
            return Ok(existing);
        }

        let inserted = query_as::<_, OriginRow>(
            "INSERT INTO origins (name) VALUES ($1) \
             ON CONFLICT (name) DO NOTHING \
             RETURNING id, name",
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        match inserted {
            Some(row) => Ok(row.into()),
            // A concurrent writer created it between the lookup and the insert.
            None => self
                .find_origin_by_name(name)
                .await?
                .ok_or(RepoError::NotFound),
        }
    }
}
