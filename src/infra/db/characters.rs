use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, query, query_as, query_scalar};

use crate::{
    application::repos::{
        CharacterChanges, CharacterOrder, CharacterQuery, CharacterStore, InsertCharacterParams,
        RepoError,
    },
    domain::entities::CharacterRecord,
};

use super::PostgresRepositories;
use super::util::{convert_count, map_sqlx_error};

const CHARACTER_COLUMNS: &str = "id, name, status, species, gender, origin, origin_id";

#[derive(sqlx::FromRow)]
struct CharacterRow {
    id: i32,
    name: String,
    status: Option<String>,
    species: Option<String>,
    gender: Option<String>,
    origin: Option<String>,
    origin_id: Option<i32>,
}

impl From<CharacterRow> for CharacterRecord {
    fn from(row: CharacterRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            status: row.status,
            species: row.species,
            gender: row.gender,
            origin: row.origin,
            origin_id: row.origin_id,
        }
    }
}

/// Append the `WHERE`, `ORDER BY` and paging clauses for `query`.
pub fn push_character_query(qb: &mut QueryBuilder<'_, Postgres>, query: &CharacterQuery) {
    for (index, predicate) in query.predicates.iter().enumerate() {
        qb.push(if index == 0 { " WHERE " } else { " AND " });
        qb.push(predicate.column.as_str());
        qb.push(" ILIKE ");
        qb.push_bind(predicate.pattern.clone());
    }

    match query.order {
        CharacterOrder::IdAsc => qb.push(" ORDER BY id ASC"),
    };

    qb.push(" LIMIT ");
    qb.push_bind(i64::from(query.limit));
    qb.push(" OFFSET ");
    qb.push_bind(i64::from(query.offset));
}

/// Append `SET` assignments for every present change. Callers skip empty
/// change sets.
pub fn push_character_update(
    qb: &mut QueryBuilder<'_, Postgres>,
    id: i32,
    changes: CharacterChanges,
) {
    let CharacterChanges {
        name,
        status,
        species,
        gender,
        origin,
        origin_id,
    } = changes;

    {
        let mut set = qb.separated(", ");
        if let Some(name) = name {
            set.push("name = ");
            set.push_bind_unseparated(name);
        }
        if let Some(status) = status {
            set.push("status = ");
            set.push_bind_unseparated(status);
        }
        if let Some(species) = species {
            set.push("species = ");
            set.push_bind_unseparated(species);
        }
        if let Some(gender) = gender {
            set.push("gender = ");
            set.push_bind_unseparated(gender);
        }
        if let Some(origin) = origin {
            set.push("origin = ");
            set.push_bind_unseparated(origin);
        }
        if let Some(origin_id) = origin_id {
            set.push("origin_id = ");
            set.push_bind_unseparated(origin_id);
        }
    }

    qb.push(" WHERE id = ");
    qb.push_bind(id);
}

#[async_trait]
impl CharacterStore for PostgresRepositories {
    async fn find_many(&self, query: &CharacterQuery) -> Result<Vec<CharacterRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!("SELECT {CHARACTER_COLUMNS} FROM characters"));
        push_character_query(&mut qb, query);

        let rows = qb
            .build_query_as::<CharacterRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CharacterRecord::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<CharacterRecord>, RepoError> {
        let row = query_as::<_, CharacterRow>(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CharacterRecord::from))
    }

    async fn insert(&self, params: InsertCharacterParams) -> Result<CharacterRecord, RepoError> {
        let row = query_as::<_, CharacterRow>(&format!(
            "INSERT INTO characters (name, status, species, gender, origin, origin_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {CHARACTER_COLUMNS}"
        ))
        .bind(params.name)
        .bind(params.status)
        .bind(params.species)
        .bind(params.gender)
        .bind(params.origin)
        .bind(params.origin_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_by_id(
        &self,
        id: i32,
        changes: CharacterChanges,
    ) -> Result<Option<CharacterRecord>, RepoError> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut qb = QueryBuilder::new("UPDATE characters SET ");
        push_character_update(&mut qb, id, changes);
        qb.push(format!(" RETURNING {CHARACTER_COLUMNS}"));

        let row = qb
            .build_query_as::<CharacterRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(CharacterRecord::from))
    }

    async fn delete_by_id(&self, id: i32) -> Result<bool, RepoError> {
        let result = query("DELETE FROM characters WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, RepoError> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM characters")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }
}
