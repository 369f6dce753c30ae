//! GraphQL schema over the character service.
//!
//! - `POST /api/rick-and-morty` executes queries and mutations
//! - `GET /api/rick-and-morty` serves GraphiQL

use std::sync::Arc;

use async_graphql::{
    Context, EmptySubscription, Error as GqlError, ErrorExtensions, InputObject, MaybeUndefined,
    Object, Result as GqlResult, Schema, SimpleObject,
};
use axum::{
    Json,
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{error, warn};

use crate::{
    application::{
        characters::{API_DEFAULT_LIMIT, CharacterFilter, CharacterService, MAX_LIMIT},
        error::AppError,
    },
    domain::{
        characters::{CharacterUpdate, FieldPatch, NewCharacter},
        entities::CharacterRecord,
    },
};

use super::timing::timed;

pub const GRAPHQL_PATH: &str = "/api/rick-and-morty";

pub type CitadelSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(service: Arc<CharacterService>) -> CitadelSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(service)
        .finish()
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Character")]
pub struct CharacterObject {
    pub id: i32,
    pub name: String,
    pub status: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
    /// Origin name
    pub origin: Option<String>,
}

impl From<CharacterRecord> for CharacterObject {
    fn from(record: CharacterRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            status: record.status,
            species: record.species,
            gender: record.gender,
            origin: record.origin,
        }
    }
}

#[derive(Debug, Default, InputObject)]
pub struct CharacterFilterInput {
    pub name: Option<String>,
    pub status: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
    /// Origin name
    pub origin: Option<String>,
    /// Max items to return (default 20)
    pub limit: Option<i32>,
    /// Items to skip for pagination (default 0)
    pub offset: Option<i32>,
}

impl CharacterFilterInput {
    fn into_filter(self) -> Result<CharacterFilter, AppError> {
        let limit = match self.limit {
            None => API_DEFAULT_LIMIT,
            Some(limit) => u32::try_from(limit).map_err(|_| {
                AppError::validation(format!("limit must be between 1 and {MAX_LIMIT}"))
            })?,
        };
        let offset = match self.offset {
            None => 0,
            Some(offset) => u32::try_from(offset)
                .map_err(|_| AppError::validation("offset must not be negative"))?,
        };

        let filter = CharacterFilter {
            name: self.name,
            status: self.status,
            species: self.species,
            gender: self.gender,
            origin: self.origin,
            limit: Some(limit),
            offset: Some(offset),
        };
        Ok(filter.normalize()?)
    }
}

#[derive(Debug, InputObject)]
pub struct CreateCharacterInput {
    pub name: String,
    pub status: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
    pub origin: Option<String>,
}

impl From<CreateCharacterInput> for NewCharacter {
    fn from(input: CreateCharacterInput) -> Self {
        Self {
            name: input.name,
            status: input.status,
            species: input.species,
            gender: input.gender,
            origin: input.origin,
        }
    }
}

/// Omitted fields stay untouched; `null` clears a nullable field.
#[derive(Debug, Default, InputObject)]
pub struct UpdateCharacterInput {
    pub name: Option<String>,
    pub status: MaybeUndefined<String>,
    pub species: MaybeUndefined<String>,
    pub gender: MaybeUndefined<String>,
    pub origin: MaybeUndefined<String>,
}

fn patch(value: MaybeUndefined<String>) -> FieldPatch<String> {
    match value {
        MaybeUndefined::Undefined => FieldPatch::Unchanged,
        MaybeUndefined::Null => FieldPatch::Clear,
        MaybeUndefined::Value(value) => FieldPatch::Set(value),
    }
}

impl From<UpdateCharacterInput> for CharacterUpdate {
    fn from(input: UpdateCharacterInput) -> Self {
        Self {
            name: input.name,
            status: patch(input.status),
            species: patch(input.species),
            gender: patch(input.gender),
            origin: patch(input.origin),
        }
    }
}

fn graphql_error(operation: &'static str, err: AppError) -> GqlError {
    let code = err.code();
    if code == "BAD_USER_INPUT" || code == "NOT_FOUND" {
        warn!(target = "citadel::http::graphql", operation, code, error = %err, "Rejected request");
    } else {
        error!(target = "citadel::http::graphql", operation, code, error = %err, "Resolver error");
    }
    GqlError::new(err.presentation_message()).extend_with(|_, ext| ext.set("code", code))
}

fn service<'a>(ctx: &Context<'a>) -> GqlResult<&'a Arc<CharacterService>> {
    ctx.data::<Arc<CharacterService>>()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Characters matching the optional filter, in ascending id order.
    #[graphql(name = "getCharactersRickAndMorty")]
    async fn get_characters_rick_and_morty(
        &self,
        ctx: &Context<'_>,
        filter: Option<CharacterFilterInput>,
    ) -> GqlResult<Vec<CharacterObject>> {
        const OPERATION: &str = "getCharactersRickAndMorty";
        let service = service(ctx)?;
        timed(OPERATION, async {
            let filter = filter.unwrap_or_default().into_filter()?;
            let records = service.search(&filter).await?;
            Ok::<_, AppError>(records.into_iter().map(CharacterObject::from).collect())
        })
        .await
        .map_err(|err| graphql_error(OPERATION, err))
    }

    async fn character(&self, ctx: &Context<'_>, id: i32) -> GqlResult<Option<CharacterObject>> {
        const OPERATION: &str = "character";
        let service = service(ctx)?;
        timed(OPERATION, async {
            let record = service.get_by_id(id).await?;
            Ok::<_, AppError>(record.map(CharacterObject::from))
        })
        .await
        .map_err(|err| graphql_error(OPERATION, err))
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_character(
        &self,
        ctx: &Context<'_>,
        input: CreateCharacterInput,
    ) -> GqlResult<CharacterObject> {
        const OPERATION: &str = "createCharacter";
        let service = service(ctx)?;
        timed(OPERATION, async {
            let input = NewCharacter::from(input).normalize()?;
            let record = service.create(input).await?;
            Ok::<_, AppError>(CharacterObject::from(record))
        })
        .await
        .map_err(|err| graphql_error(OPERATION, err))
    }

    /// Returns `null` when no character has `id`.
    async fn update_character(
        &self,
        ctx: &Context<'_>,
        id: i32,
        input: UpdateCharacterInput,
    ) -> GqlResult<Option<CharacterObject>> {
        const OPERATION: &str = "updateCharacter";
        let service = service(ctx)?;
        timed(OPERATION, async {
            let update = CharacterUpdate::from(input).normalize()?;
            let record = service.update(id, update).await?;
            Ok::<_, AppError>(record.map(CharacterObject::from))
        })
        .await
        .map_err(|err| graphql_error(OPERATION, err))
    }

    /// Returns whether a character was deleted.
    async fn delete_character(&self, ctx: &Context<'_>, id: i32) -> GqlResult<bool> {
        const OPERATION: &str = "deleteCharacter";
        let service = service(ctx)?;
        timed(OPERATION, async {
            let removed = service.remove(id).await?;
            Ok::<_, AppError>(removed)
        })
        .await
        .map_err(|err| graphql_error(OPERATION, err))
    }
}

pub async fn graphql_handler(
    State(schema): State<CitadelSchema>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request).await)
}

pub async fn graphiql_handler() -> impl IntoResponse {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint(GRAPHQL_PATH)
            .finish(),
    )
}
