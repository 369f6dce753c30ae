pub mod graphql;
mod middleware;
mod timing;

pub use graphql::{CitadelSchema, GRAPHQL_PATH, build_schema};
pub use timing::METRIC_RESOLVER_MS;

use axum::{
    Router,
    extract::{FromRef, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;
use crate::infra::db::PostgresRepositories;

use graphql::{graphiql_handler, graphql_handler};
use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct RouterState {
    pub schema: CitadelSchema,
    pub db: PostgresRepositories,
}

impl FromRef<RouterState> for CitadelSchema {
    fn from_ref(state: &RouterState) -> Self {
        state.schema.clone()
    }
}

impl FromRef<RouterState> for PostgresRepositories {
    fn from_ref(state: &RouterState) -> Self {
        state.db.clone()
    }
}

pub fn build_router(state: RouterState) -> Router {
    Router::new()
        .route(GRAPHQL_PATH, get(graphiql_handler).post(graphql_handler))
        .route("/health", get(health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health(State(db): State<PostgresRepositories>) -> Response {
    db_health_response(db.health_check().await)
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_database_yields_no_content() {
        assert_eq!(db_health_response(Ok(())).status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn unreachable_database_yields_unavailable_with_report() {
        let response = db_health_response(Err(SqlxError::PoolTimedOut));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.source, "infra::http::db_health");
    }
}
