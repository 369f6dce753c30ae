use std::{process, sync::Arc, time::Duration};

use citadel::{
    application::{
        characters::{CharacterRepository, CharacterService, invalidate_character_queries},
        error::AppError,
        jobs::{SyncScheduler, sync_characters_schedule},
        repos::{CharacterStore, OriginStore},
        seed::{SeedOutcome, seed_characters},
        sync::{CharacterReconciler, CharacterSource, SyncOutcome},
    },
    cache::{CacheConfig, CacheStore, build_cache_store},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, RouterState},
        rick_and_morty::RickAndMortyClient,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::Seed(args) => run_seed(settings, args).await,
        config::Command::Sync(_) => run_sync(settings).await,
    }
}

/// Shared wiring for every command that touches characters.
struct ApplicationContext {
    repositories: PostgresRepositories,
    characters: Arc<CharacterRepository>,
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn CharacterSource>,
}

impl ApplicationContext {
    async fn build(settings: &config::Settings) -> Result<Self, AppError> {
        let repositories = init_repositories(settings).await?;
        let character_store: Arc<dyn CharacterStore> = Arc::new(repositories.clone());
        let origin_store: Arc<dyn OriginStore> = Arc::new(repositories.clone());
        let characters = Arc::new(CharacterRepository::new(character_store, origin_store));

        let cache = build_cache_store(&CacheConfig::from(&settings.cache)).await;

        let client = RickAndMortyClient::new(
            settings.sync.endpoint.clone(),
            settings.sync.request_timeout,
        )?;
        let source: Arc<dyn CharacterSource> = Arc::new(client);

        Ok(Self {
            repositories,
            characters,
            cache,
            source,
        })
    }

    fn reconciler(&self, settings: &config::Settings) -> Arc<CharacterReconciler> {
        Arc::new(
            CharacterReconciler::new(
                self.characters.clone(),
                self.source.clone(),
                self.cache.clone(),
            )
            .with_max_fetch(settings.sync.max_fetch),
        )
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = ApplicationContext::build(&settings).await?;
    PostgresRepositories::run_migrations(app.repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let query_ttl = CacheConfig::from(&settings.cache).query_ttl();
    let service = Arc::new(CharacterService::new(
        app.characters.clone(),
        app.cache.clone(),
        query_ttl,
    ));

    let mut scheduler = SyncScheduler::new(app.reconciler(&settings));
    if settings.sync.enabled {
        let schedule = sync_characters_schedule(&settings.sync.schedule)
            .map_err(|err| AppError::from(InfraError::configuration(err)))?;
        scheduler.start(schedule);
    } else {
        info!(target = "citadel::serve", "Scheduled character sync disabled");
    }

    let router = http::build_router(RouterState {
        schema: http::build_schema(service),
        db: app.repositories.clone(),
    });

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "citadel::serve",
        addr = %settings.server.addr,
        path = http::GRAPHQL_PATH,
        "GraphQL endpoint listening"
    );

    let result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")));

    stop_scheduler(&mut scheduler, settings.server.graceful_shutdown).await;
    result
}

async fn stop_scheduler(scheduler: &mut SyncScheduler, grace: Duration) {
    if tokio::time::timeout(grace, scheduler.shutdown())
        .await
        .is_err()
    {
        warn!(
            target = "citadel::serve",
            grace_seconds = grace.as_secs(),
            "Sync scheduler did not stop within the grace period"
        );
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    PostgresRepositories::run_migrations(repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let missing = repositories.verify_schema().await?;
    if !missing.is_empty() {
        return Err(AppError::from(InfraError::database(format!(
            "schema is missing tables: {}",
            missing.join(", ")
        ))));
    }

    info!(target = "citadel::migrate", "Migrations applied");
    Ok(())
}

async fn run_seed(settings: config::Settings, args: config::SeedArgs) -> Result<(), AppError> {
    let app = ApplicationContext::build(&settings).await?;

    match seed_characters(&app.characters, app.source.clone(), args.count).await? {
        SeedOutcome::AlreadySeeded { existing } => {
            info!(target = "citadel::seed", existing, "Nothing to seed");
        }
        SeedOutcome::Seeded { inserted } => {
            if let Some(removed) = invalidate_character_queries(app.cache.as_ref()).await {
                info!(target = "citadel::seed", removed, "Cleared cached character queries");
            }
            info!(target = "citadel::seed", inserted, "Seed completed");
        }
    }
    Ok(())
}

async fn run_sync(settings: config::Settings) -> Result<(), AppError> {
    let app = ApplicationContext::build(&settings).await?;
    let scheduler = SyncScheduler::new(app.reconciler(&settings));

    match scheduler.run_now().await {
        SyncOutcome::Failed { reason } => Err(AppError::unexpected(format!(
            "character sync failed: {reason}"
        ))),
        outcome => {
            info!(target = "citadel::sync", outcome = ?outcome, "Character sync finished");
            Ok(())
        }
    }
}

async fn init_repositories(settings: &config::Settings) -> Result<PostgresRepositories, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(PostgresRepositories::new(pool))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "citadel::serve", "Shutdown signal received");
}
