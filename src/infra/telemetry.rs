use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::characters::{
    METRIC_CACHE_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATIONS, METRIC_CACHE_MISS,
};
use crate::application::sync::{METRIC_SYNC_RUN_MS, METRIC_SYNC_RUNS, METRIC_SYNC_UPDATED};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;
use super::http::METRIC_RESOLVER_MS;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Character queries answered from cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Character queries that fell through to the database."
        );
        describe_counter!(
            METRIC_CACHE_ERROR,
            Unit::Count,
            "Cache operations that failed and were degraded, by operation."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATIONS,
            Unit::Count,
            "Successful prefix invalidations of cached character queries."
        );
        describe_counter!(
            METRIC_SYNC_RUNS,
            Unit::Count,
            "Character sync runs, by outcome."
        );
        describe_counter!(
            METRIC_SYNC_UPDATED,
            Unit::Count,
            "Character rows changed by the sync job."
        );
        describe_histogram!(
            METRIC_SYNC_RUN_MS,
            Unit::Milliseconds,
            "Character sync run latency in milliseconds."
        );
        describe_histogram!(
            METRIC_RESOLVER_MS,
            Unit::Milliseconds,
            "GraphQL resolver latency in milliseconds, by operation."
        );
    });
}
