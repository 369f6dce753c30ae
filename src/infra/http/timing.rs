use std::future::Future;
use std::time::Instant;

use metrics::histogram;
use tracing::{info, warn};

pub const METRIC_RESOLVER_MS: &str = "citadel_resolver_ms";

/// Await `fut`, logging and recording how long `operation` took.
pub async fn timed<F, T, E>(operation: &'static str, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let result = fut.await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    histogram!(METRIC_RESOLVER_MS, "operation" => operation).record(elapsed_ms);
    if result.is_ok() {
        info!(
            target = "citadel::http::graphql",
            operation, elapsed_ms, "Resolver completed"
        );
    } else {
        warn!(
            target = "citadel::http::graphql",
            operation, elapsed_ms, "Resolver failed"
        );
    }

    result
}
