//! Background task for enforcing the reply-audio retention policy.

use solace_turn::ArtifactStore;
use std::time::Duration;
use tokio::time::sleep;

/// Starts a background task that periodically deletes stored reply audio
/// older than `ttl`.
///
/// This task runs indefinitely.
pub async fn start_artifact_reaper(store: ArtifactStore, ttl: Duration, interval: Duration) {
    tracing::info!(
        ttl_secs = ttl.as_secs(),
        interval_secs = interval.as_secs(),
        "starting reply-audio retention task"
    );

    loop {
        // Sleep first so startup settles before the first sweep.
        sleep(interval).await;

        match store.reap_older_than(ttl).await {
            Ok(0) => tracing::debug!("no expired reply audio to delete"),
            Ok(count) => tracing::info!(count, "deleted expired reply audio"),
            Err(e) => tracing::error!(error = %e, "reply-audio retention sweep failed"),
        }
    }
}
