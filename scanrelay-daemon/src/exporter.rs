//! Queue length exporter.
//!
//! Periodically reads the length of each configured queue and publishes it
//! as a gauge labelled by host and queue.

use std::sync::Arc;
use std::time::Duration;

use metrics::gauge;
use tokio_util::sync::CancellationToken;

use scanrelay_core::metrics::{LABEL_HOST, LABEL_QUEUE, QUEUE_LENGTH};
use scanrelay_queue::QueueStore;

/// Interval between two queue length samples.
pub const EXPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Sample every queue once. Returns how many queues were exported.
///
/// A queue that cannot be read is logged and skipped; the others are still
/// exported.
#[allow(clippy::cast_precision_loss)]
pub async fn export_queue_lengths<Q: QueueStore>(store: &Q, host: &str, queues: &[String]) -> usize {
    let mut exported = 0;
    for queue in queues {
        match store.len(queue).await {
            Ok(length) => {
                gauge!(QUEUE_LENGTH, LABEL_HOST => host.to_owned(), LABEL_QUEUE => queue.clone())
                    .set(length as f64);
                tracing::debug!(queue = %queue, length, "queue length exported");
                exported += 1;
            }
            Err(e) => {
                tracing::warn!(queue = %queue, error = %e, "failed to read queue length");
            }
        }
    }
    exported
}

/// Export queue lengths every `interval` until `shutdown` fires.
pub async fn run_exporter<Q: QueueStore>(
    store: Arc<Q>,
    host: String,
    queues: Vec<String>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    tracing::info!(host = %host, queues = ?queues, interval_secs = interval.as_secs(), "queue exporter started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                export_queue_lengths(store.as_ref(), &host, &queues).await;
            }
        }
    }

    tracing::info!("queue exporter stopped");
}
