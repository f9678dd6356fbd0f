//! Producer helper: put an intake message on `topull` or `getsize`.

use anyhow::Result;

use scanrelay_core::message::{IntakeMessage, NextAction, PULL_QUEUE, SIZE_QUEUE, encode};
use scanrelay_queue::QueueStore;

/// Enqueue `image` and return the name of the queue it was pushed to.
pub async fn enqueue<Q: QueueStore>(
    store: &Q,
    image: &str,
    action: NextAction,
    size: bool,
) -> Result<&'static str> {
    let image = image.trim();
    if image.is_empty() {
        return Err(anyhow::anyhow!("image reference must not be empty"));
    }

    let queue = if size { SIZE_QUEUE } else { PULL_QUEUE };
    let payload = encode(&IntakeMessage::new(image, action))
        .map_err(|e| anyhow::anyhow!("failed to encode message: {}", e))?;

    store
        .push(queue, &payload)
        .await
        .map_err(|e| anyhow::anyhow!("failed to enqueue {}: {}", image, e))?;

    tracing::info!(image, queue, next_action = %action, "image enqueued");
    Ok(queue)
}
