//! Event fan-out to NATS.
//!
//! The engine's sink is synchronous, so it hands records to a
//! [`ChannelSink`](werewolf_core::sink::ChannelSink); this task drains the
//! channel and publishes each record, in order, on the game's event
//! subject. Publish failures are logged and never reach the engine.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use werewolf_types::EventRecord;

/// Forward every record from `rx` to `subject` until the channel closes.
///
/// The task resolves to the number of records published.
pub fn spawn_event_forwarder(
    client: async_nats::Client,
    subject: String,
    mut rx: mpsc::UnboundedReceiver<EventRecord>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut published: u64 = 0;
        while let Some(record) = rx.recv().await {
            let payload = match serde_json::to_vec(&record) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(sequence = record.sequence, error = %e, "Failed to serialize event");
                    continue;
                }
            };
            if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                warn!(subject = subject, sequence = record.sequence, error = %e, "Failed to publish event");
                continue;
            }
            published = published.saturating_add(1);
        }
        if let Err(e) = client.flush().await {
            warn!(error = %e, "Failed to flush event stream");
        }
        debug!(subject = subject, published, "Event forwarder finished");
        published
    })
}
