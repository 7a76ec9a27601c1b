//! Event sinks.
//!
//! The engine hands every [`EventRecord`] to one [`EventSink`], in sequence
//! order. Sinks must not fail the game: a sink that cannot deliver logs a
//! warning and drops the record.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{info, warn};
use werewolf_types::EventRecord;

/// Consumer of the game's event stream.
pub trait EventSink: Send {
    /// Deliver one record.
    fn emit(&mut self, record: &EventRecord);
}

/// Logs every event as structured JSON at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, record: &EventRecord) {
        match serde_json::to_string(&record.event) {
            Ok(event) => info!(
                game_id = %record.game_id,
                sequence = record.sequence,
                round = record.round,
                event = %event,
                "Game event"
            ),
            Err(e) => warn!(sequence = record.sequence, error = %e, "Failed to serialize event"),
        }
    }
}

/// Forwards records to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EventRecord>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EventRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, record: &EventRecord) {
        if self.tx.send(record.clone()).is_err() {
            warn!(sequence = record.sequence, "Event receiver dropped, discarding event");
        }
    }
}

/// Keeps every record in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl RecordingSink {
    /// An empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn records(&self) -> Vec<EventRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, record: &EventRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(_) => warn!(sequence = record.sequence, "Recording sink poisoned, discarding event"),
        }
    }
}

/// Delivers each record to several sinks in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanoutSink {
    /// No sinks yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    #[must_use]
    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventSink for FanoutSink {
    fn emit(&mut self, record: &EventRecord) {
        for sink in &mut self.sinks {
            sink.emit(record);
        }
    }
}
