//! Event emission towards the host

use ai_core::TokenSink;
use async_trait::async_trait;
use domain::{StreamingUpdate, WorkerEvent};
use tokio::sync::mpsc;
use tracing::debug;

/// Sending half of the bounded event channel
///
/// Sends wait for capacity. Events sent after the host hung up are dropped.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    events: mpsc::Sender<WorkerEvent>,
}

impl EventEmitter {
    pub fn new(events: mpsc::Sender<WorkerEvent>) -> Self {
        Self { events }
    }

    /// Send an event; returns `false` when the receiver is gone
    pub async fn emit(&self, event: impl Into<WorkerEvent> + Send) -> bool {
        let event = event.into();
        let status = event.status();
        if self.events.send(event).await.is_err() {
            debug!(status, "Event receiver closed, dropping event");
            return false;
        }
        true
    }

    /// Emit an `error` event with the error's display text
    pub async fn emit_error(&self, error: &(dyn std::error::Error + Send + Sync)) -> bool {
        self.emit(WorkerEvent::error(error.to_string())).await
    }
}

#[async_trait]
impl TokenSink for EventEmitter {
    async fn start(&mut self) {
        self.emit(WorkerEvent::start()).await;
    }

    async fn update(&mut self, update: StreamingUpdate) {
        self.emit(WorkerEvent::update(update)).await;
    }
}
