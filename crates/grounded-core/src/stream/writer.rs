//! Single writer for one SSE stream.
//!
//! ```text
//!  Start ──start()──► Emitting ──complete()──► Complete
//!                        │ ▲
//!                        │ └─ status() / chunk()
//!                        ├──────error()──────► Error
//!                        └── send failed ────► Cancelled
//! ```
//!
//! Terminal transitions consume the writer, so a stream cannot end twice.
//! Dropping the writer closes the channel, which ends the response body.

use super::events::{ChunkPayload, CompletePayload, ErrorPayload, Stage, StreamEvent};
use crate::providers::StrategyKind;
use bytes::Bytes;
use grounded_types::GatewayError;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Emitting,
    Complete,
    Error,
    /// Consumer went away while emitting.
    Cancelled,
}

/// The consumer is gone; stop producing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected;

pub struct StreamWriter {
    tx: mpsc::Sender<Bytes>,
    phase: Phase,
}

impl StreamWriter {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx, phase: Phase::Start }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    async fn send(&mut self, event: StreamEvent) -> Result<(), Disconnected> {
        if self.tx.send(event.to_frame()).await.is_err() {
            debug!("[Stream] Consumer disconnected before {} event", event.name());
            self.phase = Phase::Cancelled;
            return Err(Disconnected);
        }
        Ok(())
    }

    pub async fn start(&mut self, conversation_id: &str, strategy: StrategyKind) -> Result<(), Disconnected> {
        debug_assert_eq!(self.phase, Phase::Start);
        self.send(StreamEvent::start(conversation_id, strategy)).await?;
        self.phase = Phase::Emitting;
        Ok(())
    }

    pub async fn status(&mut self, stage: Stage) -> Result<(), Disconnected> {
        debug_assert_eq!(self.phase, Phase::Emitting);
        self.send(StreamEvent::status(stage)).await
    }

    pub async fn chunk(&mut self, text: String, index: usize, total: usize) -> Result<(), Disconnected> {
        debug_assert_eq!(self.phase, Phase::Emitting);
        self.send(StreamEvent::Chunk(ChunkPayload { text, index, total })).await
    }

    /// Successful end of the stream.
    pub async fn complete(mut self, payload: CompletePayload) -> Phase {
        match self.send(StreamEvent::Complete(payload)).await {
            Ok(()) => Phase::Complete,
            Err(Disconnected) => Phase::Cancelled,
        }
    }

    /// Failed end of the stream.
    pub async fn error(mut self, err: &GatewayError) -> Phase {
        match self.send(StreamEvent::Error(ErrorPayload::from(err))).await {
            Ok(()) => Phase::Error,
            Err(Disconnected) => Phase::Cancelled,
        }
    }
}
