use faceshape_core::{
    ClassificationPolicy, DetectionResult, FrameGate, FrameGuard, FrameOutcome, ShapeConfig,
    ShapeLabel, ShapeSession,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Snapshot of the engine's session state.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub policy: ClassificationPolicy,
    pub history_capacity: usize,
    pub history_len: usize,
    pub current_label: Option<ShapeLabel>,
    pub frames_processed: u64,
    pub frames_skipped: u64,
}

/// Messages sent from D-Bus handlers to the engine thread.
enum EngineRequest {
    Frame {
        detection: DetectionResult,
        /// Held until the frame has been processed.
        guard: FrameGuard,
        reply: oneshot::Sender<FrameOutcome>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<EngineStatus>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
    gate: FrameGate,
    skipped: Arc<AtomicU64>,
}

impl EngineHandle {
    /// Classify one frame and fold it into the history.
    ///
    /// Returns [`FrameOutcome::Skipped`] without queueing if the previous
    /// frame is still in flight.
    pub async fn submit_frame(&self, detection: DetectionResult) -> Result<FrameOutcome, EngineError> {
        let Some(guard) = self.gate.try_acquire() else {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("frame dropped: previous frame still in flight");
            return Ok(FrameOutcome::Skipped);
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Frame {
                detection,
                guard,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Clear the label history.
    pub async fn reset(&self) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Reset { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Status { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Majority label over the current history window.
    pub async fn current_label(&self) -> Result<Option<ShapeLabel>, EngineError> {
        Ok(self.status().await?.current_label)
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The thread owns the only [`ShapeSession`]; every mutation goes through
/// the request channel, so frames are processed strictly one at a time.
pub fn spawn_engine(config: &ShapeConfig, queue_depth: usize) -> Result<EngineHandle, EngineError> {
    let mut session = ShapeSession::from_config(config);
    tracing::info!(
        policy = %config.policy,
        history_size = session.history().capacity(),
        "shape session created"
    );

    let skipped = Arc::new(AtomicU64::new(0));
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(queue_depth.max(1));

    let thread_skipped = Arc::clone(&skipped);
    std::thread::Builder::new()
        .name("faceshape-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            let mut processed = 0u64;
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Frame {
                        detection,
                        guard,
                        reply,
                    } => {
                        let outcome = session.process(&detection);
                        processed += 1;
                        // Reopen the gate before replying so the caller's next frame is accepted.
                        drop(guard);
                        let _ = reply.send(outcome);
                    }
                    EngineRequest::Reset { reply } => {
                        session.reset();
                        tracing::info!("history reset");
                        let _ = reply.send(());
                    }
                    EngineRequest::Status { reply } => {
                        let _ = reply.send(EngineStatus {
                            policy: session.classifier().policy(),
                            history_capacity: session.history().capacity(),
                            history_len: session.history().len(),
                            current_label: session.current_label(),
                            frames_processed: processed,
                            frames_skipped: thread_skipped.load(Ordering::Relaxed),
                        });
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })?;

    Ok(EngineHandle {
        tx,
        gate: FrameGate::new(),
        skipped,
    })
}
