//! Per-frame processing state.
//!
//! [`ShapeSession`] owns the classifier and the label history for one
//! detection session; [`FrameGate`] keeps at most one frame in flight.

use crate::classifier::Classifier;
use crate::config::ShapeConfig;
use crate::stabilizer::ShapeHistory;
use crate::types::{DetectionResult, ShapeLabel};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What happened to one submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FrameOutcome {
    /// Another frame was still being processed; this one was dropped.
    Skipped,
    /// No usable face; the history was cleared.
    NoFace,
    Classified {
        /// Label for this frame alone.
        frame_label: ShapeLabel,
        /// Majority label over the history window.
        displayed: ShapeLabel,
    },
}

impl FrameOutcome {
    /// Label to show for this frame, if any.
    pub fn displayed(&self) -> Option<ShapeLabel> {
        match self {
            FrameOutcome::Classified { displayed, .. } => Some(*displayed),
            FrameOutcome::Skipped | FrameOutcome::NoFace => None,
        }
    }
}

/// Classifier plus rolling history for one detection session.
#[derive(Debug, Clone, Default)]
pub struct ShapeSession {
    classifier: Classifier,
    history: ShapeHistory,
}

impl ShapeSession {
    pub fn new(classifier: Classifier, history: ShapeHistory) -> Self {
        Self {
            classifier,
            history,
        }
    }

    pub fn from_config(config: &ShapeConfig) -> Self {
        Self::new(config.classifier(), config.history())
    }

    /// Process one frame's detection result.
    ///
    /// A frame without a face, with a face lacking keypoints, or with too
    /// few landmarks resets the history. Otherwise the face is classified
    /// and pushed.
    pub fn process(&mut self, detection: &DetectionResult) -> FrameOutcome {
        let Some(landmarks) = detection.landmarks() else {
            if !detection.faces.is_empty() {
                tracing::warn!("face prediction has no keypoints, treating as no detection");
            }
            self.reset();
            return FrameOutcome::NoFace;
        };

        let frame_label = match self.classifier.classify(landmarks) {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(error = %e, "unusable landmark set, treating as no detection");
                self.reset();
                return FrameOutcome::NoFace;
            }
        };

        self.history.push(frame_label);
        // The history is non-empty after a push.
        let displayed = self.history.current_label().unwrap_or(frame_label);

        tracing::debug!(
            %frame_label,
            %displayed,
            history = self.history.len(),
            "frame classified"
        );

        FrameOutcome::Classified {
            frame_label,
            displayed,
        }
    }

    pub fn reset(&mut self) {
        self.history.reset();
    }

    pub fn current_label(&self) -> Option<ShapeLabel> {
        self.history.current_label()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn history(&self) -> &ShapeHistory {
        &self.history
    }
}

/// Reentrancy guard: at most one frame is processed at a time.
///
/// Clones share the same flag, so a guard acquired on one thread may be
/// released on another.
#[derive(Debug, Clone, Default)]
pub struct FrameGate {
    busy: Arc<AtomicBool>,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or `None` if a frame is already in flight.
    pub fn try_acquire(&self) -> Option<FrameGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FrameGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held while a frame is in flight; dropping it reopens the gate.
#[derive(Debug)]
pub struct FrameGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
