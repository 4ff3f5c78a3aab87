use crate::engine::{EngineError, EngineHandle};
use faceshape_core::DetectionResult;
use zbus::interface;

pub const BUS_NAME: &str = "org.freedesktop.FaceShape1";
pub const OBJECT_PATH: &str = "/org/freedesktop/FaceShape1";

/// D-Bus interface for the faceshape daemon.
///
/// Bus name: org.freedesktop.FaceShape1
/// Object path: /org/freedesktop/FaceShape1
pub struct FaceShapeService {
    engine: EngineHandle,
}

impl FaceShapeService {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }
}

fn engine_error(e: EngineError) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(e.to_string())
}

#[interface(name = "org.freedesktop.FaceShape1")]
impl FaceShapeService {
    /// Submit one frame's detection result (JSON); returns the frame outcome as JSON.
    async fn submit_frame(&self, detection_json: &str) -> zbus::fdo::Result<String> {
        let detection: DetectionResult = serde_json::from_str(detection_json).map_err(|e| {
            zbus::fdo::Error::InvalidArgs(format!("invalid detection result: {e}"))
        })?;
        let outcome = self
            .engine
            .submit_frame(detection)
            .await
            .map_err(engine_error)?;
        tracing::debug!(?outcome, "frame submitted");
        serde_json::to_string(&outcome).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    /// Majority label over the history window, or an empty string.
    async fn current_label(&self) -> zbus::fdo::Result<String> {
        let label = self.engine.current_label().await.map_err(engine_error)?;
        Ok(label.map(|l| l.to_string()).unwrap_or_default())
    }

    /// Clear the label history.
    async fn reset(&self) -> zbus::fdo::Result<bool> {
        tracing::info!("reset requested");
        self.engine.reset().await.map_err(engine_error)?;
        Ok(true)
    }

    /// Return daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let status = self.engine.status().await.map_err(engine_error)?;
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "policy": status.policy,
            "history_capacity": status.history_capacity,
            "history_len": status.history_len,
            "current_label": status.current_label,
            "frames_processed": status.frames_processed,
            "frames_skipped": status.frames_skipped,
        })
        .to_string())
    }
}
