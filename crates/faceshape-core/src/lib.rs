//! faceshape-core: face-shape classification from face-mesh landmarks.
//!
//! Classifies one frame's landmarks into a [`ShapeLabel`] with a geometric
//! decision list, then smooths the result over a rolling majority vote.

pub mod classifier;
pub mod config;
pub mod session;
pub mod stabilizer;
pub mod topology;
pub mod types;

pub use classifier::{
    ClassificationPolicy, Classifier, ClassifierError, FaceMetrics, LegacyThresholds,
    RefinedThresholds,
};
pub use config::{ConfigError, ShapeConfig};
pub use session::{FrameGate, FrameGuard, FrameOutcome, ShapeSession};
pub use stabilizer::{ShapeHistory, DEFAULT_HISTORY_SIZE};
pub use types::{DetectionResult, FacePrediction, Landmark, LandmarkSet, ShapeLabel};
