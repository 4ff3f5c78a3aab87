//! Geometric face-shape classifier.
//!
//! Measures a handful of distances between fixed face-mesh landmarks and
//! runs them through an ordered decision list. Two policies exist: the
//! refined width comparison (default) and the older ratio-based list kept
//! for compatibility with earlier results.

use crate::topology::{
    CHEEKBONE_LEFT, CHEEKBONE_RIGHT, CHIN, FACE_TOP, FOREHEAD_LEFT, FOREHEAD_RIGHT, JAWLINE,
};
use crate::types::{Landmark, LandmarkSet, ShapeLabel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Widths at or below this are treated as collapsed geometry.
const MIN_WIDTH: f32 = 1e-6;

/// Label returned when no rule matches or the geometry is degenerate.
pub const DEFAULT_LABEL: ShapeLabel = ShapeLabel::Oval;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("landmark {index} missing (face has only {len} landmarks)")]
    MissingLandmark { index: usize, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown classification policy: {0:?} (expected \"legacy\" or \"refined\")")]
pub struct ParsePolicyError(pub String);

/// Which metric definitions and decision list to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPolicy {
    /// Jaw-to-forehead ratio rules; face width is the jawline's x-extent.
    LegacyRatio,
    /// Forehead/cheekbone/jaw width comparison; face width is the widest of the three.
    #[default]
    RefinedWidth,
}

impl ClassificationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationPolicy::LegacyRatio => "legacy_ratio",
            ClassificationPolicy::RefinedWidth => "refined_width",
        }
    }
}

impl fmt::Display for ClassificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassificationPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "legacy_ratio" | "legacy-ratio" => Ok(ClassificationPolicy::LegacyRatio),
            "refined" | "refined_width" | "refined-width" => Ok(ClassificationPolicy::RefinedWidth),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Thresholds for [`ClassificationPolicy::LegacyRatio`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyThresholds {
    /// Round requires height/width below this...
    pub round_max_ratio: f32,
    /// ...and jaw/forehead above this.
    pub round_min_jaw_to_forehead: f32,
    pub square_min_jaw_to_forehead: f32,
    pub heart_min_forehead_to_jaw: f32,
    pub oblong_min_ratio: f32,
}

impl Default for LegacyThresholds {
    fn default() -> Self {
        Self {
            round_max_ratio: 1.1,
            round_min_jaw_to_forehead: 0.9,
            square_min_jaw_to_forehead: 0.95,
            heart_min_forehead_to_jaw: 1.15,
            oblong_min_ratio: 1.4,
        }
    }
}

/// Thresholds for [`ClassificationPolicy::RefinedWidth`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinedThresholds {
    pub oblong_min_ratio: f32,
    /// Relative tolerance for cheekbone≈jaw and forehead≈jaw in the Square rule.
    pub square_tolerance: f32,
    pub oval_min_ratio: f32,
}

impl Default for RefinedThresholds {
    fn default() -> Self {
        Self {
            oblong_min_ratio: 1.5,
            square_tolerance: 0.05,
            oval_min_ratio: 1.2,
        }
    }
}

/// Distances measured on one landmark set, in frame pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceMetrics {
    pub face_height: f32,
    pub forehead_width: f32,
    pub jaw_width: f32,
    /// Only measured by the refined policy.
    pub cheekbone_width: Option<f32>,
    pub face_width: f32,
    /// `face_height / face_width`.
    pub ratio: f32,
}

impl FaceMetrics {
    /// True when a width the decision list divides by or compares against
    /// has collapsed, or any metric is non-finite.
    pub fn is_degenerate(&self) -> bool {
        let widths = [
            Some(self.forehead_width),
            Some(self.jaw_width),
            Some(self.face_width),
            self.cheekbone_width,
        ];
        let collapsed = widths
            .into_iter()
            .flatten()
            .any(|w| !w.is_finite() || w <= MIN_WIDTH);
        collapsed || !self.face_height.is_finite() || !self.ratio.is_finite()
    }
}

/// Face-shape classifier for one policy and its thresholds.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    policy: ClassificationPolicy,
    legacy: LegacyThresholds,
    refined: RefinedThresholds,
}

impl Classifier {
    /// Classifier using the default thresholds of `policy`.
    pub fn new(policy: ClassificationPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_thresholds(
        policy: ClassificationPolicy,
        legacy: LegacyThresholds,
        refined: RefinedThresholds,
    ) -> Self {
        Self {
            policy,
            legacy,
            refined,
        }
    }

    pub fn policy(&self) -> ClassificationPolicy {
        self.policy
    }

    /// Measure and classify one face.
    ///
    /// Fails only when the set lacks a landmark the policy reads; callers
    /// treat that as "no face" for the frame.
    pub fn classify(&self, landmarks: &LandmarkSet) -> Result<ShapeLabel, ClassifierError> {
        let metrics = self.measure(landmarks)?;
        Ok(self.decide(&metrics))
    }

    /// Compute the metrics the active policy's decision list consumes.
    pub fn measure(&self, landmarks: &LandmarkSet) -> Result<FaceMetrics, ClassifierError> {
        let top = point(landmarks, FACE_TOP)?;
        let chin = point(landmarks, CHIN)?;
        let forehead_l = point(landmarks, FOREHEAD_LEFT)?;
        let forehead_r = point(landmarks, FOREHEAD_RIGHT)?;

        let mut jaw = [Landmark::default(); JAWLINE.len()];
        for (slot, &idx) in jaw.iter_mut().zip(JAWLINE.iter()) {
            *slot = *point(landmarks, idx)?;
        }

        let face_height = top.distance(chin);
        let forehead_width = forehead_l.distance(forehead_r);
        let jaw_extent = horizontal_extent(&jaw);

        let metrics = match self.policy {
            ClassificationPolicy::LegacyRatio => {
                let jaw_width = jaw[0].distance(&jaw[jaw.len() - 1]);
                FaceMetrics {
                    face_height,
                    forehead_width,
                    jaw_width,
                    cheekbone_width: None,
                    face_width: jaw_extent,
                    ratio: face_height / jaw_extent,
                }
            }
            ClassificationPolicy::RefinedWidth => {
                let cheek_l = point(landmarks, CHEEKBONE_LEFT)?;
                let cheek_r = point(landmarks, CHEEKBONE_RIGHT)?;
                let cheekbone_width = cheek_l.distance(cheek_r);
                let face_width = forehead_width.max(cheekbone_width).max(jaw_extent);
                FaceMetrics {
                    face_height,
                    forehead_width,
                    jaw_width: jaw_extent,
                    cheekbone_width: Some(cheekbone_width),
                    face_width,
                    ratio: face_height / face_width,
                }
            }
        };

        Ok(metrics)
    }

    /// Run the active policy's decision list over precomputed metrics.
    pub fn decide(&self, metrics: &FaceMetrics) -> ShapeLabel {
        if metrics.is_degenerate() {
            tracing::debug!(?metrics, "degenerate face geometry, using default label");
            return DEFAULT_LABEL;
        }

        match self.policy {
            ClassificationPolicy::LegacyRatio => decide_legacy(&self.legacy, metrics),
            ClassificationPolicy::RefinedWidth => match metrics.cheekbone_width {
                Some(cheek) => decide_refined(&self.refined, metrics, cheek),
                None => DEFAULT_LABEL,
            },
        }
    }
}

fn decide_legacy(t: &LegacyThresholds, m: &FaceMetrics) -> ShapeLabel {
    let jaw_to_forehead = m.jaw_width / m.forehead_width;
    let forehead_to_jaw = m.forehead_width / m.jaw_width;

    if m.ratio < t.round_max_ratio && jaw_to_forehead > t.round_min_jaw_to_forehead {
        ShapeLabel::Round
    } else if jaw_to_forehead > t.square_min_jaw_to_forehead {
        ShapeLabel::Square
    } else if forehead_to_jaw > t.heart_min_forehead_to_jaw {
        ShapeLabel::Heart
    } else if m.ratio > t.oblong_min_ratio {
        ShapeLabel::Oblong
    } else {
        DEFAULT_LABEL
    }
}

fn decide_refined(t: &RefinedThresholds, m: &FaceMetrics, cheek: f32) -> ShapeLabel {
    let forehead = m.forehead_width;
    let jaw = m.jaw_width;

    if m.ratio > t.oblong_min_ratio {
        ShapeLabel::Oblong
    } else if (cheek - jaw).abs() < t.square_tolerance * cheek
        && (forehead - jaw).abs() < t.square_tolerance * forehead
    {
        ShapeLabel::Square
    } else if forehead > cheek && cheek > jaw {
        ShapeLabel::Heart
    } else if cheek > forehead && cheek > jaw {
        ShapeLabel::Round
    } else if m.ratio > t.oval_min_ratio {
        ShapeLabel::Oval
    } else {
        DEFAULT_LABEL
    }
}

fn point(landmarks: &LandmarkSet, index: usize) -> Result<&Landmark, ClassifierError> {
    landmarks.get(index).ok_or(ClassifierError::MissingLandmark {
        index,
        len: landmarks.len(),
    })
}

/// max(x) − min(x) over `points`.
fn horizontal_extent(points: &[Landmark]) -> f32 {
    let (min, max) = points
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.x), hi.max(p.x))
        });
    if points.is_empty() {
        0.0
    } else {
        max - min
    }
}
