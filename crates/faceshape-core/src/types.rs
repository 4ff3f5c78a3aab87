use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single face-mesh landmark in frame-pixel coordinates.
///
/// Deserializes from the keypoint objects emitted by the mesh model; any
/// extra fields (such as `name`) are ignored and a missing `z` is 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance to `other` in the image plane (z is ignored).
    pub fn distance(&self, other: &Landmark) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Ordered landmarks for one detected face in one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(points: Vec<Landmark>) -> Self {
        Self::new(points)
    }
}

/// One face entry of a model detection result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacePrediction {
    /// Absent when the model returned a face without keypoints.
    #[serde(default)]
    pub keypoints: Option<LandmarkSet>,
}

/// Per-frame output of the face-mesh model: zero or one face.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub faces: Vec<FacePrediction>,
}

impl DetectionResult {
    /// A frame in which no face was found.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A frame with a single face carrying `landmarks`.
    pub fn with_landmarks(landmarks: LandmarkSet) -> Self {
        Self {
            faces: vec![FacePrediction {
                keypoints: Some(landmarks),
            }],
        }
    }

    /// Keypoints of the first face, if the frame has one and it carries them.
    pub fn landmarks(&self) -> Option<&LandmarkSet> {
        self.faces.first().and_then(|f| f.keypoints.as_ref())
    }
}

/// Face shape category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeLabel {
    Round,
    Square,
    Heart,
    Oblong,
    Oval,
}

impl ShapeLabel {
    pub const ALL: [ShapeLabel; 5] = [
        ShapeLabel::Round,
        ShapeLabel::Square,
        ShapeLabel::Heart,
        ShapeLabel::Oblong,
        ShapeLabel::Oval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeLabel::Round => "Round",
            ShapeLabel::Square => "Square",
            ShapeLabel::Heart => "Heart",
            ShapeLabel::Oblong => "Oblong",
            ShapeLabel::Oval => "Oval",
        }
    }

    /// Position in [`ShapeLabel::ALL`], used for counting tables.
    pub(crate) fn index(&self) -> usize {
        match self {
            ShapeLabel::Round => 0,
            ShapeLabel::Square => 1,
            ShapeLabel::Heart => 2,
            ShapeLabel::Oblong => 3,
            ShapeLabel::Oval => 4,
        }
    }
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown face shape: {0:?} (expected Round, Square, Heart, Oblong or Oval)")]
pub struct ParseShapeLabelError(pub String);

impl FromStr for ShapeLabel {
    type Err = ParseShapeLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseShapeLabelError(s.to_string()))
    }
}
