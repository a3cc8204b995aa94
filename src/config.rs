use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::prior::SpatialPrior;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStrategy {
    /// Every slot takes its own cheapest candidate; one region may feed
    /// several slots.
    Greedy,
    /// Minimum total cost with at most one slot per candidate.
    Bipartite,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalizationMode {
    /// Cost-matrix assignment of blob candidates.
    Assignment,
    /// Argmax of the spatial prior times foreground and skin likelihood.
    PriorArgmax,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    RandomSearch,
    Simplex,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AssignmentConfig {
    pub strategy: AssignmentStrategy,
    /// Frames with fewer candidates are held.
    pub min_candidates: usize,
    /// Only the widest candidates enter the cost matrix.
    pub max_candidates: usize,
    /// Reject threshold is `(rows² + cols²) / reject_divisor`.
    pub reject_divisor: u32,
    /// Cost bonus per pixel of candidate width.
    pub size_weight: f32,
    /// Move hands to the contour extremity opposite the shoulder.
    pub refine_hands: bool,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            strategy: AssignmentStrategy::Greedy,
            min_candidates: 3,
            max_candidates: 3,
            reject_divisor: 64,
            size_weight: 0.0,
            refine_hands: true,
        }
    }
}

/// Neck and shoulder offsets, in units of the face box width.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BodyProportions {
    /// Neck sits this far below the bottom of the face box.
    pub neck_drop: f32,
    /// Shoulders sit this far below the neck.
    pub shoulder_drop: f32,
    /// Horizontal distance from the neck to each shoulder.
    pub shoulder_span: f32,
    /// Face width assumed before any face box was observed, relative to the
    /// frame width.
    pub default_face_width_ratio: f32,
}

impl Default for BodyProportions {
    fn default() -> Self {
        Self {
            neck_drop: 0.25,
            shoulder_drop: 0.5,
            shoulder_span: 1.25,
            default_face_width_ratio: 0.125,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PriorConfig {
    pub scale: f32,
    /// Lower offset bounds (x, y) relative to the expected location.
    pub lower: [f32; 2],
    /// Upper offset bounds (x, y) relative to the expected location.
    pub upper: [f32; 2],
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            lower: [-40.0, -40.0],
            upper: [40.0, 40.0],
        }
    }
}

impl PriorConfig {
    pub fn build(&self) -> Result<SpatialPrior, Error> {
        SpatialPrior::new(self.scale, self.lower, self.upper)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SkeletonConfig {
    /// Rendered stroke width in pixels.
    pub stroke_width: f32,
    pub length_weight: f32,
    pub agreement_weight: f32,
    /// Edge and foreground values above this count as evidence.
    pub evidence_threshold: f32,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            stroke_width: 7.0,
            length_weight: 1.0,
            agreement_weight: 2.0,
            evidence_threshold: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    pub kind: OptimizerKind,
    pub iterations: usize,
    pub radius: f32,
    /// Simplex stops once the vertex costs spread less than this.
    pub tolerance: f32,
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            kind: OptimizerKind::Simplex,
            iterations: 200,
            radius: 8.0,
            tolerance: 1e-6,
            seed: 0x5eed,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.radius > 0.0) || !self.radius.is_finite() {
            return Err(Error::InvalidRadius(self.radius));
        }

        if self.iterations == 0 {
            return Err(Error::InvalidIterations);
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub localization: LocalizationMode,
    pub assignment: AssignmentConfig,
    pub body: BodyProportions,
    pub prior: PriorConfig,
    pub skeleton: SkeletonConfig,
    pub optimizer: OptimizerConfig,
    /// Running background learning rate in `[0, 1]`; zero keeps the first
    /// frame as the reference.
    pub background_rate: f32,
    /// Hold the initial pose until the frame centre shows foreground.
    pub wait_for_presence: bool,
    pub presence_threshold: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            localization: LocalizationMode::Assignment,
            assignment: AssignmentConfig::default(),
            body: BodyProportions::default(),
            prior: PriorConfig::default(),
            skeleton: SkeletonConfig::default(),
            optimizer: OptimizerConfig::default(),
            background_rate: 0.0,
            wait_for_presence: false,
            presence_threshold: 0.5,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        self.prior.build()?;
        self.optimizer.validate()?;

        if !(self.skeleton.stroke_width > 0.0) {
            return Err(Error::InvalidParameter {
                name: "skeleton.stroke_width",
                value: self.skeleton.stroke_width,
            });
        }

        if self.assignment.reject_divisor == 0 {
            return Err(Error::InvalidParameter {
                name: "assignment.reject_divisor",
                value: 0.0,
            });
        }

        if !(0.0..=1.0).contains(&self.background_rate) {
            return Err(Error::InvalidParameter {
                name: "background_rate",
                value: self.background_rate,
            });
        }

        if !(self.body.default_face_width_ratio > 0.0) {
            return Err(Error::InvalidParameter {
                name: "body.default_face_width_ratio",
                value: self.body.default_face_width_ratio,
            });
        }

        Ok(())
    }
}
