use serde_derive::{Deserialize, Serialize};

use crate::landmark::{LandmarkMap, LandmarkTable};
use crate::skeleton::{Skeleton, SkeletonParameters};

/// Per-frame tracking result handed to visualization.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pose {
    pub frame_index: u64,
    /// False until the presence gate has opened.
    pub tracking: bool,
    /// No landmark moved this frame: too few candidates, every slot
    /// rejected, or tracking not yet started.
    pub held: bool,
    pub landmarks: LandmarkMap,
    /// Only reported by prior-argmax localization.
    pub confidence: LandmarkTable<Option<f32>>,
    pub frames_since_update: LandmarkTable<u32>,
    pub parameters: SkeletonParameters,
    pub skeleton: Skeleton,
    pub fit_cost: Option<f32>,
    /// Mean absolute luminance change against the previous frame.
    pub motion_energy: Option<f32>,
}
