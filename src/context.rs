use log::{debug, trace};
use nalgebra as na;
use ndarray::{Array2, Zip};

use crate::assignment::{AssignmentOutcome, LandmarkState, LandmarkTracker};
use crate::bbox::BBox;
use crate::config::{LocalizationMode, TrackerConfig};
use crate::error::Error;
use crate::frame::Frame;
use crate::landmark::{Landmark, LandmarkMap, LandmarkTable};
use crate::optimizer::{self, Optimizer};
use crate::pose::Pose;
use crate::prior::SpatialPrior;
use crate::skeleton::{self, Anchors, Skeleton, SkeletonCost, SkeletonParameters};

/// Tracking state of one video stream.
///
/// Each [`step`](TrackingContext::step) consumes one frame of evidence,
/// relocates the landmarks and refits the elbows warm-started from the
/// previous frame.
#[derive(Debug)]
pub struct TrackingContext {
    config: TrackerConfig,
    dims: (usize, usize),
    tracker: LandmarkTracker,
    prior: SpatialPrior,
    optimizer: Box<dyn Optimizer>,
    state: LandmarkState,
    confidence: LandmarkTable<Option<f32>>,
    parameters: Option<SkeletonParameters>,
    previous_frame: Option<Array2<f32>>,
    background: Option<Array2<f32>>,
    motion: Option<Array2<f32>>,
    tracking: bool,
    frame_index: u64,
}

impl TrackingContext {
    pub fn new(config: TrackerConfig, width: usize, height: usize) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyFrame);
        }

        config.validate()?;

        let tracker = LandmarkTracker::new(config.assignment.clone(), config.body.clone(), width, height)?;
        let prior = config.prior.build()?;
        let optimizer = optimizer::from_config(&config.optimizer, skeleton::PARAMETERS)?;
        let state = LandmarkState::initial(width, height, &config.body);

        Ok(Self {
            tracking: !config.wait_for_presence,
            config,
            dims: (width, height),
            tracker,
            prior,
            optimizer,
            state,
            confidence: LandmarkTable::filled(None),
            parameters: None,
            previous_frame: None,
            background: None,
            motion: None,
            frame_index: 0,
        })
    }

    /// Back to the initial pose; background and motion history are dropped.
    pub fn reset(&mut self) {
        let (w, h) = self.dims;

        self.state = LandmarkState::initial(w, h, &self.config.body);
        self.confidence = LandmarkTable::filled(None);
        self.parameters = None;
        self.previous_frame = None;
        self.background = None;
        self.motion = None;
        self.tracking = !self.config.wait_for_presence;
        self.frame_index = 0;
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn landmarks(&self) -> &LandmarkMap {
        &self.state.positions
    }

    #[inline]
    pub fn landmark(&self, lm: Landmark) -> na::Point2<f32> {
        self.state.positions[lm]
    }

    #[inline]
    pub fn state(&self) -> &LandmarkState {
        &self.state
    }

    /// Current elbow estimate; the relaxed arm pose before the first fit.
    pub fn parameters(&self) -> SkeletonParameters {
        self.parameters
            .unwrap_or_else(|| SkeletonParameters::relaxed(&self.anchors()))
    }

    #[inline]
    pub fn anchors(&self) -> Anchors {
        Anchors::from(&self.state.positions)
    }

    pub fn skeleton(&self) -> Skeleton {
        Skeleton::new(&self.anchors(), &self.parameters())
    }

    #[inline]
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    #[inline]
    pub fn background(&self) -> Option<&Array2<f32>> {
        self.background.as_ref()
    }

    #[inline]
    pub fn previous_frame(&self) -> Option<&Array2<f32>> {
        self.previous_frame.as_ref()
    }

    #[inline]
    pub fn motion(&self) -> Option<&Array2<f32>> {
        self.motion.as_ref()
    }

    /// Biases a detector likelihood map toward where `lm` currently is.
    pub fn weight_likelihood(&self, lm: Landmark, likelihood: &mut Array2<f32>) {
        self.prior.weight(self.state.positions[lm], likelihood);
    }

    pub fn step(&mut self, frame: &Frame) -> Result<Pose, Error> {
        frame.validate()?;

        if frame.dims != self.dims {
            return Err(Error::ShapeMismatch {
                name: "frame",
                expected: (self.dims.1, self.dims.0),
                found: (frame.height(), frame.width()),
            });
        }

        self.frame_index += 1;
        let motion_energy = self.track_motion(frame);

        // the gate only arms tracking; localization starts with the next frame
        if !self.tracking {
            if frame.center_foreground() > self.config.presence_threshold {
                debug!("presence detected at frame {}, tracking from next frame", self.frame_index);
                self.tracking = true;
            }

            return Ok(self.snapshot(true, None, motion_energy));
        }

        let held = match self.config.localization {
            LocalizationMode::Assignment => match self.tracker.update(&frame.candidates, &mut self.state) {
                AssignmentOutcome::Held { .. } => true,
                AssignmentOutcome::Updated { slots } => slots.iter().all(Option::is_none),
            },
            LocalizationMode::PriorArgmax => self.localize(frame)?,
        };

        let fit_cost = self.fit(frame)?;

        Ok(self.snapshot(held, Some(fit_cost), motion_energy))
    }

    /// Relocates face and hands at the argmax of prior x foreground x skin.
    /// Returns true when nothing could be located.
    fn localize(&mut self, frame: &Frame) -> Result<bool, Error> {
        let likelihoods = [frame.foreground.view(), frame.skin.view()];
        let mut located = false;

        self.state.age();

        for lm in Landmark::TRACKED {
            let previous = self.state.positions[lm];

            match self.prior.locate(previous, &likelihoods)? {
                Some(found) => {
                    trace!("{} located at {:?} ({})", lm.name(), found.position, found.confidence);

                    self.state.positions[lm] = found.position;
                    self.state.frames_since_update[lm] = 0;
                    self.confidence[lm] = Some(found.confidence);
                    located = true;

                    if lm == Landmark::Face {
                        let shift = found.position - previous;
                        let b = self.state.face_box;
                        self.state.face_box =
                            BBox::ltwh(b.left() + shift.x, b.top() + shift.y, b.width(), b.height());

                        if self.state.derive_body(self.tracker.body()) {
                            for d in [Landmark::Neck, Landmark::LeftShoulder, Landmark::RightShoulder] {
                                self.state.frames_since_update[d] = 0;
                            }
                        }
                    }
                }
                None => self.confidence[lm] = None,
            }
        }

        if !located {
            debug!("no landmark located in frame {}, holding pose", self.frame_index);
        }

        Ok(!located)
    }

    /// Refits the elbows against this frame's evidence, warm-started from the
    /// previous solution.
    fn fit(&mut self, frame: &Frame) -> Result<f32, Error> {
        let evidence = frame.fitting_evidence(self.config.skeleton.evidence_threshold);
        let cost = SkeletonCost::new(self.anchors(), evidence.view(), &self.config.skeleton);

        let mut params = self.parameters();
        let report = self.optimizer.optimize(&cost, params.as_mut_slice())?;

        trace!(
            "fit: {} -> {} in {} evaluations",
            report.initial_cost,
            report.final_cost,
            report.evaluations
        );

        self.parameters = Some(params);
        Ok(report.final_cost)
    }

    /// Updates motion and background from the frame luminance, if supplied.
    fn track_motion(&mut self, frame: &Frame) -> Option<f32> {
        let lum = frame.luminance.as_ref()?;

        let energy = self.previous_frame.as_ref().map(|prev| {
            let mut motion = Array2::zeros(lum.dim());
            Zip::from(&mut motion)
                .and(lum)
                .and(prev)
                .for_each(|m, &a, &b| *m = (a - b).abs());

            let energy = motion.mean().unwrap_or(0.0);
            self.motion = Some(motion);
            energy
        });

        let rate = self.config.background_rate;
        if let Some(bg) = self.background.as_mut() {
            if rate > 0.0 {
                Zip::from(bg).and(lum).for_each(|b, &l| *b = *b * (1.0 - rate) + l * rate);
            }
        } else {
            self.background = Some(lum.clone());
        }

        self.previous_frame = Some(lum.clone());
        energy
    }

    fn snapshot(&self, held: bool, fit_cost: Option<f32>, motion_energy: Option<f32>) -> Pose {
        Pose {
            frame_index: self.frame_index,
            tracking: self.tracking,
            held,
            landmarks: self.state.positions,
            confidence: self.confidence,
            frames_since_update: self.state.frames_since_update,
            parameters: self.parameters(),
            skeleton: self.skeleton(),
            fit_cost,
            motion_energy,
        }
    }
}
