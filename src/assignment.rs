use log::{debug, trace, warn};
use munkres::{solve_assignment, WeightMatrix};
use nalgebra as na;

use crate::bbox::{BBox, Ltwh};
use crate::config::{AssignmentConfig, AssignmentStrategy, BodyProportions};
use crate::error::Error;
use crate::landmark::{Landmark, LandmarkMap, LandmarkTable};
use crate::math;
use crate::Candidate;

/// Landmark slots filled from candidates, in cost matrix column order.
pub const SLOTS: [Landmark; 3] = Landmark::TRACKED;

/// Integer disagreement between candidates (rows) and landmark slots
/// (columns).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    rows: usize,
    data: Vec<u32>,
}

impl CostMatrix {
    pub fn build(
        candidates: &[&Candidate],
        previous: &LandmarkMap,
        frame_width: f32,
        size_weight: f32,
    ) -> Self {
        let mut data = Vec::with_capacity(candidates.len() * SLOTS.len());

        for cnd in candidates {
            for slot in SLOTS {
                let dist = na::distance(&previous.get(slot), &cnd.centroid);
                let cost = dist + slot_bias(slot, cnd, frame_width) - size_weight * cnd.width();

                data.push(if cost.is_finite() {
                    cost.max(0.0) as u32
                } else {
                    u32::MAX
                });
            }
        }

        Self {
            rows: candidates.len(),
            data,
        }
    }

    #[inline]
    pub fn candidates(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn get(&self, candidate: usize, slot: usize) -> u32 {
        self.data[candidate * SLOTS.len() + slot]
    }
}

/// Positional preference of a slot: the face sits high, the left hand near
/// the left edge, the right hand near the right edge.
pub fn slot_bias(slot: Landmark, cnd: &Candidate, frame_width: f32) -> f32 {
    match slot {
        Landmark::Face => cnd.centroid.y,
        Landmark::LeftHand => cnd.centroid.x,
        Landmark::RightHand => frame_width - cnd.centroid.x,
        _ => 0.0,
    }
}

/// Costs at or above this are never accepted. Scales with the squared frame
/// diagonal.
pub fn reject_threshold(width: usize, height: usize, divisor: u32) -> u32 {
    let (w, h) = (width as u64, height as u64);
    let t = (w * w + h * h) / u64::from(divisor.max(1));

    t.min(u64::from(u32::MAX)) as u32
}

/// Per-slot winning row of the cost matrix, if any beat the threshold.
pub type SlotChoice = [Option<usize>; 3];

pub fn assign_greedy(matrix: &CostMatrix, threshold: u32) -> SlotChoice {
    let mut best = [threshold; 3];
    let mut chosen = [None; 3];

    for i in 0..matrix.candidates() {
        for p in 0..SLOTS.len() {
            let cost = matrix.get(i, p);

            if cost < best[p] {
                best[p] = cost;
                chosen[p] = Some(i);
            }
        }
    }

    chosen
}

pub fn assign_bipartite(matrix: &CostMatrix, threshold: u32) -> SlotChoice {
    let mut chosen = [None; 3];
    let rows = matrix.candidates();

    if rows == 0 {
        return chosen;
    }

    let n = rows.max(SLOTS.len());
    let padding = threshold as f32;

    let mut weights = WeightMatrix::from_fn(n, |(r, c)| {
        if r < rows && c < SLOTS.len() {
            (matrix.get(r, c) as f32).min(padding)
        } else {
            padding
        }
    });

    match solve_assignment(&mut weights) {
        Ok(positions) => {
            for pos in positions {
                if pos.row < rows && pos.column < SLOTS.len() && matrix.get(pos.row, pos.column) < threshold {
                    chosen[pos.column] = Some(pos.row);
                }
            }
        }
        Err(err) => {
            warn!("assignment could not be solved: {:?}", err);
        }
    }

    chosen
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// Too few candidates; previous positions are kept.
    Held { candidates: usize },
    /// Slots that received a candidate, as indices into the frame's
    /// candidate list.
    Updated { slots: SlotChoice },
}

/// Landmark positions carried from frame to frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkState {
    pub positions: LandmarkMap,
    /// Last usable face region; neck and shoulders hang off it.
    pub face_box: BBox<Ltwh>,
    pub frames_since_update: LandmarkTable<u32>,
}

impl LandmarkState {
    /// Face at the top centre, hands at the side edges.
    pub fn initial(width: usize, height: usize, body: &BodyProportions) -> Self {
        let (w, h) = (width as f32, height as f32);
        let fw = w * body.default_face_width_ratio;

        let face = na::Point2::new(w / 2.0, 0.0);
        let mut positions = LandmarkMap::filled(face);
        positions.set(Landmark::LeftHand, na::Point2::new(0.0, h / 2.0));
        positions.set(Landmark::RightHand, na::Point2::new(w, h / 2.0));

        let mut state = Self {
            positions,
            face_box: BBox::xywh(face.x, face.y, fw, fw).as_ltwh(),
            frames_since_update: LandmarkTable::filled(0),
        };
        state.derive_body(body);
        state
    }

    /// Recomputes neck and shoulders from the face box. A degenerate box
    /// leaves them where they were.
    pub fn derive_body(&mut self, body: &BodyProportions) -> bool {
        let Some((neck, left, right)) = body_from_face(&self.face_box, body) else {
            return false;
        };

        self.positions.set(Landmark::Neck, neck);
        self.positions.set(Landmark::LeftShoulder, left);
        self.positions.set(Landmark::RightShoulder, right);
        true
    }

    pub(crate) fn age(&mut self) {
        for lm in Landmark::ALL {
            self.frames_since_update[lm] = self.frames_since_update[lm].saturating_add(1);
        }
    }
}

/// Neck, left and right shoulder for a face region.
pub fn body_from_face(
    face: &BBox<Ltwh>,
    body: &BodyProportions,
) -> Option<(na::Point2<f32>, na::Point2<f32>, na::Point2<f32>)> {
    if face.is_degenerate() {
        return None;
    }

    let w = face.width();
    let neck = na::Point2::new(face.center().x, face.bottom() + body.neck_drop * w);
    let dy = body.shoulder_drop * w;
    let dx = body.shoulder_span * w;

    Some((
        neck,
        na::Point2::new(neck.x - dx, neck.y + dy),
        na::Point2::new(neck.x + dx, neck.y + dy),
    ))
}

/// Hand estimate on a region outline: the point opposite the one nearest the
/// shoulder, so the estimate sits at the far end of the arm blob.
pub fn hand_extremity(cnd: &Candidate, shoulder: na::Point2<f32>) -> na::Point2<f32> {
    if cnd.has_degenerate_contour() {
        return cnd.centroid;
    }

    match math::nearest_index(&cnd.contour, shoulder) {
        Some(idx) => cnd.contour[math::opposite_index(idx, cnd.contour.len())],
        None => cnd.centroid,
    }
}

/// Matches blob candidates to the face and hands.
#[derive(Debug, Clone)]
pub struct LandmarkTracker {
    config: AssignmentConfig,
    body: BodyProportions,
    width: usize,
    threshold: u32,
}

impl LandmarkTracker {
    pub fn new(
        config: AssignmentConfig,
        body: BodyProportions,
        width: usize,
        height: usize,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyFrame);
        }

        if config.reject_divisor == 0 {
            return Err(Error::InvalidParameter {
                name: "assignment.reject_divisor",
                value: 0.0,
            });
        }

        let threshold = reject_threshold(width, height, config.reject_divisor);

        Ok(Self {
            config,
            body,
            width,
            threshold,
        })
    }

    #[inline]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    #[inline]
    pub fn body(&self) -> &BodyProportions {
        &self.body
    }

    /// Candidates that enter the cost matrix, widest first, as indices into
    /// `candidates`.
    pub fn select(&self, candidates: &[Candidate]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&a, &b| candidates[b].width().total_cmp(&candidates[a].width()));
        order.truncate(self.config.max_candidates);
        order
    }

    pub fn cost_matrix(&self, candidates: &[Candidate], order: &[usize], state: &LandmarkState) -> CostMatrix {
        let selected: Vec<&Candidate> = order.iter().map(|&i| &candidates[i]).collect();

        CostMatrix::build(
            &selected,
            &state.positions,
            self.width as f32,
            self.config.size_weight,
        )
    }

    pub fn update(&self, candidates: &[Candidate], state: &mut LandmarkState) -> AssignmentOutcome {
        state.age();

        if candidates.len() < self.config.min_candidates.max(1) {
            debug!(
                "holding pose: {} candidates, need {}",
                candidates.len(),
                self.config.min_candidates
            );

            return AssignmentOutcome::Held {
                candidates: candidates.len(),
            };
        }

        let order = self.select(candidates);
        let matrix = self.cost_matrix(candidates, &order, state);

        let chosen = match self.config.strategy {
            AssignmentStrategy::Greedy => assign_greedy(&matrix, self.threshold),
            AssignmentStrategy::Bipartite => assign_bipartite(&matrix, self.threshold),
        };

        let slots = chosen.map(|row| row.map(|r| order[r]));

        for (slot, idx) in SLOTS.iter().zip(slots.iter()) {
            trace!("{} <- {:?}", slot.name(), idx);
        }

        if let Some(idx) = slots[0] {
            let face = &candidates[idx];
            state.positions.set(Landmark::Face, face.centroid);
            state.frames_since_update[Landmark::Face] = 0;

            if face.bbox.is_degenerate() {
                debug!("face region has no area, keeping previous body frame");
            } else {
                state.face_box = face.bbox;
            }

            if state.derive_body(&self.body) {
                for lm in [Landmark::Neck, Landmark::LeftShoulder, Landmark::RightShoulder] {
                    state.frames_since_update[lm] = 0;
                }
            }
        }

        let hands = [
            (Landmark::LeftHand, Landmark::LeftShoulder, slots[1]),
            (Landmark::RightHand, Landmark::RightShoulder, slots[2]),
        ];

        for (hand, shoulder, idx) in hands {
            let Some(idx) = idx else { continue };
            let cnd = &candidates[idx];

            let pos = if self.config.refine_hands {
                hand_extremity(cnd, state.positions.get(shoulder))
            } else {
                cnd.centroid
            };

            state.positions.set(hand, pos);
            state.frames_since_update[hand] = 0;
        }

        AssignmentOutcome::Updated { slots }
    }
}
