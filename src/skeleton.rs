//! Two-segment-arm upper body model, its rasterized outline and the fit cost
//! against image evidence.

use nalgebra as na;
use ndarray::{Array2, ArrayView2};
use serde_derive::{Deserialize, Serialize};

use crate::config::SkeletonConfig;
use crate::error::Error;
use crate::landmark::{Landmark, LandmarkMap};
use crate::math;
use crate::optimizer::CostFunction;

/// Free scalars: left elbow (x, y), right elbow (x, y).
pub const PARAMETERS: usize = 4;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SkeletonParameters([f32; PARAMETERS]);

impl SkeletonParameters {
    pub fn from_elbows(left: na::Point2<f32>, right: na::Point2<f32>) -> Self {
        Self([left.x, left.y, right.x, right.y])
    }

    /// Elbows half way between each shoulder and hand.
    pub fn relaxed(anchors: &Anchors) -> Self {
        Self::from_elbows(
            na::center(&anchors.left_shoulder, &anchors.left_hand),
            na::center(&anchors.right_shoulder, &anchors.right_hand),
        )
    }

    pub fn from_slice(values: &[f32]) -> Result<Self, Error> {
        let arr: [f32; PARAMETERS] = values.try_into().map_err(|_| Error::DimensionMismatch {
            expected: PARAMETERS,
            found: values.len(),
        })?;

        Ok(Self(arr))
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.0
    }

    #[inline]
    pub fn left_elbow(&self) -> na::Point2<f32> {
        na::Point2::new(self.0[0], self.0[1])
    }

    #[inline]
    pub fn right_elbow(&self) -> na::Point2<f32> {
        na::Point2::new(self.0[2], self.0[3])
    }
}

/// Observed points the arms hang between.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    pub face: na::Point2<f32>,
    pub neck: na::Point2<f32>,
    pub left_shoulder: na::Point2<f32>,
    pub right_shoulder: na::Point2<f32>,
    pub left_hand: na::Point2<f32>,
    pub right_hand: na::Point2<f32>,
}

impl From<&LandmarkMap> for Anchors {
    fn from(map: &LandmarkMap) -> Self {
        Self {
            face: map[Landmark::Face],
            neck: map[Landmark::Neck],
            left_shoulder: map[Landmark::LeftShoulder],
            right_shoulder: map[Landmark::RightShoulder],
            left_hand: map[Landmark::LeftHand],
            right_hand: map[Landmark::RightHand],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: na::Point2<f32>,
    pub to: na::Point2<f32>,
}

impl Segment {
    #[inline]
    pub fn length(&self) -> f32 {
        na::distance(&self.from, &self.to)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Skeleton {
    segments: Vec<Segment>,
}

/// Pixels covered by a rendered skeleton, relative to `(left, top)`.
#[derive(Debug, Clone)]
pub struct Footprint {
    pub left: usize,
    pub top: usize,
    pub mask: Array2<bool>,
}

impl Footprint {
    pub fn covered(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Covered pixels as absolute `(x, y)` coordinates.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.mask
            .indexed_iter()
            .filter(|(_, &m)| m)
            .map(move |((y, x), _)| (self.left + x, self.top + y))
    }
}

impl Skeleton {
    /// Segments in drawing order: left arm, right arm, then neck to face.
    pub fn new(anchors: &Anchors, params: &SkeletonParameters) -> Self {
        let seg = |from, to| Segment { from, to };
        let (le, re) = (params.left_elbow(), params.right_elbow());

        Self {
            segments: vec![
                seg(anchors.left_hand, le),
                seg(le, anchors.left_shoulder),
                seg(anchors.left_shoulder, anchors.neck),
                seg(anchors.right_hand, re),
                seg(re, anchors.right_shoulder),
                seg(anchors.right_shoulder, anchors.neck),
                seg(anchors.neck, anchors.face),
            ],
        }
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn length(&self) -> f32 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// Rasterizes every segment with the given stroke width, clipped to a
    /// `width x height` frame. `None` when nothing lands inside the frame.
    pub fn footprint(&self, stroke: f32, width: usize, height: usize) -> Option<Footprint> {
        let half = stroke * 0.5;
        let (mut l, mut t, mut r, mut b) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);

        for s in &self.segments {
            l = l.min(s.from.x.min(s.to.x));
            t = t.min(s.from.y.min(s.to.y));
            r = r.max(s.from.x.max(s.to.x));
            b = b.max(s.from.y.max(s.to.y));
        }

        let (left, right) = clip_span(l - half, r + half, width)?;
        let (top, bottom) = clip_span(t - half, b + half, height)?;

        let mut mask = Array2::from_elem((bottom - top + 1, right - left + 1), false);

        for s in &self.segments {
            let Some((sl, sr)) = clip_span(s.from.x.min(s.to.x) - half, s.from.x.max(s.to.x) + half, width)
            else {
                continue;
            };
            let Some((st, sb)) = clip_span(s.from.y.min(s.to.y) - half, s.from.y.max(s.to.y) + half, height)
            else {
                continue;
            };

            for y in st..=sb {
                for x in sl..=sr {
                    let p = na::Point2::new(x as f32, y as f32);

                    if math::segment_distance(p, s.from, s.to) <= half {
                        mask[[y - top, x - left]] = true;
                    }
                }
            }
        }

        Some(Footprint { left, top, mask })
    }

    /// Draws the skeleton onto `surface` (indexed `[[y, x]]`) with `value`.
    pub fn render(&self, surface: &mut Array2<u8>, stroke: f32, value: u8) {
        let (height, width) = surface.dim();

        if let Some(fp) = self.footprint(stroke, width, height) {
            for (x, y) in fp.pixels() {
                surface[[y, x]] = value;
            }
        }
    }

    /// Number of rendered pixels that coincide with set evidence pixels.
    pub fn agreement(&self, evidence: ArrayView2<'_, bool>, stroke: f32) -> usize {
        let (height, width) = evidence.dim();

        self.footprint(stroke, width, height)
            .map(|fp| fp.pixels().filter(|&(x, y)| evidence[[y, x]]).count())
            .unwrap_or(0)
    }
}

/// Integer pixel range `[lo, hi]` covering `lo..=hi` inside `0..len`.
fn clip_span(lo: f32, hi: f32, len: usize) -> Option<(usize, usize)> {
    if len == 0 || !lo.is_finite() || !hi.is_finite() {
        return None;
    }

    let max = (len - 1) as f32;
    let lo = lo.ceil().max(0.0);
    let hi = hi.floor().min(max);

    if lo > hi {
        return None;
    }

    Some((lo as usize, hi as usize))
}

/// `length_weight * total_length - agreement_weight * agreeing_pixels`,
/// evaluated for elbow positions against a fixed evidence map.
pub struct SkeletonCost<'a> {
    anchors: Anchors,
    evidence: ArrayView2<'a, bool>,
    config: &'a SkeletonConfig,
}

impl<'a> SkeletonCost<'a> {
    pub fn new(anchors: Anchors, evidence: ArrayView2<'a, bool>, config: &'a SkeletonConfig) -> Self {
        Self {
            anchors,
            evidence,
            config,
        }
    }

    pub fn skeleton(&self, params: &SkeletonParameters) -> Skeleton {
        Skeleton::new(&self.anchors, params)
    }

    pub fn evaluate(&self, params: &SkeletonParameters) -> f32 {
        let skeleton = self.skeleton(params);
        let agreement = skeleton.agreement(self.evidence, self.config.stroke_width) as f32;

        self.config.length_weight * skeleton.length() - self.config.agreement_weight * agreement
    }
}

impl<'a> CostFunction for SkeletonCost<'a> {
    fn dimension(&self) -> usize {
        PARAMETERS
    }

    fn cost(&self, params: &[f32]) -> f32 {
        match SkeletonParameters::from_slice(params) {
            Ok(p) => self.evaluate(&p),
            Err(_) => f32::INFINITY,
        }
    }
}
