//! Smooth likelihood around an expected landmark location.
//!
//! The prior is used either as a multiplicative weight on a detector
//! likelihood map ([`SpatialPrior::weight`]) or, combined with foreground and
//! skin likelihood, as the only localization signal
//! ([`SpatialPrior::locate`]).

use nalgebra as na;
use ndarray::{Array2, ArrayView2, Zip};
use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::math;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Localization {
    pub position: na::Point2<f32>,
    /// Combined map value at `position`.
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialPrior {
    mean: na::Vector2<f32>,
    spread: na::Vector2<f32>,
}

impl SpatialPrior {
    /// Builds the prior from a scale `k` and per-axis offset bounds:
    /// `mean = k * (upper + lower) / 2`, `spread = k * upper - mean`.
    pub fn new(scale: f32, lower: [f32; 2], upper: [f32; 2]) -> Result<Self, Error> {
        if !(scale > 0.0) || !scale.is_finite() {
            return Err(Error::InvalidScale(scale));
        }

        let lower = na::Vector2::new(lower[0], lower[1]);
        let upper = na::Vector2::new(upper[0], upper[1]);

        let mean = (upper + lower) * (scale * 0.5);
        let spread = upper * scale - mean;

        let valid = |s: f32| s > 0.0 && s.is_finite();
        if !valid(spread.x) || !valid(spread.y) || !mean.iter().all(|m| m.is_finite()) {
            return Err(Error::InvalidSpread(spread.x, spread.y));
        }

        Ok(Self { mean, spread })
    }

    #[inline]
    pub fn mean(&self) -> na::Vector2<f32> {
        self.mean
    }

    #[inline]
    pub fn spread(&self) -> na::Vector2<f32> {
        self.spread
    }

    /// Location where the prior reaches 1.
    #[inline]
    pub fn peak(&self, expected: na::Point2<f32>) -> na::Point2<f32> {
        expected + self.mean
    }

    #[inline]
    pub fn value(&self, expected: na::Point2<f32>, p: na::Point2<f32>) -> f32 {
        let d = p - expected - self.mean;

        math::gauss_sq(d.norm_squared(), self.spread.norm_squared())
    }

    /// Dense prior over a `width x height` frame, indexed `[[y, x]]`.
    pub fn map(&self, expected: na::Point2<f32>, width: usize, height: usize) -> Array2<f32> {
        Array2::from_shape_fn((height, width), |(y, x)| {
            self.value(expected, na::Point2::new(x as f32, y as f32))
        })
    }

    /// Multiplies `likelihood` in place by the prior around `expected`.
    pub fn weight(&self, expected: na::Point2<f32>, likelihood: &mut Array2<f32>) {
        likelihood.indexed_iter_mut().for_each(|((y, x), v)| {
            *v *= self.value(expected, na::Point2::new(x as f32, y as f32));
        });
    }

    /// Argmax of the prior times every likelihood map. `None` when the
    /// combined map has no positive value.
    pub fn locate(
        &self,
        expected: na::Point2<f32>,
        likelihoods: &[ArrayView2<'_, f32>],
    ) -> Result<Option<Localization>, Error> {
        let Some(first) = likelihoods.first() else {
            return Ok(None);
        };

        let (height, width) = first.dim();
        for l in &likelihoods[1..] {
            if l.dim() != (height, width) {
                return Err(Error::ShapeMismatch {
                    name: "likelihood",
                    expected: (height, width),
                    found: l.dim(),
                });
            }
        }

        let mut combined = self.map(expected, width, height);
        for l in likelihoods {
            Zip::from(&mut combined).and(l).for_each(|c, &v| *c *= v);
        }

        let mut best: Option<Localization> = None;
        for ((y, x), &v) in combined.indexed_iter() {
            if v > 0.0 && best.map_or(true, |b| v > b.confidence) {
                best = Some(Localization {
                    position: na::Point2::new(x as f32, y as f32),
                    confidence: v,
                });
            }
        }

        Ok(best)
    }
}
