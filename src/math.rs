use crate::Float;
use nalgebra as na;

/// Gaussian falloff of a squared distance against a combined squared spread,
/// `exp(-d² / 2s²)`. Returns zero when the spread is not positive.
#[inline]
pub fn gauss_sq<F: Float>(dist_sq: F, spread_sq: F) -> F {
    if spread_sq <= F::zero() {
        return F::zero();
    }

    let two = F::one() + F::one();

    (-dist_sq / (two * spread_sq)).exp()
}

/// Euclidean distance from `p` to the closed segment `a..b`.
pub fn segment_distance(p: na::Point2<f32>, a: na::Point2<f32>, b: na::Point2<f32>) -> f32 {
    let ab = b - a;
    let len_sq = ab.norm_squared();

    if len_sq <= f32::EPSILON {
        return na::distance(&p, &a);
    }

    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);

    na::distance(&p, &(a + ab * t))
}

/// Index of the point closest to `target`.
pub fn nearest_index(points: &[na::Point2<f32>], target: na::Point2<f32>) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(idx, p)| (idx, na::distance_squared(p, &target)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(idx, _)| idx)
}

/// Index half way round a closed contour of `len` points.
#[inline]
pub fn opposite_index(idx: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }

    (idx + len / 2) % len
}
