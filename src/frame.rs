use ndarray::{Array2, Zip};

use crate::candidate::Candidate;
use crate::error::Error;

/// Evidence handed over by the image-processing stage for one video frame.
///
/// All maps are indexed `[[y, x]]` and share the frame dimensions. Values are
/// likelihoods in `[0, 1]`; binary masks use 0 and 1.
#[derive(Debug, Clone)]
pub struct Frame {
    pub dims: (usize, usize),
    pub foreground: Array2<f32>,
    pub skin: Array2<f32>,
    pub edges: Array2<f32>,
    pub candidates: Vec<Candidate>,
    /// Raw intensity, used for motion and background tracking.
    pub luminance: Option<Array2<f32>>,
}

impl Frame {
    /// Frame of the given size with empty evidence.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            dims: (width, height),
            foreground: Array2::zeros((height, width)),
            skin: Array2::zeros((height, width)),
            edges: Array2::zeros((height, width)),
            candidates: Vec::new(),
            luminance: None,
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.dims.0
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.dims.1
    }

    pub fn validate(&self) -> Result<(), Error> {
        let (w, h) = self.dims;
        if w == 0 || h == 0 {
            return Err(Error::EmptyFrame);
        }

        let maps = [
            ("foreground", Some(&self.foreground)),
            ("skin", Some(&self.skin)),
            ("edges", Some(&self.edges)),
            ("luminance", self.luminance.as_ref()),
        ];

        for (name, map) in maps {
            if let Some(map) = map {
                if map.dim() != (h, w) {
                    return Err(Error::ShapeMismatch {
                        name,
                        expected: (h, w),
                        found: map.dim(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Pixels that count toward skeleton agreement: edges inside the
    /// foreground.
    pub fn fitting_evidence(&self, threshold: f32) -> Array2<bool> {
        let mut out = Array2::from_elem(self.edges.dim(), false);

        Zip::from(&mut out)
            .and(&self.edges)
            .and(&self.foreground)
            .for_each(|o, &e, &f| *o = e > threshold && f > threshold);

        out
    }

    /// Foreground value at the frame centre.
    pub fn center_foreground(&self) -> f32 {
        let (w, h) = self.dims;

        self.foreground
            .get([h / 2, w / 2])
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_mismatched_map() {
        let mut frame = Frame::empty(8, 6);
        assert_eq!(frame.validate(), Ok(()));

        frame.skin = Array2::zeros((8, 6));
        assert_eq!(
            frame.validate(),
            Err(Error::ShapeMismatch {
                name: "skin",
                expected: (6, 8),
                found: (8, 6)
            })
        );

        let mut frame = Frame::empty(8, 6);
        frame.luminance = Some(Array2::zeros((6, 7)));
        assert!(matches!(
            frame.validate(),
            Err(Error::ShapeMismatch { name: "luminance", .. })
        ));

        assert_eq!(Frame::empty(0, 6).validate(), Err(Error::EmptyFrame));
    }

    #[test]
    fn evidence_is_edges_inside_foreground() {
        let mut frame = Frame::empty(4, 4);
        frame.edges[[1, 1]] = 1.0;
        frame.edges[[2, 2]] = 1.0;
        frame.foreground[[1, 1]] = 1.0;

        let ev = frame.fitting_evidence(0.5);
        assert!(ev[[1, 1]]);
        assert!(!ev[[2, 2]]);
        assert_eq!(ev.iter().filter(|&&v| v).count(), 1);
    }

    #[test]
    fn center_sample() {
        let mut frame = Frame::empty(10, 6);
        frame.foreground[[3, 5]] = 1.0;

        assert_eq!(frame.center_foreground(), 1.0);
    }
}
