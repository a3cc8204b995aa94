use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltwh};

/// One connected foreground/skin region detected in the current frame.
///
/// The centroid follows the box geometry (midpoint of the corners), the
/// contour is the region outline in image coordinates and may be empty when
/// the detector only reports boxes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Candidate {
    pub centroid: na::Point2<f32>,
    pub bbox: BBox<Ltwh>,
    #[serde(default)]
    pub contour: Vec<na::Point2<f32>>,
}

impl Candidate {
    pub fn new(centroid: na::Point2<f32>, bbox: BBox<Ltwh>) -> Self {
        Self {
            centroid,
            bbox,
            contour: Vec::new(),
        }
    }

    /// Candidate from a left-top-width-height box, centroid at the box centre.
    pub fn from_ltwh(left: f32, top: f32, width: f32, height: f32) -> Self {
        let bbox = BBox::ltwh(left, top, width, height);

        Self::new(bbox.center(), bbox)
    }

    /// Candidate from a region outline. `None` for an empty outline.
    pub fn from_contour(contour: Vec<na::Point2<f32>>) -> Option<Self> {
        let bbox = BBox::bounding(&contour)?;

        Some(Self {
            centroid: bbox.center(),
            bbox,
            contour,
        })
    }

    pub fn with_contour(mut self, contour: Vec<na::Point2<f32>>) -> Self {
        self.contour = contour;
        self
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.bbox.width()
    }

    /// A region whose outline cannot be walked around.
    #[inline]
    pub fn has_degenerate_contour(&self) -> bool {
        self.contour.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_from_box() {
        let c = Candidate::from_ltwh(10.0, 10.0, 20.0, 20.0);

        assert_eq!(c.centroid, na::Point2::new(20.0, 20.0));
        assert!(c.has_degenerate_contour());
    }

    #[test]
    fn centroid_from_contour() {
        let contour = vec![
            na::Point2::new(0.0, 0.0),
            na::Point2::new(10.0, 0.0),
            na::Point2::new(10.0, 4.0),
            na::Point2::new(0.0, 4.0),
        ];
        let c = Candidate::from_contour(contour).unwrap();

        assert_eq!(c.centroid, na::Point2::new(5.0, 2.0));
        assert_eq!(c.width(), 10.0);
        assert!(!c.has_degenerate_contour());
        assert!(Candidate::from_contour(Vec::new()).is_none());
    }
}
