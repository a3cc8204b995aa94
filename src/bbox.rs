use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug {}

/// Left-top-width-height format, contains left top corner and width-height
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// X-y-width-height format, contains coordinates of the center of bbox and width-height
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Xywh;
impl BBoxFormat for Xywh {}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(bound = "")]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);

impl<F: BBoxFormat> BBox<F> {
    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Zero-area or non-finite boxes carry no usable geometry.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !self.0.iter().all(|v| v.is_finite()) || self.area() <= 0.0
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(left: f32, top: f32, width: f32, height: f32) -> Self {
        BBox([left, top, width, height], PhantomData)
    }

    /// Tight box around a point set, `None` for an empty set.
    pub fn bounding(points: &[na::Point2<f32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut l, mut t, mut r, mut b) = (first.x, first.y, first.x, first.y);

        for p in &points[1..] {
            l = l.min(p.x);
            t = t.min(p.y);
            r = r.max(p.x);
            b = b.max(p.y);
        }

        Some(Self::ltwh(l, t, r - l, b - t))
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[0] + self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[1] + self.0[3]
    }

    /// Midpoint of the top-left and bottom-right corners.
    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        self.as_xywh().center()
    }

    #[inline]
    pub fn as_xywh(&self) -> BBox<Xywh> {
        self.into()
    }
}

impl BBox<Xywh> {
    #[inline]
    pub fn xywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        BBox([cx, cy, width, height], PhantomData)
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        self.0[1]
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(self.cx(), self.cy())
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Xywh> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self(
            [v.0[0] + v.0[2] / 2.0, v.0[1] + v.0[3] / 2.0, v.0[2], v.0[3]],
            PhantomData,
        )
    }
}

impl<'a> From<&'a BBox<Xywh>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Xywh>) -> Self {
        Self(
            [v.0[0] - v.0[2] / 2.0, v.0[1] - v.0[3] / 2.0, v.0[2], v.0[3]],
            PhantomData,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_of_ltwh() {
        let b = BBox::ltwh(10.0, 10.0, 20.0, 30.0);
        let c = b.center();

        assert_relative_eq!(c.x, 20.0);
        assert_relative_eq!(c.y, 25.0);
        assert_relative_eq!(b.as_xywh().cx(), 20.0);
        assert_eq!(b.as_xywh().as_ltwh(), b);
    }

    #[test]
    fn box_around_center() {
        let b = BBox::xywh(50.0, 0.0, 10.0, 4.0).as_ltwh();

        assert_eq!(b, BBox::ltwh(45.0, -2.0, 10.0, 4.0));
        assert_eq!(b.center(), na::Point2::new(50.0, 0.0));
    }

    #[test]
    fn degenerate_boxes() {
        assert!(BBox::ltwh(1.0, 1.0, 0.0, 5.0).is_degenerate());
        assert!(BBox::ltwh(1.0, 1.0, f32::NAN, 5.0).is_degenerate());
        assert!(!BBox::ltwh(1.0, 1.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn bounding_points() {
        let pts = [
            na::Point2::new(3.0, 4.0),
            na::Point2::new(-1.0, 8.0),
            na::Point2::new(5.0, 2.0),
        ];
        let b = BBox::bounding(&pts).unwrap();

        assert_eq!(b, BBox::ltwh(-1.0, 2.0, 6.0, 6.0));
        assert!(BBox::bounding(&[]).is_none());
    }
}
