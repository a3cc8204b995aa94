use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    Face,
    LeftHand,
    RightHand,
    Neck,
    LeftShoulder,
    RightShoulder,
}

impl Landmark {
    pub const COUNT: usize = 6;

    pub const ALL: [Landmark; Landmark::COUNT] = [
        Landmark::Face,
        Landmark::LeftHand,
        Landmark::RightHand,
        Landmark::Neck,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
    ];

    /// Landmarks located from per-frame evidence; the rest are derived.
    pub const TRACKED: [Landmark; 3] = [Landmark::Face, Landmark::LeftHand, Landmark::RightHand];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Landmark::Face => "face",
            Landmark::LeftHand => "left_hand",
            Landmark::RightHand => "right_hand",
            Landmark::Neck => "neck",
            Landmark::LeftShoulder => "left_shoulder",
            Landmark::RightShoulder => "right_shoulder",
        }
    }
}

/// Fixed table with one value per landmark; every slot is always populated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LandmarkTable<T>([T; Landmark::COUNT]);

pub type LandmarkMap = LandmarkTable<na::Point2<f32>>;

impl<T: Copy> LandmarkTable<T> {
    pub fn filled(value: T) -> Self {
        Self([value; Landmark::COUNT])
    }

    #[inline]
    pub fn get(&self, lm: Landmark) -> T {
        self.0[lm.index()]
    }

    #[inline]
    pub fn set(&mut self, lm: Landmark, value: T) {
        self.0[lm.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Landmark, T)> + '_ {
        Landmark::ALL.iter().map(move |&lm| (lm, self.0[lm.index()]))
    }
}

impl<T> Index<Landmark> for LandmarkTable<T> {
    type Output = T;

    #[inline]
    fn index(&self, lm: Landmark) -> &T {
        &self.0[lm.index()]
    }
}

impl<T> IndexMut<Landmark> for LandmarkTable<T> {
    #[inline]
    fn index_mut(&mut self, lm: Landmark) -> &mut T {
        &mut self.0[lm.index()]
    }
}
