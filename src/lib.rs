//! Upper-body pose tracking from color and motion evidence.
//!
//! Per frame, blob candidates are matched to the face and hands
//! ([`assignment`]), neck and shoulders are hung off the face region, and a
//! two-segment-arm skeleton is refit against edge evidence by a
//! derivative-free [`optimizer`]. All per-stream state lives in a
//! [`TrackingContext`].

pub mod assignment;
pub mod bbox;
pub mod candidate;
pub mod config;
pub mod context;
pub mod error;
pub mod frame;
pub mod landmark;
pub mod math;
pub mod optimizer;
pub mod pose;
pub mod prior;
pub mod skeleton;

pub use candidate::Candidate;
pub use config::TrackerConfig;
pub use context::TrackingContext;
pub use error::Error;
pub use frame::Frame;
pub use landmark::{Landmark, LandmarkMap};
pub use pose::Pose;

use nalgebra as na;
use std::fmt;

pub trait Float: num_traits::FromPrimitive + na::RealField + Copy + fmt::Debug + 'static {}

impl<T> Float for T where T: num_traits::FromPrimitive + na::RealField + Copy + fmt::Debug + 'static {}
