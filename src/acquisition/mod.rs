//! Pose data acquisition
//!
//! Conditions the incoming landmark stream and reads recorded streams.

pub mod frame_source;
pub mod landmark_filter;

pub use frame_source::{FrameReader, FrameSourceError};
pub use landmark_filter::{FrameVerdict, LandmarkStreamFilter, Motion};
