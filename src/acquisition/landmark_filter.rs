//! Landmark Stream Filter
//!
//! Temporal conditioning of the raw pose stream before any geometry is
//! derived from it:
//!
//! - **Outlier gate**: a frame in which any confidently-tracked joint jumped
//!   further than `outlier_jump` since the last accepted frame is dropped
//! - **Ring buffer**: the last `buffer_capacity` accepted frames
//! - **Smoothing**: Gaussian-weighted average peaked at the newest frame
//!   (σ = buffer length / 3), ignoring low-visibility samples
//! - **Kinematics**: per-joint velocity over a 2-frame lag, acceleration from
//!   the velocity history, one-step prediction, and jitter
//!
//! All time derivatives use the frame timestamps. When timestamps are absent
//! or not increasing, the nominal interval `1 / assumed_fps` is used.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::FilterConfig;
use crate::types::{Landmark, LandmarkFrame};

/// Consecutive rejected frames after which the next frame is accepted
/// unconditionally, so a genuine repositioning is not filtered forever.
pub const RESYNC_AFTER_REJECTIONS: u32 = 5;

/// 3-component rate of change in normalized units per second (or per s²).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Motion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Motion {
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn between(from: &Landmark, to: &Landmark, dt: f64) -> Self {
        Self {
            x: (to.x - from.x) / dt,
            y: (to.y - from.y) / dt,
            z: (to.z - from.z) / dt,
        }
    }
}

/// Outcome of offering a frame to the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameVerdict {
    Accepted,
    /// Dropped as a detection glitch
    Rejected { joint: usize, jump: f64 },
}

#[derive(Debug, Clone, Copy)]
struct VelocitySample {
    velocity: Motion,
    timestamp_ms: u64,
}

/// Bounded history of accepted frames plus per-joint velocity history.
///
/// One instance per exercise session.
#[derive(Debug, Clone)]
pub struct LandmarkStreamFilter {
    config: FilterConfig,
    frames: VecDeque<LandmarkFrame>,
    velocities: Vec<VecDeque<VelocitySample>>,
    consecutive_rejections: u32,
    total_rejected: u64,
}

impl LandmarkStreamFilter {
    pub fn new(config: FilterConfig) -> Self {
        let capacity = config.buffer_capacity.max(1);
        Self {
            config,
            frames: VecDeque::with_capacity(capacity),
            velocities: Vec::new(),
            consecutive_rejections: 0,
            total_rejected: 0,
        }
    }

    /// Offer a frame. Accepted frames enter the ring buffer and update the
    /// per-joint velocity history.
    pub fn push(&mut self, frame: &LandmarkFrame) -> FrameVerdict {
        if let Some((joint, jump)) = self.first_confident_jump(frame) {
            if self.consecutive_rejections < RESYNC_AFTER_REJECTIONS {
                self.consecutive_rejections += 1;
                self.total_rejected += 1;
                debug!(
                    joint,
                    jump,
                    ts = frame.timestamp_ms,
                    "Landmark frame rejected as outlier"
                );
                return FrameVerdict::Rejected { joint, jump };
            }
            debug!(joint, "Outlier gate resynchronised after repeated rejections");
        }
        self.consecutive_rejections = 0;

        self.frames.push_back(frame.clone());
        while self.frames.len() > self.config.buffer_capacity.max(1) {
            self.frames.pop_front();
        }
        self.record_velocities();
        trace!(buffered = self.frames.len(), "Landmark frame accepted");
        FrameVerdict::Accepted
    }

    /// First confident joint that moved beyond the outlier threshold.
    fn first_confident_jump(&self, frame: &LandmarkFrame) -> Option<(usize, f64)> {
        let last = self.frames.back()?;
        frame
            .landmarks
            .iter()
            .zip(last.landmarks.iter())
            .enumerate()
            .filter(|(_, (cur, _))| cur.visibility > self.config.confidence_floor)
            .map(|(i, (cur, prev))| (i, cur.distance_2d(prev)))
            .find(|(_, jump)| *jump > self.config.outlier_jump)
    }

    fn record_velocities(&mut self) {
        let n = self.frames.len();
        if n < 3 {
            return;
        }
        let (current, lagged) = (&self.frames[n - 1], &self.frames[n - 3]);
        let dt = self.elapsed_secs(lagged.timestamp_ms, current.timestamp_ms, 2);

        let joints = current.len().min(lagged.len());
        if self.velocities.len() < joints {
            self.velocities.resize_with(joints, VecDeque::new);
        }
        for (j, history) in self.velocities.iter_mut().enumerate().take(joints) {
            history.push_back(VelocitySample {
                velocity: Motion::between(&lagged.landmarks[j], &current.landmarks[j], dt),
                timestamp_ms: current.timestamp_ms,
            });
            while history.len() > self.config.velocity_history.max(2) {
                history.pop_front();
            }
        }
    }

    /// Seconds between two timestamps spanning `frames` frame intervals.
    fn elapsed_secs(&self, from_ms: u64, to_ms: u64, frames: u32) -> f64 {
        if to_ms > from_ms {
            (to_ms - from_ms) as f64 / 1000.0
        } else {
            f64::from(frames) * self.config.nominal_dt()
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn latest(&self) -> Option<&LandmarkFrame> {
        self.frames.back()
    }

    /// The accepted frame before the latest one.
    pub fn previous(&self) -> Option<&LandmarkFrame> {
        self.frames.len().checked_sub(2).and_then(|i| self.frames.get(i))
    }

    pub fn total_rejected(&self) -> u64 {
        self.total_rejected
    }

    /// Seconds between the two most recent accepted frames.
    pub fn last_dt(&self) -> f64 {
        match (self.previous(), self.latest()) {
            (Some(prev), Some(cur)) => self.elapsed_secs(prev.timestamp_ms, cur.timestamp_ms, 1),
            _ => self.config.nominal_dt(),
        }
    }

    /// Gaussian-weighted position of one joint over the buffer.
    ///
    /// Samples at or below the confidence floor are excluded. If none remain,
    /// the newest raw landmark is returned unchanged.
    pub fn smoothed(&self, joint: usize) -> Option<Landmark> {
        let newest = *self.frames.back()?.get(joint)?;
        let weights = gaussian_weights(self.frames.len());

        let mut total = 0.0;
        let mut acc = Landmark::default();
        for (frame, w) in self.frames.iter().zip(weights) {
            if let Some(lm) = frame.get(joint).filter(|lm| lm.visibility > self.config.confidence_floor) {
                acc.x += lm.x * w;
                acc.y += lm.y * w;
                acc.z += lm.z * w;
                acc.visibility += lm.visibility * w;
                total += w;
            }
        }

        if total <= 0.0 {
            return Some(newest);
        }
        Some(Landmark::new(
            acc.x / total,
            acc.y / total,
            acc.z / total,
            acc.visibility / total,
        ))
    }

    /// Every joint of the newest frame, smoothed.
    pub fn smoothed_frame(&self) -> Vec<Landmark> {
        let joints = self.latest().map_or(0, LandmarkFrame::len);
        (0..joints).filter_map(|j| self.smoothed(j)).collect()
    }

    /// Latest velocity of one joint (zero until three frames are buffered).
    pub fn velocity(&self, joint: usize) -> Motion {
        self.velocities
            .get(joint)
            .and_then(VecDeque::back)
            .map(|s| s.velocity)
            .unwrap_or_default()
    }

    /// Change between the two most recent velocity samples of one joint.
    pub fn acceleration(&self, joint: usize) -> Motion {
        let Some(history) = self.velocities.get(joint) else {
            return Motion::default();
        };
        let n = history.len();
        if n < 2 {
            return Motion::default();
        }
        let (prev, cur) = (history[n - 2], history[n - 1]);
        let dt = self.elapsed_secs(prev.timestamp_ms, cur.timestamp_ms, 1);
        Motion {
            x: (cur.velocity.x - prev.velocity.x) / dt,
            y: (cur.velocity.y - prev.velocity.y) / dt,
            z: (cur.velocity.z - prev.velocity.z) / dt,
        }
    }

    /// Expected position of one joint one frame interval ahead.
    pub fn predict(&self, joint: usize) -> Option<Landmark> {
        let current = self.smoothed(joint)?;
        let v = self.velocity(joint);
        let dt = self.last_dt();
        Some(Landmark::new(
            current.x + v.x * dt,
            current.y + v.y * dt,
            current.z + v.z * dt,
            current.visibility,
        ))
    }

    /// Mean frame-to-frame planar displacement of one joint over the buffer.
    pub fn jitter(&self, joint: usize) -> f64 {
        if self.frames.len() < 2 {
            return 0.0;
        }
        let total: f64 = self
            .frames
            .iter()
            .zip(self.frames.iter().skip(1))
            .filter_map(|(prev, cur)| Some(cur.get(joint)?.distance_2d(prev.get(joint)?)))
            .sum();
        total / (self.frames.len() - 1) as f64
    }

    pub fn reset(&mut self) {
        self.frames.clear();
        self.velocities.clear();
        self.consecutive_rejections = 0;
        self.total_rejected = 0;
    }
}

/// Gaussian weights peaked at the last index with σ = len / 3.
fn gaussian_weights(len: usize) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }
    let sigma = len as f64 / 3.0;
    let mean = (len - 1) as f64;
    (0..len)
        .map(|i| (-(i as f64 - mean).powi(2) / (2.0 * sigma * sigma)).exp())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ts: u64, x: f64, visibility: f64) -> LandmarkFrame {
        LandmarkFrame::new(ts, vec![Landmark::new(x, 0.5, 0.0, visibility); 3])
    }

    fn filter() -> LandmarkStreamFilter {
        LandmarkStreamFilter::new(FilterConfig::default())
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut f = filter();
        for i in 0..15 {
            f.push(&frame(i * 33, 0.5 + i as f64 * 0.001, 1.0));
        }
        assert_eq!(f.len(), 10);
        assert_eq!(f.latest().unwrap().timestamp_ms, 14 * 33);
    }

    #[test]
    fn test_outlier_frame_is_rejected() {
        let mut f = filter();
        f.push(&frame(0, 0.5, 1.0));
        let verdict = f.push(&frame(33, 0.8, 1.0));
        assert!(matches!(verdict, FrameVerdict::Rejected { joint: 0, .. }));
        assert_eq!(f.len(), 1);
        assert_eq!(f.total_rejected(), 1);
    }

    #[test]
    fn test_low_visibility_jump_is_not_an_outlier() {
        let mut f = filter();
        f.push(&frame(0, 0.5, 1.0));
        assert_eq!(f.push(&frame(33, 0.9, 0.3)), FrameVerdict::Accepted);
    }

    #[test]
    fn test_resync_after_repeated_rejections() {
        let mut f = filter();
        f.push(&frame(0, 0.2, 1.0));
        for i in 0..RESYNC_AFTER_REJECTIONS {
            let v = f.push(&frame(33 * u64::from(i + 1), 0.8, 1.0));
            assert!(matches!(v, FrameVerdict::Rejected { .. }));
        }
        assert_eq!(f.push(&frame(1000, 0.8, 1.0)), FrameVerdict::Accepted);
    }

    #[test]
    fn test_velocity_uses_timestamps() {
        let mut f = filter();
        // 0.01 units per 100 ms = 0.1 units/s
        for i in 0..3 {
            f.push(&frame(i * 100, 0.5 + i as f64 * 0.01, 1.0));
        }
        assert!((f.velocity(0).x - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_falls_back_to_nominal_rate() {
        let mut f = filter();
        for i in 0..3 {
            f.push(&frame(0, 0.5 + i as f64 * 0.01, 1.0));
        }
        // 0.02 over 2 frames at 30 fps
        assert!((f.velocity(0).x - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_acceleration_from_velocity_history() {
        let mut f = filter();
        let xs = [0.50, 0.50, 0.50, 0.52];
        for (i, x) in xs.iter().enumerate() {
            f.push(&frame(i as u64 * 100, *x, 1.0));
        }
        // v: 0.0 then 0.1 units/s, 100 ms apart
        assert!((f.acceleration(0).x - 1.0).abs() < 1e-9);
        assert_eq!(f.acceleration(7), Motion::default());
    }

    #[test]
    fn test_smoothing_weights_recent_frames() {
        let mut f = filter();
        f.push(&frame(0, 0.40, 1.0));
        f.push(&frame(33, 0.50, 1.0));
        let s = f.smoothed(0).unwrap();
        assert!(s.x > 0.45 && s.x < 0.50, "smoothed x = {}", s.x);
    }

    #[test]
    fn test_smoothing_falls_back_to_raw_when_nothing_visible() {
        let mut f = filter();
        f.push(&frame(0, 0.40, 0.2));
        f.push(&frame(33, 0.41, 0.2));
        assert_eq!(f.smoothed(0).unwrap().x, 0.41);
    }

    #[test]
    fn test_jitter_is_mean_displacement() {
        let mut f = filter();
        f.push(&frame(0, 0.50, 1.0));
        f.push(&frame(33, 0.52, 1.0));
        f.push(&frame(66, 0.50, 1.0));
        assert!((f.jitter(0) - 0.02).abs() < 1e-9);
        assert_eq!(f.jitter(99), 0.0);
    }

    #[test]
    fn test_predict_extrapolates_one_interval() {
        let mut f = filter();
        for i in 0..3 {
            f.push(&frame(i * 100, 0.5 + i as f64 * 0.01, 1.0));
        }
        let smoothed = f.smoothed(0).unwrap().x;
        let predicted = f.predict(0).unwrap().x;
        assert!((predicted - (smoothed + 0.1 * 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_gaussian_weights_peak_at_newest() {
        let w = gaussian_weights(10);
        assert_eq!(w.len(), 10);
        assert!((w[9] - 1.0).abs() < 1e-12);
        assert!(w.windows(2).all(|p| p[0] < p[1]));
    }
}
