//! Adaptive Risk Model - Personal Baselines, Fatigue & Injury Risk
//!
//! Learns the athlete's own baseline from a rolling window of completed reps
//! and derives personalised thresholds from it. Every estimate is a plain
//! statistical formula exposed as a pure function; `AdaptiveRiskModel` only
//! owns the window.
//!
//! ## Estimates
//!
//! - Adaptive threshold: `mean − 0.5σ` of a metric (population σ), beginner
//!   defaults below `min_samples`
//! - Fatigue: mean form of the newest `fatigue_window` reps vs the
//!   `fatigue_window` before them
//! - Injury risk: ROM spike + rushed tempo + a share of fatigue severity
//! - Movement quality: form, smoothness, control and efficiency blend

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

use crate::config::AdaptiveConfig;
use crate::types::{BiomechanicalSnapshot, FatigueStatus, MovementQuality, PhysicsSnapshot};

/// Weight of the adaptive-threshold standard deviation.
pub const THRESHOLD_SIGMA: f64 = 0.5;

// ============================================================================
// Samples
// ============================================================================

/// One completed rep as seen by the adaptive model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepSample {
    pub form_score: f64,
    /// Driving-angle range covered by the rep (degrees)
    pub range_of_motion: f64,
    /// Rep duration (seconds)
    pub tempo_s: f64,
}

/// Metric with a personalised threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptiveMetric {
    FormScore,
    RangeOfMotion,
    Tempo,
}

impl AdaptiveMetric {
    fn of(self, sample: &RepSample) -> f64 {
        match self {
            AdaptiveMetric::FormScore => sample.form_score,
            AdaptiveMetric::RangeOfMotion => sample.range_of_motion,
            AdaptiveMetric::Tempo => sample.tempo_s,
        }
    }

    fn fallback(self, cfg: &AdaptiveConfig) -> f64 {
        match self {
            AdaptiveMetric::FormScore => cfg.default_form_threshold,
            AdaptiveMetric::RangeOfMotion => cfg.default_rom_threshold,
            AdaptiveMetric::Tempo => cfg.default_tempo_threshold,
        }
    }
}

// ============================================================================
// Pure Estimators
// ============================================================================

/// `mean − 0.5σ` of `values`, or `fallback` with fewer than `min_samples`.
pub fn adaptive_threshold(values: &[f64], min_samples: usize, fallback: f64) -> f64 {
    if values.len() < min_samples.max(1) {
        return fallback;
    }
    let mean = values.iter().mean();
    let sd = if values.len() > 1 {
        values.iter().population_std_dev()
    } else {
        0.0
    };
    mean - THRESHOLD_SIGMA * sd
}

/// Compare the newest `window` form scores with the `window` before them.
///
/// Needs at least `2 × window` scores; otherwise reports no fatigue.
pub fn detect_fatigue(form_scores: &[f64], cfg: &AdaptiveConfig) -> FatigueStatus {
    let w = cfg.fatigue_window;
    if w == 0 || form_scores.len() < 2 * w {
        return FatigueStatus::default();
    }
    let n = form_scores.len();
    let recent = form_scores[n - w..].iter().mean();
    let previous = form_scores[n - 2 * w..n - w].iter().mean();
    let drop = previous - recent;

    FatigueStatus {
        is_fatigued: drop >= cfg.fatigue_drop,
        severity: (drop * cfg.fatigue_severity_gain).clamp(0.0, 100.0),
    }
}

/// Heuristic injury risk (0..=100) of `current` against the learned window.
///
/// Zero until `injury_min_samples` reps are known.
pub fn predict_injury_risk(history: &[RepSample], current: &RepSample, cfg: &AdaptiveConfig) -> f64 {
    if history.len() < cfg.injury_min_samples.max(1) {
        return 0.0;
    }
    let mean_rom = history.iter().map(|s| s.range_of_motion).mean();
    let mean_tempo = history.iter().map(|s| s.tempo_s).mean();

    let mut risk = 0.0;
    if current.range_of_motion > mean_rom * cfg.rom_excess_ratio {
        risk += cfg.rom_risk;
    }
    if current.tempo_s < mean_tempo * cfg.tempo_ratio {
        risk += cfg.tempo_risk;
    }

    let forms: Vec<f64> = history.iter().map(|s| s.form_score).collect();
    let fatigue = detect_fatigue(&forms, cfg);
    if fatigue.is_fatigued {
        risk += fatigue.severity * cfg.fatigue_risk_weight;
    }
    risk.min(100.0)
}

/// Blend form with smoothness, control and efficiency (0.4/0.25/0.2/0.15).
///
/// - smoothness: stability (60%) and closeness to `target_velocity` (40%)
/// - control: balance (70%) and asymmetry penalty (30%)
/// - efficiency: normalised power (50%) and balance (50%)
pub fn assess_movement_quality(
    form_score: f64,
    physics: &PhysicsSnapshot,
    bio: &BiomechanicalSnapshot,
    target_velocity: f64,
) -> MovementQuality {
    let velocity_score = (100.0 - (physics.velocity - target_velocity).abs() * 100.0).max(0.0);
    let smoothness = (physics.stability * 0.6 + velocity_score * 0.4).clamp(0.0, 100.0);
    let control = (bio.balance_score * 0.7 + (100.0 - bio.asymmetry * 2.0) * 0.3).clamp(0.0, 100.0);
    let power = (physics.power_output / 5.0).clamp(0.0, 100.0);
    let efficiency = (power * 0.5 + bio.balance_score * 0.5).clamp(0.0, 100.0);

    let overall = form_score * 0.4 + smoothness * 0.25 + control * 0.2 + efficiency * 0.15;
    MovementQuality {
        overall: overall.clamp(0.0, 100.0),
        smoothness,
        control,
        efficiency,
    }
}

// ============================================================================
// Rolling Model
// ============================================================================

/// Session-scoped rolling window of completed reps.
#[derive(Debug, Clone)]
pub struct AdaptiveRiskModel {
    config: AdaptiveConfig,
    samples: VecDeque<RepSample>,
}

impl AdaptiveRiskModel {
    pub fn new(config: AdaptiveConfig) -> Self {
        Self {
            samples: VecDeque::with_capacity(config.window),
            config,
        }
    }

    /// Append a rep, evicting the oldest beyond the window.
    ///
    /// Non-finite samples are ignored.
    pub fn record(&mut self, sample: RepSample) {
        if !(sample.form_score.is_finite()
            && sample.range_of_motion.is_finite()
            && sample.tempo_s.is_finite())
        {
            return;
        }
        self.samples.push_back(sample);
        while self.samples.len() > self.config.window {
            self.samples.pop_front();
        }
        debug!(
            samples = self.samples.len(),
            form = format!("{:.1}", sample.form_score),
            "Adaptive sample recorded"
        );
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &RepSample> {
        self.samples.iter()
    }

    fn values(&self, metric: AdaptiveMetric) -> Vec<f64> {
        self.samples.iter().map(|s| metric.of(s)).collect()
    }

    pub fn threshold(&self, metric: AdaptiveMetric) -> f64 {
        adaptive_threshold(
            &self.values(metric),
            self.config.min_samples,
            metric.fallback(&self.config),
        )
    }

    pub fn fatigue(&self) -> FatigueStatus {
        detect_fatigue(&self.values(AdaptiveMetric::FormScore), &self.config)
    }

    /// Risk of `current` against the reps recorded so far.
    pub fn injury_risk(&self, current: &RepSample) -> f64 {
        let history: Vec<RepSample> = self.samples.iter().copied().collect();
        predict_injury_risk(&history, current, &self.config)
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
