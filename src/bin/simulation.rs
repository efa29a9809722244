//! Synthetic Workout Simulation
//!
//! Generates side-on pose landmark streams for FormSense testing:
//! - Squats, push-ups and lunges as smooth rep cycles
//! - Plank holds with slow postural drift
//! - Gaussian landmark jitter
//! - Optional fault injection (knee valgus, hip sag)
//!
//! # Usage
//! ```bash
//! ./simulation --exercise squats --reps 10 --seed 7 | ./formsense --exercise squats
//! ```

use std::f64::consts::PI;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};

use formsense::types::{joints, Exercise, Landmark, LandmarkFrame, LANDMARK_COUNT};

// ============================================================================
// Pose Constants
// ============================================================================

/// Standing joint angle (deg)
const TOP_ANGLE: f64 = 175.0;
/// Shin and thigh length (normalized units)
const LEG_SEGMENT: f64 = 0.2;
/// Hip to shoulder length (normalized units)
const TORSO: f64 = 0.25;
/// Upper arm and forearm length (normalized units)
const ARM_SEGMENT: f64 = 0.12;
/// Floor line in image coordinates
const FLOOR_Y: f64 = 0.9;
/// Standing still before the first rep (s)
const LEAD_IN_S: f64 = 1.0;
/// Pause at the top between reps (s)
const REST_S: f64 = 0.5;
/// Knee shift at full depth when valgus is injected
const VALGUS_SHIFT: f64 = 0.06;
/// Hip drop at full depth (or during a plank) when sag is injected
const SAG_DROP: f64 = 0.08;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InjectedFault {
    None,
    KneeValgus,
    HipSag,
}

#[derive(Parser, Debug)]
#[command(name = "simulation")]
#[command(about = "Synthetic pose landmark streams for FormSense testing")]
#[command(version = "1.0")]
struct Args {
    /// Exercise id: squats, pushups, lunges or plank
    #[arg(short, long, default_value = "squats")]
    exercise: String,

    /// Number of reps (plank: number of rep-length hold segments)
    #[arg(short, long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=500))]
    reps: u32,

    /// Seconds per rep
    #[arg(long, default_value = "2.0")]
    rep_seconds: f64,

    /// Output frame rate
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(5..=120))]
    fps: u32,

    /// Standard deviation of landmark jitter (normalized units)
    #[arg(long, default_value = "0.002")]
    jitter: f64,

    /// Fault to inject
    #[arg(long, value_enum, default_value = "none")]
    fault: InjectedFault,

    /// Probability that a rep carries the injected fault
    #[arg(long, default_value = "0.5")]
    fault_probability: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress the stderr briefing
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================================
// Pose Builders
// ============================================================================

/// Skeleton with every landmark parked near the head.
fn skeleton(head: (f64, f64)) -> Vec<Landmark> {
    vec![Landmark::new(head.0, head.1, 0.0, 0.95); LANDMARK_COUNT]
}

fn set_both(l: &mut [Landmark], left: usize, right: usize, x: f64, y: f64) {
    l[left] = Landmark::new(x, y, 0.0, 0.97);
    l[right] = Landmark::new(x, y, 0.0, 0.97);
}

/// Side-on squat: vertical shins, upright torso.
fn squat_pose(knee_deg: f64, depth: f64, fault: InjectedFault) -> Vec<Landmark> {
    let theta = knee_deg.to_radians();
    let (kx, ky) = (0.5, FLOOR_Y - LEG_SEGMENT);
    let hx = kx - LEG_SEGMENT * theta.sin();
    let mut hy = ky + LEG_SEGMENT * theta.cos();
    if fault == InjectedFault::HipSag {
        hy += SAG_DROP * depth * 0.5;
    }

    let mut l = skeleton((hx, hy - TORSO - 0.08));
    set_both(&mut l, joints::LEFT_ANKLE, joints::RIGHT_ANKLE, kx, FLOOR_Y);
    set_both(&mut l, joints::LEFT_KNEE, joints::RIGHT_KNEE, kx, ky);
    set_both(&mut l, joints::LEFT_HIP, joints::RIGHT_HIP, hx, hy);
    set_both(&mut l, joints::LEFT_SHOULDER, joints::RIGHT_SHOULDER, hx, hy - TORSO);
    set_both(&mut l, joints::LEFT_ELBOW, joints::RIGHT_ELBOW, hx + 0.05, hy - TORSO + 0.1);
    set_both(&mut l, joints::LEFT_WRIST, joints::RIGHT_WRIST, hx + 0.15, hy - TORSO + 0.1);
    if fault == InjectedFault::KneeValgus {
        l[joints::LEFT_KNEE].x += VALGUS_SHIFT * depth;
    }
    l
}

/// Side-on push-up facing left, pivoting on the toes.
fn pushup_pose(elbow_deg: f64, depth: f64, fault: InjectedFault) -> Vec<Landmark> {
    let wrist = (0.35, FLOOR_Y - 0.05);
    let ankle = (0.9, FLOOR_Y - 0.05);
    let reach = 2.0 * ARM_SEGMENT * (elbow_deg.to_radians() / 2.0).sin();
    let shoulder = (wrist.0, wrist.1 - reach);
    let offset = (ARM_SEGMENT * ARM_SEGMENT - (reach / 2.0).powi(2)).max(0.0).sqrt();
    let elbow = (wrist.0 + offset, wrist.1 - reach / 2.0);

    let mut hip = ((shoulder.0 + ankle.0) / 2.0, (shoulder.1 + ankle.1) / 2.0);
    if fault == InjectedFault::HipSag {
        hip.1 += SAG_DROP * (0.5 + depth * 0.5);
    }
    let knee = ((hip.0 + ankle.0) / 2.0, (hip.1 + ankle.1) / 2.0);

    let mut l = skeleton((shoulder.0 - 0.08, shoulder.1 - 0.02));
    set_both(&mut l, joints::LEFT_WRIST, joints::RIGHT_WRIST, wrist.0, wrist.1);
    set_both(&mut l, joints::LEFT_ELBOW, joints::RIGHT_ELBOW, elbow.0, elbow.1);
    set_both(&mut l, joints::LEFT_SHOULDER, joints::RIGHT_SHOULDER, shoulder.0, shoulder.1);
    set_both(&mut l, joints::LEFT_HIP, joints::RIGHT_HIP, hip.0, hip.1);
    set_both(&mut l, joints::LEFT_KNEE, joints::RIGHT_KNEE, knee.0, knee.1);
    set_both(&mut l, joints::LEFT_ANKLE, joints::RIGHT_ANKLE, ankle.0, ankle.1);
    l
}

/// Side-on lunge: left leg forward with a vertical shin.
fn lunge_pose(knee_deg: f64, fault: InjectedFault, depth: f64) -> Vec<Landmark> {
    let theta = knee_deg.to_radians();
    let front_ankle = (0.4, FLOOR_Y);
    let back_ankle = (0.65, FLOOR_Y);
    let front_knee = (front_ankle.0, FLOOR_Y - LEG_SEGMENT);
    let hip = (
        front_knee.0 + LEG_SEGMENT * theta.sin(),
        front_knee.1 + LEG_SEGMENT * theta.cos(),
    );
    let back_knee = ((hip.0 + back_ankle.0) / 2.0, (hip.1 + back_ankle.1) / 2.0 + 0.02);

    let mut l = skeleton((hip.0, hip.1 - TORSO - 0.08));
    l[joints::LEFT_ANKLE] = Landmark::new(front_ankle.0, front_ankle.1, 0.0, 0.97);
    l[joints::RIGHT_ANKLE] = Landmark::new(back_ankle.0, back_ankle.1, 0.0, 0.97);
    l[joints::LEFT_KNEE] = Landmark::new(front_knee.0, front_knee.1, 0.0, 0.97);
    l[joints::RIGHT_KNEE] = Landmark::new(back_knee.0, back_knee.1, 0.0, 0.97);
    set_both(&mut l, joints::LEFT_HIP, joints::RIGHT_HIP, hip.0, hip.1);
    set_both(&mut l, joints::LEFT_SHOULDER, joints::RIGHT_SHOULDER, hip.0, hip.1 - TORSO);
    set_both(&mut l, joints::LEFT_ELBOW, joints::RIGHT_ELBOW, hip.0, hip.1 - TORSO + 0.12);
    set_both(&mut l, joints::LEFT_WRIST, joints::RIGHT_WRIST, hip.0, hip.1 - TORSO + 0.22);
    if fault == InjectedFault::KneeValgus {
        l[joints::LEFT_KNEE].x -= VALGUS_SHIFT * depth;
    }
    l
}

/// Forearm plank facing left.
fn plank_pose(drift: f64, fault: InjectedFault) -> Vec<Landmark> {
    let shoulder = (0.3, 0.6);
    let ankle = (0.85, 0.62);
    let mut hip = (0.575, 0.61 + drift);
    if fault == InjectedFault::HipSag {
        hip.1 += SAG_DROP;
    }
    let knee = ((hip.0 + ankle.0) / 2.0, (hip.1 + ankle.1) / 2.0);

    let mut l = skeleton((shoulder.0 - 0.08, shoulder.1 - 0.03));
    set_both(&mut l, joints::LEFT_SHOULDER, joints::RIGHT_SHOULDER, shoulder.0, shoulder.1);
    set_both(&mut l, joints::LEFT_ELBOW, joints::RIGHT_ELBOW, shoulder.0, shoulder.1 + 0.12);
    set_both(&mut l, joints::LEFT_WRIST, joints::RIGHT_WRIST, shoulder.0 - 0.12, shoulder.1 + 0.12);
    set_both(&mut l, joints::LEFT_HIP, joints::RIGHT_HIP, hip.0, hip.1);
    set_both(&mut l, joints::LEFT_KNEE, joints::RIGHT_KNEE, knee.0, knee.1);
    set_both(&mut l, joints::LEFT_ANKLE, joints::RIGHT_ANKLE, ankle.0, ankle.1);
    l
}

// ============================================================================
// Simulation State
// ============================================================================

struct SimulationState {
    rng: StdRng,
    exercise: Exercise,
    jitter: Normal<f64>,
    frames_generated: u64,
    faulty_reps: u32,
}

impl SimulationState {
    fn new(exercise: Exercise, jitter: f64, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            exercise,
            jitter: Normal::new(0.0, jitter).context("Invalid jitter standard deviation")?,
            frames_generated: 0,
            faulty_reps: 0,
        })
    }

    fn bottom_angle(&self) -> f64 {
        match self.exercise {
            Exercise::Squats | Exercise::Lunges => 90.0,
            Exercise::Pushups => 80.0,
            Exercise::Plank => TOP_ANGLE,
        }
    }

    /// Pose at `depth` (0 = top, 1 = bottom of the rep).
    fn pose(&self, depth: f64, fault: InjectedFault, hold_s: f64) -> Vec<Landmark> {
        let angle = TOP_ANGLE - (TOP_ANGLE - self.bottom_angle()) * depth;
        match self.exercise {
            Exercise::Squats => squat_pose(angle, depth, fault),
            Exercise::Pushups => pushup_pose(angle, depth, fault),
            Exercise::Lunges => lunge_pose(angle, fault, depth),
            Exercise::Plank => plank_pose(0.004 * (hold_s * 0.7).sin(), fault),
        }
    }

    fn emit(&mut self, out: &mut impl Write, timestamp_ms: u64, mut landmarks: Vec<Landmark>) -> Result<()> {
        for lm in &mut landmarks {
            lm.x += self.jitter.sample(&mut self.rng);
            lm.y += self.jitter.sample(&mut self.rng);
        }
        let frame = LandmarkFrame::new(timestamp_ms, landmarks);
        serde_json::to_writer(&mut *out, &frame).context("Failed to encode frame")?;
        writeln!(out).context("Failed to write frame")?;
        self.frames_generated += 1;
        Ok(())
    }
}

fn log_mission(msg: &str, quiet: bool) {
    if !quiet {
        eprintln!("[SIM] {msg}");
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    let exercise = Exercise::from_id(&args.exercise)
        .with_context(|| format!("Unknown exercise '{}'", args.exercise))?;
    let mut state = SimulationState::new(exercise, args.jitter.max(0.0), args.seed)?;

    let dt_ms = 1000.0 / f64::from(args.fps);
    let rep_s = args.rep_seconds.max(0.4);
    let fault_p = args.fault_probability.clamp(0.0, 1.0);

    log_mission(&"=".repeat(60), args.quiet);
    log_mission(&format!("FORMSENSE SIMULATION: {}", exercise.display_name()), args.quiet);
    log_mission(&format!("  Reps: {} x {:.1}s at {} fps", args.reps, rep_s, args.fps), args.quiet);
    log_mission(&format!("  Fault: {:?} (p = {:.2})", args.fault, fault_p), args.quiet);
    if let Some(seed) = args.seed {
        log_mission(&format!("  Random seed: {seed}"), args.quiet);
    }
    log_mission(&"=".repeat(60), args.quiet);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut t_s = 0.0_f64;
    let mut frame_index = 0u64;
    let mut next_ts = |t: &mut f64| {
        let ts = (frame_index as f64 * dt_ms).round() as u64;
        frame_index += 1;
        *t = ts as f64 / 1000.0;
        ts
    };

    // Lead-in at the start position
    while t_s < LEAD_IN_S {
        let ts = next_ts(&mut t_s);
        let pose = state.pose(0.0, InjectedFault::None, t_s);
        state.emit(&mut out, ts, pose)?;
    }

    for rep in 0..args.reps {
        let fault = if args.fault != InjectedFault::None && state.rng.gen_bool(fault_p) {
            state.faulty_reps += 1;
            args.fault
        } else {
            InjectedFault::None
        };

        let start = t_s;
        let end = start + rep_s + REST_S;
        while t_s < end {
            let ts = next_ts(&mut t_s);
            let phase = ((t_s - start) / rep_s).min(1.0);
            let depth = if exercise.is_isometric() {
                0.0
            } else {
                (1.0 - (2.0 * PI * phase).cos()) / 2.0
            };
            let pose = state.pose(depth, fault, t_s);
            state.emit(&mut out, ts, pose)?;
        }
        if !args.quiet && (rep + 1) % 5 == 0 {
            log_mission(&format!("  {} reps generated", rep + 1), args.quiet);
        }
    }
    out.flush().context("Failed to flush output")?;

    log_mission(&"=".repeat(60), args.quiet);
    log_mission(
        &format!(
            "SIMULATION COMPLETE: {} frames, {} faulty reps, {:.1}s",
            state.frames_generated, state.faulty_reps, t_s
        ),
        args.quiet,
    );
    Ok(())
}
