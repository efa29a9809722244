//! FormSense replay CLI
//!
//! Streams JSON-lines landmark frames through one analysis session and
//! prints the coaching the voice layer would hear.
//!
//! # Usage
//!
//! ```bash
//! # Replay a recorded session
//! formsense --exercise squats recording.jsonl
//!
//! # Pipe a synthetic session
//! simulation --exercise pushups --reps 8 | formsense --exercise pushups
//! ```
//!
//! # Environment Variables
//!
//! - `FORMSENSE_CONFIG`: Path to a TOML config (overridden by `--config`)
//! - `RUST_LOG`: Logging level (default: info)

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use formsense::acquisition::FrameReader;
use formsense::config::{self, CoachConfig};
use formsense::{AnalysisResult, AnalysisSession, Exercise, SessionSummary};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "formsense")]
#[command(about = "Replay pose landmark streams through the FormSense coach")]
#[command(version)]
struct CliArgs {
    /// JSON-lines landmark frames (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Exercise id: squats, pushups, lunges or plank
    #[arg(short, long, default_value = "squats")]
    exercise: String,

    /// Body weight used for momentum, power and calories
    #[arg(long, default_value_t = 70.0)]
    weight_kg: f64,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print every frame's result instead of delivered feedback only
    #[arg(long)]
    all: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<CoachConfig> {
    match path {
        Some(path) => CoachConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(CoachConfig::load()),
    }
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn print_result(result: &AnalysisResult) {
    let secs = result.timestamp_ms as f64 / 1000.0;
    let marker = if result.should_deliver { "🔊" } else { "  " };
    println!(
        "{marker} [{secs:>8.2}s] {:<8} reps={:<3} form={:>5.1} {}",
        result.phase.to_string(),
        result.rep_count,
        result.form_score,
        result.feedback.message,
    );
    if result.should_deliver && !result.feedback.voice_message.is_empty() {
        println!("      \"{}\"", result.feedback.voice_message);
    }
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    if Exercise::from_id(&args.exercise).is_none() {
        warn!(exercise = %args.exercise, "Unknown exercise id; every frame will report it");
    }

    config::init(load_config(args.config.as_ref())?);
    let mut session = AnalysisSession::new(config::snapshot());
    let reader = FrameReader::new(open_input(args.input.as_ref())?);

    let started = chrono::Utc::now();
    info!(exercise = %args.exercise, weight_kg = args.weight_kg, "Replay started");

    let mut frames = 0u64;
    for frame in reader {
        let frame = frame.context("Failed to read landmark stream")?;
        let result = session.analyze(
            &args.exercise,
            &frame,
            session.phase(),
            session.rep_count(),
            args.weight_kg,
        );
        frames += 1;
        if args.all || result.should_deliver {
            print_result(&result);
        }
    }

    let elapsed_ms = (chrono::Utc::now() - started).num_milliseconds();
    info!(frames, reps = session.rep_count(), elapsed_ms, "Replay finished");

    let summary = SessionSummary::from_session(&session, args.weight_kg);
    println!("{}", summary.to_json().context("Failed to serialise session summary")?);
    Ok(())
}
