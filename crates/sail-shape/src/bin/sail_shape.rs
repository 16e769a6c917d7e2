//! `sail-shape`: print draft, camber and twist for every tagged stripe.

use clap::{Args, Parser, Subcommand};
use log::info;
use sail_shape::calibration::CalibrationData;
use sail_shape::diagnostics::PngDiagnostics;
use sail_shape::io::{MeasureConfig, MeasureReport};
use sail_shape::measure::{gray_view, load_gray, measure_sail_shape, measure_sail_shape_with_diagnostics};
use sail_shape::pose::estimate_marker_pose;
use sail_shape::{StripeOutcome, TagDetector};
use std::path::PathBuf;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "sail-shape")]
#[command(about = "Measure sail draft, camber and twist from a photo of tagged draft stripes")]
#[command(version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    measure: MeasureArgs,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the distance to the first detected tag.
    Pose(PoseArgs),
}

#[derive(Debug, Args)]
struct MeasureArgs {
    /// Image of the sail.
    picture: Option<PathBuf>,

    /// JSON configuration (detector and stripe parameters).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON report here.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write binarized and annotated stripe crops into this directory.
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PoseArgs {
    /// Image containing at least one tag.
    picture: PathBuf,

    /// Camera calibration JSON with `mtx` and `dist`.
    #[arg(long)]
    cal_file: PathBuf,

    /// Printed marker side length in meters.
    #[arg(long, default_value_t = 0.19)]
    marker_length: f64,

    /// JSON configuration for the tag detector.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    #[cfg(feature = "tracing")]
    sail_shape::core::init_tracing(cli.verbose, false);
    #[cfg(not(feature = "tracing"))]
    sail_shape::core::init_with_verbosity(cli.verbose)?;

    match cli.command {
        Some(Commands::Pose(args)) => run_pose(&args),
        None => run_measure(&cli.measure),
    }
}

fn load_config(path: Option<&PathBuf>) -> CliResult<MeasureConfig> {
    Ok(match path {
        Some(p) => MeasureConfig::load_json(p)?,
        None => MeasureConfig::default(),
    })
}

fn run_measure(args: &MeasureArgs) -> CliResult<()> {
    let Some(picture) = args.picture.as_ref() else {
        return Err("missing <PICTURE>; see --help".into());
    };
    let cfg = load_config(args.config.as_ref())?;

    info!("loading image {}", picture.display());
    let img = load_gray(picture)?;
    info!("image size {}x{}", img.width(), img.height());

    let result = match args.debug_dir.as_ref() {
        Some(dir) => {
            let mut sink = PngDiagnostics::new(dir)?;
            let result = measure_sail_shape_with_diagnostics(&img, &cfg, &mut sink)?;
            info!("wrote {} debug images to {}", sink.written().len(), dir.display());
            result
        }
        None => measure_sail_shape(&img, &cfg)?,
    };

    for outcome in &result.report.outcomes {
        match outcome {
            StripeOutcome::Measured(m) => println!(
                " {} draft {:.1} camber {:.1} twist {:.1}",
                m.name, m.draft_pct, m.camber_pct, m.twist_deg
            ),
            StripeOutcome::Skipped { name, .. } => {
                println!(" {name} skipped: {}", outcome.reason().unwrap_or_default());
            }
            StripeOutcome::Failed { name, .. } => {
                println!(" {name} failed: {}", outcome.reason().unwrap_or_default());
            }
        }
    }

    if let Some(path) = args.report.as_ref() {
        let report = MeasureReport::new(
            Some(picture.display().to_string()),
            &result.tags,
            &result.report,
        );
        report.write_json(path)?;
        info!("report written to {}", path.display());
    }
    Ok(())
}

fn run_pose(args: &PoseArgs) -> CliResult<()> {
    let cfg = load_config(args.config.as_ref())?;
    info!("processing image {}", args.picture.display());
    let img = load_gray(&args.picture)?;

    let detector = TagDetector::new(cfg.detector)?;
    let detections = detector.detect(&gray_view(&img));
    let Some(tag) = detections.tags.first() else {
        println!("Tag not found");
        return Ok(());
    };

    let camera = CalibrationData::load_json(&args.cal_file)?.camera_model()?;
    let pose = estimate_marker_pose(tag, args.marker_length, &camera)?;
    println!("Distance to marker {} {:.3} meters", pose.id, pose.distance);
    Ok(())
}
