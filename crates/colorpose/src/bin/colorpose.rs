//! colorpose CLI: detect a colored target, calibrate distance, replay a
//! frame sequence through the tracker.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colorpose::bus::LogTransmitter;
use colorpose::annotate::{annotate, AnnotateStyle};
use colorpose::detect::{color_view, load_frame, mask_image};
use colorpose::detector::{measure_reference, ColorProfile, Detection};
use colorpose::runner::Tracker;
use colorpose::source::ImageSequence;
use colorpose::{DetectConfig, ProfileSpec, Rotation};
use log::LevelFilter;
use serde::Serialize;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "colorpose")]
#[command(about = "Locate a colored target, estimate its centering error, tilt and distance")]
#[command(version)]
struct Cli {
    /// Log debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the detector on one image and print a JSON report.
    Detect(DetectArgs),

    /// Measure the reference object at a known distance and write a calibration file.
    Calibrate(CalibrateArgs),

    /// Run the tracking loop over a directory of images.
    Track(TrackArgs),
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Input image.
    image: PathBuf,

    /// Detector configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in profile name, overrides the configuration.
    #[arg(long)]
    profile: Option<String>,

    /// Calibration record (JSON); enables distance estimation.
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Write the annotated frame here.
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// Write the cleaned mask here.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CalibrateArgs {
    /// Image of the reference object.
    image: PathBuf,

    /// Distance from the camera to the reference object, in meters.
    #[arg(long, allow_negative_numbers = true)]
    distance: f32,

    /// Detector configuration (JSON); only its rotation is used.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rotation applied before measuring; overrides the configuration.
    #[arg(long)]
    rotate: Option<Rotation>,

    /// Built-in profile used to find the reference object.
    #[arg(long, default_value = "white_reference")]
    profile: String,

    /// Output calibration file.
    #[arg(long, default_value = "calibration.json")]
    out: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct TrackArgs {
    /// Directory of frames, processed in file-name order.
    dir: PathBuf,

    /// Detector configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rotation applied before detection; overrides the configuration.
    #[arg(long)]
    rotate: Option<Rotation>,

    /// Write annotated frames for every hit into this directory.
    #[arg(long)]
    annotate_dir: Option<PathBuf>,
}

#[derive(Serialize)]
struct DetectReport<'a> {
    image: &'a Path,
    width: u32,
    height: u32,
    profile: &'a str,
    detection: Option<&'a Detection>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Calibrate(args) => run_calibrate(&args),
        Commands::Track(args) => run_track(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };

    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init_with_filter(level);
        colorpose::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = colorpose::core::init_with_level(level);
    }
}

fn load_config(path: Option<&Path>) -> CliResult<DetectConfig> {
    Ok(match path {
        Some(path) => DetectConfig::load_json(path)?,
        None => DetectConfig::default(),
    })
}

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(name) = &args.profile {
        config.profile = ProfileSpec::Preset(name.clone());
    }
    if let Some(path) = &args.calibration {
        config = config.with_calibration(path);
    }
    let detector = config.build_detector()?;

    let img = config.rotation.apply(&load_frame(&args.image)?);
    let debug = detector.detect_debug(&color_view(&img))?;
    let detection = debug.detection.as_ref();

    match detection {
        Some(d) => log::info!(
            "errX:{:.3}, errY:{:.3}, tilt:{:.3}, height:{}px",
            d.error_x_rel,
            d.error_y_rel,
            d.tilt_rel(),
            d.bbox.height
        ),
        None => log::info!("no target detected"),
    }

    if let Some(path) = &args.mask {
        mask_image(&debug.located.mask)?.save(path)?;
    }
    if let Some(path) = &args.annotate {
        match detection {
            Some(d) => annotate(&img, d, &AnnotateStyle::default()).save(path)?,
            None => img.save(path)?,
        }
    }

    let report = DetectReport {
        image: &args.image,
        width: img.width(),
        height: img.height(),
        profile: &detector.params().profile.name,
        detection,
    };
    let json = serde_json::to_string_pretty(&report)?;
    match &args.json {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn run_calibrate(args: &CalibrateArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let rotation = args.rotate.unwrap_or(config.rotation);
    let profile = ColorProfile::preset(&args.profile)?;
    let img = rotation.apply(&load_frame(&args.image)?);
    let record = measure_reference(&color_view(&img), &profile, args.distance)?;
    record.write_json(&args.out)?;
    log::info!("calibration written to {}", args.out.display());
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn run_track(args: &TrackArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let rotation = args.rotate.unwrap_or(config.rotation);
    let detector = config.build_detector()?;

    let mut source = ImageSequence::open(&args.dir)?.with_rotation(rotation);
    let mut tracker = Tracker::new(detector, LogTransmitter)
        .with_channels(config.channels)
        .with_miss_warn_threshold(config.miss_warn_threshold);
    if let Some(dir) = &args.annotate_dir {
        tracker = tracker.with_annotation_dir(dir, AnnotateStyle::default());
    }

    let summary = tracker.run(&mut source)?;
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
