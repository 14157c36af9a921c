//! gazetrack CLI: pupil location and gaze classification on still frames
//! or image sequences with precomputed landmarks.

use clap::{Args, Parser, Subcommand};
use gazetrack::{annotate_frame, GazeConfig, GazeReport, GazeSession, LandmarkSet};
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "gazetrack")]
#[command(about = "Locate pupils and classify gaze from 68-point facial landmarks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single frame (calibration runs one warm-up step only).
    Analyze(AnalyzeArgs),

    /// Analyze a sequence of frames listed in a JSON manifest, in order.
    Track(TrackArgs),

    /// Print the default configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct AnalyzeArgs {
    /// Path to the input frame.
    #[arg(long)]
    image: PathBuf,

    /// Landmark JSON: an array of `[x, y]` pairs in Multi-PIE order.
    #[arg(long)]
    landmarks: PathBuf,

    /// Optional configuration JSON (missing fields use defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the gaze report (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Path to write an annotated copy of the frame (PNG).
    #[arg(long)]
    annotated: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct TrackArgs {
    /// Manifest JSON listing `{ "image": path, "landmarks": [[x, y], ...] | null }`
    /// entries. Relative image paths resolve against the manifest directory.
    #[arg(long)]
    manifest: PathBuf,

    /// Optional configuration JSON (missing fields use defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write per-frame reports (JSON array). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory for annotated frames (PNG, named after the input frames).
    #[arg(long)]
    annotated_dir: Option<PathBuf>,
}

/// One frame of a tracking manifest.
#[derive(Debug, Clone, serde::Deserialize)]
struct ManifestFrame {
    image: PathBuf,
    #[serde(default)]
    landmarks: Option<LandmarkSet>,
}

/// Report of one manifest frame.
#[derive(Debug, Clone, serde::Serialize)]
struct FrameRecord {
    index: usize,
    image: PathBuf,
    #[serde(flatten)]
    report: GazeReport,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::Track(args) => run_track(&args),
        Commands::DefaultConfig => run_default_config(),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<GazeConfig> {
    match path {
        Some(p) => {
            tracing::info!("Loading config: {}", p.display());
            GazeConfig::from_json_file(p)
        }
        None => Ok(GazeConfig::default()),
    }
}

fn write_json<T: serde::Serialize>(value: &T, out: Option<&Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Results written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn open_frame(path: &Path) -> CliResult<image::DynamicImage> {
    image::open(path).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", path.display(), e).into()
    })
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&GazeConfig::default())?);
    Ok(())
}

// ── analyze ────────────────────────────────────────────────────────────

fn run_analyze(args: &AnalyzeArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;

    tracing::info!("Loading image: {}", args.image.display());
    let frame = open_frame(&args.image)?;
    tracing::info!("Image size: {}x{}", frame.width(), frame.height());

    let landmarks = LandmarkSet::from_json_file(&args.landmarks)?;

    let mut session = GazeSession::try_new(config)?;
    let analysis = session.analyze_image(&frame, Some(&landmarks));
    let report = analysis.report(session.calibration().progress());
    tracing::info!(
        "State: {} (left={:?}, right={:?})",
        report.state,
        analysis.pupil_left_coords(),
        analysis.pupil_right_coords(),
    );

    if let Some(path) = &args.annotated {
        annotate_frame(&frame, &analysis).save(path)?;
        tracing::info!("Annotated frame written to {}", path.display());
    }

    write_json(&report, args.out.as_deref())
}

// ── track ──────────────────────────────────────────────────────────────

fn load_manifest(path: &Path) -> CliResult<Vec<ManifestFrame>> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| -> CliError { format!("Failed to read {}: {}", path.display(), e).into() })?;
    let mut frames: Vec<ManifestFrame> = serde_json::from_str(&data)
        .map_err(|e| -> CliError { format!("Failed to parse {}: {}", path.display(), e).into() })?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for frame in &mut frames {
        if frame.image.is_relative() {
            frame.image = base.join(&frame.image);
        }
    }
    Ok(frames)
}

fn run_track(args: &TrackArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let frames = load_manifest(&args.manifest)?;
    tracing::info!("Tracking {} frames", frames.len());

    if let Some(dir) = &args.annotated_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut session = GazeSession::try_new(config)?;
    let mut records = Vec::with_capacity(frames.len());
    let mut was_complete = false;

    for (index, entry) in frames.into_iter().enumerate() {
        let frame = open_frame(&entry.image)?;
        let analysis = session.analyze_image(&frame, entry.landmarks.as_ref());
        let report = analysis.report(session.calibration().progress());

        if report.calibration.complete && !was_complete {
            tracing::info!(
                "Calibration complete at frame {}: thresholds left={} right={}",
                index,
                report.calibration.thresholds[0],
                report.calibration.thresholds[1],
            );
            was_complete = true;
        }
        tracing::debug!("frame {}: {}", index, report.state);

        if let Some(dir) = &args.annotated_dir {
            let name = entry
                .image
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("frame_{index:05}"));
            let path = dir.join(format!("{name}_gaze.png"));
            annotate_frame(&frame, &analysis).save(&path)?;
        }

        records.push(FrameRecord {
            index,
            image: entry.image,
            report,
        });
    }

    if !was_complete {
        tracing::warn!(
            "Calibration did not complete: {:?}",
            session.calibration().progress()
        );
    }

    write_json(&records, args.out.as_deref())
}
