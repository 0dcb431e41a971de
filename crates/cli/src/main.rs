use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use video_redact_core::detection::domain::face_detection_source::{
    collect_detections, CollectedDetections,
};
use video_redact_core::detection::infrastructure::json_detection_source::JsonDetectionSource;
use video_redact_core::pipeline::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
use video_redact_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use video_redact_core::pipeline::pipeline_executor::{PipelineExecutor, ProgressCallback};
use video_redact_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use video_redact_core::pipeline::redact_video_use_case::RedactVideoUseCase;
use video_redact_core::pipeline::redaction_config::RedactionConfig;
use video_redact_core::pipeline::redaction_report::{RedactionReport, RunStatus};
use video_redact_core::redaction::domain::bounding_box_mapper::ClampPolicy;
use video_redact_core::redaction::infrastructure::outline_redactor::OutlineStyle;
use video_redact_core::redaction::infrastructure::redactor_factory::RedactionStrategy;
use video_redact_core::shared::scratch_dir::ensure_scratch_dir;
use video_redact_core::shared::video_metadata::VideoMetadata;
use video_redact_core::video::domain::video_reader::VideoReader;
use video_redact_core::video::domain::video_store::VideoStore;
use video_redact_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use video_redact_core::video::infrastructure::ffmpeg_writer::{FfmpegWriter, OutputCodec};
use video_redact_core::video::infrastructure::http_video_store::HttpVideoStore;
use video_redact_core::video::infrastructure::local_video_store::LocalVideoStore;

/// Progress lines are logged every this many frames.
const PROGRESS_THROTTLE_FRAMES: usize = 100;

/// Redacts faces in a video from timestamped face detections.
#[derive(Parser)]
#[command(name = "video-redact")]
struct Cli {
    /// Input video (a key in the store when --store is given).
    input: PathBuf,

    /// Output video (a key in the store when --store is given).
    output: PathBuf,

    /// Face detection results as JSON (one page or an array of pages).
    #[arg(long)]
    detections: PathBuf,

    /// JSON redaction config; individual flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pixelation grid cells per axis.
    #[arg(long)]
    block_count: Option<u32>,

    /// A detection stays active for fps / this many frames.
    #[arg(long)]
    window_divisor: Option<f64>,

    /// Redaction strategy: pixelate or gaussian.
    #[arg(long)]
    strategy: Option<RedactionStrategy>,

    /// Frames each detection is carried past its window.
    #[arg(long)]
    lookahead: Option<usize>,

    /// Horizontal margin is frame width / this.
    #[arg(long)]
    margin_width_divisor: Option<u32>,

    /// Vertical margin is frame height / this.
    #[arg(long)]
    margin_height_divisor: Option<u32>,

    /// Boxes crossing the frame edge: clamp or reject.
    #[arg(long)]
    clamp: Option<ClampPolicy>,

    /// Draw an outline of this thickness around redacted regions.
    #[arg(long)]
    outline: Option<u32>,

    /// Output codec: mjpeg or mpeg4.
    #[arg(long, default_value = "mjpeg")]
    codec: OutputCodec,

    /// Decode and encode on their own threads.
    #[arg(long)]
    threaded: bool,

    /// Input frame rate; requires --width and --height.
    #[arg(long, requires_all = ["width", "height"])]
    frame_rate: Option<f64>,

    /// Input frame width in pixels.
    #[arg(long, requires = "frame_rate")]
    width: Option<u32>,

    /// Input frame height in pixels.
    #[arg(long, requires = "frame_rate")]
    height: Option<u32>,

    /// Directory or http(s) base URL holding input and output.
    #[arg(long)]
    store: Option<String>,
}

fn main() {
    env_logger::init();

    match run() {
        Ok(report) => {
            log::info!("{report}");
            if report.status != RunStatus::Completed {
                eprintln!("Redaction {}: {report}", report.status);
                process::exit(2);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<RedactionReport, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let mut source = JsonDetectionSource::from_path(&cli.detections)?;
    let detections = collect_detections(&mut source)?;
    log::info!(
        "Loaded {} detections at {} timestamps from {} page(s)",
        detections.index.detection_count(),
        detections.index.len(),
        detections.pages
    );

    let Some(store_location) = cli.store.as_deref() else {
        validate_input(&cli.input)?;
        return redact(&cli, config, &detections, &cli.input, &cli.output);
    };

    let store = open_store(store_location)?;
    let input_key = key_string(&cli.input)?;
    let output_key = key_string(&cli.output)?;
    let scratch = ensure_scratch_dir()?;
    let local_input = scratch_path(&scratch, "in", &cli.input);
    let local_output = scratch_path(&scratch, "out", &cli.output);

    store.fetch(&input_key, &local_input)?;
    let result = redact(&cli, config, &detections, &local_input, &local_output);

    let result = result.and_then(|report| {
        if report.is_completed() {
            store.store(&local_output, &output_key)?;
            log::info!("Output stored as {output_key}");
        } else {
            log::warn!("Run {}, output not stored", report.status);
        }
        Ok(report)
    });
    remove_scratch_file(&local_input);
    remove_scratch_file(&local_output);
    result
}

fn redact(
    cli: &Cli,
    config: RedactionConfig,
    detections: &CollectedDetections,
    input: &Path,
    output: &Path,
) -> Result<RedactionReport, Box<dyn std::error::Error>> {
    let metadata = resolve_metadata(cli, detections, input)?;

    let executor: Box<dyn PipelineExecutor> = if cli.threaded {
        Box::new(ThreadedPipelineExecutor::new())
    } else {
        Box::new(SequentialPipelineExecutor::new())
    };

    let progress: ProgressCallback = Box::new(|current, total| {
        if total > 0 {
            eprint!("\rRedacting frame {current}/{total}");
        } else {
            eprint!("\rRedacting frame {current}");
        }
        true
    });

    let mut use_case = RedactVideoUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::new(cli.codec)),
        executor,
        config,
        Some(Box::new(StdoutPipelineLogger::new(PROGRESS_THROTTLE_FRAMES))),
        Some(progress),
        None,
    );
    let report = use_case.execute(&detections.index, &metadata, input, output)?;
    eprintln!();
    if report.is_completed() {
        log::info!("Output written to {}", output.display());
    }
    Ok(report)
}

/// Explicit flags win, then the detection service's own view of the
/// stream, then whatever the decoder reports.
fn resolve_metadata(
    cli: &Cli,
    detections: &CollectedDetections,
    input: &Path,
) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
    if let (Some(fps), Some(width), Some(height)) = (cli.frame_rate, cli.width, cli.height) {
        return Ok(VideoMetadata::new(fps, width, height));
    }
    if let Some(metadata) = &detections.video_metadata {
        log::info!(
            "Using detection service metadata: {}x{} @ {:.3} fps",
            metadata.width,
            metadata.height,
            metadata.fps
        );
        return Ok(metadata.clone());
    }

    let mut reader = FfmpegReader::new();
    let probed = reader.open(input)?;
    reader.close();
    Ok(probed)
}

fn build_config(cli: &Cli) -> Result<RedactionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => RedactionConfig::from_json_file(path)?,
        None => RedactionConfig::default(),
    };

    if let Some(n) = cli.block_count {
        config.pixelation_block_count = n;
    }
    if let Some(d) = cli.window_divisor {
        config.window_divisor = d;
    }
    if let Some(s) = cli.strategy {
        config.redaction_strategy = s;
    }
    if let Some(n) = cli.lookahead {
        config.lookahead_frames = n;
    }
    if let Some(d) = cli.margin_width_divisor {
        config.expansion_margin_width_divisor = d;
    }
    if let Some(d) = cli.margin_height_divisor {
        config.expansion_margin_height_divisor = d;
    }
    if let Some(c) = cli.clamp {
        config.clamp_policy = c;
    }
    if let Some(thickness) = cli.outline {
        let style = config.outline.unwrap_or_default();
        config.outline = Some(OutlineStyle { thickness, ..style });
    }

    config.validate()?;
    Ok(config)
}

fn open_store(location: &str) -> Result<Box<dyn VideoStore>, Box<dyn std::error::Error>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpVideoStore::new(location)?))
    } else {
        Ok(Box::new(LocalVideoStore::new(location)))
    }
}

fn validate_input(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    Ok(())
}

fn key_string(key: &Path) -> Result<String, Box<dyn std::error::Error>> {
    key.to_str()
        .map(str::to_string)
        .ok_or_else(|| format!("Store key is not valid UTF-8: {}", key.display()).into())
}

/// Local staging path for a store key, unique per process. The key's file
/// name is kept last so ffmpeg can still pick the container from it.
fn scratch_path(scratch: &Path, role: &str, key: &Path) -> PathBuf {
    let name = key
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    scratch.join(format!("{}-{role}-{name}", process::id()))
}

fn remove_scratch_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Could not remove {}: {e}", path.display());
        }
    }
}
