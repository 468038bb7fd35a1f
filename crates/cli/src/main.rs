use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use lookout_core::capture::domain::capture_request::{CaptureRequest, FacingDirection};
use lookout_core::capture::infrastructure::camera_devices::CameraDevices;
use lookout_core::capture::infrastructure::ffmpeg_camera::FfmpegCameraBackend;
use lookout_core::detection::infrastructure::model_loader::ModelLoader;
use lookout_core::detection::infrastructure::model_resolver::ModelSource;
use lookout_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_MODEL_CONFIDENCE;
use lookout_core::pipeline::infrastructure::fixed_rate_scheduler::FixedRateScheduler;
use lookout_core::pipeline::live_pipeline::LivePipeline;
use lookout_core::pipeline::pipeline_config::PipelineConfig;
use lookout_core::rendering::infrastructure::display_list::DisplayList;
use lookout_core::rendering::infrastructure::image_surface::ImageSurface;
use lookout_core::rendering::infrastructure::label_font::{find_system_font, load_label_font};
use lookout_core::rendering::overlay_renderer::OverlayRenderer;
use lookout_core::shared::constants::{
    CAMERA_UNAVAILABLE_MESSAGE, CAPTURE_HEIGHT_HINT, CAPTURE_WIDTH_HINT,
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_REFRESH_RATE_HZ, DEFAULT_SAMPLE_INTERVAL,
    MODEL_UNAVAILABLE_MESSAGE,
};

/// Live object detection on a camera feed.
#[derive(Parser)]
#[command(name = "lookout")]
struct Cli {
    /// Camera to open: front or back.
    #[arg(long, default_value_t = FacingDirection::Back)]
    facing: FacingDirection,

    /// Requested capture width (the device may pick another).
    #[arg(long, default_value_t = CAPTURE_WIDTH_HINT)]
    width: u32,

    /// Requested capture height (the device may pick another).
    #[arg(long, default_value_t = CAPTURE_HEIGHT_HINT)]
    height: u32,

    /// Model override: a local .onnx path or an http(s) URL.
    #[arg(long)]
    model: Option<String>,

    /// Run detection on every Nth display frame.
    #[arg(long, default_value_t = DEFAULT_SAMPLE_INTERVAL)]
    sample_interval: u64,

    /// Only draw detections scoring above this (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    threshold: f64,

    /// Display refresh rate driving the loop.
    #[arg(long, default_value_t = DEFAULT_REFRESH_RATE_HZ)]
    fps: u32,

    /// ffmpeg device (or file) for the front camera.
    #[arg(long)]
    front_device: Option<String>,

    /// ffmpeg device (or file) for the back camera.
    #[arg(long)]
    back_device: Option<String>,

    /// libavdevice input format (v4l2, avfoundation, dshow). Pass "none" to
    /// open the device string as a plain file or URL.
    #[arg(long)]
    input_format: Option<String>,

    /// Stop after this many display frames.
    #[arg(long)]
    frames: Option<u64>,

    /// Flip the camera every N display frames.
    #[arg(long)]
    flip_every: Option<u64>,

    /// Write the last frame with its overlay to this image file on exit.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// TrueType/OpenType font for snapshot labels (defaults to a system font).
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = build_config(&cli);
    config.validate()?;

    let pending = ModelLoader::spawn(config.model.clone(), DEFAULT_MODEL_CONFIDENCE);

    let backend = FfmpegCameraBackend::new(config.devices.clone());
    let mut pipeline = LivePipeline::new(Box::new(backend), &config)?;
    if let Err(e) = pipeline.start(config.capture) {
        log::error!("{e}");
        return Err(CAMERA_UNAVAILABLE_MESSAGE.into());
    }

    let detector = pending.wait(&download_progress).map_err(|e| {
        eprintln!();
        log::error!("{e}");
        MODEL_UNAVAILABLE_MESSAGE
    })?;
    eprintln!();
    pipeline.install_model(detector);

    let mut scheduler = FixedRateScheduler::new(config.refresh_rate_hz);
    if let Some(frames) = cli.frames {
        scheduler = scheduler.with_limit(frames);
    }

    let mut overlay = DisplayList::new();
    let mut ticks: u64 = 0;
    let mut camera_error = None;
    pipeline.run(&mut scheduler, Some(&mut overlay), |pipeline, report| {
        ticks += 1;
        if report.applied > 0 {
            if let Some(state) = pipeline.render_state() {
                print_batch(ticks, state.batch().above(config.confidence_threshold).map(|d| d.caption()));
            }
        }
        if cli.flip_every.is_some_and(|n| ticks % n == 0) {
            if let Err(e) = pipeline.flip_camera() {
                camera_error = Some(e);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    });

    if let Some(path) = &cli.snapshot {
        write_snapshot(&pipeline, config.confidence_threshold, cli.font.as_deref(), path)?;
    }
    pipeline.teardown();

    if let Some(e) = camera_error {
        log::error!("{e}");
        return Err(CAMERA_UNAVAILABLE_MESSAGE.into());
    }
    Ok(())
}

fn build_config(cli: &Cli) -> PipelineConfig {
    let mut devices = CameraDevices::default();
    if cli.front_device.is_some() || cli.back_device.is_some() {
        devices.front = cli.front_device.clone();
        devices.back = cli.back_device.clone();
    }
    match cli.input_format.as_deref() {
        Some("none") => devices.input_format = None,
        Some(format) => devices.input_format = Some(format.to_string()),
        None => {}
    }

    PipelineConfig {
        sample_interval: cli.sample_interval,
        confidence_threshold: cli.threshold,
        refresh_rate_hz: cli.fps,
        capture: CaptureRequest::new(cli.facing, cli.width, cli.height),
        model: cli
            .model
            .as_deref()
            .map(ModelSource::parse)
            .unwrap_or_default(),
        devices,
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.sample_interval == 0 {
        return Err("Sample interval must be at least 1".into());
    }
    if !(0.0..=1.0).contains(&cli.threshold) {
        return Err(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            cli.threshold
        )
        .into());
    }
    if cli.fps == 0 {
        return Err("Frame rate must be at least 1".into());
    }
    if cli.width == 0 || cli.height == 0 {
        return Err(format!(
            "Capture size must be non-zero, got {}x{}",
            cli.width, cli.height
        )
        .into());
    }
    if cli.flip_every == Some(0) {
        return Err("--flip-every must be at least 1".into());
    }
    Ok(())
}

fn print_batch(tick: u64, captions: impl Iterator<Item = String>) {
    let captions: Vec<String> = captions.collect();
    if captions.is_empty() {
        println!("[{tick}] no detections");
    } else {
        println!("[{tick}] {}", captions.join(", "));
    }
}

fn write_snapshot(
    pipeline: &LivePipeline,
    threshold: f64,
    font: Option<&std::path::Path>,
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = pipeline
        .current_frame()
        .ok_or("No camera frame available for the snapshot")?;
    let font = match font {
        Some(font_path) => Some(load_label_font(font_path)?),
        None => find_system_font(),
    };
    let mut surface = ImageSurface::new(frame.width(), frame.height());
    match font {
        Some(font) => surface = surface.with_font(font),
        None => log::warn!("No label font found, snapshot labels will only be logged"),
    }
    if let Some(state) = pipeline.render_state() {
        OverlayRenderer::new(threshold).render_state(&mut surface, state);
    }
    surface.composite_over(&frame).save(path)?;
    for label in surface.labels() {
        log::info!("Snapshot label \"{}\" at ({:.0}, {:.0})", label.text, label.x, label.y);
    }
    eprintln!("Snapshot written to {}", path.display());
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading detection model... {pct}%");
    } else {
        eprint!("\rDownloading detection model... {downloaded} bytes");
    }
}
