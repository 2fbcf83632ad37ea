use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use waste_lens::capture::WebcamSource;
use waste_lens::config::{self, Settings};
use waste_lens::detection;
use waste_lens::ui::{self, EguiPresenter};
use waste_lens::Session;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YOLOv8 detection model (ONNX file)
    #[arg(short, long, default_value = config::DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Webcam device index
    #[arg(short, long, default_value_t = 0)]
    camera: u32,

    /// Minimum detection confidence, in (0, 1]
    #[arg(long, default_value_t = config::DEFAULT_CONFIDENCE)]
    confidence: f32,

    /// IoU threshold for non-maximum suppression
    #[arg(long, default_value_t = config::DEFAULT_IOU)]
    iou: f32,

    /// Delay between live frames in milliseconds
    #[arg(long, default_value_t = 10)]
    tick_ms: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// List available cameras and exit
    #[arg(long)]
    list_cameras: bool,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            model_path: self.model.clone(),
            device_index: self.camera,
            confidence: self.confidence,
            iou_threshold: self.iou,
            tick_interval: Duration::from_millis(self.tick_ms),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    if args.list_cameras {
        return list_cameras();
    }

    let settings = args.settings();
    settings.validate().context("Invalid settings")?;

    tracing::info!("Waste Lens starting");
    tracing::info!("Camera: {}", settings.device_index);
    tracing::info!("Confidence: {}", settings.confidence);
    tracing::info!("Tick interval: {:?}", settings.tick_interval);

    // Missing or unreadable model aborts before the window opens
    let detector = detection::create_default_detector(&settings.model_path, settings.iou_threshold)
        .context("Failed to load detection model")?;

    let session = Session::new(WebcamSource, detector, EguiPresenter::default(), &settings);

    ui::run(session).map_err(|e| anyhow::anyhow!("Window closed with an error: {e}"))?;

    tracing::info!("Waste Lens exiting");
    Ok(())
}

fn list_cameras() -> Result<()> {
    let cameras = nokhwa::query(nokhwa::utils::ApiBackend::Auto)
        .context("Failed to query cameras")?;

    println!("{:<5} | {:<30} | {}", "Index", "Name", "Description");
    println!("{}", "-".repeat(60));
    for cam in cameras {
        println!(
            "{:<5} | {:<30} | {}",
            cam.index(),
            cam.human_name(),
            cam.description()
        );
    }
    Ok(())
}
