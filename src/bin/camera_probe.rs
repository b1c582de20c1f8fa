// Opens the configured camera and detector, classifies a few frames, and
// reports which roles were assigned.
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use holo_globe::config::Config;
use holo_globe::landmarks::open_source;
use holo_globe::tracking::{HandRole, PerformanceMetrics, RoleClassifier};
use holo_globe::video::VideoSource;

#[derive(Parser, Debug)]
#[command(name = "camera_probe", about = "Check camera access and hand role classification")]
struct Args {
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera index
    #[arg(long)]
    camera: Option<u32>,

    /// Frames to classify
    #[arg(short, long, default_value_t = 90)]
    frames: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(index) = args.camera {
        config.camera.index = index;
    }

    let mut detector =
        open_source(&config, &AtomicBool::new(false)).context("failed to start detector")?;
    let mut video = if detector.needs_camera() {
        VideoSource::open_camera(&config.camera).context("camera access failed")?
    } else {
        VideoSource::blank(&config.camera)
    };
    let info = video.info();
    info!("✓ {} at {}x{}@{}", info.label, info.width, info.height, info.fps);

    let mut classifier = RoleClassifier::new(config.roles);
    let mut metrics = PerformanceMetrics::new();
    let (mut globe_frames, mut panel_frames, mut ignored) = (0u32, 0u32, 0u32);
    let started = Instant::now();

    for _ in 0..args.frames {
        let tick = Instant::now();
        let frame = match video.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("✗ {:#}", e);
                continue;
            }
        };
        let timestamp_ms = started.elapsed().as_secs_f64() * 1000.0;
        let detections = detector.detect(&frame, timestamp_ms).unwrap_or_else(|e| {
            warn!("✗ detection failed: {}", e);
            Vec::new()
        });

        let classified = classifier.classify_frame(&detections, timestamp_ms);
        for hand in &classified.hands {
            match hand.role {
                HandRole::GlobeControl => globe_frames += 1,
                HandRole::PanelControl => panel_frames += 1,
                HandRole::None => ignored += 1,
            }
        }
        metrics.record(tick.elapsed(), 0.0);
    }

    info!(
        "{} frames at {:.1} fps: globe hand in {}, panel hand in {}, {} hands ignored",
        args.frames, metrics.avg_fps, globe_frames, panel_frames, ignored
    );
    Ok(())
}
