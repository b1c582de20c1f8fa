// src/worker.rs - Background capture → detect → classify → publish loop
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use image::RgbaImage;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::data::DetectionRecorder;
use crate::interaction::InteractionStore;
use crate::landmarks::{open_source, DetectionFrame, LandmarkSource, SourceError};
use crate::tracking::{ClassifiedHand, HandRole, PerformanceMetrics, RoleClassifier};
use crate::video::VideoSource;

#[derive(Debug, Clone, PartialEq)]
pub enum SystemState {
    Initializing,
    /// Running, but no hand currently holds a role.
    Scanning,
    /// At least one role is assigned.
    Active,
    /// Camera or detector failed to start. Terminal.
    Error(String),
}

impl SystemState {
    pub fn label(&self) -> &str {
        match self {
            SystemState::Initializing => "INITIALIZING",
            SystemState::Scanning => "SCANNING",
            SystemState::Active => "ACTIVE",
            SystemState::Error(_) => "ERROR",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SystemState::Error(_))
    }
}

/// Latest frame and its classified hands, for drawing only.
#[derive(Clone, Default)]
pub struct FrameOverlay {
    pub frame: u64,
    /// Unmirrored camera frame; `None` when the detector runs without one.
    pub image: Option<Arc<RgbaImage>>,
    pub hands: Vec<ClassifiedHand>,
    pub metrics: PerformanceMetrics,
}

pub struct TrackingHandle {
    state: watch::Receiver<SystemState>,
    overlay: watch::Receiver<FrameOverlay>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TrackingHandle {
    /// Start the tracking thread. Camera and detector are opened on that
    /// thread; a failure there shows up as [`SystemState::Error`].
    pub fn spawn(
        config: Config,
        store: InteractionStore,
        record_path: Option<PathBuf>,
    ) -> Result<Self> {
        let (state_tx, state) = watch::channel(SystemState::Initializing);
        let (overlay_tx, overlay) = watch::channel(FrameOverlay::default());
        let stop = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            config,
            store,
            record_path,
            stop: stop.clone(),
            state_tx,
            overlay_tx,
        };
        let thread = std::thread::Builder::new()
            .name("hand-tracking".into())
            .spawn(move || worker.run())
            .context("failed to spawn tracking thread")?;

        Ok(Self {
            state,
            overlay,
            stop,
            thread: Some(thread),
        })
    }

    pub fn state(&self) -> SystemState {
        self.state.borrow().clone()
    }

    pub fn overlay(&self) -> FrameOverlay {
        self.overlay.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop and wait for it to release the camera. A detector that
    /// is still starting up is abandoned.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("tracking thread panicked");
            }
            info!("tracking stopped");
        }
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    config: Config,
    store: InteractionStore,
    record_path: Option<PathBuf>,
    stop: Arc<AtomicBool>,
    state_tx: watch::Sender<SystemState>,
    overlay_tx: watch::Sender<FrameOverlay>,
}

struct Pipeline {
    video: VideoSource,
    detector: Box<dyn LandmarkSource>,
    recorder: Option<DetectionRecorder>,
}

impl Worker {
    fn open(&self) -> Result<Pipeline> {
        let detector = open_source(&self.config, &self.stop)
            .context("failed to start hand landmark detector")?;
        let video = if detector.needs_camera() {
            VideoSource::open_camera(&self.config.camera)?
        } else {
            VideoSource::blank(&self.config.camera)
        };
        let recorder = self
            .record_path
            .as_ref()
            .map(DetectionRecorder::create)
            .transpose()?;

        info!(
            "tracking with {} detector on {}",
            detector.name(),
            video.info().label
        );
        Ok(Pipeline {
            video,
            detector,
            recorder,
        })
    }

    fn run(self) {
        match self.open() {
            Ok(pipeline) => self.drive(pipeline),
            Err(_) if self.stop.load(Ordering::Relaxed) => {
                info!("tracking stopped during startup");
            }
            Err(e) => {
                error!("tracking failed to start: {:#}", e);
                self.state_tx.send_replace(SystemState::Error(format!("{:#}", e)));
            }
        }
    }

    fn drive(&self, mut pipeline: Pipeline) {
        let mut classifier = RoleClassifier::new(self.config.roles);
        let mut metrics = PerformanceMetrics::new();
        let mut failures = FailureStreak::new(self.config.detector.max_consecutive_failures);
        let started = Instant::now();

        while !self.stop.load(Ordering::Relaxed) {
            let tick = Instant::now();
            let timestamp_ms = started.elapsed().as_secs_f64() * 1000.0;

            let image = match pipeline.video.read_frame() {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!("frame capture failed: {:#}", e);
                    std::thread::sleep(Duration::from_millis(10));
                    None
                }
            };

            let detections = match &image {
                Some(image) => match pipeline.detector.detect(image, timestamp_ms) {
                    Ok(hands) => {
                        failures.reset();
                        hands
                    }
                    Err(e) if failures.record(&e) => {
                        error!("hand detector failed {} frames in a row: {}", failures.count(), e);
                        self.store.publish(classifier.classify_frame(&[], timestamp_ms).state);
                        self.state_tx.send_replace(SystemState::Error(format!(
                            "hand detector stopped responding: {e}"
                        )));
                        break;
                    }
                    Err(e) => {
                        // Only the first failure of a run is worth a warning.
                        if failures.count() <= 1 {
                            warn!("hand detection failed: {}", e);
                        } else {
                            debug!("hand detection failed: {}", e);
                        }
                        Vec::new()
                    }
                },
                None => Vec::new(),
            };

            if let Some(recorder) = pipeline.recorder.as_mut() {
                let frame = DetectionFrame {
                    timestamp_ms,
                    hands: detections.clone(),
                };
                if let Err(e) = recorder.record(&frame) {
                    warn!("dropping detection recording: {:#}", e);
                    pipeline.recorder = None;
                }
            }

            let classified = classifier.classify_frame(&detections, timestamp_ms);
            self.store.publish(classified.state);

            let next = if classified.state.any_detected() {
                SystemState::Active
            } else {
                SystemState::Scanning
            };
            self.state_tx.send_if_modified(|state| {
                if *state != next {
                    debug!("system state {} -> {}", state.label(), next.label());
                    *state = next;
                    true
                } else {
                    false
                }
            });

            metrics.record(tick.elapsed(), role_confidence(&classified.hands));

            let image = image
                .filter(|_| pipeline.video.is_camera())
                .map(|image| Arc::new(image.to_rgba8()));
            self.overlay_tx.send_replace(FrameOverlay {
                frame: classified.state.frame,
                image,
                hands: classified.hands,
                metrics: metrics.clone(),
            });
        }

        if let Some(mut recorder) = pipeline.recorder.take() {
            match recorder.flush() {
                Ok(()) => info!(
                    "recorded {} frames to {}",
                    recorder.frames_written(),
                    recorder.path().display()
                ),
                Err(e) => warn!("failed to flush recording: {:#}", e),
            }
        }
    }
}

/// Back-to-back detector failures that point at a dead helper process.
struct FailureStreak {
    count: u32,
    limit: u32,
}

impl FailureStreak {
    fn new(limit: u32) -> Self {
        Self { count: 0, limit }
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn reset(&mut self) {
        self.count = 0;
    }

    /// Count `error` and report whether the streak has hit the limit.
    fn record(&mut self, error: &SourceError) -> bool {
        if error.is_disconnect() {
            self.count += 1;
        }
        self.count >= self.limit
    }
}

/// Mean detector confidence of the hands that hold a role.
fn role_confidence(hands: &[ClassifiedHand]) -> f32 {
    let scores: Vec<f32> = hands
        .iter()
        .filter(|h| h.role != HandRole::None)
        .map(|h| h.detection.confidence)
        .collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f32>() / scores.len() as f32
    }
}
