// src/landmarks.rs - Hand landmark sources (external detector, simulation, replay)
//!
//! Every source yields, once per video frame, the hands it saw: 21 normalized
//! landmarks each plus the detector's handedness label. Coordinates are in
//! the raw camera frame (not mirrored).

use std::f64::consts::PI;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use image::DynamicImage;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, DetectorBackend, DetectorConfig};

/// MediaPipe hand landmark indices.
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

pub const LANDMARK_COUNT: usize = 21;

/// Bone list for drawing the hand skeleton.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (17, 18), (18, 19), (19, 20),
    (0, 17),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// 0.0 to 1.0 across the frame width
    pub x: f64,
    /// 0.0 to 1.0 down the frame height
    pub y: f64,
    /// depth relative to the wrist
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn xy(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// Handedness as labelled by the detector, before any mirroring correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Handedness {
    Left,
    Right,
    Unknown,
}

impl From<&str> for Handedness {
    fn from(label: &str) -> Self {
        match label {
            "Left" => Handedness::Left,
            "Right" => Handedness::Right,
            _ => Handedness::Unknown,
        }
    }
}

impl From<String> for Handedness {
    fn from(label: String) -> Self {
        Handedness::from(label.as_str())
    }
}

impl From<Handedness> for String {
    fn from(handedness: Handedness) -> Self {
        match handedness {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
            Handedness::Unknown => "Unknown",
        }
        .to_string()
    }
}

/// One hand observed in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub landmarks: Vec<Landmark>,
    pub handedness: Handedness,
    #[serde(alias = "score", default)]
    pub confidence: f32,
}

impl Detection {
    pub fn wrist(&self) -> Option<&Landmark> {
        self.landmarks.get(index::WRIST)
    }

    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= LANDMARK_COUNT
    }
}

/// One line of a detection recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub timestamp_ms: f64,
    pub hands: Vec<Detection>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to start landmark detector `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("landmark detector did not become ready: {0}")]
    NotReady(String),
    #[error("landmark detector I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("landmark detector protocol error: {0}")]
    Protocol(String),
    #[error("recording {0} contains no frames")]
    EmptyRecording(PathBuf),
    #[error("landmark detector startup was cancelled")]
    Cancelled,
}

impl SourceError {
    /// The detector process is gone or no longer speaking the protocol.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, SourceError::Io(_) | SourceError::Protocol(_))
    }
}

/// Anything that turns a video frame into hand detections.
pub trait LandmarkSource: Send {
    fn name(&self) -> &str;

    fn detect(
        &mut self,
        frame: &DynamicImage,
        timestamp_ms: f64,
    ) -> Result<Vec<Detection>, SourceError>;

    /// Whether this source needs real camera frames.
    fn needs_camera(&self) -> bool {
        true
    }
}

/// Build the configured detector. Setting `cancel` aborts a detector that
/// is still starting up.
pub fn open_source(
    config: &Config,
    cancel: &AtomicBool,
) -> Result<Box<dyn LandmarkSource>, SourceError> {
    let detector = &config.detector;
    match detector.backend {
        DetectorBackend::MediaPipe => Ok(Box::new(MediaPipeBridge::spawn(detector, cancel)?)),
        DetectorBackend::Simulated => Ok(Box::new(SimulatedSource::new(
            config.roles.mirrored_labels,
        ))),
        DetectorBackend::Replay => {
            let path = detector.replay_path.as_deref().ok_or_else(|| {
                SourceError::NotReady("replay backend selected without a recording".into())
            })?;
            Ok(Box::new(ReplaySource::open(path)?))
        }
    }
}

// ---------------------------------------------------------------------------
// External MediaPipe hand landmarker
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug)]
struct BridgeReply {
    #[serde(default)]
    hands: Vec<Detection>,
    #[serde(default)]
    error: Option<String>,
}

const READY_POLL: Duration = Duration::from_millis(50);

pub const FRAME_HEADER_LEN: usize = 20;

/// `width`, `height`, `channels` as little-endian u32, then the frame
/// timestamp in milliseconds as little-endian u64.
pub fn frame_header(
    width: u32,
    height: u32,
    channels: u32,
    timestamp_ms: u64,
) -> [u8; FRAME_HEADER_LEN] {
    let mut header = [0u8; FRAME_HEADER_LEN];
    header[0..4].copy_from_slice(&width.to_le_bytes());
    header[4..8].copy_from_slice(&height.to_le_bytes());
    header[8..12].copy_from_slice(&channels.to_le_bytes());
    header[12..20].copy_from_slice(&timestamp_ms.to_le_bytes());
    header
}

/// Whole-millisecond timestamp for video-mode tracking, which rejects
/// timestamps that do not increase.
pub fn video_timestamp(previous: Option<u64>, timestamp_ms: f64) -> u64 {
    let ms = if timestamp_ms.is_finite() && timestamp_ms > 0.0 {
        timestamp_ms as u64
    } else {
        0
    };
    match previous {
        Some(prev) if ms <= prev => prev + 1,
        _ => ms,
    }
}

fn reap(process: &mut Child) {
    let _ = process.kill();
    let _ = process.wait();
}

/// Runs the hand landmarker in a child process.
///
/// Protocol: the child prints `READY` once its model is loaded. For every
/// frame we send a [`frame_header`] followed by the raw RGB bytes; it
/// answers with one JSON line
/// `{"hands": [{"handedness": "Left", "score": 0.9, "landmarks": [...]}]}`.
pub struct MediaPipeBridge {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    line: String,
    last_timestamp: Option<u64>,
}

impl MediaPipeBridge {
    /// Start the helper and wait for its `READY` line, giving up after
    /// `startup_timeout_ms` or as soon as `cancel` is set.
    pub fn spawn(config: &DetectorConfig, cancel: &AtomicBool) -> Result<Self, SourceError> {
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| SourceError::NotReady("detector command is empty".into()))?;
        let command_line = config.command.join(" ");

        info!("starting hand landmarker: {}", command_line);
        let mut process = Command::new(program)
            .args(args)
            .arg("--model")
            .arg(&config.model_path)
            .arg("--num-hands")
            .arg(config.num_hands.to_string())
            .arg("--min-hand-detection-confidence")
            .arg(config.min_hand_detection_confidence.to_string())
            .arg("--min-hand-presence-confidence")
            .arg(config.min_hand_presence_confidence.to_string())
            .arg("--min-tracking-confidence")
            .arg(config.min_tracking_confidence.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SourceError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        match Self::handshake(&mut process, config, cancel) {
            Ok((stdin, stdout)) => {
                info!("hand landmarker ready");
                Ok(Self {
                    process,
                    stdin,
                    stdout,
                    line: String::new(),
                    last_timestamp: None,
                })
            }
            Err(e) => {
                reap(&mut process);
                Err(e)
            }
        }
    }

    fn handshake(
        process: &mut Child,
        config: &DetectorConfig,
        cancel: &AtomicBool,
    ) -> Result<(ChildStdin, BufReader<ChildStdout>), SourceError> {
        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| SourceError::NotReady("detector stdin unavailable".into()))?;
        let mut stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| SourceError::NotReady("detector stdout unavailable".into()))?;

        // Model loading can stall; read READY off-thread so the wait stays
        // bounded and cancellable.
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("landmarker-ready".into())
            .spawn(move || {
                let mut line = String::new();
                let read = stdout.read_line(&mut line).map(|_| line);
                let _ = tx.send((stdout, read));
            })?;

        let timeout = Duration::from_millis(config.startup_timeout_ms);
        let deadline = Instant::now() + timeout;
        let (stdout, read) = loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(SourceError::Cancelled);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SourceError::NotReady(format!(
                    "no READY within {} ms",
                    config.startup_timeout_ms
                )));
            }
            match rx.recv_timeout(remaining.min(READY_POLL)) {
                Ok(reply) => break reply,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SourceError::NotReady("ready reader exited".into()))
                }
            }
        };

        let ready = read?;
        if ready.trim() != "READY" {
            return Err(SourceError::NotReady(format!(
                "expected READY, got {:?}",
                ready.trim()
            )));
        }
        Ok((stdin, stdout))
    }
}

impl LandmarkSource for MediaPipeBridge {
    fn name(&self) -> &str {
        "mediapipe"
    }

    fn detect(
        &mut self,
        frame: &DynamicImage,
        timestamp_ms: f64,
    ) -> Result<Vec<Detection>, SourceError> {
        let rgb = frame.to_rgb8();
        let (width, height) = rgb.dimensions();
        let timestamp = video_timestamp(self.last_timestamp, timestamp_ms);
        self.last_timestamp = Some(timestamp);

        self.stdin.write_all(&frame_header(width, height, 3, timestamp))?;
        self.stdin.write_all(rgb.as_raw())?;
        self.stdin.flush()?;

        self.line.clear();
        if self.stdout.read_line(&mut self.line)? == 0 {
            return Err(SourceError::Protocol("detector closed its output".into()));
        }

        let reply: BridgeReply = serde_json::from_str(&self.line)
            .map_err(|e| SourceError::Protocol(format!("bad reply: {e}")))?;
        if let Some(error) = reply.error {
            warn!("hand landmarker reported: {}", error);
            return Ok(Vec::new());
        }

        debug!("landmarker returned {} hand(s)", reply.hands.len());
        Ok(reply.hands)
    }
}

impl Drop for MediaPipeBridge {
    fn drop(&mut self) {
        reap(&mut self.process);
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Builds a plausible 21-point hand with its wrist at (`wrist_x`, `wrist_y`)
/// and the thumb and index tips `pinch_gap` apart.
pub fn synthetic_hand(wrist_x: f64, wrist_y: f64, pinch_gap: f64) -> Vec<Landmark> {
    let mut landmarks = Vec::with_capacity(LANDMARK_COUNT);
    landmarks.push(Landmark::new(wrist_x, wrist_y, 0.0));

    // Fan the five fingers upward from the wrist, thumb leaning outward.
    for finger in 0..5 {
        let angle = -PI / 2.0 + (finger as f64 - 1.5) * 0.25;
        for joint in 1..=4 {
            let reach = 0.035 * joint as f64 + if finger == 0 { 0.0 } else { 0.04 };
            landmarks.push(Landmark::new(
                wrist_x + reach * angle.cos(),
                wrist_y + reach * angle.sin(),
                -0.01 * joint as f64,
            ));
        }
    }

    let index_tip = landmarks[index::INDEX_FINGER_TIP];
    landmarks[index::THUMB_TIP] = Landmark::new(index_tip.x + pinch_gap, index_tip.y, index_tip.z);
    landmarks
}

/// Two synthetic hands sweeping across their zones, pinching on and off.
/// Labels follow the same mirroring convention the classifier expects.
pub struct SimulatedSource {
    mirrored_labels: bool,
}

impl SimulatedSource {
    pub fn new(mirrored_labels: bool) -> Self {
        Self { mirrored_labels }
    }

    pub fn frame_at(&self, timestamp_ms: f64) -> Vec<Detection> {
        let t = timestamp_ms / 1000.0;
        let (panel_label, globe_label) = if self.mirrored_labels {
            (Handedness::Left, Handedness::Right)
        } else {
            (Handedness::Right, Handedness::Left)
        };

        // Physical right hand stays in the HUD zone (raw x < 0.6) and
        // pinches during the first half of every 6 s cycle.
        let panel_gap = if (t % 6.0) < 3.0 { 0.03 } else { 0.15 };
        let panel = Detection {
            landmarks: synthetic_hand(
                0.3 + 0.15 * (t * 0.7).sin(),
                0.5 + 0.2 * (t * 0.5).cos(),
                panel_gap,
            ),
            handedness: panel_label,
            confidence: 0.95,
        };

        // Physical left hand sweeps the globe zone and breathes its pinch.
        let globe = Detection {
            landmarks: synthetic_hand(
                0.75 + 0.15 * (t * 0.4).sin(),
                0.5 + 0.15 * (t * 0.3).sin(),
                0.2 + 0.18 * (t * 0.8).sin(),
            ),
            handedness: globe_label,
            confidence: 0.9,
        };

        vec![panel, globe]
    }
}

impl LandmarkSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    fn detect(
        &mut self,
        _frame: &DynamicImage,
        timestamp_ms: f64,
    ) -> Result<Vec<Detection>, SourceError> {
        Ok(self.frame_at(timestamp_ms))
    }

    fn needs_camera(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Loops over a JSON-lines recording of [`DetectionFrame`]s.
pub struct ReplaySource {
    frames: Vec<DetectionFrame>,
    cursor: usize,
}

impl ReplaySource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = std::fs::File::open(path)?;
        let mut frames = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let frame: DetectionFrame = serde_json::from_str(&line).map_err(|e| {
                SourceError::Protocol(format!("{}:{}: {e}", path.display(), line_no + 1))
            })?;
            frames.push(frame);
        }
        if frames.is_empty() {
            return Err(SourceError::EmptyRecording(path.to_path_buf()));
        }
        info!("loaded {} recorded frames from {}", frames.len(), path.display());
        Ok(Self { frames, cursor: 0 })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    fn detect(
        &mut self,
        _frame: &DynamicImage,
        _timestamp_ms: f64,
    ) -> Result<Vec<Detection>, SourceError> {
        let frame = &self.frames[self.cursor];
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(frame.hands.clone())
    }

    fn needs_camera(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn handedness_parses_detector_labels() {
        assert_eq!(Handedness::from("Left"), Handedness::Left);
        assert_eq!(Handedness::from("Right"), Handedness::Right);
        assert_eq!(Handedness::from("left"), Handedness::Unknown);
        assert_eq!(Handedness::from(""), Handedness::Unknown);
    }

    #[test]
    fn bridge_reply_accepts_mediapipe_shape() {
        let json = r#"{"hands":[{"handedness":"Right","score":0.87,
            "landmarks":[{"x":0.5,"y":0.4,"z":0.0},{"x":0.1,"y":0.2}]}]}"#;
        let reply: BridgeReply = serde_json::from_str(json).unwrap();
        assert!(reply.error.is_none());
        assert_eq!(reply.hands.len(), 1);
        let hand = &reply.hands[0];
        assert_eq!(hand.handedness, Handedness::Right);
        assert!((hand.confidence - 0.87).abs() < 1e-6);
        assert_eq!(hand.landmarks[1].z, 0.0);
        assert!(!hand.is_complete());
    }

    #[test]
    fn synthetic_hand_has_requested_pinch_gap() {
        let hand = synthetic_hand(0.5, 0.6, 0.05);
        assert_eq!(hand.len(), LANDMARK_COUNT);
        assert_eq!(hand[index::WRIST], Landmark::new(0.5, 0.6, 0.0));
        let gap = (hand[index::THUMB_TIP].xy() - hand[index::INDEX_FINGER_TIP].xy()).norm();
        assert!((gap - 0.05).abs() < 1e-12);
    }

    #[test]
    fn simulated_hands_stay_in_their_zones() {
        let mut source = SimulatedSource::new(true);
        for step in 0..200 {
            let hands = source.detect(&blank(), step as f64 * 50.0).unwrap();
            assert_eq!(hands.len(), 2);
            let panel_wrist = hands[0].wrist().unwrap();
            let globe_wrist = hands[1].wrist().unwrap();
            assert_eq!(hands[0].handedness, Handedness::Left);
            assert!(panel_wrist.x < 0.6);
            assert_eq!(hands[1].handedness, Handedness::Right);
            assert!(globe_wrist.x > 0.4);
        }
    }

    #[test]
    fn simulated_labels_follow_policy() {
        use crate::config::RolePolicy;
        use crate::tracking::RoleClassifier;

        let policy = RolePolicy {
            mirrored_labels: false,
            ..RolePolicy::default()
        };
        let mut config = Config::default();
        config.detector.backend = DetectorBackend::Simulated;
        config.roles = policy;
        let mut source = open_source(&config, &AtomicBool::new(false)).unwrap();
        let mut classifier = RoleClassifier::new(policy);

        for step in 0..100 {
            let hands = source.detect(&blank(), step as f64 * 50.0).unwrap();
            assert_eq!(hands[0].handedness, Handedness::Right);
            assert_eq!(hands[1].handedness, Handedness::Left);
            let frame = classifier.classify_frame(&hands, step as f64 * 50.0);
            assert!(frame.state.panel_hand.detected);
            assert!(frame.state.globe_hand.detected);
        }
    }

    #[test]
    fn frame_header_layout() {
        let header = frame_header(640, 480, 3, 1234);
        assert_eq!(&header[0..4], &640u32.to_le_bytes());
        assert_eq!(&header[4..8], &480u32.to_le_bytes());
        assert_eq!(&header[8..12], &3u32.to_le_bytes());
        assert_eq!(u64::from_le_bytes(header[12..20].try_into().unwrap()), 1234);
    }

    #[test]
    fn video_timestamps_strictly_increase() {
        assert_eq!(video_timestamp(None, 16.7), 16);
        assert_eq!(video_timestamp(None, -3.0), 0);
        assert_eq!(video_timestamp(None, f64::NAN), 0);
        assert_eq!(video_timestamp(Some(16), 33.4), 33);
        // Same millisecond or clock going backwards still advances.
        assert_eq!(video_timestamp(Some(33), 33.9), 34);
        assert_eq!(video_timestamp(Some(40), 12.0), 41);
    }

    #[cfg(unix)]
    fn helper(script: &str, timeout_ms: u64) -> DetectorConfig {
        DetectorConfig {
            command: vec!["sh".into(), "-c".into(), script.into()],
            startup_timeout_ms: timeout_ms,
            ..DetectorConfig::default()
        }
    }

    #[cfg(unix)]
    #[test]
    fn stalled_helper_times_out() {
        let started = Instant::now();
        let result = MediaPipeBridge::spawn(&helper("sleep 5", 200), &AtomicBool::new(false));
        assert!(matches!(result, Err(SourceError::NotReady(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[test]
    fn cancel_aborts_startup() {
        let started = Instant::now();
        let result = MediaPipeBridge::spawn(&helper("sleep 5", 60_000), &AtomicBool::new(true));
        assert!(matches!(result, Err(SourceError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[test]
    fn wrong_greeting_is_rejected() {
        let result = MediaPipeBridge::spawn(&helper("echo HELLO", 5_000), &AtomicBool::new(false));
        match result {
            Err(SourceError::NotReady(message)) => assert!(message.contains("HELLO")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("helper without READY was accepted"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn exited_helper_reports_disconnect() {
        let mut bridge =
            MediaPipeBridge::spawn(&helper("echo READY", 5_000), &AtomicBool::new(false)).unwrap();
        let err = bridge.detect(&blank(), 0.0).unwrap_err();
        assert!(err.is_disconnect(), "unexpected error: {err}");
    }

    #[test]
    fn replay_loops_over_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let frames = [
            DetectionFrame { timestamp_ms: 0.0, hands: vec![] },
            DetectionFrame {
                timestamp_ms: 16.0,
                hands: vec![Detection {
                    landmarks: synthetic_hand(0.7, 0.5, 0.1),
                    handedness: Handedness::Right,
                    confidence: 0.9,
                }],
            },
        ];
        let text: Vec<String> = frames.iter().map(|f| serde_json::to_string(f).unwrap()).collect();
        std::fs::write(&path, text.join("\n") + "\n\n").unwrap();

        let mut replay = ReplaySource::open(&path).unwrap();
        assert!(replay.detect(&blank(), 0.0).unwrap().is_empty());
        assert_eq!(replay.detect(&blank(), 0.0).unwrap(), frames[1].hands);
        assert!(replay.detect(&blank(), 0.0).unwrap().is_empty());
    }

    #[test]
    fn empty_recording_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jsonl");
        std::fs::write(&path, "\n").unwrap();
        assert!(matches!(ReplaySource::open(&path), Err(SourceError::EmptyRecording(_))));
    }

    #[test]
    fn replay_backend_requires_a_path() {
        let mut config = Config::default();
        config.detector.backend = DetectorBackend::Replay;
        assert!(matches!(
            open_source(&config, &AtomicBool::new(false)),
            Err(SourceError::NotReady(_))
        ));
    }
}
