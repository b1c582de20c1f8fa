// src/data.rs - Interaction trace export and detection recordings
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;

use crate::globe::{ContinentRegion, GlobeTransform};
use crate::interaction::{HandInteraction, InteractionState};
use crate::landmarks::DetectionFrame;
use crate::panel::PanelPosition;

/// Where sessions go when the user has not picked a directory.
pub fn default_output_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|p| p.join("HoloGlobe")))
        .unwrap_or_else(|| PathBuf::from("./output"))
}

#[derive(Debug, Serialize)]
struct TraceRecord {
    frame: u64,
    timestamp_ms: f64,

    globe_detected: bool,
    globe_x: Option<f64>,
    globe_y: Option<f64>,
    globe_pinch: Option<f64>,
    globe_pinching: bool,

    panel_detected: bool,
    panel_x: Option<f64>,
    panel_y: Option<f64>,
    panel_pinch: Option<f64>,
    panel_pinching: bool,

    pitch: f64,
    yaw: f64,
    scale: f64,
    continent: Option<&'static str>,

    panel_screen_x: f64,
    panel_screen_y: f64,
    panel_engaged: bool,
}

/// What the app saw and showed on one animation frame.
#[derive(Debug, Clone, Copy)]
pub struct TraceSample {
    pub state: InteractionState,
    pub transform: GlobeTransform,
    pub continent: Option<&'static ContinentRegion>,
    pub panel: PanelPosition,
}

impl TraceSample {
    fn record(&self) -> TraceRecord {
        let hand = |h: &HandInteraction| {
            if h.detected {
                (Some(h.position.x), Some(h.position.y), Some(h.pinch_distance))
            } else {
                (None, None, None)
            }
        };
        let (globe_x, globe_y, globe_pinch) = hand(&self.state.globe_hand);
        let (panel_x, panel_y, panel_pinch) = hand(&self.state.panel_hand);

        TraceRecord {
            frame: self.state.frame,
            timestamp_ms: self.state.timestamp_ms,
            globe_detected: self.state.globe_hand.detected,
            globe_x,
            globe_y,
            globe_pinch,
            globe_pinching: self.state.globe_hand.is_pinching,
            panel_detected: self.state.panel_hand.detected,
            panel_x,
            panel_y,
            panel_pinch,
            panel_pinching: self.state.panel_hand.is_pinching,
            pitch: self.transform.pitch,
            yaw: self.transform.yaw,
            scale: self.transform.scale,
            continent: self.continent.map(|c| c.code),
            panel_screen_x: self.panel.x,
            panel_screen_y: self.panel.y,
            panel_engaged: self.panel.engaged,
        }
    }
}

pub struct InteractionTrace {
    output_dir: PathBuf,
    session_name: String,
    samples: Vec<TraceSample>,
}

impl InteractionTrace {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            samples: Vec::new(),
        }
    }

    pub fn add_sample(&mut self, sample: TraceSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("interaction_trace.csv");
        std::fs::create_dir_all(self.session_dir())
            .with_context(|| format!("failed to create {}", self.session_dir().display()))?;

        let file = File::create(&csv_path)
            .with_context(|| format!("failed to create {}", csv_path.display()))?;
        let mut writer = Writer::from_writer(file);
        for sample in &self.samples {
            writer.serialize(sample.record())?;
        }
        writer.flush()?;

        Ok(csv_path)
    }
}

/// Writes detections as JSON lines, one [`DetectionFrame`] per line.
pub struct DetectionRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    frames: usize,
}

impl DetectionRecorder {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)
            .with_context(|| format!("failed to create recording {}", path.display()))?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            frames: 0,
        })
    }

    pub fn record(&mut self, frame: &DetectionFrame) -> Result<()> {
        serde_json::to_writer(&mut self.writer, frame)?;
        self.writer.write_all(b"\n")?;
        self.frames += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for DetectionRecorder {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globe::continent_for;
    use crate::landmarks::{synthetic_hand, Detection, Handedness, LandmarkSource, ReplaySource};
    use image::DynamicImage;
    use nalgebra::Point2;

    fn sample(frame: u64, globe: bool) -> TraceSample {
        let mut state = InteractionState {
            frame,
            timestamp_ms: frame as f64 * 16.0,
            ..InteractionState::default()
        };
        if globe {
            state.globe_hand = HandInteraction {
                detected: true,
                position: Point2::new(0.7, 0.4),
                pinch_distance: 0.12,
                is_pinching: false,
            };
        }
        TraceSample {
            state,
            transform: GlobeTransform { pitch: 0.1, yaw: 0.2, scale: 1.2 },
            continent: continent_for(0.0),
            panel: PanelPosition { x: 1280.0, y: 300.0, engaged: false },
        }
    }

    #[test]
    fn trace_exports_one_row_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let mut trace = InteractionTrace::new(dir.path(), Some("test_session".into()));
        trace.add_sample(sample(1, true));
        trace.add_sample(sample(2, false));
        assert_eq!(trace.len(), 2);

        let path = trace.export_csv().unwrap();
        assert_eq!(path, dir.path().join("test_session").join("interaction_trace.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "frame");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);

        let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
        assert_eq!(&rows[0][col("globe_x")], "0.7");
        assert_eq!(&rows[0][col("continent")], "EU-AF");
        assert_eq!(&rows[1][col("globe_detected")], "false");
        assert_eq!(&rows[1][col("globe_x")], "");
    }

    #[test]
    fn default_session_name_is_timestamped() {
        let trace = InteractionTrace::new("/tmp", None);
        let name = trace.session_dir().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("session_"));
        assert_eq!(name.len(), "session_20240101_120000".len());
    }

    #[test]
    fn recording_replays_frame_by_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hands.jsonl");

        let hand = Detection {
            landmarks: synthetic_hand(0.3, 0.5, 0.02),
            handedness: Handedness::Left,
            confidence: 0.9,
        };
        let mut recorder = DetectionRecorder::create(&path).unwrap();
        recorder
            .record(&DetectionFrame { timestamp_ms: 0.0, hands: vec![hand.clone()] })
            .unwrap();
        recorder
            .record(&DetectionFrame { timestamp_ms: 33.0, hands: vec![] })
            .unwrap();
        assert_eq!(recorder.frames_written(), 2);
        drop(recorder);

        let mut replay = ReplaySource::open(&path).unwrap();
        assert_eq!(replay.len(), 2);
        let blank = DynamicImage::new_rgb8(4, 4);
        assert_eq!(replay.detect(&blank, 0.0).unwrap(), vec![hand]);
        assert!(replay.detect(&blank, 33.0).unwrap().is_empty());
    }
}
