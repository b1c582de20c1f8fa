// src/config.rs
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub roles: RolePolicy,
    pub globe: GlobeConfig,
    pub panel: PanelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Show the feed as a selfie mirror.
    pub mirrored: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 1280,
            height: 720,
            fps: 60,
            mirrored: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    MediaPipe,
    Simulated,
    Replay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub backend: DetectorBackend,
    /// Program and leading arguments of the external landmarker process.
    pub command: Vec<String>,
    pub model_path: PathBuf,
    pub num_hands: u32,
    pub min_hand_detection_confidence: f32,
    pub min_hand_presence_confidence: f32,
    pub min_tracking_confidence: f32,
    pub replay_path: Option<PathBuf>,
    /// How long the landmarker may take to print READY.
    pub startup_timeout_ms: u64,
    /// Back-to-back I/O or protocol failures before tracking gives up.
    pub max_consecutive_failures: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: DetectorBackend::MediaPipe,
            command: vec!["python3".to_string(), "scripts/hand_landmarker.py".to_string()],
            model_path: PathBuf::from("models/hand_landmarker.task"),
            num_hands: 2,
            min_hand_detection_confidence: 0.5,
            min_hand_presence_confidence: 0.5,
            min_tracking_confidence: 0.5,
            replay_path: None,
            startup_timeout_ms: 30_000,
            max_consecutive_failures: 30,
        }
    }
}

/// Zone and pinch policy used by the role classifier.
///
/// Zone tests use the raw (unmirrored) wrist x. The two bands overlap on
/// `globe_zone_min_x..panel_zone_max_x` so a hand near the middle can still
/// drive whichever element its physical side owns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolePolicy {
    /// Wrist x must be strictly below this to drive the panel.
    pub panel_zone_max_x: f64,
    /// Wrist x must be strictly above this to drive the globe.
    pub globe_zone_min_x: f64,
    /// Thumb/index distance strictly below this counts as a pinch.
    pub pinch_threshold: f64,
    /// Detector labels come from a mirrored self-view, so "Left" is the
    /// user's physical right hand.
    pub mirrored_labels: bool,
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self {
            panel_zone_max_x: 0.6,
            globe_zone_min_x: 0.4,
            pinch_threshold: 0.08,
            mirrored_labels: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub pivot_x: f64,
    pub pivot_y: f64,
    pub yaw_gain: f64,
    pub pitch_gain: f64,
    pub pinch_cap: f64,
    pub scale_base: f64,
    pub scale_gain: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub rotation_factor: f64,
    pub scale_factor: f64,
    pub idle_factor: f64,
    /// Auto-rotation in radians per second while no hand drives the globe.
    pub idle_yaw_rate: f64,
    pub rest_scale: f64,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            pivot_x: 0.75,
            pivot_y: 0.5,
            yaw_gain: 6.0 * PI,
            pitch_gain: 2.0 * PI,
            pinch_cap: 0.4,
            scale_base: 0.6,
            scale_gain: 6.0,
            min_scale: 0.5,
            max_scale: 3.0,
            rotation_factor: 0.1,
            scale_factor: 0.08,
            idle_factor: 0.02,
            idle_yaw_rate: 0.1,
            rest_scale: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub follow_factor: f64,
    /// Pixels subtracted from the hand target so the panel hangs under the
    /// hand instead of pinning its corner to it.
    pub anchor_inset_x: f64,
    pub anchor_inset_y: f64,
    pub start_right_inset: f64,
    pub start_center_offset: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            follow_factor: 0.25,
            anchor_inset_x: 150.0,
            anchor_inset_y: 50.0,
            start_right_inset: 320.0,
            start_center_offset: 150.0,
        }
    }
}

impl Config {
    /// Per-user config file location, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "hologlobe", "HoloGlobe")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load from `path`, or from the per-user file when it exists, or fall
    /// back to defaults. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        std::fs::write(path, text).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let factors = [
            ("globe.rotation_factor", self.globe.rotation_factor),
            ("globe.scale_factor", self.globe.scale_factor),
            ("globe.idle_factor", self.globe.idle_factor),
            ("panel.follow_factor", self.panel.follow_factor),
        ];
        for (name, value) in factors {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if !(self.roles.pinch_threshold > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "roles.pinch_threshold must be positive, got {}",
                self.roles.pinch_threshold
            )));
        }
        if self.roles.globe_zone_min_x >= self.roles.panel_zone_max_x {
            // Without the overlap band a hand in the middle would drive nothing.
            return Err(ConfigError::Invalid(format!(
                "roles.globe_zone_min_x ({}) must be below roles.panel_zone_max_x ({})",
                self.roles.globe_zone_min_x, self.roles.panel_zone_max_x
            )));
        }
        if self.globe.min_scale > self.globe.max_scale || self.globe.min_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "globe scale bounds [{}, {}] are not a positive range",
                self.globe.min_scale, self.globe.max_scale
            )));
        }
        if self.globe.pinch_cap < 0.0 {
            return Err(ConfigError::Invalid("globe.pinch_cap must not be negative".into()));
        }
        if self.detector.startup_timeout_ms == 0 || self.detector.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid(
                "detector.startup_timeout_ms and detector.max_consecutive_failures must be non-zero"
                    .into(),
            ));
        }
        if self.camera.width == 0 || self.camera.height == 0 || self.camera.fps == 0 {
            return Err(ConfigError::Invalid("camera resolution and fps must be non-zero".into()));
        }
        Ok(())
    }
}
