// src/globe.rs - Hand position → globe rotation/scale, and the faced continent
use std::f64::consts::PI;

use crate::config::GlobeConfig;
use crate::interaction::HandInteraction;
use crate::smoothing::SmoothedParameter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinentRegion {
    /// Half-open longitude range `[lo, hi)` in degrees.
    pub range: (f64, f64),
    pub name: &'static str,
    pub code: &'static str,
    pub activity: &'static str,
    pub population: &'static str,
}

impl ContinentRegion {
    pub fn contains(&self, longitude: f64) -> bool {
        longitude >= self.range.0 && longitude < self.range.1
    }
}

/// Partitions [0, 360) with no gaps or overlaps.
pub const CONTINENTS: [ContinentRegion; 5] = [
    ContinentRegion {
        range: (300.0, 360.0),
        name: "NORTH AMERICA",
        code: "NA-01",
        activity: "HIGH",
        population: "592M",
    },
    ContinentRegion {
        range: (0.0, 60.0),
        name: "EUROPE / AFRICA",
        code: "EU-AF",
        activity: "MODERATE",
        population: "2.1B",
    },
    ContinentRegion {
        range: (60.0, 150.0),
        name: "ASIA",
        code: "AS-01",
        activity: "CRITICAL",
        population: "4.7B",
    },
    ContinentRegion {
        range: (150.0, 240.0),
        name: "PACIFIC OCEAN",
        code: "OC-00",
        activity: "LOW",
        population: "N/A",
    },
    ContinentRegion {
        range: (240.0, 300.0),
        name: "SOUTH AMERICA",
        code: "SA-01",
        activity: "MODERATE",
        population: "430M",
    },
];

pub fn continent_for(view_longitude: f64) -> Option<&'static ContinentRegion> {
    CONTINENTS.iter().find(|c| c.contains(view_longitude))
}

/// Longitude facing the camera for a globe yawed by `yaw` radians.
///
/// Positive yaw turns the surface eastward past the viewer, so the facing
/// longitude runs the other way.
pub fn view_longitude(yaw: f64) -> f64 {
    // rem_euclid may return exactly 360.0 for tiny negative inputs; the
    // final modulo folds that back to 0.
    let degrees = yaw.to_degrees().rem_euclid(360.0);
    (360.0 - degrees) % 360.0
}

/// Pinch distance → target scale. Open hand zooms in, closed hand zooms out.
pub fn target_scale(pinch_distance: f64, config: &GlobeConfig) -> f64 {
    let pinch = if pinch_distance.is_nan() {
        0.0
    } else {
        pinch_distance.clamp(0.0, config.pinch_cap)
    };
    (config.scale_base + pinch * config.scale_gain).clamp(config.min_scale, config.max_scale)
}

/// Target (pitch, yaw) for a hand at normalized `position`.
pub fn target_rotation(position_x: f64, position_y: f64, config: &GlobeConfig) -> (f64, f64) {
    let yaw = -(position_x - config.pivot_x) * config.yaw_gain;
    let pitch = -(position_y - config.pivot_y) * config.pitch_gain;
    (pitch, yaw)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobeTransform {
    pub pitch: f64,
    pub yaw: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct GlobeFrame {
    pub transform: GlobeTransform,
    pub continent: Option<&'static ContinentRegion>,
    /// Counter-rotating outer shell, purely decorative.
    pub shell_yaw: f64,
    pub shell_roll: f64,
}

pub struct GlobeMapper {
    config: GlobeConfig,
    pitch: SmoothedParameter,
    yaw: SmoothedParameter,
    scale: SmoothedParameter,
    shell_yaw: f64,
    elapsed: f64,
}

impl GlobeMapper {
    pub fn new(config: GlobeConfig) -> Self {
        Self {
            pitch: SmoothedParameter::new(0.0, config.rotation_factor),
            yaw: SmoothedParameter::new(0.0, config.rotation_factor),
            scale: SmoothedParameter::new(config.rest_scale, config.scale_factor),
            shell_yaw: 0.0,
            elapsed: 0.0,
            config,
        }
    }

    pub fn transform(&self) -> GlobeTransform {
        GlobeTransform {
            pitch: self.pitch.current,
            yaw: self.yaw.current,
            scale: self.scale.current,
        }
    }

    /// Advance one animation frame. `dt` is seconds since the last call.
    pub fn update(&mut self, hand: &HandInteraction, dt: f64) -> GlobeFrame {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let idle_step = self.config.idle_yaw_rate * dt;
        self.elapsed += dt;

        if hand.detected {
            let (pitch, yaw) = target_rotation(hand.position.x, hand.position.y, &self.config);
            self.pitch.set_target(pitch);
            self.yaw.set_target(yaw);
            self.scale.set_target(target_scale(hand.pinch_distance, &self.config));

            self.yaw.advance();
            self.pitch.advance();
            self.scale.advance();
        } else {
            self.yaw.offset(idle_step);
            self.pitch.relax_toward(0.0, self.config.idle_factor);
            self.scale.relax_toward(self.config.rest_scale, self.config.idle_factor);
        }

        self.shell_yaw -= idle_step * 1.5;

        GlobeFrame {
            transform: self.transform(),
            continent: continent_for(view_longitude(self.yaw.current)),
            shell_yaw: self.shell_yaw,
            shell_roll: (self.elapsed * 0.2).sin() * 0.1,
        }
    }
}
