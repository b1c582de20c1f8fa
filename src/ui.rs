// src/ui.rs - Holographic HUD drawing
use std::f64::consts::PI;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Rounding, Stroke, Vec2};
use image::RgbaImage;
use nalgebra::{Point3, Rotation3, Vector3};

use crate::globe::{GlobeFrame, GlobeTransform};
use crate::hud::{ContinentReadout, HudState};
use crate::landmarks::{Landmark, HAND_CONNECTIONS};
use crate::panel::PanelPosition;
use crate::tracking::{ClassifiedHand, HandRole};
use crate::worker::SystemState;

pub const PANEL_SIZE: Vec2 = Vec2::new(320.0, 300.0);

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color32,
    pub secondary: Color32,
    pub background: Color32,
    pub surface: Color32,
    pub error: Color32,
    pub warning: Color32,
    pub ignored: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(0, 255, 255),
            secondary: Color32::from_rgb(40, 120, 255),
            background: Color32::from_rgb(4, 10, 16),
            surface: Color32::from_rgba_unmultiplied(8, 40, 52, 200),
            error: Color32::from_rgb(239, 68, 68),
            warning: Color32::from_rgb(250, 204, 21),
            ignored: Color32::from_rgb(90, 90, 90),
            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(165, 243, 252),
        }
    }
}

impl Theme {
    fn faint(&self) -> Color32 {
        self.primary.gamma_multiply(0.3)
    }

    pub fn hand_color(&self, role: HandRole) -> Color32 {
        match role {
            HandRole::PanelControl => self.primary,
            HandRole::GlobeControl => self.secondary,
            HandRole::None => self.ignored,
        }
    }
}

/// Screen position of a landmark, flipped horizontally for a mirrored view.
pub fn landmark_to_screen(landmark: &Landmark, rect: Rect, mirrored: bool) -> Pos2 {
    let x = if mirrored { 1.0 - landmark.x as f32 } else { landmark.x as f32 };
    Pos2::new(
        rect.left() + x * rect.width(),
        rect.top() + landmark.y as f32 * rect.height(),
    )
}

/// Rotation applied to the globe mesh: pitch about X, then yaw about Y.
pub fn globe_rotation(transform: &GlobeTransform) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), transform.pitch)
        * Rotation3::from_axis_angle(&Vector3::y_axis(), transform.yaw)
}

/// Meridians and parallels of a unit sphere every `step_deg` degrees,
/// rotated into view. Z points at the viewer.
pub fn globe_wireframe(rotation: &Rotation3<f64>, step_deg: f64) -> Vec<Vec<Point3<f64>>> {
    let step = step_deg.to_radians();
    let samples = 48;
    let mut lines = Vec::new();

    let point = |lat: f64, lon: f64| {
        rotation * Point3::new(lat.cos() * lon.sin(), lat.sin(), lat.cos() * lon.cos())
    };

    let mut lon = 0.0;
    while lon < 2.0 * PI - 1e-9 {
        lines.push(
            (0..=samples)
                .map(|i| point(-PI / 2.0 + PI * i as f64 / samples as f64, lon))
                .collect(),
        );
        lon += step;
    }

    let mut lat = -PI / 2.0 + step;
    while lat < PI / 2.0 - 1e-9 {
        lines.push(
            (0..=samples)
                .map(|i| point(lat, 2.0 * PI * i as f64 / samples as f64))
                .collect(),
        );
        lat += step;
    }
    lines
}

/// Compact yaw/pitch/zoom telemetry, yaw wrapped to [0, 360).
pub fn orientation_readout(transform: &GlobeTransform) -> String {
    format!(
        "Y{:03.0} P{:+03.0} x{:.2}",
        transform.yaw.to_degrees().rem_euclid(360.0),
        transform.pitch.to_degrees(),
        transform.scale
    )
}

pub fn draw_arc(
    painter: &egui::Painter,
    center: Pos2,
    radius: f32,
    start_angle: f32,
    end_angle: f32,
    color: Color32,
    thickness: f32,
) {
    let points_count = ((end_angle - start_angle).abs() * 50.0).max(1.0) as usize;
    let points: Vec<Pos2> = (0..=points_count)
        .map(|i| {
            let t = i as f32 / points_count as f32;
            let angle = start_angle + (end_angle - start_angle) * t;
            Pos2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect();
    painter.add(egui::Shape::line(points, Stroke::new(thickness, color)));
}

pub struct UIComponents {
    pub theme: Theme,
    video: VideoWidget,
    mirrored: bool,
    spin: f32,
}

impl UIComponents {
    pub fn new(mirrored: bool) -> Self {
        Self {
            theme: Theme::default(),
            video: VideoWidget::new(mirrored),
            mirrored,
            spin: 0.0,
        }
    }

    /// Advance decorative animation.
    pub fn animate(&mut self, dt: f32) {
        self.spin = (self.spin + dt * 0.5) % std::f32::consts::TAU;
    }

    pub fn update_video(&mut self, ctx: &egui::Context, frame: u64, image: Option<&RgbaImage>) {
        self.video.update_frame(ctx, frame, image);
    }

    pub fn draw_background(&self, painter: &egui::Painter, rect: Rect) {
        painter.rect_filled(rect, Rounding::ZERO, self.theme.background);
        self.video.paint(painter, rect);
    }

    pub fn draw_hand(&self, painter: &egui::Painter, rect: Rect, hand: &ClassifiedHand) {
        let landmarks = &hand.detection.landmarks;
        if !hand.detection.is_complete() {
            return;
        }
        let color = self.theme.hand_color(hand.role);
        let points: Vec<Pos2> = landmarks
            .iter()
            .map(|l| landmark_to_screen(l, rect, self.mirrored))
            .collect();

        for &(from, to) in HAND_CONNECTIONS.iter() {
            painter.line_segment([points[from], points[to]], Stroke::new(2.0, color));
        }
        for point in &points {
            painter.circle_filled(*point, 3.0, color);
        }

        if hand.role != HandRole::None && hand.is_pinching {
            let thumb = points[crate::landmarks::index::THUMB_TIP];
            let index = points[crate::landmarks::index::INDEX_FINGER_TIP];
            let mid = thumb + (index - thumb) * 0.5;
            painter.circle_stroke(mid, 12.0, Stroke::new(2.0, self.theme.text_primary));
        }
    }

    pub fn draw_globe(&self, painter: &egui::Painter, center: Pos2, radius: f32, frame: &GlobeFrame) {
        let radius = radius * frame.transform.scale as f32;
        let project = |p: &Point3<f64>| {
            Pos2::new(center.x + p.x as f32 * radius, center.y - p.y as f32 * radius)
        };

        let front = Stroke::new(1.2, self.theme.primary.gamma_multiply(0.8));
        let back = Stroke::new(0.8, self.theme.primary.gamma_multiply(0.15));
        for line in globe_wireframe(&globe_rotation(&frame.transform), 30.0) {
            for pair in line.windows(2) {
                let stroke = if pair[0].z >= 0.0 && pair[1].z >= 0.0 { front } else { back };
                painter.line_segment([project(&pair[0]), project(&pair[1])], stroke);
            }
        }

        // Counter-rotating outer shell ring.
        let shell = Rotation3::from_axis_angle(&Vector3::z_axis(), frame.shell_roll)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), 1.2)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), frame.shell_yaw);
        let ring: Vec<Pos2> = (0..=96)
            .map(|i| {
                let a = 2.0 * PI * i as f64 / 96.0;
                project(&(shell * Point3::new(1.25 * a.cos(), 0.0, 1.25 * a.sin())))
            })
            .collect();
        painter.add(egui::Shape::line(ring, Stroke::new(1.0, self.theme.faint())));
    }

    pub fn draw_frame_decor(&self, painter: &egui::Painter, rect: Rect) {
        let color = self.theme.primary.gamma_multiply(0.8);
        let len = 24.0;
        let inset = rect.shrink(16.0);
        for (corner, dx, dy) in [
            (inset.left_top(), 1.0, 1.0),
            (inset.right_top(), -1.0, 1.0),
            (inset.left_bottom(), 1.0, -1.0),
            (inset.right_bottom(), -1.0, -1.0),
        ] {
            painter.line_segment([corner, corner + Vec2::new(dx * len, 0.0)], Stroke::new(2.0, color));
            painter.line_segment([corner, corner + Vec2::new(0.0, dy * len)], Stroke::new(2.0, color));
        }

        // Center reticle.
        let center = rect.center();
        let faint = self.theme.primary.gamma_multiply(0.15);
        painter.circle_stroke(center, 200.0, Stroke::new(1.0, faint));
        for k in 0..12 {
            let start = self.spin + k as f32 * std::f32::consts::TAU / 12.0;
            draw_arc(painter, center, 190.0, start, start + 0.25, faint, 1.0);
        }
        painter.line_segment(
            [Pos2::new(center.x - 200.0, center.y), Pos2::new(center.x + 200.0, center.y)],
            Stroke::new(1.0, faint),
        );
        painter.line_segment(
            [Pos2::new(center.x, center.y - 200.0), Pos2::new(center.x, center.y + 200.0)],
            Stroke::new(1.0, faint),
        );
    }

    pub fn draw_header(&self, painter: &egui::Painter, rect: Rect, state: &SystemState, clock: &str) {
        let top = rect.top() + 24.0;
        let badge = Pos2::new(rect.left() + 68.0, top + 20.0);
        painter.circle_stroke(badge, 20.0, Stroke::new(1.0, self.theme.primary));
        draw_arc(painter, badge, 20.0, self.spin * 2.0, self.spin * 2.0 + 1.5, self.theme.text_secondary, 2.0);
        painter.circle_filled(badge, 8.0, self.theme.primary);

        painter.text(
            Pos2::new(badge.x + 36.0, top + 6.0),
            Align2::LEFT_TOP,
            "SYSTEM STATUS",
            FontId::monospace(10.0),
            self.theme.text_secondary,
        );
        let status_color = match state {
            SystemState::Active => self.theme.primary,
            SystemState::Error(_) => self.theme.error,
            _ => self.theme.warning,
        };
        painter.text(
            Pos2::new(badge.x + 36.0, top + 20.0),
            Align2::LEFT_TOP,
            state.label(),
            FontId::proportional(20.0),
            status_color,
        );

        painter.text(
            Pos2::new(rect.right() - 48.0, top),
            Align2::RIGHT_TOP,
            "C.Y.R.U.S",
            FontId::proportional(34.0),
            self.theme.text_primary,
        );
        painter.text(
            Pos2::new(rect.right() - 48.0, top + 44.0),
            Align2::RIGHT_TOP,
            clock,
            FontId::monospace(14.0),
            self.theme.text_secondary,
        );
    }

    /// MANUAL_OVERRIDE box with one light per controlling hand.
    pub fn draw_status_lights(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        globe: bool,
        panel: bool,
        transform: Option<GlobeTransform>,
    ) {
        let area = Rect::from_min_size(
            Pos2::new(rect.left() + 48.0, rect.bottom() - 150.0),
            Vec2::new(256.0, 100.0),
        );
        painter.rect_filled(area, Rounding::same(4.0), self.theme.surface);
        painter.line_segment([area.left_top(), area.left_bottom()], Stroke::new(4.0, self.theme.primary));
        painter.text(
            area.left_top() + Vec2::new(14.0, 10.0),
            Align2::LEFT_TOP,
            "MANUAL_OVERRIDE",
            FontId::monospace(13.0),
            self.theme.primary,
        );
        if let Some(transform) = transform {
            painter.text(
                area.right_top() + Vec2::new(-14.0, 12.0),
                Align2::RIGHT_TOP,
                orientation_readout(&transform),
                FontId::monospace(9.0),
                self.theme.text_secondary,
            );
        }

        for (row, (label, on)) in [("L_HAND [TERRAFORM]", globe), ("R_HAND [INTERFACE]", panel)]
            .into_iter()
            .enumerate()
        {
            let y = area.top() + 44.0 + row as f32 * 26.0;
            painter.text(
                Pos2::new(area.left() + 14.0, y),
                Align2::LEFT_CENTER,
                label,
                FontId::monospace(11.0),
                self.theme.text_secondary,
            );
            let color = if on {
                self.theme.primary
            } else {
                Color32::from_rgb(127, 29, 29)
            };
            painter.circle_filled(Pos2::new(area.right() - 18.0, y), 4.0, color);
        }
    }

    pub fn draw_event_log(&self, painter: &egui::Painter, rect: Rect, hud: &HudState) {
        let bottom = rect.bottom() - 40.0;
        for (i, entry) in hud.events().enumerate() {
            let color = if i == 0 {
                self.theme.text_secondary
            } else {
                self.theme.primary.gamma_multiply(0.4)
            };
            painter.text(
                Pos2::new(rect.center().x, bottom - i as f32 * 14.0),
                Align2::CENTER_BOTTOM,
                format!("{} [{}]", entry.message, entry.time),
                FontId::monospace(10.0),
                color,
            );
        }
    }

    /// Floating GEO_INTEL_ANALYSIS panel at its mapped position.
    pub fn draw_geo_panel(&self, painter: &egui::Painter, position: PanelPosition, readout: &ContinentReadout) {
        let scale = if position.engaged { 1.05 } else { 1.0 };
        let rect = Rect::from_min_size(
            Pos2::new(position.x as f32, position.y as f32),
            PANEL_SIZE * scale,
        );
        let border = if position.engaged {
            Stroke::new(2.0, self.theme.text_primary)
        } else {
            Stroke::new(1.0, self.theme.faint())
        };
        painter.rect_filled(rect, Rounding::same(2.0), self.theme.surface);
        painter.rect_stroke(rect, Rounding::same(2.0), border);

        let title = Rect::from_min_size(rect.min, Vec2::new(rect.width(), 28.0));
        painter.rect_filled(title, Rounding::ZERO, Color32::from_rgba_unmultiplied(8, 51, 68, 220));
        painter.text(
            title.left_center() + Vec2::new(12.0, 0.0),
            Align2::LEFT_CENTER,
            "GEO_INTEL_ANALYSIS",
            FontId::monospace(12.0),
            self.theme.primary,
        );
        painter.text(
            title.right_center() - Vec2::new(8.0, 0.0),
            Align2::RIGHT_CENTER,
            "DRAG_ENABLED",
            FontId::monospace(8.0),
            self.theme.faint(),
        );

        let body = rect.min + Vec2::new(18.0, 44.0);
        painter.text(body, Align2::LEFT_TOP, "TARGET_ZONE //", FontId::monospace(10.0), self.theme.primary);
        painter.text(
            body + Vec2::new(0.0, 16.0),
            Align2::LEFT_TOP,
            readout.name,
            FontId::proportional(26.0),
            self.theme.text_primary,
        );
        painter.text(
            body + Vec2::new(0.0, 50.0),
            Align2::LEFT_TOP,
            format!("ID: {}", readout.code),
            FontId::monospace(11.0),
            self.theme.text_secondary,
        );

        let threat = if readout.is_critical() {
            self.theme.error
        } else {
            self.theme.text_secondary
        };
        for (col, (label, value, color)) in [
            ("THREAT_LVL", readout.activity, threat),
            ("POPULATION", readout.population, self.theme.text_secondary),
        ]
        .into_iter()
        .enumerate()
        {
            let at = body + Vec2::new(col as f32 * 140.0, 80.0);
            painter.text(at, Align2::LEFT_TOP, label, FontId::monospace(9.0), self.theme.primary);
            painter.text(at + Vec2::new(0.0, 14.0), Align2::LEFT_TOP, value, FontId::proportional(18.0), color);
        }

        for i in 0..6 {
            let y = body.y + 130.0 + i as f32 * 12.0;
            let color = self.theme.primary.gamma_multiply(0.5);
            painter.text(Pos2::new(body.x, y), Align2::LEFT_TOP, format!("DATALINK_{}", i), FontId::monospace(9.0), color);
            painter.text(Pos2::new(rect.right() - 18.0, y), Align2::RIGHT_TOP, "[OK]", FontId::monospace(9.0), color);
        }
    }

    pub fn draw_error_banner(&self, painter: &egui::Painter, rect: Rect, reason: &str) {
        let banner = Rect::from_center_size(rect.center(), Vec2::new(rect.width().min(720.0), 90.0));
        painter.rect_filled(banner, Rounding::same(6.0), Color32::from_rgba_unmultiplied(60, 0, 0, 220));
        painter.rect_stroke(banner, Rounding::same(6.0), Stroke::new(2.0, self.theme.error));
        painter.text(
            banner.center() - Vec2::new(0.0, 14.0),
            Align2::CENTER_CENTER,
            "SYSTEM FAULT",
            FontId::proportional(22.0),
            self.theme.error,
        );
        painter.text(
            banner.center() + Vec2::new(0.0, 16.0),
            Align2::CENTER_CENTER,
            reason,
            FontId::monospace(12.0),
            self.theme.text_primary,
        );
    }
}

/// Camera frame as a texture, optionally shown mirrored like a selfie view.
pub struct VideoWidget {
    texture: Option<egui::TextureHandle>,
    frame: u64,
    aspect_ratio: f32,
    mirrored: bool,
}

impl VideoWidget {
    pub fn new(mirrored: bool) -> Self {
        Self {
            texture: None,
            frame: 0,
            aspect_ratio: 16.0 / 9.0,
            mirrored,
        }
    }

    pub fn update_frame(&mut self, ctx: &egui::Context, frame: u64, image: Option<&RgbaImage>) {
        let Some(image) = image else {
            self.texture = None;
            return;
        };
        if frame == self.frame && self.texture.is_some() {
            return;
        }

        let size = [image.width() as usize, image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        match self.texture.as_mut() {
            Some(texture) => texture.set(color_image, Default::default()),
            None => {
                self.texture = Some(ctx.load_texture("video_frame", color_image, Default::default()))
            }
        }
        self.frame = frame;
        self.aspect_ratio = image.width() as f32 / image.height().max(1) as f32;
    }

    /// Cover `rect`, cropping the frame to keep its aspect ratio.
    pub fn paint(&self, painter: &egui::Painter, rect: Rect) {
        let Some(texture) = &self.texture else {
            return;
        };
        let uv = cover_uv(rect.width() / rect.height().max(1.0), self.aspect_ratio, self.mirrored);
        painter.image(texture.id(), rect, uv, Color32::from_gray(150));
    }
}

/// Texture coordinates that crop a frame of `frame_ratio` to fill a rect of
/// `rect_ratio`. Swapped U bounds mirror the image horizontally.
pub fn cover_uv(rect_ratio: f32, frame_ratio: f32, mirrored: bool) -> Rect {
    let (u, v) = if rect_ratio > frame_ratio {
        (1.0, frame_ratio / rect_ratio)
    } else {
        (rect_ratio / frame_ratio, 1.0)
    };
    let (u0, v0) = ((1.0 - u) / 2.0, (1.0 - v) / 2.0);
    if mirrored {
        Rect::from_min_max(Pos2::new(u0 + u, v0), Pos2::new(u0, v0 + v))
    } else {
        Rect::from_min_max(Pos2::new(u0, v0), Pos2::new(u0 + u, v0 + v))
    }
}
