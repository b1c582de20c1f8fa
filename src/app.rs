// src/app.rs
use std::path::PathBuf;

use chrono::Local;
use eframe::egui;
use tracing::{error, info};

use crate::config::Config;
use crate::data::{default_output_dir, InteractionTrace, TraceSample};
use crate::hud::HudState;
use crate::interaction::InteractionReader;
use crate::panel::Viewport;
use crate::presentation::Scene;
use crate::ui::UIComponents;
use crate::worker::{FrameOverlay, SystemState, TrackingHandle};

pub struct HoloApp {
    config: Config,
    config_path: Option<PathBuf>,
    reader: InteractionReader,
    tracking: TrackingHandle,
    scene: Option<Scene>,
    hud: HudState,
    ui_components: UIComponents,

    output_directory: PathBuf,
    trace: Option<InteractionTrace>,
    last_export: Option<String>,

    show_settings: bool,
    show_overlay: bool,
}

impl HoloApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: Config,
        config_path: Option<PathBuf>,
        tracking: TrackingHandle,
        reader: InteractionReader,
    ) -> Self {
        let ui_components = UIComponents::new(config.camera.mirrored);
        Self {
            config,
            config_path,
            reader,
            tracking,
            scene: None,
            hud: HudState::new(),
            ui_components,
            output_directory: default_output_dir(),
            trace: None,
            last_export: None,
            show_settings: false,
            show_overlay: true,
        }
    }

    fn render_scene(&self, ctx: &egui::Context, state: &SystemState, overlay: &FrameOverlay) {
        let painter = ctx.layer_painter(egui::LayerId::background());
        let screen = ctx.screen_rect();

        self.ui_components.draw_background(&painter, screen);
        self.ui_components.draw_frame_decor(&painter, screen);

        if self.show_overlay {
            for hand in &overlay.hands {
                self.ui_components.draw_hand(&painter, screen, hand);
            }
        }

        if let Some(scene) = &self.scene {
            if let Some(globe) = scene.last_globe_frame() {
                let radius = screen.width().min(screen.height()) * 0.22;
                self.ui_components.draw_globe(&painter, screen.center(), radius, globe);
            }
        }

        let clock = Local::now().format("%H:%M:%S").to_string();
        self.ui_components.draw_header(&painter, screen, state, &clock);

        let (globe_hand, panel_hand) = self.hud.hands_tracked();
        self.ui_components.draw_status_lights(
            &painter,
            screen,
            globe_hand,
            panel_hand,
            self.hud.globe_transform(),
        );
        self.ui_components.draw_event_log(&painter, screen, &self.hud);

        if let Some(position) = self.hud.panel_position() {
            let fg = ctx.layer_painter(egui::LayerId::new(
                egui::Order::Middle,
                egui::Id::new("geo_panel"),
            ));
            self.ui_components
                .draw_geo_panel(&fg, position, self.hud.continent());
        }

        if let SystemState::Error(reason) = state {
            let fg = ctx.layer_painter(egui::LayerId::new(
                egui::Order::Foreground,
                egui::Id::new("error_banner"),
            ));
            self.ui_components.draw_error_banner(&fg, screen, reason);
        }
    }

    fn render_control_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("controls")
            .frame(egui::Frame::none().inner_margin(8.0))
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let recording = self.trace.is_some();
                    let label = if recording { "⏹ Stop trace" } else { "⏺ Record trace" };
                    if ui.button(label).clicked() {
                        self.toggle_trace();
                    }

                    if ui
                        .add_enabled(
                            self.trace.as_ref().is_some_and(|t| !t.is_empty()),
                            egui::Button::new("Export trace"),
                        )
                        .clicked()
                    {
                        self.export_trace();
                    }

                    ui.checkbox(&mut self.show_overlay, "Skeleton");

                    if let Some(trace) = &self.trace {
                        ui.label(
                            egui::RichText::new(format!("TRACE: {} frames", trace.len()))
                                .color(self.ui_components.theme.error),
                        );
                    }
                    if let Some(message) = &self.last_export {
                        ui.label(message);
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("⚙ Settings").clicked() {
                            self.show_settings = !self.show_settings;
                        }
                    });
                });
            });
    }

    fn toggle_trace(&mut self) {
        if self.trace.is_some() {
            self.export_trace();
            if let Some(trace) = self.trace.take() {
                info!("trace stopped after {} frames", trace.len());
            }
        } else {
            let trace = InteractionTrace::new(&self.output_directory, None);
            info!("recording trace into {}", trace.session_dir().display());
            self.trace = Some(trace);
        }
    }

    fn export_trace(&mut self) {
        let Some(trace) = &self.trace else {
            return;
        };
        if trace.is_empty() {
            return;
        }
        match trace.export_csv() {
            Ok(path) => {
                info!("exported {} frames to {}", trace.len(), path.display());
                self.last_export = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                error!("trace export failed: {:#}", e);
                self.last_export = Some(format!("Export failed: {}", e));
            }
        }
    }

    fn save_config(&mut self) {
        let Some(path) = self.config_path.clone().or_else(Config::default_path) else {
            self.last_export = Some("No config directory available".into());
            return;
        };
        match self.config.save(&path) {
            Ok(()) => {
                info!("saved config to {}", path.display());
                self.last_export = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                error!("{}", e);
                self.last_export = Some(e.to_string());
            }
        }
    }

    fn render_settings_window(&mut self, ctx: &egui::Context, overlay: &FrameOverlay) {
        let mut open = self.show_settings;
        let mut save_requested = false;
        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(true)
            .default_size([360.0, 420.0])
            .show(ctx, |ui| {
                ui.heading("Role Policy");
                let roles = &self.config.roles;
                egui::Grid::new("policy").num_columns(2).show(ui, |ui| {
                    ui.label("Panel zone");
                    ui.label(format!("wrist x < {:.2}", roles.panel_zone_max_x));
                    ui.end_row();
                    ui.label("Globe zone");
                    ui.label(format!("wrist x > {:.2}", roles.globe_zone_min_x));
                    ui.end_row();
                    ui.label("Pinch threshold");
                    ui.label(format!("{:.3}", roles.pinch_threshold));
                    ui.end_row();
                    ui.label("Mirrored labels");
                    ui.label(roles.mirrored_labels.to_string());
                    ui.end_row();
                });

                ui.separator();
                ui.heading("Smoothing");
                ui.add(
                    egui::Slider::new(&mut self.config.panel.follow_factor, 0.01..=1.0)
                        .text("Panel follow (next session)"),
                );
                ui.label(format!(
                    "Globe rotation {:.2} / scale {:.2} / idle {:.2}",
                    self.config.globe.rotation_factor,
                    self.config.globe.scale_factor,
                    self.config.globe.idle_factor
                ));

                ui.separator();
                ui.heading("Tracking");
                ui.label(format!("Detector: {:?}", self.config.detector.backend));
                ui.label(format!("Loop: {:.1} fps", overlay.metrics.avg_fps));
                ui.label(format!(
                    "Frame time: {:.1} ms",
                    overlay.metrics.avg_processing_time * 1000.0
                ));
                ui.add(
                    egui::ProgressBar::new(overlay.metrics.tracking_confidence)
                        .text("Confidence"),
                );

                ui.separator();
                ui.heading("Output");
                ui.label(self.output_directory.display().to_string());
                if ui.button("Browse...").clicked() {
                    if let Some(dir) = rfd::FileDialog::new()
                        .set_directory(&self.output_directory)
                        .pick_folder()
                    {
                        self.output_directory = dir;
                    }
                }
                save_requested = ui.button("Save config").clicked();
            });
        self.show_settings = open;
        if save_requested {
            self.save_config();
        }
    }
}

impl eframe::App for HoloApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt) as f64;
        let screen = ctx.screen_rect();
        let viewport = Viewport::new(screen.width() as f64, screen.height() as f64);

        let state = self.tracking.state();
        let snapshot = self.reader.snapshot();
        let overlay = self.tracking.overlay();

        self.hud.observe_system(&state);
        self.hud.observe_hands(&snapshot);

        let config = &self.config;
        let scene = self
            .scene
            .get_or_insert_with(|| Scene::new(config, viewport));
        scene.tick(&snapshot, dt, viewport, &mut self.hud);

        if let (Some(trace), Some(globe)) = (self.trace.as_mut(), scene.last_globe_frame()) {
            trace.add_sample(TraceSample {
                state: snapshot,
                transform: globe.transform,
                continent: globe.continent,
                panel: scene.panel_position(),
            });
        }

        self.ui_components.animate(dt as f32);
        self.ui_components
            .update_video(ctx, overlay.frame, overlay.image.as_deref());

        self.render_control_panel(ctx);
        if self.show_settings {
            self.render_settings_window(ctx, &overlay);
        }
        self.render_scene(ctx, &state, &overlay);

        ctx.request_repaint();
    }
}

impl Drop for HoloApp {
    fn drop(&mut self) {
        if self.trace.is_some() {
            self.export_trace();
        }
        self.tracking.shutdown();
    }
}
