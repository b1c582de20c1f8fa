// src/main.rs
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use holo_globe::app::HoloApp;
use holo_globe::config::{Config, DetectorBackend};
use holo_globe::interaction::InteractionStore;
use holo_globe::video;
use holo_globe::worker::TrackingHandle;

#[derive(Parser, Debug)]
#[command(name = "holo_globe", about = "Hand-driven holographic globe")]
struct Cli {
    /// Config file (defaults to the per-user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Drive the scene with two synthetic hands instead of the camera
    #[arg(long, conflicts_with = "replay")]
    simulate: bool,

    /// Replay a JSON-lines detection recording
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Record every frame's detections to a JSON-lines file
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,

    /// Camera index
    #[arg(long)]
    camera: Option<u32>,

    /// List cameras and exit
    #[arg(long)]
    list_cameras: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(index) = self.camera {
            config.camera.index = index;
        }
        if self.simulate {
            config.detector.backend = DetectorBackend::Simulated;
        }
        if let Some(path) = &self.replay {
            config.detector.backend = DetectorBackend::Replay;
            config.detector.replay_path = Some(path.clone());
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "holo_globe=info".into()),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.list_cameras {
        let cameras = video::list_cameras()?;
        println!("Found {} camera(s):", cameras.len());
        for camera in cameras {
            println!("  {}", camera);
        }
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    cli.apply(&mut config);
    config.validate()?;
    info!(
        "starting with {:?} detector, camera {}",
        config.detector.backend, config.camera.index
    );

    let (store, reader) = InteractionStore::new();
    let tracking = TrackingHandle::spawn(config.clone(), store, cli.record.clone())?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([960.0, 600.0]),
        centered: true,
        ..Default::default()
    };

    let config_path = cli.config.clone();
    eframe::run_native(
        "Holo Globe",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(create_visuals());
            Box::new(HoloApp::new(cc, config, config_path, tracking, reader))
        }),
    )
    .map_err(|e| anyhow::anyhow!("failed to run window: {}", e))?;

    Ok(())
}

fn create_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();

    let cyan = egui::Color32::from_rgb(0, 255, 255);
    visuals.panel_fill = egui::Color32::TRANSPARENT;
    visuals.window_fill = egui::Color32::from_rgba_unmultiplied(4, 24, 32, 235);
    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(8, 30, 38);
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(10, 45, 56);
    visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(14, 70, 86);
    visuals.widgets.active.bg_fill = cyan.gamma_multiply(0.6);
    visuals.selection.bg_fill = cyan.gamma_multiply(0.4);
    visuals.override_text_color = Some(egui::Color32::from_rgb(165, 243, 252));

    visuals.widgets.noninteractive.rounding = egui::Rounding::same(2.0);
    visuals.widgets.inactive.rounding = egui::Rounding::same(2.0);
    visuals.widgets.hovered.rounding = egui::Rounding::same(2.0);
    visuals.widgets.active.rounding = egui::Rounding::same(2.0);
    visuals.window_rounding = egui::Rounding::same(4.0);

    visuals
}
