pub mod app;
pub mod config;
pub mod data;
pub mod globe;
pub mod hud;
pub mod interaction;
pub mod landmarks;
pub mod panel;
pub mod presentation;
pub mod smoothing;
pub mod tracking;
pub mod ui;
pub mod video;
pub mod worker;
