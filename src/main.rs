// Hide console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! Draftsmith - Main Entry Point
//!
//! An AI-assisted article authoring tool. Built with Rust and egui.

mod app;
mod config;
mod document;
mod editor;
mod error;
mod export;
mod generation;
mod markdown;
mod preview;
mod state;
mod storage;
mod streaming;
mod string_utils;

use app::{DraftsmithApp, APP_NAME};
use config::load_config;
use log::{debug, info};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting {}", APP_NAME);

    // Restore the previous window geometry before the first frame
    let window = load_config().window_size;
    debug!(
        "Opening {}x{} (maximized: {})",
        window.width, window.height, window.maximized
    );

    let viewport = eframe::egui::ViewportBuilder::default()
        .with_title(APP_NAME)
        .with_inner_size([window.width, window.height])
        .with_min_inner_size([640.0, 480.0])
        .with_maximized(window.maximized);

    eframe::run_native(
        APP_NAME,
        eframe::NativeOptions {
            viewport,
            ..Default::default()
        },
        Box::new(|cc| Ok(Box::new(DraftsmithApp::new(cc)))),
    )
}
