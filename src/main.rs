// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay Editor
//!
//! A desktop editor for timeline-synchronized overlays: images, media,
//! text, buttons, shapes and hotspots shown over a video while it plays.
//!
//! Usage: `overlay-editor [RECORD.json]`

mod app;
mod ui;

use anyhow::Result;
use app::OverlayApp;
use overlay_editor::config::EditorConfig;
use std::path::PathBuf;

/// Record opened when none is given on the command line.
const DEFAULT_RECORD: &str = "overlay-items.json";

fn main() -> Result<()> {
    let loaded = EditorConfig::load_located();
    let config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => EditorConfig::default(),
    };

    // RUST_LOG still overrides the configured level
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();
    if let Some(Err(e)) = &loaded {
        log::warn!("{:#}; using default settings", e);
    }

    let record_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RECORD));
    let app = OverlayApp::new(record_path, config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Overlay Editor"),
        ..Default::default()
    };

    eframe::run_native("Overlay Editor", options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
