// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the overlay editor.

pub mod canvas;
pub mod properties;
pub mod timeline;
pub mod toolbar;

use overlay_editor::render::style::Rgba;

/// Convert a resolved style color for the painter.
pub fn color32(color: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}
