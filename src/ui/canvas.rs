// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay canvas: paints the laid-out scene over the video area and turns
//! pointer input into editor gestures.

use super::color32;
use overlay_editor::editor::ResizeHandle;
use overlay_editor::models::item::ItemId;
use overlay_editor::render::node::{Affordance, Icon, NodeContent, RenderNode, ShapeKind};
use overlay_editor::render::style::{Rgba, TextAlign};
use overlay_editor::render::{Hit, RenderMode, Scene};
use overlay_editor::util::geometry::Size;
use std::collections::HashMap;

/// Side length of a resize handle in points.
const HANDLE_SIZE: f32 = 8.0;

/// Extra reach around a handle that still grabs it.
const HANDLE_SLOP: f64 = 3.0;

/// Corner area of a dismissible node that closes it.
const DISMISS_SIZE: f64 = 18.0;

const DEFAULT_BUTTON: Rgba = Rgba::rgb(13, 110, 253);
const DEFAULT_HOTSPOT: Rgba = Rgba::new(13, 110, 253, 160);
const SELECTION: egui::Color32 = egui::Color32::from_rgb(255, 170, 0);

/// The pointer gesture the canvas is tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanvasGesture {
    #[default]
    None,
    Move,
    Resize,
}

/// Result of canvas interaction. Coordinates are canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasAction {
    /// The area available to the canvas changed
    Viewport(Size),
    Select { id: ItemId, toggle: bool },
    Deselect,
    BeginMove { id: ItemId, x: f64, y: f64 },
    BeginResize {
        id: ItemId,
        handle: ResizeHandle,
        x: f64,
        y: f64,
        keep_aspect: bool,
    },
    Move { x: f64, y: f64 },
    Resize { x: f64, y: f64 },
    EndMove { x: f64, y: f64 },
    EndResize { x: f64, y: f64 },
    /// A viewer clicked an interactive node during playback
    Activate { id: ItemId, x: f64, y: f64 },
    Dismiss(ItemId),
}

/// Display the canvas and handle mouse interactions.
pub fn show(
    ui: &mut egui::Ui,
    scene: &Scene,
    textures: &HashMap<ItemId, egui::TextureHandle>,
    gesture: &mut CanvasGesture,
) -> Vec<CanvasAction> {
    let mut actions = Vec::new();
    let available = ui.available_size();
    let (response, painter) = ui.allocate_painter(available, egui::Sense::click_and_drag());

    let viewport = Size::new(response.rect.width() as f64, response.rect.height() as f64);
    if viewport != scene.viewport {
        actions.push(CanvasAction::Viewport(viewport));
    }

    painter.rect_filled(response.rect, 0.0, egui::Color32::from_gray(20));
    let canvas_rect = egui::Rect::from_min_size(
        response.rect.min + egui::vec2(scene.canvas.left as f32, scene.canvas.top as f32),
        egui::vec2(scene.canvas.width as f32, scene.canvas.height as f32),
    );
    painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));
    if scene.nodes.is_empty() {
        painter.text(
            canvas_rect.center(),
            egui::Align2::CENTER_CENTER,
            "Add an item from the toolbar to begin",
            egui::FontId::proportional(14.0),
            egui::Color32::from_gray(150),
        );
    }

    let origin = canvas_rect.min;
    let painter = painter.with_clip_rect(canvas_rect);
    for node in scene.painted() {
        paint_node(&painter, node, origin, textures, scene.base_font);
    }

    if scene.mode == RenderMode::Edit {
        for node in scene.nodes.iter().filter(|n| n.active && n.visible) {
            paint_selection(&painter, node, origin);
        }
    }

    let pointer = response
        .interact_pointer_pos()
        .or_else(|| ui.input(|i| i.pointer.latest_pos()));
    let local = |pos: egui::Pos2| ((pos.x - origin.x) as f64, (pos.y - origin.y) as f64);
    let modifiers = ui.input(|i| i.modifiers);

    match scene.mode {
        RenderMode::Edit => {
            if response.drag_started() {
                if let Some((x, y)) = pointer.map(local) {
                    if let Some((id, handle)) = handle_at(scene, x, y) {
                        *gesture = CanvasGesture::Resize;
                        actions.push(CanvasAction::BeginResize {
                            id,
                            handle,
                            x,
                            y,
                            keep_aspect: modifiers.shift,
                        });
                    } else if let Some(id) = scene.hit_test(x, y) {
                        *gesture = CanvasGesture::Move;
                        actions.push(CanvasAction::BeginMove { id, x, y });
                    }
                }
            } else if response.dragged() {
                if let Some((x, y)) = pointer.map(local) {
                    match gesture {
                        CanvasGesture::Move => actions.push(CanvasAction::Move { x, y }),
                        CanvasGesture::Resize => actions.push(CanvasAction::Resize { x, y }),
                        CanvasGesture::None => {}
                    }
                }
            }

            if response.drag_stopped() {
                if let Some((x, y)) = pointer.map(local) {
                    match gesture {
                        CanvasGesture::Move => actions.push(CanvasAction::EndMove { x, y }),
                        CanvasGesture::Resize => actions.push(CanvasAction::EndResize { x, y }),
                        CanvasGesture::None => {}
                    }
                }
                *gesture = CanvasGesture::None;
            }

            if response.clicked() {
                if let Some((x, y)) = pointer.map(local) {
                    match scene.hit(x, y) {
                        Some(Hit::Item(id)) => actions.push(CanvasAction::Select {
                            id,
                            toggle: modifiers.shift || modifiers.command,
                        }),
                        Some(Hit::Scrim) => actions.push(CanvasAction::Deselect),
                        None => {}
                    }
                }
            }
        }
        RenderMode::Playback => {
            if response.clicked() {
                if let Some((x, y)) = pointer.map(local) {
                    if let Some(node) = scene.hit_test(x, y).and_then(|id| scene.node(id)) {
                        if in_dismiss_corner(node, x, y) {
                            actions.push(CanvasAction::Dismiss(node.id));
                        } else if node.is_interactive() {
                            actions.push(CanvasAction::Activate { id: node.id, x, y });
                        }
                    }
                }
            }
            if let Some((x, y)) = response.hover_pos().map(local) {
                let hovering = scene
                    .hit_test(x, y)
                    .and_then(|id| scene.node(id))
                    .is_some_and(|n| n.is_interactive());
                if hovering {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }
            }
        }
    }

    actions
}

fn screen_rect(node: &RenderNode, origin: egui::Pos2) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + egui::vec2(node.rect.left as f32, node.rect.top as f32),
        egui::vec2(node.rect.width as f32, node.rect.height as f32),
    )
}

fn paint_node(
    painter: &egui::Painter,
    node: &RenderNode,
    origin: egui::Pos2,
    textures: &HashMap<ItemId, egui::TextureHandle>,
    base_font: f64,
) {
    let rect = screen_rect(node, origin);
    let style = &node.style;
    let font_size = style.metrics.map(|m| m.font_size).unwrap_or(base_font);
    let radius = style.rounding.radius(font_size, node.rect.width, node.rect.height) as f32;
    let tint = |color: Rgba| color32(color.with_opacity(style.opacity));
    let text_color = tint(style.text_color.unwrap_or(Rgba::WHITE));
    let font = egui::FontId::proportional(font_size as f32);

    if style.shadow {
        painter.rect_filled(
            rect.translate(egui::vec2(2.0, 3.0)),
            radius,
            egui::Color32::from_black_alpha(70),
        );
    }

    match &node.content {
        NodeContent::Image { alt, .. } => match textures.get(&node.id) {
            Some(texture) => {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                let color = egui::Color32::WHITE.gamma_multiply(style.opacity as f32);
                painter.image(texture.id(), rect, uv, color);
            }
            None => {
                painter.rect_filled(rect, radius, egui::Color32::from_gray(70));
                let label = if alt.is_empty() { "Image" } else { alt.as_str() };
                painter.text(rect.center(), egui::Align2::CENTER_CENTER, label, font, text_color);
            }
        },
        NodeContent::Media { audio, muted, .. } => {
            painter.rect_filled(rect, radius, tint(Rgba::BLACK));
            let glyph = match (audio, muted) {
                (_, true) => "🔇",
                (true, false) => "♪",
                (false, false) => "▶",
            };
            let size = (rect.height().min(rect.width()) * 0.4).max(10.0);
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                glyph,
                egui::FontId::proportional(size),
                text_color,
            );
        }
        NodeContent::Button { icon, label } => {
            let fill = style.background.unwrap_or(DEFAULT_BUTTON);
            painter.rect_filled(rect, radius, tint(fill));
            let text = match icon {
                Some(Icon::Paperclip) if label.is_empty() => "📎".to_string(),
                Some(Icon::Paperclip) => format!("📎 {}", label),
                Some(Icon::Mute) => "🔇".to_string(),
                None => label.clone(),
            };
            painter.text(rect.center(), egui::Align2::CENTER_CENTER, text, font, text_color);
        }
        NodeContent::Text { lines } => {
            if let Some(background) = style.background {
                painter.rect_filled(rect, radius, tint(background));
            }
            paint_lines(painter, node, rect, lines, font_size, text_color);
        }
        NodeContent::Shape { shape } => {
            let fill = tint(style.background.unwrap_or(Rgba::TRANSPARENT));
            let radius = match shape {
                ShapeKind::Rectangle => radius,
                ShapeKind::Circle => rect.width().min(rect.height()) / 2.0,
            };
            painter.rect_filled(rect, radius, fill);
        }
        NodeContent::Hotspot { title, color } => {
            let fill = tint(color.unwrap_or(DEFAULT_HOTSPOT));
            let r = rect.width().min(rect.height()) / 2.0;
            painter.circle_filled(rect.center(), r, fill);
            painter.circle_stroke(rect.center(), r, egui::Stroke::new(2.0, egui::Color32::WHITE));
            if !title.is_empty() {
                painter.text(
                    egui::pos2(rect.center().x, rect.max.y + 2.0),
                    egui::Align2::CENTER_TOP,
                    title,
                    egui::FontId::proportional(12.0),
                    egui::Color32::WHITE,
                );
            }
        }
    }

    if let Some(border) = style.border {
        painter.rect_stroke(
            rect,
            radius,
            egui::Stroke::new(border.width as f32, tint(border.color)),
        );
    }

    if is_dismissible(node) {
        let corner = egui::pos2(rect.max.x - DISMISS_SIZE as f32 / 2.0, rect.min.y + DISMISS_SIZE as f32 / 2.0);
        painter.text(
            corner,
            egui::Align2::CENTER_CENTER,
            "✕",
            egui::FontId::proportional(12.0),
            text_color,
        );
    }
}

fn paint_lines(
    painter: &egui::Painter,
    node: &RenderNode,
    rect: egui::Rect,
    lines: &[String],
    font_size: f64,
    color: egui::Color32,
) {
    let (line_height, padding_x, padding_y) = match node.style.metrics {
        Some(m) => (m.line_height, m.padding_x, m.padding_y),
        None => (font_size * 1.2, 0.0, 0.0),
    };
    let font = egui::FontId::proportional(font_size as f32);
    let (anchor, x) = match node.style.align {
        TextAlign::Left => (egui::Align2::LEFT_TOP, rect.min.x + padding_x as f32),
        TextAlign::Center => (egui::Align2::CENTER_TOP, rect.center().x),
        TextAlign::Right => (egui::Align2::RIGHT_TOP, rect.max.x - padding_x as f32),
    };
    for (row, line) in lines.iter().enumerate() {
        let y = rect.min.y + (padding_y + row as f64 * line_height) as f32;
        if node.style.text_shadow {
            painter.text(
                egui::pos2(x + 1.0, y + 1.0),
                anchor,
                line,
                font.clone(),
                egui::Color32::from_black_alpha(160),
            );
        }
        let bounds = painter.text(egui::pos2(x, y), anchor, line, font.clone(), color);
        if node.style.underline {
            painter.hline(bounds.x_range(), bounds.max.y, egui::Stroke::new(1.0, color));
        }
    }
}

fn paint_selection(painter: &egui::Painter, node: &RenderNode, origin: egui::Pos2) {
    let rect = screen_rect(node, origin);
    painter.rect_stroke(rect.expand(1.0), 0.0, egui::Stroke::new(1.5, SELECTION));
    if !node.resizable {
        return;
    }
    for handle in ResizeHandle::ALL {
        let (ax, ay) = handle.anchor();
        let center = egui::pos2(
            rect.min.x + ax as f32 * rect.width(),
            rect.min.y + ay as f32 * rect.height(),
        );
        let square = egui::Rect::from_center_size(center, egui::vec2(HANDLE_SIZE, HANDLE_SIZE));
        painter.rect_filled(square, 1.0, egui::Color32::WHITE);
        painter.rect_stroke(square, 1.0, egui::Stroke::new(1.0, SELECTION));
    }
}

/// The resize handle of a selected node under `(x, y)`.
fn handle_at(scene: &Scene, x: f64, y: f64) -> Option<(ItemId, ResizeHandle)> {
    let reach = HANDLE_SIZE as f64 / 2.0 + HANDLE_SLOP;
    let mut selected: Vec<&RenderNode> = scene
        .nodes
        .iter()
        .filter(|n| n.active && n.visible && n.resizable)
        .collect();
    selected.sort_by(|a, b| b.z.cmp(&a.z));
    selected.into_iter().find_map(|node| {
        ResizeHandle::ALL.into_iter().find_map(|handle| {
            let (ax, ay) = handle.anchor();
            let cx = node.rect.left + ax * node.rect.width;
            let cy = node.rect.top + ay * node.rect.height;
            ((x - cx).abs() <= reach && (y - cy).abs() <= reach).then_some((node.id, handle))
        })
    })
}

fn in_dismiss_corner(node: &RenderNode, x: f64, y: f64) -> bool {
    is_dismissible(node) && x >= node.rect.right() - DISMISS_SIZE
        && y <= node.rect.top + DISMISS_SIZE
}

fn is_dismissible(node: &RenderNode) -> bool {
    node.affordances.iter().any(|a| matches!(a, Affordance::Dismiss))
}
