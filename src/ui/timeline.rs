// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Timeline strip below the canvas: one bar per item, a ruler to scrub
//! the playhead, and bar drags to shift or trim intervals.

use overlay_editor::editor::TrimEdge;
use overlay_editor::models::item::ItemId;
use overlay_editor::render::timeline::TimelineStrip;
use overlay_editor::util::time::format_time;

const RULER_HEIGHT: f32 = 22.0;
const ROW_HEIGHT: f32 = 20.0;
const ROW_GAP: f32 = 2.0;
/// Width of the grab zone at either end of a bar.
const EDGE_GRAB: f32 = 6.0;
const MIN_BAR_WIDTH: f32 = 4.0;
const MAX_VISIBLE_ROWS: usize = 8;

const BAR: egui::Color32 = egui::Color32::from_rgb(70, 90, 120);
const BAR_ACTIVE: egui::Color32 = egui::Color32::from_rgb(230, 150, 30);
const PLAYHEAD: egui::Color32 = egui::Color32::from_rgb(220, 60, 60);

/// Bar drag in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineDrag {
    /// Time under the pointer when the drag started
    origin: f64,
    edge: Option<TrimEdge>,
}

/// Result of timeline interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineAction {
    Seek(f64),
    Select { id: ItemId, toggle: bool },
    BeginDrag(ItemId),
    /// Shift the dragged bars by this much from where they started
    Shift(f64),
    Trim(TrimEdge, f64),
    EndDrag,
}

/// Display the timeline and handle mouse interactions.
pub fn show(
    ui: &mut egui::Ui,
    strip: &TimelineStrip,
    playhead: f64,
    drag: &mut Option<TimelineDrag>,
) -> Vec<TimelineAction> {
    let mut actions = Vec::new();
    let rows = strip.rows().clamp(1, MAX_VISIBLE_ROWS);
    let height = RULER_HEIGHT + rows as f32 * (ROW_HEIGHT + ROW_GAP);
    let width = ui.available_width();
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(28));

    let time_at = |x: f32| strip.time_at(((x - rect.min.x) / rect.width().max(1.0)) as f64);
    let x_at = |t: f64| {
        let duration = strip.duration();
        let fraction = if duration > 0.0 { (t - strip.start) / duration } else { 0.0 };
        rect.min.x + fraction.clamp(0.0, 1.0) as f32 * rect.width()
    };

    // Ruler
    let ruler = egui::Rect::from_min_size(rect.min, egui::vec2(width, RULER_HEIGHT));
    painter.rect_filled(ruler, 0.0, egui::Color32::from_gray(45));
    let ticks = 10;
    for i in 0..=ticks {
        let t = strip.start + strip.duration() * i as f64 / ticks as f64;
        let x = x_at(t);
        painter.vline(x, ruler.y_range(), egui::Stroke::new(1.0, egui::Color32::from_gray(80)));
        let anchor = if i == ticks { egui::Align2::RIGHT_TOP } else { egui::Align2::LEFT_TOP };
        painter.text(
            egui::pos2(x + 2.0, ruler.min.y + 3.0),
            anchor,
            format_time(t, true),
            egui::FontId::monospace(10.0),
            egui::Color32::from_gray(170),
        );
    }
    let ruler_response = ui.interact(ruler, ui.id().with("timeline_ruler"), egui::Sense::click_and_drag());
    if ruler_response.clicked() || ruler_response.dragged() {
        if let Some(pos) = ruler_response.interact_pointer_pos() {
            actions.push(TimelineAction::Seek(time_at(pos.x)));
        }
    }

    // Bars
    let modifiers = ui.input(|i| i.modifiers);
    for bar in strip.bars.iter().filter(|b| b.row < MAX_VISIBLE_ROWS) {
        let top = ruler.max.y + ROW_GAP + bar.row as f32 * (ROW_HEIGHT + ROW_GAP);
        let left = rect.min.x + (bar.left / 100.0) as f32 * rect.width();
        let bar_width = ((bar.width / 100.0) as f32 * rect.width()).max(MIN_BAR_WIDTH);
        let bar_rect = egui::Rect::from_min_size(egui::pos2(left, top), egui::vec2(bar_width, ROW_HEIGHT));

        let fill = if bar.active { BAR_ACTIVE } else { BAR };
        painter.rect_filled(bar_rect, 3.0, fill);
        painter.with_clip_rect(bar_rect.intersect(rect)).text(
            bar_rect.left_center() + egui::vec2(4.0, 0.0),
            egui::Align2::LEFT_CENTER,
            format!("{}: {}", bar.kind.label(), bar.label),
            egui::FontId::proportional(11.0),
            egui::Color32::WHITE,
        );

        let response = ui
            .interact(bar_rect, ui.id().with(("timeline_bar", bar.id.0)), egui::Sense::click_and_drag())
            .on_hover_text(format!(
                "{} - {}",
                format_time(bar.start, false),
                format_time(bar.end, false)
            ));

        let edge = response.hover_pos().and_then(|pos| {
            if pos.x <= bar_rect.min.x + EDGE_GRAB {
                Some(TrimEdge::Start)
            } else if pos.x >= bar_rect.max.x - EDGE_GRAB {
                Some(TrimEdge::End)
            } else {
                None
            }
        });
        if edge.is_some() || drag.is_some_and(|d| d.edge.is_some()) {
            ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
        }

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                *drag = Some(TimelineDrag {
                    origin: time_at(pos.x),
                    edge,
                });
                actions.push(TimelineAction::BeginDrag(bar.id));
            }
        } else if response.dragged() {
            if let (Some(pos), Some(current)) = (response.interact_pointer_pos(), *drag) {
                let t = time_at(pos.x);
                match current.edge {
                    Some(edge) => actions.push(TimelineAction::Trim(edge, t)),
                    None => actions.push(TimelineAction::Shift(t - current.origin)),
                }
            }
        }
        if response.drag_stopped() && drag.is_some() {
            *drag = None;
            actions.push(TimelineAction::EndDrag);
        }

        if response.double_clicked() {
            actions.push(TimelineAction::Seek(bar.start));
        } else if response.clicked() {
            actions.push(TimelineAction::Select {
                id: bar.id,
                toggle: modifiers.shift || modifiers.command,
            });
        }
    }

    // Playhead
    let x = x_at(playhead);
    painter.vline(x, rect.y_range(), egui::Stroke::new(2.0, PLAYHEAD));
    painter.text(
        egui::pos2(x + 3.0, rect.max.y - 2.0),
        egui::Align2::LEFT_BOTTOM,
        format_time(playhead, false),
        egui::FontId::monospace(10.0),
        PLAYHEAD,
    );

    actions
}
