// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar: item kinds to add, transport, mode switch and selection
//! commands.

use overlay_editor::editor::KeyCommand;
use overlay_editor::models::item::ItemKind;
use overlay_editor::render::RenderMode;

/// What the toolbar needs to know to enable its buttons.
#[derive(Debug, Clone, Copy)]
pub struct ToolbarState {
    pub mode: RenderMode,
    pub playing: bool,
    pub has_selection: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Result of toolbar interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolbarAction {
    None,
    Add(ItemKind),
    TogglePlay,
    SetMode(RenderMode),
    Command(KeyCommand),
    Group,
    Ungroup,
}

fn kind_icon(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Image => "🖼",
        ItemKind::Video => "🎬",
        ItemKind::Audio => "🔊",
        ItemKind::Text | ItemKind::TextBlock => "T",
        ItemKind::File => "📎",
        ItemKind::Navigation => "⏩",
        ItemKind::Shape => "⬛",
        ItemKind::Hotspot => "◉",
        ItemKind::Mute => "🔇",
    }
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, state: ToolbarState) -> ToolbarAction {
    let mut action = ToolbarAction::None;
    let editing = state.mode == RenderMode::Edit;

    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 6.0;

        let play_label = if state.playing { "⏸ Pause" } else { "▶ Play" };
        if ui.button(play_label).clicked() {
            action = ToolbarAction::TogglePlay;
        }
        if ui.selectable_label(editing, "✏ Edit").clicked() && !editing {
            action = ToolbarAction::SetMode(RenderMode::Edit);
        }
        if ui.selectable_label(!editing, "👁 Preview").clicked() && editing {
            action = ToolbarAction::SetMode(RenderMode::Playback);
        }

        ui.separator();

        ui.add_enabled_ui(editing, |ui| {
            ui.label("Add:");
            for kind in ItemKind::AUTHORABLE {
                let text = format!("{} {}", kind_icon(kind), kind.label());
                if ui.button(text).clicked() {
                    action = ToolbarAction::Add(kind);
                }
            }
        });

        ui.separator();

        ui.add_enabled_ui(editing, |ui| {
            if ui.add_enabled(state.can_undo, egui::Button::new("↶")).on_hover_text("Undo").clicked() {
                action = ToolbarAction::Command(KeyCommand::Undo);
            }
            if ui.add_enabled(state.can_redo, egui::Button::new("↷")).on_hover_text("Redo").clicked() {
                action = ToolbarAction::Command(KeyCommand::Redo);
            }

            ui.add_enabled_ui(state.has_selection, |ui| {
                if ui.button("⧉").on_hover_text("Duplicate").clicked() {
                    action = ToolbarAction::Command(KeyCommand::Duplicate);
                }
                if ui.button("🗑").on_hover_text("Delete").clicked() {
                    action = ToolbarAction::Command(KeyCommand::Delete);
                }
                if ui.button("⬆").on_hover_text("Bring forward").clicked() {
                    action = ToolbarAction::Command(KeyCommand::LayerUp);
                }
                if ui.button("⬇").on_hover_text("Send backward").clicked() {
                    action = ToolbarAction::Command(KeyCommand::LayerDown);
                }
                if ui.button("Group").clicked() {
                    action = ToolbarAction::Group;
                }
                if ui.button("Ungroup").clicked() {
                    action = ToolbarAction::Ungroup;
                }
            });
        });
    });

    action
}
