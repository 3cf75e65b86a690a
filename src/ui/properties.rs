// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Side panel: the add/edit form, the placement readout of the selected
//! item and the item list.

use overlay_editor::editor::{EditorSession, FieldInput, ItemForm};
use overlay_editor::models::item::ItemId;
use overlay_editor::render::style::parse_color;
use overlay_editor::render::timeline::item_label;
use overlay_editor::util::time::format_time;

/// Result of properties panel interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertiesAction {
    None,
    /// Open the form for an existing item
    Edit(ItemId),
    Select(ItemId),
    Apply,
    Cancel,
}

/// Display the form when one is open, the selection readout otherwise.
pub fn show(
    ui: &mut egui::Ui,
    session: &EditorSession,
    form: Option<(&mut ItemForm, Option<ItemId>)>,
) -> PropertiesAction {
    match form {
        Some((form, target)) => show_form(ui, form, target),
        None => show_selection(ui, session),
    }
}

fn show_form(ui: &mut egui::Ui, form: &mut ItemForm, target: Option<ItemId>) -> PropertiesAction {
    let mut action = PropertiesAction::None;
    let title = match target {
        Some(id) => format!("Edit {} ({})", form.kind.label(), id),
        None => format!("Add {}", form.kind.label()),
    };
    ui.heading(title);
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui| {
        egui::Grid::new("item_form")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("Start");
                ui.text_edit_singleline(&mut form.start.text)
                    .on_hover_text("HH:MM:SS");
                ui.end_row();

                ui.label("End");
                ui.text_edit_singleline(&mut form.end.text)
                    .on_hover_text("HH:MM:SS");
                ui.end_row();

                for spec in form.fields() {
                    ui.label(spec.label);
                    match spec.input {
                        FieldInput::Timestamp => {
                            ui.text_edit_singleline(&mut form.timestamp.text)
                                .on_hover_text("HH:MM:SS, empty for none");
                        }
                        FieldInput::Multiline => {
                            let value = form.values.entry(spec.key).or_default();
                            ui.text_edit_multiline(value);
                        }
                        FieldInput::Flag => {
                            let value = form.values.entry(spec.key).or_default();
                            let mut checked = value == "1";
                            if ui.checkbox(&mut checked, "").changed() {
                                *value = if checked { "1" } else { "0" }.to_string();
                            }
                        }
                        FieldInput::Color => {
                            let value = form.values.entry(spec.key).or_default();
                            ui.horizontal(|ui| {
                                let swatch = parse_color(value)
                                    .map(super::color32)
                                    .unwrap_or(egui::Color32::TRANSPARENT);
                                let (rect, _) = ui.allocate_exact_size(
                                    egui::vec2(16.0, 16.0),
                                    egui::Sense::hover(),
                                );
                                ui.painter().rect_filled(rect, 2.0, swatch);
                                ui.text_edit_singleline(value);
                            });
                        }
                        FieldInput::Choice(options) => {
                            let value = form.values.entry(spec.key).or_default();
                            egui::ComboBox::from_id_source(spec.key)
                                .selected_text(value.as_str())
                                .show_ui(ui, |ui| {
                                    for option in options {
                                        ui.selectable_value(value, option.to_string(), *option);
                                    }
                                });
                        }
                        FieldInput::Text | FieldInput::Url | FieldInput::Number => {
                            let value = form.values.entry(spec.key).or_default();
                            ui.text_edit_singleline(value);
                        }
                    }
                    ui.end_row();
                }
            });
    });

    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Apply").clicked() {
            action = PropertiesAction::Apply;
        }
        if ui.button("Cancel").clicked() {
            action = PropertiesAction::Cancel;
        }
    });
    action
}

fn show_selection(ui: &mut egui::Ui, session: &EditorSession) -> PropertiesAction {
    let mut action = PropertiesAction::None;
    ui.heading("Properties");
    ui.separator();

    let selection = session.selection();
    match selection.primary() {
        Some(id) => {
            if selection.len() > 1 {
                ui.label(format!("{} items selected", selection.len()));
            }
            if let Some(info) = session.position_info(id) {
                egui::Grid::new("position_info").num_columns(2).show(ui, |ui| {
                    ui.label("X");
                    ui.label(format!("{:.0} px", info.x));
                    ui.end_row();
                    ui.label("Y");
                    ui.label(format!("{:.0} px", info.y));
                    ui.end_row();
                    ui.label("Width");
                    ui.label(format!("{:.0} px", info.width));
                    ui.end_row();
                    ui.label("Height");
                    ui.label(format!("{:.0} px", info.height));
                    ui.end_row();
                    ui.label("Layer");
                    ui.label(info.z.to_string());
                    ui.end_row();
                    ui.label("Shown");
                    ui.label(format!("{} - {}", format_time(info.start, false), format_time(info.end, false)));
                    ui.end_row();
                });
            }
            if ui.button("Edit properties...").clicked() {
                action = PropertiesAction::Edit(id);
            }
        }
        None => {
            ui.label(egui::RichText::new("Nothing selected").italics().weak());
        }
    }

    ui.add_space(12.0);
    ui.heading("Items");
    ui.separator();
    egui::ScrollArea::vertical().id_source("item_list").show(ui, |ui| {
        for item in session.store().sorted_by_layer().into_iter().rev() {
            let mut text = format!("{} {}", item.kind.label(), item_label(item));
            if item.kind.is_deprecated() {
                text.push_str(" (legacy)");
            }
            let response = ui.selectable_label(selection.contains(item.id), text);
            if response.clicked() {
                action = PropertiesAction::Select(item.id);
            }
            if response.double_clicked() {
                action = PropertiesAction::Edit(item.id);
            }
        }
    });
    action
}
