// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! `OverlayApp` wires the editing session, the renderer, the activation
//! scheduler and a simulated host player into one window. The session is
//! the single owner of the items; every frame the app feeds it input,
//! applies the [`Change`] it answers with, and keeps the scene and the
//! scheduler in step.

use crate::ui::{canvas, properties, timeline, toolbar};
use anyhow::Result;
use overlay_editor::config::EditorConfig;
use overlay_editor::editor::{Arrow, Change, CloseDecision, EditorSession, ItemForm, KeyCommand};
use overlay_editor::engine::{ActivationScheduler, HostPlayer, SimulatedPlayer};
use overlay_editor::io::media::{FileProbe, MediaEvent, MediaLoader, MediaMetadata};
use overlay_editor::io::persistence::{JsonFileBackend, PersistenceBackend};
use overlay_editor::io::serialization;
use overlay_editor::models::item::{ItemId, ItemKind};
use overlay_editor::render::node::Affordance;
use overlay_editor::render::{RenderMode, Renderer, Scene};
use overlay_editor::util::geometry::Size;
use overlay_editor::util::time::format_time;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const TOAST_SECS: u64 = 4;

/// Add/edit dialog in progress.
struct OpenForm {
    /// Item being edited; `None` while adding
    target: Option<ItemId>,
    form: ItemForm,
}

/// Popover or modal opened from a hotspot.
struct Popup {
    title: String,
    body: String,
    url: Option<String>,
    modal: bool,
}

struct Toast {
    text: String,
    error: bool,
    until: Instant,
}

/// Main application state.
pub struct OverlayApp {
    config: EditorConfig,
    record_path: PathBuf,
    backend: JsonFileBackend,
    session: EditorSession,
    renderer: Renderer,
    scene: Scene,
    scheduler: ActivationScheduler,
    player: SimulatedPlayer,
    loader: MediaLoader,
    /// Items whose media were already requested
    requested: HashSet<ItemId>,
    textures: HashMap<ItemId, egui::TextureHandle>,
    /// What the scene needs before the next paint
    pending: Change,
    viewport: Size,
    form: Option<OpenForm>,
    popup: Option<Popup>,
    toasts: Vec<Toast>,
    canvas_gesture: canvas::CanvasGesture,
    timeline_drag: Option<timeline::TimelineDrag>,
    confirm_close: bool,
    allow_close: bool,
    last_frame: Instant,
}

impl OverlayApp {
    /// Open the record at `record_path`. A missing file starts empty.
    pub fn new(record_path: PathBuf, config: EditorConfig) -> Result<Self> {
        let mut backend = JsonFileBackend::new(record_path.clone());
        let record = backend.load()?;
        let segment = record.segment.clone().unwrap_or_default();
        let session = EditorSession::load(&record, segment.clone(), config.clone())?;
        let loader = Self::loader_for(&record_path);

        let mut renderer = Renderer::new(RenderMode::Edit, &config);
        renderer.set_fullscreen_fit(config.playback.fullscreen_fit);
        let scheduler = ActivationScheduler::new(session.store(), &segment, config.playback.drift_threshold_secs);

        let mut app = Self {
            record_path,
            backend,
            session,
            renderer,
            scene: Scene::empty(RenderMode::Edit),
            scheduler,
            player: SimulatedPlayer::new(segment.start, segment.end),
            loader,
            requested: HashSet::new(),
            textures: HashMap::new(),
            pending: Change::Rebuild,
            viewport: Size::default(),
            form: None,
            popup: None,
            toasts: Vec::new(),
            canvas_gesture: canvas::CanvasGesture::None,
            timeline_drag: None,
            confirm_close: false,
            allow_close: false,
            last_frame: Instant::now(),
            config,
        };
        app.request_media(false);
        log::info!("Opened {}", app.record_path.display());
        Ok(app)
    }

    fn loader_for(record_path: &Path) -> MediaLoader {
        let base_dir = record_path.parent().map(Path::to_path_buf);
        MediaLoader::new(Arc::new(FileProbe::new(base_dir.clone())), base_dir)
    }

    fn toast(&mut self, text: impl Into<String>, error: bool) {
        let text = text.into();
        if error {
            log::warn!("{}", text);
        }
        self.toasts.push(Toast {
            text,
            error,
            until: Instant::now() + Duration::from_secs(TOAST_SECS),
        });
    }

    fn apply(&mut self, change: Change) {
        self.pending = self.pending.merge(change);
    }

    // Media

    /// Ask the loader for every image and media item not requested yet.
    fn request_media(&mut self, added: bool) {
        let items: Vec<(ItemId, ItemKind, String)> = self
            .session
            .store()
            .iter()
            .filter(|i| !self.requested.contains(&i.id))
            .map(|i| (i.id, i.kind, i.properties.url().to_string()))
            .collect();
        for (id, kind, url) in items {
            if url.is_empty() {
                continue;
            }
            match kind {
                ItemKind::Image => self.loader.request_image(id, &url),
                kind if kind.is_media() => self.loader.request_metadata(id, kind, &url, added),
                _ => continue,
            }
            self.requested.insert(id);
        }
    }

    /// Forget loaded media of an item so its new source is fetched.
    fn forget_media(&mut self, id: ItemId) {
        self.requested.remove(&id);
        self.textures.remove(&id);
    }

    fn poll_media(&mut self, ctx: &egui::Context) {
        for event in self.loader.poll() {
            match event {
                MediaEvent::Image { id, image } => {
                    let size = [image.width as usize, image.height as usize];
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
                    let texture = ctx.load_texture(format!("item-{}", id), color_image, egui::TextureOptions::LINEAR);
                    self.textures.insert(id, texture);
                    let metadata = MediaMetadata {
                        duration: None,
                        width: Some(image.width),
                        height: Some(image.height),
                    };
                    self.media_ready(id, &metadata, false);
                }
                MediaEvent::Metadata { id, metadata, added } => self.media_ready(id, &metadata, added),
                MediaEvent::Failed { id, reason } => {
                    log::warn!("Media of item {} unavailable: {}", id, reason);
                }
            }
        }
    }

    fn media_ready(&mut self, id: ItemId, metadata: &MediaMetadata, added: bool) {
        if let Some(aspect) = metadata.aspect() {
            if self.renderer.set_intrinsic_aspect(id, aspect) {
                self.apply(Change::Relayout);
            }
        }
        let change = self.session.apply_media_metadata(id, metadata, added);
        self.apply(change);
    }

    // Scene

    fn refresh_scene(&mut self) {
        if self.pending.is_none() || self.viewport.is_empty() {
            return;
        }
        let selection = self.session.selection().ids().to_vec();
        let aspect = self.player.aspect_ratio();
        match self.pending {
            Change::Rebuild => {
                self.scene = self.renderer.render(
                    self.session.store(),
                    self.session.segment(),
                    &selection,
                    self.viewport,
                    aspect,
                );
            }
            Change::Relayout => {
                self.renderer.relayout(
                    &mut self.scene,
                    self.session.store(),
                    self.session.segment(),
                    &selection,
                    self.viewport,
                    aspect,
                );
            }
            Change::None => {}
        }
        self.pending = Change::None;
        self.session.sync_layout(&self.scene);
        self.scheduler.reload(self.session.store(), self.session.segment(), &mut self.scene);
        let now = self.player.current_time();
        self.scheduler.tick(now, &mut self.player, &mut self.scene);
    }

    fn set_mode(&mut self, mode: RenderMode) {
        if self.renderer.mode() == mode {
            return;
        }
        self.session.flush_pending();
        if mode == RenderMode::Playback {
            self.form = None;
            let change = self.session.click_background();
            self.apply(change);
        } else {
            self.popup = None;
        }
        self.renderer.set_mode(mode);
        self.apply(Change::Rebuild);
        log::info!("Switched to {:?} mode", mode);
    }

    fn toggle_play(&mut self) {
        if self.player.is_paused() {
            self.player.play();
        } else {
            self.player.pause();
        }
    }

    /// Feed queued player events to the scheduler.
    fn drain_player(&mut self) {
        for event in self.player.drain_events() {
            let Some(report) = self.scheduler.handle(event, &mut self.player, &mut self.scene) else {
                continue;
            };
            if report.is_empty() {
                continue;
            }
            log::debug!("Shown {:?}, hidden {:?}", report.shown, report.hidden);
            if self.scene.mode == RenderMode::Playback {
                for id in &report.shown {
                    let popup = self.scene.node(*id).and_then(|node| {
                        node.affordances.iter().find_map(|a| match a {
                            Affordance::Popover {
                                title,
                                body,
                                url,
                                open_by_default: true,
                            } => Some(Popup {
                                title: title.clone(),
                                body: body.clone(),
                                url: url.clone(),
                                modal: false,
                            }),
                            _ => None,
                        })
                    });
                    if popup.is_some() {
                        self.popup = popup;
                    }
                }
            }
        }
        self.session.set_playhead(self.player.current_time());
    }

    fn seek(&mut self, time: f64) {
        self.player.seek(time);
        self.session.set_playhead(self.player.current_time());
    }

    // Editing

    fn run_command(&mut self, command: KeyCommand) {
        let change = self.session.handle_key(command, Instant::now());
        self.apply(change);
        if let Some(time) = self.session.take_seek_request() {
            self.seek(time);
        }
    }

    fn open_add_form(&mut self, kind: ItemKind) {
        let form = ItemForm::for_new(
            kind,
            self.session.playhead(),
            self.config.editor.default_item_duration,
            self.session.segment(),
        );
        self.form = Some(OpenForm { target: None, form });
    }

    fn open_edit_form(&mut self, id: ItemId) {
        if let Some(item) = self.session.store().get(id) {
            self.form = Some(OpenForm {
                target: Some(id),
                form: ItemForm::for_item(item),
            });
        }
    }

    fn apply_form(&mut self) {
        let segment = self.session.segment().clone();
        let Some(open) = self.form.as_mut() else {
            return;
        };
        let properties = match open.form.to_properties(&segment) {
            Ok(properties) => properties,
            Err(e) => {
                self.toast(e.to_string(), true);
                return;
            }
        };
        let (kind, target) = (open.form.kind, open.target);

        match target {
            None => match self.session.add_item(kind, properties) {
                Ok(id) => {
                    self.form = None;
                    self.apply(Change::Rebuild);
                    self.request_media(true);
                    log::debug!("Requested media of new item {}", id);
                }
                Err(e) => self.toast(e.to_string(), true),
            },
            Some(id) => {
                let old_url = self
                    .session
                    .store()
                    .get(id)
                    .map(|i| i.properties.url().to_string());
                match self.session.edit_item(id, properties) {
                    Ok(change) => {
                        self.form = None;
                        self.apply(change.merge(Change::Rebuild));
                        let new_url = self.session.store().get(id).map(|i| i.properties.url().to_string());
                        if old_url != new_url {
                            self.forget_media(id);
                            self.request_media(false);
                        }
                    }
                    Err(e) => self.toast(e.to_string(), true),
                }
            }
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::S)) {
            self.save();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.toggle_play();
        }
        if self.renderer.mode() != RenderMode::Edit {
            return;
        }

        let commands = ctx.input(|i| {
            let command = i.modifiers.command;
            let mut out = Vec::new();
            if i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace) {
                out.push(KeyCommand::Delete);
            }
            if i.key_pressed(egui::Key::Escape) {
                out.push(KeyCommand::Deselect);
            }
            if command && i.key_pressed(egui::Key::D) {
                out.push(KeyCommand::Duplicate);
            }
            if command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift {
                out.push(KeyCommand::Undo);
            }
            if command && ((i.modifiers.shift && i.key_pressed(egui::Key::Z)) || i.key_pressed(egui::Key::Y)) {
                out.push(KeyCommand::Redo);
            }
            for (key, arrow) in [
                (egui::Key::ArrowLeft, Arrow::Left),
                (egui::Key::ArrowRight, Arrow::Right),
                (egui::Key::ArrowUp, Arrow::Up),
                (egui::Key::ArrowDown, Arrow::Down),
            ] {
                if !i.key_pressed(key) {
                    continue;
                }
                match (command, arrow) {
                    (true, Arrow::Up) => out.push(KeyCommand::LayerUp),
                    (true, Arrow::Down) => out.push(KeyCommand::LayerDown),
                    (true, _) => {}
                    (false, arrow) => out.push(KeyCommand::Nudge(arrow)),
                }
            }
            out
        });
        for command in commands {
            self.run_command(command);
        }
    }

    fn handle_canvas(&mut self, actions: Vec<canvas::CanvasAction>) {
        use canvas::CanvasAction;
        for action in actions {
            let change = match action {
                CanvasAction::Viewport(size) => {
                    if self.viewport.is_empty() {
                        self.viewport = size;
                        self.apply(Change::Rebuild);
                    } else {
                        self.renderer.request_resize(Instant::now(), size);
                    }
                    Change::None
                }
                CanvasAction::Select { id, toggle } => self.session.click_item(id, toggle),
                CanvasAction::Deselect => self.session.click_background(),
                CanvasAction::BeginMove { id, x, y } => self.session.begin_drag(id, x, y),
                CanvasAction::Move { x, y } => self.session.drag_to(x, y),
                CanvasAction::EndMove { x, y } => self.session.end_drag(x, y),
                CanvasAction::BeginResize {
                    id,
                    handle,
                    x,
                    y,
                    keep_aspect,
                } => self.session.begin_resize(id, handle, x, y, keep_aspect),
                CanvasAction::Resize { x, y } => self.session.resize_to(x, y),
                CanvasAction::EndResize { x, y } => self.session.end_resize(x, y),
                CanvasAction::Activate { id, .. } => {
                    self.activate(id);
                    Change::None
                }
                CanvasAction::Dismiss(id) => {
                    self.scene.dismiss(id);
                    Change::None
                }
            };
            self.apply(change);
        }
    }

    /// Run the playback affordance of a clicked node.
    fn activate(&mut self, id: ItemId) {
        let Some(node) = self.scene.node(id) else {
            return;
        };
        if let Some(time) = node.seek_target() {
            log::info!("Item {} seeks to {}", id, format_time(time, false));
            self.seek(time);
            return;
        }
        let popup = node.affordances.iter().find_map(|a| match a {
            Affordance::Popover { title, body, url, .. } => Some(Popup {
                title: title.clone(),
                body: body.clone(),
                url: url.clone(),
                modal: false,
            }),
            Affordance::Modal { title, body, url } => Some(Popup {
                title: title.clone(),
                body: body.clone(),
                url: url.clone(),
                modal: true,
            }),
            _ => None,
        });
        if popup.is_some() {
            self.popup = popup;
            return;
        }
        if let Some(link) = node.link().map(str::to_string) {
            log::info!("Item {} links to {}", id, link);
            self.toast(format!("Link: {}", link), false);
        }
    }

    fn handle_timeline(&mut self, actions: Vec<timeline::TimelineAction>) {
        use timeline::TimelineAction;
        for action in actions {
            let change = match action {
                TimelineAction::Seek(time) => {
                    self.seek(time);
                    Change::None
                }
                TimelineAction::Select { id, toggle } => self.session.click_item(id, toggle),
                TimelineAction::BeginDrag(id) => self.session.begin_timeline(id),
                TimelineAction::Shift(delta) => self.session.timeline_shift(delta),
                TimelineAction::Trim(edge, time) => self.session.timeline_trim(edge, time),
                TimelineAction::EndDrag => self.session.end_timeline(),
            };
            self.apply(change);
        }
    }

    fn handle_toolbar(&mut self, action: toolbar::ToolbarAction) {
        use toolbar::ToolbarAction;
        match action {
            ToolbarAction::None => {}
            ToolbarAction::Add(kind) => self.open_add_form(kind),
            ToolbarAction::TogglePlay => self.toggle_play(),
            ToolbarAction::SetMode(mode) => self.set_mode(mode),
            ToolbarAction::Command(command) => self.run_command(command),
            ToolbarAction::Group => {
                let change = self.session.group_selection();
                self.apply(change);
            }
            ToolbarAction::Ungroup => {
                let change = self.session.ungroup_selection();
                self.apply(change);
            }
        }
    }

    // Files

    fn save(&mut self) {
        match self.session.save(&mut self.backend, Some(&self.scene)) {
            Ok(_) => {
                let count = self.session.store().len();
                self.toast(format!("Saved {} items", count), false);
            }
            Err(e) => self.toast(format!("Failed to save: {:#}", e), true),
        }
    }

    fn open_record(&mut self, path: PathBuf) {
        if self.session.request_close() == CloseDecision::Confirm {
            self.toast("Save or discard the current changes first", true);
            return;
        }
        match Self::new(path, self.config.clone()) {
            Ok(app) => *self = app,
            Err(e) => self.toast(format!("Failed to open record: {:#}", e), true),
        }
    }

    fn export_items(&mut self, path: PathBuf) {
        match serialization::export(self.session.store(), &path) {
            Ok(()) => self.toast(format!("Exported items to {}", path.display()), false),
            Err(e) => self.toast(format!("Failed to export items: {:#}", e), true),
        }
    }

    fn import_items(&mut self, path: PathBuf) {
        match serialization::import(&path) {
            Ok(store) => {
                let count = store.len();
                let change = self.session.replace_items(store);
                self.apply(change);
                self.requested.clear();
                self.textures.clear();
                self.request_media(false);
                self.toast(format!("Imported {} items from {}", count, path.display()), false);
            }
            Err(e) => self.toast(format!("Failed to import items: {:#}", e), true),
        }
    }

    // Windows

    fn show_menu(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Record...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Records", &["json"])
                            .pick_file()
                        {
                            self.open_record(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Save (Ctrl+S)").clicked() {
                        self.save();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Import Items...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Items", &["yaml", "yml", "json"])
                            .pick_file()
                        {
                            self.import_items(path);
                        }
                        ui.close_menu();
                    }
                    ui.menu_button("Export Items", |ui| {
                        if ui.button("Export as YAML...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("YAML", &["yaml", "yml"])
                                .set_file_name("items.yaml")
                                .save_file()
                            {
                                self.export_items(path);
                            }
                            ui.close_menu();
                        }
                        if ui.button("Export as JSON...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("JSON", &["json"])
                                .set_file_name("items.json")
                                .save_file()
                            {
                                self.export_items(path);
                            }
                            ui.close_menu();
                        }
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let editing = self.renderer.mode() == RenderMode::Edit;
                    let can_undo = editing && self.session.history().can_undo();
                    if ui.add_enabled(can_undo, egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                        self.run_command(KeyCommand::Undo);
                        ui.close_menu();
                    }
                    let can_redo = editing && self.session.history().can_redo();
                    if ui.add_enabled(can_redo, egui::Button::new("Redo (Ctrl+Shift+Z)")).clicked() {
                        self.run_command(KeyCommand::Redo);
                        ui.close_menu();
                    }
                    ui.separator();
                    let has_selection = editing && !self.session.selection().is_empty();
                    if ui.add_enabled(has_selection, egui::Button::new("Duplicate (Ctrl+D)")).clicked() {
                        self.run_command(KeyCommand::Duplicate);
                        ui.close_menu();
                    }
                    if ui.add_enabled(has_selection, egui::Button::new("Delete Selected")).clicked() {
                        self.run_command(KeyCommand::Delete);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.add_enabled(self.session.is_dirty(), egui::Button::new("Discard Changes")).clicked() {
                        let change = self.session.discard_changes();
                        self.apply(change);
                        ui.close_menu();
                    }
                });

                ui.menu_button("View", |ui| {
                    for rate in [0.5, 1.0, 1.5, 2.0] {
                        let label = format!("Speed {}x", rate);
                        if ui.radio(self.player.playback_rate() == rate, label).clicked() {
                            self.player.set_rate(rate);
                            ui.close_menu();
                        }
                    }
                });
            });
        });
    }

    fn show_popup(&mut self, ctx: &egui::Context) {
        let Some(popup) = &self.popup else {
            return;
        };
        let mut open = true;
        let mut window = egui::Window::new(popup.title.as_str())
            .open(&mut open)
            .collapsible(false)
            .resizable(false);
        if popup.modal {
            window = window.anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0]);
        }
        window.show(ctx, |ui| {
            ui.label(popup.body.as_str());
            if let Some(url) = &popup.url {
                ui.hyperlink(url);
            }
        });
        if !open {
            self.popup = None;
        }
    }

    fn show_close_guard(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.viewport().close_requested())
            && !self.allow_close
            && self.session.request_close() == CloseDecision::Confirm
        {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.confirm_close = true;
        }
        if !self.confirm_close {
            return;
        }

        egui::Window::new("Unsaved changes")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("There are unsaved changes. Save them before closing?");
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        self.save();
                        if !self.session.is_dirty() {
                            self.allow_close = true;
                            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                        self.confirm_close = false;
                    }
                    if ui.button("Discard").clicked() {
                        self.session.discard_changes();
                        self.allow_close = true;
                        self.confirm_close = false;
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                    if ui.button("Cancel").clicked() {
                        self.confirm_close = false;
                    }
                });
            });
    }

    fn show_toasts(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        self.toasts.retain(|t| t.until > now);
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -36.0])
            .show(ctx, |ui| {
                for toast in &self.toasts {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        let color = if toast.error {
                            egui::Color32::from_rgb(230, 90, 90)
                        } else {
                            egui::Color32::from_gray(220)
                        };
                        ui.label(egui::RichText::new(toast.text.as_str()).color(color));
                    });
                }
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f64();
        self.last_frame = now;

        // Clock, media and debounced work
        self.player.advance(dt);
        self.scene.advance_media(dt);
        self.drain_player();
        self.poll_media(ctx);
        if self.session.poll_pending(now) {
            log::debug!("Duplicate settled");
        }
        if let Some(size) = self.renderer.poll_resize(now) {
            self.viewport = size;
            self.apply(Change::Relayout);
        }
        self.refresh_scene();

        self.show_menu(ctx);

        let state = toolbar::ToolbarState {
            mode: self.renderer.mode(),
            playing: !self.player.is_paused(),
            has_selection: !self.session.selection().is_empty(),
            can_undo: self.session.history().can_undo(),
            can_redo: self.session.history().can_redo(),
        };
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, state))
            .inner;
        self.handle_toolbar(toolbar_action);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{} items", self.session.store().len()));
                ui.separator();
                ui.label(format!(
                    "{} / {}",
                    format_time(self.player.current_time(), false),
                    format_time(self.session.segment().end, false)
                ));
                if self.scheduler.muted_by_overlay() {
                    ui.separator();
                    ui.label("Muted by overlay");
                }
                if self.session.is_dirty() {
                    ui.separator();
                    ui.label(egui::RichText::new("Unsaved changes").italics());
                }
            });
        });

        if self.renderer.mode() == RenderMode::Edit {
            let playhead = self.player.current_time();
            let timeline_actions = egui::TopBottomPanel::bottom("timeline")
                .resizable(false)
                .show(ctx, |ui| {
                    timeline::show(ui, &self.scene.timeline, playhead, &mut self.timeline_drag)
                })
                .inner;
            self.handle_timeline(timeline_actions);

            let properties_action = egui::SidePanel::right("properties")
                .default_width(280.0)
                .show(ctx, |ui| {
                    let form = self.form.as_mut().map(|open| (&mut open.form, open.target));
                    properties::show(ui, &self.session, form)
                })
                .inner;
            match properties_action {
                properties::PropertiesAction::None => {}
                properties::PropertiesAction::Edit(id) => self.open_edit_form(id),
                properties::PropertiesAction::Select(id) => {
                    let change = self.session.click_item(id, false);
                    self.apply(change);
                }
                properties::PropertiesAction::Apply => self.apply_form(),
                properties::PropertiesAction::Cancel => self.form = None,
            }
        }

        let canvas_actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                canvas::show(ui, &self.scene, &self.textures, &mut self.canvas_gesture)
            })
            .inner;
        self.handle_canvas(canvas_actions);

        self.handle_keyboard(ctx);
        self.show_popup(ctx);
        self.show_toasts(ctx);
        self.show_close_guard(ctx);

        if !self.pending.is_none() {
            ctx.request_repaint();
        }
        if !self.player.is_paused() || self.session.is_gesture_active() {
            ctx.request_repaint();
        }
        let due = [self.renderer.resize_due(), self.session.pending_due()]
            .into_iter()
            .flatten()
            .min();
        if let Some(due) = due {
            ctx.request_repaint_after(due.saturating_duration_since(Instant::now()));
        }
    }
}
