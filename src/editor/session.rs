// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing session state.
//!
//! `EditorSession` owns the item store and everything an authoring session
//! mutates: selection, gestures, history and the unsaved-changes flag. The
//! view only reads from it and feeds it pointer and keyboard input; each
//! operation answers with the [`Change`] the view has to apply.

use super::defaults::{place_new_item, place_video};
use super::selection::Selection;
use super::{Arrow, Change, CloseDecision, KeyCommand, ResizeHandle, TrimEdge};
use crate::config::EditorConfig;
use crate::error::{OverlayError, Result};
use crate::io::media::MediaMetadata;
use crate::io::persistence::{unescape_markup, PersistedRecord, PersistenceBackend, SavePayload};
use crate::models::history::{History, TrackingSnapshot};
use crate::models::item::{AnnotationItem, IdGenerator, Interval, ItemId, ItemKind, Properties};
use crate::models::segment::Segment;
use crate::models::store::{ItemStore, LayerDirection, PropertyPatch};
use crate::render::scene::Scene;
use crate::util::debounce::Debouncer;
use crate::util::geometry::{PixelRect, Size, Sizing};
use crate::util::time::round_to_two;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::time::Instant;

/// Smallest width or height a resize can produce.
const MIN_SIZE_PX: f64 = 1.0;

#[derive(Debug, Clone)]
enum Gesture {
    Idle,
    Drag {
        origin: (f64, f64),
        start: Vec<(ItemId, PixelRect)>,
        moved: bool,
    },
    Resize {
        handle: ResizeHandle,
        keep_aspect: bool,
        origin: (f64, f64),
        start: Vec<(ItemId, PixelRect, Sizing)>,
        moved: bool,
    },
    Timeline {
        start: Vec<(ItemId, f64, f64)>,
        moved: bool,
    },
}

/// Readout of an item's placement, in canvas pixels and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionInfo {
    pub x: f64,
    pub y: f64,
    /// Layer relative to the baseline
    pub z: i32,
    pub width: f64,
    pub height: f64,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug)]
pub struct EditorSession {
    store: ItemStore,
    history: History,
    selection: Selection,
    segment: Segment,
    canvas: Size,
    /// Pixel rectangles as last laid out
    layout: HashMap<ItemId, PixelRect>,
    media_aspects: HashMap<ItemId, f64>,
    dirty: bool,
    gesture: Gesture,
    id_gen: IdGenerator,
    config: EditorConfig,
    rng: StdRng,
    playhead: f64,
    pending_duplicate: Debouncer<()>,
    seek_request: Option<f64>,
    draft_file_area_id: Option<u64>,
}

impl EditorSession {
    /// Open a session on a stored record.
    ///
    /// A malformed item list opens as an empty session.
    pub fn load(record: &PersistedRecord, segment: Segment, config: EditorConfig) -> Result<Self> {
        let store = ItemStore::from_json(&unescape_markup(&record.items_json));
        info!("Loaded {} items", store.len());
        Self::with_store(store, segment, config, record.draft_file_area_id)
    }

    pub fn with_store(
        store: ItemStore,
        segment: Segment,
        config: EditorConfig,
        draft_file_area_id: Option<u64>,
    ) -> Result<Self> {
        let mut id_gen = IdGenerator::new();
        for item in store.iter() {
            id_gen.observe(item.id.0);
            if let Some(group) = item.group() {
                id_gen.observe(group.0);
            }
        }
        let base = TrackingSnapshot::capture(&store, &[], segment.start)?;
        Ok(Self {
            store,
            history: History::new(base),
            selection: Selection::new(),
            playhead: segment.start,
            segment,
            canvas: Size::default(),
            layout: HashMap::new(),
            media_aspects: HashMap::new(),
            dirty: false,
            gesture: Gesture::Idle,
            id_gen,
            pending_duplicate: Debouncer::from_millis(config.editor.duplicate_settle_ms),
            config,
            rng: StdRng::from_entropy(),
            seek_request: None,
            draft_file_area_id,
        })
    }

    /// Make placement jitter and group remapping reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn set_canvas(&mut self, canvas: Size) {
        if canvas != self.canvas {
            self.canvas = canvas;
            self.layout.clear();
        }
    }

    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    pub fn set_playhead(&mut self, time: f64) {
        self.playhead = time;
    }

    pub fn draft_file_area_id(&self) -> Option<u64> {
        self.draft_file_area_id
    }

    pub fn is_gesture_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Time the host player should seek to after an undo or redo.
    pub fn take_seek_request(&mut self) -> Option<f64> {
        self.seek_request.take()
    }

    /// Adopt the pixel layout the renderer computed.
    pub fn sync_layout(&mut self, scene: &Scene) {
        self.canvas = scene.canvas_size();
        self.layout = scene.nodes.iter().map(|n| (n.id, n.rect)).collect();
    }

    fn rect_of(&self, id: ItemId) -> Option<PixelRect> {
        self.layout.get(&id).copied().or_else(|| {
            self.store
                .get(id)
                .map(|i| i.position.resolve(self.canvas, self.media_aspects.get(&id).copied()))
        })
    }

    fn write_rect(&mut self, id: ItemId, rect: PixelRect) {
        if let Some(item) = self.store.get_mut(id) {
            item.position.set_from_pixels(&rect, self.canvas);
            self.layout.insert(id, rect);
        }
    }

    fn selected_rects(&self) -> Vec<(ItemId, PixelRect)> {
        self.selection
            .ids()
            .iter()
            .filter_map(|id| self.rect_of(*id).map(|r| (*id, r)))
            .collect()
    }

    fn selected_intervals(&self) -> Vec<(ItemId, f64, f64)> {
        self.selection
            .ids()
            .iter()
            .filter_map(|id| self.store.get(*id).map(|i| (*id, i.start(), i.end())))
            .collect()
    }

    fn commit(&mut self) {
        self.pending_duplicate.cancel();
        match TrackingSnapshot::capture(&self.store, self.selection.ids(), self.playhead) {
            Ok(snapshot) => {
                self.history.commit(snapshot);
                self.refresh_dirty();
            }
            Err(e) => log::error!("Failed to record edit: {}", e),
        }
    }

    fn refresh_dirty(&mut self) {
        self.dirty = self.history.current().items_serialized != self.history.oldest().items_serialized;
    }

    // Selection

    /// The item plus the members of its group, the item last.
    fn with_group(&self, id: ItemId) -> Vec<ItemId> {
        match self.store.get(id).and_then(|i| i.group()) {
            Some(group) => {
                let mut ids = self.store.group_members(group);
                ids.retain(|m| *m != id);
                ids.push(id);
                ids
            }
            None => vec![id],
        }
    }

    /// Select an item; `toggle` adds or removes it instead of replacing.
    pub fn click_item(&mut self, id: ItemId, toggle: bool) -> Change {
        if !self.store.contains(id) {
            return Change::None;
        }
        let ids = self.with_group(id);
        if !toggle {
            self.selection.set(&ids);
        } else if self.selection.contains(id) {
            self.selection.remove(&ids);
        } else {
            self.selection.extend(&ids);
        }
        debug!("Selection: {:?}", self.selection.ids());
        Change::Relayout
    }

    pub fn click_background(&mut self) -> Change {
        if self.selection.is_empty() {
            return Change::None;
        }
        self.selection.clear();
        Change::Relayout
    }

    fn ensure_selected(&mut self, id: ItemId) -> Change {
        if self.selection.contains(id) {
            Change::None
        } else {
            self.click_item(id, false)
        }
    }

    // Canvas gestures

    pub fn begin_drag(&mut self, id: ItemId, x: f64, y: f64) -> Change {
        if !self.store.contains(id) {
            return Change::None;
        }
        self.flush_pending();
        let change = self.ensure_selected(id);
        self.gesture = Gesture::Drag {
            origin: (x, y),
            start: self.selected_rects(),
            moved: false,
        };
        change
    }

    pub fn drag_to(&mut self, x: f64, y: f64) -> Change {
        let (origin, start) = match &self.gesture {
            Gesture::Drag { origin, start, .. } => (*origin, start.clone()),
            _ => return Change::None,
        };
        let (dx, dy) = clamp_delta(&start, x - origin.0, y - origin.1, self.canvas);
        for (id, rect) in &start {
            self.write_rect(*id, rect.translated(dx, dy));
        }
        if let Gesture::Drag { moved, .. } = &mut self.gesture {
            *moved = dx != 0.0 || dy != 0.0;
        }
        Change::Relayout
    }

    /// Finish a drag at the final pointer position.
    pub fn end_drag(&mut self, x: f64, y: f64) -> Change {
        if !matches!(self.gesture, Gesture::Drag { .. }) {
            return Change::None;
        }
        self.drag_to(x, y);
        let moved = matches!(self.gesture, Gesture::Drag { moved: true, .. });
        self.gesture = Gesture::Idle;
        if moved {
            debug!("Moved {} items", self.selection.len());
            self.commit();
            Change::Relayout
        } else {
            Change::None
        }
    }

    /// Start resizing from a handle of `id`.
    ///
    /// `keep_aspect` locks the ratio of kinds that can otherwise be
    /// stretched freely.
    pub fn begin_resize(
        &mut self,
        id: ItemId,
        handle: ResizeHandle,
        x: f64,
        y: f64,
        keep_aspect: bool,
    ) -> Change {
        if !self.store.contains(id) {
            return Change::None;
        }
        self.flush_pending();
        let change = self.ensure_selected(id);
        let start = self
            .selected_rects()
            .into_iter()
            .filter_map(|(id, rect)| self.store.get(id).map(|i| (id, rect, i.kind.sizing())))
            .collect();
        self.gesture = Gesture::Resize {
            handle,
            keep_aspect,
            origin: (x, y),
            start,
            moved: false,
        };
        change
    }

    pub fn resize_to(&mut self, x: f64, y: f64) -> Change {
        let (handle, keep_aspect, origin, start) = match &self.gesture {
            Gesture::Resize {
                handle,
                keep_aspect,
                origin,
                start,
                ..
            } => (*handle, *keep_aspect, *origin, start.clone()),
            _ => return Change::None,
        };
        let (dx, dy) = (x - origin.0, y - origin.1);
        let mut moved = false;
        for (id, rect, sizing) in &start {
            let lock = match sizing {
                Sizing::Fixed => continue,
                Sizing::Free if !keep_aspect => None,
                _ => aspect_of(rect),
            };
            let resized = resize_rect(rect, handle, dx, dy, lock, self.canvas);
            moved |= resized != *rect;
            self.write_rect(*id, resized);
        }
        if let Gesture::Resize { moved: m, .. } = &mut self.gesture {
            *m = moved;
        }
        Change::Relayout
    }

    pub fn end_resize(&mut self, x: f64, y: f64) -> Change {
        if !matches!(self.gesture, Gesture::Resize { .. }) {
            return Change::None;
        }
        self.resize_to(x, y);
        let moved = matches!(self.gesture, Gesture::Resize { moved: true, .. });
        self.gesture = Gesture::Idle;
        if moved {
            self.commit();
            Change::Relayout
        } else {
            Change::None
        }
    }

    // Keyboard

    pub fn handle_key(&mut self, command: KeyCommand, now: Instant) -> Change {
        if self.is_gesture_active() {
            return Change::None;
        }
        match command {
            KeyCommand::Nudge(arrow) => self.nudge(arrow),
            KeyCommand::Delete => self.delete_selection(),
            KeyCommand::Duplicate => self.duplicate_selection(now),
            KeyCommand::LayerUp => self.send_up(),
            KeyCommand::LayerDown => self.send_down(),
            KeyCommand::Undo => match self.undo() {
                Some(time) => {
                    self.seek_request = Some(time);
                    Change::Rebuild
                }
                None => Change::None,
            },
            KeyCommand::Redo => match self.redo() {
                Some(time) => {
                    self.seek_request = Some(time);
                    Change::Rebuild
                }
                None => Change::None,
            },
            KeyCommand::Deselect => self.click_background(),
        }
    }

    /// Move the selection one step, only if all of it stays on the canvas.
    fn nudge(&mut self, arrow: Arrow) -> Change {
        let step = self.config.layout.nudge_step_px;
        let (ux, uy) = arrow.unit();
        let moved: Vec<(ItemId, PixelRect)> = self
            .selected_rects()
            .into_iter()
            .map(|(id, r)| (id, r.translated(ux * step, uy * step)))
            .collect();
        if moved.is_empty() || !moved.iter().all(|(_, r)| r.fits_within(self.canvas)) {
            return Change::None;
        }
        for (id, rect) in moved {
            self.write_rect(id, rect);
        }
        self.commit();
        Change::Relayout
    }

    pub fn delete_selection(&mut self) -> Change {
        if self.selection.is_empty() {
            return Change::None;
        }
        let ids = self.selection.ids().to_vec();
        let removed = self.store.remove(&ids);
        for item in &removed {
            self.layout.remove(&item.id);
            self.media_aspects.remove(&item.id);
        }
        self.selection.clear();
        self.commit();
        info!("Deleted {} items", removed.len());
        Change::Rebuild
    }

    /// Copy the selection to the playhead.
    ///
    /// The copies are selected at once but only recorded in history once
    /// duplicating has settled, so a burst of duplicates is one undo step.
    pub fn duplicate_selection(&mut self, now: Instant) -> Change {
        if self.selection.is_empty() {
            return Change::None;
        }
        let ids = self.selection.ids().to_vec();
        let at = self.playhead.max(self.segment.start).min(self.segment.end);
        let created = self.store.duplicate(&ids, at, &mut self.id_gen, &mut self.rng);
        for id in &created {
            if let Some(item) = self.store.get_mut(*id) {
                let window = self.segment.clamp_interval(item.interval());
                item.set_interval(window.start, window.end);
            }
        }
        self.selection.set(&created);
        self.pending_duplicate.schedule(now, ());
        info!("Duplicated {} items at {:.2}s", created.len(), at);
        Change::Rebuild
    }

    /// When the pending duplicate settles into history.
    pub fn pending_due(&self) -> Option<Instant> {
        self.pending_duplicate.due_at()
    }

    /// Record a settled duplicate. Returns whether one was recorded.
    pub fn poll_pending(&mut self, now: Instant) -> bool {
        if self.pending_duplicate.poll(now).is_some() {
            self.commit();
            true
        } else {
            false
        }
    }

    /// Record a pending duplicate right away.
    pub fn flush_pending(&mut self) {
        if self.pending_duplicate.is_pending() {
            self.commit();
        }
    }

    // Layers and groups

    fn reorder_selection(&mut self, direction: LayerDirection) -> Change {
        if self.selection.is_empty() {
            return Change::None;
        }
        self.flush_pending();
        let ids = self.selection.ids().to_vec();
        let swaps = self.store.reorder_batch(&ids, direction);
        if swaps == 0 {
            return Change::None;
        }
        debug!("Reordered selection {:?} with {} swaps", direction, swaps);
        self.commit();
        Change::Rebuild
    }

    pub fn send_up(&mut self) -> Change {
        self.reorder_selection(LayerDirection::Up)
    }

    pub fn send_down(&mut self) -> Change {
        self.reorder_selection(LayerDirection::Down)
    }

    pub fn group_selection(&mut self) -> Change {
        if self.selection.len() < 2 {
            return Change::None;
        }
        self.flush_pending();
        let taken = self.store.groups_in_use();
        let mut group = self.id_gen.next_group();
        while taken.contains(&group) {
            group = self.id_gen.next_group();
        }
        let ids = self.selection.ids().to_vec();
        self.store.group(&ids, group);
        self.commit();
        info!("Grouped {} items as {}", ids.len(), group);
        Change::Relayout
    }

    pub fn ungroup_selection(&mut self) -> Change {
        let ids = self.selection.ids().to_vec();
        let grouped = ids
            .iter()
            .any(|id| self.store.get(*id).is_some_and(|i| i.group().is_some()));
        if !grouped {
            return Change::None;
        }
        self.flush_pending();
        self.store.ungroup(&ids);
        self.commit();
        Change::Relayout
    }

    // Timeline gestures

    /// Start dragging a timeline bar or one of its edges.
    pub fn begin_timeline(&mut self, id: ItemId) -> Change {
        if !self.store.contains(id) {
            return Change::None;
        }
        self.flush_pending();
        let change = self.ensure_selected(id);
        self.gesture = Gesture::Timeline {
            start: self.selected_intervals(),
            moved: false,
        };
        change
    }

    pub fn end_timeline(&mut self) -> Change {
        let moved = match self.gesture {
            Gesture::Timeline { moved, .. } => moved,
            _ => return Change::None,
        };
        self.gesture = Gesture::Idle;
        if moved {
            self.commit();
            Change::Relayout
        } else {
            Change::None
        }
    }

    /// Intervals to edit from, and whether a timeline gesture is running.
    fn timeline_base(&self) -> (Vec<(ItemId, f64, f64)>, bool) {
        match &self.gesture {
            Gesture::Timeline { start, .. } => (start.clone(), true),
            _ => (self.selected_intervals(), false),
        }
    }

    /// Move every selected interval by `delta` seconds.
    ///
    /// The shift is limited so no interval leaves the segment. Inside a
    /// timeline gesture `delta` is measured from where the gesture began;
    /// otherwise the shift is applied and recorded at once.
    pub fn timeline_shift(&mut self, delta: f64) -> Change {
        let (base, live) = self.timeline_base();
        if base.is_empty() {
            return Change::None;
        }
        let segment = &self.segment;
        let min_delta = base
            .iter()
            .map(|(_, s, _)| segment.start - s)
            .fold(f64::NEG_INFINITY, f64::max);
        let max_delta = base
            .iter()
            .map(|(_, _, e)| segment.end - e)
            .fold(f64::INFINITY, f64::min);
        let delta = delta.max(min_delta).min(max_delta);

        let updates = base
            .iter()
            .map(|&(id, s, e)| {
                let window = segment.clamp_interval(Interval::new(
                    round_to_two(s + delta),
                    round_to_two(e + delta),
                ));
                (id, window.start, window.end)
            })
            .collect();
        self.apply_intervals(updates, &base, live)
    }

    /// Set the start or end of every selected interval.
    ///
    /// Ends never pass their start (and vice versa), and media items are
    /// never made longer than their intrinsic duration.
    pub fn timeline_trim(&mut self, edge: TrimEdge, time: f64) -> Change {
        let (base, live) = self.timeline_base();
        if base.is_empty() {
            return Change::None;
        }
        let time = round_to_two(time);
        let updates = base
            .iter()
            .map(|&(id, s, e)| {
                let limit = self
                    .store
                    .get(id)
                    .and_then(|i| i.properties.duration)
                    .filter(|d| *d > 0.0);
                match edge {
                    TrimEdge::Start => {
                        let low = limit.map_or(self.segment.start, |d| self.segment.start.max(e - d));
                        (id, round_to_two(time.max(low).min(e)), e)
                    }
                    TrimEdge::End => {
                        let high = limit.map_or(self.segment.end, |d| self.segment.end.min(s + d));
                        (id, s, round_to_two(time.min(high).max(s)))
                    }
                }
            })
            .collect();
        self.apply_intervals(updates, &base, live)
    }

    fn apply_intervals(
        &mut self,
        updates: Vec<(ItemId, f64, f64)>,
        base: &[(ItemId, f64, f64)],
        live: bool,
    ) -> Change {
        let changed = updates
            .iter()
            .zip(base)
            .any(|(u, b)| u.1 != b.1 || u.2 != b.2);
        for (id, start, end) in &updates {
            if let Some(item) = self.store.get_mut(*id) {
                item.set_interval(*start, *end);
            }
        }
        if live {
            if let Gesture::Timeline { moved, .. } = &mut self.gesture {
                *moved = changed;
            }
            return Change::Relayout;
        }
        if changed {
            self.commit();
            Change::Relayout
        } else {
            Change::None
        }
    }

    // Item lifecycle

    /// Add an item of `kind` with the given properties and select it.
    ///
    /// The interval is clamped into the segment, and the geometry follows
    /// the kind's defaults.
    pub fn add_item(&mut self, kind: ItemKind, properties: Properties) -> Result<ItemId> {
        if properties.start > properties.end {
            return Err(OverlayError::InvalidInterval {
                start: properties.start,
                end: properties.end,
            });
        }
        self.flush_pending();
        let mut id = self.id_gen.next_item();
        while self.store.contains(id) {
            id = self.id_gen.next_item();
        }

        let mut item = AnnotationItem::new(id, kind, properties);
        let window = self.segment.clamp_interval(item.interval());
        item.set_interval(window.start, window.end);
        if let Some(duration) = item.properties.duration.filter(|d| *d > 0.0) {
            if item.duration() > duration {
                item.set_interval(window.start, window.start + duration);
            }
        }
        place_new_item(
            &mut item,
            self.store.top_layer(),
            self.canvas,
            self.config.editor.new_item_jitter_px,
            &mut self.rng,
        );

        self.store.add(item)?;
        self.selection.set(&[id]);
        self.commit();
        info!("Added {} item {}", kind, id);
        Ok(id)
    }

    /// Replace the properties of an item.
    pub fn edit_item(&mut self, id: ItemId, mut properties: Properties) -> Result<Change> {
        let item = self.store.get(id).ok_or(OverlayError::ItemNotFound(id))?;
        if properties.start > properties.end {
            return Err(OverlayError::InvalidInterval {
                start: properties.start,
                end: properties.end,
            });
        }
        let replace = item.kind == ItemKind::Video
            && !properties.flag("freesize")
            && (item.properties.number("size") != properties.number("size")
                || item.properties.text("vposition") != properties.text("vposition"));
        if properties.duration.is_none() {
            properties.duration = item.properties.duration;
        }

        let window = self.segment.clamp_interval(Interval::new(properties.start, properties.end));
        properties.start = window.start;
        properties.end = window.end;
        if let Some(duration) = properties.duration.filter(|d| *d > 0.0) {
            properties.end = properties.end.min(properties.start + duration);
        }

        self.flush_pending();
        self.store.update(id, PropertyPatch::new(properties))?;
        if replace {
            let aspect = self.media_aspects.get(&id).copied();
            if let Some(item) = self.store.get_mut(id) {
                place_video(item, self.canvas, aspect);
            }
            self.layout.remove(&id);
        }
        self.commit();
        info!("Edited item {}", id);
        Ok(Change::Rebuild)
    }

    /// Apply probed media metadata to an item, if it still exists.
    ///
    /// `added` marks items added in this session: a placed video is laid
    /// out again with its real aspect ratio.
    pub fn apply_media_metadata(&mut self, id: ItemId, metadata: &MediaMetadata, added: bool) -> Change {
        let Some(item) = self.store.get(id) else {
            debug!("Ignoring metadata for removed item {}", id);
            return Change::None;
        };
        let replace = added && item.kind == ItemKind::Video && !item.properties.flag("freesize");

        let mut change = Change::None;
        if let Some(aspect) = metadata.aspect() {
            self.media_aspects.insert(id, aspect);
            if replace {
                if let Some(item) = self.store.get_mut(id) {
                    place_video(item, self.canvas, Some(aspect));
                }
                self.layout.remove(&id);
                change = Change::Relayout;
            }
        }
        if let Some(duration) = metadata.duration {
            match self.store.apply_media_duration(id, duration) {
                Ok(true) => {
                    info!("Shortened item {} to its media length {:.2}s", id, duration);
                    change = Change::Rebuild;
                }
                Ok(false) => {}
                Err(e) => warn!("{}", e),
            }
        }
        if !change.is_none() {
            self.commit();
        }
        change
    }

    /// Store the rendered pixel layout of items not yet kept as canvas
    /// percentages. Returns how many items were normalized.
    pub fn recompute_geometry(&mut self, scene: &Scene) -> usize {
        let canvas = scene.canvas_size();
        let mut changed = 0;
        for node in &scene.nodes {
            if let Some(item) = self.store.get_mut(node.id) {
                if item.position.percent_rect().is_none() {
                    item.position.set_from_pixels(&node.rect, canvas);
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            debug!("Normalized geometry of {} items", changed);
        }
        changed
    }

    pub fn position_info(&self, id: ItemId) -> Option<PositionInfo> {
        let item = self.store.get(id)?;
        let rect = self.rect_of(id)?;
        Some(PositionInfo {
            x: rect.left.round(),
            y: rect.top.round(),
            z: item.z_index() - self.config.layout.baseline_z,
            width: rect.width.round(),
            height: rect.height.round(),
            start: item.start(),
            end: item.end(),
        })
    }

    // Persistence and history

    /// Save the item list and start a fresh history from it.
    pub fn save(
        &mut self,
        backend: &mut dyn PersistenceBackend,
        scene: Option<&Scene>,
    ) -> anyhow::Result<PersistedRecord> {
        self.flush_pending();
        if let Some(scene) = scene {
            self.recompute_geometry(scene);
        }
        let payload = SavePayload::new(&self.store.to_json()?, self.draft_file_area_id);
        let record = backend.save(&payload)?;
        let base = TrackingSnapshot::capture(&self.store, self.selection.ids(), self.playhead)?;
        self.history.reset(base);
        self.dirty = false;
        info!("Saved {} items", self.store.len());
        Ok(record)
    }

    pub fn request_close(&self) -> CloseDecision {
        if self.dirty || self.pending_duplicate.is_pending() {
            CloseDecision::Confirm
        } else {
            CloseDecision::Close
        }
    }

    /// Drop every edit since the session was loaded or last saved.
    pub fn discard_changes(&mut self) -> Change {
        self.pending_duplicate.cancel();
        self.gesture = Gesture::Idle;
        let base = self.history.oldest().clone();
        self.store = base.restore();
        self.history.reset(base);
        self.selection.clear();
        self.layout.clear();
        self.dirty = false;
        info!("Discarded unsaved changes");
        Change::Rebuild
    }

    /// Replace every item, e.g. with an imported list. Recorded as one edit.
    pub fn replace_items(&mut self, store: ItemStore) -> Change {
        self.flush_pending();
        self.gesture = Gesture::Idle;
        for item in store.iter() {
            self.id_gen.observe(item.id.0);
            if let Some(group) = item.group() {
                self.id_gen.observe(group.0);
            }
        }
        self.store.replace_all(store);
        self.selection.clear();
        self.layout.clear();
        self.media_aspects.clear();
        self.commit();
        info!("Replaced item list with {} items", self.store.len());
        Change::Rebuild
    }

    /// Step back in history. Returns the playhead time of the restored
    /// state.
    pub fn undo(&mut self) -> Option<f64> {
        self.flush_pending();
        self.gesture = Gesture::Idle;
        let snapshot = self.history.undo()?.clone();
        Some(self.restore(&snapshot))
    }

    pub fn redo(&mut self) -> Option<f64> {
        self.flush_pending();
        self.gesture = Gesture::Idle;
        let snapshot = self.history.redo()?.clone();
        Some(self.restore(&snapshot))
    }

    fn restore(&mut self, snapshot: &TrackingSnapshot) -> f64 {
        self.store = snapshot.restore();
        let store = &self.store;
        self.selection.set(&snapshot.active_ids);
        self.selection.retain(|id| store.contains(id));
        self.layout.clear();
        self.playhead = snapshot.playhead_time;
        self.refresh_dirty();
        debug!("Restored history entry {}", self.history.index());
        snapshot.playhead_time
    }
}

/// Clamp a shared move so every rectangle stays on the canvas.
fn clamp_delta(rects: &[(ItemId, PixelRect)], dx: f64, dy: f64, canvas: Size) -> (f64, f64) {
    if rects.is_empty() || canvas.is_empty() {
        return (dx, dy);
    }
    let min_dx = rects.iter().map(|(_, r)| -r.left).fold(f64::NEG_INFINITY, f64::max);
    let max_dx = rects
        .iter()
        .map(|(_, r)| canvas.width - r.right())
        .fold(f64::INFINITY, f64::min);
    let min_dy = rects.iter().map(|(_, r)| -r.top).fold(f64::NEG_INFINITY, f64::max);
    let max_dy = rects
        .iter()
        .map(|(_, r)| canvas.height - r.bottom())
        .fold(f64::INFINITY, f64::min);
    (dx.max(min_dx).min(max_dx), dy.max(min_dy).min(max_dy))
}

fn aspect_of(rect: &PixelRect) -> Option<f64> {
    (rect.width > 0.0 && rect.height > 0.0).then(|| rect.width / rect.height)
}

/// Move the edges grabbed by `handle`, keeping the result on the canvas.
///
/// With `lock` the width/height ratio is kept; edge handles on one axis
/// grow the other axis to the right or downwards.
fn resize_rect(
    start: &PixelRect,
    handle: ResizeHandle,
    dx: f64,
    dy: f64,
    lock: Option<f64>,
    canvas: Size,
) -> PixelRect {
    let (hx, hy) = handle.axes();
    let (mut left, mut top) = (start.left, start.top);
    let (mut right, mut bottom) = (start.right(), start.bottom());

    if hx < 0 {
        left = (left + dx).max(0.0).min(right - MIN_SIZE_PX);
    } else if hx > 0 {
        right = (right + dx).min(canvas.width).max(left + MIN_SIZE_PX);
    }
    if hy < 0 {
        top = (top + dy).max(0.0).min(bottom - MIN_SIZE_PX);
    } else if hy > 0 {
        bottom = (bottom + dy).min(canvas.height).max(top + MIN_SIZE_PX);
    }

    if let Some(ratio) = lock {
        let mut width = right - left;
        let mut height = bottom - top;
        if hx == 0 {
            width = height * ratio;
        } else {
            height = width / ratio;
        }
        let max_width = if hx < 0 { right } else { canvas.width - left };
        let max_height = if hy < 0 { bottom } else { canvas.height - top };
        if width > max_width {
            width = max_width;
            height = width / ratio;
        }
        if height > max_height {
            height = max_height;
            width = height * ratio;
        }
        let width = width.max(MIN_SIZE_PX);
        let height = height.max(MIN_SIZE_PX);
        if hx < 0 {
            left = right - width;
        } else {
            right = left + width;
        }
        if hy < 0 {
            top = bottom - height;
        } else {
            bottom = top + height;
        }
    }

    PixelRect::new(left, top, right - left, bottom - top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::persistence::MemoryBackend;
    use crate::models::item::{GroupId, Length, BASELINE_Z};
    use rand::Rng;
    use std::time::Duration;

    const EPS: f64 = 1e-6;

    fn sample_store() -> ItemStore {
        let mut store = ItemStore::new();
        for (id, left) in [(1u64, 10.0), (2, 40.0), (3, 70.0)] {
            let start = id as f64 * 5.0;
            let mut item = AnnotationItem::new(ItemId(id), ItemKind::Shape, Properties::new(start, start + 10.0));
            item.position.left = Length::Percent(left);
            item.position.top = Length::Percent(10.0);
            item.position.width = Length::Percent(20.0);
            item.position.height = Length::Percent(20.0);
            item.position.z_index = BASELINE_Z + id as i32;
            store.add(item).unwrap();
        }
        store
    }

    fn session() -> EditorSession {
        let mut session =
            EditorSession::with_store(sample_store(), Segment::new(0.0, 60.0), EditorConfig::default(), None)
                .unwrap()
                .with_seed(7);
        session.set_canvas(Size::new(1000.0, 500.0));
        session
    }

    fn rect(session: &EditorSession, id: u64) -> PixelRect {
        session.rect_of(ItemId(id)).unwrap()
    }

    #[test]
    fn test_click_selection() {
        let mut s = session();
        assert_eq!(s.click_item(ItemId(1), false), Change::Relayout);
        assert_eq!(s.click_item(ItemId(2), true), Change::Relayout);
        assert_eq!(s.selection().ids(), &[ItemId(1), ItemId(2)]);

        s.click_item(ItemId(1), true);
        assert_eq!(s.selection().ids(), &[ItemId(2)]);

        assert_eq!(s.click_item(ItemId(99), false), Change::None);
        assert_eq!(s.click_background(), Change::Relayout);
        assert_eq!(s.click_background(), Change::None);
    }

    #[test]
    fn test_drag_clamps_to_canvas() {
        let mut s = session();
        s.begin_drag(ItemId(1), 150.0, 100.0);
        s.drag_to(-1000.0, 100.0);
        assert_eq!(s.end_drag(-1000.0, 100.0), Change::Relayout);

        assert!(rect(&s, 1).left.abs() < EPS);
        let item = s.store().get(ItemId(1)).unwrap();
        assert_eq!(item.position.left, Length::Percent(0.0));
        assert_eq!(s.history().len(), 2);
        assert!(s.is_dirty());
    }

    #[test]
    fn test_multi_drag_stops_at_boundary() {
        let mut s = session();
        s.click_item(ItemId(1), false);
        s.click_item(ItemId(3), true);
        s.begin_drag(ItemId(1), 0.0, 0.0);
        s.end_drag(500.0, 0.0);

        // Item 3 hits the right edge after 100 px; item 1 moves the same.
        assert!((rect(&s, 3).right() - 1000.0).abs() < EPS);
        assert!((rect(&s, 1).left - 200.0).abs() < EPS);
        assert!((rect(&s, 2).left - 400.0).abs() < EPS);
    }

    #[test]
    fn test_drag_without_movement_not_recorded() {
        let mut s = session();
        s.begin_drag(ItemId(2), 10.0, 10.0);
        assert_eq!(s.end_drag(10.0, 10.0), Change::None);
        assert_eq!(s.history().len(), 1);
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_group_drag_then_ungroup() {
        let mut s = session();
        s.click_item(ItemId(1), false);
        s.click_item(ItemId(2), true);
        assert_eq!(s.group_selection(), Change::Relayout);

        s.click_background();
        s.click_item(ItemId(1), false);
        assert_eq!(s.selection().len(), 2);

        s.begin_drag(ItemId(1), 0.0, 0.0);
        s.end_drag(10.0, 20.0);
        assert!((rect(&s, 1).left - 110.0).abs() < EPS);
        assert!((rect(&s, 2).left - 410.0).abs() < EPS);
        assert!((rect(&s, 2).top - 70.0).abs() < EPS);
        assert!((rect(&s, 3).left - 700.0).abs() < EPS);

        assert_eq!(s.ungroup_selection(), Change::Relayout);
        s.click_item(ItemId(1), false);
        assert_eq!(s.selection().ids(), &[ItemId(1)]);
        assert_eq!(s.ungroup_selection(), Change::None);
    }

    #[test]
    fn test_group_needs_two_items() {
        let mut s = session();
        s.click_item(ItemId(1), false);
        assert_eq!(s.group_selection(), Change::None);
    }

    #[test]
    fn test_nudge_only_within_bounds() {
        let mut s = session();
        s.begin_drag(ItemId(1), 0.0, 0.0);
        s.end_drag(-100.0, 0.0);
        let now = Instant::now();

        assert_eq!(s.handle_key(KeyCommand::Nudge(Arrow::Left), now), Change::None);
        assert_eq!(s.history().len(), 2);

        assert_eq!(s.handle_key(KeyCommand::Nudge(Arrow::Right), now), Change::Relayout);
        assert!((rect(&s, 1).left - 1.0).abs() < EPS);
        assert_eq!(s.history().len(), 3);
    }

    #[test]
    fn test_resize_locks_aspect_and_stays_on_canvas() {
        let mut s = session();
        let mut store = sample_store();
        let mut image = AnnotationItem::new(ItemId(10), ItemKind::Image, Properties::new(0.0, 5.0));
        image.position.left = Length::Percent(50.0);
        image.position.top = Length::Percent(50.0);
        image.position.width = Length::Percent(20.0);
        image.position.height = Length::Percent(20.0);
        store.add(image).unwrap();
        s.store = store;

        // 200x100 image; drag the bottom right corner far outside
        s.begin_resize(ItemId(10), ResizeHandle::BottomRight, 700.0, 350.0, false);
        s.end_resize(2000.0, 2000.0);
        let r = rect(&s, 10);
        assert!((r.width / r.height - 2.0).abs() < EPS);
        assert!(r.right() <= 1000.0 + EPS);
        assert!(r.bottom() <= 500.0 + EPS);
        assert!((r.height - 250.0).abs() < EPS);
    }

    #[test]
    fn test_resize_free_shape_and_minimum() {
        let mut s = session();
        s.begin_resize(ItemId(1), ResizeHandle::Right, 300.0, 100.0, false);
        s.resize_to(350.0, 400.0);
        let r = rect(&s, 1);
        assert!((r.width - 250.0).abs() < EPS);
        assert!((r.height - 100.0).abs() < EPS);

        s.resize_to(-500.0, 100.0);
        assert!((rect(&s, 1).width - MIN_SIZE_PX).abs() < EPS);
        assert_eq!(s.end_resize(-500.0, 100.0), Change::Relayout);
    }

    #[test]
    fn test_fixed_items_do_not_resize() {
        let mut s = session();
        let id = s.add_item(ItemKind::Audio, Properties::new(0.0, 5.0)).unwrap();
        let before = rect(&s, id.0);
        s.begin_resize(id, ResizeHandle::BottomRight, 40.0, 40.0, false);
        assert_eq!(s.end_resize(200.0, 200.0), Change::None);
        assert_eq!(rect(&s, id.0), before);
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut s = session();
        let original = s.store().clone();

        s.set_playhead(12.0);
        s.begin_drag(ItemId(2), 0.0, 0.0);
        s.end_drag(30.0, 30.0);
        let moved = s.store().clone();

        s.click_item(ItemId(3), false);
        s.delete_selection();
        let deleted = s.store().clone();
        assert_eq!(deleted.len(), 2);

        assert_eq!(s.undo(), Some(12.0));
        assert_eq!(s.store(), &moved);
        assert_eq!(s.undo(), Some(0.0));
        assert_eq!(s.store(), &original);
        assert!(!s.is_dirty());
        assert_eq!(s.undo(), None);

        s.redo();
        s.redo();
        assert_eq!(s.store(), &deleted);
        assert_eq!(s.redo(), None);
        assert!(s.is_dirty());
    }

    #[test]
    fn test_random_edits_undo_redo_restore_state() {
        let mut s = session();
        let mut rng = StdRng::seed_from_u64(11);
        let state = |s: &EditorSession| {
            let current = s.history().current();
            (current.items_serialized.clone(), s.selection().ids().to_vec())
        };
        let mut states = vec![state(&s)];

        for _ in 0..120 {
            let before = s.history().index();
            let ids = s.store().ids();
            if ids.is_empty() {
                s.add_item(ItemKind::Shape, Properties::new(1.0, 4.0)).unwrap();
            } else {
                let id = ids[rng.gen_range(0..ids.len())];
                s.click_item(id, rng.gen_bool(0.3));
                s.set_playhead(rng.gen_range(0.0..60.0));
                match rng.gen_range(0..6) {
                    0 => {
                        s.begin_drag(id, 0.0, 0.0);
                        s.end_drag(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
                    }
                    1 => {
                        s.timeline_shift(rng.gen_range(-5.0..5.0));
                    }
                    2 => {
                        s.send_up();
                    }
                    3 => {
                        s.group_selection();
                    }
                    4 => {
                        s.delete_selection();
                    }
                    _ => {
                        s.add_item(ItemKind::TextBlock, Properties::new(2.0, 8.0)).unwrap();
                    }
                }
            }
            if s.history().index() != before {
                states.push(state(&s));
            }
        }
        assert!(states.len() > 20);

        for expected in states.iter().rev().skip(1) {
            assert!(s.undo().is_some());
            assert_eq!(&state(&s), expected);
            assert_eq!(&s.store().to_json().unwrap(), &expected.0);
        }
        assert_eq!(s.undo(), None);

        for expected in states.iter().skip(1) {
            assert!(s.redo().is_some());
            assert_eq!(&state(&s), expected);
            assert_eq!(&s.store().to_json().unwrap(), &expected.0);
        }
        assert_eq!(s.redo(), None);
    }

    #[test]
    fn test_undo_key_requests_seek() {
        let mut s = session();
        s.click_item(ItemId(1), false);
        s.set_playhead(20.0);
        s.send_up();
        let now = Instant::now();
        assert_eq!(s.handle_key(KeyCommand::Undo, now), Change::Rebuild);
        assert_eq!(s.take_seek_request(), Some(0.0));
        assert_eq!(s.take_seek_request(), None);
        assert_eq!(s.handle_key(KeyCommand::Redo, now), Change::Rebuild);
        assert_eq!(s.take_seek_request(), Some(20.0));
    }

    #[test]
    fn test_duplicate_is_debounced() {
        let mut s = session();
        let t0 = Instant::now();
        s.click_item(ItemId(1), false);
        s.set_playhead(30.0);

        assert_eq!(s.handle_key(KeyCommand::Duplicate, t0), Change::Rebuild);
        let first = s.selection().ids().to_vec();
        assert_eq!(first.len(), 1);
        let copy = s.store().get(first[0]).unwrap();
        assert_eq!((copy.start(), copy.end()), (30.0, 40.0));
        assert_eq!(copy.z_index(), BASELINE_Z + 4);

        s.handle_key(KeyCommand::Duplicate, t0 + Duration::from_millis(100));
        assert_eq!(s.store().len(), 5);
        assert_eq!(s.request_close(), CloseDecision::Confirm);

        assert!(!s.poll_pending(t0 + Duration::from_millis(550)));
        assert_eq!(s.history().len(), 1);
        assert!(s.poll_pending(t0 + Duration::from_millis(600)));
        assert_eq!(s.history().len(), 2);

        s.undo();
        assert_eq!(s.store().len(), 3);
    }

    #[test]
    fn test_duplicate_clamped_to_segment() {
        let mut s = session();
        s.click_item(ItemId(3), false);
        s.set_playhead(55.0);
        s.duplicate_selection(Instant::now());
        let id = s.selection().ids()[0];
        let copy = s.store().get(id).unwrap();
        assert_eq!((copy.start(), copy.end()), (55.0, 60.0));
    }

    #[test]
    fn test_layer_commands() {
        let mut s = session();
        s.click_item(ItemId(3), false);
        assert_eq!(s.send_up(), Change::None);
        assert_eq!(s.send_down(), Change::Rebuild);
        assert!(s.store().get(ItemId(3)).unwrap().z_index() < s.store().get(ItemId(2)).unwrap().z_index());
    }

    #[test]
    fn test_timeline_shift_and_trim() {
        let mut s = session();
        s.click_item(ItemId(1), false);
        s.click_item(ItemId(3), true);

        // Item 3 ends at 25; items may move at most 35 s forward
        assert_eq!(s.timeline_shift(100.0), Change::Relayout);
        let item3 = s.store().get(ItemId(3)).unwrap();
        assert_eq!((item3.start(), item3.end()), (50.0, 60.0));
        let item1 = s.store().get(ItemId(1)).unwrap();
        assert_eq!((item1.start(), item1.end()), (40.0, 50.0));

        s.click_item(ItemId(2), false);
        s.timeline_trim(TrimEdge::End, 12.346);
        assert_eq!(s.store().get(ItemId(2)).unwrap().end(), 12.35);
        s.timeline_trim(TrimEdge::End, 1.0);
        let item2 = s.store().get(ItemId(2)).unwrap();
        assert_eq!((item2.start(), item2.end()), (10.0, 10.0));
    }

    #[test]
    fn test_trim_respects_media_duration() {
        let mut s = session();
        let props = Properties::new(10.0, 20.0).with("url", "clip.mp4");
        let id = s.add_item(ItemKind::Video, props).unwrap();
        let metadata = MediaMetadata {
            duration: Some(4.0),
            width: Some(1280),
            height: Some(720),
        };
        assert_eq!(s.apply_media_metadata(id, &metadata, true), Change::Rebuild);
        assert_eq!(s.store().get(id).unwrap().end(), 14.0);

        s.timeline_trim(TrimEdge::End, 30.0);
        assert_eq!(s.store().get(id).unwrap().end(), 14.0);

        assert_eq!(s.apply_media_metadata(ItemId(424242), &metadata, false), Change::None);
    }

    #[test]
    fn test_timeline_gesture_records_once() {
        let mut s = session();
        s.begin_timeline(ItemId(2));
        s.timeline_shift(1.0);
        s.timeline_shift(2.0);
        s.timeline_shift(3.0);
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.end_timeline(), Change::Relayout);
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.store().get(ItemId(2)).unwrap().start(), 13.0);
    }

    #[test]
    fn test_random_timeline_edits_keep_intervals_valid() {
        let mut s = session();
        let mut rng = StdRng::seed_from_u64(42);
        let ids = [ItemId(1), ItemId(2), ItemId(3)];

        for _ in 0..500 {
            let id = ids[rng.gen_range(0..ids.len())];
            s.click_item(id, rng.gen_bool(0.5));
            match rng.gen_range(0..4) {
                0 => {
                    s.timeline_shift(rng.gen_range(-30.0..30.0));
                }
                1 => {
                    s.timeline_trim(TrimEdge::Start, rng.gen_range(-10.0..70.0));
                }
                2 => {
                    s.timeline_trim(TrimEdge::End, rng.gen_range(-10.0..70.0));
                }
                _ => {
                    s.begin_timeline(id);
                    s.timeline_shift(rng.gen_range(-30.0..30.0));
                    s.timeline_trim(TrimEdge::Start, rng.gen_range(-10.0..70.0));
                    s.end_timeline();
                }
            }
            for item in s.store().iter() {
                assert!(item.start() <= item.end(), "{:?}", item.interval());
                assert!(item.start() >= 0.0 && item.end() <= 60.0);
            }
        }
    }

    #[test]
    fn test_random_gestures_stay_on_canvas() {
        let mut s = session();
        let mut rng = StdRng::seed_from_u64(9);
        let ids = [ItemId(1), ItemId(2), ItemId(3)];

        for _ in 0..300 {
            let id = ids[rng.gen_range(0..ids.len())];
            let (x, y) = (rng.gen_range(-200.0..1200.0), rng.gen_range(-200.0..700.0));
            if rng.gen_bool(0.5) {
                s.begin_drag(id, 500.0, 250.0);
                s.end_drag(x, y);
            } else {
                let handle = ResizeHandle::ALL[rng.gen_range(0..ResizeHandle::ALL.len())];
                s.begin_resize(id, handle, 500.0, 250.0, rng.gen_bool(0.5));
                s.end_resize(x, y);
            }
            for id in ids {
                let r = rect(&s, id.0);
                assert!(r.left >= -EPS && r.top >= -EPS, "{:?}", r);
                assert!(r.right() <= 1000.0 + EPS && r.bottom() <= 500.0 + EPS, "{:?}", r);
                assert!(r.width >= MIN_SIZE_PX - EPS && r.height >= MIN_SIZE_PX - EPS);
            }
        }
    }

    #[test]
    fn test_add_item_defaults() {
        let mut s = session();
        let id = s
            .add_item(ItemKind::File, Properties::new(50.0, 90.0).with("label", "Notes"))
            .unwrap();
        let item = s.store().get(id).unwrap();
        assert_eq!((item.start(), item.end()), (50.0, 60.0));
        assert_eq!(item.position.width, Length::Pixels(130.0));
        assert_eq!(item.z_index(), BASELINE_Z + 4);
        assert_eq!(s.selection().ids(), &[id]);
        assert!(s.is_dirty());

        let err = s.add_item(ItemKind::Text, Properties::new(5.0, 1.0));
        assert!(matches!(err, Err(OverlayError::InvalidInterval { .. })));
    }

    #[test]
    fn test_edit_item() {
        let mut s = session();
        let props = Properties::new(2.0, 70.0).with("bgcolor", "#ff0000");
        assert_eq!(s.edit_item(ItemId(1), props).unwrap(), Change::Rebuild);
        let item = s.store().get(ItemId(1)).unwrap();
        assert_eq!(item.end(), 60.0);
        assert_eq!(item.properties.text("bgcolor"), "#ff0000");

        assert!(matches!(
            s.edit_item(ItemId(99), Properties::new(0.0, 1.0)),
            Err(OverlayError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_position_info() {
        let s = session();
        let info = s.position_info(ItemId(2)).unwrap();
        assert_eq!((info.x, info.y, info.width, info.height), (400.0, 50.0, 200.0, 100.0));
        assert_eq!(info.z, 2);
        assert_eq!((info.start, info.end), (10.0, 20.0));
    }

    #[test]
    fn test_save_escapes_and_resets_history() {
        let mut store = sample_store();
        store.get_mut(ItemId(1)).unwrap().properties.set("label", "<b>bold</b>");
        store.get_mut(ItemId(3)).unwrap().properties.set("label", "a &lt; b");
        let mut s = EditorSession::with_store(store, Segment::new(0.0, 60.0), EditorConfig::default(), Some(77))
            .unwrap();
        s.set_canvas(Size::new(1000.0, 500.0));
        s.click_item(ItemId(2), false);
        s.delete_selection();

        let mut backend = MemoryBackend::default();
        let record = s.save(&mut backend, None).unwrap();
        assert!(record.items_json.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!record.items_json.contains("<b>"));
        assert_eq!(record.draft_file_area_id, Some(77));
        assert_eq!(backend.saves, 1);
        assert!(!s.is_dirty());
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.request_close(), CloseDecision::Close);

        let reopened = EditorSession::load(&record, Segment::new(0.0, 60.0), EditorConfig::default()).unwrap();
        assert_eq!(reopened.store().len(), 2);
        assert_eq!(reopened.store().get(ItemId(1)).unwrap().properties.text("label"), "<b>bold</b>");
        assert_eq!(reopened.store().get(ItemId(3)).unwrap().properties.text("label"), "a &lt; b");
    }

    #[test]
    fn test_discard_changes() {
        let mut s = session();
        let original = s.store().clone();
        s.click_item(ItemId(1), false);
        s.delete_selection();
        assert_eq!(s.request_close(), CloseDecision::Confirm);

        assert_eq!(s.discard_changes(), Change::Rebuild);
        assert_eq!(s.store(), &original);
        assert!(s.selection().is_empty());
        assert_eq!(s.request_close(), CloseDecision::Close);
    }

    #[test]
    fn test_load_malformed_record() {
        let record = PersistedRecord {
            items_json: "not json".into(),
            ..Default::default()
        };
        let s = EditorSession::load(&record, Segment::default(), EditorConfig::default()).unwrap();
        assert!(s.store().is_empty());
    }

    #[test]
    fn test_replace_items_is_undoable() {
        let mut s = session();
        let original = s.store().clone();
        let mut imported = ItemStore::new();
        imported
            .add(AnnotationItem::new(ItemId(10), ItemKind::Text, Properties::new(1.0, 2.0)))
            .unwrap();

        assert_eq!(s.replace_items(imported), Change::Rebuild);
        assert!(s.is_dirty());
        assert_eq!(s.store().ids(), vec![ItemId(10)]);

        let id = s.add_item(ItemKind::Shape, Properties::new(0.0, 5.0)).unwrap();
        assert!(id.0 > 10);

        s.undo();
        s.undo();
        assert_eq!(s.store(), &original);
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_ids_after_max_loaded_id() {
        let store = ItemStore::from_json(
            r#"[{"id":18446744073709551615,"type":"shape","position":{"group":18446744073709551615}},{"id":5,"type":"shape"}]"#,
        );
        let mut s = EditorSession::with_store(store, Segment::new(0.0, 60.0), EditorConfig::default(), None).unwrap();

        let id = s.add_item(ItemKind::Shape, Properties::new(0.0, 5.0)).unwrap();
        assert!(id != ItemId(u64::MAX) && id != ItemId(5));
        assert_eq!(s.store().len(), 3);

        s.click_item(id, false);
        s.click_item(ItemId(5), true);
        assert_eq!(s.group_selection(), Change::Relayout);
        let group = s.store().get(id).unwrap().group().unwrap();
        assert_ne!(group, GroupId(u64::MAX));
        assert_eq!(s.store().get(ItemId(5)).unwrap().group(), Some(group));
    }
}
