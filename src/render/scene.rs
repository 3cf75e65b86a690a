// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The rendered scene: laid-out nodes, their media and the timeline strip.

use crate::engine::media::MediaElement;
use crate::engine::scheduler::OverlaySurface;
use crate::models::item::{ItemId, BASELINE_Z};
use crate::render::node::RenderNode;
use crate::render::timeline::TimelineStrip;
use crate::render::RenderMode;
use crate::util::geometry::{PixelRect, Size};
use std::collections::HashMap;
use std::fmt;

/// What a canvas point lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Item(ItemId),
    Scrim,
}

/// Derived view of the item store, rebuilt or relaid out on every change.
pub struct Scene {
    pub mode: RenderMode,
    pub viewport: Size,
    /// Placement of the overlay canvas inside the viewport
    pub canvas: PixelRect,
    pub base_font: f64,
    /// Nodes in paint order, bottom layer first
    pub nodes: Vec<RenderNode>,
    /// Layer of the invisible click-catching scrim while something is
    /// selected. It sits beneath every item so items stay clickable.
    pub scrim_z: Option<i32>,
    pub timeline: TimelineStrip,
    pub(crate) media: HashMap<ItemId, Box<dyn MediaElement>>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("mode", &self.mode)
            .field("canvas", &self.canvas)
            .field("nodes", &self.nodes.len())
            .field("media", &self.media.len())
            .field("scrim_z", &self.scrim_z)
            .finish()
    }
}

impl Scene {
    pub fn empty(mode: RenderMode) -> Self {
        Self {
            mode,
            viewport: Size::default(),
            canvas: PixelRect::default(),
            base_font: 0.0,
            nodes: Vec::new(),
            scrim_z: None,
            timeline: TimelineStrip::default(),
            media: HashMap::new(),
        }
    }

    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas.width, self.canvas.height)
    }

    pub fn node(&self, id: ItemId) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: ItemId) -> Option<&mut RenderNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Nodes a viewer currently sees, bottom first.
    pub fn painted(&self) -> impl Iterator<Item = &RenderNode> {
        self.nodes.iter().filter(|n| n.is_painted())
    }

    pub fn sort_nodes(&mut self) {
        self.nodes.sort_by_key(|n| n.z);
    }

    /// Topmost node under a canvas-relative point.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<ItemId> {
        let hidden_allowed = self.mode == RenderMode::Edit;
        self.nodes
            .iter()
            .rev()
            .filter(|n| n.visible && (hidden_allowed || !n.concealed))
            .find(|n| n.rect.contains(x, y))
            .map(|n| n.id)
    }

    /// Like [`Scene::hit_test`], but a point on the canvas that misses
    /// every item lands on the scrim when one is raised.
    pub fn hit(&self, x: f64, y: f64) -> Option<Hit> {
        if let Some(id) = self.hit_test(x, y) {
            return Some(Hit::Item(id));
        }
        let on_canvas = x >= 0.0 && y >= 0.0 && x <= self.canvas.width && y <= self.canvas.height;
        match self.scrim_z {
            Some(_) if on_canvas => Some(Hit::Scrim),
            _ => None,
        }
    }

    /// Mark selected nodes and raise the scrim while a selection exists.
    pub fn set_selection(&mut self, selection: &[ItemId]) {
        for node in &mut self.nodes {
            node.active = selection.contains(&node.id);
        }
        self.timeline.set_active(selection);
        self.scrim_z = if self.mode == RenderMode::Edit && !selection.is_empty() {
            Some(self.nodes.iter().map(|n| n.z).min().unwrap_or(BASELINE_Z) - 1)
        } else {
            None
        };
    }

    pub fn media(&self, id: ItemId) -> Option<&dyn MediaElement> {
        self.media.get(&id).map(|m| m.as_ref())
    }

    /// Let wall time pass for every playing clip.
    pub fn advance_media(&mut self, dt: f64) {
        for media in self.media.values_mut() {
            media.advance(dt);
        }
    }

    /// Viewer closed a dismissable node.
    pub fn dismiss(&mut self, id: ItemId) {
        if let Some(node) = self.node_mut(id) {
            node.concealed = true;
        }
        if let Some(media) = self.media.get_mut(&id) {
            media.pause();
        }
    }
}

impl OverlaySurface for Scene {
    fn set_visible(&mut self, id: ItemId, visible: bool) {
        if let Some(node) = self.node_mut(id) {
            node.visible = visible;
        }
    }

    fn media_mut(&mut self, id: ItemId) -> Option<&mut dyn MediaElement> {
        match self.media.get_mut(&id) {
            Some(media) => Some(media.as_mut()),
            None => None,
        }
    }

    fn media_ids(&self) -> Vec<ItemId> {
        self.media.keys().copied().collect()
    }
}
