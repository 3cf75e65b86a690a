// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-kind renderer lookup.
//!
//! Each item kind is drawn by an [`ItemRenderer`]. New kinds are supported
//! by registering a renderer rather than extending a central match.

use crate::models::item::{AnnotationItem, ItemId, ItemKind};
use crate::models::segment::Segment;
use crate::render::kinds::{
    ButtonRenderer, HotspotRenderer, ImageRenderer, MediaRenderer, NavigationRenderer, ShapeRenderer,
    TextBlockRenderer, TextRenderer,
};
use crate::render::node::RenderNode;
use crate::render::RenderMode;
use crate::util::geometry::{to_pixel, PixelRect, Size, TextMetrics};
use std::collections::HashMap;

/// Everything a renderer needs besides the item itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub canvas: Size,
    pub mode: RenderMode,
    pub segment: &'a Segment,
    /// Canvas base font size in pixels
    pub base_font: f64,
    /// Intrinsic width / height of loaded images and clips
    pub aspects: &'a HashMap<ItemId, f64>,
}

impl RenderContext<'_> {
    pub fn is_playback(&self) -> bool {
        self.mode == RenderMode::Playback
    }

    pub fn aspect_of(&self, id: ItemId) -> Option<f64> {
        self.aspects.get(&id).copied().filter(|a| *a > 0.0)
    }

    /// Stored geometry in canvas pixels, snapped in playback.
    pub fn base_rect(&self, item: &AnnotationItem) -> PixelRect {
        if self.is_playback() {
            if let Some(percent) = item.position.percent_rect() {
                return to_pixel(&percent.snapped(), self.canvas);
            }
        }
        item.position.resolve(self.canvas, self.aspect_of(item.id))
    }
}

/// Result of laying out one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub rect: PixelRect,
    pub metrics: Option<TextMetrics>,
}

impl Layout {
    pub fn rect(rect: PixelRect) -> Self {
        Self { rect, metrics: None }
    }
}

/// Builds and lays out the node of one item kind.
pub trait ItemRenderer {
    /// Build the full node: content, style, affordances and geometry.
    fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode;

    /// Compute geometry (and text metrics) only.
    fn layout(&self, item: &AnnotationItem, ctx: &RenderContext) -> Layout;

    /// Geometry-only update of an existing node.
    fn relayout(&self, node: &mut RenderNode, item: &AnnotationItem, ctx: &RenderContext) {
        let layout = self.layout(item, ctx);
        node.rect = layout.rect;
        node.style.metrics = layout.metrics;
        node.z = item.z_index();
        node.group = item.group();
    }
}

/// Maps item kinds to their renderer.
pub struct RendererRegistry {
    renderers: HashMap<ItemKind, Box<dyn ItemRenderer>>,
}

impl RendererRegistry {
    /// A registry with no renderers at all.
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Registry with the built-in renderer of every kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(ItemKind::Image, Box::new(ImageRenderer));
        registry.register(ItemKind::Video, Box::new(MediaRenderer));
        registry.register(ItemKind::Audio, Box::new(MediaRenderer));
        registry.register(ItemKind::File, Box::new(ButtonRenderer));
        registry.register(ItemKind::Mute, Box::new(ButtonRenderer));
        registry.register(ItemKind::Navigation, Box::new(NavigationRenderer));
        registry.register(ItemKind::Text, Box::new(TextRenderer));
        registry.register(ItemKind::TextBlock, Box::new(TextBlockRenderer));
        registry.register(ItemKind::Shape, Box::new(ShapeRenderer));
        registry.register(ItemKind::Hotspot, Box::new(HotspotRenderer));
        registry
    }

    /// Install a renderer, returning the one it replaced.
    pub fn register(
        &mut self,
        kind: ItemKind,
        renderer: Box<dyn ItemRenderer>,
    ) -> Option<Box<dyn ItemRenderer>> {
        self.renderers.insert(kind, renderer)
    }

    pub fn get(&self, kind: ItemKind) -> Option<&dyn ItemRenderer> {
        self.renderers.get(&kind).map(|r| r.as_ref())
    }

    pub fn supports(&self, kind: ItemKind) -> bool {
        self.renderers.contains_key(&kind)
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::Properties;
    use crate::render::node::NodeContent;

    struct Marker;

    impl ItemRenderer for Marker {
        fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
            let mut node = RenderNode::new(item.id, item.kind, NodeContent::Text { lines: vec!["marker".into()] });
            self.relayout(&mut node, item, ctx);
            node
        }

        fn layout(&self, _item: &AnnotationItem, _ctx: &RenderContext) -> Layout {
            Layout::rect(PixelRect::new(1.0, 2.0, 3.0, 4.0))
        }
    }

    #[test]
    fn test_defaults_cover_every_kind() {
        let registry = RendererRegistry::with_defaults();
        assert!(ItemKind::ALL.iter().all(|k| registry.supports(*k)));
        assert!(!RendererRegistry::empty().supports(ItemKind::Shape));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = RendererRegistry::with_defaults();
        assert!(registry.register(ItemKind::Shape, Box::new(Marker)).is_some());

        let segment = Segment::new(0.0, 10.0);
        let aspects = HashMap::new();
        let ctx = RenderContext {
            canvas: Size::new(100.0, 100.0),
            mode: RenderMode::Edit,
            segment: &segment,
            base_font: 10.0,
            aspects: &aspects,
        };
        let item = AnnotationItem::new(ItemId(1), ItemKind::Shape, Properties::new(0.0, 1.0));
        let node = registry.get(ItemKind::Shape).unwrap().render(&item, &ctx);
        assert_eq!(node.rect, PixelRect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(node.z, item.z_index());
    }
}
