// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Turns the item store into a laid-out [`Scene`].
//!
//! A full render rebuilds every node and media element; a relayout only
//! recomputes geometry of the existing nodes. Viewport resizes are
//! debounced so a burst of resize events causes a single relayout.

pub mod kinds;
pub mod node;
pub mod registry;
pub mod scene;
pub mod style;
pub mod timeline;

pub use node::{Affordance, NodeContent, RenderNode};
pub use registry::{ItemRenderer, Layout, RenderContext, RendererRegistry};
pub use scene::{Hit, Scene};
pub use timeline::{TimelineBar, TimelineStrip};

use crate::config::EditorConfig;
use crate::engine::media::{ClockMediaFactory, MediaFactory};
use crate::models::item::{AnnotationItem, ItemId};
use crate::models::segment::Segment;
use crate::models::store::ItemStore;
use crate::util::debounce::Debouncer;
use crate::util::geometry::{fit_canvas, PixelRect, Size};
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Authoring: everything selectable, no click-through affordances
    Edit,
    /// Viewing: snapped geometry, canvas fit and affordances
    Playback,
}

pub struct Renderer {
    registry: RendererRegistry,
    factory: Box<dyn MediaFactory>,
    mode: RenderMode,
    font_divisor: f64,
    fullscreen_fit: bool,
    use_fixed_ratio: bool,
    aspects: HashMap<ItemId, f64>,
    resize: Debouncer<Size>,
}

impl Renderer {
    pub fn new(mode: RenderMode, config: &EditorConfig) -> Self {
        Self {
            registry: RendererRegistry::with_defaults(),
            factory: Box::new(ClockMediaFactory),
            mode,
            font_divisor: config.layout.font_divisor.max(1.0),
            fullscreen_fit: config.playback.fullscreen_fit,
            use_fixed_ratio: config.playback.use_fixed_ratio,
            aspects: HashMap::new(),
            resize: Debouncer::from_millis(config.layout.resize_debounce_ms),
        }
    }

    pub fn with_factory(mut self, factory: Box<dyn MediaFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn registry_mut(&mut self) -> &mut RendererRegistry {
        &mut self.registry
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
    }

    pub fn set_fullscreen_fit(&mut self, fit: bool) {
        self.fullscreen_fit = fit;
    }

    /// Record the intrinsic aspect of a loaded image or clip. Returns true
    /// when it changed.
    pub fn set_intrinsic_aspect(&mut self, id: ItemId, aspect: f64) -> bool {
        if !aspect.is_finite() || aspect <= 0.0 {
            return false;
        }
        self.aspects.insert(id, aspect) != Some(aspect)
    }

    pub fn intrinsic_aspect(&self, id: ItemId) -> Option<f64> {
        self.aspects.get(&id).copied()
    }

    /// Where the overlay canvas sits inside the viewport.
    pub fn canvas_rect(&self, viewport: Size, video_aspect: Option<f64>) -> PixelRect {
        if self.mode == RenderMode::Edit {
            return PixelRect::new(0.0, 0.0, viewport.width, viewport.height);
        }
        let aspect = if self.use_fixed_ratio {
            16.0 / 9.0
        } else {
            video_aspect.unwrap_or(16.0 / 9.0)
        };
        fit_canvas(viewport, aspect, self.fullscreen_fit)
    }

    fn context<'a>(&'a self, canvas: Size, segment: &'a Segment) -> RenderContext<'a> {
        RenderContext {
            canvas,
            mode: self.mode,
            segment,
            base_font: canvas.width / self.font_divisor,
            aspects: &self.aspects,
        }
    }

    /// Rebuild the whole scene. Every node starts hidden until the
    /// scheduler ticks.
    pub fn render(
        &self,
        store: &ItemStore,
        segment: &Segment,
        selection: &[ItemId],
        viewport: Size,
        video_aspect: Option<f64>,
    ) -> Scene {
        let canvas = self.canvas_rect(viewport, video_aspect);
        let size = Size::new(canvas.width, canvas.height);
        let ctx = self.context(size, segment);

        let mut items: Vec<&AnnotationItem> = store.in_segment(segment).collect();
        items.sort_by_key(|i| i.z_index());

        let mut scene = Scene::empty(self.mode);
        scene.viewport = viewport;
        scene.canvas = canvas;
        scene.base_font = ctx.base_font;

        for item in items {
            let Some(renderer) = self.registry.get(item.kind) else {
                log::warn!("No renderer registered for {} item {}", item.kind, item.id);
                continue;
            };
            let mut node = renderer.render(item, &ctx);
            node.visible = false;
            scene.nodes.push(node);
            if item.kind.is_media() {
                scene.media.insert(item.id, self.factory.create(item));
            }
        }
        scene.sort_nodes();

        if self.mode == RenderMode::Edit {
            scene.timeline = TimelineStrip::build(store, segment, selection);
        }
        scene.set_selection(selection);
        log::debug!("Rendered {} nodes ({} media)", scene.nodes.len(), scene.media.len());
        scene
    }

    /// Recompute geometry of existing nodes without touching content or
    /// media.
    pub fn relayout(
        &self,
        scene: &mut Scene,
        store: &ItemStore,
        segment: &Segment,
        selection: &[ItemId],
        viewport: Size,
        video_aspect: Option<f64>,
    ) {
        let canvas = self.canvas_rect(viewport, video_aspect);
        let size = Size::new(canvas.width, canvas.height);
        let ctx = self.context(size, segment);

        scene.viewport = viewport;
        scene.canvas = canvas;
        scene.base_font = ctx.base_font;
        for node in &mut scene.nodes {
            let (Some(item), Some(renderer)) = (store.get(node.id), self.registry.get(node.kind)) else {
                continue;
            };
            renderer.relayout(node, item, &ctx);
        }
        scene.sort_nodes();
        if self.mode == RenderMode::Edit {
            scene.timeline = TimelineStrip::build(store, segment, selection);
        }
        scene.set_selection(selection);
    }

    /// Note a viewport resize; the latest one wins.
    pub fn request_resize(&mut self, now: Instant, viewport: Size) {
        self.resize.schedule(now, viewport);
    }

    /// Viewport to relayout for, once resizing has settled.
    pub fn poll_resize(&mut self, now: Instant) -> Option<Size> {
        self.resize.poll(now)
    }

    /// When the pending resize settles.
    pub fn resize_due(&self) -> Option<Instant> {
        self.resize.due_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scheduler::OverlaySurface;
    use crate::models::item::{ItemKind, Length, Properties};
    use std::time::Duration;

    fn store() -> ItemStore {
        let mut store = ItemStore::new();
        let specs = [
            (1, ItemKind::Shape, 0.0, 10.0, 9),
            (2, ItemKind::Video, 5.0, 15.0, 6),
            (3, ItemKind::Image, 100.0, 110.0, 7),
        ];
        for (id, kind, start, end, z) in specs {
            let mut item = AnnotationItem::new(ItemId(id), kind, Properties::new(start, end));
            item.position.z_index = z;
            item.position.width = Length::Percent(10.0);
            item.position.height = Length::Percent(10.0);
            store.add(item).unwrap();
        }
        store
    }

    #[test]
    fn test_render_filters_and_hides() {
        let renderer = Renderer::new(RenderMode::Edit, &EditorConfig::default());
        let scene = renderer.render(&store(), &Segment::new(0.0, 60.0), &[], Size::new(750.0, 400.0), None);

        let ids: Vec<ItemId> = scene.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![ItemId(2), ItemId(1)]);
        assert!(scene.nodes.iter().all(|n| !n.visible));
        assert!(scene.media(ItemId(2)).is_some());
        assert!(scene.media(ItemId(1)).is_none());
        assert_eq!(scene.base_font, 10.0);
        assert_eq!(scene.timeline.rows(), 2);
        assert_eq!(scene.scrim_z, None);
    }

    #[test]
    fn test_scrim_catches_clicks_beside_items() {
        let renderer = Renderer::new(RenderMode::Edit, &EditorConfig::default());
        let mut scene = renderer.render(&store(), &Segment::new(0.0, 60.0), &[ItemId(2)], Size::new(1000.0, 500.0), None);
        assert_eq!(scene.scrim_z, Some(5));
        assert!(scene.node(ItemId(2)).unwrap().active);

        scene.set_visible(ItemId(1), true);
        scene.set_visible(ItemId(2), true);
        assert_eq!(scene.hit(10.0, 10.0), Some(Hit::Item(ItemId(1))));
        assert_eq!(scene.hit(900.0, 400.0), Some(Hit::Scrim));
        assert_eq!(scene.hit(1200.0, 10.0), None);

        scene.set_selection(&[]);
        assert_eq!(scene.scrim_z, None);
        assert_eq!(scene.hit(900.0, 400.0), None);
    }

    #[test]
    fn test_relayout_follows_store() {
        let renderer = Renderer::new(RenderMode::Edit, &EditorConfig::default());
        let mut store = store();
        let segment = Segment::new(0.0, 60.0);
        let mut scene = renderer.render(&store, &segment, &[], Size::new(1000.0, 500.0), None);
        scene.set_visible(ItemId(1), true);

        store.get_mut(ItemId(1)).unwrap().position.left = Length::Percent(50.0);
        renderer.relayout(&mut scene, &store, &segment, &[], Size::new(1000.0, 500.0), None);
        let node = scene.node(ItemId(1)).unwrap();
        assert_eq!(node.rect.left, 500.0);
        // Visibility belongs to the scheduler and survives relayout
        assert!(node.visible);
    }

    #[test]
    fn test_hit_test_topmost_visible() {
        let renderer = Renderer::new(RenderMode::Edit, &EditorConfig::default());
        let mut scene = renderer.render(&store(), &Segment::new(0.0, 60.0), &[], Size::new(1000.0, 500.0), None);
        assert_eq!(scene.hit_test(10.0, 10.0), None);

        scene.set_visible(ItemId(1), true);
        scene.set_visible(ItemId(2), true);
        assert_eq!(scene.hit_test(10.0, 10.0), Some(ItemId(1)));
        assert_eq!(scene.hit_test(900.0, 400.0), None);
    }

    #[test]
    fn test_playback_canvas_fit() {
        let mut config = EditorConfig::default();
        config.playback.fullscreen_fit = true;
        let renderer = Renderer::new(RenderMode::Playback, &config);
        let canvas = renderer.canvas_rect(Size::new(2000.0, 900.0), Some(16.0 / 9.0));
        assert!((canvas.width - 1600.0).abs() < 1e-9);

        let edit = Renderer::new(RenderMode::Edit, &config);
        assert_eq!(edit.canvas_rect(Size::new(2000.0, 900.0), None).width, 2000.0);
    }

    struct Fixed;

    impl ItemRenderer for Fixed {
        fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
            let mut node = RenderNode::new(item.id, item.kind, NodeContent::Text { lines: Vec::new() });
            self.relayout(&mut node, item, ctx);
            node
        }

        fn layout(&self, _item: &AnnotationItem, _ctx: &RenderContext) -> Layout {
            Layout::rect(PixelRect::new(1.0, 2.0, 3.0, 4.0))
        }
    }

    #[test]
    fn test_custom_renderer_and_factory() {
        let mut renderer =
            Renderer::new(RenderMode::Edit, &EditorConfig::default()).with_factory(Box::new(ClockMediaFactory));
        assert!(renderer.registry_mut().register(ItemKind::Shape, Box::new(Fixed)).is_some());

        assert!(renderer.set_intrinsic_aspect(ItemId(2), 2.0));
        assert!(!renderer.set_intrinsic_aspect(ItemId(2), 2.0));
        assert!(!renderer.set_intrinsic_aspect(ItemId(2), 0.0));
        assert_eq!(renderer.intrinsic_aspect(ItemId(2)), Some(2.0));

        let scene = renderer.render(&store(), &Segment::new(0.0, 60.0), &[], Size::new(750.0, 400.0), None);
        assert_eq!(scene.node(ItemId(1)).unwrap().rect, PixelRect::new(1.0, 2.0, 3.0, 4.0));
        assert!(scene.media(ItemId(2)).is_some());
    }

    #[test]
    fn test_resize_debounced() {
        let mut renderer = Renderer::new(RenderMode::Edit, &EditorConfig::default());
        let now = Instant::now();
        renderer.request_resize(now, Size::new(100.0, 100.0));
        renderer.request_resize(now + Duration::from_millis(50), Size::new(200.0, 100.0));
        assert_eq!(renderer.resize_due(), Some(now + Duration::from_millis(150)));

        assert_eq!(renderer.poll_resize(now + Duration::from_millis(120)), None);
        assert_eq!(
            renderer.poll_resize(now + Duration::from_millis(160)),
            Some(Size::new(200.0, 100.0))
        );
    }
}
