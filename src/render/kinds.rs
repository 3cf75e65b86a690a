// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Built-in renderers, one per item family.

use crate::models::item::{AnnotationItem, ItemKind, Properties};
use crate::render::node::{Affordance, Icon, NodeContent, RenderNode, ShapeKind};
use crate::render::registry::{ItemRenderer, Layout, RenderContext};
use crate::render::style::{border_from, button_palette, parse_color, NodeStyle, Rounding};
use crate::util::geometry::{
    estimate_text_width, single_line_metrics, text_block_metrics, PixelRect,
};

/// Split a label into display rows.
pub fn text_lines(props: &Properties) -> Vec<String> {
    let label = props.display_label();
    if label.is_empty() {
        return vec![String::new()];
    }
    label.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect()
}

fn longest_line(lines: &[String]) -> usize {
    lines.iter().map(|l| l.chars().count()).max().unwrap_or(0)
}

fn non_empty(text: &str) -> Option<String> {
    (!text.trim().is_empty()).then(|| text.trim().to_string())
}

/// Seek affordance for an authored timestamp reachable in the segment.
fn seek_affordance(props: &Properties, ctx: &RenderContext) -> Option<Affordance> {
    let time = props.timestamp()?;
    match ctx.segment.validate_timestamp(time) {
        Ok(()) => Some(Affordance::SeekTo(time)),
        Err(e) => {
            log::debug!("Ignoring click timestamp: {}", e);
            None
        }
    }
}

/// Height follows the intrinsic aspect when it is known.
fn aspect_locked(mut rect: PixelRect, aspect: Option<f64>) -> PixelRect {
    if let Some(aspect) = aspect {
        rect.height = rect.width / aspect;
    }
    rect
}

fn finish(renderer: &dyn ItemRenderer, mut node: RenderNode, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
    renderer.relayout(&mut node, item, ctx);
    node
}

/// Plain and linked images.
pub struct ImageRenderer;

impl ItemRenderer for ImageRenderer {
    fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
        let props = &item.properties;
        let alt = match props.text("formattedalttext") {
            "" => props.text("alttext"),
            text => text,
        };
        let content = NodeContent::Image {
            url: props.url().to_string(),
            alt: alt.to_string(),
        };
        let mut node = RenderNode::new(item.id, item.kind, content);
        node.style.shadow = props.flag("shadow");
        if props.flag("rounded") {
            node.style.rounding = Rounding::Em(1.0);
        }
        if ctx.is_playback() {
            if let Some(url) = non_empty(props.text("gotourl")) {
                node.affordances.push(Affordance::OpenUrl(url));
            }
            node.affordances.extend(seek_affordance(props, ctx));
            node.resizable = false;
        }
        finish(self, node, item, ctx)
    }

    fn layout(&self, item: &AnnotationItem, ctx: &RenderContext) -> Layout {
        Layout::rect(aspect_locked(ctx.base_rect(item), ctx.aspect_of(item.id)))
    }
}

/// Embedded video and audio clips.
pub struct MediaRenderer;

impl ItemRenderer for MediaRenderer {
    fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
        let props = &item.properties;
        let audio = item.kind == ItemKind::Audio;
        let content = NodeContent::Media {
            url: props.url().to_string(),
            audio,
            muted: props.flag("muted"),
        };
        let mut node = RenderNode::new(item.id, item.kind, content);
        node.style.shadow = props.flag("shadow");
        if props.flag("rounded") {
            node.style.rounding = Rounding::Em(1.0);
        }
        node.resizable = !audio && props.flag("freesize");
        if audio {
            node.style.opacity = 0.5;
        }
        if ctx.is_playback() {
            // Audio badges are never shown to viewers
            node.concealed = audio;
            if !audio && props.flag("dismissable") && props.text("size") != "100" {
                node.affordances.push(Affordance::Dismiss);
            }
        }
        finish(self, node, item, ctx)
    }

    fn layout(&self, item: &AnnotationItem, ctx: &RenderContext) -> Layout {
        let rect = ctx.base_rect(item);
        if item.kind == ItemKind::Audio {
            return Layout::rect(rect);
        }
        Layout::rect(aspect_locked(rect, ctx.aspect_of(item.id)))
    }
}

/// Button-styled inline files and mute markers.
pub struct ButtonRenderer;

impl ButtonRenderer {
    fn label(item: &AnnotationItem) -> String {
        match item.kind {
            ItemKind::Mute => String::new(),
            _ => item.properties.display_label().to_string(),
        }
    }
}

impl ItemRenderer for ButtonRenderer {
    fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
        let props = &item.properties;
        let icon = match item.kind {
            ItemKind::Mute => Icon::Mute,
            _ => Icon::Paperclip,
        };
        let content = NodeContent::Button {
            icon: Some(icon),
            label: Self::label(item),
        };
        let mut node = RenderNode::new(item.id, item.kind, content);
        if item.kind == ItemKind::File {
            let (background, text) = button_palette(props.text("style"));
            node.style.background = Some(background);
            node.style.text_color = Some(text);
        }
        node.style.shadow = props.flag("shadow");
        if props.flag("rounded") {
            node.style.rounding = Rounding::Full;
        }
        if item.kind == ItemKind::Mute && props.flag("hidden") {
            if ctx.is_playback() {
                node.concealed = true;
            } else {
                node.style.opacity = 0.5;
            }
        }
        if ctx.is_playback() {
            if let Some(url) = non_empty(props.url()) {
                node.affordances.push(Affordance::OpenUrl(url));
            }
        }
        finish(self, node, item, ctx)
    }

    fn layout(&self, item: &AnnotationItem, ctx: &RenderContext) -> Layout {
        let mut rect = ctx.base_rect(item);
        let metrics = single_line_metrics(rect.height, true);
        rect.width = estimate_text_width(Self::label(item).chars().count(), &metrics, true);
        Layout {
            rect,
            metrics: Some(metrics),
        }
    }
}

/// Buttons that seek the host player.
pub struct NavigationRenderer;

impl ItemRenderer for NavigationRenderer {
    fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
        let props = &item.properties;
        let content = NodeContent::Button {
            icon: None,
            label: props.display_label().to_string(),
        };
        let mut node = RenderNode::new(item.id, item.kind, content);
        let (background, text) = button_palette(props.text("style"));
        node.style.background = Some(background);
        node.style.text_color = Some(text);
        node.style.shadow = props.flag("shadow");
        if props.flag("rounded") {
            node.style.rounding = Rounding::Full;
        }
        if ctx.is_playback() {
            node.affordances.extend(seek_affordance(props, ctx));
        }
        finish(self, node, item, ctx)
    }

    fn layout(&self, item: &AnnotationItem, ctx: &RenderContext) -> Layout {
        let mut rect = ctx.base_rect(item);
        let metrics = single_line_metrics(rect.height, true);
        let chars = item.properties.display_label().chars().count();
        rect.width = estimate_text_width(chars, &metrics, false);
        Layout {
            rect,
            metrics: Some(metrics),
        }
    }
}

/// Deprecated single-line text.
pub struct TextRenderer;

impl ItemRenderer for TextRenderer {
    fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
        let props = &item.properties;
        let content = NodeContent::Text {
            lines: vec![props.display_label().to_string()],
        };
        let mut node = RenderNode::new(item.id, item.kind, content);
        node.style = NodeStyle::from_text_properties(props);
        node.style.text_shadow = props.flag("shadow");
        if ctx.is_playback() {
            if let Some(url) = non_empty(props.url()) {
                node.affordances.push(Affordance::OpenUrl(url));
            }
        }
        finish(self, node, item, ctx)
    }

    fn layout(&self, item: &AnnotationItem, ctx: &RenderContext) -> Layout {
        let mut rect = ctx.base_rect(item);
        let metrics = single_line_metrics(rect.height, false);
        let chars = item.properties.display_label().chars().count();
        rect.width = estimate_text_width(chars, &metrics, false);
        Layout {
            rect,
            metrics: Some(metrics),
        }
    }
}

/// Multi-row text blocks.
pub struct TextBlockRenderer;

impl ItemRenderer for TextBlockRenderer {
    fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
        let props = &item.properties;
        let content = NodeContent::Text {
            lines: text_lines(props),
        };
        let mut node = RenderNode::new(item.id, item.kind, content);
        node.style = NodeStyle::from_text_properties(props);
        node.style.text_shadow = props.flag("shadow");
        if props.flag("rounded") {
            node.style.rounding = Rounding::Em(0.3);
        }
        if ctx.is_playback() {
            if let Some(url) = non_empty(props.url()) {
                node.affordances.push(Affordance::OpenUrl(url));
            }
            node.affordances.extend(seek_affordance(props, ctx));
        }
        finish(self, node, item, ctx)
    }

    fn layout(&self, item: &AnnotationItem, ctx: &RenderContext) -> Layout {
        let lines = text_lines(&item.properties);
        let mut rect = ctx.base_rect(item);
        let metrics = text_block_metrics(rect.height, lines.len());
        rect.width = estimate_text_width(longest_line(&lines), &metrics, false);
        Layout {
            rect,
            metrics: Some(metrics),
        }
    }
}

/// Rectangles and circles.
pub struct ShapeRenderer;

impl ItemRenderer for ShapeRenderer {
    fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
        let props = &item.properties;
        let shape = match props.text("shape") {
            "circle" => ShapeKind::Circle,
            _ => ShapeKind::Rectangle,
        };
        let mut node = RenderNode::new(item.id, item.kind, NodeContent::Shape { shape });
        node.style.background = parse_color(props.text("bgcolor"));
        node.style.border = border_from(props);
        node.style.opacity = NodeStyle::opacity_from(props);
        node.style.shadow = props.flag("shadow");
        node.style.rounding = match shape {
            ShapeKind::Circle => Rounding::Full,
            ShapeKind::Rectangle if props.flag("rounded") => Rounding::Em(1.0),
            ShapeKind::Rectangle => Rounding::Square,
        };
        if ctx.is_playback() {
            if let Some(url) = non_empty(props.text("gotourl")) {
                node.affordances.push(Affordance::OpenUrl(url));
            }
            node.affordances.extend(seek_affordance(props, ctx));
        }
        finish(self, node, item, ctx)
    }

    fn layout(&self, item: &AnnotationItem, ctx: &RenderContext) -> Layout {
        Layout::rect(ctx.base_rect(item))
    }
}

/// Pulsing hotspots that open a popover or modal.
pub struct HotspotRenderer;

impl ItemRenderer for HotspotRenderer {
    fn render(&self, item: &AnnotationItem, ctx: &RenderContext) -> RenderNode {
        let props = &item.properties;
        let title = match props.text("formattedtitle") {
            "" => props.text("title"),
            text => text,
        }
        .to_string();
        let content = NodeContent::Hotspot {
            title: title.clone(),
            color: parse_color(props.text("color")),
        };
        let mut node = RenderNode::new(item.id, item.kind, content);
        node.style.opacity = NodeStyle::opacity_from(props);
        node.style.rounding = Rounding::Full;
        node.style.shadow = true;
        if ctx.is_playback() {
            let body = props.content_text().to_string();
            let url = non_empty(props.url());
            node.affordances.push(if props.flag("usemodal") {
                Affordance::Modal { title, body, url }
            } else {
                Affordance::Popover {
                    title,
                    body,
                    url,
                    open_by_default: props.flag("openbydefault"),
                }
            });
        }
        finish(self, node, item, ctx)
    }

    fn layout(&self, item: &AnnotationItem, ctx: &RenderContext) -> Layout {
        let mut rect = ctx.base_rect(item);
        rect.height = rect.width;
        Layout::rect(rect)
    }
}
