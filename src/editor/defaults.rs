// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Initial geometry of newly added items.

use crate::models::item::{AnnotationItem, ItemKind, Length};
use crate::util::geometry::{PixelRect, Size};
use rand::Rng;
use serde_json::Value;

/// Text block row height in pixels.
const TEXTBLOCK_LINE_PX: f64 = 20.0;

/// Place a new item on the canvas and above every existing layer.
///
/// Items get a small random offset from the top left corner so repeated
/// adds do not stack exactly. Kinds with a natural size override the
/// width and height.
pub fn place_new_item<R: Rng>(
    item: &mut AnnotationItem,
    top_layer: i32,
    canvas: Size,
    jitter: f64,
    rng: &mut R,
) {
    let geometry = &mut item.position;
    geometry.z_index = top_layer + 1;

    let jitter = jitter.max(0.0);
    let (x, y) = if jitter > 0.0 {
        (rng.gen_range(0.0..jitter), rng.gen_range(0.0..jitter))
    } else {
        (0.0, 0.0)
    };
    geometry.left = percent_of(x, canvas.width);
    geometry.top = percent_of(y, canvas.height);

    match item.kind {
        ItemKind::File => set_pixel_size(item, 130.0, 40.0),
        ItemKind::Shape => set_pixel_size(item, 100.0, 100.0),
        ItemKind::Mute => set_pixel_size(item, 40.0, 40.0),
        ItemKind::Audio => {
            set_pixel_size(item, 40.0, 40.0);
            item.position.left = Length::Percent(0.0);
            item.position.top = Length::Percent(0.0);
        }
        ItemKind::TextBlock => {
            let rows = item.properties.text("label").lines().count().max(1);
            let extra = &mut item.position.extra;
            extra.insert("fontSize".into(), Value::from("16px"));
            extra.insert("lineHeight".into(), Value::from("20px"));
            item.position.height = Length::Pixels(rows as f64 * TEXTBLOCK_LINE_PX);
            item.position.width = Length::Auto;
        }
        ItemKind::Hotspot => {
            item.position.width = Length::Percent(5.0);
            item.position.height = Length::Auto;
        }
        ItemKind::Image => item.position.height = Length::Auto,
        ItemKind::Video => {
            if !item.properties.flag("freesize") {
                place_video(item, canvas, None);
            }
        }
        ItemKind::Text | ItemKind::Navigation => {}
    }
}

fn percent_of(px: f64, extent: f64) -> Length {
    if extent > 0.0 {
        Length::Percent(px / extent * 100.0)
    } else {
        Length::Pixels(px)
    }
}

fn set_pixel_size(item: &mut AnnotationItem, width: f64, height: f64) {
    item.position.width = Length::Pixels(width);
    item.position.height = Length::Pixels(height);
}

/// Size and anchor a video from its `size` and `vposition` properties.
///
/// `size` is the width as a share of the canvas; the padding to the
/// anchored edges is 5% of the video width. Size 100 covers the canvas.
pub fn place_video(item: &mut AnnotationItem, canvas: Size, aspect: Option<f64>) {
    if canvas.is_empty() {
        return;
    }
    let size = item.properties.number("size").unwrap_or(50.0).clamp(1.0, 100.0);
    if size >= 100.0 {
        item.position.set_from_pixels(
            &PixelRect::new(0.0, 0.0, canvas.width, canvas.height),
            canvas,
        );
        return;
    }

    let aspect = aspect.filter(|a| *a > 0.0).unwrap_or(16.0 / 9.0);
    let width = canvas.width * size / 100.0;
    let height = (width / aspect).min(canvas.height);
    let padding = width * 0.05;

    let position = item.properties.text("vposition");
    let (vertical, horizontal) = position.split_once('-').unwrap_or(("center", "center"));
    let left = match horizontal {
        "left" => padding,
        "right" => canvas.width - width - padding,
        _ => (canvas.width - width) / 2.0,
    };
    let top = match vertical {
        "top" => padding,
        "bottom" => canvas.height - height - padding,
        _ => (canvas.height - height) / 2.0,
    };

    let rect = PixelRect::new(left.max(0.0), top.max(0.0), width, height);
    item.position.set_from_pixels(&rect, canvas);
}
