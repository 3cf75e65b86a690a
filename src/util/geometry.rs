// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Overlay geometry is persisted as percentages of the canvas and laid out
//! in pixels. This module converts between the two spaces and derives the
//! font metrics of text-like items from their height.

/// Width and height of a container in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn aspect(&self) -> f64 {
        if self.height <= 0.0 {
            return 0.0;
        }
        self.width / self.height
    }
}

/// Axis-aligned rectangle in canvas pixels, origin at the canvas top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }

    /// Whether the rectangle lies fully inside a container of the given size.
    pub fn fits_within(&self, container: Size) -> bool {
        self.left >= 0.0
            && self.top >= 0.0
            && self.right() <= container.width
            && self.bottom() <= container.height
    }
}

/// Rectangle expressed as percentages of a container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PercentRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PercentRect {
    /// Snap near-edge values so playback layouts do not show hairline gaps.
    pub fn snapped(&self) -> Self {
        let mut out = *self;
        if out.left < 0.01 {
            out.left = 0.0;
        }
        if out.top < 0.01 {
            out.top = 0.0;
        }
        if out.width > 99.5 {
            out.width = 100.0;
        }
        if out.height > 99.5 {
            out.height = 100.0;
        }
        out
    }
}

/// Convert a pixel rectangle to percentages of the container.
///
/// Negative top/left are clamped to 0 before conversion.
pub fn to_percent(rect: &PixelRect, container: Size) -> PercentRect {
    if container.is_empty() {
        return PercentRect::default();
    }
    PercentRect {
        left: rect.left.max(0.0) / container.width * 100.0,
        top: rect.top.max(0.0) / container.height * 100.0,
        width: rect.width / container.width * 100.0,
        height: rect.height / container.height * 100.0,
    }
}

/// Convert a percentage rectangle to pixels of the container.
pub fn to_pixel(rect: &PercentRect, container: Size) -> PixelRect {
    PixelRect {
        left: rect.left / 100.0 * container.width,
        top: rect.top / 100.0 * container.height,
        width: rect.width / 100.0 * container.width,
        height: rect.height / 100.0 * container.height,
    }
}

/// How an item's box reacts to layout and resize gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// Width and height are independent
    Free,
    /// Height follows the intrinsic aspect ratio of the content
    AspectLocked,
    /// Always as tall as wide
    Square,
    /// Not resizable at all
    Fixed,
    /// Intrinsic width, height drives button-styled text
    Button,
    /// Intrinsic width, height drives single-line text
    Text,
    /// Intrinsic width, height is shared across text rows
    TextBlock,
}

/// Font metrics derived from an element height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    /// Row height before the glyph scale factor is applied
    pub base_size: f64,
    pub font_size: f64,
    pub line_height: f64,
    pub padding_x: f64,
    /// Uniform padding around multi-row blocks
    pub padding_y: f64,
}

/// Metrics for single-line text or button-styled items.
pub fn single_line_metrics(height: f64, button: bool) -> TextMetrics {
    let base = height.max(0.0);
    TextMetrics {
        base_size: base,
        font_size: if button { base * 0.7 } else { base * 0.9 },
        line_height: base,
        padding_x: if button { base * 0.5 } else { base * 0.3 },
        padding_y: 0.0,
    }
}

/// Metrics for multi-row text blocks sharing the element height.
pub fn text_block_metrics(height: f64, rows: usize) -> TextMetrics {
    let height = height.max(0.0);
    if rows <= 1 {
        return single_line_metrics(height, false);
    }
    let row_height = height / rows as f64;
    let padding = row_height * 0.3;
    let base = (height - padding * 2.0) / rows as f64;
    TextMetrics {
        base_size: base,
        font_size: base * 0.9,
        line_height: base,
        padding_x: padding,
        padding_y: padding,
    }
}

/// Rough content width of a text-like item.
///
/// Glyph advance is approximated as 0.55 em; an icon adds one em.
pub fn estimate_text_width(chars: usize, metrics: &TextMetrics, icon: bool) -> f64 {
    let glyphs = chars as f64 * metrics.font_size * 0.55;
    let icon_width = if icon { metrics.font_size * 1.25 } else { 0.0 };
    glyphs + icon_width + metrics.padding_x * 2.0
}

/// Place the overlay canvas inside its wrapper.
///
/// In fullscreen-like state the canvas keeps the video aspect ratio and is
/// letterboxed; otherwise it fills the wrapper.
pub fn fit_canvas(container: Size, video_aspect: f64, fullscreen: bool) -> PixelRect {
    let full = PixelRect::new(0.0, 0.0, container.width, container.height);
    if !fullscreen || container.is_empty() || video_aspect <= 0.0 {
        return full;
    }
    let container_aspect = container.aspect();
    if container_aspect > video_aspect {
        let width = container.height * video_aspect;
        PixelRect::new((container.width - width) / 2.0, 0.0, width, container.height)
    } else if container_aspect < video_aspect {
        let height = container.width / video_aspect;
        PixelRect::new(0.0, (container.height - height) / 2.0, container.width, height)
    } else {
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_pixel_roundtrip() {
        let container = Size::new(1920.0, 1080.0);
        let rect = PixelRect::new(960.0, 540.0, 192.0, 108.0);

        let percent = to_percent(&rect, container);
        assert!((percent.left - 50.0).abs() < 1e-9);
        assert!((percent.width - 10.0).abs() < 1e-9);

        let back = to_pixel(&percent, container);
        assert!((back.left - rect.left).abs() < 0.0001);
        assert!((back.top - rect.top).abs() < 0.0001);
        assert!((back.height - rect.height).abs() < 0.0001);
    }

    #[test]
    fn test_negative_origin_clamped() {
        let container = Size::new(200.0, 100.0);
        let percent = to_percent(&PixelRect::new(-15.0, -3.0, 50.0, 50.0), container);
        assert_eq!(percent.left, 0.0);
        assert_eq!(percent.top, 0.0);
        assert_eq!(percent.width, 25.0);
    }

    #[test]
    fn test_empty_container() {
        let percent = to_percent(&PixelRect::new(1.0, 1.0, 1.0, 1.0), Size::default());
        assert_eq!(percent, PercentRect::default());
    }

    #[test]
    fn test_single_line_metrics() {
        let text = single_line_metrics(40.0, false);
        assert!((text.font_size - 36.0).abs() < 1e-9);
        assert!((text.padding_x - 12.0).abs() < 1e-9);

        let button = single_line_metrics(40.0, true);
        assert!((button.font_size - 28.0).abs() < 1e-9);
        assert!((button.padding_x - 20.0).abs() < 1e-9);
        assert_eq!(button.line_height, 40.0);
    }

    #[test]
    fn test_text_block_metrics() {
        // 3 rows in 90px: row 30px, padding 9px, effective (90 - 18) / 3 = 24px
        let metrics = text_block_metrics(90.0, 3);
        assert!((metrics.padding_y - 9.0).abs() < 1e-9);
        assert!((metrics.base_size - 24.0).abs() < 1e-9);
        assert!((metrics.font_size - 21.6).abs() < 1e-9);

        let single = text_block_metrics(30.0, 1);
        assert_eq!(single.padding_y, 0.0);
        assert_eq!(single.base_size, 30.0);
    }

    #[test]
    fn test_fit_canvas_letterbox() {
        // Wider container: pillarbox left/right
        let rect = fit_canvas(Size::new(2000.0, 900.0), 16.0 / 9.0, true);
        assert!((rect.width - 1600.0).abs() < 1e-9);
        assert!((rect.left - 200.0).abs() < 1e-9);
        assert_eq!(rect.top, 0.0);

        // Taller container: letterbox top/bottom
        let rect = fit_canvas(Size::new(1600.0, 1200.0), 16.0 / 9.0, true);
        assert!((rect.height - 900.0).abs() < 1e-9);
        assert!((rect.top - 150.0).abs() < 1e-9);

        // Not fullscreen: fill
        let rect = fit_canvas(Size::new(1600.0, 1200.0), 16.0 / 9.0, false);
        assert_eq!(rect, PixelRect::new(0.0, 0.0, 1600.0, 1200.0));
    }

    #[test]
    fn test_snapped() {
        let snapped = PercentRect { left: 0.005, top: 3.0, width: 99.7, height: 50.0 }.snapped();
        assert_eq!(snapped.left, 0.0);
        assert_eq!(snapped.top, 3.0);
        assert_eq!(snapped.width, 100.0);
        assert_eq!(snapped.height, 50.0);
    }
}
