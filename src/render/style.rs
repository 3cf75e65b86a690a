// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Visual styling derived from item properties.
//!
//! Colors arrive as CSS strings and button styles as theme class names; both
//! are resolved here into plain values the painter can use directly.

use crate::models::item::Properties;
use crate::util::geometry::TextMetrics;

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Scale alpha by `opacity` in 0..=1.
    pub fn with_opacity(self, opacity: f64) -> Self {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a: alpha, ..self }
    }
}

fn hex_pair(text: &str) -> Option<u8> {
    u8::from_str_radix(text, 16).ok()
}

fn channel(text: &str) -> Option<u8> {
    let text = text.trim();
    if let Some(p) = text.strip_suffix('%') {
        let p: f64 = p.trim().parse().ok()?;
        return Some((p.clamp(0.0, 100.0) * 2.55).round() as u8);
    }
    let v: f64 = text.parse().ok()?;
    Some(v.clamp(0.0, 255.0).round() as u8)
}

/// Parse a CSS color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`,
/// `transparent` or a handful of names.
pub fn parse_color(text: &str) -> Option<Rgba> {
    let text = text.trim().to_ascii_lowercase();
    if text.is_empty() {
        return None;
    }

    if let Some(hex) = text.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        return match hex.len() {
            3 => {
                let mut c = hex.chars().map(|ch| ch.to_digit(16).map(|d| (d * 17) as u8));
                Some(Rgba::rgb(c.next()??, c.next()??, c.next()??))
            }
            6 => Some(Rgba::rgb(
                hex_pair(&hex[0..2])?,
                hex_pair(&hex[2..4])?,
                hex_pair(&hex[4..6])?,
            )),
            8 => Some(Rgba::new(
                hex_pair(&hex[0..2])?,
                hex_pair(&hex[2..4])?,
                hex_pair(&hex[4..6])?,
                hex_pair(&hex[6..8])?,
            )),
            _ => None,
        };
    }

    if let Some(args) = text
        .strip_prefix("rgba(")
        .or_else(|| text.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = args.split(',').collect();
        let alpha = match parts.len() {
            3 => 255,
            4 => {
                let a: f64 = parts[3].trim().parse().ok()?;
                (a.clamp(0.0, 1.0) * 255.0).round() as u8
            }
            _ => return None,
        };
        return Some(Rgba::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha));
    }

    match text.as_str() {
        "transparent" => Some(Rgba::TRANSPARENT),
        "black" => Some(Rgba::BLACK),
        "white" => Some(Rgba::WHITE),
        "red" => Some(Rgba::rgb(255, 0, 0)),
        "green" => Some(Rgba::rgb(0, 128, 0)),
        "blue" => Some(Rgba::rgb(0, 0, 255)),
        "yellow" => Some(Rgba::rgb(255, 255, 0)),
        "orange" => Some(Rgba::rgb(255, 165, 0)),
        "gray" | "grey" => Some(Rgba::rgb(128, 128, 128)),
        _ => None,
    }
}

/// Parse a CSS pixel length such as `2px` or `2`.
pub fn parse_px(text: &str) -> Option<f64> {
    let text = text.trim();
    let number = text.strip_suffix("px").unwrap_or(text);
    number.trim().parse().ok().filter(|v: &f64| v.is_finite())
}

/// Background and foreground of a themed button class.
pub fn button_palette(class: &str) -> (Rgba, Rgba) {
    let class = class.trim();
    let (outline, name) = match class.strip_prefix("btn-outline-") {
        Some(name) => (true, name),
        None => (false, class.strip_prefix("btn-").unwrap_or(class)),
    };
    let (base, on_base) = match name {
        "primary" => (Rgba::rgb(13, 110, 253), Rgba::WHITE),
        "secondary" => (Rgba::rgb(108, 117, 125), Rgba::WHITE),
        "success" => (Rgba::rgb(25, 135, 84), Rgba::WHITE),
        "danger" => (Rgba::rgb(220, 53, 69), Rgba::WHITE),
        "warning" => (Rgba::rgb(255, 193, 7), Rgba::BLACK),
        "info" => (Rgba::rgb(13, 202, 240), Rgba::BLACK),
        "light" => (Rgba::rgb(248, 249, 250), Rgba::BLACK),
        "dark" => (Rgba::rgb(33, 37, 41), Rgba::WHITE),
        _ => (Rgba::rgb(233, 236, 239), Rgba::BLACK),
    };
    if outline {
        (Rgba::TRANSPARENT, base)
    } else {
        (base, on_base)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "center" => TextAlign::Center,
            "right" => TextAlign::Right,
            _ => TextAlign::Left,
        }
    }
}

/// Corner treatment of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Rounding {
    #[default]
    Square,
    /// Radius in em of the node's own font size
    Em(f64),
    /// Fully round (circles, pills)
    Full,
}

impl Rounding {
    /// Corner radius in pixels for a node of the given size.
    pub fn radius(self, font_size: f64, width: f64, height: f64) -> f64 {
        match self {
            Rounding::Square => 0.0,
            Rounding::Em(em) => em * font_size,
            Rounding::Full => width.min(height) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: f64,
    pub color: Rgba,
}

/// Resolved visual style of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStyle {
    pub background: Option<Rgba>,
    pub text_color: Option<Rgba>,
    pub border: Option<Border>,
    pub rounding: Rounding,
    pub shadow: bool,
    pub text_shadow: bool,
    pub opacity: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub font_family: Option<String>,
    pub align: TextAlign,
    /// Font metrics for text-like nodes, derived from the laid-out height
    pub metrics: Option<TextMetrics>,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            background: None,
            text_color: None,
            border: None,
            rounding: Rounding::Square,
            shadow: false,
            text_shadow: false,
            opacity: 1.0,
            bold: false,
            italic: false,
            underline: false,
            font_family: None,
            align: TextAlign::Left,
            metrics: None,
        }
    }
}

impl NodeStyle {
    /// Colors, border and font decoration shared by text-like kinds.
    pub fn from_text_properties(props: &Properties) -> Self {
        let font = props.text("textfont");
        Self {
            background: parse_color(props.text("bgcolor")),
            text_color: parse_color(props.text("textcolor")),
            border: border_from(props),
            bold: props.flag("bold"),
            italic: props.flag("italic"),
            underline: props.flag("underline"),
            font_family: (!font.is_empty()).then(|| font.to_string()),
            align: TextAlign::parse(props.text("alignment")),
            ..Self::default()
        }
    }

    /// Opacity stored as a 0..100 percentage; absent means opaque.
    pub fn opacity_from(props: &Properties) -> f64 {
        props
            .number("opacity")
            .map(|o| (o / 100.0).clamp(0.0, 1.0))
            .unwrap_or(1.0)
    }
}

pub fn border_from(props: &Properties) -> Option<Border> {
    let width = parse_px(props.text("borderwidth")).unwrap_or(0.0);
    if width <= 0.0 {
        return None;
    }
    let color = parse_color(props.text("bordercolor")).unwrap_or(Rgba::BLACK);
    Some(Border { width, color })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(parse_color("#fff"), Some(Rgba::WHITE));
        assert_eq!(parse_color("#0D6EFD"), Some(Rgba::rgb(13, 110, 253)));
        assert_eq!(parse_color("#00000080"), Some(Rgba::new(0, 0, 0, 128)));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("#ggg"), None);
    }

    #[test]
    fn test_parse_functional_colors() {
        assert_eq!(parse_color("rgb(255, 0, 10)"), Some(Rgba::rgb(255, 0, 10)));
        assert_eq!(parse_color("rgba(0,0,0,0.5)"), Some(Rgba::new(0, 0, 0, 128)));
        assert_eq!(parse_color("transparent"), Some(Rgba::TRANSPARENT));
        assert_eq!(parse_color("Grey"), Some(Rgba::rgb(128, 128, 128)));
        assert_eq!(parse_color("rgb(1,2)"), None);
        assert_eq!(parse_color(""), None);
    }

    #[test]
    fn test_button_palette() {
        assert_eq!(button_palette("btn-danger"), (Rgba::rgb(220, 53, 69), Rgba::WHITE));
        assert_eq!(button_palette("btn-outline-dark").0, Rgba::TRANSPARENT);
    }

    #[test]
    fn test_text_style_from_properties() {
        let props = Properties::new(0.0, 1.0)
            .with("bgcolor", "#000")
            .with("bold", "1")
            .with("borderwidth", "2px")
            .with("bordercolor", "red")
            .with("alignment", "center")
            .with("opacity", "40");
        let style = NodeStyle::from_text_properties(&props);
        assert_eq!(style.background, Some(Rgba::BLACK));
        assert!(style.bold && !style.italic);
        assert_eq!(style.border, Some(Border { width: 2.0, color: Rgba::rgb(255, 0, 0) }));
        assert_eq!(style.align, TextAlign::Center);
        assert!((NodeStyle::opacity_from(&props) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_rounding_radius() {
        assert_eq!(Rounding::Full.radius(10.0, 40.0, 20.0), 10.0);
        assert_eq!(Rounding::Em(0.5).radius(10.0, 40.0, 20.0), 5.0);
    }
}
