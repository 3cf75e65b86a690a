// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay item data structures.
//!
//! This module defines the persisted unit of the overlay engine: a typed,
//! timed, positioned item. The JSON layout mirrors the stored item list, so
//! fields this crate does not know about are carried through untouched.

use crate::util::geometry::{to_percent, to_pixel, PercentRect, PixelRect, Size, Sizing};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lowest layer an item is placed on.
pub const BASELINE_Z: i32 = 5;

/// Numbers in the stored JSON sometimes arrive as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Loose {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Loose::Int(v) => Some(*v as f64),
            Loose::Float(v) => Some(*v),
            Loose::Str(s) => s.trim().parse().ok(),
        }
    }
}

fn loose_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Loose::deserialize(deserializer)?;
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| de::Error::custom("expected a number"))
}

fn loose_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()).filter(|v| v.is_finite()))
}

fn loose_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = Loose::deserialize(deserializer)?;
    value
        .as_f64()
        .map(|v| v.round() as i32)
        .ok_or_else(|| de::Error::custom("expected an integer z-index"))
}

/// Unique identifier of an item within the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Loose::deserialize(deserializer)?;
        match value.as_f64() {
            Some(v) if v >= 0.0 && v.fract() == 0.0 => Ok(ItemId(v as u64)),
            _ => Err(de::Error::custom("expected a numeric item id")),
        }
    }
}

/// Identifier shared by items that move and select together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Empty strings and non-numeric tags mean "not grouped".
fn loose_group<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<GroupId>, D::Error> {
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_f64())
        .filter(|v| *v >= 0.0 && v.fract() == 0.0)
        .map(|v| GroupId(v as u64)))
}

/// Hands out time-based ids that never repeat within a session.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids are greater than `id`.
    pub fn observe(&mut self, id: u64) {
        self.last = self.last.max(id);
    }

    pub fn next_raw(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let id = match self.last.checked_add(1) {
            Some(next) => now.max(next),
            // Loaded ids reached the top of the range; count from the clock
            None => now,
        };
        self.last = id;
        id
    }

    pub fn next_item(&mut self) -> ItemId {
        ItemId(self.next_raw())
    }

    pub fn next_group(&mut self) -> GroupId {
        GroupId(self.next_raw())
    }
}

/// Type of overlay item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Image,
    Video,
    Audio,
    File,
    Mute,
    Navigation,
    /// Deprecated single-line text, superseded by text blocks
    Text,
    TextBlock,
    Shape,
    Hotspot,
}

impl ItemKind {
    pub const ALL: [ItemKind; 10] = [
        ItemKind::Image,
        ItemKind::Video,
        ItemKind::Audio,
        ItemKind::File,
        ItemKind::Mute,
        ItemKind::Navigation,
        ItemKind::Text,
        ItemKind::TextBlock,
        ItemKind::Shape,
        ItemKind::Hotspot,
    ];

    /// Kinds offered when authoring new items.
    pub const AUTHORABLE: [ItemKind; 9] = [
        ItemKind::Image,
        ItemKind::Video,
        ItemKind::Audio,
        ItemKind::Mute,
        ItemKind::TextBlock,
        ItemKind::Shape,
        ItemKind::File,
        ItemKind::Navigation,
        ItemKind::Hotspot,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Image => "Image",
            ItemKind::Video => "Video",
            ItemKind::Audio => "Audio",
            ItemKind::File => "Inline file",
            ItemKind::Mute => "Mute",
            ItemKind::Navigation => "Navigation",
            ItemKind::Text => "Text",
            ItemKind::TextBlock => "Text block",
            ItemKind::Shape => "Shape",
            ItemKind::Hotspot => "Hotspot",
        }
    }

    /// Plays an embedded clip whose time follows the host player.
    pub fn is_media(self) -> bool {
        matches!(self, ItemKind::Video | ItemKind::Audio)
    }

    /// Clicking in playback may seek the host to an authored timestamp.
    pub fn supports_timestamp_click(self) -> bool {
        matches!(
            self,
            ItemKind::Image | ItemKind::Shape | ItemKind::TextBlock | ItemKind::Navigation
        )
    }

    /// May render as a click-through link.
    pub fn supports_link(self) -> bool {
        matches!(
            self,
            ItemKind::Image
                | ItemKind::Shape
                | ItemKind::Text
                | ItemKind::TextBlock
                | ItemKind::File
                | ItemKind::Hotspot
        )
    }

    pub fn is_groupable(self) -> bool {
        true
    }

    pub fn is_deprecated(self) -> bool {
        self == ItemKind::Text
    }

    pub fn sizing(self) -> Sizing {
        match self {
            ItemKind::Image | ItemKind::Video => Sizing::AspectLocked,
            ItemKind::Audio => Sizing::Fixed,
            ItemKind::File | ItemKind::Mute | ItemKind::Navigation => Sizing::Button,
            ItemKind::Text => Sizing::Text,
            ItemKind::TextBlock => Sizing::TextBlock,
            ItemKind::Hotspot => Sizing::Square,
            ItemKind::Shape => Sizing::Free,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A CSS-style length as stored in item geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Percent(f64),
    Pixels(f64),
    Auto,
}

impl Default for Length {
    fn default() -> Self {
        Length::Percent(0.0)
    }
}

impl Length {
    /// Resolve against the container extent; `Auto` has no value.
    pub fn resolve(self, extent: f64) -> Option<f64> {
        match self {
            Length::Percent(p) => Some(p / 100.0 * extent),
            Length::Pixels(px) => Some(px),
            Length::Auto => None,
        }
    }

    pub fn as_percent(self) -> Option<f64> {
        match self {
            Length::Percent(p) => Some(p),
            _ => None,
        }
    }

    fn parse(text: &str) -> Option<Length> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("auto") {
            return Some(Length::Auto);
        }
        if let Some(p) = text.strip_suffix('%') {
            return p.trim().parse().ok().map(Length::Percent);
        }
        let px = text.strip_suffix("px").unwrap_or(text);
        px.trim().parse().ok().map(Length::Pixels)
    }
}

impl Serialize for Length {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Length::Percent(p) => serializer.serialize_str(&format!("{}%", p)),
            Length::Pixels(px) => serializer.serialize_str(&format!("{}px", px)),
            Length::Auto => serializer.serialize_str("auto"),
        }
    }
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Loose::deserialize(deserializer)? {
            Loose::Int(v) => Ok(Length::Pixels(v as f64)),
            Loose::Float(v) => Ok(Length::Pixels(v)),
            Loose::Str(s) => {
                Length::parse(&s).ok_or_else(|| de::Error::custom(format!("invalid length '{}'", s)))
            }
        }
    }
}

fn default_width() -> Length {
    Length::Percent(30.0)
}

fn default_height() -> Length {
    Length::Auto
}

fn default_z() -> i32 {
    BASELINE_Z
}

/// Position, size and layering of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub left: Length,
    #[serde(default)]
    pub top: Length,
    #[serde(default = "default_width")]
    pub width: Length,
    #[serde(default = "default_height")]
    pub height: Length,
    #[serde(rename = "z-index", default = "default_z", deserialize_with = "loose_i32")]
    pub z_index: i32,
    #[serde(default, deserialize_with = "loose_group", skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    /// Extra layout hints (e.g. text block `fontSize`) and unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            left: Length::default(),
            top: Length::default(),
            width: default_width(),
            height: default_height(),
            z_index: BASELINE_Z,
            group: None,
            extra: Map::new(),
        }
    }
}

impl Geometry {
    /// Lay the geometry out in pixels.
    ///
    /// `aspect` is width / height of the content, used for `Auto` heights.
    /// Without it an automatic height assumes 16:9 content.
    pub fn resolve(&self, container: Size, aspect: Option<f64>) -> PixelRect {
        let left = self.left.resolve(container.width).unwrap_or(0.0);
        let top = self.top.resolve(container.height).unwrap_or(0.0);
        let width = self.width.resolve(container.width).unwrap_or(0.0);
        let aspect = aspect.filter(|a| *a > 0.0).unwrap_or(16.0 / 9.0);
        let height = self.height.resolve(container.height).unwrap_or(width / aspect);
        PixelRect::new(left, top, width, height)
    }

    /// The four lengths as percentages, if they are all stored that way.
    pub fn percent_rect(&self) -> Option<PercentRect> {
        Some(PercentRect {
            left: self.left.as_percent()?,
            top: self.top.as_percent()?,
            width: self.width.as_percent()?,
            height: self.height.as_percent()?,
        })
    }

    /// Store a pixel layout as canvas percentages.
    pub fn set_from_pixels(&mut self, rect: &PixelRect, container: Size) {
        let percent = to_percent(rect, container);
        self.set_percent(&percent);
    }

    pub fn set_percent(&mut self, percent: &PercentRect) {
        self.left = Length::Percent(percent.left);
        self.top = Length::Percent(percent.top);
        self.width = Length::Percent(percent.width);
        self.height = Length::Percent(percent.height);
    }

    /// Pixel rectangle of the stored percentages, if fully normalized.
    pub fn to_pixels(&self, container: Size) -> Option<PixelRect> {
        self.percent_rect().map(|p| to_pixel(&p, container))
    }

    /// String layout hint stored alongside the geometry.
    pub fn hint(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// Time window of an item, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

/// Type-specific property bag.
///
/// Only the interval is typed; everything else is kept as JSON and read
/// through the accessors by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, deserialize_with = "loose_f64")]
    pub start: f64,
    #[serde(default, deserialize_with = "loose_f64")]
    pub end: f64,
    /// Intrinsic media duration once known
    #[serde(default, deserialize_with = "loose_opt_f64", skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Properties {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            duration: None,
            rest: Map::new(),
        }
    }

    /// Builder-style setter for property values.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.rest.insert(key.to_string(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.rest.insert(key.to_string(), value.into());
    }

    /// String value, empty when absent or not a string.
    pub fn text(&self, key: &str) -> &str {
        self.rest.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Flags are stored as "1"/"0", numbers or booleans.
    pub fn flag(&self, key: &str) -> bool {
        match self.rest.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            Some(Value::String(s)) => s.trim() == "1",
            _ => false,
        }
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.rest.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Authored click-navigation timestamp in seconds.
    pub fn timestamp(&self) -> Option<f64> {
        crate::util::time::parse_timestamp(self.text("timestamp"))
            .ok()
            .flatten()
    }

    /// Label as displayed, preferring the server-formatted variant.
    pub fn display_label(&self) -> &str {
        let formatted = self.text("formattedlabel");
        if formatted.is_empty() {
            self.text("label")
        } else {
            formatted
        }
    }

    /// Rich content of hotspots, stored as `content.text`.
    pub fn content_text(&self) -> &str {
        self.rest
            .get("content")
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn url(&self) -> &str {
        self.text("url")
    }
}

/// One positioned, timed overlay item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationItem {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub position: Geometry,
    #[serde(default)]
    pub properties: Properties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnnotationItem {
    pub fn new(id: ItemId, kind: ItemKind, properties: Properties) -> Self {
        Self {
            id,
            kind,
            position: Geometry::default(),
            properties,
            extra: Map::new(),
        }
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.properties.start, self.properties.end)
    }

    pub fn start(&self) -> f64 {
        self.properties.start
    }

    pub fn end(&self) -> f64 {
        self.properties.end
    }

    pub fn duration(&self) -> f64 {
        self.properties.end - self.properties.start
    }

    /// Set the interval, ordering the bounds so start never exceeds end.
    pub fn set_interval(&mut self, start: f64, end: f64) {
        self.properties.start = start.min(end);
        self.properties.end = start.max(end);
    }

    /// Move the interval to begin at `start`, keeping its length.
    pub fn shift_to(&mut self, start: f64) {
        let duration = self.duration().max(0.0);
        self.set_interval(start, start + duration);
    }

    pub fn z_index(&self) -> i32 {
        self.position.z_index
    }

    pub fn group(&self) -> Option<GroupId> {
        self.position.group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_stored_item() {
        let value = json!({
            "id": "1712345678901",
            "type": "textblock",
            "position": {
                "width": "12.5%", "left": "40px", "top": "3%", "height": "auto",
                "z-index": "7", "group": "", "fontSize": "16px"
            },
            "properties": {"start": "10.00", "end": 15, "label": "Hello", "shadow": "1"},
            "custom": {"keep": true}
        });
        let item: AnnotationItem = serde_json::from_value(value).unwrap();

        assert_eq!(item.id, ItemId(1712345678901));
        assert_eq!(item.kind, ItemKind::TextBlock);
        assert_eq!(item.position.width, Length::Percent(12.5));
        assert_eq!(item.position.left, Length::Pixels(40.0));
        assert_eq!(item.position.height, Length::Auto);
        assert_eq!(item.position.z_index, 7);
        assert_eq!(item.position.group, None);
        assert_eq!(item.position.hint("fontSize"), Some("16px"));
        assert_eq!(item.interval(), Interval::new(10.0, 15.0));
        assert!(item.properties.flag("shadow"));
        assert_eq!(item.properties.display_label(), "Hello");
        assert_eq!(item.extra["custom"], json!({"keep": true}));
    }

    #[test]
    fn test_unknown_fields_roundtrip() {
        let value = json!({
            "id": 1,
            "type": "shape",
            "position": {"left": "1%", "top": "2%", "width": "3%", "height": "4%", "z-index": 6, "rotation": 15},
            "properties": {"start": 1.0, "end": 2.0, "shape": "circle", "nested": {"a": [1, 2]}},
            "annotator": "someone"
        });
        let item: AnnotationItem = serde_json::from_value(value).unwrap();
        let back = serde_json::to_value(&item).unwrap();

        assert_eq!(back["annotator"], json!("someone"));
        assert_eq!(back["position"]["rotation"], json!(15));
        assert_eq!(back["properties"]["nested"], json!({"a": [1, 2]}));
        assert_eq!(back["position"]["left"], json!("1%"));
        assert_eq!(back["position"]["z-index"], json!(6));
    }

    #[test]
    fn test_group_parsing() {
        let item: AnnotationItem = serde_json::from_value(json!({
            "id": 2, "type": "image", "position": {"group": 1700000000000u64}
        }))
        .unwrap();
        assert_eq!(item.group(), Some(GroupId(1700000000000)));
        assert_eq!(item.z_index(), BASELINE_Z);
    }

    #[test]
    fn test_resolve_auto_height() {
        let geometry = Geometry {
            left: Length::Percent(10.0),
            top: Length::Pixels(5.0),
            width: Length::Percent(50.0),
            height: Length::Auto,
            ..Default::default()
        };
        let rect = geometry.resolve(Size::new(800.0, 450.0), Some(2.0));
        assert_eq!(rect, PixelRect::new(80.0, 5.0, 400.0, 200.0));
    }

    #[test]
    fn test_set_interval_orders_bounds() {
        let mut item = AnnotationItem::new(ItemId(1), ItemKind::Shape, Properties::new(0.0, 1.0));
        item.set_interval(8.0, 3.0);
        assert_eq!(item.interval(), Interval::new(3.0, 8.0));
        item.shift_to(10.0);
        assert_eq!(item.interval(), Interval::new(10.0, 15.0));
    }

    #[test]
    fn test_id_generator_unique() {
        let mut ids = IdGenerator::new();
        ids.observe(u64::MAX / 2);
        let a = ids.next_item();
        let b = ids.next_item();
        assert!(b > a);
        assert!(a.0 > u64::MAX / 2);
    }

    #[test]
    fn test_id_generator_past_max() {
        let mut ids = IdGenerator::new();
        ids.observe(u64::MAX);
        let a = ids.next_item();
        let b = ids.next_group();
        assert!(a.0 < u64::MAX);
        assert!(b.0 > a.0);
    }

    #[test]
    fn test_capabilities() {
        assert!(ItemKind::Video.is_media());
        assert!(!ItemKind::Image.is_media());
        assert!(ItemKind::Navigation.supports_timestamp_click());
        assert!(!ItemKind::Hotspot.supports_timestamp_click());
        assert!(ItemKind::Hotspot.supports_link());
        assert_eq!(ItemKind::Mute.sizing(), Sizing::Button);
        assert!(ItemKind::ALL.iter().all(|k| k.is_groupable()));
        assert!(ItemKind::Text.is_deprecated());
        assert!(!ItemKind::AUTHORABLE.iter().any(|k| k.is_deprecated()));
    }
}
