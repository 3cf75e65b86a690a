// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Item editing form model.
//!
//! The form is data driven: each kind lists its fields, the properties
//! panel draws them, and [`ItemForm::to_properties`] turns the edited text
//! back into a property bag.

use crate::error::{OverlayError, Result};
use crate::models::item::{AnnotationItem, ItemKind, Properties};
use crate::models::segment::Segment;
use crate::util::time::{format_timestamp, parse_timestamp, round_to_two};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// How a form field is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput {
    Text,
    Multiline,
    Url,
    Flag,
    Color,
    Number,
    Choice(&'static [&'static str]),
    /// `HH:MM:SS` click-navigation time
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub input: FieldInput,
}

const fn field(key: &'static str, label: &'static str, input: FieldInput) -> FieldSpec {
    FieldSpec { key, label, input }
}

const BUTTON_STYLES: &[&str] = &[
    "btn-primary",
    "btn-secondary",
    "btn-success",
    "btn-danger",
    "btn-warning",
    "btn-info",
    "btn-light",
    "btn-dark",
    "btn-outline-primary",
    "btn-outline-dark",
];

pub const VIDEO_SIZES: &[&str] = &["25", "50", "75", "100"];

pub const VIDEO_POSITIONS: &[&str] = &[
    "top-left",
    "top-center",
    "top-right",
    "center-left",
    "center-center",
    "center-right",
    "bottom-left",
    "bottom-center",
    "bottom-right",
];

const IMAGE_FIELDS: &[FieldSpec] = &[
    field("url", "Image URL", FieldInput::Url),
    field("alttext", "Alternative text", FieldInput::Text),
    field("gotourl", "Link URL", FieldInput::Url),
    field("timestamp", "Go to time", FieldInput::Timestamp),
    field("rounded", "Rounded corners", FieldInput::Flag),
    field("shadow", "Shadow", FieldInput::Flag),
];

const VIDEO_FIELDS: &[FieldSpec] = &[
    field("url", "Video URL", FieldInput::Url),
    field("size", "Size (%)", FieldInput::Choice(VIDEO_SIZES)),
    field("vposition", "Position", FieldInput::Choice(VIDEO_POSITIONS)),
    field("freesize", "Free size", FieldInput::Flag),
    field("dismissable", "Dismissable", FieldInput::Flag),
    field("muted", "Muted", FieldInput::Flag),
    field("rounded", "Rounded corners", FieldInput::Flag),
    field("shadow", "Shadow", FieldInput::Flag),
];

const AUDIO_FIELDS: &[FieldSpec] = &[field("url", "Audio URL", FieldInput::Url)];

const FILE_FIELDS: &[FieldSpec] = &[
    field("url", "File URL", FieldInput::Url),
    field("label", "Label", FieldInput::Text),
    field("style", "Style", FieldInput::Choice(BUTTON_STYLES)),
    field("rounded", "Rounded", FieldInput::Flag),
    field("shadow", "Shadow", FieldInput::Flag),
];

const MUTE_FIELDS: &[FieldSpec] = &[field("hidden", "Hide from viewers", FieldInput::Flag)];

const NAVIGATION_FIELDS: &[FieldSpec] = &[
    field("label", "Label", FieldInput::Text),
    field("timestamp", "Go to time", FieldInput::Timestamp),
    field("style", "Style", FieldInput::Choice(BUTTON_STYLES)),
    field("rounded", "Rounded", FieldInput::Flag),
    field("shadow", "Shadow", FieldInput::Flag),
];

const TEXT_FIELDS: &[FieldSpec] = &[
    field("label", "Text", FieldInput::Text),
    field("url", "Link URL", FieldInput::Url),
    field("textcolor", "Text color", FieldInput::Color),
    field("bgcolor", "Background", FieldInput::Color),
    field("textfont", "Font", FieldInput::Text),
    field("bold", "Bold", FieldInput::Flag),
    field("italic", "Italic", FieldInput::Flag),
    field("underline", "Underline", FieldInput::Flag),
    field("shadow", "Text shadow", FieldInput::Flag),
    field("borderwidth", "Border width", FieldInput::Text),
    field("bordercolor", "Border color", FieldInput::Color),
];

const TEXTBLOCK_FIELDS: &[FieldSpec] = &[
    field("label", "Text", FieldInput::Multiline),
    field("url", "Link URL", FieldInput::Url),
    field("timestamp", "Go to time", FieldInput::Timestamp),
    field("alignment", "Alignment", FieldInput::Choice(&["left", "center", "right"])),
    field("textcolor", "Text color", FieldInput::Color),
    field("bgcolor", "Background", FieldInput::Color),
    field("textfont", "Font", FieldInput::Text),
    field("bold", "Bold", FieldInput::Flag),
    field("italic", "Italic", FieldInput::Flag),
    field("underline", "Underline", FieldInput::Flag),
    field("rounded", "Rounded", FieldInput::Flag),
    field("shadow", "Text shadow", FieldInput::Flag),
    field("borderwidth", "Border width", FieldInput::Text),
    field("bordercolor", "Border color", FieldInput::Color),
];

const SHAPE_FIELDS: &[FieldSpec] = &[
    field("shape", "Shape", FieldInput::Choice(&["rectangle", "circle"])),
    field("bgcolor", "Fill", FieldInput::Color),
    field("opacity", "Opacity (%)", FieldInput::Number),
    field("borderwidth", "Border width", FieldInput::Text),
    field("bordercolor", "Border color", FieldInput::Color),
    field("rounded", "Rounded", FieldInput::Flag),
    field("shadow", "Shadow", FieldInput::Flag),
    field("gotourl", "Link URL", FieldInput::Url),
    field("timestamp", "Go to time", FieldInput::Timestamp),
];

const HOTSPOT_FIELDS: &[FieldSpec] = &[
    field("title", "Title", FieldInput::Text),
    field("content", "Content", FieldInput::Multiline),
    field("url", "Link URL", FieldInput::Url),
    field("color", "Color", FieldInput::Color),
    field("opacity", "Opacity (%)", FieldInput::Number),
    field("usemodal", "Open in modal", FieldInput::Flag),
    field("openbydefault", "Open by default", FieldInput::Flag),
];

/// Fields offered for a kind, in display order.
pub fn form_fields(kind: ItemKind) -> &'static [FieldSpec] {
    match kind {
        ItemKind::Image => IMAGE_FIELDS,
        ItemKind::Video => VIDEO_FIELDS,
        ItemKind::Audio => AUDIO_FIELDS,
        ItemKind::File => FILE_FIELDS,
        ItemKind::Mute => MUTE_FIELDS,
        ItemKind::Navigation => NAVIGATION_FIELDS,
        ItemKind::Text => TEXT_FIELDS,
        ItemKind::TextBlock => TEXTBLOCK_FIELDS,
        ItemKind::Shape => SHAPE_FIELDS,
        ItemKind::Hotspot => HOTSPOT_FIELDS,
    }
}

/// A time input that only accepts reachable times.
///
/// A rejected entry reverts the text to the last accepted value.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampField {
    pub text: String,
    value: Option<f64>,
}

impl TimestampField {
    pub fn new(value: Option<f64>) -> Self {
        Self {
            text: value.map(format_timestamp).unwrap_or_default(),
            value,
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Accept the current text, or revert it and report why not.
    pub fn commit(&mut self, segment: &Segment) -> Result<Option<f64>> {
        let parsed = parse_timestamp(&self.text).and_then(|value| match value {
            Some(t) => segment.validate_timestamp(t).map(|_| Some(t)),
            None => Ok(None),
        });
        match parsed {
            Ok(value) => {
                self.value = value;
                self.text = value.map(format_timestamp).unwrap_or_default();
                Ok(value)
            }
            Err(e) => {
                self.revert();
                Err(e)
            }
        }
    }

    pub fn revert(&mut self) {
        self.text = self.value.map(format_timestamp).unwrap_or_default();
    }
}

/// Editable state of the add/edit dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemForm {
    pub kind: ItemKind,
    pub start: TimestampField,
    pub end: TimestampField,
    pub timestamp: TimestampField,
    /// Text of every other field, flags as "0"/"1"
    pub values: BTreeMap<&'static str, String>,
    base: Properties,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl ItemForm {
    /// Blank form for a new item starting at `at`.
    pub fn for_new(kind: ItemKind, at: f64, duration: f64, segment: &Segment) -> Self {
        let start = round_to_two(at.clamp(segment.start, segment.end));
        let end = round_to_two((start + duration).min(segment.end));
        let mut values = BTreeMap::new();
        for spec in form_fields(kind) {
            let default = match (spec.key, spec.input) {
                (_, FieldInput::Choice(options)) => options.first().copied().unwrap_or(""),
                ("opacity", _) => "100",
                (_, FieldInput::Flag) => "0",
                _ => "",
            };
            values.insert(spec.key, default.to_string());
        }
        if kind == ItemKind::Video {
            values.insert("size", "50".to_string());
            values.insert("vposition", "center-center".to_string());
        }
        Self {
            kind,
            start: TimestampField::new(Some(start)),
            end: TimestampField::new(Some(end)),
            timestamp: TimestampField::new(None),
            values,
            base: Properties::new(start, end),
        }
    }

    /// Form pre-filled from an existing item.
    pub fn for_item(item: &AnnotationItem) -> Self {
        let props = &item.properties;
        let mut values = BTreeMap::new();
        for spec in form_fields(item.kind) {
            let text = match spec.key {
                "content" => props.content_text().to_string(),
                key => props.rest.get(key).map(value_text).unwrap_or_default(),
            };
            values.insert(spec.key, text);
        }
        Self {
            kind: item.kind,
            start: TimestampField::new(Some(item.start())),
            end: TimestampField::new(Some(item.end())),
            timestamp: TimestampField::new(props.timestamp()),
            values,
            base: props.clone(),
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        form_fields(self.kind)
    }

    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set_value(&mut self, key: &'static str, text: impl Into<String>) {
        self.values.insert(key, text.into());
    }

    /// Validate the times and build the property bag.
    ///
    /// Properties the form does not show are kept from the edited item.
    pub fn to_properties(&mut self, segment: &Segment) -> Result<Properties> {
        let start = self
            .start
            .commit(segment)?
            .ok_or_else(|| OverlayError::InvalidTimestamp(String::new()))?;
        let end = self
            .end
            .commit(segment)?
            .ok_or_else(|| OverlayError::InvalidTimestamp(String::new()))?;
        if start > end {
            return Err(OverlayError::InvalidInterval { start, end });
        }
        let timestamp = self.timestamp.commit(segment)?;

        let mut props = self.base.clone();
        props.start = start;
        props.end = end;
        for spec in form_fields(self.kind) {
            let text = self.value(spec.key).to_string();
            match spec.input {
                FieldInput::Timestamp => {
                    props.set(spec.key, timestamp.map(format_timestamp).unwrap_or_default());
                }
                _ if spec.key == "content" => {
                    props.set("content", json!({ "text": text, "format": 1 }));
                }
                _ => props.set(spec.key, text),
            }
        }
        Ok(props)
    }
}
