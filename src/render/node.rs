// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Rendered representation of a single item.

use crate::models::item::{GroupId, ItemId, ItemKind};
use crate::render::style::{NodeStyle, Rgba};
use crate::util::geometry::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Paperclip,
    Mute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Circle,
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Image { url: String, alt: String },
    Media { url: String, audio: bool, muted: bool },
    Button { icon: Option<Icon>, label: String },
    Text { lines: Vec<String> },
    Shape { shape: ShapeKind },
    Hotspot { title: String, color: Option<Rgba> },
}

/// A playback interaction a node offers.
#[derive(Debug, Clone, PartialEq)]
pub enum Affordance {
    /// Seek the host player to this time
    SeekTo(f64),
    OpenUrl(String),
    /// Anchored popover with rich content
    Popover {
        title: String,
        body: String,
        url: Option<String>,
        open_by_default: bool,
    },
    /// Centered modal dialog with rich content
    Modal {
        title: String,
        body: String,
        url: Option<String>,
    },
    /// Viewer may close the node for the rest of playback
    Dismiss,
}

/// One laid-out item of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub id: ItemId,
    pub kind: ItemKind,
    pub rect: PixelRect,
    pub z: i32,
    pub group: Option<GroupId>,
    /// Set by the scheduler while the playhead is inside the interval
    pub visible: bool,
    /// Selected in the editor
    pub active: bool,
    /// Hidden from viewers but still placed (e.g. hidden mute markers)
    pub concealed: bool,
    pub content: NodeContent,
    pub style: NodeStyle,
    pub affordances: Vec<Affordance>,
    pub resizable: bool,
}

impl RenderNode {
    pub fn new(id: ItemId, kind: ItemKind, content: NodeContent) -> Self {
        Self {
            id,
            kind,
            rect: PixelRect::default(),
            z: 0,
            group: None,
            visible: false,
            active: false,
            concealed: false,
            content,
            style: NodeStyle::default(),
            affordances: Vec::new(),
            resizable: true,
        }
    }

    /// Whether clicks in playback do something.
    pub fn is_interactive(&self) -> bool {
        !self.affordances.is_empty()
    }

    pub fn seek_target(&self) -> Option<f64> {
        self.affordances.iter().find_map(|a| match a {
            Affordance::SeekTo(t) => Some(*t),
            _ => None,
        })
    }

    pub fn link(&self) -> Option<&str> {
        self.affordances.iter().find_map(|a| match a {
            Affordance::OpenUrl(url) => Some(url.as_str()),
            _ => None,
        })
    }

    pub fn is_painted(&self) -> bool {
        self.visible && !self.concealed
    }
}
