// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Authoring interactions: selection, gestures, keyboard commands, item
//! lifecycle and the unsaved-changes guard.

pub mod defaults;
pub mod form;
pub mod selection;
pub mod session;

pub use form::{form_fields, FieldInput, FieldSpec, ItemForm, TimestampField};
pub use selection::{Selection, SelectionState};
pub use session::{EditorSession, PositionInfo};

/// What the view has to redo after an editor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Change {
    #[default]
    None,
    /// Geometry, selection or layer flags changed; nodes can be updated in place
    Relayout,
    /// Items were added, removed or reordered; render from scratch
    Rebuild,
}

impl Change {
    pub fn merge(self, other: Change) -> Change {
        self.max(other)
    }

    pub fn is_none(self) -> bool {
        self == Change::None
    }
}

/// Answer to a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Close,
    /// Unsaved edits; ask before discarding
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Left,
    Right,
    Up,
    Down,
}

impl Arrow {
    fn unit(self) -> (f64, f64) {
        match self {
            Arrow::Left => (-1.0, 0.0),
            Arrow::Right => (1.0, 0.0),
            Arrow::Up => (0.0, -1.0),
            Arrow::Down => (0.0, 1.0),
        }
    }
}

/// Keyboard commands of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Nudge(Arrow),
    Delete,
    Duplicate,
    LayerUp,
    LayerDown,
    Undo,
    Redo,
    Deselect,
}

/// Corner or edge handle grabbed for a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::Top,
        ResizeHandle::TopRight,
        ResizeHandle::Right,
        ResizeHandle::BottomRight,
        ResizeHandle::Bottom,
        ResizeHandle::BottomLeft,
        ResizeHandle::Left,
    ];

    /// Which horizontal and vertical edge the handle moves: -1 for the
    /// left/top edge, 1 for the right/bottom edge, 0 for neither.
    pub fn axes(self) -> (i8, i8) {
        match self {
            ResizeHandle::TopLeft => (-1, -1),
            ResizeHandle::Top => (0, -1),
            ResizeHandle::TopRight => (1, -1),
            ResizeHandle::Right => (1, 0),
            ResizeHandle::BottomRight => (1, 1),
            ResizeHandle::Bottom => (0, 1),
            ResizeHandle::BottomLeft => (-1, 1),
            ResizeHandle::Left => (-1, 0),
        }
    }

    /// Handle position as fractions of the item rectangle.
    pub fn anchor(self) -> (f64, f64) {
        let (x, y) = self.axes();
        ((x as f64 + 1.0) / 2.0, (y as f64 + 1.0) / 2.0)
    }
}

/// Interval edge moved by a timeline trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimEdge {
    Start,
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_merge() {
        assert_eq!(Change::None.merge(Change::Relayout), Change::Relayout);
        assert_eq!(Change::Rebuild.merge(Change::Relayout), Change::Rebuild);
        assert!(Change::default().is_none());
    }

    #[test]
    fn test_handle_anchor() {
        assert_eq!(ResizeHandle::TopLeft.anchor(), (0.0, 0.0));
        assert_eq!(ResizeHandle::Right.anchor(), (1.0, 0.5));
    }
}
