// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Undo/redo history of the editing session.
//!
//! Each entry is a full serialized copy of the item list plus the selection
//! and playhead at the time, so restoring never depends on diffs.

use crate::error::Result;
use crate::models::item::ItemId;
use crate::models::store::ItemStore;
use std::time::SystemTime;

/// Serialized state of the store at one point of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSnapshot {
    pub items_serialized: String,
    /// Selected items when the snapshot was taken
    pub active_ids: Vec<ItemId>,
    pub playhead_time: f64,
    pub taken_at: SystemTime,
}

impl TrackingSnapshot {
    pub fn capture(store: &ItemStore, active_ids: &[ItemId], playhead_time: f64) -> Result<Self> {
        Ok(Self {
            items_serialized: store.to_json()?,
            active_ids: active_ids.to_vec(),
            playhead_time,
            taken_at: SystemTime::now(),
        })
    }

    /// Rebuild the item list stored in this snapshot.
    pub fn restore(&self) -> ItemStore {
        ItemStore::from_json(&self.items_serialized)
    }
}

/// Linear history with a cursor; committing after an undo drops the redo
/// tail.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<TrackingSnapshot>,
    index: usize,
}

impl History {
    /// Start a history whose base state is `base`.
    pub fn new(base: TrackingSnapshot) -> Self {
        Self {
            snapshots: vec![base],
            index: 0,
        }
    }

    /// Record a new state after an edit.
    pub fn commit(&mut self, snapshot: TrackingSnapshot) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        self.index = self.snapshots.len() - 1;
    }

    /// Step back; `None` at the base state.
    pub fn undo(&mut self) -> Option<&TrackingSnapshot> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.snapshots.get(self.index)
    }

    /// Step forward; `None` at the tip.
    pub fn redo(&mut self) -> Option<&TrackingSnapshot> {
        if self.index + 1 >= self.snapshots.len() {
            return None;
        }
        self.index += 1;
        self.snapshots.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn current(&self) -> &TrackingSnapshot {
        &self.snapshots[self.index]
    }

    /// The state the session was loaded (or last saved) with.
    pub fn oldest(&self) -> &TrackingSnapshot {
        &self.snapshots[0]
    }

    /// Forget everything and start again from `base`.
    pub fn reset(&mut self, base: TrackingSnapshot) {
        self.snapshots.clear();
        self.snapshots.push(base);
        self.index = 0;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::{AnnotationItem, ItemKind, Properties};

    fn snapshot(count: u64, playhead: f64) -> TrackingSnapshot {
        let mut store = ItemStore::new();
        for id in 0..count {
            store
                .add(AnnotationItem::new(ItemId(id), ItemKind::Shape, Properties::new(0.0, 1.0)))
                .unwrap();
        }
        TrackingSnapshot::capture(&store, &[], playhead).unwrap()
    }

    #[test]
    fn test_undo_redo_boundaries() {
        let mut history = History::new(snapshot(0, 0.0));
        assert!(!history.can_undo());
        assert!(history.undo().is_none());

        history.commit(snapshot(1, 1.0));
        history.commit(snapshot(2, 2.0));
        assert_eq!(history.undo().unwrap().playhead_time, 1.0);
        assert_eq!(history.undo().unwrap().playhead_time, 0.0);
        assert!(history.undo().is_none());

        assert_eq!(history.redo().unwrap().playhead_time, 1.0);
        assert_eq!(history.redo().unwrap().playhead_time, 2.0);
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_commit_truncates_redo_tail() {
        let mut history = History::new(snapshot(0, 0.0));
        history.commit(snapshot(1, 1.0));
        history.commit(snapshot(2, 2.0));
        history.undo();
        history.undo();

        history.commit(snapshot(3, 3.0));
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.current().restore().len(), 3);
        assert_eq!(history.oldest().playhead_time, 0.0);
    }

    #[test]
    fn test_reset() {
        let mut history = History::new(snapshot(0, 0.0));
        history.commit(snapshot(1, 1.0));
        history.reset(snapshot(1, 5.0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.oldest().playhead_time, 5.0);
        assert!(!history.can_undo());
    }
}
