// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The set of items the editor is acting on.

use crate::models::item::ItemId;

/// Coarse state of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Single(ItemId),
    Multi,
}

/// Ordered selection; the most recently added item is the primary one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: Vec<ItemId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        match self.ids.as_slice() {
            [] => SelectionState::Idle,
            [only] => SelectionState::Single(*only),
            _ => SelectionState::Multi,
        }
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn primary(&self) -> Option<ItemId> {
        self.ids.last().copied()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Replace the selection.
    pub fn set(&mut self, ids: &[ItemId]) {
        self.ids.clear();
        self.extend(ids);
    }

    pub fn extend(&mut self, ids: &[ItemId]) {
        for id in ids {
            if !self.ids.contains(id) {
                self.ids.push(*id);
            }
        }
    }

    pub fn remove(&mut self, ids: &[ItemId]) {
        self.ids.retain(|id| !ids.contains(id));
    }

    /// Drop ids that no longer exist.
    pub fn retain(&mut self, mut keep: impl FnMut(ItemId) -> bool) {
        self.ids.retain(|id| keep(*id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        let mut selection = Selection::new();
        assert_eq!(selection.state(), SelectionState::Idle);

        selection.set(&[ItemId(1)]);
        assert_eq!(selection.state(), SelectionState::Single(ItemId(1)));

        selection.extend(&[ItemId(2), ItemId(1)]);
        assert_eq!(selection.state(), SelectionState::Multi);
        assert_eq!(selection.ids(), &[ItemId(1), ItemId(2)]);
        assert_eq!(selection.primary(), Some(ItemId(2)));

        selection.remove(&[ItemId(1)]);
        assert_eq!(selection.state(), SelectionState::Single(ItemId(2)));
        selection.clear();
        assert!(selection.is_empty());
    }
}
