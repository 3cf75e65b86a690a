// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The canonical in-memory item list.
//!
//! Everything else (the rendered scene, the timeline strip, the persisted
//! JSON) is derived from the store.

use crate::error::{OverlayError, Result};
use crate::models::item::{AnnotationItem, GroupId, IdGenerator, ItemId, ItemKind, Properties, BASELINE_Z};
use crate::models::segment::Segment;
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Direction of a layer (z-order) change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerDirection {
    Up,
    Down,
}

/// Replacement property bag coming from the item form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch {
    pub properties: Properties,
}

impl PropertyPatch {
    pub fn new(properties: Properties) -> Self {
        Self { properties }
    }
}

/// Ordered collection of overlay items with unique ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemStore {
    items: Vec<AnnotationItem>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store, dropping items whose id was already seen.
    pub fn from_items(items: Vec<AnnotationItem>) -> Self {
        let mut store = Self::new();
        for item in items {
            if let Err(e) = store.add(item) {
                log::warn!("Skipping stored item: {}", e);
            }
        }
        store
    }

    /// Parse the persisted item list.
    pub fn try_from_json(json: &str) -> Result<Self> {
        let items: Vec<AnnotationItem> = serde_json::from_str(json)?;
        Ok(Self::from_items(items))
    }

    /// Parse the persisted item list; malformed or empty input gives an
    /// empty store.
    pub fn from_json(json: &str) -> Self {
        if json.trim().is_empty() {
            return Self::new();
        }
        match Self::try_from_json(json) {
            Ok(store) => store,
            Err(e) => {
                log::warn!("Malformed item list, starting empty: {}", e);
                Self::new()
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.items)?)
    }

    pub fn items(&self) -> &[AnnotationItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotationItem> {
        self.items.iter()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ItemId) -> Option<&AnnotationItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut AnnotationItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn add(&mut self, item: AnnotationItem) -> Result<()> {
        if self.contains(item.id) {
            return Err(OverlayError::DuplicateId(item.id));
        }
        self.items.push(item);
        Ok(())
    }

    /// Replace the property bag of an item.
    pub fn update(&mut self, id: ItemId, patch: PropertyPatch) -> Result<()> {
        let item = self.get_mut(id).ok_or(OverlayError::ItemNotFound(id))?;
        item.properties = patch.properties;
        let (start, end) = (item.properties.start, item.properties.end);
        item.set_interval(start, end);
        Ok(())
    }

    /// Remove items, returning the ones that existed.
    pub fn remove(&mut self, ids: &[ItemId]) -> Vec<AnnotationItem> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|i| ids.contains(&i.id));
        self.items = kept;
        removed
    }

    /// Replace the whole list, e.g. when restoring a snapshot.
    pub fn replace_all(&mut self, other: ItemStore) {
        self.items = other.items;
    }

    /// Highest z-index in use, or the baseline when empty.
    pub fn top_layer(&self) -> i32 {
        self.items.iter().map(|i| i.z_index()).max().unwrap_or(BASELINE_Z)
    }

    /// Lowest z-index in use, or the baseline when empty.
    pub fn bottom_layer(&self) -> i32 {
        self.items.iter().map(|i| i.z_index()).min().unwrap_or(BASELINE_Z)
    }

    /// Items from the bottom layer up. Ties keep insertion order.
    pub fn sorted_by_layer(&self) -> Vec<&AnnotationItem> {
        let mut sorted: Vec<&AnnotationItem> = self.items.iter().collect();
        sorted.sort_by_key(|i| i.z_index());
        sorted
    }

    fn layer_ranks(&self) -> Vec<ItemId> {
        self.sorted_by_layer().into_iter().map(|i| i.id).collect()
    }

    pub fn group_members(&self, group: GroupId) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|i| i.group() == Some(group))
            .map(|i| i.id)
            .collect()
    }

    pub fn groups_in_use(&self) -> HashSet<GroupId> {
        self.items.iter().filter_map(|i| i.group()).collect()
    }

    /// Clone items under new ids, starting at `at`.
    ///
    /// The copies keep their offsets relative to the earliest selected start
    /// and are layered above everything else. Groups are remapped so copies
    /// share a new group among themselves only.
    pub fn duplicate<R: Rng>(
        &mut self,
        ids: &[ItemId],
        at: f64,
        id_gen: &mut IdGenerator,
        rng: &mut R,
    ) -> Vec<ItemId> {
        let mut sources: Vec<AnnotationItem> = self
            .sorted_by_layer()
            .into_iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect();
        if sources.is_empty() {
            return Vec::new();
        }

        let earliest = sources
            .iter()
            .map(|i| i.start())
            .fold(f64::INFINITY, f64::min);
        let top = self.top_layer();
        let mut taken_groups = self.groups_in_use();
        let mut group_map: HashMap<GroupId, GroupId> = HashMap::new();
        let mut created = Vec::with_capacity(sources.len());

        for (i, mut copy) in sources.drain(..).enumerate() {
            let mut id = id_gen.next_item();
            while self.contains(id) {
                id = id_gen.next_item();
            }
            copy.id = id;

            let offset = copy.start() - earliest;
            copy.shift_to(at + offset);
            copy.position.z_index = top + 1 + i as i32;

            if let Some(group) = copy.group() {
                let mapped = *group_map.entry(group).or_insert_with(|| loop {
                    let candidate = GroupId(group.0.wrapping_add(rng.gen_range(1..=100)));
                    if !taken_groups.contains(&candidate) {
                        taken_groups.insert(candidate);
                        break candidate;
                    }
                });
                copy.position.group = Some(mapped);
            }

            created.push(id);
            self.items.push(copy);
        }
        created
    }

    /// Swap layers with the neighbour above or below. Returns false at the
    /// top or bottom rank.
    pub fn reorder(&mut self, id: ItemId, direction: LayerDirection) -> bool {
        let ranks = self.layer_ranks();
        self.swap_with_neighbour(&ranks, id, direction, &[])
    }

    fn swap_with_neighbour(
        &mut self,
        ranks: &[ItemId],
        id: ItemId,
        direction: LayerDirection,
        blocked: &[ItemId],
    ) -> bool {
        let Some(pos) = ranks.iter().position(|r| *r == id) else {
            return false;
        };
        let neighbour = match direction {
            LayerDirection::Up => ranks.get(pos + 1),
            LayerDirection::Down => pos.checked_sub(1).and_then(|p| ranks.get(p)),
        };
        let Some(&neighbour) = neighbour else {
            return false;
        };
        if blocked.contains(&neighbour) {
            return false;
        }

        let (Some(z_self), Some(z_other)) = (
            self.get(id).map(|i| i.z_index()),
            self.get(neighbour).map(|i| i.z_index()),
        ) else {
            return false;
        };
        let (new_self, new_other) = if z_self == z_other {
            match direction {
                LayerDirection::Up => (z_other + 1, z_other),
                LayerDirection::Down => (z_other - 1, z_other),
            }
        } else {
            (z_other, z_self)
        };
        if let Some(item) = self.get_mut(id) {
            item.position.z_index = new_self;
        }
        if let Some(item) = self.get_mut(neighbour) {
            item.position.z_index = new_other;
        }
        true
    }

    /// Move a selection one layer. Returns the number of swaps made.
    ///
    /// A selection that already forms a contiguous block at the top (or
    /// bottom) is left alone.
    pub fn reorder_batch(&mut self, ids: &[ItemId], direction: LayerDirection) -> usize {
        let ranks = self.layer_ranks();
        let mut positions: Vec<usize> = ranks
            .iter()
            .enumerate()
            .filter(|(_, id)| ids.contains(id))
            .map(|(pos, _)| pos)
            .collect();
        if positions.is_empty() {
            return 0;
        }
        positions.sort_unstable();

        let first = positions[0];
        let last = positions[positions.len() - 1];
        let contiguous = last - first + 1 == positions.len();
        let at_extreme = match direction {
            LayerDirection::Up => last == ranks.len() - 1,
            LayerDirection::Down => first == 0,
        };
        if contiguous && at_extreme {
            return 0;
        }

        let mut order: Vec<ItemId> = positions.iter().map(|p| ranks[*p]).collect();
        if direction == LayerDirection::Up {
            order.reverse();
        }

        let mut swaps = 0;
        for id in order {
            let ranks = self.layer_ranks();
            if self.swap_with_neighbour(&ranks, id, direction, ids) {
                swaps += 1;
            }
        }
        swaps
    }

    pub fn group(&mut self, ids: &[ItemId], group: GroupId) {
        for item in self.items.iter_mut().filter(|i| ids.contains(&i.id)) {
            item.position.group = Some(group);
        }
    }

    pub fn ungroup(&mut self, ids: &[ItemId]) {
        for item in self.items.iter_mut().filter(|i| ids.contains(&i.id)) {
            item.position.group = None;
        }
    }

    /// Record the intrinsic duration of a media item and shorten its
    /// interval to fit. Returns whether the interval changed.
    pub fn apply_media_duration(&mut self, id: ItemId, duration: f64) -> Result<bool> {
        let item = self.get_mut(id).ok_or(OverlayError::ItemNotFound(id))?;
        if !duration.is_finite() || duration <= 0.0 {
            return Ok(false);
        }
        item.properties.duration = Some(duration);
        if item.duration() > duration {
            let start = item.start();
            item.set_interval(start, start + duration);
            return Ok(true);
        }
        Ok(false)
    }

    /// Items whose interval overlaps the segment.
    pub fn in_segment<'a>(&'a self, segment: &'a Segment) -> impl Iterator<Item = &'a AnnotationItem> {
        let window = segment.interval();
        self.items.iter().filter(move |i| i.interval().overlaps(&window))
    }
}
