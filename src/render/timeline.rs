// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Timeline strip layout: one bar per item under the video.

use crate::models::item::{AnnotationItem, ItemId, ItemKind};
use crate::models::segment::Segment;
use crate::models::store::ItemStore;
use crate::util::time::round_to_two;

/// Bar of one item. `left` and `width` are percentages of the segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineBar {
    pub id: ItemId,
    pub kind: ItemKind,
    pub label: String,
    pub start: f64,
    pub end: f64,
    pub left: f64,
    pub width: f64,
    /// Row index from the top; higher layers come first
    pub row: usize,
    pub active: bool,
}

/// Short label shown on timeline bars and in lists.
pub fn item_label(item: &AnnotationItem) -> String {
    let props = &item.properties;
    let label = props.display_label();
    let label = if label.is_empty() {
        match props.text("formattedtitle") {
            "" => props.text("title"),
            title => title,
        }
    } else {
        label
    };
    match label.lines().next().map(str::trim) {
        Some(first) if !first.is_empty() => first.to_string(),
        _ => item.kind.label().to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineStrip {
    pub start: f64,
    pub end: f64,
    pub bars: Vec<TimelineBar>,
}

impl TimelineStrip {
    pub fn build(store: &ItemStore, segment: &Segment, selection: &[ItemId]) -> Self {
        let mut items: Vec<&AnnotationItem> = store.in_segment(segment).collect();
        items.sort_by_key(|i| std::cmp::Reverse(i.z_index()));

        let bars = items
            .into_iter()
            .enumerate()
            .map(|(row, item)| {
                let clamped = segment.clamp_interval(item.interval());
                let left = segment.percent_of(clamped.start);
                let width = segment.percent_of(clamped.end) - left;
                TimelineBar {
                    id: item.id,
                    kind: item.kind,
                    label: item_label(item),
                    start: item.start(),
                    end: item.end(),
                    left,
                    width,
                    row,
                    active: selection.contains(&item.id),
                }
            })
            .collect();

        Self {
            start: segment.start,
            end: segment.end,
            bars,
        }
    }

    pub fn set_active(&mut self, selection: &[ItemId]) {
        for bar in &mut self.bars {
            bar.active = selection.contains(&bar.id);
        }
    }

    pub fn bar(&self, id: ItemId) -> Option<&TimelineBar> {
        self.bars.iter().find(|b| b.id == id)
    }

    pub fn rows(&self) -> usize {
        self.bars.len()
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Time under a horizontal position given as a 0..1 fraction.
    pub fn time_at(&self, fraction: f64) -> f64 {
        round_to_two(self.start + fraction.clamp(0.0, 1.0) * self.duration())
    }

    /// Seconds represented by a horizontal distance in pixels.
    pub fn seconds_per_pixel(&self, strip_width: f64) -> f64 {
        if strip_width <= 0.0 {
            return 0.0;
        }
        self.duration() / strip_width
    }
}
