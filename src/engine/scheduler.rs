// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Visibility and activation scheduling.
//!
//! On every time update the scheduler decides which items are visible,
//! shows and hides them on the overlay surface, keeps embedded media in step
//! with the host player and coordinates host muting for mute markers.
//!
//! The first tick after a reset establishes the state of every item. After
//! that only membership changes fire, so repeated ticks at the same time are
//! free of side effects.

use crate::engine::media::MediaElement;
use crate::engine::player::{HostPlayer, PlayerEvent};
use crate::models::item::{Interval, ItemId, ItemKind};
use crate::models::segment::Segment;
use crate::models::store::ItemStore;
use std::collections::HashSet;

/// Surface the scheduler shows and hides items on.
pub trait OverlaySurface {
    fn set_visible(&mut self, id: ItemId, visible: bool);
    fn media_mut(&mut self, id: ItemId) -> Option<&mut dyn MediaElement>;
    fn media_ids(&self) -> Vec<ItemId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Next tick sets the state of every item unconditionally
    Primed,
    /// Only visibility changes are applied
    Tracking,
}

/// What the tick did to the host's mute state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MuteAction {
    #[default]
    Unchanged,
    Muted,
    Unmuted,
}

/// Side effects of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub shown: Vec<ItemId>,
    pub hidden: Vec<ItemId>,
    pub mute: MuteAction,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.shown.is_empty() && self.hidden.is_empty() && self.mute == MuteAction::Unchanged
    }
}

#[derive(Debug, Clone)]
struct Tracked {
    id: ItemId,
    kind: ItemKind,
    interval: Interval,
}

/// Drives item visibility from player time.
#[derive(Debug, Clone)]
pub struct ActivationScheduler {
    tracked: Vec<Tracked>,
    activated: HashSet<ItemId>,
    phase: SchedulerPhase,
    has_mute: bool,
    muted_by_overlay: bool,
    drift_threshold: f64,
}

impl ActivationScheduler {
    pub fn new(store: &ItemStore, segment: &Segment, drift_threshold: f64) -> Self {
        let mut scheduler = Self {
            tracked: Vec::new(),
            activated: HashSet::new(),
            phase: SchedulerPhase::Primed,
            has_mute: false,
            muted_by_overlay: false,
            drift_threshold,
        };
        scheduler.read_store(store, segment);
        scheduler
    }

    /// Track the items overlapping `segment`, with intervals clamped to it.
    fn read_store(&mut self, store: &ItemStore, segment: &Segment) {
        self.tracked = store
            .in_segment(segment)
            .map(|item| Tracked {
                id: item.id,
                kind: item.kind,
                interval: segment.clamp_interval(item.interval()),
            })
            .collect();
        self.has_mute = self.tracked.iter().any(|t| t.kind == ItemKind::Mute);
    }

    /// Re-read intervals after the scene was rebuilt.
    ///
    /// All media are paused and the next tick re-establishes every item.
    pub fn reload(&mut self, store: &ItemStore, segment: &Segment, surface: &mut dyn OverlaySurface) {
        self.read_store(store, segment);
        self.activated.clear();
        self.phase = SchedulerPhase::Primed;
        self.pause_all(surface);
        log::debug!("Scheduler reloaded with {} items", self.tracked.len());
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn is_active(&self, id: ItemId) -> bool {
        self.activated.contains(&id)
    }

    pub fn active_ids(&self) -> Vec<ItemId> {
        self.tracked
            .iter()
            .filter(|t| self.activated.contains(&t.id))
            .map(|t| t.id)
            .collect()
    }

    pub fn muted_by_overlay(&self) -> bool {
        self.muted_by_overlay
    }

    fn tracked(&self, id: ItemId) -> Option<&Tracked> {
        self.tracked.iter().find(|t| t.id == id)
    }

    /// Apply visibility for host time `t`.
    pub fn tick(
        &mut self,
        t: f64,
        player: &mut dyn HostPlayer,
        surface: &mut dyn OverlaySurface,
    ) -> TickReport {
        let mut report = TickReport::default();
        let primed = self.phase == SchedulerPhase::Primed;
        let host_paused = player.is_paused();
        if primed {
            // Media built by a rebuild start at normal speed
            self.on_rate_change(player.playback_rate(), surface);
        }

        let changes: Vec<(ItemId, bool)> = self
            .tracked
            .iter()
            .filter_map(|item| {
                let visible = item.interval.contains(t);
                let active = self.activated.contains(&item.id);
                if primed || visible != active {
                    Some((item.id, visible))
                } else {
                    None
                }
            })
            .collect();

        for (id, visible) in changes {
            if visible {
                self.show(id, t, host_paused, surface);
                report.shown.push(id);
            } else {
                self.hide(id, surface);
                report.hidden.push(id);
            }
        }
        self.phase = SchedulerPhase::Tracking;

        report.mute = self.coordinate_mute(player);
        if !host_paused {
            self.correct_drift(t, surface);
        }
        if !report.is_empty() {
            log::debug!(
                "t={:.2}: shown {:?}, hidden {:?}, mute {:?}",
                t,
                report.shown,
                report.hidden,
                report.mute
            );
        }
        report
    }

    fn show(&mut self, id: ItemId, t: f64, host_paused: bool, surface: &mut dyn OverlaySurface) {
        surface.set_visible(id, true);
        self.activated.insert(id);
        let Some(item) = self.tracked(id) else {
            return;
        };
        if !item.kind.is_media() {
            return;
        }
        let local = t - item.interval.start;
        if let Some(media) = surface.media_mut(id) {
            media.set_current_time(local);
            if host_paused {
                media.pause();
            } else {
                media.play();
            }
        }
    }

    fn hide(&mut self, id: ItemId, surface: &mut dyn OverlaySurface) {
        surface.set_visible(id, false);
        self.activated.remove(&id);
        if let Some(media) = surface.media_mut(id) {
            media.pause();
        }
    }

    fn coordinate_mute(&mut self, player: &mut dyn HostPlayer) -> MuteAction {
        if !self.has_mute {
            return MuteAction::Unchanged;
        }
        let mute_active = self
            .tracked
            .iter()
            .any(|t| t.kind == ItemKind::Mute && self.activated.contains(&t.id));

        if mute_active {
            if !player.is_muted() {
                player.mute();
                self.muted_by_overlay = true;
                return MuteAction::Muted;
            }
        } else if self.muted_by_overlay {
            player.un_mute();
            self.muted_by_overlay = false;
            return MuteAction::Unmuted;
        }
        MuteAction::Unchanged
    }

    /// Reset active media that drifted too far from host time. Returns the
    /// corrected ids.
    pub fn correct_drift(&self, host_time: f64, surface: &mut dyn OverlaySurface) -> Vec<ItemId> {
        let mut corrected = Vec::new();
        for item in self.tracked.iter().filter(|t| t.kind.is_media()) {
            if !self.activated.contains(&item.id) {
                continue;
            }
            let Some(media) = surface.media_mut(item.id) else {
                continue;
            };
            let expected = host_time - item.interval.start;
            if (media.current_time() - expected).abs() > self.drift_threshold {
                media.set_current_time(expected);
                corrected.push(item.id);
            }
        }
        if !corrected.is_empty() {
            log::debug!("Corrected media drift for {:?}", corrected);
        }
        corrected
    }

    /// An embedded clip started playing on its own.
    pub fn on_media_playing(&self, id: ItemId, host_time: f64, surface: &mut dyn OverlaySurface) {
        let Some(item) = self.tracked(id) else {
            return;
        };
        if let Some(media) = surface.media_mut(id) {
            let expected = host_time - item.interval.start;
            if (media.current_time() - expected).abs() > self.drift_threshold {
                media.set_current_time(expected);
            }
        }
    }

    pub fn on_rate_change(&self, rate: f64, surface: &mut dyn OverlaySurface) {
        for id in surface.media_ids() {
            if let Some(media) = surface.media_mut(id) {
                media.set_playback_rate(rate);
            }
        }
    }

    /// Jump active media to their local time for the new host position.
    pub fn on_seek(&self, host_time: f64, surface: &mut dyn OverlaySurface) {
        for item in self.tracked.iter().filter(|t| t.kind.is_media()) {
            if !self.activated.contains(&item.id) {
                continue;
            }
            if let Some(media) = surface.media_mut(item.id) {
                media.set_current_time(host_time - item.interval.start);
            }
        }
    }

    /// Host resumed: active media resume with it.
    pub fn on_play(&self, host_time: f64, surface: &mut dyn OverlaySurface) {
        for item in self.tracked.iter().filter(|t| t.kind.is_media()) {
            if !self.activated.contains(&item.id) {
                continue;
            }
            if let Some(media) = surface.media_mut(item.id) {
                media.set_current_time(host_time - item.interval.start);
                media.play();
            }
        }
    }

    pub fn on_paused(&self, surface: &mut dyn OverlaySurface) {
        self.pause_all(surface);
    }

    pub fn on_ended(&self, surface: &mut dyn OverlaySurface) {
        self.pause_all(surface);
    }

    fn pause_all(&self, surface: &mut dyn OverlaySurface) {
        for id in surface.media_ids() {
            if let Some(media) = surface.media_mut(id) {
                media.pause();
            }
        }
    }

    /// Dispatch one player event. Time updates and seeks tick the
    /// scheduler and return its report.
    pub fn handle(
        &mut self,
        event: PlayerEvent,
        player: &mut dyn HostPlayer,
        surface: &mut dyn OverlaySurface,
    ) -> Option<TickReport> {
        match event {
            PlayerEvent::TimeUpdate(t) => Some(self.tick(t, player, surface)),
            PlayerEvent::Seek(t) => {
                let report = self.tick(t, player, surface);
                self.on_seek(t, surface);
                Some(report)
            }
            PlayerEvent::RateChange(rate) => {
                self.on_rate_change(rate, surface);
                None
            }
            PlayerEvent::Playing(t) => {
                let report = self.tick(t, player, surface);
                self.on_play(t, surface);
                Some(report)
            }
            PlayerEvent::Paused => {
                self.on_paused(surface);
                None
            }
            PlayerEvent::Ended => {
                self.on_ended(surface);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::media::ClockMedia;
    use crate::engine::player::SimulatedPlayer;
    use crate::models::item::{AnnotationItem, Properties};
    use std::collections::HashMap;

    #[derive(Default)]
    struct TestSurface {
        visible: HashMap<ItemId, bool>,
        media: HashMap<ItemId, ClockMedia>,
        visibility_calls: usize,
    }

    impl OverlaySurface for TestSurface {
        fn set_visible(&mut self, id: ItemId, visible: bool) {
            self.visible.insert(id, visible);
            self.visibility_calls += 1;
        }

        fn media_mut(&mut self, id: ItemId) -> Option<&mut dyn MediaElement> {
            match self.media.get_mut(&id) {
                Some(media) => Some(media),
                None => None,
            }
        }

        fn media_ids(&self) -> Vec<ItemId> {
            self.media.keys().copied().collect()
        }
    }

    fn store_with(items: &[(u64, ItemKind, f64, f64)]) -> (ItemStore, TestSurface) {
        let mut store = ItemStore::new();
        let mut surface = TestSurface::default();
        for (id, kind, start, end) in items {
            store
                .add(AnnotationItem::new(ItemId(*id), *kind, Properties::new(*start, *end)))
                .unwrap();
            if kind.is_media() {
                surface.media.insert(ItemId(*id), ClockMedia::new(None));
            }
        }
        (store, surface)
    }

    #[test]
    fn test_show_then_hide_paused_video() {
        let (store, mut surface) = store_with(&[(1, ItemKind::Video, 10.0, 15.0)]);
        let mut scheduler = ActivationScheduler::new(&store, &Segment::new(0.0, 60.0), 0.5);
        let mut player = SimulatedPlayer::new(0.0, 60.0);

        let report = scheduler.tick(12.0, &mut player, &mut surface);
        assert_eq!(report.shown, vec![ItemId(1)]);
        assert_eq!(surface.visible[&ItemId(1)], true);
        let media = &surface.media[&ItemId(1)];
        assert!(media.is_paused());
        assert_eq!(media.current_time(), 2.0);

        let report = scheduler.tick(16.0, &mut player, &mut surface);
        assert_eq!(report.hidden, vec![ItemId(1)]);
        assert_eq!(surface.visible[&ItemId(1)], false);
        assert!(surface.media[&ItemId(1)].is_paused());
        assert!(!scheduler.is_active(ItemId(1)));
    }

    #[test]
    fn test_media_plays_when_host_playing() {
        let (store, mut surface) = store_with(&[(1, ItemKind::Audio, 10.0, 15.0)]);
        let mut scheduler = ActivationScheduler::new(&store, &Segment::new(0.0, 60.0), 0.5);
        let mut player = SimulatedPlayer::new(0.0, 60.0);
        player.play();

        scheduler.tick(11.0, &mut player, &mut surface);
        assert!(!surface.media[&ItemId(1)].is_paused());
    }

    #[test]
    fn test_tick_is_idempotent() {
        let (store, mut surface) = store_with(&[
            (1, ItemKind::Shape, 0.0, 5.0),
            (2, ItemKind::Mute, 2.0, 8.0),
            (3, ItemKind::Video, 4.0, 9.0),
        ]);
        let mut scheduler = ActivationScheduler::new(&store, &Segment::new(0.0, 60.0), 0.5);
        let mut player = SimulatedPlayer::new(0.0, 60.0);

        let first = scheduler.tick(4.5, &mut player, &mut surface);
        assert_eq!(first.shown.len(), 3);
        assert_eq!(first.mute, MuteAction::Muted);
        let calls = surface.visibility_calls;

        let second = scheduler.tick(4.5, &mut player, &mut surface);
        assert!(second.is_empty());
        assert_eq!(surface.visibility_calls, calls);
    }

    #[test]
    fn test_first_tick_establishes_hidden_items() {
        let (store, mut surface) = store_with(&[(1, ItemKind::Shape, 10.0, 20.0)]);
        let mut scheduler = ActivationScheduler::new(&store, &Segment::new(0.0, 60.0), 0.5);
        let mut player = SimulatedPlayer::new(0.0, 60.0);

        let report = scheduler.tick(0.0, &mut player, &mut surface);
        assert_eq!(report.hidden, vec![ItemId(1)]);
        assert_eq!(scheduler.phase(), SchedulerPhase::Tracking);

        // Not active, so a later out-of-range tick does nothing
        assert!(scheduler.tick(1.0, &mut player, &mut surface).is_empty());
    }

    #[test]
    fn test_unmute_only_when_overlay_muted() {
        let (store, mut surface) = store_with(&[(1, ItemKind::Mute, 2.0, 4.0)]);
        let mut scheduler = ActivationScheduler::new(&store, &Segment::new(0.0, 60.0), 0.5);
        let mut player = SimulatedPlayer::new(0.0, 60.0);

        scheduler.tick(3.0, &mut player, &mut surface);
        assert!(player.is_muted());
        assert!(scheduler.muted_by_overlay());

        let report = scheduler.tick(5.0, &mut player, &mut surface);
        assert_eq!(report.mute, MuteAction::Unmuted);
        assert!(!player.is_muted());

        // The viewer muted the host themselves: leave it alone
        player.mute();
        scheduler.tick(3.0, &mut player, &mut surface);
        scheduler.tick(5.0, &mut player, &mut surface);
        assert!(player.is_muted());
    }

    #[test]
    fn test_no_mute_items_never_touch_host() {
        let (store, mut surface) = store_with(&[(1, ItemKind::Shape, 0.0, 4.0)]);
        let mut scheduler = ActivationScheduler::new(&store, &Segment::new(0.0, 60.0), 0.5);
        let mut player = SimulatedPlayer::new(0.0, 60.0);
        player.mute();

        let report = scheduler.tick(1.0, &mut player, &mut surface);
        assert_eq!(report.mute, MuteAction::Unchanged);
        assert!(player.is_muted());
    }

    #[test]
    fn test_seek_and_drift_correction() {
        let (store, mut surface) = store_with(&[(1, ItemKind::Video, 10.0, 30.0)]);
        let mut scheduler = ActivationScheduler::new(&store, &Segment::new(0.0, 60.0), 0.5);
        let mut player = SimulatedPlayer::new(0.0, 60.0);

        scheduler.tick(12.0, &mut player, &mut surface);
        scheduler.on_seek(20.0, &mut surface);
        assert_eq!(surface.media[&ItemId(1)].current_time(), 10.0);

        // Within threshold: untouched
        assert!(scheduler.correct_drift(20.4, &mut surface).is_empty());
        assert_eq!(scheduler.correct_drift(21.0, &mut surface), vec![ItemId(1)]);
        assert_eq!(surface.media[&ItemId(1)].current_time(), 11.0);

        // A clip resuming on its own snaps back to the host clock
        surface.media.get_mut(&ItemId(1)).unwrap().set_current_time(3.0);
        scheduler.on_media_playing(ItemId(1), 25.0, &mut surface);
        assert_eq!(surface.media[&ItemId(1)].current_time(), 15.0);
        scheduler.on_media_playing(ItemId(1), 25.2, &mut surface);
        assert_eq!(surface.media[&ItemId(1)].current_time(), 15.0);
    }

    #[test]
    fn test_intervals_clamped_to_segment() {
        let (store, mut surface) = store_with(&[
            (1, ItemKind::Video, 0.0, 30.0),
            (2, ItemKind::Shape, 70.0, 80.0),
        ]);
        let segment = Segment::new(10.0, 60.0);
        let mut scheduler = ActivationScheduler::new(&store, &segment, 0.5);
        let mut player = SimulatedPlayer::new(10.0, 60.0);

        let report = scheduler.tick(12.0, &mut player, &mut surface);
        assert_eq!(report.shown, vec![ItemId(1)]);
        // Local time counts from the segment start, not the stored start
        assert_eq!(surface.media[&ItemId(1)].current_time(), 2.0);
        assert!(!surface.visible.contains_key(&ItemId(2)));

        scheduler.on_seek(20.0, &mut surface);
        assert_eq!(surface.media[&ItemId(1)].current_time(), 10.0);
        assert!(scheduler.correct_drift(20.2, &mut surface).is_empty());
    }

    #[test]
    fn test_primed_tick_applies_host_rate() {
        let (store, mut surface) = store_with(&[(1, ItemKind::Video, 0.0, 30.0)]);
        let mut scheduler = ActivationScheduler::new(&store, &Segment::new(0.0, 60.0), 0.5);
        let mut player = SimulatedPlayer::new(0.0, 60.0);
        player.set_rate(2.0);

        scheduler.tick(1.0, &mut player, &mut surface);
        assert_eq!(surface.media[&ItemId(1)].playback_rate(), 2.0);

        // Media rebuilt by a render come back at normal speed
        surface.media.insert(ItemId(1), ClockMedia::new(None));
        scheduler.reload(&store, &Segment::new(0.0, 60.0), &mut surface);
        scheduler.tick(1.5, &mut player, &mut surface);
        assert_eq!(surface.media[&ItemId(1)].playback_rate(), 2.0);
    }

    #[test]
    fn test_rate_pause_and_reload() {
        let (store, mut surface) = store_with(&[(1, ItemKind::Video, 0.0, 30.0)]);
        let mut scheduler = ActivationScheduler::new(&store, &Segment::new(0.0, 60.0), 0.5);
        let mut player = SimulatedPlayer::new(0.0, 60.0);
        player.play();

        scheduler.tick(1.0, &mut player, &mut surface);
        scheduler.handle(PlayerEvent::RateChange(1.5), &mut player, &mut surface);
        assert_eq!(surface.media[&ItemId(1)].playback_rate(), 1.5);

        scheduler.handle(PlayerEvent::Paused, &mut player, &mut surface);
        assert!(surface.media[&ItemId(1)].is_paused());

        scheduler.reload(&store, &Segment::new(0.0, 60.0), &mut surface);
        assert_eq!(scheduler.phase(), SchedulerPhase::Primed);
        assert!(scheduler.active_ids().is_empty());
    }
}
