// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Embedded overlay media clips.

use crate::models::item::AnnotationItem;

/// State of one embedded video or audio clip.
pub trait MediaElement {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    /// Local clip time in seconds.
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, time: f64);
    fn set_playback_rate(&mut self, rate: f64);
    fn playback_rate(&self) -> f64;
    /// Intrinsic length, when known.
    fn duration(&self) -> Option<f64>;
    /// Let wall time pass; only clock-driven clips need this.
    fn advance(&mut self, _dt: f64) {}
}

/// Creates media elements for the renderer.
pub trait MediaFactory {
    fn create(&self, item: &AnnotationItem) -> Box<dyn MediaElement>;
}

/// A media clip driven purely by elapsed time.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockMedia {
    time: f64,
    rate: f64,
    paused: bool,
    duration: Option<f64>,
}

impl ClockMedia {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            time: 0.0,
            rate: 1.0,
            paused: true,
            duration,
        }
    }
}

impl MediaElement for ClockMedia {
    fn play(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, time: f64) {
        let time = time.max(0.0);
        self.time = match self.duration {
            Some(d) => time.min(d),
            None => time,
        };
    }

    fn set_playback_rate(&mut self, rate: f64) {
        if rate > 0.0 {
            self.rate = rate;
        }
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn advance(&mut self, dt: f64) {
        if self.paused {
            return;
        }
        let time = self.time + dt * self.rate;
        self.set_current_time(time);
        if self.duration.is_some_and(|d| self.time >= d) {
            self.paused = true;
        }
    }
}

/// Builds [`ClockMedia`] clips sized by the item's known duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockMediaFactory;

impl MediaFactory for ClockMediaFactory {
    fn create(&self, item: &AnnotationItem) -> Box<dyn MediaElement> {
        Box::new(ClockMedia::new(item.properties.duration))
    }
}
