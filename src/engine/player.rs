// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Host video player abstraction.

/// Events the host player reports to the overlay engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    /// Playback position changed, in seconds
    TimeUpdate(f64),
    /// The user or the engine jumped to a new position
    Seek(f64),
    RateChange(f64),
    /// Playback resumed at the given position
    Playing(f64),
    Paused,
    Ended,
}

/// The video player the overlays are drawn over.
pub trait HostPlayer {
    fn current_time(&self) -> f64;
    fn seek(&mut self, time: f64);
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn playback_rate(&self) -> f64;
    fn mute(&mut self);
    fn un_mute(&mut self);
    fn is_muted(&self) -> bool;
    /// Width / height of the video, when known.
    fn aspect_ratio(&self) -> Option<f64>;
}

/// A clock-driven player used by the desktop shell and tests.
///
/// Time advances only through [`SimulatedPlayer::advance`]; every state
/// change is queued as a [`PlayerEvent`] for the caller to drain.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    time: f64,
    start: f64,
    end: f64,
    rate: f64,
    paused: bool,
    muted: bool,
    aspect: Option<f64>,
    events: Vec<PlayerEvent>,
}

impl SimulatedPlayer {
    /// Create a paused player covering `[start, end]`.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            time: start,
            start,
            end: end.max(start),
            rate: 1.0,
            paused: true,
            muted: false,
            aspect: Some(16.0 / 9.0),
            events: Vec::new(),
        }
    }

    /// Move the clock forward by `dt` seconds of wall time.
    pub fn advance(&mut self, dt: f64) {
        if self.paused || dt <= 0.0 {
            return;
        }
        self.time += dt * self.rate;
        if self.time >= self.end {
            self.time = self.end;
            self.paused = true;
            self.events.push(PlayerEvent::TimeUpdate(self.time));
            self.events.push(PlayerEvent::Ended);
        } else {
            self.events.push(PlayerEvent::TimeUpdate(self.time));
        }
    }

    pub fn set_rate(&mut self, rate: f64) {
        if rate > 0.0 && rate != self.rate {
            self.rate = rate;
            self.events.push(PlayerEvent::RateChange(rate));
        }
    }


    pub fn bounds(&self) -> (f64, f64) {
        (self.start, self.end)
    }

    /// Take the queued events.
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }
}

impl HostPlayer for SimulatedPlayer {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn seek(&mut self, time: f64) {
        self.time = time.clamp(self.start, self.end);
        self.events.push(PlayerEvent::Seek(self.time));
    }

    fn play(&mut self) {
        if !self.paused {
            return;
        }
        if self.time >= self.end {
            self.time = self.start;
        }
        self.paused = false;
        self.events.push(PlayerEvent::Playing(self.time));
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.events.push(PlayerEvent::Paused);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn mute(&mut self) {
        self.muted = true;
    }

    fn un_mute(&mut self) {
        self.muted = false;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn aspect_ratio(&self) -> Option<f64> {
        self.aspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_emits_time_updates() {
        let mut player = SimulatedPlayer::new(0.0, 10.0);
        player.advance(1.0);
        assert!(player.drain_events().is_empty());

        player.play();
        player.set_rate(2.0);
        player.advance(1.5);
        assert_eq!(
            player.drain_events(),
            vec![
                PlayerEvent::Playing(0.0),
                PlayerEvent::RateChange(2.0),
                PlayerEvent::TimeUpdate(3.0)
            ]
        );
    }

    #[test]
    fn test_end_pauses() {
        let mut player = SimulatedPlayer::new(0.0, 2.0);
        player.play();
        player.drain_events();
        player.advance(5.0);
        assert_eq!(player.drain_events(), vec![PlayerEvent::TimeUpdate(2.0), PlayerEvent::Ended]);
        assert!(player.is_paused());
    }

    #[test]
    fn test_seek_clamps() {
        let mut player = SimulatedPlayer::new(5.0, 10.0);
        player.seek(20.0);
        assert_eq!(player.current_time(), 10.0);
        assert_eq!(player.drain_events(), vec![PlayerEvent::Seek(10.0)]);
    }
}
