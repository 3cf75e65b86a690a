// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The host video segment overlays are authored against.

use crate::error::{OverlayError, Result};
use crate::models::item::Interval;
use serde::{Deserialize, Serialize};

/// Playable window of the host video plus ranges the viewer never sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub skip_segments: Vec<(f64, f64)>,
}

impl Default for Segment {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 60.0,
            skip_segments: Vec::new(),
        }
    }
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
            skip_segments: Vec::new(),
        }
    }

    pub fn with_skip(mut self, start: f64, end: f64) -> Self {
        self.skip_segments.push((start.min(end), start.max(end)));
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// Whether `t` falls strictly inside one of the skipped ranges.
    pub fn in_skip_segment(&self, t: f64) -> bool {
        self.skip_segments.iter().any(|(s, e)| *s < t && t < *e)
    }

    /// Check that an authored time is reachable in playback.
    pub fn validate_timestamp(&self, t: f64) -> Result<()> {
        if !self.contains(t) {
            return Err(OverlayError::OutsideSegment {
                time: t,
                start: self.start,
                end: self.end,
            });
        }
        if self.in_skip_segment(t) {
            return Err(OverlayError::InSkipSegment { time: t });
        }
        Ok(())
    }

    /// Clamp an interval into the segment, keeping start <= end.
    pub fn clamp_interval(&self, interval: Interval) -> Interval {
        let start = interval.start.clamp(self.start, self.end);
        let end = interval.end.clamp(self.start, self.end);
        Interval::new(start.min(end), start.max(end))
    }

    /// Place `t` as a percentage of the segment width.
    pub fn percent_of(&self, t: f64) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        (t - self.start) / duration * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_timestamp() {
        let segment = Segment::new(10.0, 70.0).with_skip(30.0, 40.0);

        assert!(segment.validate_timestamp(10.0).is_ok());
        assert!(segment.validate_timestamp(70.0).is_ok());
        assert!(matches!(
            segment.validate_timestamp(5.0),
            Err(OverlayError::OutsideSegment { .. })
        ));
        assert!(matches!(
            segment.validate_timestamp(35.0),
            Err(OverlayError::InSkipSegment { .. })
        ));
        // Skip bounds themselves are still reachable
        assert!(segment.validate_timestamp(30.0).is_ok());
    }

    #[test]
    fn test_clamp_interval() {
        let segment = Segment::new(0.0, 20.0);
        let clamped = segment.clamp_interval(Interval::new(-5.0, 25.0));
        assert_eq!(clamped, Interval::new(0.0, 20.0));

        let clamped = segment.clamp_interval(Interval::new(30.0, 40.0));
        assert_eq!(clamped, Interval::new(20.0, 20.0));
    }

    #[test]
    fn test_percent_of() {
        let segment = Segment::new(10.0, 20.0);
        assert_eq!(segment.percent_of(15.0), 50.0);
        assert_eq!(Segment::new(5.0, 5.0).percent_of(5.0), 0.0);
    }
}
