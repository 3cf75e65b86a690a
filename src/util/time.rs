// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Time formatting and parsing helpers.

use crate::error::{OverlayError, Result};

/// Round to two decimal places.
pub fn round_to_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format seconds as `[H:]MM:SS.ss` (or `[H:]MM:SS` when rounded).
pub fn format_time(seconds: f64, rounded: bool) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor();
    let minutes = ((seconds - hours * 3600.0) / 60.0).floor();
    let sec = seconds - hours * 3600.0 - minutes * 60.0;

    let mut out = String::new();
    if hours > 0.0 {
        out.push_str(&format!("{}:", hours as u64));
    }
    out.push_str(&format!("{:02}:", minutes as u64));
    if rounded {
        out.push_str(&format!("{:02}", sec.round() as u64));
    } else {
        let sec = round_to_two(sec);
        if sec < 10.0 {
            out.push('0');
        }
        out.push_str(&trim_float(sec));
    }
    out
}

/// Format seconds as `HH:MM:SS`, the format of authored timestamps.
pub fn format_hms(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Format seconds as `HH:MM:SS`, keeping up to two decimals of the seconds.
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = round_to_two(seconds.max(0.0));
    let whole = seconds.floor();
    let fraction = round_to_two(seconds - whole);
    let base = format_hms(whole);
    if fraction > 0.0 {
        let decimals = trim_float(fraction);
        format!("{}{}", base, decimals.trim_start_matches('0'))
    } else {
        base
    }
}

/// Parse an authored `HH:MM:SS` timestamp.
///
/// Empty text means "no timestamp" and yields `Ok(None)`.
pub fn parse_timestamp(text: &str) -> Result<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 3 {
        return Err(OverlayError::InvalidTimestamp(text.to_string()));
    }
    let mut total = 0.0;
    for (part, scale) in parts.iter().zip([3600.0, 60.0, 1.0]) {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| OverlayError::InvalidTimestamp(text.to_string()))?;
        if value < 0.0 || !value.is_finite() {
            return Err(OverlayError::InvalidTimestamp(text.to_string()));
        }
        total += value * scale;
    }
    Ok(Some(total))
}

fn trim_float(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_two() {
        assert_eq!(round_to_two(1.234), 1.23);
        assert_eq!(round_to_two(1.235_1), 1.24);
        assert_eq!(round_to_two(10.0), 10.0);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(5.5, false), "00:05.5");
        assert_eq!(format_time(65.0, true), "01:05");
        assert_eq!(format_time(3725.25, false), "1:02:05.25");
        assert_eq!(format_time(12.0, false), "00:12");
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(3725.0), "01:02:05");
        assert_eq!(format_hms(0.0), "00:00:00");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(65.0), "00:01:05");
        assert_eq!(format_timestamp(12.5), "00:00:12.5");
        assert_eq!(format_timestamp(3600.25), "01:00:00.25");
        assert_eq!(parse_timestamp(&format_timestamp(12.5)).unwrap(), Some(12.5));
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:01:05").unwrap(), Some(65.0));
        assert_eq!(parse_timestamp("1:00:00").unwrap(), Some(3600.0));
        assert_eq!(parse_timestamp("").unwrap(), None);
        assert!(parse_timestamp("01:05").is_err());
        assert!(parse_timestamp("aa:bb:cc").is_err());
    }
}
