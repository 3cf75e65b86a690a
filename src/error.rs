// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the overlay engine.

use crate::models::item::ItemId;
use thiserror::Error;

/// Errors raised by the item store, the editor session and the persistence
/// layer.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An item with this id already exists in the store
    #[error("Duplicate item id: {0}")]
    DuplicateId(ItemId),

    /// No item with this id exists in the store
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// Authored time falls outside the segment window
    #[error("Time {time:.2}s must be between {start:.2}s and {end:.2}s")]
    OutsideSegment {
        /// The rejected time
        time: f64,
        /// Segment start
        start: f64,
        /// Segment end
        end: f64,
    },

    /// Authored time falls inside an excluded sub-interval
    #[error("Time {time:.2}s is inside a skipped segment")]
    InSkipSegment {
        /// The rejected time
        time: f64,
    },

    /// Timestamp text could not be parsed as HH:MM:SS
    #[error("Invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    /// Interval with start after end
    #[error("Invalid interval: start {start:.2}s is after end {end:.2}s")]
    InvalidInterval {
        /// Interval start
        start: f64,
        /// Interval end
        end: f64,
    },

    /// Media metadata could not be read
    #[error("Media metadata unavailable for '{url}': {reason}")]
    MediaUnavailable {
        /// Source of the media
        url: String,
        /// Why probing failed
        reason: String,
    },
}

/// Convenience alias for results carrying an [`OverlayError`].
pub type Result<T> = std::result::Result<T, OverlayError>;
