// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Timeline-synchronized overlay engine.
//!
//! Overlay items (images, clips, buttons, text, shapes, hotspots) are
//! positioned over a host video and shown while the playhead is inside
//! their interval. The crate covers the item model and store, the
//! activation scheduler, scene rendering, and an editing session with
//! undo history.

pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod io;
pub mod models;
pub mod render;
pub mod util;
