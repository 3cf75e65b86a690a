// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

pub mod history;
pub mod item;
pub mod segment;
pub mod store;

pub use history::{History, TrackingSnapshot};
pub use item::{AnnotationItem, Geometry, GroupId, IdGenerator, Interval, ItemId, ItemKind, Length, Properties};
pub use segment::Segment;
pub use store::{ItemStore, LayerDirection, PropertyPatch};
