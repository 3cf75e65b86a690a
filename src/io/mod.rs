// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for media and item lists.

pub mod media;
pub mod persistence;
pub mod serialization;
