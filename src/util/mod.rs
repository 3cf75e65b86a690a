// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

pub mod debounce;
pub mod geometry;
pub mod time;
