// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback-side engine: host player, embedded media and the activation
//! scheduler.

pub mod media;
pub mod player;
pub mod scheduler;

pub use media::{ClockMedia, ClockMediaFactory, MediaElement, MediaFactory};
pub use player::{HostPlayer, PlayerEvent, SimulatedPlayer};
pub use scheduler::{ActivationScheduler, MuteAction, OverlaySurface, SchedulerPhase, TickReport};
