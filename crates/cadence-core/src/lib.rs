// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Cadence Core
//!
//! A shared, single-threaded tick scheduler. Many independently-rated
//! periodic callbacks are multiplexed onto one host tick source (a
//! display-refresh callback, a timer thread, a test harness); on every
//! delivered tick the scheduler fires the entries that have come due and
//! advances a shared delta/elapsed clock for consumers that need
//! frame-timing information.
//!
//! Throttling is phase-anchored: a fired entry's clock advances by exactly
//! one requested interval rather than snapping to the current time, so its
//! firing phase stays anchored to multiples of that interval instead of
//! wall-clock jitter, and no catch-up bursts are ever emitted.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod registry;
pub mod scheduler;
pub mod tick;

pub use clock::{ClockProvider, ManualClock, SystemClock};
pub use config::{SchedulerConfig, SchedulerOptions};
pub use error::SchedulerError;
pub use event::{HookPhase, SchedulerEvent};
pub use registry::CallbackKey;
pub use scheduler::{RunState, Scheduler, TickCallback, TickContext};
pub use tick::{ManualTickSource, TickSource};
