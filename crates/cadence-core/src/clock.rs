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

//! Clock collaborators.
//!
//! The dispatcher consumes two readings from one provider: a coarse,
//! non-monotonic wall clock in milliseconds (throttling only) and a
//! monotonic clock in seconds (delta/elapsed timing only). Keeping them
//! behind one trait lets hosts substitute a deterministic clock in tests
//! and simulations.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// The clock collaborator consumed by a scheduler.
pub trait ClockProvider {
    /// Coarse wall-clock reading in milliseconds. Non-monotonic: subject to
    /// external adjustment, and may jump backwards.
    fn wall_clock_ms(&self) -> i64;

    /// Monotonic high-resolution reading in seconds. Non-decreasing within
    /// a process.
    fn monotonic_secs(&self) -> f64;
}

/// The default clock provider, backed by the operating system.
///
/// The monotonic reading is anchored to the instant the provider was
/// constructed, so the first dispatch pass observes a small delta rather
/// than an arbitrary process-uptime value.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a provider anchored at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockProvider for SystemClock {
    fn wall_clock_ms(&self) -> i64 {
        // A wall clock set before the epoch reads as zero.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_millis() as i64)
            .unwrap_or(0)
    }

    fn monotonic_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Default)]
struct ManualClockState {
    wall_ms: i64,
    monotonic_secs: f64,
}

/// A hand-driven clock for tests and deterministic simulations.
///
/// Cloning shares the underlying state, so a host can keep one handle to
/// steer time while the scheduler owns another. Single-threaded by design,
/// like the scheduler itself.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Rc<RefCell<ManualClockState>>,
}

impl ManualClock {
    /// Creates a clock with both readings at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wall reading without touching the monotonic reading.
    pub fn set_wall_ms(&self, wall_ms: i64) {
        self.state.borrow_mut().wall_ms = wall_ms;
    }

    /// Sets the monotonic reading without touching the wall reading.
    pub fn set_monotonic_secs(&self, monotonic_secs: f64) {
        self.state.borrow_mut().monotonic_secs = monotonic_secs;
    }

    /// Advances both readings coherently by `ms` milliseconds.
    pub fn advance_ms(&self, ms: i64) {
        let mut state = self.state.borrow_mut();
        state.wall_ms += ms;
        state.monotonic_secs += ms as f64 / 1e3;
    }
}

impl ClockProvider for ManualClock {
    fn wall_clock_ms(&self) -> i64 {
        self.state.borrow().wall_ms
    }

    fn monotonic_secs(&self) -> f64 {
        self.state.borrow().monotonic_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::thread;
    use std::time::Duration;

    const SLEEP_DURATION_MS: u64 = 50;
    const SLEEP_MARGIN_MS: u64 = 150;

    #[test]
    fn system_clock_monotonic_starts_near_zero() {
        let clock = SystemClock::new();
        assert!(
            clock.monotonic_secs() < 0.1,
            "Monotonic reading should be anchored at construction"
        );
    }

    #[test]
    fn system_clock_monotonic_advances_with_real_time() {
        let clock = SystemClock::new();
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));

        let elapsed = clock.monotonic_secs();
        let min_expected = SLEEP_DURATION_MS as f64 / 1e3;
        let max_expected = (SLEEP_DURATION_MS + SLEEP_MARGIN_MS) as f64 / 1e3;
        assert!(
            elapsed >= min_expected,
            "Elapsed ({elapsed}) should be >= sleep duration ({min_expected})"
        );
        assert!(
            elapsed < max_expected,
            "Elapsed ({elapsed}) should be < sleep duration + margin ({max_expected})"
        );
    }

    #[test]
    fn system_clock_wall_reading_is_plausible() {
        let clock = SystemClock::new();
        // Any machine running this test is far past 2020-01-01.
        assert!(clock.wall_clock_ms() > 1_577_836_800_000);
    }

    #[test]
    fn manual_clock_clones_share_state() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.set_wall_ms(1_000);
        handle.set_monotonic_secs(1.5);

        assert_eq!(clock.wall_clock_ms(), 1_000);
        assert_relative_eq!(clock.monotonic_secs(), 1.5);
    }

    #[test]
    fn manual_clock_advance_moves_both_readings() {
        let clock = ManualClock::new();
        clock.advance_ms(250);

        assert_eq!(clock.wall_clock_ms(), 250);
        assert_relative_eq!(clock.monotonic_secs(), 0.25);
    }
}
