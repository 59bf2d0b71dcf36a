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

//! # Cadence Driver
//!
//! Host-side tick delivery for cadence schedulers: a thread-backed
//! implementation of the core `TickSource` trait for hosts that have no
//! display-refresh callback of their own.
//!
//! Only unit signals cross the thread boundary. The scheduler, its
//! callbacks, and every dispatch pass stay on the host thread; the worker
//! thread does nothing but pace the readiness signals the host pumps.

#![warn(missing_docs)]

use std::io;
use std::thread;
use std::time::Duration;

use cadence_core::{Scheduler, TickSource};

/// A tick source paced by a background timing thread.
///
/// Each armed request makes the worker wait one resolution period and then
/// emit a readiness signal; the host pumps the readiness channel and calls
/// `Scheduler::tick` once per signal, typically through [`pump`].
pub struct ThreadTicker {
    requests: flume::Sender<()>,
    resolution: Duration,
}

impl ThreadTicker {
    /// Spawns the worker and returns the tick source together with the
    /// readiness channel the host pumps. The worker exits when both the
    /// ticker and the readiness receiver are dropped.
    pub fn spawn(resolution: Duration) -> io::Result<(Self, flume::Receiver<()>)> {
        let (requests, request_rx) = flume::unbounded::<()>();
        let (ready_tx, ready) = flume::unbounded::<()>();

        // The worker runs detached; it exits on its own once both channel
        // ends are gone.
        let _worker = thread::Builder::new()
            .name("cadence-ticker".into())
            .spawn(move || {
                while request_rx.recv().is_ok() {
                    thread::sleep(resolution);
                    if ready_tx.send(()).is_err() {
                        break;
                    }
                }
                log::debug!("ticker worker exiting; host side is gone");
            })?;

        Ok((Self { requests, resolution }, ready))
    }

    /// The period the worker waits per armed request.
    pub fn resolution(&self) -> Duration {
        self.resolution
    }
}

impl TickSource for ThreadTicker {
    fn request_tick(&self) {
        if self.requests.send(()).is_err() {
            log::error!("tick request dropped; ticker worker is gone");
        }
    }
}

/// Delivers ticks to `scheduler` until it stops running, blocking on the
/// readiness channel between passes. Returns the number of passes
/// delivered.
///
/// The scheduler must own the `ThreadTicker` paired with `ticks`;
/// otherwise no readiness signal ever arrives and this call blocks until
/// the channel disconnects.
pub fn pump(scheduler: &mut Scheduler, ticks: &flume::Receiver<()>) -> u64 {
    let mut delivered = 0;
    while scheduler.is_running() {
        if ticks.recv().is_err() {
            log::debug!("readiness channel disconnected; pump ending");
            break;
        }
        scheduler.tick();
        delivered += 1;
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::SchedulerOptions;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Instant;

    const RESOLUTION_MS: u64 = 2;
    const MARGIN_MS: u64 = 500;

    #[test]
    fn worker_paces_one_signal_per_request() {
        let (ticker, ticks) =
            ThreadTicker::spawn(Duration::from_millis(RESOLUTION_MS)).expect("spawn ticker");

        let start = Instant::now();
        ticker.request_tick();
        ticker.request_tick();
        ticker.request_tick();

        for _ in 0..3 {
            ticks
                .recv_timeout(Duration::from_millis(MARGIN_MS))
                .expect("readiness signal");
        }

        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(3 * RESOLUTION_MS),
            "Three requests should take at least three resolution periods ({elapsed:?})"
        );
        assert!(ticks.try_recv().is_err(), "No unrequested signals");
    }

    #[test]
    fn pump_drives_a_scheduler_until_it_stops_itself() {
        let (ticker, ticks) =
            ThreadTicker::spawn(Duration::from_millis(RESOLUTION_MS)).expect("spawn ticker");

        let mut scheduler = Scheduler::new(ticker);
        scheduler
            .configure(SchedulerOptions::new().autostart(false))
            .expect("configure");

        // 1000 Hz against a 2 ms tick: due on every pass.
        let fired = Rc::new(Cell::new(0u32));
        let seen = fired.clone();
        scheduler
            .add_at(1000.0, move |ctx| {
                seen.set(seen.get() + 1);
                if seen.get() >= 5 {
                    ctx.stop();
                }
                Ok(())
            })
            .expect("add");

        scheduler.start().expect("start");
        let delivered = pump(&mut scheduler, &ticks);

        assert_eq!(fired.get(), 5);
        assert!(delivered >= 5);
        assert!(!scheduler.is_running());
    }
}
