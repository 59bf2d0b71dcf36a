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

//! The tick-source collaborator: how a scheduler asks its host for the next
//! dispatch pass.

use std::cell::Cell;
use std::rc::Rc;

/// A host-supplied periodic tick primitive.
///
/// Any tick backend (a display-refresh callback, a timer thread, a test
/// harness) can implement this trait to drive a scheduler.
pub trait TickSource {
    /// Asks the host to deliver exactly one `Scheduler::tick` call,
    /// asynchronously, at the next tick opportunity. Must not block, and
    /// must not invoke the scheduler re-entrantly from inside this call.
    fn request_tick(&self);
}

/// A tick source that only counts requests.
///
/// Tests and simple hosts drain the pending count themselves and call
/// `Scheduler::tick` once per drained request. Cloning shares the counter,
/// so the host keeps a handle while the scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTickSource {
    pending: Rc<Cell<usize>>,
}

impl ManualTickSource {
    /// Creates a source with no pending requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of armed ticks not yet delivered.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Consumes one pending request. Returns `false` when nothing is armed.
    pub fn take(&self) -> bool {
        let pending = self.pending.get();
        if pending == 0 {
            return false;
        }
        self.pending.set(pending - 1);
        true
    }
}

impl TickSource for ManualTickSource {
    fn request_tick(&self) {
        self.pending.set(self.pending.get() + 1);
    }
}
