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

//! The in-pass view of a scheduler handed to hooks and firing callbacks.

use crate::registry::{mint_key, CallbackEntry, CallbackKey};

/// Callback signature shared by registered callbacks and lifecycle hooks.
///
/// A returned `Err` is contained by the dispatcher: logged, published as a
/// diagnostics event, and never allowed to halt the pass or the chain.
pub type TickCallback = Box<dyn FnMut(&mut TickContext<'_>) -> anyhow::Result<()>>;

/// A registry mutation requested from within a dispatch pass, applied once
/// the pass completes.
pub(crate) enum RegistryCommand {
    Add(CallbackEntry),
    Remove(CallbackKey),
}

/// The scheduler state visible to hooks and callbacks while a dispatch pass
/// is in progress.
///
/// Registry mutations requested through this context are deferred: they
/// take effect starting from the next pass, independent of where the
/// current scan stands. An entry removed mid-pass still fires this pass if
/// due; an entry added mid-pass cannot fire before the next pass.
pub struct TickContext<'a> {
    pub(crate) wall_now_ms: f64,
    pub(crate) delta_time: f64,
    pub(crate) elapsed_time: f64,
    pub(crate) default_rate_hz: f64,
    pub(crate) next_key: &'a mut u64,
    pub(crate) commands: &'a mut Vec<RegistryCommand>,
    pub(crate) stop_requested: &'a mut bool,
}

impl TickContext<'_> {
    /// Seconds elapsed between the two most recent passes, as of the
    /// current phase: the pre hook and firing callbacks observe the
    /// previous pass's value, the post hook the freshly updated one.
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Accumulated monotonic seconds since the last reset, as of the
    /// current phase.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// The wall-clock reading (milliseconds) the current pass throttles
    /// against.
    pub fn wall_now_ms(&self) -> f64 {
        self.wall_now_ms
    }

    /// Registers a callback at the configured default rate, effective next
    /// pass. The key is usable immediately.
    pub fn add(
        &mut self,
        callback: impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    ) -> CallbackKey {
        let rate_hz = self.default_rate_hz;
        self.add_at(rate_hz, callback)
    }

    /// Registers a callback at `rate_hz` invocations per second, effective
    /// next pass. Its throttling state starts at the current pass's wall
    /// reading.
    pub fn add_at(
        &mut self,
        rate_hz: f64,
        callback: impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    ) -> CallbackKey {
        let key = mint_key(self.next_key);
        self.commands.push(RegistryCommand::Add(CallbackEntry {
            key,
            rate_hz,
            last_fire_ms: self.wall_now_ms,
            callback: Box::new(callback),
        }));
        key
    }

    /// Removes a registered callback, effective next pass. Unknown keys are
    /// a silent no-op.
    pub fn remove(&mut self, key: CallbackKey) {
        self.commands.push(RegistryCommand::Remove(key));
    }

    /// Requests that the dispatch chain stop once the current pass
    /// completes; the scheduler will not re-arm.
    pub fn stop(&mut self) {
        *self.stop_requested = true;
    }
}
