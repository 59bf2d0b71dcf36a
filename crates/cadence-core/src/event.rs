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

//! Diagnostics events published by a scheduler.
//!
//! Events are emitted on lifecycle transitions and contained failures only,
//! never per tick, so an undrained channel stays small in healthy
//! operation.

use crate::registry::CallbackKey;

/// Which lifecycle hook a `HookFailed` event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// The `pre_update` hook.
    Pre,
    /// The `post_update` hook.
    Post,
}

/// A diagnostics event published by a scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// The dispatch chain was armed (explicit `start` or autostart).
    Started,
    /// The dispatch chain was stopped; an already-armed tick may still be
    /// delivered but performs no work.
    Stopped,
    /// The scheduler returned to its unconfigured initial state.
    Reset,
    /// A registered callback reported a failure; the pass continued.
    CallbackFailed {
        /// Key of the failing entry.
        key: CallbackKey,
        /// Rendered error message.
        message: String,
    },
    /// A lifecycle hook reported a failure; the pass continued.
    HookFailed {
        /// Which hook failed.
        phase: HookPhase,
        /// Rendered error message.
        message: String,
    },
}

/// Owns the diagnostics channel for one scheduler.
#[derive(Debug)]
pub(crate) struct EventHub {
    sender: flume::Sender<SchedulerEvent>,
    receiver: flume::Receiver<SchedulerEvent>,
}

impl EventHub {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    pub(crate) fn publish(&self, event: SchedulerEvent) {
        log::trace!("publishing scheduler event: {event:?}");
        if let Err(e) = self.sender.send(event) {
            log::error!("failed to publish scheduler event: {e}");
        }
    }

    pub(crate) fn receiver(&self) -> &flume::Receiver<SchedulerEvent> {
        &self.receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_events_arrive_in_order() {
        let hub = EventHub::new();
        hub.publish(SchedulerEvent::Started);
        hub.publish(SchedulerEvent::Stopped);

        assert_eq!(hub.receiver().try_recv(), Ok(SchedulerEvent::Started));
        assert_eq!(hub.receiver().try_recv(), Ok(SchedulerEvent::Stopped));
        assert!(hub.receiver().try_recv().is_err());
    }
}
