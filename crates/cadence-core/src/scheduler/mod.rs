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

//! The scheduler: lifecycle control and the per-tick dispatch pass.

mod context;

pub use context::{TickCallback, TickContext};

use context::RegistryCommand;

use crate::clock::{ClockProvider, SystemClock};
use crate::config::{SchedulerConfig, SchedulerOptions};
use crate::error::SchedulerError;
use crate::event::{EventHub, HookPhase, SchedulerEvent};
use crate::registry::{CallbackKey, Registry};
use crate::tick::TickSource;

/// Run state of the dispatch chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No tick will be acted on; the chain does not perpetuate.
    Stopped,
    /// Each delivered tick runs a dispatch pass and re-arms the next one.
    Running,
}

#[derive(Default)]
struct Hooks {
    pre: Option<TickCallback>,
    post: Option<TickCallback>,
}

/// A shared, single-threaded scheduler multiplexing independently-rated
/// callbacks onto one host tick source.
///
/// Consumers register callbacks with a target rate; on every delivered
/// tick the scheduler fires the entries that have come due, throttled
/// phase-anchored against the wall clock, and advances a shared
/// delta/elapsed clock read from the monotonic clock.
///
/// ```
/// use cadence_core::{ManualTickSource, Scheduler, SchedulerOptions};
///
/// let ticker = ManualTickSource::new();
/// let mut scheduler = Scheduler::new(ticker.clone());
/// scheduler.configure(SchedulerOptions::new().autostart(false))?;
///
/// let key = scheduler.add_at(30.0, |_ctx| Ok(()))?;
/// scheduler.start()?;
///
/// // The host delivers each armed tick by calling back into the scheduler.
/// assert!(ticker.take());
/// scheduler.tick();
///
/// assert!(scheduler.remove(key));
/// # Ok::<(), cadence_core::SchedulerError>(())
/// ```
pub struct Scheduler {
    registry: Registry,
    configured: bool,
    config: SchedulerConfig,
    hooks: Hooks,
    run_state: RunState,
    delta_time: f64,
    elapsed_time: f64,
    previous_monotonic: f64,
    clock: Box<dyn ClockProvider>,
    ticker: Box<dyn TickSource>,
    events: EventHub,
}

impl Scheduler {
    /// Creates an unconfigured scheduler driven by `ticker`, reading time
    /// from the system clock.
    pub fn new(ticker: impl TickSource + 'static) -> Self {
        Self::with_clock(SystemClock::new(), ticker)
    }

    /// Creates an unconfigured scheduler with an explicit clock provider.
    /// Hosts use this to inject a deterministic clock.
    pub fn with_clock(clock: impl ClockProvider + 'static, ticker: impl TickSource + 'static) -> Self {
        Self {
            registry: Registry::new(),
            configured: false,
            config: SchedulerConfig::default(),
            hooks: Hooks::default(),
            run_state: RunState::Stopped,
            delta_time: 0.0,
            elapsed_time: 0.0,
            previous_monotonic: 0.0,
            clock: Box::new(clock),
            ticker: Box::new(ticker),
            events: EventHub::new(),
        }
    }

    /// Applies configuration and hooks. Must be called exactly once per
    /// lifecycle, before registration or `start`.
    ///
    /// With `autostart` (the default) the dispatch chain is armed as part
    /// of this call. A second call fails with `AlreadyConfigured` and
    /// leaves the first configuration, hooks included, untouched.
    pub fn configure(&mut self, options: SchedulerOptions) -> Result<(), SchedulerError> {
        if self.configured {
            return Err(SchedulerError::AlreadyConfigured);
        }

        let SchedulerOptions {
            config,
            pre_update,
            post_update,
        } = options;

        log::info!(
            "scheduler configured (autostart: {}, default rate: {} Hz)",
            config.autostart,
            config.default_rate_hz
        );

        self.configured = true;
        self.config = config;
        self.hooks = Hooks {
            pre: pre_update,
            post: post_update,
        };

        if self.config.autostart {
            self.begin_running();
        }
        Ok(())
    }

    /// Arms the dispatch chain. Idempotent: starting a running scheduler is
    /// a no-op, so no second concurrent chain can ever be spawned.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if !self.configured {
            return Err(SchedulerError::NotConfigured);
        }
        if self.run_state == RunState::Running {
            log::debug!("start ignored; dispatch chain already running");
            return Ok(());
        }
        self.begin_running();
        Ok(())
    }

    /// Stops the dispatch chain. Idempotent. A tick already armed at the
    /// tick source may still be delivered by the host; it performs no work
    /// and does not re-arm.
    pub fn stop(&mut self) {
        if self.run_state == RunState::Stopped {
            return;
        }
        self.run_state = RunState::Stopped;
        log::debug!("dispatch chain stopped");
        self.events.publish(SchedulerEvent::Stopped);
    }

    /// Returns the scheduler to its initial, unconfigured state: empties
    /// the registry, drops hooks and settings, zeroes the shared clock, and
    /// stops the chain. Keys already handed out are never reused afterward.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.configured = false;
        self.config = SchedulerConfig::default();
        self.hooks = Hooks::default();
        self.run_state = RunState::Stopped;
        self.delta_time = 0.0;
        self.elapsed_time = 0.0;
        self.previous_monotonic = 0.0;
        log::info!("scheduler reset");
        self.events.publish(SchedulerEvent::Reset);
    }

    /// Registers `callback` at the configured default rate.
    pub fn add(
        &mut self,
        callback: impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    ) -> Result<CallbackKey, SchedulerError> {
        let rate_hz = self.config.default_rate_hz;
        self.add_at(rate_hz, callback)
    }

    /// Registers `callback` to be invoked `rate_hz` times per second,
    /// returning its removal key.
    ///
    /// The rate is not validated: a non-positive rate is accepted and
    /// yields a permanently dormant entry. Registration requires prior
    /// configuration.
    pub fn add_at(
        &mut self,
        rate_hz: f64,
        callback: impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    ) -> Result<CallbackKey, SchedulerError> {
        if !self.configured {
            return Err(SchedulerError::NotConfigured);
        }
        let now_ms = self.clock.wall_clock_ms() as f64;
        let key = self.registry.insert(rate_hz, now_ms, Box::new(callback));
        log::trace!("registered callback {key} at {rate_hz} Hz");
        Ok(key)
    }

    /// Removes the callback registered under `key`. Returns whether an
    /// entry was removed; an unknown or stale key is a silent no-op.
    pub fn remove(&mut self, key: CallbackKey) -> bool {
        let removed = self.registry.remove(key);
        if removed {
            log::trace!("removed callback {key}");
        }
        removed
    }

    /// Runs one dispatch pass. The host calls this once for every tick the
    /// tick source was asked to arm.
    ///
    /// A tick delivered while the scheduler is stopped (e.g. one that was
    /// already armed when `stop` or `reset` ran) is ignored and does not
    /// re-arm. While running, the pass is, in order: pre hook, due-callback
    /// scan, shared clock update, post hook, deferred registry mutations,
    /// re-arm.
    pub fn tick(&mut self) {
        if self.run_state != RunState::Running {
            log::trace!("tick delivered while stopped; ignoring");
            return;
        }

        let wall_now_ms = self.clock.wall_clock_ms() as f64;
        let mut commands: Vec<RegistryCommand> = Vec::new();
        let mut stop_requested = false;

        // Pre hook and the due scan observe the previous pass's timing.
        {
            let delta_time = self.delta_time;
            let elapsed_time = self.elapsed_time;
            let default_rate_hz = self.config.default_rate_hz;
            let Self {
                registry,
                hooks,
                events,
                ..
            } = self;
            let Registry { entries, next_key } = registry;

            let mut ctx = TickContext {
                wall_now_ms,
                delta_time,
                elapsed_time,
                default_rate_hz,
                next_key,
                commands: &mut commands,
                stop_requested: &mut stop_requested,
            };

            if let Some(pre) = hooks.pre.as_mut() {
                if let Err(error) = pre(&mut ctx) {
                    log::error!("pre-update hook failed: {error:#}");
                    events.publish(SchedulerEvent::HookFailed {
                        phase: HookPhase::Pre,
                        message: format!("{error:#}"),
                    });
                }
            }

            // Most recently added entries are considered first; among
            // entries with equal rates this reverse order is observable
            // and part of the contract.
            for index in (0..entries.len()).rev() {
                let entry = &mut entries[index];
                let interval_ms = entry.interval_ms();
                let delta_ms = wall_now_ms - entry.last_fire_ms;
                if delta_ms > interval_ms {
                    // Phase-anchored: advance by exactly one interval, never
                    // snap to `now`, and fire at most once per pass.
                    entry.last_fire_ms += interval_ms;
                    let key = entry.key;
                    if let Err(error) = (entry.callback)(&mut ctx) {
                        log::error!("callback {key} failed: {error:#}");
                        events.publish(SchedulerEvent::CallbackFailed {
                            key,
                            message: format!("{error:#}"),
                        });
                    }
                }
            }
        }

        // Shared clock update: monotonic only, untouched by the wall clock.
        let new_time = self.clock.monotonic_secs();
        self.delta_time = new_time - self.previous_monotonic;
        self.previous_monotonic = new_time;
        self.elapsed_time += self.delta_time;

        // Post hook observes the updated clock.
        {
            let delta_time = self.delta_time;
            let elapsed_time = self.elapsed_time;
            let default_rate_hz = self.config.default_rate_hz;
            let Self {
                registry,
                hooks,
                events,
                ..
            } = self;

            let mut ctx = TickContext {
                wall_now_ms,
                delta_time,
                elapsed_time,
                default_rate_hz,
                next_key: &mut registry.next_key,
                commands: &mut commands,
                stop_requested: &mut stop_requested,
            };

            if let Some(post) = hooks.post.as_mut() {
                if let Err(error) = post(&mut ctx) {
                    log::error!("post-update hook failed: {error:#}");
                    events.publish(SchedulerEvent::HookFailed {
                        phase: HookPhase::Post,
                        message: format!("{error:#}"),
                    });
                }
            }
        }

        self.apply_commands(commands);

        if stop_requested {
            self.stop();
        }

        // The chain perpetuates itself only while running.
        if self.run_state == RunState::Running {
            self.ticker.request_tick();
        }
    }

    fn begin_running(&mut self) {
        self.run_state = RunState::Running;
        log::debug!("dispatch chain armed");
        self.events.publish(SchedulerEvent::Started);
        self.ticker.request_tick();
    }

    fn apply_commands(&mut self, commands: Vec<RegistryCommand>) {
        for command in commands {
            match command {
                RegistryCommand::Add(entry) => {
                    log::trace!("applying deferred add of callback {}", entry.key);
                    self.registry.push(entry);
                }
                RegistryCommand::Remove(key) => {
                    if self.registry.remove(key) {
                        log::trace!("applied deferred removal of callback {key}");
                    }
                }
            }
        }
    }

    /// Seconds between the two most recent dispatch passes.
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Accumulated monotonic seconds across passes since the last reset.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Current run state of the dispatch chain.
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Whether the dispatch chain is running.
    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    /// Whether `configure` has been applied this lifecycle.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Settings applied by `configure` (defaults before configuration).
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of registered callbacks.
    pub fn callback_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Whether `key` currently names a registered callback.
    pub fn contains(&self, key: CallbackKey) -> bool {
        self.registry.contains(key)
    }

    /// Registered `(key, rate)` pairs in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (CallbackKey, f64)> + '_ {
        self.registry.iter_info()
    }

    /// The receiving end of this scheduler's diagnostics channel.
    pub fn events(&self) -> &flume::Receiver<SchedulerEvent> {
        self.events.receiver()
    }
}
