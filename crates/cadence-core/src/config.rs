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

//! Scheduler configuration.
//!
//! `SchedulerConfig` is plain data so hosts can embed it in their own
//! configuration files; `SchedulerOptions` wraps it with the
//! non-serializable pre/post hooks for `Scheduler::configure`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scheduler::{TickCallback, TickContext};

/// Plain-data scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Arm the first tick as soon as `configure` is applied.
    pub autostart: bool,
    /// Rate used by `Scheduler::add` when the caller does not pick one.
    pub default_rate_hz: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            autostart: true,
            default_rate_hz: 60.0,
        }
    }
}

/// Everything `Scheduler::configure` accepts: plain settings plus the
/// optional pre/post dispatch hooks.
#[derive(Default)]
pub struct SchedulerOptions {
    pub(crate) config: SchedulerConfig,
    pub(crate) pre_update: Option<TickCallback>,
    pub(crate) post_update: Option<TickCallback>,
}

impl SchedulerOptions {
    /// Options with default settings and no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options seeded from host-loaded settings.
    pub fn from_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            pre_update: None,
            post_update: None,
        }
    }

    /// Whether the dispatch chain starts as part of `configure`.
    pub fn autostart(mut self, autostart: bool) -> Self {
        self.config.autostart = autostart;
        self
    }

    /// Rate used by `Scheduler::add` when the caller does not pick one.
    pub fn default_rate_hz(mut self, rate_hz: f64) -> Self {
        self.config.default_rate_hz = rate_hz;
        self
    }

    /// Hook invoked at the start of every dispatch pass, before any
    /// callback fires.
    pub fn pre_update(
        mut self,
        hook: impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.pre_update = Some(Box::new(hook));
        self
    }

    /// Hook invoked at the end of every dispatch pass, after the shared
    /// clock has been updated.
    pub fn post_update(
        mut self,
        hook: impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.post_update = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for SchedulerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerOptions")
            .field("config", &self.config)
            .field("pre_update", &self.pre_update.is_some())
            .field("post_update", &self.post_update.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_match_the_documented_contract() {
        let config = SchedulerConfig::default();
        assert!(config.autostart);
        assert_relative_eq!(config.default_rate_hz, 60.0);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: SchedulerConfig = serde_json::from_str("{}").expect("parse empty config");
        assert_eq!(config, SchedulerConfig::default());

        let config: SchedulerConfig =
            serde_json::from_str(r#"{ "autostart": false }"#).expect("parse partial config");
        assert!(!config.autostart);
        assert_relative_eq!(config.default_rate_hz, 60.0);
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = SchedulerConfig {
            autostart: false,
            default_rate_hz: 144.0,
        };
        let json = serde_json::to_string(&config).expect("serialize config");
        let back: SchedulerConfig = serde_json::from_str(&json).expect("parse config");
        assert_eq!(back, config);
    }

    #[test]
    fn options_builder_applies_settings_and_hooks() {
        let options = SchedulerOptions::new()
            .autostart(false)
            .default_rate_hz(30.0)
            .pre_update(|_| Ok(()));

        assert!(!options.config.autostart);
        assert_relative_eq!(options.config.default_rate_hz, 30.0);
        assert!(options.pre_update.is_some());
        assert!(options.post_update.is_none());
    }
}
