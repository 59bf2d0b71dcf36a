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

//! Error types for the scheduler's lifecycle and registration surface.
//!
//! Callback and hook failures are not represented here: consumers report
//! those as `anyhow::Error` values from their closures, and the dispatcher
//! contains them per invocation instead of propagating them.

use thiserror::Error;

/// An error from the scheduler's lifecycle or registration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// `configure` must be applied before callbacks can be registered or
    /// the dispatch chain started.
    #[error("scheduler has not been configured")]
    NotConfigured,

    /// `configure` was already applied for this lifecycle; the first
    /// configuration stays authoritative until `reset`.
    #[error("scheduler is already configured")]
    AlreadyConfigured,
}
