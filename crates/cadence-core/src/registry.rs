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

//! The callback registry: rated entries, stable removal keys, and the
//! per-entry throttling state the dispatcher consumes.

use std::fmt;

use crate::scheduler::TickCallback;

/// Stable identity of a registered callback.
///
/// Minted by the scheduler when a callback is registered and consumed by
/// `remove`. Keys are unique for the life of their scheduler: the minting
/// counter survives `reset`, so a key from a previous lifecycle can never
/// alias a newer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackKey(u64);

impl fmt::Display for CallbackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mints the next key from the shared counter.
pub(crate) fn mint_key(counter: &mut u64) -> CallbackKey {
    let key = CallbackKey(*counter);
    *counter += 1;
    key
}

/// A single registered callback with its throttling state.
pub(crate) struct CallbackEntry {
    pub(crate) key: CallbackKey,
    pub(crate) rate_hz: f64,
    /// Wall-clock milliseconds of the last fire (registration time until the
    /// first fire). Fractional: the phase-anchored advance adds `1000/rate`
    /// per fire.
    pub(crate) last_fire_ms: f64,
    pub(crate) callback: TickCallback,
}

impl CallbackEntry {
    /// Target interval between fires, in milliseconds.
    ///
    /// Non-positive rates map to an infinite interval: such an entry is
    /// accepted but permanently dormant, never an error.
    pub(crate) fn interval_ms(&self) -> f64 {
        if self.rate_hz > 0.0 {
            1000.0 / self.rate_hz
        } else {
            f64::INFINITY
        }
    }
}

impl fmt::Debug for CallbackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("key", &self.key)
            .field("rate_hz", &self.rate_hz)
            .field("last_fire_ms", &self.last_fire_ms)
            .finish()
    }
}

/// Ordered collection of registered entries.
///
/// Insertion order is preserved on add and observable through enumeration;
/// there is no uniqueness constraint beyond the key; the same closure
/// source may be registered any number of times as distinct entries.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub(crate) entries: Vec<CallbackEntry>,
    pub(crate) next_key: u64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a new entry and returns its freshly minted key.
    pub(crate) fn insert(&mut self, rate_hz: f64, now_ms: f64, callback: TickCallback) -> CallbackKey {
        let key = mint_key(&mut self.next_key);
        self.entries.push(CallbackEntry {
            key,
            rate_hz,
            last_fire_ms: now_ms,
            callback,
        });
        key
    }

    /// Appends a pre-built entry (deferred registration from within a pass).
    pub(crate) fn push(&mut self, entry: CallbackEntry) {
        self.entries.push(entry);
    }

    /// Removes the entry with `key`, if present. Keys are unique, so at most
    /// one entry is removed; an unknown key is a no-op.
    pub(crate) fn remove(&mut self, key: CallbackKey) -> bool {
        match self.entries.iter().position(|entry| entry.key == key) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, key: CallbackKey) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Front-to-back enumeration of `(key, rate)` pairs in insertion order.
    pub(crate) fn iter_info(&self) -> impl Iterator<Item = (CallbackKey, f64)> + '_ {
        self.entries.iter().map(|entry| (entry.key, entry.rate_hz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> TickCallback {
        Box::new(|_| Ok(()))
    }

    #[test]
    fn insert_preserves_order_and_mints_distinct_keys() {
        let mut registry = Registry::new();
        let first = registry.insert(30.0, 0.0, noop());
        let second = registry.insert(30.0, 0.0, noop());

        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);

        let info: Vec<_> = registry.iter_info().collect();
        assert_eq!(info[0].0, first);
        assert_eq!(info[1].0, second);
        assert_eq!(info[0].1, 30.0);
        assert_eq!(info[1].1, 30.0);
    }

    #[test]
    fn remove_by_key_removes_exactly_one_entry() {
        let mut registry = Registry::new();
        let first = registry.insert(30.0, 0.0, noop());
        let second = registry.insert(30.0, 0.0, noop());

        assert!(registry.remove(first));
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(first));
        assert!(registry.contains(second));
    }

    #[test]
    fn remove_of_unknown_key_is_a_silent_noop() {
        let mut registry = Registry::new();
        let key = registry.insert(60.0, 0.0, noop());
        assert!(registry.remove(key));

        // Stale key: entry is already gone.
        assert!(!registry.remove(key));
        assert!(registry.is_empty());
    }

    #[test]
    fn clear_keeps_the_key_counter_moving() {
        let mut registry = Registry::new();
        let before = registry.insert(60.0, 0.0, noop());
        registry.clear();
        let after = registry.insert(60.0, 0.0, noop());
        assert_ne!(before, after);
    }

    #[test]
    fn interval_is_infinite_for_non_positive_rates() {
        let mut registry = Registry::new();
        registry.insert(0.0, 0.0, noop());
        registry.insert(-30.0, 0.0, noop());
        registry.insert(50.0, 0.0, noop());

        assert!(registry.entries[0].interval_ms().is_infinite());
        assert!(registry.entries[1].interval_ms().is_infinite());
        assert_eq!(registry.entries[2].interval_ms(), 20.0);
    }
}
