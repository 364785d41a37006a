// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Packet counters kept by a hook.

use crate::api::HookStatsSnap;
use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering;

/// Names a counter slot in [`HookStats`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(usize)]
pub enum StatKey {
    Processed = 0,
    Passed = 1,
    Dropped = 2,
    Rerouted = 3,
    Rewritten = 4,
}

impl StatKey {
    pub const COUNT: usize = 5;
}

/// A fixed array of counters, safe to bump from any number of threads.
#[derive(Debug, Default)]
pub struct HookStats {
    slots: [AtomicU64; StatKey::COUNT],
}

impl HookStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn incr(&self, key: StatKey) {
        self.incr_slot(key as usize);
    }

    /// Bump the counter at `slot`. A slot outside the table is
    /// ignored.
    #[inline]
    pub fn incr_slot(&self, slot: usize) {
        if let Some(ctr) = self.slots.get(slot) {
            ctr.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get(&self, key: StatKey) -> u64 {
        self.slots[key as usize].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> HookStatsSnap {
        HookStatsSnap::from(self)
    }
}

impl From<&HookStats> for HookStatsSnap {
    fn from(val: &HookStats) -> Self {
        HookStatsSnap {
            processed: val.get(StatKey::Processed),
            passed: val.get(StatKey::Passed),
            dropped: val.get(StatKey::Dropped),
            rerouted: val.get(StatKey::Rerouted),
            rewritten: val.get(StatKey::Rewritten),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counts() {
        let stats = HookStats::new();
        stats.incr(StatKey::Processed);
        stats.incr(StatKey::Processed);
        stats.incr(StatKey::Rerouted);
        stats.incr_slot(StatKey::COUNT);
        stats.incr_slot(usize::MAX);

        assert_eq!(
            stats.snapshot(),
            HookStatsSnap { processed: 2, rerouted: 1, ..Default::default() }
        );
    }
}
