// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Metrics and log providers that let a test see what the hook did.

use srte::api::MetricUnit;
use srte::engine::MetricsStore;
use srte::provider::LogLevel;
use srte::provider::LogProvider;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// A metrics store backed by a map, counting how often it is read.
#[derive(Debug, Default)]
pub struct FakeMetrics {
    unit: MetricUnit,
    vals: Mutex<BTreeMap<u32, u64>>,
    reads: AtomicU64,
}

impl FakeMetrics {
    pub fn new(unit: MetricUnit) -> Self {
        Self { unit, ..Default::default() }
    }

    /// Create a store holding the given `(iface, value)` pairs.
    pub fn with(vals: &[(u32, u64)]) -> Self {
        let m = Self::default();
        for (iface, val) in vals {
            m.set(*iface, *val);
        }
        m
    }

    pub fn set(&self, iface: u32, val: u64) {
        self.vals.lock().unwrap().insert(iface, val);
    }

    pub fn clear(&self, iface: u32) {
        self.vals.lock().unwrap().remove(&iface);
    }

    /// The number of lookups made so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl MetricsStore for FakeMetrics {
    fn get(&self, iface: u32) -> Option<u64> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.vals.lock().unwrap().get(&iface).copied()
    }

    fn unit(&self) -> MetricUnit {
        self.unit
    }
}

/// A log provider that keeps every message.
#[derive(Debug, Default)]
pub struct RecordingLog {
    msgs: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn msgs(&self) -> Vec<(LogLevel, String)> {
        self.msgs.lock().unwrap().clone()
    }

    /// Return whether any message at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.msgs
            .lock()
            .unwrap()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.msgs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogProvider for RecordingLog {
    fn log(&self, level: LogLevel, msg: &str) {
        self.msgs.lock().unwrap().push((level, msg.to_string()));
    }
}
