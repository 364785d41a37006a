// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Per-interface metrics consulted by conditional policies.
//!
//! The store is written by a producer outside the packet path (a
//! bandwidth estimator, an operator tool, a test) and read by the hook
//! on every conditional decision. Reads never block and never observe
//! a torn value: each slot is a single atomic word.

use crate::api::MetricUnit;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Display;
use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering;

/// A source of per-interface metric values.
pub trait MetricsStore: Send + Sync {
    /// Return the current value for `iface`, or `None` if no value has
    /// been published for it.
    fn get(&self, iface: u32) -> Option<u64>;

    /// The unit the published values are expressed in.
    fn unit(&self) -> MetricUnit;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsError {
    NoSuchIface { iface: u32, capacity: u32 },
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchIface { iface, capacity } => write!(
                f,
                "interface {iface} outside metrics table of {capacity} entries",
            ),
        }
    }
}

/// A fixed-size table of metric values indexed by interface.
///
/// A slot holding [`IfaceMetrics::EMPTY`] has no value.
#[derive(Debug)]
pub struct IfaceMetrics {
    unit: MetricUnit,
    slots: Box<[AtomicU64]>,
}

impl IfaceMetrics {
    /// The slot value meaning "no metric published".
    pub const EMPTY: u64 = u64::MAX;

    pub fn new(max_ifaces: u32, unit: MetricUnit) -> Self {
        let slots = (0..max_ifaces)
            .map(|_| AtomicU64::new(Self::EMPTY))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { unit, slots }
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    fn slot(&self, iface: u32) -> Result<&AtomicU64, MetricsError> {
        usize::try_from(iface)
            .ok()
            .and_then(|idx| self.slots.get(idx))
            .ok_or(MetricsError::NoSuchIface {
                iface,
                capacity: self.capacity(),
            })
    }

    /// Publish `value` for `iface`.
    ///
    /// A value equal to [`Self::EMPTY`] is stored as `EMPTY - 1` so
    /// that publishing can never clear a slot.
    pub fn set(&self, iface: u32, value: u64) -> Result<(), MetricsError> {
        self.slot(iface)?
            .store(value.min(Self::EMPTY - 1), Ordering::Relaxed);
        Ok(())
    }

    /// Withdraw the value for `iface`.
    pub fn clear(&self, iface: u32) -> Result<(), MetricsError> {
        self.slot(iface)?.store(Self::EMPTY, Ordering::Relaxed);
        Ok(())
    }

    /// Return every interface that currently holds a value.
    pub fn entries(&self) -> Vec<(u32, u64)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let val = slot.load(Ordering::Relaxed);
                (val != Self::EMPTY).then_some((idx as u32, val))
            })
            .collect()
    }
}

impl MetricsStore for IfaceMetrics {
    fn get(&self, iface: u32) -> Option<u64> {
        let val = self.slot(iface).ok()?.load(Ordering::Relaxed);
        (val != Self::EMPTY).then_some(val)
    }

    fn unit(&self) -> MetricUnit {
        self.unit
    }
}
