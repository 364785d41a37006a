// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

#![no_std]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
extern crate alloc;

use alloc::string::String;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

pub mod cfg;
pub mod ip;
pub mod sid;
pub mod stat;

pub use cfg::*;
pub use ip::*;
pub use sid::*;
pub use stat::*;

/// Version of the types shared between the engine and its tooling:
/// the SID layout, hook configuration and stats snapshots. Bump it
/// whenever one of them changes shape.
pub const API_VERSION: u64 = 1;

/// Major version of the srte package.
pub const MAJOR_VERSION: u64 = 0;

/// The disposition handed back to whatever invoked the hook.
///
/// * Pass: The packet was not modified and should continue through
///   normal forwarding.
///
/// * Drop: The packet must be discarded.
///
/// * Reroute: The packet was modified in place; the caller must redo
///   its route lookup using the new destination.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Verdict {
    Pass,
    Drop,
    Reroute,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Pass => "PASS",
            Self::Drop => "DROP",
            Self::Reroute => "REROUTE",
        };
        write!(f, "{s}")
    }
}

/// The unit of the values held in the interface metrics store.
///
/// The evaluator never converts between units: a policy threshold is
/// compared against the raw stored value. Whoever populates the store
/// decides the unit and records it in the hook configuration, so that
/// anyone encoding a threshold into a SID knows what they are
/// comparing against.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum MetricUnit {
    /// Throughput in bits per second.
    BitsPerSec,
    /// Throughput in megabits per second (10^6 bits).
    #[default]
    MegabitsPerSec,
    /// A raw byte counter.
    Bytes,
}

impl MetricUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::BitsPerSec => "bps",
            Self::MegabitsPerSec => "Mbps",
            Self::Bytes => "B",
        }
    }
}

impl core::str::FromStr for MetricUnit {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bps" | "bits-per-sec" => Ok(Self::BitsPerSec),
            "mbps" | "megabits-per-sec" => Ok(Self::MegabitsPerSec),
            "bytes" | "b" => Ok(Self::Bytes),
            _ => Err(format!("invalid metric unit: {s}")),
        }
    }
}

impl Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn metric_unit_parse() {
        assert_eq!("Mbps".parse::<MetricUnit>(), Ok(MetricUnit::MegabitsPerSec));
        assert_eq!("bps".parse::<MetricUnit>(), Ok(MetricUnit::BitsPerSec));
        assert_eq!("bytes".parse::<MetricUnit>(), Ok(MetricUnit::Bytes));
        assert!("furlongs".parse::<MetricUnit>().is_err());
    }
}
