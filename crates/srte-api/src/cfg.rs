// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Hook configuration.

use super::MetricUnit;
use super::ip::Ipv6Addr;
use serde::Deserialize;
use serde::Serialize;

/// The program an egress hook runs on each packet.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProgramCfg {
    /// Evaluate the SRv6 policy encoded in the destination SID and
    /// advance (or skip) segments accordingly.
    #[default]
    SkipSegments,

    /// Replace one exact destination with another, repairing the
    /// ICMPv6 checksum when needed.
    RewriteDst { match_dst: Ipv6Addr, new_dst: Ipv6Addr },
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct HookCfg {
    pub program: ProgramCfg,

    /// The unit of the values in the interface metrics store.
    pub metric_unit: MetricUnit,

    /// The number of interface slots in the metrics store. Interface
    /// indexes at or above this value always read as missing.
    pub max_ifaces: u32,
}

impl HookCfg {
    pub const DEFAULT_MAX_IFACES: u32 = 256;
}

impl Default for HookCfg {
    fn default() -> Self {
        Self {
            program: ProgramCfg::default(),
            metric_unit: MetricUnit::default(),
            max_ifaces: Self::DEFAULT_MAX_IFACES,
        }
    }
}
