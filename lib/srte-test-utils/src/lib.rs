// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Common routines for integration tests.

// This type of pedantry is more trouble than it's worth here.
#![allow(dead_code)]

pub mod pkt;
pub mod provider;

// Let's make our lives easier and pub use a bunch of stuff.
pub use pkt::*;
pub use provider::*;
pub use srte::api::Comparator;
pub use srte::api::HookCfg;
pub use srte::api::HookStatsSnap;
pub use srte::api::Ipv6Addr;
pub use srte::api::METRIC_SELECTOR_IFACE;
pub use srte::api::MetricUnit;
pub use srte::api::ProgramCfg;
pub use srte::api::SkipArgs;
pub use srte::api::SkipIfArgs;
pub use srte::api::Verdict;
pub use srte::engine::DropReason;
pub use srte::engine::HookCreateError;
pub use srte::engine::IfaceMetrics;
pub use srte::engine::MetricsStore;
pub use srte::engine::Packet;
pub use srte::engine::PacketMut;
pub use srte::engine::ProcessResult;
pub use srte::engine::XmitHook;
pub use srte::engine::hook::SegmentErr;
pub use std::sync::Arc;

/// The locator every test SID lives under.
pub const TEST_LOCATOR: Ipv6Addr =
    Ipv6Addr::from_const([0xfc00, 0x000a, 0x00ff, 0, 0, 0, 0, 0]);

/// A plain segment address, `fc00:<n>::`, carrying no policy.
pub fn seg(n: u16) -> Ipv6Addr {
    Ipv6Addr::from_const([0xfc00, n, 0, 0, 0, 0, 0, 0])
}

/// The source address used by every generated packet.
pub fn test_src() -> Ipv6Addr {
    Ipv6Addr::from_const([0xfc00, 0x000a, 0x0001, 0, 0, 0, 0, 1])
}

/// A SkipSegments SID under [`TEST_LOCATOR`].
pub fn skip_sid(num_skip: u8) -> Ipv6Addr {
    SkipArgs { num_skip }.sid().encode(TEST_LOCATOR)
}

/// A SkipSegmentsIf SID under [`TEST_LOCATOR`] testing the metric of
/// `iface`.
pub fn skip_if_sid(
    num_skip: u8,
    iface: u8,
    comparator: Comparator,
    threshold: u16,
) -> Ipv6Addr {
    SkipIfArgs {
        num_skip,
        metric_selector: METRIC_SELECTOR_IFACE,
        comparator,
        iface,
        threshold,
    }
    .sid()
    .encode(TEST_LOCATOR)
}

/// Build a hook running `program` over the given metrics and log. The
/// metric unit is taken from the store.
pub fn hook(
    program: ProgramCfg,
    metrics: Arc<dyn MetricsStore>,
    log: Arc<RecordingLog>,
) -> XmitHook {
    let cfg = HookCfg {
        program,
        metric_unit: metrics.unit(),
        ..Default::default()
    };
    XmitHook::new("test", cfg, metrics, log).unwrap()
}
