// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The egress hook.
//!
//! An [`XmitHook`] is invoked once per outbound packet. It runs the
//! configured program against the packet and tells the caller whether
//! to forward it unchanged, drop it, or redo its route lookup because
//! the destination was rewritten in place.
//!
//! The hook holds no per-packet state, so a single instance may be
//! shared by every thread that transmits.

use super::advance;
use super::ip6::Ipv6Addr;
use super::ip6::Ipv6Hdr;
use super::ip6::Ipv6HdrError;
use super::metrics::MetricsStore;
use super::packet::PacketMut;
use super::packet::PacketView;
use super::packet::ReadErr;
use super::packet::WriteErr;
use super::policy;
use super::policy::Decision;
use super::policy::MetricCheck;
use super::rewrite;
use super::srh::SegmentList;
use super::srh::SegmentRoutingHdr;
use super::srh::SrhError;
use super::stat::HookStats;
use super::stat::StatKey;
use crate::api::HookCfg;
use crate::api::HookStatsSnap;
use crate::api::MetricUnit;
use crate::api::PolicyFn;
use crate::api::ProgramCfg;
use crate::api::Sid;
use crate::api::Verdict;
use crate::d_error::DError;
use crate::d_error::ErrorBlock;
use crate::provider::LogLevel;
use crate::provider::LogProvider;
use crate::ulog;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use core::fmt::Display;

/// Why a segment could not be selected.
#[derive(Clone, Copy, Debug, DError, Eq, PartialEq)]
#[derror(leaf_data = SegmentErr::data)]
pub enum SegmentErr {
    /// Segments Left was already zero.
    NoSegmentsLeft,
    /// The selected index lies outside the segment list.
    IndexOutOfRange { index: u8, len: u16 },
}

impl SegmentErr {
    fn data(&self, data: &mut [u64]) {
        if let Self::IndexOutOfRange { index, len } = self {
            [data[0], data[1]] = [u64::from(*index), u64::from(*len)];
        }
    }
}

/// The reason a packet was dropped.
#[derive(Clone, Copy, Debug, DError, Eq, PartialEq)]
#[derror(leaf_data = DropReason::data)]
pub enum DropReason {
    /// A header the program needed runs past the end of the packet.
    Truncated(ReadErr),
    /// The extension header following IPv6 is not an SRH.
    WrongExtensionType(SrhError),
    /// There is no segment to advance to.
    ExhaustedSegments(SegmentErr),
    /// A conditional policy referenced an interface with no metric.
    MissingMetric { iface: u32 },
    /// Skipping would move past the final segment.
    UnsupportedDecap { advanced: u8, num_skip: u8 },
    /// A conditional policy used a comparator code with no meaning.
    UnknownComparator { cmp: u8 },
    /// The environment failed a write into the packet.
    StoreFailed(WriteErr),
    /// The packet did not read back what was just written to it.
    Inconsistent,
}

impl DropReason {
    fn data(&self, data: &mut [u64]) {
        match self {
            Self::MissingMetric { iface } => data[0] = u64::from(*iface),
            Self::UnsupportedDecap { advanced, num_skip } => {
                [data[0], data[1]] =
                    [u64::from(*advanced), u64::from(*num_skip)];
            }
            Self::UnknownComparator { cmp } => data[0] = u64::from(*cmp),
            _ => {}
        }
    }
}

impl From<Ipv6HdrError> for DropReason {
    fn from(err: Ipv6HdrError) -> Self {
        match err {
            Ipv6HdrError::Truncated(err) => Self::Truncated(err),
        }
    }
}

impl From<SrhError> for DropReason {
    fn from(err: SrhError) -> Self {
        match err {
            SrhError::Truncated(err) => Self::Truncated(err),
            _ => Self::WrongExtensionType(err),
        }
    }
}

impl From<ReadErr> for DropReason {
    fn from(err: ReadErr) -> Self {
        Self::Truncated(err)
    }
}

/// The result of running a hook over one packet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessResult {
    Pass,
    Drop { reason: DropReason },
    Reroute,
}

impl ProcessResult {
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::Pass => Verdict::Pass,
            Self::Drop { .. } => Verdict::Drop,
            Self::Reroute => Verdict::Reroute,
        }
    }
}

impl From<Result<ProcessResult, DropReason>> for ProcessResult {
    fn from(res: Result<ProcessResult, DropReason>) -> Self {
        res.unwrap_or_else(|reason| Self::Drop { reason })
    }
}

/// Why an [`XmitHook`] could not be created.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HookCreateError {
    /// The configured metric unit differs from the unit the store
    /// publishes in.
    MetricUnitMismatch { cfg: MetricUnit, store: MetricUnit },
}

impl Display for HookCreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetricUnitMismatch { cfg, store } => write!(
                f,
                "hook configured for metrics in {cfg} but store publishes {store}",
            ),
        }
    }
}

/// A traffic-engineering program attached to the transmit path.
pub struct XmitHook {
    name: String,
    cfg: HookCfg,
    metrics: Arc<dyn MetricsStore>,
    log: Arc<dyn LogProvider>,
    stats: HookStats,
}

impl fmt::Debug for XmitHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmitHook")
            .field("name", &self.name)
            .field("cfg", &self.cfg)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl XmitHook {
    /// Create a hook running `cfg.program`.
    ///
    /// The metrics store must publish values in `cfg.metric_unit`, the
    /// unit policy thresholds are written in.
    pub fn new(
        name: &str,
        cfg: HookCfg,
        metrics: Arc<dyn MetricsStore>,
        log: Arc<dyn LogProvider>,
    ) -> Result<Self, HookCreateError> {
        let store = metrics.unit();
        if store != cfg.metric_unit {
            return Err(HookCreateError::MetricUnitMismatch {
                cfg: cfg.metric_unit,
                store,
            });
        }

        Ok(Self {
            name: String::from(name),
            cfg,
            metrics,
            log,
            stats: HookStats::new(),
        })
    }

    pub fn cfg(&self) -> &HookCfg {
        &self.cfg
    }

    pub fn stats(&self) -> HookStatsSnap {
        self.stats.snapshot()
    }

    /// Run the configured program over `pkt`.
    ///
    /// On [`ProcessResult::Reroute`] the packet has been modified and
    /// the caller must redo its route lookup. On any other result the
    /// packet bytes are either untouched or must be discarded.
    pub fn process<P>(&self, pkt: &mut P) -> ProcessResult
    where
        P: PacketMut + ?Sized,
    {
        self.stats.incr(StatKey::Processed);

        let res = ProcessResult::from(match self.cfg.program {
            ProgramCfg::SkipSegments => self.skip_segments(pkt),
            ProgramCfg::RewriteDst { match_dst, new_dst } => {
                self.rewrite_dst(pkt, match_dst, new_dst)
            }
        });

        match &res {
            ProcessResult::Pass => self.stats.incr(StatKey::Passed),
            ProcessResult::Reroute => self.stats.incr(StatKey::Rerouted),
            ProcessResult::Drop { reason } => {
                self.stats.incr(StatKey::Dropped);
                self.log_drop(reason);
            }
        }

        res
    }

    fn log_drop(&self, reason: &DropReason) {
        let eb = ErrorBlock::<8>::from_err(reason).unwrap_or_else(|eb| eb);
        ulog!(self.log, LogLevel::Warn, "{}: drop {eb}", self.name);
    }

    fn log_check(&self, check: &MetricCheck) {
        let unit = self.cfg.metric_unit;
        ulog!(
            self.log,
            LogLevel::Note,
            "{}: iface {} metric {} {unit} {} {} {unit}: {}",
            self.name,
            check.iface,
            check.value,
            check.comparator,
            check.threshold,
            if check.matched { "skip" } else { "advance" },
        );
    }

    fn skip_segments<P>(&self, pkt: &mut P) -> Result<ProcessResult, DropReason>
    where
        P: PacketMut + ?Sized,
    {
        let (old_dst, old_sl, decision) = {
            let view = PacketView::new(&*pkt);
            let ip6 = Ipv6Hdr::parse(&view)?;
            let old_dst = ip6.dst();
            let policy = Sid::decode(&old_dst).policy();
            if policy == PolicyFn::None {
                return Ok(ProcessResult::Pass);
            }

            let srh = SegmentRoutingHdr::parse(&view, &ip6)?;
            let (decision, check) =
                policy::evaluate_with_check(&policy, &srh, &*self.metrics);
            if let Some(check) = check {
                self.log_check(&check);
            }
            (old_dst, srh.segments_left(), decision)
        };

        match decision {
            Decision::Pass => Ok(ProcessResult::Pass),
            Decision::Drop(reason) => Err(reason),
            Decision::Reroute { dst, segments_left } => {
                advance::apply_reroute(pkt, dst, segments_left)?;
                ulog!(
                    self.log,
                    LogLevel::Note,
                    "{}: reroute {old_dst} -> {dst} sl {old_sl} -> {segments_left}",
                    self.name,
                );
                Ok(ProcessResult::Reroute)
            }
        }
    }

    fn rewrite_dst<P>(
        &self,
        pkt: &mut P,
        match_dst: Ipv6Addr,
        new_dst: Ipv6Addr,
    ) -> Result<ProcessResult, DropReason>
    where
        P: PacketMut + ?Sized,
    {
        if !rewrite::rewrite_dst(pkt, match_dst, new_dst)? {
            return Ok(ProcessResult::Pass);
        }

        self.stats.incr(StatKey::Rewritten);
        ulog!(
            self.log,
            LogLevel::Note,
            "{}: rewrite {match_dst} -> {new_dst}",
            self.name,
        );
        Ok(ProcessResult::Reroute)
    }
}
