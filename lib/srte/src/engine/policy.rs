// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Evaluate the policy carried in a SID against a segment list.
//!
//! Evaluation is pure: it reads the segment list and the metrics store
//! and produces a [`Decision`]. Applying a reroute to the packet is
//! the job of [`super::advance`].
//!
//! Normal SRv6 processing moves to the segment at `segments_left - 1`.
//! A skip policy moves `num_skip` segments further than that. Skipping
//! past segment 0 would require decapsulation, which is not supported;
//! such packets are dropped.

use super::hook::DropReason;
use super::hook::SegmentErr;
use super::ip6::Ipv6Addr;
use super::metrics::MetricsStore;
use super::srh::SegmentList;
use crate::api::Comparator;
use crate::api::METRIC_SELECTOR_IFACE;
use crate::api::PolicyFn;
use crate::api::SkipIfArgs;

/// The outcome of evaluating a policy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    /// No policy applies; leave the packet alone.
    Pass,

    /// Discard the packet.
    Drop(DropReason),

    /// Set the destination to `dst` and Segments Left to
    /// `segments_left`.
    Reroute { dst: Ipv6Addr, segments_left: u8 },
}

/// A metric comparison made while evaluating a SkipSegmentsIf
/// policy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MetricCheck {
    pub iface: u32,
    pub value: u64,
    pub comparator: Comparator,
    pub threshold: u64,
    pub matched: bool,
}

/// Decide what to do with a packet whose active SID carries `policy`.
pub fn evaluate<S, M>(policy: &PolicyFn, srh: &S, metrics: &M) -> Decision
where
    S: SegmentList + ?Sized,
    M: MetricsStore + ?Sized,
{
    evaluate_with_check(policy, srh, metrics).0
}

/// Like [`evaluate()`], also returning the metric comparison the
/// decision was based on, if one was made.
pub fn evaluate_with_check<S, M>(
    policy: &PolicyFn,
    srh: &S,
    metrics: &M,
) -> (Decision, Option<MetricCheck>)
where
    S: SegmentList + ?Sized,
    M: MetricsStore + ?Sized,
{
    let (num_skip, skip, check) = match policy {
        PolicyFn::None => return (Decision::Pass, None),

        PolicyFn::SkipSegments(args) => (args.num_skip, true, None),

        PolicyFn::SkipSegmentsIf(args) => match condition(args, metrics) {
            Ok(check) => {
                (args.num_skip, check.is_some_and(|c| c.matched), check)
            }
            Err(reason) => return (Decision::Drop(reason), None),
        },
    };

    (advance_to(srh, if skip { num_skip } else { 0 }), check)
}

/// Evaluate the condition of a SkipSegmentsIf policy.
///
/// Only the interface metric selector is understood; any other
/// selector never matches and yields `None`. A missing metric or an
/// unknown comparator is an error rather than a non-match.
pub fn condition<M>(
    args: &SkipIfArgs,
    metrics: &M,
) -> Result<Option<MetricCheck>, DropReason>
where
    M: MetricsStore + ?Sized,
{
    if args.metric_selector != METRIC_SELECTOR_IFACE {
        return Ok(None);
    }

    let iface = u32::from(args.iface);
    let value =
        metrics.get(iface).ok_or(DropReason::MissingMetric { iface })?;
    let threshold = u64::from(args.threshold);

    let matched = args.comparator.compare(value, threshold).ok_or(
        DropReason::UnknownComparator { cmp: u8::from(args.comparator) },
    )?;

    Ok(Some(MetricCheck {
        iface,
        value,
        comparator: args.comparator,
        threshold,
        matched,
    }))
}

/// Compute the reroute that moves past the active segment and then
/// skips `num_skip` more.
pub fn advance_to<S>(srh: &S, num_skip: u8) -> Decision
where
    S: SegmentList + ?Sized,
{
    let Some(advanced) = srh.segments_left().checked_sub(1) else {
        return Decision::Drop(DropReason::ExhaustedSegments(
            SegmentErr::NoSegmentsLeft,
        ));
    };

    let Some(target) = advanced.checked_sub(num_skip) else {
        return Decision::Drop(DropReason::UnsupportedDecap {
            advanced,
            num_skip,
        });
    };

    match srh.segment(target) {
        Some(dst) => Decision::Reroute { dst, segments_left: target },
        None => Decision::Drop(DropReason::ExhaustedSegments(
            SegmentErr::IndexOutOfRange {
                index: target,
                len: srh.num_segments(),
            },
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::MetricUnit;
    use crate::api::SkipArgs;
    use crate::engine::metrics::IfaceMetrics;
    use alloc::vec::Vec;

    struct Segs {
        sl: u8,
        list: Vec<Ipv6Addr>,
    }

    impl SegmentList for Segs {
        fn segments_left(&self) -> u8 {
            self.sl
        }

        fn num_segments(&self) -> u16 {
            self.list.len() as u16
        }

        fn segment(&self, idx: u8) -> Option<Ipv6Addr> {
            self.list.get(usize::from(idx)).copied()
        }
    }

    fn seg(n: u16) -> Ipv6Addr {
        Ipv6Addr::from_const([0xfc00, n, 0, 0, 0, 0, 0, 0])
    }

    fn five(sl: u8) -> Segs {
        Segs { sl, list: (0..5).map(seg).collect() }
    }

    fn skip_if(num_skip: u8, cmp: Comparator, threshold: u16) -> PolicyFn {
        PolicyFn::SkipSegmentsIf(SkipIfArgs {
            num_skip,
            metric_selector: METRIC_SELECTOR_IFACE,
            comparator: cmp,
            iface: 2,
            threshold,
        })
    }

    fn metrics(val: Option<u64>) -> IfaceMetrics {
        let m = IfaceMetrics::new(8, MetricUnit::MegabitsPerSec);
        if let Some(val) = val {
            m.set(2, val).unwrap();
        }
        m
    }

    #[test]
    fn no_policy_passes() {
        assert_eq!(
            evaluate(&PolicyFn::None, &five(0), &metrics(None)),
            Decision::Pass
        );
    }

    #[test]
    fn unconditional_skip() {
        let policy = PolicyFn::SkipSegments(SkipArgs { num_skip: 2 });
        assert_eq!(
            evaluate(&policy, &five(4), &metrics(None)),
            Decision::Reroute { dst: seg(1), segments_left: 1 }
        );
    }

    #[test]
    fn conditional_match_and_miss() {
        let m = metrics(Some(500));
        assert_eq!(
            evaluate(&skip_if(2, Comparator::Gt, 100), &five(4), &m),
            Decision::Reroute { dst: seg(1), segments_left: 1 }
        );
        assert_eq!(
            evaluate(&skip_if(2, Comparator::Lt, 100), &five(4), &m),
            Decision::Reroute { dst: seg(3), segments_left: 3 }
        );
    }

    #[test]
    fn other_selector_never_matches() {
        let policy = PolicyFn::SkipSegmentsIf(SkipIfArgs {
            num_skip: 2,
            metric_selector: 7,
            comparator: Comparator::Unknown(9),
            iface: 2,
            threshold: 0,
        });
        assert_eq!(
            evaluate(&policy, &five(4), &metrics(None)),
            Decision::Reroute { dst: seg(3), segments_left: 3 }
        );
    }

    #[test]
    fn drops() {
        assert_eq!(
            evaluate(&skip_if(1, Comparator::Eq, 5), &five(4), &metrics(None)),
            Decision::Drop(DropReason::MissingMetric { iface: 2 })
        );
        assert_eq!(
            evaluate(
                &skip_if(1, Comparator::Unknown(3), 5),
                &five(4),
                &metrics(Some(5))
            ),
            Decision::Drop(DropReason::UnknownComparator { cmp: 3 })
        );
        assert_eq!(
            advance_to(&five(0), 0),
            Decision::Drop(DropReason::ExhaustedSegments(
                SegmentErr::NoSegmentsLeft
            ))
        );
        assert_eq!(
            advance_to(&five(2), 2),
            Decision::Drop(DropReason::UnsupportedDecap {
                advanced: 1,
                num_skip: 2
            })
        );

        // Segments Left claims more segments than the list holds.
        assert_eq!(
            advance_to(&Segs { sl: 9, list: (0..5).map(seg).collect() }, 1),
            Decision::Drop(DropReason::ExhaustedSegments(
                SegmentErr::IndexOutOfRange { index: 7, len: 5 }
            ))
        );
    }

    #[test]
    fn skip_to_final_segment() {
        assert_eq!(
            advance_to(&five(3), 2),
            Decision::Reroute { dst: seg(0), segments_left: 0 }
        );
    }

    #[test]
    fn check_reports_comparison() {
        let m = metrics(Some(150));
        let (decision, check) = evaluate_with_check(
            &skip_if(1, Comparator::Gt, 100),
            &five(2),
            &m,
        );
        assert_eq!(decision, Decision::Reroute { dst: seg(0), segments_left: 0 });
        assert_eq!(
            check,
            Some(MetricCheck {
                iface: 2,
                value: 150,
                comparator: Comparator::Gt,
                threshold: 100,
                matched: true,
            })
        );

        let policy = PolicyFn::SkipSegments(SkipArgs { num_skip: 0 });
        assert_eq!(evaluate_with_check(&policy, &five(2), &m).1, None);
    }
}
