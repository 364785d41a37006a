// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Print engine state in a human-friendly manner.
//!
//! This is mostly just a place to hang printing routines so that they
//! can be used by both srteadm and integration tests.

use crate::api::HookStatsSnap;
use crate::api::Ipv6Addr;
use crate::api::MetricUnit;
use crate::api::Sid;
use crate::engine::ip6::Ipv6Hdr;
use crate::engine::packet::PacketView;
use crate::engine::srh::SegmentList;
use crate::engine::srh::SegmentRoutingHdr;
use std::io::Write;
use std::string::String;
use tabwriter::TabWriter;

/// Print the decoded form of a SID.
pub fn print_sid(addr: &Ipv6Addr) -> std::io::Result<()> {
    print_sid_into(&mut std::io::stdout(), addr)
}

/// Print the decoded form of a SID into a given writer.
pub fn print_sid_into(
    writer: &mut impl Write,
    addr: &Ipv6Addr,
) -> std::io::Result<()> {
    let sid = Sid::decode(addr);
    let mut t = TabWriter::new(writer);
    writeln!(t, "SID\t{addr}")?;
    writeln!(t, "LOCATOR\t{:#018x}", addr.locator())?;
    writeln!(t, "FUNCTION\t{:#06x} ({})", sid.function, sid.function_code())?;
    writeln!(t, "ARGUMENT\t{:#014x}", sid.argument)?;
    writeln!(t, "POLICY\t{:?}", sid.policy())?;
    t.flush()
}

/// Print the IPv6 destination and segment list held in `bytes`.
pub fn print_packet_into(
    writer: &mut impl Write,
    bytes: &[u8],
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    let view = PacketView::from_bytes(bytes);
    let Ok(ip6) = Ipv6Hdr::parse(&view) else {
        writeln!(t, "<truncated IPv6 header: {} bytes>", bytes.len())?;
        return t.flush();
    };

    writeln!(t, "SRC\t{}", ip6.src())?;
    writeln!(t, "DST\t{}", ip6.dst())?;
    writeln!(t, "NEXT HDR\t{}", ip6.next_hdr())?;

    match SegmentRoutingHdr::parse(&view, &ip6) {
        Ok(srh) => {
            writeln!(t, "SEGMENTS LEFT\t{}", srh.segments_left())?;
            write_hr(&mut t)?;
            writeln!(t, "IDX\tSEGMENT\tACTIVE")?;
            for (idx, seg) in srh.segments().enumerate() {
                let active = if idx == usize::from(srh.segments_left()) {
                    "*"
                } else {
                    ""
                };
                writeln!(t, "{idx}\t{seg}\t{active}")?;
            }
        }

        Err(_) => writeln!(t, "SRH\tnone")?,
    }

    t.flush()
}

/// Print a [`HookStatsSnap`].
pub fn print_stats(stats: &HookStatsSnap) -> std::io::Result<()> {
    print_stats_into(&mut std::io::stdout(), stats)
}

/// Print a [`HookStatsSnap`] into a given writer.
pub fn print_stats_into(
    writer: &mut impl Write,
    stats: &HookStatsSnap,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    writeln!(t, "PROCESSED\tPASSED\tDROPPED\tREROUTED\tREWRITTEN")?;
    writeln!(
        t,
        "{}\t{}\t{}\t{}\t{}",
        stats.processed,
        stats.passed,
        stats.dropped,
        stats.rerouted,
        stats.rewritten,
    )?;
    t.flush()
}

/// Print interface metric entries.
pub fn print_metrics_into(
    writer: &mut impl Write,
    unit: MetricUnit,
    entries: &[(u32, u64)],
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    writeln!(t, "IFACE\tVALUE")?;
    for (iface, val) in entries {
        let val = match unit {
            MetricUnit::Bytes => humanize_size(*val),
            _ => format!("{val} {unit}"),
        };
        writeln!(t, "{iface}\t{val}")?;
    }
    t.flush()
}

/// Render a byte count with a binary unit suffix, truncating toward
/// zero.
pub fn humanize_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut size = size;
    for unit in UNITS {
        if size < 1024 {
            return format!("{size} {unit}");
        }
        size >>= 10;
    }
    format!("{size} TiB")
}

/// Print a horizontal rule.
pub fn write_hr(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:-<70}", "-")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn humanize() {
        assert_eq!(humanize_size(0), "0 B");
        assert_eq!(humanize_size(1023), "1023 B");
        assert_eq!(humanize_size(1024), "1 KiB");
        assert_eq!(humanize_size(1536), "1 KiB");
        assert_eq!(humanize_size(5 << 20), "5 MiB");
        assert_eq!(humanize_size(3 << 30), "3 GiB");
        assert_eq!(humanize_size(2048 << 30), "2 TiB");
        assert_eq!(humanize_size(u64::MAX), "16777215 TiB");
    }

    #[test]
    fn sid_table() {
        let addr: Ipv6Addr = "fc00:a:ff:0:8001:200::".parse().unwrap();
        let mut out = Vec::new();
        print_sid_into(&mut out, &addr).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("0x8001 (skip-segments)"));
        assert!(out.contains("SkipSegments(SkipArgs { num_skip: 2 })"));
    }

    #[test]
    fn stats_table() {
        let mut out = Vec::new();
        let stats = HookStatsSnap { processed: 3, dropped: 1, ..Default::default() };
        print_stats_into(&mut out, &stats).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("PROCESSED"));
        assert_eq!(
            lines[1].split_whitespace().collect::<Vec<_>>(),
            ["3", "0", "1", "0", "0"]
        );
    }
}
