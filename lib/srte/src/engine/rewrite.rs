// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Exact-match destination rewrite.
//!
//! Unlike the segment programs, a plain destination rewrite changes the
//! address that the upper-layer checksum's pseudo header is computed
//! over. When the packet carries ICMPv6 directly after the fixed
//! header, its checksum is patched incrementally, one 32-bit word of
//! the address at a time.

use super::checksum::HeaderChecksum;
use super::hook::DropReason;
use super::ip6::Ipv6Addr;
use super::ip6::Ipv6Hdr;
use super::packet::PacketMut;
use super::packet::PacketView;
use smoltcp::wire::IpProtocol;

/// The offset of the checksum field within an ICMPv6 header.
pub const ICMPV6_CSUM_OFFSET: usize = 2;

/// Replace the destination with `new_dst` if it currently equals
/// `match_dst`.
///
/// Returns `Ok(false)` and leaves the packet untouched when the
/// destination does not match.
pub fn rewrite_dst<P>(
    pkt: &mut P,
    match_dst: Ipv6Addr,
    new_dst: Ipv6Addr,
) -> Result<bool, DropReason>
where
    P: PacketMut + ?Sized,
{
    let old_dst = {
        let view = PacketView::new(&*pkt);
        Ipv6Hdr::parse(&view)?.dst()
    };

    if old_dst != match_dst {
        return Ok(false);
    }

    pkt.store_bytes(Ipv6Hdr::DST_OFFSET, &new_dst.bytes())
        .map_err(DropReason::StoreFailed)?;

    let is_icmp = {
        let view = PacketView::new(&*pkt);
        let ip6 = Ipv6Hdr::parse(&view)?;
        if ip6.dst() != new_dst {
            return Err(DropReason::Inconsistent);
        }
        ip6.next_hdr() == IpProtocol::Icmpv6
    };

    if is_icmp {
        repair_icmpv6_csum(pkt, &old_dst, &new_dst)?;
    }

    Ok(true)
}

/// Patch the ICMPv6 checksum for a destination that changed from `old`
/// to `new`.
///
/// Each of the four address words is applied as its own update, and
/// the headers are re-parsed before and after every store.
pub fn repair_icmpv6_csum<P>(
    pkt: &mut P,
    old: &Ipv6Addr,
    new: &Ipv6Addr,
) -> Result<(), DropReason>
where
    P: PacketMut + ?Sized,
{
    let csum_off = Ipv6Hdr::BASE_SIZE + ICMPV6_CSUM_OFFSET;

    for (from, to) in old.words32().iter().zip(new.words32().iter()) {
        let hc = {
            let view = PacketView::new(&*pkt);
            Ipv6Hdr::parse(&view)?;
            HeaderChecksum::wrap(*view.array::<2>(csum_off)?)
        };

        let hc = hc.update(from, to);
        pkt.store_bytes(csum_off, &hc.bytes())
            .map_err(DropReason::StoreFailed)?;

        let view = PacketView::new(&*pkt);
        Ipv6Hdr::parse(&view)?;
        view.check(csum_off, 2)?;
    }

    Ok(())
}
