// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Apply a reroute decision to the packet.

use super::hook::DropReason;
use super::ip6::Ipv6Addr;
use super::ip6::Ipv6Hdr;
use super::packet::PacketMut;
use super::packet::PacketView;
use super::srh::SegmentList;
use super::srh::SegmentRoutingHdr;

/// Re-derive the IPv6 and SRH views from the current packet bytes and
/// return the absolute offset of Segments Left.
fn srh_segments_left_offset<P>(pkt: &P) -> Result<usize, DropReason>
where
    P: PacketMut + ?Sized,
{
    let view = PacketView::new(pkt);
    let ip6 = Ipv6Hdr::parse(&view)?;
    let srh = SegmentRoutingHdr::parse(&view, &ip6)?;
    Ok(srh.segments_left_offset())
}

/// Write `dst` as the destination address and `segments_left` into the
/// SRH.
///
/// The packet is re-parsed after each write: the destination write may
/// have moved the buffer, and the SRH must still be whole before its
/// Segments Left field is touched. Once both writes land, the headers
/// are parsed one final time and checked to hold what was written.
pub fn apply_reroute<P>(
    pkt: &mut P,
    dst: Ipv6Addr,
    segments_left: u8,
) -> Result<(), DropReason>
where
    P: PacketMut + ?Sized,
{
    pkt.store_bytes(Ipv6Hdr::DST_OFFSET, &dst.bytes())
        .map_err(DropReason::StoreFailed)?;

    let sl_off = srh_segments_left_offset(pkt)?;
    pkt.store_bytes(sl_off, &[segments_left])
        .map_err(DropReason::StoreFailed)?;

    let view = PacketView::new(pkt);
    let ip6 = Ipv6Hdr::parse(&view)?;
    let srh = SegmentRoutingHdr::parse(&view, &ip6)?;
    if ip6.dst() != dst || srh.segments_left() != segments_left {
        return Err(DropReason::Inconsistent);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::packet::Packet;
    use crate::engine::packet::WriteErr;
    use crate::engine::packet::WriteResult;
    use alloc::vec::Vec;

    fn seg(n: u16) -> Ipv6Addr {
        Ipv6Addr::from_const([0xfc00, n, 0, 0, 0, 0, 0, 0])
    }

    fn pkt(sl: u8) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0x60, 0, 0, 0, 0, 56, 43, 64]);
        bytes.extend_from_slice(&seg(0xaa).bytes());
        bytes.extend_from_slice(&seg(u16::from(sl)).bytes());
        bytes.extend_from_slice(&[59, 6, 4, sl, 2, 0, 0, 0]);
        for n in 0..3 {
            bytes.extend_from_slice(&seg(n).bytes());
        }
        bytes
    }

    #[test]
    fn rewrites_both_fields() {
        let mut p = Packet::from(pkt(2));
        apply_reroute(&mut p, seg(0), 0).unwrap();

        let view = PacketView::new(&p);
        let ip6 = Ipv6Hdr::parse(&view).unwrap();
        let srh = SegmentRoutingHdr::parse(&view, &ip6).unwrap();
        assert_eq!(ip6.dst(), seg(0));
        assert_eq!(srh.segments_left(), 0);
        assert_eq!(srh.segments().count(), 3);
    }

    // A buffer that loses its tail on the first write, the way an
    // environment may reallocate on store.
    struct Shrinks {
        inner: Packet,
        keep: usize,
    }

    impl PacketMut for Shrinks {
        fn data(&self) -> &[u8] {
            self.inner.data()
        }

        fn store_bytes(&mut self, off: usize, src: &[u8]) -> WriteResult<()> {
            self.inner.store_bytes(off, src)?;
            let mut bytes = core::mem::take(&mut self.inner).into_bytes();
            bytes.truncate(self.keep);
            self.inner = Packet::from(bytes);
            Ok(())
        }
    }

    #[test]
    fn revalidates_after_write() {
        let mut p = Shrinks { inner: Packet::from(pkt(2)), keep: 46 };
        assert!(matches!(
            apply_reroute(&mut p, seg(1), 1),
            Err(DropReason::Truncated(_))
        ));

        let mut p = Shrinks { inner: Packet::from(pkt(2)), keep: 30 };
        assert!(matches!(
            apply_reroute(&mut p, seg(1), 1),
            Err(DropReason::Truncated(_))
        ));
    }

    struct Refuses;

    impl PacketMut for Refuses {
        fn data(&self) -> &[u8] {
            &[]
        }

        fn store_bytes(&mut self, _: usize, _: &[u8]) -> WriteResult<()> {
            Err(WriteErr::Rejected)
        }
    }

    #[test]
    fn failed_store() {
        assert_eq!(
            apply_reroute(&mut Refuses, seg(1), 1),
            Err(DropReason::StoreFailed(WriteErr::Rejected))
        );
    }
}
