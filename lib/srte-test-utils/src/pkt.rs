// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Packet generation and fault-injecting packet buffers.

use smoltcp::phy::ChecksumCapabilities as CsumCapab;
use smoltcp::wire::Icmpv6Packet;
use smoltcp::wire::Icmpv6Repr;
use smoltcp::wire::IpAddress;
use smoltcp::wire::IpProtocol;
use smoltcp::wire::Ipv6Address;
use smoltcp::wire::Ipv6Packet;
use smoltcp::wire::Ipv6Repr;
use srte::api::Ipv6Addr;
use srte::engine::ip6::Ipv6Hdr;
use srte::engine::packet::PacketView;
use srte::engine::packet::WriteErr;
use srte::engine::packet::WriteResult;
use srte::engine::srh::ROUTING_TYPE_SRH;
use srte::engine::srh::SegmentList;
use srte::engine::srh::SegmentRoutingHdr;
use srte::engine::srh::SrhFixed;
use srte::engine::Packet;
use srte::engine::PacketMut;
use zerocopy::IntoBytes;

/// "No Next Header": the SRH is the last header before an opaque
/// payload.
pub const NO_NEXT_HDR: u8 = 59;

fn emit_ipv6(
    src: Ipv6Addr,
    dst: Ipv6Addr,
    next_header: IpProtocol,
    payload_len: usize,
) -> Vec<u8> {
    let ip = Ipv6Repr {
        src_addr: Ipv6Address::from_bytes(&src.bytes()),
        dst_addr: Ipv6Address::from_bytes(&dst.bytes()),
        next_header,
        payload_len,
        hop_limit: 64,
    };
    let mut bytes = vec![0u8; ip.buffer_len()];
    ip.emit(&mut Ipv6Packet::new_unchecked(&mut bytes));
    bytes
}

/// Build an IPv6 packet carrying an SRH with `segments` (index 0 is
/// the final segment) followed by `payload`.
///
/// The destination is the segment selected by `segments_left`, or
/// `dst` when given.
pub fn srv6_packet(
    segments: &[Ipv6Addr],
    segments_left: u8,
    dst: Option<Ipv6Addr>,
    payload: &[u8],
) -> Vec<u8> {
    assert!(!segments.is_empty() && segments.len() <= 128);
    let dst = dst.unwrap_or_else(|| segments[usize::from(segments_left)]);

    let srh = SrhFixed {
        next_header: NO_NEXT_HDR,
        hdr_ext_len: (segments.len() * 2) as u8,
        routing_type: ROUTING_TYPE_SRH,
        segments_left,
        last_entry: (segments.len() - 1) as u8,
        flags: 0,
        tag: [0; 2],
    };
    let srh_len = SegmentRoutingHdr::FIXED_SIZE + segments.len() * 16;

    let mut bytes = emit_ipv6(
        crate::test_src(),
        dst,
        IpProtocol::Ipv6Route,
        srh_len + payload.len(),
    );
    bytes.extend_from_slice(srh.as_bytes());
    for seg in segments {
        bytes.extend_from_slice(&seg.bytes());
    }
    bytes.extend_from_slice(payload);
    bytes
}

/// Build an IPv6 packet with no extension headers: a fixed header with
/// `next_header` followed by `payload`.
pub fn plain_packet(dst: Ipv6Addr, next_header: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = emit_ipv6(
        crate::test_src(),
        dst,
        IpProtocol::from(next_header),
        payload.len(),
    );
    bytes.extend_from_slice(payload);
    bytes
}

/// Build an IPv6 ICMPv6 Echo Request with a valid checksum.
pub fn icmpv6_echo_req(
    src: Ipv6Addr,
    dst: Ipv6Addr,
    ident: u16,
    seq_no: u16,
    data: &[u8],
) -> Vec<u8> {
    let icmp = Icmpv6Repr::EchoRequest { ident, seq_no, data };
    let mut body = vec![0u8; icmp.buffer_len()];
    let mut req = Icmpv6Packet::new_unchecked(&mut body);
    icmp.emit(
        &Ipv6Address::from_bytes(&src.bytes()).into(),
        &Ipv6Address::from_bytes(&dst.bytes()).into(),
        &mut req,
        &CsumCapab::default(),
    );

    let mut bytes = emit_ipv6(src, dst, IpProtocol::Icmpv6, body.len());
    bytes.extend_from_slice(&body);
    bytes
}

/// Verify the ICMPv6 checksum of a packet built by
/// [`icmpv6_echo_req()`], against the addresses currently in its IPv6
/// header.
pub fn icmpv6_csum_ok(bytes: &[u8]) -> bool {
    let ip = Ipv6Packet::new_checked(bytes).expect("valid IPv6 header");
    let src: IpAddress = ip.src_addr().into();
    let dst: IpAddress = ip.dst_addr().into();
    let icmp = Icmpv6Packet::new_checked(&bytes[Ipv6Hdr::BASE_SIZE..])
        .expect("valid ICMPv6 header");
    icmp.verify_checksum(&src, &dst)
}

/// Return the destination and Segments Left of a packet.
pub fn dst_and_sl(bytes: &[u8]) -> (Ipv6Addr, u8) {
    let view = PacketView::from_bytes(bytes);
    let ip6 = Ipv6Hdr::parse(&view).expect("IPv6 header");
    let srh = SegmentRoutingHdr::parse(&view, &ip6).expect("SRH");
    (ip6.dst(), srh.segments_left())
}

/// A packet whose buffer is cut down to `keep` bytes after `after`
/// successful writes, emulating an environment that reallocates (and
/// loses data) on store.
#[derive(Debug)]
pub struct ShrinkingPacket {
    inner: Packet,
    writes: usize,
    after: usize,
    keep: usize,
}

impl ShrinkingPacket {
    pub fn new(bytes: Vec<u8>, after: usize, keep: usize) -> Self {
        Self { inner: Packet::from(bytes), writes: 0, after, keep }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn bytes(&self) -> &[u8] {
        self.inner.bytes()
    }
}

impl PacketMut for ShrinkingPacket {
    fn data(&self) -> &[u8] {
        self.inner.data()
    }

    fn store_bytes(&mut self, offset: usize, src: &[u8]) -> WriteResult<()> {
        self.inner.store_bytes(offset, src)?;
        self.writes += 1;
        if self.writes == self.after {
            let mut bytes = std::mem::take(&mut self.inner).into_bytes();
            bytes.truncate(self.keep);
            self.inner = Packet::from(bytes);
        }
        Ok(())
    }
}

/// A packet that refuses its `nth` write (counting from 1).
#[derive(Debug)]
pub struct FailingPacket {
    inner: Packet,
    writes: usize,
    nth: usize,
}

impl FailingPacket {
    pub fn new(bytes: Vec<u8>, nth: usize) -> Self {
        Self { inner: Packet::from(bytes), writes: 0, nth }
    }

    pub fn bytes(&self) -> &[u8] {
        self.inner.bytes()
    }
}

impl PacketMut for FailingPacket {
    fn data(&self) -> &[u8] {
        self.inner.data()
    }

    fn store_bytes(&mut self, offset: usize, src: &[u8]) -> WriteResult<()> {
        self.writes += 1;
        if self.writes == self.nth {
            return Err(WriteErr::Rejected);
        }
        self.inner.store_bytes(offset, src)
    }
}
