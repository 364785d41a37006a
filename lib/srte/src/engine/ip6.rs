// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! IPv6 headers.

use super::checksum::Checksum;
use super::packet::PacketView;
use super::packet::ReadErr;
use crate::d_error::DError;
pub use crate::api::Ipv6Addr;
use smoltcp::wire::IpProtocol;
use smoltcp::wire::Ipv6Packet;

/// The fixed portion of an IPv6 header, viewed in place.
///
/// Only the fixed 40 bytes are interpreted here; extension headers are
/// left to the views that understand them (see
/// [`super::srh::SegmentRoutingHdr`]).
#[derive(Debug)]
pub struct Ipv6Hdr<'a> {
    base: Ipv6Packet<&'a [u8]>,
}

impl<'a> Ipv6Hdr<'a> {
    /// The size of the fixed IPv6 header.
    pub const BASE_SIZE: usize = 40;

    /// The offset of the Next Header field.
    pub const NEXT_HDR_OFFSET: usize = 6;

    /// The offset of the Source Address field.
    pub const SRC_OFFSET: usize = 8;

    /// The offset of the Destination Address field.
    pub const DST_OFFSET: usize = 24;

    /// Parse the fixed IPv6 header at the start of the packet.
    ///
    /// The only requirement is that all 40 bytes are present.
    pub fn parse(view: &PacketView<'a>) -> Result<Self, Ipv6HdrError> {
        let buf = view.slice(0, Self::BASE_SIZE)?;
        Ok(Self { base: Ipv6Packet::new_unchecked(buf) })
    }

    /// Return the source address.
    pub fn src(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.base.src_addr().0)
    }

    /// Return the destination address.
    pub fn dst(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.base.dst_addr().0)
    }

    /// Return the Next Header value of the fixed header.
    pub fn next_hdr(&self) -> IpProtocol {
        self.base.next_header()
    }

    /// Return the hop limit value.
    pub fn hop_limit(&self) -> u8 {
        self.base.hop_limit()
    }

    /// Return the payload length.
    ///
    /// This length includes any extension headers along with the
    /// body.
    pub fn pay_len(&self) -> usize {
        usize::from(self.base.payload_len())
    }

    /// Populate `bytes` with the pseudo header bytes for an upper-layer
    /// protocol carried directly after the fixed header.
    pub fn pseudo_bytes(&self, bytes: &mut [u8; 40]) {
        bytes[0..16].copy_from_slice(&self.src().bytes());
        bytes[16..32].copy_from_slice(&self.dst().bytes());
        bytes[32..36].copy_from_slice(&(self.pay_len() as u32).to_be_bytes());
        bytes[36..40].copy_from_slice(&[0, 0, 0, u8::from(self.next_hdr())]);
    }

    /// Return a [`Checksum`] of the pseudo header.
    pub fn pseudo_csum(&self) -> Checksum {
        let mut pseudo_bytes = [0u8; 40];
        self.pseudo_bytes(&mut pseudo_bytes);
        Checksum::compute(&pseudo_bytes)
    }
}

#[derive(Clone, Copy, Debug, DError, Eq, PartialEq)]
pub enum Ipv6HdrError {
    Truncated(ReadErr),
}

impl From<ReadErr> for Ipv6HdrError {
    fn from(error: ReadErr) -> Self {
        Ipv6HdrError::Truncated(error)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[rustfmt::skip]
    const HDR: [u8; 40] = [
        // version + class + label
        0x60, 0x00, 0x00, 0x00,
        // payload len
        0x00, 0x20,
        // next header + hop limit
        0x3A, 0xFF,
        // source address
        0xFE, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0xBA, 0xF8, 0x53, 0xFF, 0xFE, 0xAF, 0x53, 0x7D,
        // dest address
        0xFC, 0x00, 0x00, 0x0A, 0x00, 0xFF, 0x00, 0x00,
        0x80, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn parse_fixed() {
        let view = PacketView::from_bytes(&HDR);
        let ip6 = Ipv6Hdr::parse(&view).unwrap();
        assert_eq!(ip6.src(), "fe80::baf8:53ff:feaf:537d".parse().unwrap());
        assert_eq!(ip6.dst(), "fc00:a:ff:0:8001:200::".parse().unwrap());
        assert_eq!(ip6.next_hdr(), IpProtocol::Icmpv6);
        assert_eq!(ip6.hop_limit(), 255);
        assert_eq!(ip6.pay_len(), 32);
    }

    #[test]
    fn truncated() {
        let view = PacketView::from_bytes(&HDR[..39]);
        assert_eq!(
            Ipv6Hdr::parse(&view).unwrap_err(),
            Ipv6HdrError::Truncated(ReadErr::NotEnoughBytes {
                needed: 40,
                available: 39
            })
        );
    }

    #[test]
    fn pseudo_header() {
        let view = PacketView::from_bytes(&HDR);
        let ip6 = Ipv6Hdr::parse(&view).unwrap();
        let mut bytes = [0u8; 40];
        ip6.pseudo_bytes(&mut bytes);
        assert_eq!(&bytes[0..32], &HDR[8..40]);
        assert_eq!(&bytes[32..40], &[0, 0, 0, 0x20, 0, 0, 0, 58]);
    }
}
