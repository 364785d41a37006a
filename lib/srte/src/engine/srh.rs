// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The IPv6 Segment Routing Header (RFC 8754).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | Next Header   |  Hdr Ext Len  | Routing Type  | Segments Left |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Last Entry   |     Flags     |              Tag              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |            Segment List[0] (128-bit IPv6 address)             |
//! |                              ...                              |
//! |            Segment List[n] (128-bit IPv6 address)             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Segment List[0] is the final segment of the path; the list is
//! encoded in reverse order and `Segments Left` indexes the next one
//! to visit. Only an SRH directly following the fixed IPv6 header is
//! recognized.

use super::ip6::Ipv6Addr;
use super::ip6::Ipv6Hdr;
use super::packet::PacketView;
use super::packet::ReadErr;
use crate::d_error::DError;
use smoltcp::wire::IpProtocol;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

/// The Routing Type value identifying a Segment Routing Header.
pub const ROUTING_TYPE_SRH: u8 = 4;

/// The fixed 8-byte prefix of the SRH, as laid out on the wire.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct SrhFixed {
    pub next_header: u8,
    pub hdr_ext_len: u8,
    pub routing_type: u8,
    pub segments_left: u8,
    pub last_entry: u8,
    pub flags: u8,
    pub tag: [u8; 2],
}

/// Read access to an ordered segment list.
///
/// This is the part of the SRH the policy code needs; it is a trait
/// so decisions can be computed against lists that do not live in a
/// packet.
pub trait SegmentList {
    /// Return the index of the next segment to visit.
    fn segments_left(&self) -> u8;

    /// Return the number of segments in the list.
    fn num_segments(&self) -> u16;

    /// Return the segment at `idx`, if the list holds one.
    fn segment(&self, idx: u8) -> Option<Ipv6Addr>;
}

/// A view of the SRH that immediately follows the fixed IPv6 header.
#[derive(Debug)]
pub struct SegmentRoutingHdr<'a> {
    fixed: &'a SrhFixed,
    segments: &'a [u8],
}

impl<'a> SegmentRoutingHdr<'a> {
    /// The offset of the SRH within the packet.
    pub const OFFSET: usize = Ipv6Hdr::BASE_SIZE;

    /// The size of the fixed part of the SRH.
    pub const FIXED_SIZE: usize = 8;

    /// The offset of the Segments Left field, relative to the SRH.
    pub const SEGMENTS_LEFT_OFFSET: usize = 3;

    /// The size of one segment.
    pub const SEGMENT_SIZE: usize = 16;

    /// Parse the SRH that follows `ip6`.
    ///
    /// The whole header, as announced by `Hdr Ext Len`, must be present
    /// in the packet, and `Last Entry` must describe a segment list
    /// that fits inside it.
    pub fn parse(
        view: &PacketView<'a>,
        ip6: &Ipv6Hdr,
    ) -> Result<Self, SrhError> {
        let next_header = ip6.next_hdr();
        if next_header != IpProtocol::Ipv6Route {
            return Err(SrhError::NotRoutingHeader {
                next_header: u8::from(next_header),
            });
        }

        let fixed_bytes = view.slice(Self::OFFSET, Self::FIXED_SIZE)?;
        let fixed = SrhFixed::ref_from_bytes(fixed_bytes)
            .map_err(|_| ReadErr::OutOfRange)?;

        if fixed.routing_type != ROUTING_TYPE_SRH {
            return Err(SrhError::WrongRoutingType {
                routing_type: fixed.routing_type,
            });
        }

        let body_len = usize::from(fixed.hdr_ext_len) * 8;
        view.check(Self::OFFSET, Self::FIXED_SIZE + body_len)?;

        let num_segments = usize::from(fixed.last_entry) + 1;
        let seg_len = num_segments * Self::SEGMENT_SIZE;
        if seg_len > body_len {
            return Err(SrhError::BadLastEntry {
                last_entry: fixed.last_entry,
                hdr_ext_len: fixed.hdr_ext_len,
            });
        }

        let segments =
            view.slice(Self::OFFSET + Self::FIXED_SIZE, seg_len)?;
        Ok(Self { fixed, segments })
    }

    pub fn next_header(&self) -> u8 {
        self.fixed.next_header
    }

    pub fn hdr_ext_len(&self) -> u8 {
        self.fixed.hdr_ext_len
    }

    pub fn routing_type(&self) -> u8 {
        self.fixed.routing_type
    }

    pub fn last_entry(&self) -> u8 {
        self.fixed.last_entry
    }

    pub fn flags(&self) -> u8 {
        self.fixed.flags
    }

    pub fn tag(&self) -> u16 {
        u16::from_be_bytes(self.fixed.tag)
    }

    /// Return the full length of the SRH in bytes.
    pub fn hdr_len(&self) -> usize {
        Self::FIXED_SIZE + usize::from(self.fixed.hdr_ext_len) * 8
    }

    /// Return the absolute packet offset of the Segments Left field.
    pub fn segments_left_offset(&self) -> usize {
        Self::OFFSET + Self::SEGMENTS_LEFT_OFFSET
    }

    /// Iterate the segment list from index 0 upward.
    pub fn segments(&self) -> impl Iterator<Item = Ipv6Addr> + '_ {
        self.segments.chunks_exact(Self::SEGMENT_SIZE).filter_map(|seg| {
            <[u8; 16]>::try_from(seg).ok().map(Ipv6Addr::from)
        })
    }
}

impl SegmentList for SegmentRoutingHdr<'_> {
    fn segments_left(&self) -> u8 {
        self.fixed.segments_left
    }

    fn num_segments(&self) -> u16 {
        u16::from(self.fixed.last_entry) + 1
    }

    fn segment(&self, idx: u8) -> Option<Ipv6Addr> {
        let start = usize::from(idx) * Self::SEGMENT_SIZE;
        let bytes = self.segments.get(start..start + Self::SEGMENT_SIZE)?;
        <[u8; 16]>::try_from(bytes).ok().map(Ipv6Addr::from)
    }
}

#[derive(Clone, Copy, Debug, DError, Eq, PartialEq)]
#[derror(leaf_data = SrhError::data)]
pub enum SrhError {
    /// The fixed IPv6 header is not followed by a Routing header.
    NotRoutingHeader { next_header: u8 },
    /// The Routing header is not an SRH.
    WrongRoutingType { routing_type: u8 },
    /// `Last Entry` names more segments than the header carries.
    BadLastEntry { last_entry: u8, hdr_ext_len: u8 },
    /// The SRH runs past the end of the packet.
    Truncated(ReadErr),
}

impl SrhError {
    fn data(&self, data: &mut [u64]) {
        match self {
            Self::NotRoutingHeader { next_header } => {
                data[0] = u64::from(*next_header);
            }
            Self::WrongRoutingType { routing_type } => {
                data[0] = u64::from(*routing_type);
            }
            Self::BadLastEntry { last_entry, hdr_ext_len } => {
                [data[0], data[1]] =
                    [u64::from(*last_entry), u64::from(*hdr_ext_len)];
            }
            Self::Truncated(_) => {}
        }
    }
}

impl From<ReadErr> for SrhError {
    fn from(error: ReadErr) -> Self {
        Self::Truncated(error)
    }
}
