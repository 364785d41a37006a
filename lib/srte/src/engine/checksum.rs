// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Types for calculating the internet checksum.
//!
//! The [`Checksum`] type provides a rolling one's complement sum,
//! which can be built up over a whole header or incrementally adjusted
//! when only a few bytes of an already checksummed header change. A
//! finished sum is turned into a [`HeaderChecksum`], the two bytes
//! actually stored in the packet.
//!
//! # Checksums and Endianness
//!
//! The checksum is not a logical integer; it is a pair of bytes. The
//! bytes being summed are all in network order and the sum is written
//! back in network order, so every 16-bit word is read and written
//! with `{to,from}_ne_bytes()` and no byte-order conversion is ever
//! applied (RFC 1071 §1.B).
//!
//! # Incremental update
//!
//! When a field covered by the checksum changes from `m` to `m'`, the
//! stored checksum `HC` is updated as `HC' = ~(~HC + ~m + m')` (RFC
//! 1624 eqn. 3). [`HeaderChecksum::update()`] applies this for one
//! changed field without touching the rest of the packet.
//!
//! # Relevant RFCs
//!
//! * 1071 Computing the Internet Checksum
//!
//! * 1624 Computation of the Internet Checksum via Incremental Update

/// The checksum value, as it is contained in a network header.
///
/// This holds the bytes as they are stored in the header itself,
/// i.e. with one's complement applied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeaderChecksum {
    inner: [u8; 2],
}

impl HeaderChecksum {
    /// Return the bytes of this header checksum.
    pub fn bytes(&self) -> [u8; 2] {
        self.inner
    }

    /// Wrap the checksum bytes taken from a header.
    pub fn wrap(hc: [u8; 2]) -> Self {
        Self { inner: hc }
    }

    /// Apply the RFC 1624 incremental update for a covered field whose
    /// value changed from `old` to `new`. Both slices must be the same
    /// even length.
    pub fn update(self, old: &[u8], new: &[u8]) -> Self {
        debug_assert_eq!(old.len(), new.len());
        let mut csum = Checksum::from(self);
        csum.sub_bytes(old);
        csum.add_bytes(new);
        HeaderChecksum::from(csum)
    }
}

impl From<Checksum> for HeaderChecksum {
    /// Finalize the rolling checksum and put it into header form by
    /// performing one's complement.
    fn from(mut csum: Checksum) -> HeaderChecksum {
        Self { inner: (!csum.finalize()).to_ne_bytes() }
    }
}

/// A rolling one's complement checksum calculation.
///
/// Carries are accumulated in the upper half of a `u32` and only
/// folded back in when the sum is finalized.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Checksum {
    inner: u32,
}

impl Checksum {
    /// Creates a new checksum counter.
    pub fn new() -> Self {
        Self::from(0)
    }

    /// Update the sum by adding the contents of `bytes`.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.inner = csum_add(self.inner, bytes);
    }

    /// Create a new rolling checksum, starting with the passed in
    /// `bytes`.
    pub fn compute(bytes: &[u8]) -> Self {
        Self { inner: csum_add(0, bytes) }
    }

    /// Update the sum by subtracting the contents of `bytes`.
    pub fn sub_bytes(&mut self, bytes: &[u8]) {
        self.inner = csum_sub(self.inner, bytes);
    }

    /// Finalize the sum by adding up all the accumulated carries and
    /// returning the resulting value as a `u16`.
    pub fn finalize(&mut self) -> u16 {
        while (self.inner >> 16) != 0 {
            self.inner = (self.inner >> 16) + (self.inner & 0xFFFF);
        }

        (self.inner & 0xFFFF) as u16
    }
}

impl From<HeaderChecksum> for Checksum {
    // Convert a header's checksum bytes into a rolling checksum.
    fn from(hc: HeaderChecksum) -> Self {
        Self { inner: (!u16::from_ne_bytes(hc.bytes())) as u32 }
    }
}

impl From<u32> for Checksum {
    fn from(csum: u32) -> Self {
        Self { inner: csum }
    }
}

impl core::ops::Add for Checksum {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self { inner: self.inner + other.inner }
    }
}

impl core::ops::AddAssign for Checksum {
    fn add_assign(&mut self, other: Self) {
        self.inner += other.inner
    }
}

fn csum_add(mut csum: u32, bytes: &[u8]) -> u32 {
    let mut chunks = bytes.chunks_exact(2);
    for pair in &mut chunks {
        csum += u16::from_ne_bytes([pair[0], pair[1]]) as u32;
    }

    // An odd trailing byte is padded with zero on the right.
    if let [last] = chunks.remainder() {
        csum += u16::from_ne_bytes([*last, 0]) as u32;
    }

    csum
}

fn csum_sub(mut csum: u32, bytes: &[u8]) -> u32 {
    let mut chunks = bytes.chunks_exact(2);
    for pair in &mut chunks {
        csum += (!u16::from_ne_bytes([pair[0], pair[1]])) as u32;
    }

    if let [last] = chunks.remainder() {
        csum += (!u16::from_ne_bytes([*last, 0])) as u32;
    }

    csum
}

#[cfg(test)]
mod test {
    use super::*;

    // RFC 1071 §3 numerical example: the one's complement sum of
    // 0001 f203 f4f5 f6f7 is ddf2.
    #[test]
    fn rfc1071_example() {
        let bytes = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        let mut csum = Checksum::compute(&bytes);
        assert_eq!(u16::from_be(csum.finalize()), 0xddf2);
        let hc = HeaderChecksum::from(Checksum::compute(&bytes));
        assert_eq!(hc.bytes(), [0x22, 0x0d]);
    }

    #[test]
    fn incremental_matches_full() {
        let mut bytes = [
            0xfc, 0x00, 0x00, 0x0a, 0x00, 0xff, 0x00, 0x00, 0x12, 0x34,
            0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0,
        ];
        let before = HeaderChecksum::from(Checksum::compute(&bytes));

        let old = [bytes[4], bytes[5], bytes[6], bytes[7]];
        let new = [0x00, 0x21, 0x00, 0x00];
        bytes[4..8].copy_from_slice(&new);

        let updated = before.update(&old, &new);
        let full = HeaderChecksum::from(Checksum::compute(&bytes));
        assert_eq!(updated, full);
    }

    #[test]
    fn update_with_same_value_is_identity() {
        let bytes = [0xde, 0xad, 0xbe, 0xef];
        let hc = HeaderChecksum::from(Checksum::compute(&bytes));
        let word = [0x11, 0x22, 0x33, 0x44];
        assert_eq!(hc.update(&word, &word), hc);
    }

    #[test]
    fn odd_length() {
        let mut csum = Checksum::compute(&[0x12, 0x34, 0x56]);
        assert_eq!(u16::from_be(csum.finalize()), 0x1234 + 0x5600);
    }
}
