// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Types for reading and writing the packet handed to the hook.
//!
//! The packet buffer belongs to the environment that invokes the
//! hook. Writing into it goes through [`PacketMut::store_bytes()`],
//! which is allowed to move or resize the underlying storage. A
//! [`PacketView`] borrows the buffer immutably, so the borrow checker
//! forces every view (and every header view derived from it) to be
//! dropped before a write, and a fresh view to be taken afterwards.
//! No offset or slice obtained before a write survives it.

use crate::d_error::DError;
use alloc::vec::Vec;

/// A packet buffer owned by the invoking environment.
pub trait PacketMut {
    /// Return the current bytes of the packet, starting at the IPv6
    /// header.
    fn data(&self) -> &[u8];

    /// Copy `src` into the packet starting at `offset`.
    ///
    /// The implementation may relocate or resize the buffer as part of
    /// the write. Callers must re-derive any view of the packet before
    /// reading it again.
    fn store_bytes(&mut self, offset: usize, src: &[u8]) -> WriteResult<()>;
}

#[derive(Clone, Copy, Debug, DError, Eq, PartialEq)]
#[derror(leaf_data = ReadErr::data)]
pub enum ReadErr {
    /// The packet ends before the requested field does.
    NotEnoughBytes { needed: usize, available: usize },
    /// The requested range cannot be expressed (offset + len
    /// overflows).
    OutOfRange,
}

impl ReadErr {
    fn data(&self, data: &mut [u64]) {
        if let Self::NotEnoughBytes { needed, available } = self {
            [data[0], data[1]] = [*needed as u64, *available as u64];
        }
    }
}

#[derive(Clone, Copy, Debug, DError, Eq, PartialEq)]
#[derror(leaf_data = WriteErr::data)]
pub enum WriteErr {
    /// The write would extend past the end of the packet.
    NotEnoughBytes { needed: usize, available: usize },
    /// The write range cannot be expressed (offset + len overflows).
    OutOfRange,
    /// The environment refused the write.
    Rejected,
}

impl WriteErr {
    fn data(&self, data: &mut [u64]) {
        if let Self::NotEnoughBytes { needed, available } = self {
            [data[0], data[1]] = [*needed as u64, *available as u64];
        }
    }
}

pub type ReadResult<T> = core::result::Result<T, ReadErr>;
pub type WriteResult<T> = core::result::Result<T, WriteErr>;

/// Compute `offset + len` and prove it fits within `available`.
fn check_range(
    offset: usize,
    len: usize,
    available: usize,
) -> ReadResult<usize> {
    let end = offset.checked_add(len).ok_or(ReadErr::OutOfRange)?;
    if end > available {
        return Err(ReadErr::NotEnoughBytes { needed: end, available });
    }
    Ok(end)
}

impl From<ReadErr> for WriteErr {
    fn from(err: ReadErr) -> Self {
        match err {
            ReadErr::NotEnoughBytes { needed, available } => {
                Self::NotEnoughBytes { needed, available }
            }
            ReadErr::OutOfRange => Self::OutOfRange,
        }
    }
}

/// A bounds-checked, read-only view over the current packet bytes.
///
/// Every accessor proves `offset + size <= len` before handing out
/// data.
#[derive(Clone, Copy, Debug)]
pub struct PacketView<'a> {
    bytes: &'a [u8],
}

impl<'a> PacketView<'a> {
    pub fn new<P: PacketMut + ?Sized>(pkt: &'a P) -> Self {
        Self { bytes: pkt.data() }
    }

    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Return the number of bytes in the packet.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Verify that `len` bytes starting at `offset` are present.
    pub fn check(&self, offset: usize, len: usize) -> ReadResult<()> {
        self.slice(offset, len).map(|_| ())
    }

    /// Return `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> ReadResult<&'a [u8]> {
        let end = check_range(offset, len, self.bytes.len())?;
        Ok(&self.bytes[offset..end])
    }

    /// Return a fixed-size array reference starting at `offset`.
    pub fn array<const N: usize>(
        &self,
        offset: usize,
    ) -> ReadResult<&'a [u8; N]> {
        // `slice()` returns exactly `N` bytes, the conversion cannot
        // fail in practice.
        self.slice(offset, N)?.try_into().map_err(|_| ReadErr::OutOfRange)
    }

    pub fn u8_at(&self, offset: usize) -> ReadResult<u8> {
        Ok(self.array::<1>(offset)?[0])
    }

    /// Return the bytes from `offset` to the end of the packet.
    pub fn tail(&self, offset: usize) -> ReadResult<&'a [u8]> {
        let len = self.bytes.len().checked_sub(offset).ok_or(
            ReadErr::NotEnoughBytes {
                needed: offset,
                available: self.bytes.len(),
            },
        )?;
        self.slice(offset, len)
    }
}

/// A packet held in a plain heap buffer.
///
/// Writes never relocate this buffer, but callers must not rely on
/// that: they only see it through [`PacketMut`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Packet {
    bytes: Vec<u8>,
}

impl Packet {
    /// Create a packet by copying `bytes`.
    pub fn copy(bytes: &[u8]) -> Self {
        Self { bytes: bytes.to_vec() }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for Packet {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl PacketMut for Packet {
    fn data(&self) -> &[u8] {
        &self.bytes
    }

    fn store_bytes(&mut self, offset: usize, src: &[u8]) -> WriteResult<()> {
        let end = check_range(offset, src.len(), self.bytes.len())?;
        self.bytes[offset..end].copy_from_slice(src);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn view_bounds() {
        let pkt = Packet::copy(&[1, 2, 3, 4]);
        let view = PacketView::new(&pkt);
        assert_eq!(view.len(), 4);
        assert_eq!(view.slice(1, 3), Ok(&[2, 3, 4][..]));
        assert_eq!(view.u8_at(3), Ok(4));
        assert_eq!(view.array::<2>(2), Ok(&[3, 4]));
        assert_eq!(
            view.slice(2, 3),
            Err(ReadErr::NotEnoughBytes { needed: 5, available: 4 })
        );
        assert_eq!(view.slice(usize::MAX, 2), Err(ReadErr::OutOfRange));
        assert_eq!(view.tail(4), Ok(&[][..]));
        assert!(view.tail(5).is_err());
        assert!(view.check(0, 4).is_ok());
    }

    #[test]
    fn store_in_bounds() {
        let mut pkt = Packet::copy(&[0; 8]);
        pkt.store_bytes(6, &[0xAA, 0xBB]).unwrap();
        assert_eq!(pkt.bytes(), &[0, 0, 0, 0, 0, 0, 0xAA, 0xBB]);
        assert_eq!(
            pkt.store_bytes(7, &[1, 2]),
            Err(WriteErr::NotEnoughBytes { needed: 9, available: 8 })
        );
        // A failed write leaves the packet untouched.
        assert_eq!(pkt.bytes()[7], 0xBB);
    }
}
