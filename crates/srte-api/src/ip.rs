// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use alloc::string::String;
use core::fmt;
use core::ops::Deref;
use core::result;
use core::str::FromStr;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

/// An IPv6 address.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[repr(C)]
pub struct Ipv6Addr {
    inner: [u8; 16],
}

impl Ipv6Addr {
    /// The unspecified IPv6 address, i.e., `::` or all zeros.
    pub const ANY_ADDR: Self = Self { inner: [0; 16] };

    /// The size of an address on the wire.
    pub const SIZE: usize = 16;

    /// Return the bytes of the address.
    pub fn bytes(&self) -> [u8; 16] {
        self.inner
    }

    pub const fn from_const(words: [u16; 8]) -> Self {
        let w0 = words[0].to_be_bytes();
        let w1 = words[1].to_be_bytes();
        let w2 = words[2].to_be_bytes();
        let w3 = words[3].to_be_bytes();
        let w4 = words[4].to_be_bytes();
        let w5 = words[5].to_be_bytes();
        let w6 = words[6].to_be_bytes();
        let w7 = words[7].to_be_bytes();
        Self {
            inner: [
                w0[0], w0[1], w1[0], w1[1], w2[0], w2[1], w3[0], w3[1], w4[0],
                w4[1], w5[0], w5[1], w6[0], w6[1], w7[0], w7[1],
            ],
        }
    }

    /// Return the address as four 32-bit words, each still in network
    /// order.
    ///
    /// This is the unit the internet checksum is incrementally updated
    /// in when an address covered by a pseudo-header changes.
    pub fn words32(&self) -> [[u8; 4]; 4] {
        let b = &self.inner;
        [
            [b[0], b[1], b[2], b[3]],
            [b[4], b[5], b[6], b[7]],
            [b[8], b[9], b[10], b[11]],
            [b[12], b[13], b[14], b[15]],
        ]
    }

    /// Return the upper 64 bits, i.e. the locator portion of an SRv6
    /// SID.
    pub fn locator(&self) -> u64 {
        u64::from_be_bytes([
            self.inner[0],
            self.inner[1],
            self.inner[2],
            self.inner[3],
            self.inner[4],
            self.inner[5],
            self.inner[6],
            self.inner[7],
        ])
    }

    /// Return the lower 64 bits, where an SRv6 SID carries its function
    /// and argument.
    pub fn low64(&self) -> u64 {
        u64::from_be_bytes([
            self.inner[8],
            self.inner[9],
            self.inner[10],
            self.inner[11],
            self.inner[12],
            self.inner[13],
            self.inner[14],
            self.inner[15],
        ])
    }

    /// Return a copy of this address with the lower 64 bits replaced.
    pub fn with_low64(mut self, low: u64) -> Self {
        self.inner[8..].copy_from_slice(&low.to_be_bytes());
        self
    }
}

impl fmt::Display for Ipv6Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ip6 = core::net::Ipv6Addr::from(self.inner);
        write!(f, "{ip6}")
    }
}

impl From<core::net::Ipv6Addr> for Ipv6Addr {
    fn from(ip6: core::net::Ipv6Addr) -> Self {
        Self { inner: ip6.octets() }
    }
}

impl From<Ipv6Addr> for core::net::Ipv6Addr {
    fn from(ip6: Ipv6Addr) -> Self {
        Self::from(ip6.inner)
    }
}

impl From<&[u8; 16]> for Ipv6Addr {
    fn from(bytes: &[u8; 16]) -> Ipv6Addr {
        Ipv6Addr { inner: *bytes }
    }
}

impl From<[u8; 16]> for Ipv6Addr {
    fn from(bytes: [u8; 16]) -> Ipv6Addr {
        Ipv6Addr { inner: bytes }
    }
}

impl From<Ipv6Addr> for u128 {
    fn from(ip: Ipv6Addr) -> u128 {
        u128::from_be_bytes(ip.bytes())
    }
}

impl From<u128> for Ipv6Addr {
    fn from(i: u128) -> Ipv6Addr {
        Self::from(i.to_be_bytes())
    }
}

impl FromStr for Ipv6Addr {
    type Err = String;

    fn from_str(val: &str) -> result::Result<Self, Self::Err> {
        let ip = val
            .parse::<core::net::Ipv6Addr>()
            .map_err(|_| String::from("Invalid IPv6 address"))?;
        Ok(ip.into())
    }
}

// Configuration files and JSON output carry addresses in their textual
// form; binary formats keep the raw octets.
impl Serialize for Ipv6Addr {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            self.inner.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Ipv6Addr {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; 16]>::deserialize(deserializer).map(Self::from)
        }
    }
}

impl AsRef<[u8]> for Ipv6Addr {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl Deref for Ipv6Addr {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
