// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! SRv6 Segment Identifiers (SIDs) carrying traffic-engineering
//! policy.
//!
//! A SID is an IPv6 address. The upper 64 bits are the locator; the
//! lower 64 bits are split into a 16-bit function code followed by a
//! 48-bit argument.
//!
//! ```text
//!  0                   63 64          79 80                     127
//! +----------------------+--------------+------------------------+
//! |       locator        |   function   |        argument        |
//! +----------------------+--------------+------------------------+
//! ```
//!
//! The layout of the argument depends on the function. Both policy
//! functions pack their fields highest byte first.
//!
//! ```text
//! SkipSegmentsIf (0x8000)
//!   | num_skip | selector | comparator | iface |    threshold    |
//!   |    8     |    8     |     8      |   8   |       16        |
//!
//! SkipSegments (0x8001)
//!   | num_skip |                 unused (40)                     |
//! ```

use super::ip::Ipv6Addr;
use alloc::string::String;
use core::fmt;
use core::fmt::Display;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;

/// Function code: skip `num_skip` additional segments when a metric
/// condition holds.
pub const SKIP_SEGMENTS_IF: u16 = 0x8000;

/// Function code: always skip `num_skip` additional segments.
pub const SKIP_SEGMENTS: u16 = 0x8001;

/// The metric selector naming the interface throughput metric. All
/// other selector values are reserved and never match.
pub const METRIC_SELECTOR_IFACE: u8 = 0;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum FunctionCode {
    SkipSegmentsIf,
    SkipSegments,
    Unknown(u16),
}

impl From<u16> for FunctionCode {
    fn from(val: u16) -> Self {
        match val {
            SKIP_SEGMENTS_IF => Self::SkipSegmentsIf,
            SKIP_SEGMENTS => Self::SkipSegments,
            _ => Self::Unknown(val),
        }
    }
}

impl From<FunctionCode> for u16 {
    fn from(fc: FunctionCode) -> u16 {
        match fc {
            FunctionCode::SkipSegmentsIf => SKIP_SEGMENTS_IF,
            FunctionCode::SkipSegments => SKIP_SEGMENTS,
            FunctionCode::Unknown(val) => val,
        }
    }
}

impl Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SkipSegmentsIf => write!(f, "skip-segments-if"),
            Self::SkipSegments => write!(f, "skip-segments"),
            Self::Unknown(val) => write!(f, "unknown({val:#06x})"),
        }
    }
}

/// The function and argument fields of a SID.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Sid {
    pub function: u16,
    /// Only the lower 48 bits are meaningful.
    pub argument: u64,
}

impl Sid {
    pub const ARG_BITS: u32 = 48;
    pub const ARG_MASK: u64 = (1 << Self::ARG_BITS) - 1;

    pub fn new(function: u16, argument: u64) -> Self {
        Self { function, argument: argument & Self::ARG_MASK }
    }

    /// Pull the function and argument out of the low 64 bits of a
    /// destination address. This never fails: any address decodes to
    /// some SID, and unrecognized functions are a policy question.
    pub fn decode(dst: &Ipv6Addr) -> Self {
        let low = dst.low64();
        Self {
            function: (low >> Self::ARG_BITS) as u16,
            argument: low & Self::ARG_MASK,
        }
    }

    /// Place this SID's function and argument under the given
    /// locator. The locator's low 64 bits are discarded.
    pub fn encode(&self, locator: Ipv6Addr) -> Ipv6Addr {
        let low = (u64::from(self.function) << Self::ARG_BITS)
            | (self.argument & Self::ARG_MASK);
        locator.with_low64(low)
    }

    pub fn function_code(&self) -> FunctionCode {
        FunctionCode::from(self.function)
    }

    /// Interpret the argument according to the function code.
    pub fn policy(&self) -> PolicyFn {
        match self.function_code() {
            FunctionCode::SkipSegmentsIf => {
                PolicyFn::SkipSegmentsIf(SkipIfArgs::decode(self.argument))
            }
            FunctionCode::SkipSegments => {
                PolicyFn::SkipSegments(SkipArgs::decode(self.argument))
            }
            FunctionCode::Unknown(_) => PolicyFn::None,
        }
    }
}

impl Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{:#014x}", self.function_code(), self.argument)
    }
}

/// A decoded policy function, ready for evaluation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PolicyFn {
    SkipSegmentsIf(SkipIfArgs),
    SkipSegments(SkipArgs),
    None,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Comparator {
    Eq,
    Gt,
    Lt,
    Unknown(u8),
}

impl Comparator {
    /// Compare a stored metric value against a threshold. Returns
    /// `None` for a comparator this implementation does not know.
    pub fn compare(&self, value: u64, threshold: u64) -> Option<bool> {
        match self {
            Self::Eq => Some(value == threshold),
            Self::Gt => Some(value > threshold),
            Self::Lt => Some(value < threshold),
            Self::Unknown(_) => None,
        }
    }
}

impl From<u8> for Comparator {
    fn from(val: u8) -> Self {
        match val {
            0 => Self::Eq,
            1 => Self::Gt,
            2 => Self::Lt,
            _ => Self::Unknown(val),
        }
    }
}

impl From<Comparator> for u8 {
    fn from(cmp: Comparator) -> u8 {
        match cmp {
            Comparator::Eq => 0,
            Comparator::Gt => 1,
            Comparator::Lt => 2,
            Comparator::Unknown(val) => val,
        }
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eq" | "==" => Ok(Self::Eq),
            "gt" | ">" => Ok(Self::Gt),
            "lt" | "<" => Ok(Self::Lt),
            _ => Err(format!("invalid comparator: {s}")),
        }
    }
}

impl Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "EQ"),
            Self::Gt => write!(f, "GT"),
            Self::Lt => write!(f, "LT"),
            Self::Unknown(val) => write!(f, "UNKNOWN({val})"),
        }
    }
}

/// Arguments of [`SKIP_SEGMENTS_IF`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SkipIfArgs {
    pub num_skip: u8,
    pub metric_selector: u8,
    pub comparator: Comparator,
    pub iface: u8,
    pub threshold: u16,
}

impl SkipIfArgs {
    pub fn decode(arg: u64) -> Self {
        Self {
            num_skip: (arg >> 40) as u8,
            metric_selector: (arg >> 32) as u8,
            comparator: Comparator::from((arg >> 24) as u8),
            iface: (arg >> 16) as u8,
            threshold: arg as u16,
        }
    }

    pub fn encode(&self) -> u64 {
        (u64::from(self.num_skip) << 40)
            | (u64::from(self.metric_selector) << 32)
            | (u64::from(u8::from(self.comparator)) << 24)
            | (u64::from(self.iface) << 16)
            | u64::from(self.threshold)
    }

    pub fn sid(&self) -> Sid {
        Sid::new(SKIP_SEGMENTS_IF, self.encode())
    }
}

impl Display for SkipIfArgs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "skip={} sel={} cmp={} iface={} threshold={}",
            self.num_skip,
            self.metric_selector,
            self.comparator,
            self.iface,
            self.threshold
        )
    }
}

/// Arguments of [`SKIP_SEGMENTS`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SkipArgs {
    pub num_skip: u8,
}

impl SkipArgs {
    pub fn decode(arg: u64) -> Self {
        Self { num_skip: (arg >> 40) as u8 }
    }

    pub fn encode(&self) -> u64 {
        u64::from(self.num_skip) << 40
    }

    pub fn sid(&self) -> Sid {
        Sid::new(SKIP_SEGMENTS, self.encode())
    }
}

impl Display for SkipArgs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "skip={}", self.num_skip)
    }
}
