// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The packet engine.
//!
//! Bottom up: [`packet`] gives bounds-checked access to the buffer,
//! [`ip6`] and [`srh`] are header views over it, [`policy`] turns the
//! active SID into a [`policy::Decision`], and [`advance`] and
//! [`rewrite`] write the result back. [`hook`] ties these together.
pub mod advance;
pub mod checksum;
pub mod hook;
pub mod ip6;
pub mod metrics;
pub mod packet;
pub mod policy;
pub mod rewrite;
pub mod srh;
pub mod stat;
#[macro_use]
pub mod ulog;

pub use hook::DropReason;
pub use hook::HookCreateError;
pub use hook::ProcessResult;
pub use hook::XmitHook;
pub use metrics::IfaceMetrics;
pub use metrics::MetricsStore;
pub use packet::Packet;
pub use packet::PacketMut;
