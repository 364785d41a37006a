// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The srte engine: SRv6 traffic-engineering policy applied to
//! packets at an egress hook.
//!
//! The engine is environment agnostic. Whatever invokes it per packet
//! supplies the packet buffer (see [`engine::packet::PacketMut`]), the
//! interface metrics (see [`engine::metrics::MetricsStore`]) and a log
//! sink (see [`provider::LogProvider`]); the engine hands back a
//! [`engine::hook::ProcessResult`].

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::len_without_is_empty)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

extern crate alloc;

pub mod api;
pub mod d_error;
#[macro_use]
pub mod engine;
#[cfg(feature = "std")]
pub mod print;
pub mod provider;
