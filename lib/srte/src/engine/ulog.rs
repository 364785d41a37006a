// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Bounded event logging from the packet path.
//!
//! Each message is formatted into a fixed stack buffer before it is
//! handed to the [`LogProvider`]. A message that does not fit is
//! discarded whole; it is never truncated and never allocates.

use crate::provider::LogLevel;
use crate::provider::LogProvider;
use core::fmt;
use core::fmt::Write;

/// The largest message, in bytes, that will be emitted.
pub const ULOG_CAPACITY: usize = 256;

/// Format `args` and hand the result to `log`.
///
/// Returns `false` if the message was dropped for being too long.
pub fn emit(
    log: &dyn LogProvider,
    level: LogLevel,
    args: fmt::Arguments<'_>,
) -> bool {
    let mut buf = heapless::String::<ULOG_CAPACITY>::new();
    if buf.write_fmt(args).is_err() {
        return false;
    }
    log.log(level, &buf);
    true
}

/// Log a formatted message through a [`LogProvider`] without
/// allocating.
///
/// ```ignore
/// ulog!(self.log, LogLevel::Note, "{}: sl {} -> {}", name, old, new);
/// ```
#[macro_export]
macro_rules! ulog {
    ($log:expr, $level:expr, $($arg:tt)*) => {
        $crate::engine::ulog::emit(&*$log, $level, format_args!($($arg)*))
    };
}
