// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Providers allow the engine to work in different contexts by
//! letting core services be plugged in from outside. Logging is the
//! one service provided this way: a unit test wants to capture or
//! print messages, a production hook wants to hand them to whatever
//! event channel its environment offers.

use core::fmt;
use core::fmt::Display;

/// A logging provider provides the means to log messages to some
/// destination based on the context in which the engine is running.
///
/// Implementations must not block: they are called from the packet
/// path.
pub trait LogProvider: Send + Sync {
    /// Log a message at the specified level.
    fn log(&self, level: LogLevel, msg: &str);
}

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum LogLevel {
    Note,
    Warn,
    Error,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level_s = match self {
            Self::Note => "[NOTE]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
        };
        write!(f, "{level_s}")
    }
}

/// Discards every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLog;

impl LogProvider for NullLog {
    fn log(&self, _level: LogLevel, _msg: &str) {}
}

#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, Default)]
pub struct PrintlnLog;

#[cfg(feature = "std")]
impl LogProvider for PrintlnLog {
    fn log(&self, level: LogLevel, msg: &str) {
        println!("{level} {msg}");
    }
}
