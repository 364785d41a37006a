// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use serde::Deserialize;
use serde::Serialize;

/// A point-in-time copy of a hook's packet counters.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct HookStatsSnap {
    /// Packets handed to the hook.
    pub processed: u64,
    /// Packets returned unmodified.
    pub passed: u64,
    /// Packets the hook asked to discard.
    pub dropped: u64,
    /// Packets modified in place and handed back for a new route
    /// lookup.
    pub rerouted: u64,
    /// Destinations replaced by a rewrite program.
    pub rewritten: u64,
}
