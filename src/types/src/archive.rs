// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Derived, per-cycle retention windows.

use crate::slice::Slice;
use crate::Timestamp;

/// A retention band for one node, derived fresh at the start of each
/// rollup cycle. Archives and their slice subsets live only for the
/// duration of one `rollup(node)` invocation (`SPEC_FULL.md` §3).
#[derive(Clone, Debug)]
pub struct Archive {
    pub precision: Timestamp,
    pub retention: i64,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// The subset of the node's slices whose `time_step == precision`.
    pub slices: Vec<Slice>,
}

impl Archive {
    /// The exclusive end of this archive's window,
    /// `start_time + precision * retention`.
    pub fn window_end(&self) -> Timestamp {
        self.start_time + self.precision * self.retention
    }
}
