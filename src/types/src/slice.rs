// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A contiguous samples container for one retention precision.

use crate::{Timestamp, Value};

/// Identifies a slice within a node. Slices are compared by identity
/// (`start_time`, `time_step`) rather than contents, since contents are
/// fetched lazily through the tree client.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SliceId {
    pub start_time: Timestamp,
    pub time_step: Timestamp,
}

/// A contiguous, persisted sequence of samples for one precision.
///
/// `SPEC_FULL.md` §3: points within a slice are strictly increasing by
/// timestamp and aligned to `time_step`; a node has at most one active
/// slice per `time_step` in normal operation, though the engine tolerates
/// more than one (it picks the slice whose window covers the target
/// timestamp; see `cr_rollup_engine`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Slice {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub time_step: Timestamp,
}

impl Slice {
    pub fn id(&self) -> SliceId {
        SliceId {
            start_time: self.start_time,
            time_step: self.time_step,
        }
    }

    /// Whether `timestamp` falls within this slice's current window.
    pub fn covers(&self, timestamp: Timestamp) -> bool {
        self.start_time <= timestamp && timestamp <= self.end_time
    }
}

/// One sample: a timestamp paired with an optional value. `None` encodes a
/// null/missing sample (`SPEC_FULL.md` §3).
pub type DataPoint = (Timestamp, Value);
