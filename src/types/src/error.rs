// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Error kinds for the rollup daemon, matching `SPEC_FULL.md` §7.
//!
//! Propagation policy: errors are recovered at the smallest natural scope
//! (slice < metric < range < cycle). Only [`RollupError::ConfigInvalid`]
//! aborts the process; every other variant is logged and the enclosing
//! scope moves on to its next unit of work.

use thiserror::Error;

/// Errors surfaced anywhere in the rollup daemon.
#[derive(Error, Debug)]
pub enum RollupError {
    /// A required configuration key is missing or malformed. Fatal at
    /// startup.
    #[error("invalid configuration: {reason}")]
    ConfigInvalid { reason: String },

    /// No configured storage endpoint answered a health probe.
    #[error("no configured storage endpoint is reachable")]
    RingUnavailable,

    /// `describeRing` and `describeTokenMap` disagreed about a token's
    /// owning range.
    #[error("end token {end_token} reported for endpoint {endpoint} has no matching token range")]
    RingInconsistent { end_token: String, endpoint: String },

    /// The set partitioner transitioned to `failed`.
    #[error("partitioner failed to acquire a partition")]
    PartitionFailed,

    /// The set partitioner signaled `release`; the caller must call
    /// `release_set()` and skip the cycle.
    #[error("partitioner is releasing its partition")]
    PartitionReleasing,

    /// A range lock has contenders; the liveness optimization in
    /// `SPEC_FULL.md` §4.3 skips the range rather than queuing behind them.
    #[error("lock on range {range} is contended by {contenders:?}")]
    LockContended {
        range: String,
        contenders: Vec<String>,
    },

    /// A slice read returned no samples in the requested window. Always
    /// caught at the point of the read and turned into an empty list; this
    /// variant exists so driver implementations have something concrete to
    /// return.
    #[error("no data in the requested range")]
    NoData,

    /// A node's `aggregationMethod` names a method the engine does not
    /// implement. Fatal for the metric being rolled up; the worker logs and
    /// continues with the next metric.
    #[error("unknown aggregation method {method}")]
    UnknownAggregate { method: String },

    /// A node's metadata is missing a required entry or has the wrong
    /// shape for one.
    #[error("invalid metadata for {node_path}: {reason}")]
    InvalidMetadata { node_path: String, reason: String },

    /// Any other storage or coordination driver I/O failure. Logged; the
    /// current unit of work (metric, range, or cycle) is abandoned.
    #[error("storage driver error: {0}")]
    StorageTransient(#[from] anyhow::Error),
}
