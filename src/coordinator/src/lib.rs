// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Cluster coordination: session management, set partitioning, and
//! per-range distributed locking (`SPEC_FULL.md` §4.3).

mod coordinator;
mod lock;
mod session;

pub use coordinator::Coordinator;
pub use lock::RangeLockGuard;
pub use session::{
    CoordinationClient, LockHandle, PartitionerHandle, PartitionerState, SessionState,
};
