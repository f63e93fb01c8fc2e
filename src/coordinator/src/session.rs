// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The coordination-service driver boundary and session state.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use cr_types::error::RollupError;

/// States a coordination-service session can report to its listeners.
/// `Lost` and `Suspended` are logged at `warn`; everything else is purely
/// observational (`SPEC_FULL.md` §4.3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    Connected,
    Suspended,
    Lost,
    Reconnected,
}

/// Observable states of a [`PartitionerHandle`] (`SPEC_FULL.md` §4.3 /
/// Design Notes §9.2).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PartitionerState {
    Allocating,
    Acquired,
    Failed,
    Releasing,
}

/// A live set-partitioner assignment. One instance corresponds to one
/// input set; `Coordinator::partition` recreates this whenever the input
/// set changes.
#[async_trait]
pub trait PartitionerHandle: Send + Sync {
    fn state(&self) -> PartitionerState;

    /// The subset of the input set assigned to this member. Only
    /// meaningful once `state()` is `Acquired`.
    fn assignment(&self) -> Vec<String>;

    /// Blocks (asynchronously) until the partitioner reaches `Acquired` or
    /// `Failed`.
    async fn wait_for_acquire(&self) -> Result<(), RollupError>;

    /// Releases this member's partition, e.g. in response to `Releasing`
    /// or on graceful shutdown.
    async fn release_set(&self) -> Result<(), RollupError>;

    /// Tears down this partitioner instance so a new one can be created
    /// for a different input set.
    async fn finish(&self) -> Result<(), RollupError>;
}

/// A held lock on a single coordination-service path.
#[async_trait]
pub trait LockHandle: Send + Sync {
    /// Releases the lock. Idempotent: may be called more than once.
    async fn release(&self) -> Result<(), RollupError>;
}

/// The out-of-scope ZooKeeper-like coordination-service driver
/// (`SPEC_FULL.md` §1, §6). Production deployments supply an
/// implementation backed by the real client library; the crate's own
/// tests use an in-memory fake.
#[async_trait]
pub trait CoordinationClient: Send + Sync {
    /// Starts the session with digest auth `"client:<acl_password>"` and
    /// registers a listener for session state changes.
    async fn start_session(
        &self,
        hosts: &[String],
        acl_password: &str,
        on_state_change: Arc<dyn Fn(SessionState) + Send + Sync>,
    ) -> Result<(), RollupError>;

    /// Rewrites the session's host list if it differs from the current one.
    async fn update_hosts(&self, hosts: &[String]) -> Result<(), RollupError>;

    /// Ensures a persistent path exists, creating it (and any parents) if
    /// not.
    async fn ensure_path(&self, path: &str) -> Result<(), RollupError>;

    /// Creates a new set-partitioner over `set` rooted at `path`.
    async fn create_partitioner(
        &self,
        path: &str,
        set: BTreeSet<String>,
    ) -> Result<Arc<dyn PartitionerHandle>, RollupError>;

    /// Lists the current contenders for a lock path without acquiring it.
    async fn lock_contenders(&self, path: &str) -> Result<Vec<String>, RollupError>;

    /// Acquires the lock at `path`, identifying this holder as `identity`.
    async fn acquire_lock(
        &self,
        path: &str,
        identity: &str,
    ) -> Result<Arc<dyn LockHandle>, RollupError>;
}
