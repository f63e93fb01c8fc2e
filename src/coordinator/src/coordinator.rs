// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Session management, namespace bootstrap, set partitioning, and
//! per-range locking (`SPEC_FULL.md` §4.3).

use std::collections::BTreeSet;
use std::sync::Arc;

use cr_types::error::RollupError;
use cr_types::Token;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::lock::RangeLockGuard;
use crate::session::{CoordinationClient, PartitionerHandle, SessionState};

const SERVERS_PATH: &str = "/cassandra/servers";
const TOKEN_RANGES_PATH: &str = "/cassandra/token_ranges";

/// Wraps a [`CoordinationClient`] driver with the policy described in
/// `SPEC_FULL.md` §4.3: session bootstrap, a partitioner that is recreated
/// only when its input set changes, and range locks that back off rather
/// than queue when contended.
pub struct Coordinator<C: ?Sized> {
    acl_password: String,
    identity: String,
    partitioner: Mutex<Option<(BTreeSet<String>, Arc<dyn PartitionerHandle>)>>,
    client: Arc<C>,
}

impl<C: CoordinationClient + ?Sized + 'static> Coordinator<C> {
    pub fn new(client: Arc<C>, acl_password: String) -> Self {
        let identity = format!(
            "{}-{}",
            hostname::get()
                .ok()
                .and_then(|name| name.into_string().ok())
                .unwrap_or_else(|| "unknown-host".to_string()),
            std::process::id()
        );
        Coordinator {
            client,
            acl_password,
            identity,
            partitioner: Mutex::new(None),
        }
    }

    /// Starts the session and ensures the persistent paths
    /// `/cassandra/servers` and `/cassandra/token_ranges` exist.
    pub async fn start(&self, hosts: &[String]) -> Result<(), RollupError> {
        self.client
            .start_session(
                hosts,
                &self.acl_password,
                Arc::new(|state: SessionState| match state {
                    SessionState::Lost => warn!("lost coordination session"),
                    SessionState::Suspended => warn!("suspended from coordination session"),
                    other => debug!(?other, "coordination session state change"),
                }),
            )
            .await?;
        self.client.ensure_path(SERVERS_PATH).await?;
        self.client.ensure_path(TOKEN_RANGES_PATH).await?;
        Ok(())
    }

    /// Rewrites the session's host list if it has changed.
    pub async fn update_hosts(&self, hosts: &[String]) -> Result<(), RollupError> {
        self.client.update_hosts(hosts).await
    }

    /// Partitions `set` among live members.
    ///
    /// Repeated calls with an equal set return the existing partitioner
    /// unchanged. A call with a different set finishes the previous
    /// partitioner before constructing a fresh one
    /// (`SPEC_FULL.md` §4.3 / spec.md E2E-6).
    pub async fn partition(
        &self,
        set: BTreeSet<String>,
    ) -> Result<Arc<dyn PartitionerHandle>, RollupError> {
        let mut guard = self.partitioner.lock().await;
        if let Some((existing_set, existing)) = guard.as_ref() {
            if existing_set == &set {
                return Ok(Arc::clone(existing));
            }
        }
        if let Some((_, stale)) = guard.take() {
            stale.finish().await?;
        }
        let fresh = self.client.create_partitioner(SERVERS_PATH, set.clone()).await?;
        *guard = Some((set, Arc::clone(&fresh)));
        Ok(fresh)
    }

    /// The most recently created partitioner, if `partition` has been
    /// called at least once. Used by shutdown handling to release the
    /// current partition without threading the handle through every
    /// caller (`SPEC_FULL.md` §6 signals).
    pub async fn current_partitioner(&self) -> Option<Arc<dyn PartitionerHandle>> {
        self.partitioner.lock().await.as_ref().map(|(_, handle)| Arc::clone(handle))
    }

    /// Acquires the lock for `[start_token, end_token]`.
    ///
    /// If contenders are already present, this is treated as a liveness
    /// optimization: the caller skips the range rather than queuing behind
    /// a contender (`SPEC_FULL.md` §4.3, §7 `LockContended`).
    pub async fn acquire_range_lock(
        &self,
        start_token: &Token,
        end_token: &Token,
    ) -> Result<RangeLockGuard, RollupError> {
        let path = format!("{TOKEN_RANGES_PATH}/{start_token}:{end_token}");
        let contenders = self.client.lock_contenders(&path).await?;
        if !contenders.is_empty() {
            warn!(range = %path, ?contenders, "competing for range lock, skipping");
            return Err(RollupError::LockContended {
                range: path,
                contenders,
            });
        }
        let handle = self.client.acquire_lock(&path, &self.identity).await?;
        Ok(RangeLockGuard::new(path, handle))
    }
}
