// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The cycle driver (`SPEC_FULL.md` §4.6): discovers owned ranges,
//! partitions them across live members, and dispatches each assigned
//! range to a bounded worker pool.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use cr_coordinator::{Coordinator, CoordinationClient, PartitionerHandle, PartitionerState};
use cr_ring_client::RingClient;
use cr_rollup_engine::RollupEngine;
use cr_tree_client::TreeClient;
use cr_types::error::RollupError;
use cr_types::{Endpoint, Timestamp, Token};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::walk::walk_range;

/// Supplies the configuration the scheduler rereads at the start of every
/// cycle, so operators can hot-reconfigure endpoints or coordination hosts
/// without restarting the daemon (`SPEC_FULL.md` §4.6 step 2). Owned by
/// `cr-daemon`; the scheduler only ever reads through this trait.
pub trait ConfigSource: Send + Sync {
    fn current_endpoints(&self) -> BTreeSet<Endpoint>;
    fn current_coordination_hosts(&self) -> Vec<String>;
    /// Width of the bounded worker pool. Defaults to 32
    /// (`SPEC_FULL.md` §6, `ROLLUP_THREADS`).
    fn num_threads(&self) -> usize;
}

fn now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as Timestamp
}

/// Drives one rollup cycle end to end.
pub struct Scheduler<R, C: ?Sized, T> {
    ring_client: Arc<R>,
    coordinator: Arc<Coordinator<C>>,
    tree_client: T,
    engine: Arc<RollupEngine<T>>,
    config_source: Arc<dyn ConfigSource>,
}

impl<R, C, T> Scheduler<R, C, T>
where
    R: RingClient + 'static,
    C: CoordinationClient + ?Sized + 'static,
    T: TreeClient + Clone + 'static,
{
    pub fn new(
        ring_client: Arc<R>,
        coordinator: Arc<Coordinator<C>>,
        tree_client: T,
        config_source: Arc<dyn ConfigSource>,
    ) -> Self {
        let engine = Arc::new(RollupEngine::new(tree_client.clone()));
        Scheduler {
            ring_client,
            coordinator,
            tree_client,
            engine,
            config_source,
        }
    }

    /// Runs one cycle: range discovery, partitioning, and dispatch.
    /// Returns once every dispatched range has finished (or been
    /// cancelled); never returns an error for a condition the cycle is
    /// meant to skip (`PartitionFailed`/`Releasing` included via an early
    /// return with the error logged, not propagated as a crash).
    pub async fn run_cycle(&self, cancellation: &CancellationToken) -> Result<(), RollupError> {
        let started = Instant::now();
        info!("rollup cycle starting");

        let endpoints = self.config_source.current_endpoints();
        let hosts = self.config_source.current_coordination_hosts();
        self.coordinator.update_hosts(&hosts).await?;

        let ranges = self.ring_client.token_ranges_for_endpoints(&endpoints).await?;
        let range_strings: BTreeSet<String> = ranges
            .iter()
            .map(|(start, end, _endpoint)| format!("{start}:{end}"))
            .collect();

        let partitioner = self.coordinator.partition(range_strings).await?;
        // Order matters (spec.md §4.3): Releasing and Failed must be checked
        // before we ever call wait_for_acquire, or a partitioner stuck in
        // Releasing would hang the cycle forever waiting for a state change
        // that release_set(), not wait_for_acquire(), is what produces.
        match partitioner.state() {
            PartitionerState::Releasing => {
                partitioner.release_set().await?;
                return Err(RollupError::PartitionReleasing);
            }
            PartitionerState::Failed => {
                warn!("partitioner failed to acquire a partition, skipping cycle");
                return Err(RollupError::PartitionFailed);
            }
            PartitionerState::Allocating => {
                partitioner.wait_for_acquire().await?;
                match partitioner.state() {
                    PartitionerState::Acquired => {}
                    PartitionerState::Failed => {
                        warn!("partitioner failed to acquire a partition, skipping cycle");
                        return Err(RollupError::PartitionFailed);
                    }
                    PartitionerState::Releasing => {
                        partitioner.release_set().await?;
                        return Err(RollupError::PartitionReleasing);
                    }
                    PartitionerState::Allocating => {
                        warn!("partitioner still allocating after wait_for_acquire, skipping cycle");
                        return Ok(());
                    }
                }
            }
            PartitionerState::Acquired => {}
        }

        let assigned = partitioner.assignment();
        let thread_count = self.config_source.num_threads().max(1);
        let semaphore = Arc::new(Semaphore::new(thread_count));
        let cycle_now = now();

        let mut handles = Vec::with_capacity(assigned.len());
        for range in assigned {
            let Some((start, end)) = range.split_once(':') else {
                warn!(%range, "assigned range string is malformed, skipping");
                continue;
            };
            let start_token = Token::new(start);
            let end_token = Token::new(end);

            let permit = Arc::clone(&semaphore).acquire_owned().await.expect("semaphore is never closed");
            let coordinator = Arc::clone(&self.coordinator);
            let tree_client = self.tree_client.clone();
            let engine = Arc::clone(&self.engine);
            let cancellation = cancellation.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                if let Err(error) = walk_range(
                    &coordinator,
                    &tree_client,
                    &engine,
                    start_token,
                    end_token,
                    cycle_now,
                    &cancellation,
                )
                .await
                {
                    warn!(%error, "range walk failed, abandoning this range");
                }
            }));
        }

        for handle in handles {
            if let Err(error) = handle.await {
                warn!(%error, "a range worker task panicked");
            }
        }

        info!(elapsed = ?started.elapsed(), "rollup cycle finished");
        Ok(())
    }
}
