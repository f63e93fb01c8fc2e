// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Signal-driven shutdown (`SPEC_FULL.md` §6, Design Notes §9
//! "Signal-driven cancellation"). SIGTERM, SIGHUP, and SIGINT all trigger
//! the same graceful-shutdown path: release the partition (best effort)
//! and cancel the scheduler's token so workers drain at their next
//! metric boundary.

use std::sync::Arc;

use cr_coordinator::{CoordinationClient, Coordinator, PartitionerHandle};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Waits for SIGTERM, SIGHUP, or SIGINT, then releases the coordinator's
/// current partition (if any) and cancels `cancellation`. Runs until the
/// first signal arrives.
pub async fn wait_for_shutdown_signal<C: CoordinationClient + ?Sized + 'static>(
    coordinator: Arc<Coordinator<C>>,
    cancellation: CancellationToken,
) -> anyhow::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sighup.recv() => "SIGHUP",
        _ = sigint.recv() => "SIGINT",
    };
    info!(signal = name, "received shutdown signal, draining workers");

    if let Some(partitioner) = coordinator.current_partitioner().await {
        if let Err(error) = partitioner.release_set().await {
            warn!(%error, "failed to release partition during shutdown");
        }
    }
    cancellation.cancel();
    Ok(())
}
