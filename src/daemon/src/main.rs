// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Binary entry point for the Cassandra metric rollup daemon
//! (`SPEC_FULL.md` §6).

mod cli;
mod config;
mod drivers;
mod logging;
mod signals;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cr_coordinator::Coordinator;
use cr_ring_client::CassandraRingClient;
use cr_scheduler::Scheduler;
use cr_tree_client::CassandraTreeClient;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::Args;
use crate::config::{Config, DaemonConfigSource};

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load(args.config_file.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("startup failed: invalid configuration: {error}");
            return ExitCode::FAILURE;
        }
    };

    // The log file itself must be opened before logging is wired up, so
    // a failure to open it is reported on stderr rather than swallowed.
    let log_guard = match logging::init(args.log_level, &args.log_file) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("startup failed: could not initialize logging: {error}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("startup failed: could not start the async runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    let exit = runtime.block_on(run(args, config));
    drop(log_guard);
    exit
}

async fn run(args: Args, config: Config) -> ExitCode {
    info!(interval = args.interval, dc_name = ?args.dc_name, "starting cassandra rollup daemon");

    let built_drivers = match drivers::build(&config) {
        Ok(drivers) => drivers,
        Err(error) => {
            error!(%error, "startup failed: could not construct storage/coordination drivers");
            return ExitCode::FAILURE;
        }
    };

    let ring_client = Arc::new(CassandraRingClient::new(
        config.cassandra_servers.clone(),
        config.keyspace.clone(),
        built_drivers.system_interface,
    ));
    let tree_client = Arc::new(CassandraTreeClient::new(built_drivers.tree_driver));
    let coordinator = Arc::new(Coordinator::new(
        built_drivers.coordination_client,
        config.acl_password.clone(),
    ));

    if let Err(error) = coordinator.start(&config.zk_servers).await {
        error!(%error, "startup failed: could not start coordination session");
        return ExitCode::FAILURE;
    }

    let config_source = Arc::new(DaemonConfigSource::new(args.config_file.clone()));
    let scheduler = Scheduler::new(ring_client, Arc::clone(&coordinator), tree_client, config_source);

    let cancellation = CancellationToken::new();
    let shutdown = tokio::spawn(signals::wait_for_shutdown_signal(
        Arc::clone(&coordinator),
        cancellation.clone(),
    ));

    // `coalesce=true` semantics (spec.md §4.6): if a cycle overruns the
    // interval, the next tick is not queued behind it, it is dropped.
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(error) = scheduler.run_cycle(&cancellation).await {
                    warn!(%error, "rollup cycle ended with an error");
                }
            }
            _ = cancellation.cancelled() => {
                info!("shutdown requested, exiting cleanly");
                break;
            }
        }
    }

    if let Err(error) = shutdown.await {
        warn!(%error, "shutdown signal task panicked");
    }
    ExitCode::SUCCESS
}
