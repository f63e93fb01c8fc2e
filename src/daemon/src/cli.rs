// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Command-line surface (`SPEC_FULL.md` §6). `clap`'s `derive` + `env`
//! features, matching the teacher's CLI convention.

use std::path::PathBuf;

use clap::{ArgEnum, Parser};

#[derive(Clone, Copy, Debug, ArgEnum, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Debug,
}

/// Rolls up fine-grained Cassandra metrics into coarser retention tiers
/// on a periodic cycle.
#[derive(Parser, Debug)]
#[clap(name = "cassandra-rollup")]
pub struct Args {
    /// JSON config file path. Presence switches to file mode; absence
    /// falls back to reading configuration from the environment.
    #[clap(long, env = "CASSANDRA_ROLLUP_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Logger verbosity.
    #[clap(long, arg_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Cycle period, in seconds.
    #[clap(long, default_value_t = 60)]
    pub interval: u64,

    /// Log sink path.
    #[clap(long, default_value = "/var/log/cassandra_rollup.log")]
    pub log_file: PathBuf,

    /// Reserved; currently ignored.
    #[clap(long)]
    pub dc_name: Option<String>,
}
