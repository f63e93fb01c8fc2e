// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The integration point for the out-of-scope wide-column and
//! coordination-service drivers.
//!
//! `SPEC_FULL.md`'s Non-goals: no concrete Cassandra/ZooKeeper wire
//! client is vendored or hand-rolled here, exactly as `original_source`
//! shells out to `carbon_cassandra_plugin` and `kazoo` rather than
//! reimplementing them. A production build links a crate that provides
//! [`SystemInterface`], [`TreeDriver`], and [`CoordinationClient`]
//! implementations and constructs them in [`build`].

use std::sync::Arc;

use cr_coordinator::CoordinationClient;
use cr_ring_client::SystemInterface;
use cr_tree_client::TreeDriver;

use crate::config::Config;

pub struct Drivers {
    pub system_interface: Arc<dyn SystemInterface>,
    pub tree_driver: Arc<dyn TreeDriver>,
    pub coordination_client: Arc<dyn CoordinationClient>,
}

/// Builds the drivers for `config`. Always fails in this workspace: the
/// wide-column and coordination-service wire clients are out of scope
/// (`SPEC_FULL.md` Non-goals), so there is nothing to construct without a
/// production driver crate linked in here.
pub fn build(_config: &Config) -> anyhow::Result<Drivers> {
    anyhow::bail!(
        "no SystemInterface/TreeDriver/CoordinationClient implementation is linked into this \
         build; link a production storage/coordination driver crate and construct it in \
         cr_daemon::drivers::build"
    )
}
