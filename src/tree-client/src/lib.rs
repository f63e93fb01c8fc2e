// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Read/write access to the persisted metric namespace tree.
//!
//! This is the `TreeClient` described in `SPEC_FULL.md` §4.2: a thin
//! abstraction over walking the metric tree and reading/writing slices.
//! `Node::readMetadata()` caching is satisfied structurally — `get_node`
//! returns a fully-populated [`Node`] once per invocation, and callers hold
//! onto that value for the lifetime of one metric's rollup rather than
//! re-fetching it.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use cr_types::error::RollupError;
use cr_types::{DataPoint, Node, NodePath, Slice, SliceId, Timestamp, Token};
use futures::Stream;
use tracing::debug;

/// A lazy, single-pass, finite sequence of `(path, is_metric)` pairs.
/// "Not restartable" (`SPEC_FULL.md` §4.2): once consumed it cannot be
/// iterated again.
pub type PathStream = Pin<Box<dyn Stream<Item = Result<(NodePath, bool), RollupError>> + Send>>;

/// The out-of-scope wide-column driver boundary for namespace access
/// (`SPEC_FULL.md` §1, §6). Production deployments supply an
/// implementation backed by the real driver; the crate's own tests use an
/// in-memory fake.
#[async_trait]
pub trait TreeDriver: Send + Sync {
    async fn self_and_child_paths(
        &self,
        path: Option<NodePath>,
        dc_name: Option<String>,
        start_token: Option<Token>,
        end_token: Option<Token>,
    ) -> Result<PathStream, RollupError>;

    async fn get_node(&self, path: &NodePath) -> Result<Node, RollupError>;

    /// Reads samples in `[from, to)`. Returns
    /// [`RollupError::NoData`](cr_types::error::RollupError::NoData) when
    /// the slice has no samples in range.
    async fn read_slice(
        &self,
        path: &NodePath,
        slice: SliceId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<DataPoint>, RollupError>;

    /// Append-preferred write. Writing into a pre-existing slice whose
    /// window covers the target timestamps is allowed.
    async fn write_slice(
        &self,
        path: &NodePath,
        slice: SliceId,
        points: Vec<DataPoint>,
    ) -> Result<(), RollupError>;

    async fn create_slice(
        &self,
        path: &NodePath,
        start_time: Timestamp,
        time_step: Timestamp,
    ) -> Result<Slice, RollupError>;
}

/// Forwards to the wrapped driver, so `CassandraTreeClient` can be built
/// directly over the `Arc<dyn TreeDriver>` a production binary constructs
/// at its driver boundary (`cr-daemon::drivers::build`), without a second
/// concrete driver type.
#[async_trait]
impl<D: TreeDriver + ?Sized> TreeDriver for Arc<D> {
    async fn self_and_child_paths(
        &self,
        path: Option<NodePath>,
        dc_name: Option<String>,
        start_token: Option<Token>,
        end_token: Option<Token>,
    ) -> Result<PathStream, RollupError> {
        (**self).self_and_child_paths(path, dc_name, start_token, end_token).await
    }

    async fn get_node(&self, path: &NodePath) -> Result<Node, RollupError> {
        (**self).get_node(path).await
    }

    async fn read_slice(
        &self,
        path: &NodePath,
        slice: SliceId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<DataPoint>, RollupError> {
        (**self).read_slice(path, slice, from, to).await
    }

    async fn write_slice(
        &self,
        path: &NodePath,
        slice: SliceId,
        points: Vec<DataPoint>,
    ) -> Result<(), RollupError> {
        (**self).write_slice(path, slice, points).await
    }

    async fn create_slice(
        &self,
        path: &NodePath,
        start_time: Timestamp,
        time_step: Timestamp,
    ) -> Result<Slice, RollupError> {
        (**self).create_slice(path, start_time, time_step).await
    }
}

/// The public contract used by the rollup engine and scheduler.
#[async_trait]
pub trait TreeClient: Send + Sync {
    async fn self_and_child_paths(
        &self,
        path: Option<NodePath>,
        dc_name: Option<String>,
        start_token: Option<Token>,
        end_token: Option<Token>,
    ) -> Result<PathStream, RollupError>;

    async fn get_node(&self, path: &NodePath) -> Result<Node, RollupError>;

    /// Reads samples in `[from, to)`, treating a missing slice as empty
    /// (`SPEC_FULL.md` §7: `NoData` is never propagated past this point).
    async fn read(
        &self,
        path: &NodePath,
        slice: SliceId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<DataPoint>, RollupError>;

    async fn write(
        &self,
        path: &NodePath,
        slice: SliceId,
        points: Vec<DataPoint>,
    ) -> Result<(), RollupError>;

    async fn create_slice(
        &self,
        path: &NodePath,
        start_time: Timestamp,
        time_step: Timestamp,
    ) -> Result<Slice, RollupError>;
}

/// A `TreeClient` backed by a [`TreeDriver`].
pub struct CassandraTreeClient<D> {
    driver: D,
}

impl<D> CassandraTreeClient<D> {
    pub fn new(driver: D) -> Self {
        CassandraTreeClient { driver }
    }
}

#[async_trait]
impl<D: TreeDriver> TreeClient for CassandraTreeClient<D> {
    async fn self_and_child_paths(
        &self,
        path: Option<NodePath>,
        dc_name: Option<String>,
        start_token: Option<Token>,
        end_token: Option<Token>,
    ) -> Result<PathStream, RollupError> {
        self.driver
            .self_and_child_paths(path, dc_name, start_token, end_token)
            .await
    }

    async fn get_node(&self, path: &NodePath) -> Result<Node, RollupError> {
        self.driver.get_node(path).await
    }

    async fn read(
        &self,
        path: &NodePath,
        slice: SliceId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<DataPoint>, RollupError> {
        match self.driver.read_slice(path, slice, from, to).await {
            Ok(points) => Ok(points),
            Err(RollupError::NoData) => {
                debug!(%path, "no data in requested range, treating as empty");
                Ok(Vec::new())
            }
            Err(other) => Err(other),
        }
    }

    async fn write(
        &self,
        path: &NodePath,
        slice: SliceId,
        points: Vec<DataPoint>,
    ) -> Result<(), RollupError> {
        self.driver.write_slice(path, slice, points).await
    }

    async fn create_slice(
        &self,
        path: &NodePath,
        start_time: Timestamp,
        time_step: Timestamp,
    ) -> Result<Slice, RollupError> {
        self.driver.create_slice(path, start_time, time_step).await
    }
}

/// Forwards to the wrapped client, so an `Arc<dyn TreeClient>` (or
/// `Arc<CassandraTreeClient<D>>`) can be shared between the scheduler's
/// tree walk and the rollup engine without cloning the underlying client.
#[async_trait]
impl<C: TreeClient + ?Sized> TreeClient for Arc<C> {
    async fn self_and_child_paths(
        &self,
        path: Option<NodePath>,
        dc_name: Option<String>,
        start_token: Option<Token>,
        end_token: Option<Token>,
    ) -> Result<PathStream, RollupError> {
        (**self).self_and_child_paths(path, dc_name, start_token, end_token).await
    }

    async fn get_node(&self, path: &NodePath) -> Result<Node, RollupError> {
        (**self).get_node(path).await
    }

    async fn read(
        &self,
        path: &NodePath,
        slice: SliceId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<DataPoint>, RollupError> {
        (**self).read(path, slice, from, to).await
    }

    async fn write(
        &self,
        path: &NodePath,
        slice: SliceId,
        points: Vec<DataPoint>,
    ) -> Result<(), RollupError> {
        (**self).write(path, slice, points).await
    }

    async fn create_slice(
        &self,
        path: &NodePath,
        start_time: Timestamp,
        time_step: Timestamp,
    ) -> Result<Slice, RollupError> {
        (**self).create_slice(path, start_time, time_step).await
    }
}
