// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Per-metric rollup: turns overflow samples from one archive into
//! aggregated samples in its coarser neighbor (`SPEC_FULL.md` §4.4).

use cr_tree_client::TreeClient;
use cr_types::error::RollupError;
use cr_types::{Archive, DataPoint, Node, Slice};
use tracing::info;

use crate::aggregate::aggregate;
use crate::archive::derive_archives;

/// Drives `rollup(node)` against a [`TreeClient`].
pub struct RollupEngine<T> {
    tree_client: T,
}

impl<T: TreeClient> RollupEngine<T> {
    pub fn new(tree_client: T) -> Self {
        RollupEngine { tree_client }
    }

    /// Rolls up `node` as of `now`.
    ///
    /// Builds the archive chain and, for each adjacent (fine, coarse)
    /// pair, pushes fine's overflow into coarse. The oldest archive has
    /// no coarser partner and is skipped entirely — `archives.windows(2)`
    /// never produces a pair for it, which is equivalent to gating on
    /// "coarse is None" in the source algorithm.
    pub async fn rollup(&self, node: &Node, now: i64) -> Result<(), RollupError> {
        let retentions = node.retention_policy()?;
        let archives = derive_archives(&retentions, &node.slices, now);
        if archives.len() < 2 {
            info!(node_path = %node.path, "single retention level, nothing to roll up");
            return Ok(());
        }

        info!(node_path = %node.path, archive_count = archives.len(), "started rolling up metric");
        for window in archives.windows(2) {
            let (fine, coarse) = (&window[0], &window[1]);
            self.do_rollup(node, fine, coarse).await?;
        }
        info!(node_path = %node.path, "finished rolling up metric");
        Ok(())
    }

    /// Pushes `fine`'s overflow samples (those older than `fine`'s own
    /// window) into `coarse`, one aggregated sample per coarse window.
    async fn do_rollup(&self, node: &Node, fine: &Archive, coarse: &Archive) -> Result<(), RollupError> {
        let overflow_slices: Vec<&Slice> = fine
            .slices
            .iter()
            .filter(|slice| slice.start_time < fine.start_time)
            .collect();
        if overflow_slices.is_empty() {
            return Ok(());
        }

        let mut overflow: Vec<DataPoint> = Vec::new();
        for slice in overflow_slices {
            let points = self
                .tree_client
                .read(&node.path, slice.id(), slice.start_time, fine.start_time)
                .await?;
            overflow.extend(points);
        }
        overflow.sort_by_key(|(timestamp, _)| *timestamp);

        let xff = node.x_files_factor();
        let method = node.aggregation_method()?;
        let mut coarse_slices = coarse.slices.clone();

        for i in 0..coarse.retention {
            let window_start = coarse.start_time + i * coarse.precision;
            let window_end = window_start + coarse.precision;

            let fine_datapoints: Vec<&DataPoint> = overflow
                .iter()
                .filter(|(timestamp, _)| *timestamp >= window_start && *timestamp < window_end)
                .collect();
            if fine_datapoints.is_empty() {
                continue;
            }

            let known: Vec<f64> = fine_datapoints.iter().filter_map(|(_, value)| *value).collect();
            if known.is_empty() {
                continue;
            }
            let known_fraction = known.len() as f64 / fine_datapoints.len() as f64;
            if known_fraction < xff {
                continue;
            }

            let coarse_value = aggregate(method, &known);

            let target = match coarse_slices
                .iter()
                .find(|slice| slice.covers(window_start))
                .cloned()
            {
                Some(slice) => slice,
                None => {
                    let created = self
                        .tree_client
                        .create_slice(&node.path, window_start, coarse.precision)
                        .await?;
                    coarse_slices.push(created.clone());
                    created
                }
            };
            self.tree_client
                .write(&node.path, target.id(), vec![(window_start, Some(coarse_value))])
                .await?;
        }
        Ok(())
    }
}
