// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Read-only access to the storage cluster's token ring.
//!
//! This is the `RingClient` described in `SPEC_FULL.md` §4.1: it learns the
//! ordered token ranges that a set of target endpoints primarily own, by
//! cross-referencing `describeRing` against `describeTokenMap`. It does not
//! mutate cluster state and does not cache results across calls.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use cr_types::error::RollupError;
use cr_types::{Endpoint, Token, TokenRange};
use tracing::{debug, warn};

/// The out-of-scope wide-column driver boundary (`SPEC_FULL.md` §1, §6):
/// a thin read-only surface over the storage cluster's system interface.
/// Production deployments supply an implementation backed by the real
/// driver; the crate's own tests use an in-memory fake.
#[async_trait]
pub trait SystemInterface: Send + Sync {
    /// A cheap health probe. Returns the cluster name on success.
    async fn describe_cluster_name(&self, endpoint: &str) -> anyhow::Result<String>;

    /// The full, non-overlapping set of token ranges covering the ring.
    async fn describe_ring(&self, keyspace: &str) -> anyhow::Result<Vec<TokenRange>>;

    /// The mapping from each range's end token to the endpoint currently
    /// responsible for it (handles vnodes: many end tokens per endpoint).
    async fn describe_token_map(&self, keyspace: &str) -> anyhow::Result<BTreeMap<Token, Endpoint>>;
}

/// Contract: given a keyspace and a target set of endpoints, return the
/// ordered token ranges primarily owned by those endpoints.
#[async_trait]
pub trait RingClient: Send + Sync {
    async fn token_ranges_for_endpoints(
        &self,
        targets: &BTreeSet<Endpoint>,
    ) -> Result<Vec<(Token, Token, Endpoint)>, RollupError>;
}

/// A `RingClient` backed by a [`SystemInterface`] driver.
pub struct CassandraRingClient {
    candidate_endpoints: Vec<Endpoint>,
    keyspace: String,
    driver: Arc<dyn SystemInterface>,
}

impl CassandraRingClient {
    pub fn new(
        candidate_endpoints: Vec<Endpoint>,
        keyspace: String,
        driver: Arc<dyn SystemInterface>,
    ) -> Self {
        CassandraRingClient {
            candidate_endpoints,
            keyspace,
            driver,
        }
    }

    /// Finds the first candidate endpoint that answers a health probe.
    async fn open_session(&self) -> Result<Endpoint, RollupError> {
        for endpoint in &self.candidate_endpoints {
            match self.driver.describe_cluster_name(endpoint).await {
                Ok(cluster_name) => {
                    debug!(%endpoint, %cluster_name, "connected to storage cluster");
                    return Ok(endpoint.clone());
                }
                Err(error) => {
                    warn!(%endpoint, %error, "candidate storage endpoint did not answer");
                }
            }
        }
        Err(RollupError::RingUnavailable)
    }
}

#[async_trait]
impl RingClient for CassandraRingClient {
    async fn token_ranges_for_endpoints(
        &self,
        targets: &BTreeSet<Endpoint>,
    ) -> Result<Vec<(Token, Token, Endpoint)>, RollupError> {
        // Step 1: find a session endpoint.
        self.open_session().await?;

        // Step 2: describeRing() -> end_token -> TokenRange.
        let ranges = self
            .driver
            .describe_ring(&self.keyspace)
            .await
            .map_err(RollupError::StorageTransient)?;
        let ranges_by_end_token: BTreeMap<Token, &TokenRange> = ranges
            .iter()
            .map(|range| (range.end_token.clone(), range))
            .collect();

        // Step 3: describeTokenMap(), filtered to our targets.
        let token_map = self
            .driver
            .describe_token_map(&self.keyspace)
            .await
            .map_err(RollupError::StorageTransient)?;

        // Step 4/5: join, validate, and emit in token-map order.
        let mut seen_ranges: BTreeSet<(Token, Token)> = BTreeSet::new();
        let mut result = Vec::new();
        for (end_token, endpoint) in &token_map {
            if !targets.contains(endpoint) {
                continue;
            }
            let range = ranges_by_end_token.get(end_token).ok_or_else(|| {
                RollupError::RingInconsistent {
                    end_token: end_token.to_string(),
                    endpoint: endpoint.clone(),
                }
            })?;
            if !range.endpoints.contains(endpoint) {
                return Err(RollupError::RingInconsistent {
                    end_token: end_token.to_string(),
                    endpoint: endpoint.clone(),
                });
            }
            let range_key = (range.start_token.clone(), range.end_token.clone());
            if !seen_ranges.insert(range_key) {
                return Err(RollupError::RingInconsistent {
                    end_token: end_token.to_string(),
                    endpoint: endpoint.clone(),
                });
            }
            result.push((range.start_token.clone(), range.end_token.clone(), endpoint.clone()));
        }
        Ok(result)
    }
}
