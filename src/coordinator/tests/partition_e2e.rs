// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! spec.md E2E-3: two live members partitioning the same token-range set
//! must end up with disjoint, non-empty assignments whose union is the
//! full set.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use cr_coordinator::{Coordinator, CoordinationClient, LockHandle, PartitionerHandle, PartitionerState, SessionState};
use cr_types::error::RollupError;

/// A deterministic stand-in for the real set-partitioner algorithm (out
/// of scope; driver-specific). Splits the input set round-robin across
/// `member_count` members by sorted position, which is enough to exercise
/// the disjointness property the real coordination service guarantees.
struct ShardedPartitioner {
    assignment: Vec<String>,
}

#[async_trait]
impl PartitionerHandle for ShardedPartitioner {
    fn state(&self) -> PartitionerState {
        PartitionerState::Acquired
    }

    fn assignment(&self) -> Vec<String> {
        self.assignment.clone()
    }

    async fn wait_for_acquire(&self) -> Result<(), RollupError> {
        Ok(())
    }

    async fn release_set(&self) -> Result<(), RollupError> {
        Ok(())
    }

    async fn finish(&self) -> Result<(), RollupError> {
        Ok(())
    }
}

struct NoopLock;

#[async_trait]
impl LockHandle for NoopLock {
    async fn release(&self) -> Result<(), RollupError> {
        Ok(())
    }
}

struct FakeShardedClient {
    member_index: usize,
    member_count: usize,
}

#[async_trait]
impl CoordinationClient for FakeShardedClient {
    async fn start_session(
        &self,
        _hosts: &[String],
        _acl_password: &str,
        _on_state_change: Arc<dyn Fn(SessionState) + Send + Sync>,
    ) -> Result<(), RollupError> {
        Ok(())
    }

    async fn update_hosts(&self, _hosts: &[String]) -> Result<(), RollupError> {
        Ok(())
    }

    async fn ensure_path(&self, _path: &str) -> Result<(), RollupError> {
        Ok(())
    }

    async fn create_partitioner(
        &self,
        _path: &str,
        set: BTreeSet<String>,
    ) -> Result<Arc<dyn PartitionerHandle>, RollupError> {
        let assignment = set
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % self.member_count == self.member_index)
            .map(|(_, range)| range)
            .collect();
        Ok(Arc::new(ShardedPartitioner { assignment }))
    }

    async fn lock_contenders(&self, _path: &str) -> Result<Vec<String>, RollupError> {
        Ok(Vec::new())
    }

    async fn acquire_lock(&self, _path: &str, _identity: &str) -> Result<Arc<dyn LockHandle>, RollupError> {
        Ok(Arc::new(NoopLock))
    }
}

#[tokio::test]
async fn e2e_3_two_members_produce_disjoint_nonempty_assignments_covering_the_set() {
    let set: BTreeSet<String> = ["A:B", "B:C", "C:A"].iter().map(|s| s.to_string()).collect();

    let member_a = Coordinator::new(
        Arc::new(FakeShardedClient { member_index: 0, member_count: 2 }),
        "secret".to_string(),
    );
    let member_b = Coordinator::new(
        Arc::new(FakeShardedClient { member_index: 1, member_count: 2 }),
        "secret".to_string(),
    );

    let partitioner_a = member_a.partition(set.clone()).await.unwrap();
    let partitioner_b = member_b.partition(set.clone()).await.unwrap();

    partitioner_a.wait_for_acquire().await.unwrap();
    partitioner_b.wait_for_acquire().await.unwrap();
    assert_eq!(partitioner_a.state(), PartitionerState::Acquired);
    assert_eq!(partitioner_b.state(), PartitionerState::Acquired);

    let assignment_a: BTreeSet<String> = partitioner_a.assignment().into_iter().collect();
    let assignment_b: BTreeSet<String> = partitioner_b.assignment().into_iter().collect();

    assert!(!assignment_a.is_empty());
    assert!(!assignment_b.is_empty());
    assert!(assignment_a.is_disjoint(&assignment_b));
    assert_eq!(
        assignment_a.union(&assignment_b).cloned().collect::<BTreeSet<_>>(),
        set
    );
}
