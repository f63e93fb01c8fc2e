// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! `walkRange` (`SPEC_FULL.md` §4.6): acquires a range's lock, walks its
//! namespace with an explicit work queue (Design Notes §9: bounded stack
//! depth instead of recursion), and rolls up every metric it finds.

use std::collections::VecDeque;

use cr_coordinator::{Coordinator, CoordinationClient};
use cr_rollup_engine::RollupEngine;
use cr_tree_client::TreeClient;
use cr_types::error::RollupError;
use cr_types::{NodePath, Timestamp, Token};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::visitor::{decide, VisitDecision};

/// Acquires the lock for `[start_token, end_token]`, walks its namespace,
/// and releases the lock on every exit path (normal return, cancellation,
/// or error).
pub async fn walk_range<C, T>(
    coordinator: &Coordinator<C>,
    tree_client: &T,
    engine: &RollupEngine<T>,
    start_token: Token,
    end_token: Token,
    now: Timestamp,
    cancellation: &CancellationToken,
) -> Result<(), RollupError>
where
    C: CoordinationClient + ?Sized + 'static,
    T: TreeClient,
{
    let guard = match coordinator.acquire_range_lock(&start_token, &end_token).await {
        Ok(guard) => guard,
        Err(RollupError::LockContended { range, contenders }) => {
            debug!(%range, ?contenders, "range lock contended, skipping this cycle");
            return Ok(());
        }
        Err(other) => return Err(other),
    };

    let result = walk_inner(tree_client, engine, start_token, end_token, now, cancellation).await;
    guard.release().await;
    result
}

async fn walk_inner<T: TreeClient>(
    tree_client: &T,
    engine: &RollupEngine<T>,
    start_token: Token,
    end_token: Token,
    now: Timestamp,
    cancellation: &CancellationToken,
) -> Result<(), RollupError> {
    // Explicit work queue instead of recursion: bounds stack depth
    // regardless of namespace nesting (Design Notes §9).
    let mut queue: VecDeque<(Option<NodePath>, Option<Token>, Option<Token>)> = VecDeque::new();
    queue.push_back((None, Some(start_token), Some(end_token)));

    while let Some((path, queue_start, queue_end)) = queue.pop_front() {
        let parent_path = path.clone();
        let mut stream = tree_client
            .self_and_child_paths(path, None, queue_start, queue_end)
            .await?;

        while let Some(item) = stream.next().await {
            let (child_path, is_metric) = item?;

            match decide(parent_path.as_ref(), &child_path, is_metric) {
                VisitDecision::InvokeEngine => {
                    if let Err(error) = roll_up_one(tree_client, engine, &child_path, now).await {
                        warn!(path = %child_path, %error, "failed to roll up metric, continuing");
                    }
                }
                VisitDecision::Recurse => {
                    queue.push_back((Some(child_path), None, None));
                }
            }

            // Checked between items, not mid-metric: preserves any
            // in-flight rollup (spec.md E2E-5).
            if cancellation.is_cancelled() {
                debug!("cancellation observed between metrics, ending range walk early");
                return Ok(());
            }
        }
    }
    Ok(())
}

async fn roll_up_one<T: TreeClient>(
    tree_client: &T,
    engine: &RollupEngine<T>,
    path: &NodePath,
    now: Timestamp,
) -> Result<(), RollupError> {
    let node = tree_client.get_node(path).await?;
    engine.rollup(&node, now).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use cr_coordinator::{LockHandle, PartitionerHandle, PartitionerState, SessionState};
    use cr_tree_client::PathStream;
    use cr_types::{DataPoint, MetaValue, Metadata, Node, SliceId, Slice};
    use futures::stream;
    use std::collections::BTreeMap;
    use std::collections::BTreeSet;

    use super::*;

    struct FakeLock;
    #[async_trait]
    impl LockHandle for FakeLock {
        async fn release(&self) -> Result<(), RollupError> {
            Ok(())
        }
    }

    struct FakeCoordinationClient {
        contenders: Vec<String>,
    }

    #[async_trait]
    impl CoordinationClient for FakeCoordinationClient {
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
            struct P(Vec<String>);
            #[async_trait]
            impl PartitionerHandle for P {
                fn state(&self) -> PartitionerState {
                    PartitionerState::Acquired
                }
                fn assignment(&self) -> Vec<String> {
                    self.0.clone()
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
            Ok(Arc::new(P(set.into_iter().collect())))
        }
        async fn lock_contenders(&self, _path: &str) -> Result<Vec<String>, RollupError> {
            Ok(self.contenders.clone())
        }
        async fn acquire_lock(&self, _path: &str, _identity: &str) -> Result<Arc<dyn LockHandle>, RollupError> {
            Ok(Arc::new(FakeLock))
        }
    }

    #[derive(Clone, Default)]
    struct FakeTreeClient {
        rollup_invocations: Arc<std::sync::Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl TreeClient for FakeTreeClient {
        async fn self_and_child_paths(
            &self,
            path: Option<NodePath>,
            _dc_name: Option<String>,
            _start_token: Option<Token>,
            _end_token: Option<Token>,
        ) -> Result<PathStream, RollupError> {
            // A fixed two-level namespace: root has two metric children.
            let items = match path {
                None => vec![
                    Ok((NodePath::new("servers.web01.cpu.load"), true)),
                    Ok((NodePath::new("servers.web01.mem.used"), true)),
                ],
                Some(_) => vec![],
            };
            Ok(Box::pin(stream::iter(items)))
        }

        async fn get_node(&self, path: &NodePath) -> Result<Node, RollupError> {
            self.rollup_invocations.lock().unwrap().push(path.to_string());
            let mut entries = BTreeMap::new();
            entries.insert(
                "retentions".to_string(),
                MetaValue::Retentions(vec![cr_types::RetentionPolicy { precision: 10, retention: 6 }]),
            );
            Ok(Node {
                path: path.clone(),
                is_metric: true,
                metadata: Metadata::new(entries),
                slices: Vec::new(),
            })
        }

        async fn read(&self, _path: &NodePath, _slice: SliceId, _from: Timestamp, _to: Timestamp) -> Result<Vec<DataPoint>, RollupError> {
            Ok(Vec::new())
        }

        async fn write(&self, _path: &NodePath, _slice: SliceId, _points: Vec<DataPoint>) -> Result<(), RollupError> {
            Ok(())
        }

        async fn create_slice(&self, _path: &NodePath, start_time: Timestamp, time_step: Timestamp) -> Result<Slice, RollupError> {
            Ok(Slice { start_time, end_time: start_time + time_step, time_step })
        }
    }

    #[tokio::test]
    async fn walk_range_visits_every_metric_when_not_cancelled() {
        let coordinator = Coordinator::new(Arc::new(FakeCoordinationClient { contenders: Vec::new() }), "secret".to_string());
        let tree_client = FakeTreeClient::default();
        let engine = RollupEngine::new(tree_client.clone());
        let cancellation = CancellationToken::new();

        walk_range(&coordinator, &tree_client, &engine, Token::new("a"), Token::new("z"), 1_000, &cancellation)
            .await
            .unwrap();

        let invocations = tree_client.rollup_invocations.lock().unwrap();
        assert_eq!(invocations.len(), 2);
    }

    // spec.md E2E-5: cancellation observed between two metrics stops the
    // walk early without interrupting the in-flight one.
    #[tokio::test]
    async fn walk_range_stops_between_metrics_once_cancelled() {
        let coordinator = Coordinator::new(Arc::new(FakeCoordinationClient { contenders: Vec::new() }), "secret".to_string());
        let tree_client = FakeTreeClient::default();
        let engine = RollupEngine::new(tree_client.clone());
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        walk_range(&coordinator, &tree_client, &engine, Token::new("a"), Token::new("z"), 1_000, &cancellation)
            .await
            .unwrap();

        // The first metric still completes before the cancellation check.
        let invocations = tree_client.rollup_invocations.lock().unwrap();
        assert_eq!(invocations.len(), 1);
    }

    #[tokio::test]
    async fn walk_range_skips_when_lock_is_contended() {
        let coordinator = Coordinator::new(
            Arc::new(FakeCoordinationClient { contenders: vec!["other-host-1".to_string()] }),
            "secret".to_string(),
        );
        let tree_client = FakeTreeClient::default();
        let engine = RollupEngine::new(tree_client.clone());
        let cancellation = CancellationToken::new();

        walk_range(&coordinator, &tree_client, &engine, Token::new("a"), Token::new("z"), 1_000, &cancellation)
            .await
            .unwrap();

        assert!(tree_client.rollup_invocations.lock().unwrap().is_empty());
    }
}
