// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A point in the metric namespace tree.

use std::fmt;

use crate::error::RollupError;
use crate::metadata::{AggregationMethod, Metadata, RetentionPolicy};
use crate::slice::Slice;

/// A slash-separated path identifying a node in the metric tree, e.g.
/// `servers.web01.cpu.load`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodePath(String);

impl NodePath {
    pub fn new(raw: impl Into<String>) -> Self {
        NodePath(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodePath {
    fn from(raw: String) -> Self {
        NodePath(raw)
    }
}

/// A point in the metric tree: a branch node (has children, no samples) or
/// a leaf "metric" node (owns slices, no children).
#[derive(Clone, Debug)]
pub struct Node {
    pub path: NodePath,
    pub is_metric: bool,
    pub metadata: Metadata,
    pub slices: Vec<Slice>,
}

impl Node {
    /// Parses and validates this node's retention policy list.
    ///
    /// `SPEC_FULL.md` §3: `retentions` must be sorted by ascending
    /// `precision`, and each entry's total span must be at least the
    /// previous entry's total span.
    pub fn retention_policy(&self) -> Result<Vec<RetentionPolicy>, RollupError> {
        let retentions = self
            .metadata
            .retentions()
            .map_err(|reason| RollupError::InvalidMetadata {
                node_path: self.path.to_string(),
                reason,
            })?;
        for window in retentions.windows(2) {
            let (prev, next) = (window[0], window[1]);
            if next.precision < prev.precision {
                return Err(RollupError::InvalidMetadata {
                    node_path: self.path.to_string(),
                    reason: format!(
                        "retentions must be sorted by ascending precision, got {} after {}",
                        next.precision, prev.precision
                    ),
                });
            }
            if next.span() < prev.span() {
                return Err(RollupError::InvalidMetadata {
                    node_path: self.path.to_string(),
                    reason: format!(
                        "retention span must not shrink: {} covers less than {}",
                        next.precision, prev.precision
                    ),
                });
            }
        }
        Ok(retentions)
    }

    pub fn aggregation_method(&self) -> Result<AggregationMethod, RollupError> {
        self.metadata
            .aggregation_method()
            .map_err(|method| RollupError::UnknownAggregate { method })
    }

    pub fn x_files_factor(&self) -> f64 {
        self.metadata.x_files_factor()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::metadata::MetaValue;

    fn node_with_retentions(retentions: Vec<RetentionPolicy>) -> Node {
        let mut entries = BTreeMap::new();
        entries.insert("retentions".to_string(), MetaValue::Retentions(retentions));
        Node {
            path: NodePath::new("servers.web01.cpu"),
            is_metric: true,
            metadata: Metadata::new(entries),
            slices: Vec::new(),
        }
    }

    #[test]
    fn retention_policy_of_length_one_is_fine_but_yields_no_rollup_pair() {
        let node = node_with_retentions(vec![RetentionPolicy {
            precision: 10,
            retention: 6,
        }]);
        let policies = node.retention_policy().expect("single retention is valid");
        assert_eq!(policies.len(), 1);
    }

    #[test]
    fn retention_policy_rejects_decreasing_precision() {
        let node = node_with_retentions(vec![
            RetentionPolicy {
                precision: 60,
                retention: 4,
            },
            RetentionPolicy {
                precision: 10,
                retention: 6,
            },
        ]);
        assert!(node.retention_policy().is_err());
    }

    #[test]
    fn retention_policy_rejects_shrinking_span() {
        let node = node_with_retentions(vec![
            RetentionPolicy {
                precision: 10,
                retention: 600,
            },
            RetentionPolicy {
                precision: 60,
                retention: 4,
            },
        ]);
        assert!(node.retention_policy().is_err());
    }

    #[test]
    fn retention_policy_accepts_growing_span() {
        let node = node_with_retentions(vec![
            RetentionPolicy {
                precision: 10,
                retention: 6,
            },
            RetentionPolicy {
                precision: 60,
                retention: 4,
            },
        ]);
        assert!(node.retention_policy().is_ok());
    }
}
