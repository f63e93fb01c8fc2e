// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Per-node metadata: retentions, aggregation method, and xFilesFactor.

use std::collections::BTreeMap;

use crate::Timestamp;

/// A single entry in a node's `retentions` list: samples at this
/// `precision` are kept for `retention` buckets, i.e. for
/// `precision * retention` seconds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetentionPolicy {
    pub precision: Timestamp,
    pub retention: i64,
}

impl RetentionPolicy {
    /// Total span covered by this retention level, in seconds.
    pub fn span(&self) -> i64 {
        self.precision * self.retention
    }
}

/// The aggregation method named in a node's metadata.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregationMethod {
    Avg,
    Sum,
    Min,
    Max,
    Median,
}

impl AggregationMethod {
    /// Parses a raw `aggregationMethod` string. The error is the method
    /// name itself; callers turn it into a
    /// [`RollupError::UnknownAggregate`](crate::error::RollupError::UnknownAggregate).
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "avg" | "average" => Ok(AggregationMethod::Avg),
            "sum" => Ok(AggregationMethod::Sum),
            "min" => Ok(AggregationMethod::Min),
            "max" => Ok(AggregationMethod::Max),
            "median" => Ok(AggregationMethod::Median),
            other => Err(other.to_string()),
        }
    }
}

/// A tagged-union value for an untyped metadata entry. Unrecognized keys
/// are preserved as `Other` so that metadata round-trips without loss even
/// though the rollup engine only interprets the three recognized keys.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaValue {
    Retentions(Vec<RetentionPolicy>),
    AggregationMethod(String),
    XFilesFactor(f64),
    Other(serde_json::Value),
}

/// A node's full metadata mapping, as read from the tree client.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    entries: BTreeMap<String, MetaValue>,
}

impl Metadata {
    pub fn new(entries: BTreeMap<String, MetaValue>) -> Self {
        Metadata { entries }
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    /// Parses the `retentions` entry into an ordered list of
    /// `RetentionPolicy`, without validating ordering or span invariants.
    /// `Node::retention_policy` enforces those (`SPEC_FULL.md` §3).
    pub fn retentions(&self) -> Result<Vec<RetentionPolicy>, String> {
        match self.entries.get("retentions") {
            Some(MetaValue::Retentions(policies)) => Ok(policies.clone()),
            Some(_) => Err("retentions metadata entry has the wrong shape".to_string()),
            None => Err("node metadata is missing a retentions entry".to_string()),
        }
    }

    pub fn aggregation_method(&self) -> Result<AggregationMethod, String> {
        match self.entries.get("aggregationMethod") {
            Some(MetaValue::AggregationMethod(raw)) => AggregationMethod::parse(raw),
            _ => Ok(AggregationMethod::Avg),
        }
    }

    /// Minimum fraction of non-null samples required to produce a window's
    /// aggregate. Defaults to `0.0` when absent, matching the source's
    /// `metadata.get('xFilesFactor')` falling back to a falsy value.
    pub fn x_files_factor(&self) -> f64 {
        match self.entries.get("xFilesFactor") {
            Some(MetaValue::XFilesFactor(xff)) => *xff,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_method_accepts_average_alias() {
        assert_eq!(AggregationMethod::parse("average"), Ok(AggregationMethod::Avg));
        assert_eq!(AggregationMethod::parse("avg"), Ok(AggregationMethod::Avg));
    }

    #[test]
    fn aggregation_method_rejects_unknown() {
        assert_eq!(AggregationMethod::parse("p99"), Err("p99".to_string()));
    }

    #[test]
    fn x_files_factor_defaults_to_zero_when_absent() {
        let metadata = Metadata::default();
        assert_eq!(metadata.x_files_factor(), 0.0);
    }

    #[test]
    fn retentions_missing_entry_is_an_error() {
        let metadata = Metadata::default();
        assert!(metadata.retentions().is_err());
    }
}
