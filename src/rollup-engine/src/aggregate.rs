// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Aggregation functions over a window's known (non-null) values.
//!
//! `SPEC_FULL.md` §4.4: inputs here are already filtered of nulls by the
//! caller; an unknown method never reaches this module, since
//! `Node::aggregation_method` rejects it up front.

use cr_types::AggregationMethod;

/// Aggregates `known_values` (guaranteed non-empty by the caller) using
/// `method`. `sum`/`min`/`max` preserve exactness; `avg` uses double
/// division. `median` returns the upper-middle element on an even-length
/// input, matching `original_source`'s `values[len(values) / 2]`.
pub fn aggregate(method: AggregationMethod, known_values: &[f64]) -> f64 {
    debug_assert!(!known_values.is_empty(), "caller must filter out empty windows");
    match method {
        AggregationMethod::Avg => known_values.iter().sum::<f64>() / known_values.len() as f64,
        AggregationMethod::Sum => known_values.iter().sum(),
        AggregationMethod::Min => known_values
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min),
        AggregationMethod::Max => known_values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max),
        AggregationMethod::Median => {
            let mut sorted = known_values.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).expect("samples are never NaN"));
            sorted[sorted.len() / 2]
        }
    }
}
