// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Per-metric rollup aggregation (`SPEC_FULL.md` §4.4): derives a node's
//! archive chain and folds each archive's overflow samples into its
//! coarser neighbor, subject to xFilesFactor gating.

mod aggregate;
mod archive;
mod engine;

pub use aggregate::aggregate;
pub use archive::derive_archives;
pub use engine::RollupEngine;
