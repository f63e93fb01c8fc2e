// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The cycle driver: range discovery, set partitioning, a bounded worker
//! pool, and the namespace walk that feeds the rollup engine
//! (`SPEC_FULL.md` §4.5, §4.6).

mod scheduler;
mod visitor;
mod walk;

pub use scheduler::{ConfigSource, Scheduler};
pub use visitor::{decide, VisitDecision};
pub use walk::walk_range;
