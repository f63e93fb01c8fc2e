// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Shared data model and error types for the Cassandra rollup daemon.
//!
//! This crate has no I/O of its own. It exists so that `cr-ring-client`,
//! `cr-tree-client`, `cr-coordinator`, `cr-rollup-engine`, and `cr-scheduler`
//! agree on a single definition of the ring/tree/archive data model
//! described in the rollup daemon's design (see `SPEC_FULL.md` §3).

pub mod archive;
pub mod error;
pub mod metadata;
pub mod node;
pub mod ring;
pub mod slice;

pub use archive::Archive;
pub use error::RollupError;
pub use metadata::{AggregationMethod, MetaValue, Metadata, RetentionPolicy};
pub use node::{Node, NodePath};
pub use ring::{Endpoint, Token, TokenRange};
pub use slice::{DataPoint, Slice, SliceId};

/// Timestamps throughout the rollup daemon are whole seconds since the
/// Unix epoch. See `SPEC_FULL.md` §3's resolution of the source's
/// seconds-vs-milliseconds ambiguity.
pub type Timestamp = i64;

/// A single sample value. `None` represents a null/missing data point.
pub type Value = Option<f64>;
