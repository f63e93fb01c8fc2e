// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Pure traversal glue deciding what a tree-walk step means
//! (`SPEC_FULL.md` §4.5). Holds no I/O; [`crate::walk::walk_range`] drives
//! the actual work queue.

use cr_types::NodePath;

/// What `walk_range` should do with one `(child_path, is_metric)` pair
/// returned for `parent_path`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VisitDecision {
    /// Roll up the metric at this path; do not descend further.
    InvokeEngine,
    /// List `child_path`'s own children and visit those.
    Recurse,
}

/// Implements spec.md §4.5's three-way decision:
/// - a metric whose path differs from its parent is a leaf: roll it up.
/// - a metric whose path equals its parent is the "self" entry the store
///   returns for the path just queried: recurse into it to pick up its
///   own children.
/// - anything else is a branch: recurse.
///
/// `parent_path` is `None` at the root of a range walk, where there is no
/// real path to echo back as a "self" entry — a root-level metric can
/// never be mistaken for one, so it always gets rolled up directly.
pub fn decide(parent_path: Option<&NodePath>, child_path: &NodePath, is_metric: bool) -> VisitDecision {
    if is_metric && parent_path != Some(child_path) {
        VisitDecision::InvokeEngine
    } else {
        VisitDecision::Recurse
    }
}
