// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A scoped handle on a held range lock.

use std::sync::Arc;

use tracing::warn;

use crate::session::LockHandle;

/// Guards a held per-range lock. The lock is released when
/// [`RangeLockGuard::release`] is called, or — as a backstop covering
/// every exit path, including a panicking worker — when the guard is
/// dropped without having been released explicitly.
///
/// `SPEC_FULL.md` §4.3: "the scope guarantees release on every exit path
/// including abort."
pub struct RangeLockGuard {
    handle: Option<Arc<dyn LockHandle>>,
    range: String,
}

impl RangeLockGuard {
    pub(crate) fn new(range: String, handle: Arc<dyn LockHandle>) -> Self {
        RangeLockGuard {
            handle: Some(handle),
            range,
        }
    }

    /// The `"<start>:<end>"` range this lock covers.
    pub fn range(&self) -> &str {
        &self.range
    }

    /// Releases the lock and consumes the guard.
    pub async fn release(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(error) = handle.release().await {
                warn!(range = %self.range, %error, "failed to release range lock");
            }
        }
    }
}

impl Drop for RangeLockGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let range = self.range.clone();
            tokio::spawn(async move {
                if let Err(error) = handle.release().await {
                    warn!(%range, %error, "failed to release range lock on drop");
                }
            });
        }
    }
}
