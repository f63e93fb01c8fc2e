// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Derives one cycle's [`Archive`] chain from a node's retention policy.

use cr_types::{Archive, RetentionPolicy, Slice, Timestamp};

/// Builds the archive chain for one rollup cycle, newest (finest
/// precision) first.
///
/// Starting from `now` aligned down to the finest precision, each
/// archive's `end_time = t - (t % precision)` and `start_time = end_time
/// - precision * retention`; the next archive chains backward from
/// `t := start_time` (`SPEC_FULL.md` §4.4).
pub fn derive_archives(retentions: &[RetentionPolicy], slices: &[Slice], now: Timestamp) -> Vec<Archive> {
    let mut archives = Vec::with_capacity(retentions.len());
    let mut t = now;
    for policy in retentions {
        let end_time = t - t.rem_euclid(policy.precision);
        let start_time = end_time - policy.span();
        t = start_time;
        let archive_slices = slices
            .iter()
            .filter(|slice| slice.time_step == policy.precision)
            .cloned()
            .collect();
        archives.push(Archive {
            precision: policy.precision,
            retention: policy.retention,
            start_time,
            end_time,
            slices: archive_slices,
        });
    }
    archives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archives_chain_backward_from_now() {
        let retentions = vec![
            RetentionPolicy { precision: 10, retention: 6 },
            RetentionPolicy { precision: 60, retention: 4 },
        ];
        let archives = derive_archives(&retentions, &[], 1_000);

        assert_eq!(archives[0].precision, 10);
        assert_eq!(archives[0].end_time, 1_000);
        assert_eq!(archives[0].start_time, 1_000 - 60);

        assert_eq!(archives[1].precision, 60);
        assert_eq!(archives[1].end_time, archives[0].start_time - archives[0].start_time.rem_euclid(60));
        assert_eq!(archives[1].start_time, archives[1].end_time - 240);
    }

    #[test]
    fn each_archive_only_carries_slices_at_its_own_precision() {
        let retentions = vec![
            RetentionPolicy { precision: 10, retention: 6 },
            RetentionPolicy { precision: 60, retention: 4 },
        ];
        let slices = vec![
            Slice { start_time: 0, end_time: 60, time_step: 10 },
            Slice { start_time: 0, end_time: 240, time_step: 60 },
        ];
        let archives = derive_archives(&retentions, &slices, 1_000);
        assert_eq!(archives[0].slices.len(), 1);
        assert_eq!(archives[0].slices[0].time_step, 10);
        assert_eq!(archives[1].slices.len(), 1);
        assert_eq!(archives[1].slices[0].time_step, 60);
    }
}
