// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Filtered reachability between regions.

use ahash::AHashSet;
use std::collections::VecDeque;

use super::DigraphState;
use crate::filter::RegionFilter;

/// Breadth-first search from `from` to `to`, following only edges whose filter
/// satisfies `admits`
///
/// A region always reaches itself. Cycles are fine; every region is expanded
/// at most once.
pub(crate) fn region_reachable<F>(state: &DigraphState, from: &str, to: &str, admits: F) -> bool
where
    F: Fn(&RegionFilter) -> bool,
{
    if from == to {
        return true;
    }

    let mut visited: AHashSet<&str> = AHashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(from);
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for (head, filter) in state.edges_from(current) {
            let head: &str = head;
            if visited.contains(head) || !admits(filter) {
                continue;
            }
            if head == to {
                return true;
            }
            visited.insert(head);
            queue.push_back(head);
        }
    }
    false
}
