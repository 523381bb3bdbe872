// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Depth-first traversal of the subgraph reachable from a region.

use ahash::AHashSet;
use std::sync::Arc;

use super::{DigraphState, RegionDigraph};
use crate::filter::RegionFilter;
use crate::region::Region;

/// Callbacks for [`RegionDigraph::visit_subgraph`]
pub trait RegionDigraphVisitor {
    /// Visit a region; return `false` to stop descending from it
    fn visit(&mut self, region: &Region) -> bool;

    /// Called before following an edge; return `false` to skip it
    fn pre_edge_traverse(&mut self, _filter: &RegionFilter) -> bool {
        true
    }

    /// Called after the subgraph behind a followed edge has been visited
    fn post_edge_traverse(&mut self, _filter: &RegionFilter) {}
}

impl RegionDigraph {
    /// Visit `start` and every region reachable from it, depth first
    ///
    /// The traversal runs over one snapshot of the state and visits each region
    /// at most once. Nothing is visited if `start` is absent or belongs to
    /// another digraph.
    pub fn visit_subgraph(&self, start: &Region, visitor: &mut dyn RegionDigraphVisitor) {
        if start.digraph_id() != self.inner.id {
            return;
        }
        let published = self.load();
        let state = &published.state;
        let start = match state.region_name(start.name()) {
            Some(name) => name.clone(),
            None => return,
        };

        let mut visited = AHashSet::new();
        self.visit_region(state, start, visitor, &mut visited);
    }

    fn visit_region(
        &self,
        state: &DigraphState,
        name: Arc<str>,
        visitor: &mut dyn RegionDigraphVisitor,
        visited: &mut AHashSet<Arc<str>>,
    ) {
        if !visited.insert(name.clone()) {
            return;
        }
        if !visitor.visit(&self.handle(&name)) {
            return;
        }
        for (head, filter) in state.edges_from(&name) {
            if visitor.pre_edge_traverse(filter) {
                self.visit_region(state, head.clone(), visitor, visited);
                visitor.post_edge_traverse(filter);
            }
        }
    }
}
