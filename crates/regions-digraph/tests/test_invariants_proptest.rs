// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Property-based checks of structural invariants under random operation sequences

use proptest::prelude::*;
use regions_digraph::{ModuleId, RegionDigraph, RegionError, RegionFilter};
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Create(u8),
    Remove(u8),
    Connect(u8, u8),
    Disconnect(u8, u8),
    Assign(u8, u16),
    Release(u8, u16),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6).prop_map(Op::Create),
        (0u8..6).prop_map(Op::Remove),
        (0u8..6, 0u8..6).prop_map(|(a, b)| Op::Connect(a, b)),
        (0u8..6, 0u8..6).prop_map(|(a, b)| Op::Disconnect(a, b)),
        (0u8..6, 0u16..8).prop_map(|(r, m)| Op::Assign(r, m)),
        (0u8..6, 0u16..8).prop_map(|(r, m)| Op::Release(r, m)),
    ]
}

fn name(i: u8) -> String {
    format!("r{}", i)
}

fn apply(digraph: &RegionDigraph, op: &Op) {
    let region = |i: u8| digraph.get_region(&name(i));
    // Errors are expected for many random operations; only invariants matter
    let _ = match op {
        Op::Create(i) => digraph.create_region(&name(*i)).map(|_| ()),
        Op::Remove(i) => match region(*i) {
            Some(r) => digraph.remove_region(&r).map(|_| ()),
            None => Ok(()),
        },
        Op::Connect(a, b) => match (region(*a), region(*b)) {
            (Some(a), Some(b)) => digraph.connect(&a, RegionFilter::unconstrained(), &b),
            _ => Ok(()),
        },
        Op::Disconnect(a, b) => match (region(*a), region(*b)) {
            (Some(a), Some(b)) => digraph.disconnect(&a, &b).map(|_| ()),
            _ => Ok(()),
        },
        Op::Assign(i, m) => match region(*i) {
            Some(r) => r.add_module(ModuleId(u64::from(*m))),
            None => Ok(()),
        },
        Op::Release(i, m) => match region(*i) {
            Some(r) => r.remove_module(ModuleId(u64::from(*m))).map(|_| ()),
            None => Ok(()),
        },
    };
}

fn check_invariants(digraph: &RegionDigraph) -> Result<(), TestCaseError> {
    let regions = digraph.get_regions();
    let names: HashSet<String> = regions.iter().map(|r| r.name().to_string()).collect();
    prop_assert_eq!(names.len(), regions.len());

    let mut owners: HashSet<ModuleId> = HashSet::new();
    for region in &regions {
        let mut heads = HashSet::new();
        for edge in digraph.get_edges(region) {
            prop_assert_ne!(edge.region(), region, "self loop");
            prop_assert!(names.contains(edge.region().name()), "dangling edge");
            prop_assert!(heads.insert(edge.region().clone()), "parallel edge");
        }
        for module in region.module_ids() {
            prop_assert!(owners.insert(module), "module in two regions");
            let owner = digraph.region_of(module);
            prop_assert_eq!(owner.as_ref(), Some(region));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_invariants_hold_after_any_sequence(ops in prop::collection::vec(op(), 1..60)) {
        let digraph = RegionDigraph::default();
        for op in &ops {
            apply(&digraph, op);
            check_invariants(&digraph)?;
        }
    }

    #[test]
    fn prop_failed_mutations_leave_no_trace(ops in prop::collection::vec(op(), 1..40)) {
        let digraph = RegionDigraph::default();
        for op in &ops {
            apply(&digraph, op);
        }
        let before = digraph.snapshot();
        let generation = digraph.generation();

        for region in digraph.get_regions() {
            let err = digraph.connect(&region, RegionFilter::unconstrained(), &region);
            prop_assert!(matches!(err, Err(RegionError::Graph(_))));
        }
        prop_assert_eq!(digraph.snapshot(), before);
        prop_assert_eq!(digraph.generation(), generation);
    }

    #[test]
    fn prop_copy_replace_round_trip(ops in prop::collection::vec(op(), 1..40), extra in prop::collection::vec(op(), 0..20)) {
        let digraph = RegionDigraph::default();
        for op in &ops {
            apply(&digraph, op);
        }

        let copy = digraph.copy();
        prop_assert_eq!(copy.snapshot(), digraph.snapshot());
        for op in &extra {
            apply(&copy, op);
        }
        let expected = copy.snapshot();

        digraph.replace(&copy).unwrap();
        prop_assert_eq!(digraph.snapshot(), expected);
        check_invariants(&digraph)?;
    }
}
