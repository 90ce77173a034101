//! Test suite for composition, partitioning and batch solving.

use super::*;
use crate::config::PoolConfig;
use crate::interval::TimeSpec;
use crate::network::SolveState;
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Four-point chain `{prefix}.p0 .. {prefix}.p3` anchored to the origin.
fn chain(prefix: &str) -> Stn {
    let mut stn = Stn::new();
    let ids: Vec<String> = (0..4).map(|i| format!("{prefix}.p{i}")).collect();
    for id in &ids {
        stn.add_time_point(id.as_str()).unwrap();
    }
    stn.add_constraint(Stn::ORIGIN, &ids[0], 0, 10).unwrap();
    for pair in ids.windows(2) {
        stn.add_constraint(&pair[0], &pair[1], 1, 5).unwrap();
    }
    stn
}

/// Network whose only point is pinned to two disjoint windows.
fn contradictory(id: &str) -> Stn {
    let mut stn = Stn::new();
    stn.add_time_point(id).unwrap();
    stn.add_constraint(Stn::ORIGIN, id, 0, 5).unwrap();
    stn.add_constraint(Stn::ORIGIN, id, 10, 20).unwrap();
    stn
}

/// Solved bounds between every pair of points, keyed by id.
fn bounds_by_id(stn: &Stn) -> BTreeMap<(String, String), Bounds> {
    let ids: Vec<&str> = stn.points().collect();
    let mut out = BTreeMap::new();
    for from in &ids {
        for to in &ids {
            out.insert(
                (from.to_string(), to.to_string()),
                stn.bounds(from, to).unwrap(),
            );
        }
    }
    out
}

fn workers(n: usize) -> PoolConfig {
    PoolConfig::default().with_workers(NonZeroUsize::new(n).unwrap())
}

#[cfg(test)]
mod merging {
    use super::*;
    use crate::time::Epoch;

    #[test]
    fn test_union_unifies_shared_ids() {
        let mut a = Stn::new();
        a.add_time_point("x").unwrap();
        a.add_time_point("y").unwrap();
        a.add_constraint(Stn::ORIGIN, "x", 0, 10).unwrap();
        a.add_constraint("x", "y", 5, 5).unwrap();

        let mut b = Stn::new();
        b.add_time_point("y").unwrap();
        b.add_time_point("z").unwrap();
        b.add_constraint(Stn::ORIGIN, "y", 8, 20).unwrap();
        b.add_constraint("y", "z", 1, 1).unwrap();

        let merged = union(&a, &b).unwrap();
        assert_eq!(merged.point_count(), 4);
        assert_eq!(merged.state(), SolveState::Solved);
        assert_eq!(merged.window("x").unwrap(), Bounds::new(3, 10).unwrap());
        assert_eq!(merged.window("z").unwrap(), Bounds::new(9, 16).unwrap());
        assert_ne!(merged.id(), a.id());
        assert_ne!(merged.id(), b.id());
    }

    #[test]
    fn test_union_of_disjoint_networks_keeps_their_bounds() {
        let (mut a, mut b) = (chain("a"), chain("b"));
        let merged = union(&a, &b).unwrap();
        a.solve().unwrap();
        b.solve().unwrap();

        assert_eq!(merged.point_count(), 9);
        assert_eq!(merged.window("a.p3").unwrap(), a.window("a.p3").unwrap());
        assert_eq!(merged.window("b.p2").unwrap(), b.window("b.p2").unwrap());
    }

    #[test]
    fn test_failed_union_leaves_inputs_untouched() {
        let mut a = Stn::new();
        a.add_time_point("p").unwrap();
        a.add_constraint(Stn::ORIGIN, "p", 0, 5).unwrap();
        let mut b = Stn::new();
        b.add_time_point("p").unwrap();
        b.add_constraint(Stn::ORIGIN, "p", 10, 20).unwrap();

        assert!(matches!(union(&a, &b), Err(StnError::Inconsistent(_))));
        assert_eq!(a.state(), SolveState::Unsolved);
        assert_eq!(a.constraint_count(), 1);
        assert!(a.is_consistent());
        assert!(b.is_consistent());
    }

    #[test]
    fn test_epoch_mismatch() {
        let a = Stn::with_epoch(Epoch::parse("2024-01-01T00:00:00Z").unwrap());
        let b = Stn::with_epoch(Epoch::parse("2024-01-02T00:00:00Z").unwrap());
        assert_eq!(union(&a, &b).unwrap_err(), StnError::EpochMismatch);
        assert_eq!(compose(&a, &b, &[]).unwrap_err(), StnError::EpochMismatch);

        let merged = union(&a, &Stn::new()).unwrap();
        assert_eq!(merged.epoch(), a.epoch());
    }

    #[test]
    fn test_compose_through_bridge() {
        let mut first = Stn::new();
        first.add_fixed_interval("a", 0, 10).unwrap();
        let mut second = Stn::new();
        second
            .add_interval("b", TimeSpec::Open, TimeSpec::duration(5.0))
            .unwrap();

        let chained = compose(&first, &second, &[Bridge::sequence("a.end", "b.start")]).unwrap();
        assert_eq!(chained.earliest("b.start").unwrap(), 10);
        assert_eq!(chained.earliest("b.end").unwrap(), 5_010);
    }

    #[test]
    fn test_compose_rejects_shared_ids() {
        let (a, b) = (chain("x"), chain("x"));
        assert_eq!(
            compose(&a, &b, &[]).unwrap_err(),
            StnError::IdCollision("x.p0".to_string())
        );
    }

    #[test]
    fn test_compose_checks_bridge_sides() {
        let (a, b) = (chain("a"), chain("b"));
        let backwards = Bridge::sequence("b.p3", "a.p0");
        assert_eq!(
            compose(&a, &b, &[backwards]).unwrap_err(),
            StnError::UnknownPoint("b.p3".to_string())
        );
        assert_eq!(
            Bridge::new("a.p3", "b.p0", 5, 1).unwrap_err(),
            StnError::InvalidBounds { lower: 5, upper: 1 }
        );
    }

    #[test]
    fn test_compose_is_associative() {
        let (x, y, z) = (chain("x"), chain("y"), chain("z"));
        let xy = Bridge::new("x.p3", "y.p0", 2, 4).unwrap();
        let yz = Bridge::new("y.p3", "z.p0", 0, 3).unwrap();

        let left = compose(&compose(&x, &y, &[xy.clone()]).unwrap(), &z, &[yz.clone()]).unwrap();
        let right = compose(&x, &compose(&y, &z, &[yz]).unwrap(), &[xy]).unwrap();
        assert_eq!(bounds_by_id(&left), bounds_by_id(&right));
    }

    #[test]
    fn test_bridged_networks_conflict() {
        let mut first = Stn::new();
        first.add_fixed_interval("a", 0, 10).unwrap();
        let mut second = Stn::new();
        second.add_fixed_interval("b", 0, 5).unwrap();

        let result = compose(&first, &second, &[Bridge::sequence("a.end", "b.start")]);
        assert!(matches!(result, Err(StnError::Inconsistent(_))));
    }
}

#[cfg(test)]
mod partitioning {
    use super::*;

    #[test]
    fn test_independent_clusters_split() {
        let whole = union(&union(&chain("a"), &chain("b")).unwrap(), &chain("c")).unwrap();
        let parts = partition(&whole);
        assert_eq!(parts.len(), 3);
        for part in &parts {
            assert_eq!(part.point_count(), 5);
            assert_eq!(part.constraint_count(), 4);
        }
        assert!(parts[0].contains("a.p0"));
        assert!(parts[2].contains("c.p3"));
    }

    #[test]
    fn test_origin_only_network_is_one_component() {
        let parts = partition(&Stn::new());
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].point_count(), 1);
    }

    /// `(origin offset, [(min step, extra slack); 4])` per cluster.
    type Cluster = (Tick, Vec<(Tick, Tick)>);

    fn clustered(clusters: &[Cluster]) -> Stn {
        let mut whole = Stn::new();
        for (c, (base, steps)) in clusters.iter().enumerate() {
            let ids: Vec<String> = (0..=steps.len()).map(|i| format!("c{c}.p{i}")).collect();
            for id in &ids {
                whole.add_time_point(id.as_str()).unwrap();
            }
            whole.add_constraint(Stn::ORIGIN, &ids[0], *base, base + 100).unwrap();
            for (pair, (lo, extra)) in ids.windows(2).zip(steps) {
                whole.add_constraint(&pair[0], &pair[1], *lo, lo + extra).unwrap();
            }
        }
        whole
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn component_bounds_match_whole_network(
            clusters in vec((0..1_000 as Tick, vec((0..50 as Tick, 0..50 as Tick), 4)), 1..5),
        ) {
            let mut whole = clustered(&clusters);
            let mut parts = partition(&whole);
            prop_assert_eq!(parts.len(), clusters.len());
            whole.solve().unwrap();
            for part in &mut parts {
                part.solve().unwrap();
                for ((from, to), bounds) in bounds_by_id(part) {
                    let expected = whole.bounds(&from, &to).unwrap();
                    prop_assert_eq!(expected, bounds, "{} -> {}", from, to);
                }
            }
        }
    }

    #[test]
    fn test_inconsistent_component_is_isolated() {
        let whole = {
            let mut stn = Stn::from_edge_list(chain("a").edge_list()).unwrap();
            let bad = contradictory("bad");
            let list = bad.edge_list();
            stn.add_time_point("bad").unwrap();
            for c in list.constraints {
                stn.add_bounds(&c.from, &c.to, c.bounds).unwrap();
            }
            stn
        };
        let mut parts = partition(&whole);
        assert_eq!(parts.len(), 2);
        assert!(parts[0].is_consistent());
        assert!(!parts[1].is_consistent());
    }
}

#[cfg(test)]
mod batching {
    use super::*;

    fn disjoint_chains(count: usize) -> Vec<Stn> {
        (0..count).map(|i| chain(&format!("n{i}"))).collect()
    }

    #[test]
    fn test_pool_size_does_not_change_results() {
        let serial = solve_batch(disjoint_chains(100), &workers(1)).unwrap();
        let parallel = solve_batch(disjoint_chains(100), &workers(8)).unwrap();

        assert_eq!(serial.len(), 100);
        assert!(serial.all_ok());
        assert!(parallel.all_ok());
        for (i, (s, p)) in serial.networks().zip(parallel.networks()).enumerate() {
            let last = format!("n{i}.p3");
            assert_eq!(s.window(&last).unwrap(), p.window(&last).unwrap());
            assert_eq!(s.window(&last).unwrap(), Bounds::new(3, 25).unwrap());
        }
    }

    #[test]
    fn test_shared_point_is_rejected() {
        let networks = vec![chain("a"), chain("b"), chain("a")];
        assert_eq!(
            solve_batch(networks, &workers(2)).unwrap_err(),
            BatchError::SharedPoint("a.p0".to_string())
        );
    }

    #[test]
    fn test_failures_are_isolated() {
        let networks = vec![chain("a"), contradictory("bad"), chain("c")];
        let report = solve_batch(networks, &workers(3)).unwrap();

        assert!(!report.all_ok());
        let failures: Vec<_> = report.failures().map(|(i, _)| i).collect();
        assert_eq!(failures, [1]);
        let states: Vec<_> = report.networks().map(Stn::state).collect();
        assert_eq!(
            states,
            [SolveState::Solved, SolveState::Inconsistent, SolveState::Solved]
        );

        assert_eq!(report.lost().count(), 0);

        match report.into_all_or_nothing() {
            Err(BatchError::Solve {
                index: 1,
                source: StnError::Inconsistent(_),
            }) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_all_or_nothing_success() {
        let report = solve_batch(disjoint_chains(5), &workers(2)).unwrap();
        let solved = report.into_all_or_nothing().unwrap();
        assert_eq!(solved.len(), 5);
        assert!(solved.iter().all(|s| s.state() == SolveState::Solved));
    }

    #[test]
    fn test_expired_deadline_times_out_every_network() {
        let config = workers(2).with_deadline(Duration::ZERO);
        let report = solve_batch(disjoint_chains(4), &config).unwrap();
        assert_eq!(report.failures().count(), 4);
        assert!(report
            .results()
            .all(|r| matches!(r, Err(StnError::Timeout { .. }))));
    }

    #[test]
    fn test_empty_batch() {
        let report = solve_batch(Vec::new(), &workers(4)).unwrap();
        assert!(report.is_empty());
        assert!(report.all_ok());
    }

    #[test]
    fn test_solve_partitioned() {
        let whole = union(&chain("a"), &chain("b")).unwrap();
        let report = solve_partitioned(&whole, &PoolConfig::default()).unwrap();
        assert_eq!(report.len(), 2);
        assert!(report.all_ok());

        let entries = report.into_entries();
        let Some(second) = entries[1].network() else {
            panic!("component 1 was lost");
        };
        assert_eq!(second.window("b.p3").unwrap(), whole.window("b.p3").unwrap());
    }
}
