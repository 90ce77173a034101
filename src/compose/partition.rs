//! Splitting a network into independently solvable components.

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;

use crate::network::{Stn, TimePoint};

/// Splits `stn` into its connected components.
///
/// Two points share a component when a chain of constraints links them
/// without passing through the origin. The origin is copied into every
/// component together with the constraints touching it, so each component
/// keeps its absolute bounds. Solving the components separately yields the
/// same bounds (and the same verdict) as solving `stn` whole.
///
/// Components come out ordered by their first point's creation order. A
/// network with no point besides the origin yields a single component.
pub fn partition(stn: &Stn) -> Vec<Stn> {
    let n = stn.point_count();
    let mut sets = UnionFind::<usize>::new(n);
    for (from, to, _) in stn.edges() {
        if from != TimePoint::ORIGIN && to != TimePoint::ORIGIN {
            sets.union(from.index(), to.index());
        }
    }
    let labels = sets.into_labeling();

    let mut component_of: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Stn> = Vec::new();
    for (index, id) in stn.points().enumerate().skip(1) {
        let slot = *component_of.entry(labels[index]).or_insert_with(|| {
            components.push(stn.empty_like());
            components.len() - 1
        });
        components[slot].ensure_point(id);
    }
    if components.is_empty() {
        components.push(stn.empty_like());
    }

    for (from, to, bounds) in stn.edges() {
        let anchor = if from == TimePoint::ORIGIN { to } else { from };
        if anchor == TimePoint::ORIGIN {
            // Origin self-loops constrain every component.
            for component in &mut components {
                component.insert_edge(TimePoint::ORIGIN, TimePoint::ORIGIN, bounds);
            }
            continue;
        }
        let (Some(from_id), Some(to_id)) = (stn.name_of(from), stn.name_of(to)) else {
            continue;
        };
        if let Some(&slot) = component_of.get(&labels[anchor.index()]) {
            let target = &mut components[slot];
            let (f, t) = (target.ensure_point(from_id), target.ensure_point(to_id));
            target.insert_edge(f, t, bounds);
        }
    }

    tracing::debug!(
        network = %stn.id(),
        components = components.len(),
        "network partitioned"
    );
    components
}
