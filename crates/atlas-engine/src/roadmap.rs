//! Roadmap builder: orders remediation work into dependency-honoring phases.
//!
//! Topological layering over the control dependency graph:
//! `phase(item) = 1 + max(phase(dep))`, or 1 with no dependencies. The
//! builder runs single-threaded over the complete item set; it needs the
//! whole graph before assigning any phase.
//!
//! A cycle anywhere aborts the whole roadmap with
//! [`CyclicDependencyError`] naming the controls on cyclic paths; no
//! partial phase assignment ever escapes. Dependencies on controls that are
//! not part of the roadmap (nothing planned for them) are treated as
//! already satisfied.
//!
//! With a per-phase budget cap configured, an item that would overflow a
//! phase's spend is deferred to the next phase, in the same relative order,
//! never dropped. Deferral re-propagates: dependents keep strictly later
//! phases. An item whose own cost exceeds the cap takes a phase by itself.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::ControlId;
use crate::error::CyclicDependencyError;
use crate::financial::value_order;

/// One scheduled remediation. `phase` starts at 1 and strictly exceeds the
/// phase of every listed dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub control: ControlId,
    pub phase: u32,
    /// Scheduled controls that must complete in an earlier phase.
    pub dependencies: BTreeSet<ControlId>,
    pub effort_days: u32,
}

/// Scheduling input for one control, assembled by the pipeline from the
/// catalog entry and the control's risk/financial records.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadmapInput {
    pub control: ControlId,
    pub dependencies: BTreeSet<ControlId>,
    pub effort_days: u32,
    pub risk_reduction: f64,
    pub cost: f64,
}

/// Assign phases to all items, honoring dependencies and the optional
/// per-phase budget cap.
///
/// The result is sorted by phase, then descending risk reduction, then
/// ascending cost, then ascending control id: a deterministic total order,
/// idempotent across runs.
pub fn build(
    inputs: &[RoadmapInput],
    budget_cap: Option<f64>,
) -> Result<Vec<RoadmapItem>, CyclicDependencyError> {
    if inputs.is_empty() {
        return Ok(Vec::new());
    }

    let scheduled: BTreeSet<&ControlId> = inputs.iter().map(|i| &i.control).collect();

    // Dependencies restricted to scheduled controls; everything else is
    // already satisfied.
    let deps: BTreeMap<&ControlId, BTreeSet<&ControlId>> = inputs
        .iter()
        .map(|i| {
            let d: BTreeSet<&ControlId> = i
                .dependencies
                .iter()
                .filter(|d| scheduled.contains(*d))
                .collect();
            (&i.control, d)
        })
        .collect();

    let layers = layer_by_dependency(&deps)?;

    // Global walk order: layer-major so every dependency is placed before
    // its dependents, value order within a layer.
    let mut ordered: Vec<&RoadmapInput> = inputs.iter().collect();
    ordered.sort_by(|a, b| {
        layers[&a.control].cmp(&layers[&b.control]).then_with(|| {
            value_order(
                a.risk_reduction,
                a.cost,
                &a.control,
                b.risk_reduction,
                b.cost,
                &b.control,
            )
        })
    });

    let mut phase_of: BTreeMap<&ControlId, u32> = BTreeMap::new();
    let mut spent: BTreeMap<u32, f64> = BTreeMap::new();
    for input in &ordered {
        let dep_floor = deps[&input.control]
            .iter()
            .map(|d| phase_of[d] + 1)
            .max()
            .unwrap_or(1);
        let mut phase = dep_floor.max(layers[&input.control]);
        if let Some(cap) = budget_cap {
            // Defer past phases whose spend the item would overflow. A
            // phase with no spend always accepts the item, so an item
            // larger than the cap ends up in a phase of its own.
            loop {
                let current = spent.get(&phase).copied().unwrap_or(0.0);
                if current > 0.0 && current + input.cost > cap {
                    phase += 1;
                    continue;
                }
                break;
            }
            if phase > dep_floor.max(layers[&input.control]) {
                debug!(control = %input.control, phase, "deferred by per-phase budget cap");
            }
        }
        *spent.entry(phase).or_insert(0.0) += input.cost;
        phase_of.insert(&input.control, phase);
    }

    let mut items: Vec<RoadmapItem> = ordered
        .iter()
        .map(|input| RoadmapItem {
            control: input.control.clone(),
            phase: phase_of[&input.control],
            dependencies: deps[&input.control]
                .iter()
                .map(|d| (*d).clone())
                .collect(),
            effort_days: input.effort_days,
        })
        .collect();

    let value_key: BTreeMap<&ControlId, (f64, f64)> = inputs
        .iter()
        .map(|i| (&i.control, (i.risk_reduction, i.cost)))
        .collect();
    items.sort_by(|a, b| {
        let (red_a, cost_a) = value_key[&a.control];
        let (red_b, cost_b) = value_key[&b.control];
        a.phase
            .cmp(&b.phase)
            .then_with(|| value_order(red_a, cost_a, &a.control, red_b, cost_b, &b.control))
    });

    Ok(items)
}

/// Kahn layering. Errors with the cyclic subset when the graph has a cycle.
fn layer_by_dependency<'a>(
    deps: &BTreeMap<&'a ControlId, BTreeSet<&'a ControlId>>,
) -> Result<BTreeMap<&'a ControlId, u32>, CyclicDependencyError> {
    let mut dependents: BTreeMap<&ControlId, Vec<&ControlId>> = BTreeMap::new();
    let mut indegree: BTreeMap<&ControlId, usize> = BTreeMap::new();
    for (&id, d) in deps {
        indegree.insert(id, d.len());
        for &dep in d {
            dependents.entry(dep).or_default().push(id);
        }
    }

    let mut ready: BTreeSet<&ControlId> = indegree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut layers: BTreeMap<&ControlId, u32> = BTreeMap::new();

    while let Some(id) = ready.pop_first() {
        let layer = deps[id].iter().map(|d| layers[d]).max().unwrap_or(0) + 1;
        layers.insert(id, layer);
        if let Some(next) = dependents.get(id) {
            for &dependent in next {
                if let Some(deg) = indegree.get_mut(dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }
    }

    if layers.len() == deps.len() {
        return Ok(layers);
    }

    // Everything Kahn could not place is either on a cycle or downstream of
    // one. Peeling sinks from that remainder leaves exactly the cyclic
    // members.
    let mut remaining: BTreeSet<&ControlId> = deps
        .keys()
        .filter(|id| !layers.contains_key(*id))
        .copied()
        .collect();
    loop {
        let sinks: Vec<&ControlId> = remaining
            .iter()
            .filter(|id| {
                !dependents
                    .get(**id)
                    .is_some_and(|ds| ds.iter().any(|d| remaining.contains(*d)))
            })
            .copied()
            .collect();
        if sinks.is_empty() {
            break;
        }
        for sink in sinks {
            remaining.remove(sink);
        }
    }

    Err(CyclicDependencyError {
        members: remaining.into_iter().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str, deps: &[&str], reduction: f64, cost: f64) -> RoadmapInput {
        RoadmapInput {
            control: ControlId::new(id),
            dependencies: deps.iter().copied().map(ControlId::new).collect(),
            effort_days: 10,
            risk_reduction: reduction,
            cost,
        }
    }

    fn phases(items: &[RoadmapItem]) -> BTreeMap<&str, u32> {
        items.iter().map(|i| (i.control.as_str(), i.phase)).collect()
    }

    #[test]
    fn empty_input_yields_empty_roadmap() {
        assert_eq!(build(&[], None).unwrap(), Vec::new());
    }

    #[test]
    fn independent_items_share_phase_one() {
        let items = build(
            &[input("A.1", &[], 0.5, 1_000.0), input("A.2", &[], 0.9, 500.0)],
            None,
        )
        .unwrap();
        assert!(items.iter().all(|i| i.phase == 1));
        // Within-phase order: descending risk reduction.
        assert_eq!(items[0].control.as_str(), "A.2");
    }

    #[test]
    fn chain_layers_strictly_increase() {
        let items = build(
            &[
                input("A.3", &["A.2"], 0.5, 1_000.0),
                input("A.2", &["A.1"], 0.5, 1_000.0),
                input("A.1", &[], 0.5, 1_000.0),
            ],
            None,
        )
        .unwrap();
        let p = phases(&items);
        assert_eq!(p["A.1"], 1);
        assert_eq!(p["A.2"], 2);
        assert_eq!(p["A.3"], 3);
        for item in &items {
            for dep in &item.dependencies {
                assert!(item.phase > p[dep.as_str()]);
            }
        }
    }

    #[test]
    fn unscheduled_dependency_is_satisfied() {
        let items = build(&[input("A.2", &["A.1"], 0.5, 1_000.0)], None).unwrap();
        assert_eq!(items[0].phase, 1);
        assert!(items[0].dependencies.is_empty());
    }

    #[test]
    fn two_node_cycle_is_detected() {
        let err = build(
            &[
                input("A.1", &["A.2"], 0.5, 1_000.0),
                input("A.2", &["A.1"], 0.5, 1_000.0),
            ],
            None,
        )
        .unwrap_err();
        let members: Vec<&str> = err.members.iter().map(ControlId::as_str).collect();
        assert_eq!(members, ["A.1", "A.2"]);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = build(&[input("A.1", &["A.1"], 0.5, 1_000.0)], None).unwrap_err();
        let members: Vec<&str> = err.members.iter().map(ControlId::as_str).collect();
        assert_eq!(members, ["A.1"]);
    }

    #[test]
    fn cycle_members_exclude_downstream_nodes() {
        let err = build(
            &[
                input("A.1", &["A.2"], 0.5, 1_000.0),
                input("A.2", &["A.1"], 0.5, 1_000.0),
                input("A.3", &["A.2"], 0.5, 1_000.0),
                input("A.4", &[], 0.5, 1_000.0),
            ],
            None,
        )
        .unwrap_err();
        let members: Vec<&str> = err.members.iter().map(ControlId::as_str).collect();
        assert_eq!(members, ["A.1", "A.2"]);
    }

    #[test]
    fn build_is_idempotent() {
        let inputs = [
            input("A.1", &[], 0.8, 10_000.0),
            input("A.2", &["A.1"], 0.6, 5_000.0),
            input("A.3", &["A.1"], 0.6, 4_000.0),
            input("A.4", &["A.2", "A.3"], 0.3, 2_000.0),
        ];
        let first = build(&inputs, Some(12_000.0)).unwrap();
        let second = build(&inputs, Some(12_000.0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn within_phase_tie_breaks_by_cost_then_id() {
        let items = build(
            &[
                input("A.3", &[], 0.5, 2_000.0),
                input("A.2", &[], 0.5, 1_000.0),
                input("A.1", &[], 0.5, 2_000.0),
            ],
            None,
        )
        .unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.control.as_str()).collect();
        assert_eq!(ids, ["A.2", "A.1", "A.3"]);
    }

    #[test]
    fn budget_cap_defers_overflow_to_next_phase() {
        let items = build(
            &[
                input("A.1", &[], 0.9, 8_000.0),
                input("A.2", &[], 0.8, 5_000.0),
                input("A.3", &[], 0.7, 2_000.0),
            ],
            Some(10_000.0),
        )
        .unwrap();
        let p = phases(&items);
        assert_eq!(p["A.1"], 1);
        assert_eq!(p["A.2"], 2); // 8k + 5k would overflow the 10k cap
        assert_eq!(p["A.3"], 1); // still fits alongside A.1
    }

    #[test]
    fn oversized_item_occupies_a_phase_alone() {
        let items = build(
            &[
                input("A.1", &[], 0.9, 4_000.0),
                input("A.2", &[], 0.8, 50_000.0),
                input("A.3", &[], 0.7, 4_000.0),
            ],
            Some(10_000.0),
        )
        .unwrap();
        let p = phases(&items);
        assert_eq!(p["A.1"], 1);
        assert_eq!(p["A.2"], 2);
        assert_eq!(p["A.3"], 1);
    }

    #[test]
    fn deferral_propagates_to_dependents() {
        // A.2 is deferred past phase 1 by budget; A.3 depends on it and must
        // land strictly later than A.2's final phase.
        let items = build(
            &[
                input("A.1", &[], 0.9, 9_000.0),
                input("A.2", &[], 0.8, 9_000.0),
                input("A.3", &["A.2"], 0.7, 1_000.0),
            ],
            Some(10_000.0),
        )
        .unwrap();
        let p = phases(&items);
        assert_eq!(p["A.1"], 1);
        assert_eq!(p["A.2"], 2);
        assert_eq!(p["A.3"], 3);
    }
}
