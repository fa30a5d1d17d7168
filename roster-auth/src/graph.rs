// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-hierarchy inspection: cycle and dangling reference detection, dot rendering.
use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;
use petgraph::prelude::DiGraphMap;
use roster_store::{Slug, Unit, UnitId};
use serde::Serialize;

/// Structural problems found in one hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Slugs of the units forming each cycle, sorted.
    pub cycles: Vec<Vec<Slug>>,

    /// Units whose superior id does not exist.
    pub dangling: Vec<(Slug, UnitId)>,
}

impl AuditReport {
    pub fn is_healthy(&self) -> bool {
        self.cycles.is_empty() && self.dangling.is_empty()
    }
}

/// Superior to subordinate edges between units that exist.
fn superior_graph(units: &[Unit]) -> DiGraphMap<&UnitId, ()> {
    let mut graph = DiGraphMap::new();
    for unit in units {
        graph.add_node(&unit.id);
    }
    for unit in units {
        if let Some(superior_id) = &unit.superior_id {
            if graph.contains_node(superior_id) {
                graph.add_edge(superior_id, &unit.id, ());
            }
        }
    }
    graph
}

/// Inspect all units of one hierarchy.
pub fn audit(units: &[Unit]) -> AuditReport {
    let slugs: HashMap<&UnitId, &Slug> = units.iter().map(|unit| (&unit.id, &unit.slug)).collect();
    let graph = superior_graph(units);

    let mut cycles: Vec<Vec<Slug>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut cycle: Vec<Slug> = scc.into_iter().map(|id| slugs[id].clone()).collect();
            cycle.sort();
            cycle
        })
        .collect();
    cycles.sort();

    let mut dangling: Vec<(Slug, UnitId)> = units
        .iter()
        .filter_map(|unit| {
            let superior_id = unit.superior_id.as_ref()?;
            (!slugs.contains_key(superior_id)).then(|| (unit.slug.clone(), superior_id.clone()))
        })
        .collect();
    dangling.sort();

    AuditReport { cycles, dangling }
}

/// Render a hierarchy in graphviz dot format, edges point from superior to subordinate.
pub fn to_dot(units: &[Unit]) -> String {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let nodes: HashMap<&UnitId, _> = units
        .iter()
        .map(|unit| (&unit.id, graph.add_node(unit.slug.as_str())))
        .collect();

    for unit in units {
        let Some(superior_id) = &unit.superior_id else {
            continue;
        };
        if let Some(superior) = nodes.get(superior_id) {
            graph.add_edge(*superior, nodes[&unit.id], ());
        }
    }

    format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
}
