#![allow(dead_code)]

use std::path::PathBuf;

use stadium_nav_lib::{load_topology, Graph, GraphBuilder, HazardMap, TopologySnapshot};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

pub fn fixture_snapshot() -> TopologySnapshot {
    load_topology(&fixtures_dir().join("stadium_topology.json")).expect("fixture loads")
}

/// Fixture graph plus a hazard map with the snapshot closures replayed.
pub fn fixture_venue() -> (Graph, HazardMap) {
    let snapshot = fixture_snapshot();
    let graph = snapshot.build_graph().expect("fixture graph builds");
    let mut hazards = HazardMap::new();
    for (from, to) in snapshot.closure_pairs(&graph) {
        hazards.add_closure(&from, &to);
    }
    (graph, hazards)
}

/// A-B-C-D-A, every corridor 10 m.
pub fn square() -> Graph {
    GraphBuilder::new()
        .node("A", 0.0, 0.0, 0)
        .node("B", 10.0, 0.0, 0)
        .node("C", 10.0, 10.0, 0)
        .node("D", 0.0, 10.0, 0)
        .corridor("A", "B", 10.0)
        .corridor("B", "C", 10.0)
        .corridor("C", "D", 10.0)
        .corridor("D", "A", 10.0)
        .build()
        .expect("square builds")
}
