mod common;

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stadium_nav_lib::path::step_cost;
use stadium_nav_lib::{
    find_path, path_cost, Graph, GraphBuilder, HazardKind, HazardMap, NodeId, PathOptions,
};

use common::square;

/// Random multi-level venue whose corridor weights never undercut the
/// straight-line distance plus the per-floor cost.
fn random_venue(seed: u64) -> (Graph, Vec<NodeId>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let count = rng.gen_range(6..14);
    let mut builder = GraphBuilder::new();
    let mut points = Vec::with_capacity(count);

    for index in 0..count {
        let id = format!("R{index}");
        let x = rng.gen_range(0.0..100.0);
        let y = rng.gen_range(0.0..100.0);
        let level: i32 = rng.gen_range(0..3);
        builder = builder.node(&id, x, y, level);
        points.push((id, x, y, level));
    }

    for i in 0..count {
        for j in (i + 1)..count {
            if !rng.gen_bool(0.35) {
                continue;
            }
            let (a, ax, ay, al) = &points[i];
            let (b, bx, by, bl) = &points[j];
            let floor = (ax - bx).hypot(ay - by) + 5.0 * f64::from((al - bl).abs());
            let weight = floor + rng.gen_range(0.0..10.0);
            builder = builder.corridor(a, b, weight);
        }
    }

    let ids = points.into_iter().map(|(id, ..)| id).collect();
    (builder.build().expect("random venue builds"), ids)
}

/// Exhaustive Dijkstra without a priority queue.
fn brute_force_cost(
    graph: &Graph,
    hazards: &HazardMap,
    start: &str,
    goal: &str,
    options: PathOptions,
) -> Option<f64> {
    let mut dist: HashMap<String, f64> = HashMap::new();
    let mut done: HashSet<String> = HashSet::new();
    dist.insert(start.to_string(), 0.0);

    loop {
        let (current, distance) = dist
            .iter()
            .filter(|(id, _)| !done.contains(*id))
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(id, d)| (id.clone(), *d))?;
        if current == goal {
            return Some(distance);
        }
        done.insert(current.clone());

        for edge in graph.neighbors(&current) {
            if let Some(step) = step_cost(hazards, &current, &edge.target, edge.weight, options) {
                let entry = dist.entry(edge.target.clone()).or_insert(f64::INFINITY);
                if distance + step < *entry {
                    *entry = distance + step;
                }
            }
        }
    }
}

fn assert_costs_match(found: Option<f64>, expected: Option<f64>, context: &str) {
    match (found, expected) {
        (Some(found), Some(expected)) => {
            assert!((found - expected).abs() < 1e-6, "{context}: {found} vs {expected}")
        }
        (None, None) => {}
        other => panic!("{context}: reachability differs {other:?}"),
    }
}

#[test]
fn square_route_without_hazards() {
    let path = find_path(&square(), &HazardMap::new(), "A", "C", PathOptions::default())
        .expect("route exists");
    assert_eq!(path.cost, 20.0);
    assert!(path.nodes == ["A", "B", "C"] || path.nodes == ["A", "D", "C"]);
}

#[test]
fn closed_corridor_forces_detour() {
    let graph = square();
    let mut hazards = HazardMap::new();
    hazards.add_closure("B", "C");

    let path = find_path(&graph, &hazards, "A", "C", PathOptions::default()).expect("detour");
    assert_eq!(path.nodes, vec!["A", "D", "C"]);
    assert_eq!(path.cost, 20.0);

    // The square still connects B and C the long way round.
    let around = find_path(&graph, &hazards, "B", "C", PathOptions::default()).expect("detour");
    assert_eq!(around.nodes, vec!["B", "A", "D", "C"]);
    assert_eq!(around.cost, 30.0);
}

#[test]
fn closing_the_only_corridor_isolates_the_goal() {
    let graph = GraphBuilder::new()
        .node("A", 0.0, 0.0, 0)
        .node("B", 10.0, 0.0, 0)
        .node("C", 20.0, 0.0, 0)
        .corridor("A", "B", 10.0)
        .corridor("B", "C", 10.0)
        .build()
        .unwrap();
    let mut hazards = HazardMap::new();
    hazards.add_closure("C", "B");

    assert!(find_path(&graph, &hazards, "B", "C", PathOptions::default()).is_none());
    assert!(find_path(&graph, &hazards, "A", "C", PathOptions::default()).is_none());

    hazards.remove_closure("B", "C");
    let path = find_path(&graph, &hazards, "A", "C", PathOptions::default()).expect("reopened");
    assert_eq!(path.cost, 20.0);
}

#[test]
fn smoke_adds_its_penalty_when_avoiding_crowds() {
    let graph = GraphBuilder::new()
        .node("S", 0.0, 0.0, 0)
        .node("N5", 10.0, 5.0, 0)
        .node("M", 10.0, -5.0, 0)
        .node("T", 20.0, 0.0, 0)
        .corridor("S", "N5", 12.0)
        .corridor("N5", "T", 12.0)
        .corridor("S", "M", 12.0)
        .corridor("M", "T", 12.0)
        .build()
        .unwrap();
    let mut hazards = HazardMap::new();
    hazards.set_node_hazard("N5", HazardKind::Smoke, 1.0);

    let through_smoke = vec!["S".to_string(), "N5".to_string(), "T".to_string()];
    let clear = vec!["S".to_string(), "M".to_string(), "T".to_string()];
    let options = PathOptions::avoiding_crowds();

    let smoky = path_cost(&graph, &hazards, &through_smoke, options).unwrap();
    let alternative = path_cost(&graph, &hazards, &clear, options).unwrap();
    assert_eq!(smoky - alternative, 5.0);

    let chosen = find_path(&graph, &hazards, "S", "T", options).unwrap();
    assert_eq!(chosen.nodes, clear);

    // Smoke is only charged when crowds are being avoided.
    assert_eq!(
        path_cost(&graph, &hazards, &through_smoke, PathOptions::default()),
        Some(24.0)
    );
}

#[test]
fn fire_is_charged_even_without_crowd_avoidance() {
    let graph = GraphBuilder::new()
        .node("S", 0.0, 0.0, 0)
        .node("F", 10.0, 0.0, 0)
        .node("M", 10.0, 4.0, 0)
        .node("T", 20.0, 0.0, 0)
        .corridor("S", "F", 10.0)
        .corridor("F", "T", 10.0)
        .corridor("S", "M", 12.0)
        .corridor("M", "T", 12.0)
        .build()
        .unwrap();
    let mut hazards = HazardMap::new();

    let direct = find_path(&graph, &hazards, "S", "T", PathOptions::default()).unwrap();
    assert_eq!(direct.nodes, vec!["S", "F", "T"]);

    hazards.set_node_hazard("F", HazardKind::Fire, 1.0);
    let rerouted = find_path(&graph, &hazards, "S", "T", PathOptions::default()).unwrap();
    assert_eq!(rerouted.nodes, vec!["S", "M", "T"]);
    assert_eq!(rerouted.cost, 24.0);
}

#[test]
fn astar_matches_exhaustive_search_on_random_venues() {
    for seed in 0..40 {
        let (graph, ids) = random_venue(seed);
        let hazards = HazardMap::new();
        for start in ids.iter().take(4) {
            for goal in &ids {
                let found = find_path(&graph, &hazards, start, goal, PathOptions::default())
                    .map(|path| path.cost);
                let expected =
                    brute_force_cost(&graph, &hazards, start, goal, PathOptions::default());
                assert_costs_match(found, expected, &format!("seed {seed} {start}->{goal}"));
            }
        }
    }
}

#[test]
fn astar_stays_optimal_with_hazards_applied() {
    for seed in 100..120 {
        let (graph, ids) = random_venue(seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hazards = HazardMap::new();
        for id in &ids {
            if rng.gen_bool(0.3) {
                hazards.set_node_hazard(id, HazardKind::Smoke, rng.gen_range(0.0..1.0));
            }
            if rng.gen_bool(0.1) {
                hazards.set_node_hazard(id, HazardKind::Fire, 1.0);
            }
        }

        let options = PathOptions::avoiding_crowds();
        for start in ids.iter().take(3) {
            for goal in &ids {
                let found =
                    find_path(&graph, &hazards, start, goal, options).map(|path| path.cost);
                let expected = brute_force_cost(&graph, &hazards, start, goal, options);
                assert_costs_match(found, expected, &format!("seed {seed} {start}->{goal}"));
            }
        }
    }
}

#[test]
fn closures_are_never_traversed() {
    for seed in 200..230 {
        let (graph, ids) = random_venue(seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let from = &ids[rng.gen_range(0..ids.len())];
        let Some(edge) = graph.neighbors(from).first() else {
            continue;
        };
        let to = edge.target.clone();

        let mut hazards = HazardMap::new();
        hazards.add_closure(from, &to);

        for start in &ids {
            for goal in &ids {
                if let Some(path) = find_path(&graph, &hazards, start, goal, PathOptions::default())
                {
                    assert!(!path.uses_edge(from, &to), "seed {seed} used {from}->{to}");
                    assert!(!path.uses_edge(&to, from), "seed {seed} used {to}->{from}");
                }
            }
        }

        hazards.remove_closure(&to, from);
        let reopened = find_path(&graph, &hazards, from, &to, PathOptions::default())
            .expect("reopened corridor is reachable");
        assert!(reopened.cost <= edge.weight + 1e-9);
    }
}

#[test]
fn raising_severity_never_lowers_cost() {
    for seed in 300..320 {
        let (graph, ids) = random_venue(seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let node = ids[rng.gen_range(0..ids.len())].clone();
        let start = &ids[0];
        let goal = &ids[ids.len() - 1];
        let options = PathOptions::avoiding_crowds();

        let mut hazards = HazardMap::new();
        let mut previous = find_path(&graph, &hazards, start, goal, options).map(|p| p.cost);
        for severity in [0.25, 0.5, 0.75, 1.0] {
            hazards.set_node_hazard(&node, HazardKind::Structural, severity);
            let current = find_path(&graph, &hazards, start, goal, options).map(|p| p.cost);
            if let (Some(before), Some(after)) = (previous, current) {
                assert!(after + 1e-9 >= before, "seed {seed}: {after} < {before}");
            }
            previous = current;
        }

        if let Some(edge) = graph.neighbors(&node).first() {
            let target = edge.target.clone();
            let before = find_path(&graph, &hazards, start, goal, options).map(|p| p.cost);
            hazards.set_edge_hazard(&node, &target, HazardKind::Spill, 1.0);
            let after = find_path(&graph, &hazards, start, goal, options).map(|p| p.cost);
            if let (Some(before), Some(after)) = (before, after) {
                assert!(after + 1e-9 >= before);
            }
        }
    }
}

#[test]
fn stairs_are_routed_across_levels() {
    let (graph, hazards) = common::fixture_venue();
    let path = find_path(&graph, &hazards, "N1", "N11", PathOptions::default()).unwrap();
    assert_eq!(path.goal().map(String::as_str), Some("N11"));
    assert!(path.uses_edge("N9", "N10"));
    // N1 -> N2 -> (N3|N6) -> N7 -> N9 -> N10 -> N11
    assert_eq!(path.cost, 58.0);
}
