use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;

use crate::graph::{Graph, NodeId};
use crate::hazard::{HazardKind, HazardMap};

/// Options applied during a single search.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathOptions {
    /// Charge node hazard penalties on every node entered, not just burning ones.
    pub avoid_crowds: bool,
}

impl PathOptions {
    pub fn avoiding_crowds() -> Self {
        Self { avoid_crowds: true }
    }
}

/// A route through the graph and its hazard-inflated cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub cost: f64,
}

impl Path {
    pub fn start(&self) -> Option<&NodeId> {
        self.nodes.first()
    }

    pub fn goal(&self) -> Option<&NodeId> {
        self.nodes.last()
    }

    /// Number of corridors traversed.
    pub fn hop_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Whether the route walks the directed edge `from -> to`.
    pub fn uses_edge(&self, from: &str, to: &str) -> bool {
        self.nodes.windows(2).any(|pair| pair[0] == from && pair[1] == to)
    }
}

/// Cost of stepping from `current` into `next` over an edge of `weight`.
///
/// Closed corridors return `None`. Edge hazards always apply; node hazards
/// apply when avoiding crowds or when `next` is on fire.
pub fn step_cost(
    hazards: &HazardMap,
    current: &str,
    next: &str,
    weight: f64,
    options: PathOptions,
) -> Option<f64> {
    if hazards.is_closed(current, next) {
        return None;
    }

    let mut cost = weight + hazards.edge_penalty(current, next);
    if options.avoid_crowds || hazards.has_hazard(next, HazardKind::Fire) {
        cost += hazards.node_penalty(next);
    }
    Some(cost)
}

/// Run hazard-aware A* from `start` to `goal`.
///
/// Returns `None` when either endpoint is unknown or closures leave the goal
/// unreachable. Among entries with equal f-score the deeper one (higher g) is
/// expanded first, then the lexicographically smaller node id, so equal-cost
/// routes resolve the same way on every run.
pub fn find_path(
    graph: &Graph,
    hazards: &HazardMap,
    start: &str,
    goal: &str,
    options: PathOptions,
) -> Option<Path> {
    let start = graph.node(start)?.id.as_str();
    let goal = graph.node(goal)?.id.as_str();

    if start == goal {
        return Some(Path {
            nodes: vec![start.to_string()],
            cost: 0.0,
        });
    }

    let mut g_score: HashMap<&str, f64> = HashMap::new();
    let mut parents: HashMap<&str, &str> = HashMap::new();
    let mut queue = BinaryHeap::new();

    g_score.insert(start, 0.0);
    queue.push(AStarEntry::new(start, 0.0, graph.heuristic(start, goal)));

    while let Some(entry) = queue.pop() {
        let current_score = match g_score.get(entry.node) {
            Some(score) if *score < entry.cost.0 => continue,
            Some(score) => *score,
            None => continue,
        };

        if entry.node == goal {
            return Some(Path {
                nodes: reconstruct_path(&parents, start, goal),
                cost: current_score,
            });
        }

        for edge in graph.neighbors(entry.node) {
            let next = edge.target.as_str();
            let Some(cost) = step_cost(hazards, entry.node, next, edge.weight, options) else {
                continue;
            };

            let tentative_g = current_score + cost;
            if tentative_g < *g_score.get(next).unwrap_or(&f64::INFINITY) {
                g_score.insert(next, tentative_g);
                parents.insert(next, entry.node);
                queue.push(AStarEntry::new(next, tentative_g, graph.heuristic(next, goal)));
            }
        }
    }

    None
}

/// Cost of walking an explicit node sequence under the current hazards.
///
/// `None` if any hop is missing from the graph or closed.
pub fn path_cost(
    graph: &Graph,
    hazards: &HazardMap,
    nodes: &[NodeId],
    options: PathOptions,
) -> Option<f64> {
    let mut total = 0.0;
    for pair in nodes.windows(2) {
        let (from, to) = (pair[0].as_str(), pair[1].as_str());
        let weight = graph
            .neighbors(from)
            .iter()
            .filter(|edge| edge.target == to)
            .map(|edge| edge.weight)
            .min_by(f64::total_cmp)?;
        total += step_cost(hazards, from, to, weight, options)?;
    }
    Some(total)
}

fn reconstruct_path<'a>(
    parents: &HashMap<&'a str, &'a str>,
    start: &str,
    goal: &'a str,
) -> Vec<NodeId> {
    let mut path = vec![goal.to_string()];
    let mut current = goal;
    while current != start {
        match parents.get(current) {
            Some(&parent) => {
                path.push(parent.to_string());
                current = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct AStarEntry<'a> {
    node: &'a str,
    cost: FloatOrd,
    estimate: FloatOrd,
}

impl<'a> AStarEntry<'a> {
    fn new(node: &'a str, cost: f64, heuristic: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
        }
    }
}

impl Ord for AStarEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on estimate so BinaryHeap pops the lowest f-score first.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| self.cost.cmp(&other.cost))
            .then_with(|| other.node.cmp(self.node))
    }
}

impl PartialOrd for AStarEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
