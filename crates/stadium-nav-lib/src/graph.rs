use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::topology::{EdgeRecord, NodeRecord, TopologySnapshot};

/// Node identifier as published by the map store.
pub type NodeId = String;

/// Extra heuristic cost charged per floor crossed.
pub const LEVEL_CHANGE_COST: f64 = 5.0;

/// Gates published by the map store are snapped onto nodes within this radius (metres).
pub const EXIT_SNAP_RADIUS: f64 = 20.0;

/// Classification of a walkable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Normal,
    Stairs,
    Elevator,
    Gate,
    Entrance,
    Seat,
    Poi,
    #[serde(other)]
    Other,
}

impl NodeKind {
    /// Whether staff and evacuees may leave the venue through this node.
    pub fn is_exit(self) -> bool {
        matches!(self, NodeKind::Gate)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            NodeKind::Normal => "normal",
            NodeKind::Stairs => "stairs",
            NodeKind::Elevator => "elevator",
            NodeKind::Gate => "gate",
            NodeKind::Entrance => "entrance",
            NodeKind::Seat => "seat",
            NodeKind::Poi => "poi",
            NodeKind::Other => "other",
        };
        f.write_str(value)
    }
}

impl FromStr for NodeKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "" => NodeKind::Normal,
            "stairs" => NodeKind::Stairs,
            "elevator" => NodeKind::Elevator,
            "gate" => NodeKind::Gate,
            "entrance" => NodeKind::Entrance,
            "seat" => NodeKind::Seat,
            "poi" => NodeKind::Poi,
            _ => NodeKind::Other,
        })
    }
}

/// A walkable location in the venue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub level: i32,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, x: f64, y: f64, level: i32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            level,
            kind: NodeKind::Normal,
        }
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Planar distance ignoring the floor.
    pub fn planar_distance(&self, other: &Node) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Directed edge within the routing graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub target: NodeId,
    pub weight: f64,
}

/// Immutable topology used by the pathfinder.
///
/// Cloning is cheap; the node table and adjacency are shared.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Arc<HashMap<NodeId, Node>>,
    adjacency: Arc<HashMap<NodeId, Vec<Edge>>>,
    exits: Arc<Vec<NodeId>>,
}

impl Graph {
    /// Build a graph from raw nodes and directed edges.
    ///
    /// Fails on duplicate node ids, edges whose endpoints are missing, and
    /// negative or non-finite weights. Nothing is repaired.
    pub fn new(nodes: Vec<Node>, edges: Vec<(NodeId, NodeId, f64)>) -> Result<Self> {
        let mut table: HashMap<NodeId, Node> = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if table.contains_key(&node.id) {
                return Err(Error::DuplicateNode { id: node.id });
            }
            table.insert(node.id.clone(), node);
        }

        let mut adjacency: HashMap<NodeId, Vec<Edge>> = HashMap::new();
        for (from, to, weight) in edges {
            for endpoint in [&from, &to] {
                if !table.contains_key(endpoint) {
                    return Err(Error::DanglingEdge {
                        missing: endpoint.clone(),
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidEdgeWeight { from, to, weight });
            }
            adjacency.entry(from).or_default().push(Edge { target: to, weight });
        }

        let mut exits: Vec<NodeId> = table
            .values()
            .filter(|node| node.kind.is_exit())
            .map(|node| node.id.clone())
            .collect();
        exits.sort();

        Ok(Self {
            nodes: Arc::new(table),
            adjacency: Arc::new(adjacency),
            exits: Arc::new(exits),
        })
    }

    /// Build a graph from a map-store snapshot, snapping published gates to exits.
    pub fn from_snapshot(snapshot: &TopologySnapshot) -> Result<Self> {
        let nodes = snapshot.nodes.iter().map(NodeRecord::to_node).collect();
        let edges = snapshot
            .edges
            .iter()
            .map(|EdgeRecord { from, to, weight, .. }| (from.clone(), to.clone(), *weight))
            .collect();
        let mut graph = Self::new(nodes, edges)?;

        let mut exits: Vec<NodeId> = graph.exits.as_ref().clone();
        for gate in &snapshot.gates {
            let anchor = Node::new(gate.id.clone(), gate.x, gate.y, gate.level);
            if let Some(snapped) = graph.nearest_node_within(&anchor, EXIT_SNAP_RADIUS) {
                if !exits.contains(&snapped) {
                    exits.push(snapped);
                }
            } else {
                tracing::debug!(gate = %gate.id, "gate has no node within snap radius");
            }
        }
        graph.exits = Arc::new(exits);
        Ok(graph)
    }

    /// Look up a node by identifier.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Return the outgoing edges for a given node.
    pub fn neighbors(&self, id: &str) -> &[Edge] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Admissible estimate between two nodes: planar distance plus a fixed
    /// cost per floor crossed. Unknown nodes estimate to zero.
    pub fn heuristic(&self, a: &str, b: &str) -> f64 {
        match (self.nodes.get(a), self.nodes.get(b)) {
            (Some(a), Some(b)) => {
                a.planar_distance(b) + LEVEL_CHANGE_COST * f64::from((a.level - b.level).abs())
            }
            _ => 0.0,
        }
    }

    /// Exit nodes in resolution order: gate-kind nodes first, then snapped gates.
    pub fn exits(&self) -> &[NodeId] {
        &self.exits
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// All directed edges touching `id`, in either direction.
    pub fn incident_edges(&self, id: &str) -> Vec<(NodeId, NodeId)> {
        let mut pairs = Vec::new();
        for (from, edges) in self.adjacency.iter() {
            for edge in edges {
                if from == id || edge.target == id {
                    pairs.push((from.clone(), edge.target.clone()));
                }
            }
        }
        pairs
    }

    /// Resolve a node id or fail with close-match suggestions.
    pub fn require(&self, id: &str) -> Result<&Node> {
        self.node(id).ok_or_else(|| Error::UnknownNode {
            id: id.to_string(),
            suggestions: self.fuzzy_node_matches(id, 3),
        })
    }

    /// Find node ids similar to `query` using Jaro-Winkler similarity.
    pub fn fuzzy_node_matches(&self, query: &str, limit: usize) -> Vec<String> {
        let query = query.to_ascii_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .nodes
            .keys()
            .map(|id| (strsim::jaro_winkler(&query, &id.to_ascii_lowercase()), id.as_str()))
            .filter(|(score, _)| *score >= 0.8)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, id)| id.to_string())
            .collect()
    }

    fn nearest_node_within(&self, anchor: &Node, radius: f64) -> Option<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.level == anchor.level)
            .map(|node| (node.planar_distance(anchor), node))
            .filter(|(distance, _)| *distance < radius)
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)))
            .map(|(_, node)| node.id.clone())
    }
}

/// Programmatic graph construction, mostly for tests and benchmarks.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<(NodeId, NodeId, f64)>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(self, id: &str, x: f64, y: f64, level: i32) -> Self {
        self.typed_node(id, x, y, level, NodeKind::Normal)
    }

    pub fn typed_node(mut self, id: &str, x: f64, y: f64, level: i32, kind: NodeKind) -> Self {
        self.nodes.push(Node::new(id, x, y, level).with_kind(kind));
        self
    }

    /// Add a single directed edge.
    pub fn edge(mut self, from: &str, to: &str, weight: f64) -> Self {
        self.edges.push((from.to_string(), to.to_string(), weight));
        self
    }

    /// Add a bidirectional corridor as two directed edges.
    pub fn corridor(self, a: &str, b: &str, weight: f64) -> Self {
        self.edge(a, b, weight).edge(b, a, weight)
    }

    pub fn build(self) -> Result<Graph> {
        Graph::new(self.nodes, self.edges)
    }
}
