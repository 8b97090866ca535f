//! Topology snapshots as served by the map store.
//!
//! The wire shape mirrors `GET /api/map`: nodes with a `type` field, edges
//! carrying their weight as `w`, and closures that reference either an edge
//! id or a node id. Gates may be embedded or merged in from `/api/gates`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{Graph, Node, NodeId, NodeKind};

/// Full topology snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub closures: Vec<ClosureRecord>,
    #[serde(default)]
    pub gates: Vec<GateRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub level: i32,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
}

impl NodeRecord {
    pub fn to_node(&self) -> Node {
        Node::new(self.id.clone(), self.x, self.y, self.level).with_kind(self.kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    #[serde(rename = "w", alias = "weight")]
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub level: i32,
}

impl TopologySnapshot {
    /// Decode a snapshot from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a snapshot from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Validate and build the routing graph.
    pub fn build_graph(&self) -> Result<Graph> {
        Graph::from_snapshot(self)
    }

    /// Resolve the snapshot's closures into directed node pairs.
    ///
    /// Edge closures yield the edge's endpoints; node closures yield every
    /// edge touching the node. References that do not resolve are skipped.
    pub fn closure_pairs(&self, graph: &Graph) -> Vec<(NodeId, NodeId)> {
        let by_id: HashMap<&str, &EdgeRecord> = self
            .edges
            .iter()
            .filter_map(|edge| edge.id.as_deref().map(|id| (id, edge)))
            .collect();

        let mut pairs = Vec::new();
        for closure in &self.closures {
            if let Some(edge_id) = closure.edge_id.as_deref() {
                match by_id.get(edge_id) {
                    Some(edge) => pairs.push((edge.from.clone(), edge.to.clone())),
                    None => tracing::warn!(edge_id, "closure references unknown edge"),
                }
            } else if let Some(node_id) = closure.node_id.as_deref() {
                if graph.contains(node_id) {
                    pairs.extend(graph.incident_edges(node_id));
                } else {
                    tracing::warn!(node_id, "closure references unknown node");
                }
            }
        }
        pairs
    }
}

/// Load a topology snapshot from a JSON file on disk.
pub fn load_topology(path: &Path) -> Result<TopologySnapshot> {
    if !path.exists() {
        return Err(Error::TopologyNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    let snapshot = TopologySnapshot::from_json(&text)?;
    tracing::debug!(
        path = %path.display(),
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        "topology snapshot decoded"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "nodes": [
            {"id": "N1", "type": "gate", "x": 0, "y": 0, "level": 0},
            {"id": "N2", "type": "normal", "x": 10, "y": 0},
            {"id": "N3", "type": "kiosk", "x": 20, "y": 0, "level": 0}
        ],
        "edges": [
            {"id": "E1", "from": "N1", "to": "N2", "w": 10},
            {"id": "E2", "from": "N2", "to": "N1", "w": 10},
            {"id": "E3", "from": "N2", "to": "N3", "weight": 10}
        ],
        "closures": [
            {"id": "C1", "edge_id": "E3", "reason": "maintenance"},
            {"id": "C2", "edge_id": "E404", "reason": "stale"}
        ],
        "gates": [{"id": "G1", "x": 21, "y": 3}]
    }"#;

    #[test]
    fn decodes_wire_shape() {
        let snapshot = TopologySnapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.nodes[2].kind, NodeKind::Other);
        assert_eq!(snapshot.nodes[1].level, 0);
        assert_eq!(snapshot.edges[2].weight, 10.0);
    }

    #[test]
    fn gates_snap_to_nearby_nodes() {
        let snapshot = TopologySnapshot::from_json(SNAPSHOT).unwrap();
        let graph = snapshot.build_graph().unwrap();
        assert_eq!(graph.exits(), ["N1".to_string(), "N3".to_string()]);
    }

    #[test]
    fn closures_resolve_through_edge_ids() {
        let snapshot = TopologySnapshot::from_json(SNAPSHOT).unwrap();
        let graph = snapshot.build_graph().unwrap();
        let pairs = snapshot.closure_pairs(&graph);
        assert_eq!(pairs, vec![("N2".to_string(), "N3".to_string())]);
    }

    #[test]
    fn node_closures_cover_incident_edges() {
        let mut snapshot = TopologySnapshot::from_json(SNAPSHOT).unwrap();
        snapshot.closures = vec![ClosureRecord {
            id: None,
            edge_id: None,
            node_id: Some("N1".to_string()),
            reason: None,
        }];
        let graph = snapshot.build_graph().unwrap();
        let mut pairs = snapshot.closure_pairs(&graph);
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("N1".to_string(), "N2".to_string()),
                ("N2".to_string(), "N1".to_string())
            ]
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_topology(Path::new("/nonexistent/topology.json")).unwrap_err();
        assert!(matches!(err, Error::TopologyNotFound { .. }));
    }
}
