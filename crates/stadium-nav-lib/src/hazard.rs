//! Dynamic hazard overlay consumed by the pathfinder.
//!
//! [`HazardMap`] keeps three independent pieces of state: closed corridors,
//! per-node hazard severities and per-edge hazard severities. Closures are
//! hard exclusions; hazards add `base_penalty * severity` metres of cost.
//!
//! The map itself is not synchronised. Owners wrap it in a single lock and
//! hold that lock across a whole search so no route sees a partial update.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::NodeId;

/// Occupancy below which crowding carries no penalty.
const CROWD_FREE_FLOW_PCT: f64 = 50.0;
/// Occupancy at which the crowd severity reaches one half.
const CROWD_CONGESTED_PCT: f64 = 80.0;

/// Supported hazard kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    Smoke,
    Crowd,
    Fire,
    Spill,
    Structural,
}

impl HazardKind {
    pub const ALL: [HazardKind; 5] = [
        HazardKind::Smoke,
        HazardKind::Crowd,
        HazardKind::Fire,
        HazardKind::Spill,
        HazardKind::Structural,
    ];

    /// Additive penalty, in metres-equivalent, at full severity.
    pub fn base_penalty(self) -> f64 {
        match self {
            HazardKind::Smoke => 5.0,
            HazardKind::Crowd => 3.0,
            HazardKind::Fire => 10.0,
            HazardKind::Spill => 2.0,
            HazardKind::Structural => 8.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HazardKind::Smoke => "smoke",
            HazardKind::Crowd => "crowd",
            HazardKind::Fire => "fire",
            HazardKind::Spill => "spill",
            HazardKind::Structural => "structural",
        }
    }
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        HazardKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::UnknownHazardKind {
                value: s.to_string(),
            })
    }
}

/// Convert an occupancy percentage into a crowd severity.
///
/// Zero below 50 %, rising linearly to 0.5 at 80 % and to 1.0 at 100 %.
/// Out-of-range input is clamped; non-finite input counts as empty.
pub fn crowd_severity(occupancy_pct: f64) -> f64 {
    let pct = if occupancy_pct.is_finite() {
        occupancy_pct.clamp(0.0, 100.0)
    } else {
        0.0
    };

    let severity = if pct < CROWD_FREE_FLOW_PCT {
        0.0
    } else if pct < CROWD_CONGESTED_PCT {
        (pct - CROWD_FREE_FLOW_PCT) / (CROWD_CONGESTED_PCT - CROWD_FREE_FLOW_PCT) * 0.5
    } else {
        0.5 + (pct - CROWD_CONGESTED_PCT) / (100.0 - CROWD_CONGESTED_PCT) * 0.5
    };
    severity.clamp(0.0, 1.0)
}

fn clamp_severity(severity: f64) -> f64 {
    if severity.is_nan() {
        0.0
    } else {
        severity.clamp(0.0, 1.0)
    }
}

fn penalty_of(hazards: Option<&HashMap<HazardKind, f64>>) -> f64 {
    hazards
        .map(|entries| {
            entries
                .iter()
                .map(|(kind, severity)| kind.base_penalty() * severity)
                .sum()
        })
        .unwrap_or(0.0)
}

/// Counts reported by [`HazardMap::summary`]; symmetric pairs count once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HazardSummary {
    pub closures: usize,
    pub node_hazards: usize,
    pub edge_hazards: usize,
}

/// Closures plus per-node and per-edge hazard severities.
#[derive(Debug, Clone, Default)]
pub struct HazardMap {
    closures: HashMap<NodeId, HashSet<NodeId>>,
    node_hazards: HashMap<NodeId, HashMap<HazardKind, f64>>,
    edge_hazards: HashMap<NodeId, HashMap<NodeId, HashMap<HazardKind, f64>>>,
}

impl HazardMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the corridor between `a` and `b` in both directions.
    pub fn add_closure(&mut self, a: &str, b: &str) {
        for (from, to) in [(a, b), (b, a)] {
            self.closures
                .entry(from.to_string())
                .or_default()
                .insert(to.to_string());
        }
    }

    /// Reopen the corridor between `a` and `b` in both directions.
    pub fn remove_closure(&mut self, a: &str, b: &str) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(targets) = self.closures.get_mut(from) {
                targets.remove(to);
                if targets.is_empty() {
                    self.closures.remove(from);
                }
            }
        }
    }

    pub fn is_closed(&self, a: &str, b: &str) -> bool {
        self.closures
            .get(a)
            .is_some_and(|targets| targets.contains(b))
    }

    /// Every closed directed pair, sorted.
    pub fn closures(&self) -> Vec<(NodeId, NodeId)> {
        let mut pairs: Vec<(NodeId, NodeId)> = self
            .closures
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from.clone(), to.clone())))
            .collect();
        pairs.sort();
        pairs
    }

    pub fn clear_closures(&mut self) {
        self.closures.clear();
    }

    /// Set a node hazard; severity is clamped to [0, 1].
    pub fn set_node_hazard(&mut self, node: &str, kind: HazardKind, severity: f64) {
        self.node_hazards
            .entry(node.to_string())
            .or_default()
            .insert(kind, clamp_severity(severity));
    }

    /// Set an edge hazard on `a -> b` and mirror it onto `b -> a`.
    pub fn set_edge_hazard(&mut self, a: &str, b: &str, kind: HazardKind, severity: f64) {
        let severity = clamp_severity(severity);
        for (from, to) in [(a, b), (b, a)] {
            self.edge_hazards
                .entry(from.to_string())
                .or_default()
                .entry(to.to_string())
                .or_default()
                .insert(kind, severity);
        }
    }

    /// Derive a crowd severity from occupancy and store it on the node.
    ///
    /// Returns the severity that was stored.
    pub fn set_crowd_penalty(&mut self, node: &str, occupancy_pct: f64) -> f64 {
        let severity = crowd_severity(occupancy_pct);
        self.set_node_hazard(node, HazardKind::Crowd, severity);
        severity
    }

    pub fn node_penalty(&self, node: &str) -> f64 {
        penalty_of(self.node_hazards.get(node))
    }

    pub fn edge_penalty(&self, a: &str, b: &str) -> f64 {
        penalty_of(self.edge_hazards.get(a).and_then(|targets| targets.get(b)))
    }

    /// Whether `node` carries a non-zero hazard of `kind`.
    pub fn has_hazard(&self, node: &str, kind: HazardKind) -> bool {
        self.node_hazards
            .get(node)
            .and_then(|entries| entries.get(&kind))
            .is_some_and(|severity| *severity > 0.0)
    }

    /// Active hazards on a node, ordered by kind.
    pub fn node_hazards(&self, node: &str) -> BTreeMap<HazardKind, f64> {
        self.node_hazards
            .get(node)
            .map(|entries| entries.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default()
    }

    pub fn clear_node_hazards(&mut self, node: &str) {
        self.node_hazards.remove(node);
    }

    /// Drop every node and edge hazard. Closures are left in place.
    pub fn clear_all(&mut self) {
        self.node_hazards.clear();
        self.edge_hazards.clear();
    }

    pub fn summary(&self) -> HazardSummary {
        HazardSummary {
            closures: unordered_pairs(self.closures.iter().map(|(a, bs)| (a, bs.iter()))),
            node_hazards: self.node_hazards.len(),
            edge_hazards: unordered_pairs(self.edge_hazards.iter().map(|(a, bs)| (a, bs.keys()))),
        }
    }
}

/// Count each symmetric pair once, self-pairs included.
fn unordered_pairs<'a, B>(adjacency: impl Iterator<Item = (&'a String, B)>) -> usize
where
    B: Iterator<Item = &'a String>,
{
    adjacency
        .map(|(a, bs)| bs.filter(|b| a <= *b).count())
        .sum()
}
