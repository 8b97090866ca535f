//! Responder dispatch.
//!
//! Single assignments pick the candidate with the lowest priority-weighted
//! ETA. Multi-responder ranking orders by raw ETA and ignores priority; the
//! two modes are deliberately kept apart.
//!
//! Selection never mutates the tracker. [`commit`] flips the winner to
//! `responding`; callers that need select-then-commit atomicity hold the
//! tracker lock across both steps (see [`dispatch_nearest`]).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use crate::hazard::HazardMap;
use crate::path::{find_path, PathOptions};
use crate::routing::eta_seconds;
use crate::staff::{StaffMember, StaffRole, StaffStatus, StaffTracker};

/// Incident urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Multiplier applied to ETA when ranking single assignments.
    pub fn weight(self) -> f64 {
        match self {
            Priority::Critical => 0.5,
            Priority::High => 0.75,
            Priority::Medium => 1.0,
            Priority::Low => 1.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(Error::UnknownPriority {
                value: s.to_string(),
            }),
        }
    }
}

/// Something that needs a responder.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub location: NodeId,
    pub required_role: StaffRole,
    pub priority: Priority,
    pub incident_type: Option<String>,
}

impl Incident {
    pub fn new(location: impl Into<NodeId>, required_role: StaffRole, priority: Priority) -> Self {
        Self {
            location: location.into(),
            required_role,
            priority,
            incident_type: None,
        }
    }

    pub fn with_type(mut self, incident_type: impl Into<String>) -> Self {
        self.incident_type = Some(incident_type.into());
        self
    }
}

/// A computed responder assignment. Not stored anywhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub staff_id: String,
    pub role: StaffRole,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub path: Vec<NodeId>,
    pub distance: f64,
    pub eta_seconds: u64,
    pub priority: Priority,
}

impl Assignment {
    /// ETA scaled by the incident priority weight.
    pub fn weighted_eta(&self) -> f64 {
        self.eta_seconds as f64 * self.priority.weight()
    }
}

fn evaluate(
    graph: &Graph,
    hazards: &HazardMap,
    incident: &Incident,
    member: &StaffMember,
) -> Option<Assignment> {
    let path = find_path(
        graph,
        hazards,
        &member.position,
        &incident.location,
        PathOptions::avoiding_crowds(),
    )?;
    Some(Assignment {
        staff_id: member.id.clone(),
        role: member.role,
        from_node: member.position.clone(),
        to_node: incident.location.clone(),
        eta_seconds: eta_seconds(path.cost, member.role.speed()),
        distance: path.cost,
        path: path.nodes,
        priority: incident.priority,
    })
}

fn candidates(
    graph: &Graph,
    hazards: &HazardMap,
    incident: &Incident,
    tracker: &StaffTracker,
) -> Vec<Assignment> {
    tracker
        .available_by_role(incident.required_role)
        .into_iter()
        .filter_map(|member| evaluate(graph, hazards, incident, member))
        .collect()
}

/// Pick the available responder with the lowest priority-weighted ETA.
///
/// Responders route around crowds. Unreachable candidates are skipped;
/// ties keep the earliest staff id.
pub fn assign_nearest(
    graph: &Graph,
    hazards: &HazardMap,
    incident: &Incident,
    tracker: &StaffTracker,
) -> Option<Assignment> {
    let mut best: Option<Assignment> = None;
    for assignment in candidates(graph, hazards, incident, tracker) {
        let better = best
            .as_ref()
            .map_or(true, |current| assignment.weighted_eta() < current.weighted_eta());
        if better {
            best = Some(assignment);
        }
    }
    best
}

/// Rank up to `k` reachable responders by raw ETA, ascending.
pub fn assign_multiple(
    graph: &Graph,
    hazards: &HazardMap,
    incident: &Incident,
    tracker: &StaffTracker,
    k: usize,
) -> Vec<Assignment> {
    let mut ranked = candidates(graph, hazards, incident, tracker);
    ranked.sort_by_key(|assignment| assignment.eta_seconds);
    ranked.truncate(k);
    ranked
}

/// Mark the assigned responder as responding.
pub fn commit(tracker: &mut StaffTracker, assignment: &Assignment) -> Result<()> {
    tracker.update_status(&assignment.staff_id, StaffStatus::Responding)?;
    Ok(())
}

/// Validate the incident, select a responder, and optionally commit it.
///
/// Callers hold the tracker lock for the duration of this call.
pub fn dispatch_nearest(
    graph: &Graph,
    hazards: &HazardMap,
    tracker: &mut StaffTracker,
    incident: &Incident,
    commit_assignment: bool,
) -> Result<Assignment> {
    graph.require(&incident.location)?;
    let assignment =
        assign_nearest(graph, hazards, incident, tracker).ok_or_else(|| no_responder(incident))?;
    if commit_assignment {
        commit(tracker, &assignment)?;
    }
    Ok(assignment)
}

/// Validate the incident and rank up to `count` responders, optionally committing all.
pub fn dispatch_multiple(
    graph: &Graph,
    hazards: &HazardMap,
    tracker: &mut StaffTracker,
    incident: &Incident,
    count: usize,
    commit_assignments: bool,
) -> Result<Vec<Assignment>> {
    graph.require(&incident.location)?;
    let ranked = assign_multiple(graph, hazards, incident, tracker, count);
    if ranked.is_empty() {
        return Err(no_responder(incident));
    }
    if commit_assignments {
        for assignment in &ranked {
            commit(tracker, assignment)?;
        }
    }
    Ok(ranked)
}

fn no_responder(incident: &Incident) -> Error {
    Error::NoResponderAvailable {
        role: incident.required_role.to_string(),
        location: incident.location.clone(),
    }
}

/// Mean ETA from available `role` staff to each location.
///
/// Locations nobody can reach map to `None`. Routing ignores crowds here, so
/// the figures describe staff placement rather than live conditions.
pub fn response_coverage<S: AsRef<str>>(
    graph: &Graph,
    hazards: &HazardMap,
    tracker: &StaffTracker,
    locations: &[S],
    role: StaffRole,
) -> Result<BTreeMap<NodeId, Option<f64>>> {
    let staff = tracker.available_by_role(role);
    let mut coverage = BTreeMap::new();

    for location in locations {
        let location = location.as_ref();
        graph.require(location)?;

        let etas: Vec<f64> = staff
            .iter()
            .filter_map(|member| {
                find_path(graph, hazards, &member.position, location, PathOptions::default())
            })
            .map(|path| eta_seconds(path.cost, role.speed()) as f64)
            .collect();

        let mean = if etas.is_empty() {
            None
        } else {
            Some(etas.iter().sum::<f64>() / etas.len() as f64)
        };
        coverage.insert(location.to_string(), mean);
    }

    Ok(coverage)
}
