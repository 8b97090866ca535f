//! Route composition on top of the hazard-aware pathfinder.
//!
//! This module provides:
//! - [`nearest_of`], [`multi_destination`], [`evacuation_route`] - composers
//!   that signal failure with `None`
//! - [`plan_route`], [`plan_multi_stop`], [`plan_nearest`],
//!   [`plan_evacuation`] - validated entry points returning a [`RoutePlan`]
//!   or a typed [`Error`]
//! - [`eta_seconds`] - travel time helper shared with the dispatcher
//!
//! Multi-stop routes are built greedily (always walk to the closest remaining
//! destination next). This is an approximation; tours are not reordered to
//! rescue a stop that becomes unreachable.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId, NodeKind};
use crate::hazard::HazardMap;
use crate::path::{find_path, Path, PathOptions};

/// Walking speed assumed for plain route requests, in metres per second.
pub const DEFAULT_WALKING_SPEED: f64 = 1.5;

/// Whole seconds needed to cover `distance` at `speed`.
///
/// Fractions are truncated; non-positive speeds fall back to walking pace.
pub fn eta_seconds(distance: f64, speed: f64) -> u64 {
    let speed = if speed > 0.0 {
        speed
    } else {
        DEFAULT_WALKING_SPEED
    };
    if !distance.is_finite() || distance <= 0.0 {
        return 0;
    }
    (distance / speed) as u64
}

/// Winner of a nearest-candidate search.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestMatch {
    pub candidate: NodeId,
    pub path: Path,
}

/// Find the candidate with the lowest route cost from `target`.
///
/// Searches run from `target` towards each candidate without crowd
/// avoidance. The first candidate in input order wins exact ties.
pub fn nearest_of<S: AsRef<str>>(
    graph: &Graph,
    hazards: &HazardMap,
    target: &str,
    candidates: &[S],
) -> Option<NearestMatch> {
    let mut best: Option<NearestMatch> = None;
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let Some(path) = find_path(graph, hazards, target, candidate, PathOptions::default())
        else {
            continue;
        };
        if best
            .as_ref()
            .map_or(true, |current| path.cost < current.path.cost)
        {
            best = Some(NearestMatch {
                candidate: candidate.to_string(),
                path,
            });
        }
    }
    best
}

/// Visit every destination with a greedy nearest-neighbour tour.
///
/// Returns `None` as soon as no remaining destination is reachable from the
/// current position. Duplicate destinations are visited once; an empty list
/// yields the start node alone.
pub fn multi_destination<S: AsRef<str>>(
    graph: &Graph,
    hazards: &HazardMap,
    start: &str,
    destinations: &[S],
) -> Option<Path> {
    graph.node(start)?;
    tour(graph, hazards, start, destinations).ok()
}

fn tour<S: AsRef<str>>(
    graph: &Graph,
    hazards: &HazardMap,
    start: &str,
    destinations: &[S],
) -> std::result::Result<Path, (NodeId, Vec<NodeId>)> {
    let mut remaining: Vec<&str> = Vec::with_capacity(destinations.len());
    for destination in destinations {
        let destination = destination.as_ref();
        if !remaining.contains(&destination) {
            remaining.push(destination);
        }
    }

    let mut route = Path {
        nodes: vec![start.to_string()],
        cost: 0.0,
    };
    let mut current = start.to_string();

    while !remaining.is_empty() {
        let Some(leg) = nearest_of(graph, hazards, &current, &remaining) else {
            return Err((
                current,
                remaining.iter().map(|id| id.to_string()).collect(),
            ));
        };

        route.nodes.extend(leg.path.nodes.into_iter().skip(1));
        route.cost += leg.path.cost;
        remaining.retain(|id| *id != leg.candidate);
        current = leg.candidate;
    }

    Ok(route)
}

/// Route from `start` to the cheapest reachable exit.
pub fn evacuation_route<S: AsRef<str>>(
    graph: &Graph,
    hazards: &HazardMap,
    start: &str,
    exits: &[S],
) -> Option<NearestMatch> {
    nearest_of(graph, hazards, start, exits)
}

/// Which composer produced a [`RoutePlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Direct,
    MultiStop,
    Nearest,
    Evacuation,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RouteKind::Direct => "direct",
            RouteKind::MultiStop => "multi_stop",
            RouteKind::Nearest => "nearest",
            RouteKind::Evacuation => "evacuation",
        };
        f.write_str(value)
    }
}

/// A route resolved against a node, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub node: NodeId,
    pub x: f64,
    pub y: f64,
    pub level: i32,
    pub kind: NodeKind,
}

/// Planned route returned by the validated entry points.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    pub kind: RouteKind,
    pub steps: Vec<NodeId>,
    pub distance: f64,
    pub eta_seconds: u64,
    /// Chosen candidate or exit for nearest and evacuation routes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<NodeId>,
}

impl RoutePlan {
    fn from_path(kind: RouteKind, path: Path, destination: Option<NodeId>) -> Self {
        Self {
            kind,
            eta_seconds: eta_seconds(path.cost, DEFAULT_WALKING_SPEED),
            distance: path.cost,
            steps: path.nodes,
            destination,
        }
    }

    /// Number of corridors in the route.
    pub fn hop_count(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Resolve each step against `graph` for display.
    pub fn waypoints(&self, graph: &Graph) -> Vec<Waypoint> {
        waypoints(graph, &self.steps)
    }
}

/// Resolve node ids into positioned waypoints, skipping unknown ids.
pub fn waypoints(graph: &Graph, steps: &[NodeId]) -> Vec<Waypoint> {
    steps
        .iter()
        .filter_map(|id| graph.node(id))
        .map(|node| Waypoint {
            node: node.id.clone(),
            x: node.x,
            y: node.y,
            level: node.level,
            kind: node.kind,
        })
        .collect()
}

fn require_all<S: AsRef<str>>(graph: &Graph, ids: &[S]) -> Result<()> {
    for id in ids {
        graph.require(id.as_ref())?;
    }
    Ok(())
}

/// Point-to-point route between two known nodes.
pub fn plan_route(
    graph: &Graph,
    hazards: &HazardMap,
    from: &str,
    to: &str,
    avoid_crowds: bool,
) -> Result<RoutePlan> {
    graph.require(from)?;
    graph.require(to)?;

    let options = PathOptions { avoid_crowds };
    let path =
        find_path(graph, hazards, from, to, options).ok_or_else(|| Error::RouteNotFound {
            start: from.to_string(),
            goal: to.to_string(),
        })?;
    Ok(RoutePlan::from_path(RouteKind::Direct, path, None))
}

/// Greedy tour from `start` through every destination.
pub fn plan_multi_stop<S: AsRef<str>>(
    graph: &Graph,
    hazards: &HazardMap,
    start: &str,
    destinations: &[S],
) -> Result<RoutePlan> {
    graph.require(start)?;
    require_all(graph, destinations)?;

    let path = tour(graph, hazards, start, destinations).map_err(|(stalled_at, remaining)| {
        Error::TourUnreachable {
            start: start.to_string(),
            stalled_at,
            remaining,
        }
    })?;
    Ok(RoutePlan::from_path(RouteKind::MultiStop, path, None))
}

/// Route from `target` to its cheapest reachable candidate.
pub fn plan_nearest<S: AsRef<str>>(
    graph: &Graph,
    hazards: &HazardMap,
    target: &str,
    candidates: &[S],
) -> Result<RoutePlan> {
    graph.require(target)?;
    require_all(graph, candidates)?;

    let found = nearest_of(graph, hazards, target, candidates).ok_or_else(|| {
        Error::NoReachableCandidate {
            target: target.to_string(),
            count: candidates.len(),
        }
    })?;
    Ok(RoutePlan::from_path(
        RouteKind::Nearest,
        found.path,
        Some(found.candidate),
    ))
}

/// Route from `start` to the cheapest reachable exit.
///
/// An empty `exits` slice uses the exits resolved from the topology.
pub fn plan_evacuation<S: AsRef<str>>(
    graph: &Graph,
    hazards: &HazardMap,
    start: &str,
    exits: &[S],
) -> Result<RoutePlan> {
    graph.require(start)?;

    let found = if exits.is_empty() {
        if graph.exits().is_empty() {
            return Err(Error::NoExitNodes);
        }
        evacuation_route(graph, hazards, start, graph.exits())
    } else {
        require_all(graph, exits)?;
        evacuation_route(graph, hazards, start, exits)
    };

    let found = found.ok_or_else(|| Error::RouteNotFound {
        start: start.to_string(),
        goal: "any exit".to_string(),
    })?;
    Ok(RoutePlan::from_path(
        RouteKind::Evacuation,
        found.path,
        Some(found.candidate),
    ))
}
