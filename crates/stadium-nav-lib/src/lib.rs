//! Stadium navigation library entry points.
//!
//! This crate loads venue topology snapshots into an in-memory graph, keeps a
//! mutable hazard overlay, runs hazard-aware A* and the route composers built
//! on it, and picks responders for incidents. Higher-level consumers (the
//! HTTP service, bus listeners) should only depend on the functions exported
//! here instead of reimplementing behavior.
//!
//! Everything here is synchronous and lock-free; callers own the
//! synchronisation of [`HazardMap`] and [`StaffTracker`].

pub mod dispatch;
pub mod error;
pub mod events;
pub mod graph;
pub mod hazard;
pub mod path;
pub mod routing;
pub mod staff;
pub mod topology;

pub use dispatch::{
    assign_multiple, assign_nearest, commit, dispatch_multiple, dispatch_nearest,
    response_coverage, Assignment, Incident, Priority,
};
pub use error::{Error, Result};
pub use events::{sensor_severity, BusEvent, ClosureUpdate, SensorReading};
pub use graph::{Edge, Graph, GraphBuilder, Node, NodeId, NodeKind};
pub use hazard::{crowd_severity, HazardKind, HazardMap, HazardSummary};
pub use path::{find_path, path_cost, Path, PathOptions};
pub use routing::{
    eta_seconds, evacuation_route, multi_destination, nearest_of, plan_evacuation,
    plan_multi_stop, plan_nearest, plan_route, waypoints, NearestMatch, RouteKind, RoutePlan,
    Waypoint, DEFAULT_WALKING_SPEED,
};
pub use staff::{StaffMember, StaffRole, StaffStatus, StaffTracker};
pub use topology::{load_topology, TopologySnapshot};
