use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the stadium navigation library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a node identifier is not part of the loaded topology.
    #[error("unknown node: {id}{}", format_suggestions(.suggestions))]
    UnknownNode { id: String, suggestions: Vec<String> },

    /// Raised when both endpoints exist but closures isolate them.
    #[error("no route found between {start} and {goal}")]
    RouteNotFound { start: String, goal: String },

    /// Raised when none of the candidate nodes can be reached from the target.
    #[error("none of the {count} candidates is reachable from {target}")]
    NoReachableCandidate { target: String, count: usize },

    /// Raised when a greedy multi-stop tour strands its remaining destinations.
    #[error("multi-stop route from {start} stalled at {stalled_at}; unreachable: {}", .remaining.join(", "))]
    TourUnreachable {
        start: String,
        stalled_at: String,
        remaining: Vec<String>,
    },

    /// Raised when an evacuation is requested but the topology has no exits.
    #[error("topology does not define any exit nodes")]
    NoExitNodes,

    /// Raised when no available staff member with the role can reach the incident.
    #[error("no available {role} responder can reach {location}")]
    NoResponderAvailable { role: String, location: String },

    /// Raised when a staff identifier is not registered with the tracker.
    #[error("unknown staff member: {id}")]
    UnknownStaff { id: String },

    /// Raised for hazard kinds outside the supported set.
    #[error("unknown hazard kind '{value}'; expected one of smoke, crowd, fire, spill, structural")]
    UnknownHazardKind { value: String },

    /// Raised for staff roles outside the supported set.
    #[error("unknown staff role '{value}'; expected one of security, cleaning, supervisor, medical")]
    UnknownRole { value: String },

    /// Raised for staff statuses outside the supported set.
    #[error("unknown staff status '{value}'; expected one of available, busy, off_duty, responding")]
    UnknownStatus { value: String },

    /// Raised for incident priorities outside the supported set.
    #[error("unknown priority '{value}'; expected one of low, medium, high, critical")]
    UnknownPriority { value: String },

    /// Raised when occupancy lies outside the 0-100 percent range.
    #[error("occupancy {value} is outside 0-100 percent")]
    OccupancyOutOfRange { value: f64 },

    /// Raised when the topology snapshot lists the same node twice.
    #[error("duplicate node id {id} in topology")]
    DuplicateNode { id: String },

    /// Raised when an edge references a node that is not in the snapshot.
    #[error("edge {from} -> {to} references unknown node {missing}")]
    DanglingEdge {
        from: String,
        to: String,
        missing: String,
    },

    /// Raised when an edge weight is negative or not finite.
    #[error("edge {from} -> {to} has invalid weight {weight}")]
    InvalidEdgeWeight { from: String, to: String, weight: f64 },

    /// Raised when a topology file could not be found.
    #[error("topology file not found at {path}")]
    TopologyNotFound { path: PathBuf },

    /// Raised when the upstream topology source cannot be reached.
    #[error("topology source {source_name} unavailable: {message}")]
    UpstreamUnavailable {
        source_name: String,
        message: String,
    },

    /// Raised when a routing call arrives before any topology is loaded.
    #[error("no topology graph loaded")]
    GraphNotLoaded,

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON decoding errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Short machine-friendly label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::UnknownNode { .. } => "unknown_node",
            Error::RouteNotFound { .. }
            | Error::NoReachableCandidate { .. }
            | Error::TourUnreachable { .. } => "no_path",
            Error::NoExitNodes => "no_exits",
            Error::NoResponderAvailable { .. } => "no_responder",
            Error::UnknownStaff { .. } => "unknown_staff",
            Error::UnknownHazardKind { .. }
            | Error::UnknownRole { .. }
            | Error::UnknownStatus { .. }
            | Error::UnknownPriority { .. }
            | Error::OccupancyOutOfRange { .. } => "validation_error",
            Error::DuplicateNode { .. }
            | Error::DanglingEdge { .. }
            | Error::InvalidEdgeWeight { .. } => "invalid_topology",
            Error::TopologyNotFound { .. }
            | Error::UpstreamUnavailable { .. }
            | Error::GraphNotLoaded => "unavailable",
            Error::Io(_) | Error::Json(_) => "internal_error",
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_node_lists_suggestions() {
        let err = Error::UnknownNode {
            id: "N7x".to_string(),
            suggestions: vec!["N7".to_string()],
        };
        assert_eq!(err.to_string(), "unknown node: N7x. Did you mean 'N7'?");

        let err = Error::UnknownNode {
            id: "N".to_string(),
            suggestions: vec!["N1".to_string(), "N2".to_string()],
        };
        assert!(err.to_string().contains("one of: 'N1', 'N2'"));
    }

    #[test]
    fn reasons_group_related_failures() {
        let unreachable = Error::RouteNotFound {
            start: "A".into(),
            goal: "B".into(),
        };
        assert_eq!(unreachable.reason(), "no_path");
        assert_eq!(Error::GraphNotLoaded.reason(), "unavailable");
        assert_eq!(
            Error::UnknownHazardKind {
                value: "lava".into()
            }
            .reason(),
            "validation_error"
        );
    }
}
