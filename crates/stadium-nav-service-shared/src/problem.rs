//! RFC 9457 Problem Details for HTTP APIs.
//!
//! Provides structured error responses following the Problem Details standard.
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use stadium_nav_lib::Error as LibError;

/// Problem type URI for node ids missing from the topology.
pub const PROBLEM_UNKNOWN_NODE: &str = "/problems/unknown-node";

/// Problem type URI for routes that cannot be found.
pub const PROBLEM_ROUTE_NOT_FOUND: &str = "/problems/route-not-found";

/// Problem type URI for incidents no available responder can reach.
pub const PROBLEM_NO_RESPONDER: &str = "/problems/no-responder-available";

/// Problem type URI for invalid request parameters.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for unregistered staff ids.
pub const PROBLEM_UNKNOWN_STAFF: &str = "/problems/unknown-staff";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// Problem type URI for service unavailable (e.g., no topology loaded).
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "/problems/service-unavailable";

/// RFC 9457 Problem Details response structure.
///
/// # Example
///
/// ```
/// use stadium_nav_service_shared::{ProblemDetails, PROBLEM_UNKNOWN_NODE};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(
///     PROBLEM_UNKNOWN_NODE,
///     "Unknown Node",
///     StatusCode::NOT_FOUND,
/// )
/// .with_detail("Node 'N99' not found. Did you mean: N9?")
/// .with_request_id("req-12345");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    /// HTTP status code for this problem.
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI reference identifying the specific occurrence (e.g., request ID).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Content type for this response (always "application/problem+json").
    pub content_type: String,
}

impl ProblemDetails {
    /// Create a new ProblemDetails with required fields.
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            content_type: "application/problem+json".to_string(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add the request identifier for tracing.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// Create a 400 Bad Request problem for invalid input.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 404 Not Found problem for unknown nodes.
    pub fn unknown_node(id: &str, suggestions: &[String], request_id: impl Into<String>) -> Self {
        let detail = if suggestions.is_empty() {
            format!("Node '{}' not found", id)
        } else {
            format!(
                "Node '{}' not found. Did you mean: {}?",
                id,
                suggestions.join(", ")
            )
        };

        Self::new(PROBLEM_UNKNOWN_NODE, "Unknown Node", StatusCode::NOT_FOUND)
            .with_detail(detail)
            .with_request_id(request_id)
    }

    /// Create a 404 Not Found problem for unreachable routes.
    pub fn route_not_found(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_ROUTE_NOT_FOUND,
            "Route Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn no_responder(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_NO_RESPONDER,
            "No Responder Available",
            StatusCode::NOT_FOUND,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn unknown_staff(id: &str, request_id: impl Into<String>) -> Self {
        Self::new(PROBLEM_UNKNOWN_STAFF, "Unknown Staff", StatusCode::NOT_FOUND)
            .with_detail(format!("Staff member '{}' is not registered", id))
            .with_request_id(request_id)
    }

    /// Create a 500 Internal Server Error problem.
    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 503 Service Unavailable problem.
    pub fn service_unavailable(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_SERVICE_UNAVAILABLE,
            "Service Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title,
            self.detail.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );

        *response.status_mut() = status;
        response
    }
}

/// Convert library errors to ProblemDetails.
///
/// The `request_id` must be provided separately since library errors don't have it.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::UnknownNode { id, suggestions } => {
            ProblemDetails::unknown_node(id, suggestions, request_id)
        }
        LibError::RouteNotFound { .. }
        | LibError::NoReachableCandidate { .. }
        | LibError::TourUnreachable { .. }
        | LibError::NoExitNodes => ProblemDetails::route_not_found(error.to_string(), request_id),
        LibError::NoResponderAvailable { .. } => {
            ProblemDetails::no_responder(error.to_string(), request_id)
        }
        LibError::UnknownStaff { id } => ProblemDetails::unknown_staff(id, request_id),
        LibError::UnknownHazardKind { .. }
        | LibError::UnknownRole { .. }
        | LibError::UnknownStatus { .. }
        | LibError::UnknownPriority { .. }
        | LibError::OccupancyOutOfRange { .. } => {
            ProblemDetails::bad_request(error.to_string(), request_id)
        }
        LibError::GraphNotLoaded
        | LibError::TopologyNotFound { .. }
        | LibError::UpstreamUnavailable { .. }
        | LibError::DuplicateNode { .. }
        | LibError::DanglingEdge { .. }
        | LibError::InvalidEdgeWeight { .. } => {
            ProblemDetails::service_unavailable(error.to_string(), request_id)
        }
        LibError::Io(_) | LibError::Json(_) => {
            ProblemDetails::internal_error(error.to_string(), request_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_details_new() {
        let problem = ProblemDetails::new(PROBLEM_UNKNOWN_NODE, "Unknown Node", StatusCode::NOT_FOUND);
        assert_eq!(problem.type_uri, PROBLEM_UNKNOWN_NODE);
        assert_eq!(problem.status, 404);
        assert_eq!(problem.content_type, "application/problem+json");
    }

    #[test]
    fn test_problem_details_bad_request() {
        let problem = ProblemDetails::bad_request("Invalid JSON", "req-123");
        assert_eq!(problem.status, 400);
        assert_eq!(problem.instance.as_deref(), Some("req-123"));
    }

    #[test]
    fn test_unknown_node_with_suggestions() {
        let suggestions = vec!["N9".to_string(), "N19".to_string()];
        let problem = ProblemDetails::unknown_node("N99", &suggestions, "req-456");

        assert_eq!(problem.status, 404);
        let detail = problem.detail.as_deref().unwrap();
        assert!(detail.contains("N99"));
        assert!(detail.contains("N9, N19"));
    }

    #[test]
    fn test_unknown_node_without_suggestions() {
        let problem = ProblemDetails::unknown_node("XYZ", &[], "req-789");
        assert!(!problem.detail.as_deref().unwrap().contains("Did you mean"));
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = ProblemDetails::bad_request("Test error", "req-test");
        let json = serde_json::to_string(&problem).unwrap();

        assert!(json.contains("\"type\":\"/problems/invalid-request\""));
        assert!(json.contains("\"status\":400"));
        assert!(json.contains("\"instance\":\"req-test\""));
    }

    #[test]
    fn test_from_lib_error_status_mapping() {
        let cases = [
            (
                LibError::RouteNotFound {
                    start: "A".into(),
                    goal: "B".into(),
                },
                PROBLEM_ROUTE_NOT_FOUND,
                404,
            ),
            (
                LibError::NoResponderAvailable {
                    role: "medical".into(),
                    location: "N3".into(),
                },
                PROBLEM_NO_RESPONDER,
                404,
            ),
            (
                LibError::UnknownStaff { id: "S9".into() },
                PROBLEM_UNKNOWN_STAFF,
                404,
            ),
            (
                LibError::UnknownHazardKind {
                    value: "lava".into(),
                },
                PROBLEM_INVALID_REQUEST,
                400,
            ),
            (LibError::GraphNotLoaded, PROBLEM_SERVICE_UNAVAILABLE, 503),
        ];

        for (error, type_uri, status) in cases {
            let problem = from_lib_error(&error, "req-lib");
            assert_eq!(problem.type_uri, type_uri, "{error}");
            assert_eq!(problem.status, status, "{error}");
        }
    }
}
