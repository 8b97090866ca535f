//! Liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stadium_nav_lib::HazardSummary;

use crate::AppState;

/// Body returned by `/health/live` and `/health/ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok", or "not_ready: <reason>".
    pub status: String,
    pub service: String,
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes_loaded: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exits: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_registered: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hazards: Option<HazardCounts>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology_loaded_at: Option<DateTime<Utc>>,
}

/// Serializable mirror of [`HazardSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardCounts {
    pub closures: usize,
    pub node_hazards: usize,
    pub edge_hazards: usize,
}

impl From<HazardSummary> for HazardCounts {
    fn from(summary: HazardSummary) -> Self {
        Self {
            closures: summary.closures,
            node_hazards: summary.node_hazards,
            edge_hazards: summary.edge_hazards,
        }
    }
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            nodes_loaded: None,
            exits: None,
            staff_registered: None,
            hazards: None,
            topology_loaded_at: None,
        }
    }

    pub fn ready(
        service: &str,
        version: &str,
        nodes: usize,
        exits: usize,
        staff: usize,
        hazards: HazardSummary,
    ) -> Self {
        Self {
            nodes_loaded: Some(nodes),
            exits: Some(exits),
            staff_registered: Some(staff),
            hazards: Some(hazards.into()),
            ..Self::alive(service, version)
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            ..Self::alive(service, version)
        }
    }
}

/// `GET /health/live`. Always 200 while the process is serving.
///
/// ```text
/// {"status":"ok","service":"stadium-nav-service-shared","version":"0.1.0"}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// `GET /health/ready`. 503 until a topology graph is loaded.
///
/// ```text
/// {"status":"ok",...,"nodes_loaded":12,"exits":2,"staff_registered":4,
///  "hazards":{"closures":1,"node_hazards":0,"edge_hazards":0}}
/// ```
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    let Some(graph) = state.graph() else {
        let status = HealthStatus::not_ready(service, version, "no topology loaded");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    };

    let staff = state.staff().len();
    let hazards = state.hazards().summary();
    let status = HealthStatus {
        topology_loaded_at: state.loaded_at(),
        ..HealthStatus::ready(
            service,
            version,
            graph.node_count(),
            graph.exits().len(),
            staff,
            hazards,
        )
    };
    (StatusCode::OK, Json(status)).into_response()
}
