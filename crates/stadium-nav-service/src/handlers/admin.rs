//! Operational endpoints.

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use stadium_nav_service_shared::{
    from_lib_error, AppState, AppStateError, ProblemDetails, ReloadSummary, RequestId,
};

use crate::Response;

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub nodes: usize,
    pub edges: usize,
    pub exits: usize,
    pub closures: usize,
    pub loaded_at: DateTime<Utc>,
    /// Where the topology came from, URL or file path.
    pub source: String,
}

impl ReloadResponse {
    fn new(summary: ReloadSummary, source: String) -> Self {
        Self {
            nodes: summary.nodes,
            edges: summary.edges,
            exits: summary.exits,
            closures: summary.closures,
            loaded_at: summary.loaded_at,
            source,
        }
    }
}

/// `POST /api/v1/admin/reload`
///
/// Refetch the topology and swap the graph in place. Active hazards and the
/// staff roster survive the reload.
pub async fn reload(
    State(state): State<AppState>,
    request_id: RequestId,
) -> Response<ReloadResponse> {
    let request_id = request_id.as_str();
    match state.reload().await {
        Ok(summary) => {
            let source = state
                .source()
                .map(ToString::to_string)
                .unwrap_or_default();
            info!(
                request_id,
                source = %source,
                nodes = summary.nodes,
                closures = summary.closures,
                "topology reloaded"
            );
            Response::ok(ReloadResponse::new(summary, source), request_id)
        }
        Err(AppStateError::NoSource) => {
            warn!(request_id, "reload requested without a topology source");
            Response::Error(ProblemDetails::service_unavailable(
                AppStateError::NoSource.to_string(),
                request_id,
            ))
        }
        Err(AppStateError::Topology(err)) => {
            warn!(request_id, error = %err, "topology reload failed");
            Response::Error(from_lib_error(&err, request_id))
        }
    }
}
