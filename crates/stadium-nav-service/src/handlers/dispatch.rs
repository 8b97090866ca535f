//! Responder dispatch handlers.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{info, warn};

use stadium_nav_lib::{
    dispatch_multiple, dispatch_nearest, response_coverage, Assignment, Error as LibError, NodeId,
    Priority, StaffRole,
};
use stadium_nav_service_shared::{
    from_lib_error, record_dispatch_assigned, record_dispatch_failed, AppState,
    AssignMultipleRequest, AssignRequest, CoverageRequest, ProblemDetails, RequestId, Validate,
};

use super::require_graph;
use crate::{round2, Response};

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub staff_id: String,
    pub role: StaffRole,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub path: Vec<NodeId>,
    pub distance: f64,
    pub eta_seconds: u64,
    /// ETA scaled by the priority weight, used to rank single assignments.
    pub weighted_eta: f64,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<String>,
    /// Whether the responder was flipped to `responding`.
    pub committed: bool,
}

impl AssignmentResponse {
    fn new(assignment: Assignment, incident_type: Option<String>, committed: bool) -> Self {
        Self {
            weighted_eta: round2(assignment.weighted_eta()),
            staff_id: assignment.staff_id,
            role: assignment.role,
            from_node: assignment.from_node,
            to_node: assignment.to_node,
            path: assignment.path,
            distance: round2(assignment.distance),
            eta_seconds: assignment.eta_seconds,
            priority: assignment.priority,
            incident_type,
            committed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssignmentsResponse {
    pub requested: usize,
    /// Ranked by raw ETA, fastest first.
    pub assignments: Vec<AssignmentResponse>,
}

#[derive(Debug, Serialize)]
pub struct CoverageResponse {
    pub role: StaffRole,
    /// Mean ETA in seconds per location; `null` when nobody can reach it.
    pub coverage: BTreeMap<NodeId, Option<f64>>,
}

fn failed<T>(err: &LibError, request_id: &str) -> Response<T> {
    record_dispatch_failed(err.reason());
    warn!(request_id, error = %err, "dispatch failed");
    Response::Error(from_lib_error(err, request_id))
}

fn rejected<T>(problem: Box<ProblemDetails>) -> Response<T> {
    record_dispatch_failed("validation_error");
    problem.into()
}

/// `POST /api/v1/dispatch/assign`
pub async fn assign(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<AssignRequest>,
) -> Response<AssignmentResponse> {
    let request_id = request_id.as_str();
    let incident = match request.incident(request_id) {
        Ok(incident) => incident,
        Err(problem) => return rejected(problem),
    };
    let graph = match require_graph(&state, request_id).await {
        Ok(graph) => graph,
        Err(problem) => return problem.into(),
    };

    let result = {
        let (mut staff, hazards) = state.staff_and_hazards();
        dispatch_nearest(&graph, &hazards, &mut staff, &incident, request.commit)
    };

    match result {
        Ok(assignment) => {
            record_dispatch_assigned(assignment.role.as_str(), assignment.priority.as_str());
            info!(
                request_id,
                staff_id = %assignment.staff_id,
                location = %incident.location,
                eta_seconds = assignment.eta_seconds,
                committed = request.commit,
                "responder assigned"
            );
            Response::ok(
                AssignmentResponse::new(assignment, incident.incident_type, request.commit),
                request_id,
            )
        }
        Err(err) => failed(&err, request_id),
    }
}

/// `POST /api/v1/dispatch/assign-multiple`
pub async fn assign_multiple(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<AssignMultipleRequest>,
) -> Response<AssignmentsResponse> {
    let request_id = request_id.as_str();
    if let Err(problem) = request.validate(request_id) {
        return rejected(problem);
    }
    let incident = match request.incident.incident(request_id) {
        Ok(incident) => incident,
        Err(problem) => return rejected(problem),
    };
    let graph = match require_graph(&state, request_id).await {
        Ok(graph) => graph,
        Err(problem) => return problem.into(),
    };

    let commit = request.incident.commit;
    let result = {
        let (mut staff, hazards) = state.staff_and_hazards();
        dispatch_multiple(&graph, &hazards, &mut staff, &incident, request.count, commit)
    };

    match result {
        Ok(ranked) => {
            for assignment in &ranked {
                record_dispatch_assigned(assignment.role.as_str(), assignment.priority.as_str());
            }
            info!(
                request_id,
                location = %incident.location,
                requested = request.count,
                assigned = ranked.len(),
                "responders assigned"
            );
            let assignments = ranked
                .into_iter()
                .map(|assignment| {
                    AssignmentResponse::new(assignment, incident.incident_type.clone(), commit)
                })
                .collect();
            Response::ok(
                AssignmentsResponse {
                    requested: request.count,
                    assignments,
                },
                request_id,
            )
        }
        Err(err) => failed(&err, request_id),
    }
}

/// `POST /api/v1/dispatch/coverage`
pub async fn coverage(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<CoverageRequest>,
) -> Response<CoverageResponse> {
    let request_id = request_id.as_str();
    if let Err(problem) = request.validate(request_id) {
        return rejected(problem);
    }
    let role = match request.role(request_id) {
        Ok(role) => role,
        Err(problem) => return rejected(problem),
    };
    let graph = match require_graph(&state, request_id).await {
        Ok(graph) => graph,
        Err(problem) => return problem.into(),
    };

    let result = {
        let (staff, hazards) = state.staff_and_hazards();
        response_coverage(&graph, &hazards, &staff, &request.locations, role)
    };

    match result {
        Ok(coverage) => Response::ok(CoverageResponse { role, coverage }, request_id),
        Err(err) => failed(&err, request_id),
    }
}
