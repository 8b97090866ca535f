//! Route planning handlers.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{info, warn};

use stadium_nav_lib::{
    plan_evacuation, plan_multi_stop, plan_nearest, plan_route, Error as LibError, Graph, NodeId,
    RouteKind, RoutePlan, Waypoint,
};
use stadium_nav_service_shared::{
    from_lib_error, record_route_calculated, record_route_distance, record_route_failed, AppState,
    EvacuationRequest, MultiStopRequest, NearestRequest, RequestId, RouteRequest, Validate,
};

use super::require_graph;
use crate::{round2, Response};

/// Route returned by every routing endpoint.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub kind: RouteKind,
    pub path: Vec<NodeId>,
    /// Metres including hazard penalties, rounded to two decimals.
    pub distance: f64,
    pub eta_seconds: u64,
    pub hops: usize,
    pub waypoints: Vec<Waypoint>,
    /// Chosen candidate or exit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<NodeId>,
}

impl RouteResponse {
    fn from_plan(plan: RoutePlan, graph: &Graph) -> Self {
        Self {
            kind: plan.kind,
            waypoints: plan.waypoints(graph),
            hops: plan.hop_count(),
            distance: round2(plan.distance),
            eta_seconds: plan.eta_seconds,
            path: plan.steps,
            destination: plan.destination,
        }
    }
}

fn respond(
    result: Result<RoutePlan, LibError>,
    graph: &Graph,
    kind: RouteKind,
    request_id: &str,
) -> Response<RouteResponse> {
    let label = kind.to_string();
    match result {
        Ok(plan) => {
            record_route_calculated(&label);
            record_route_distance(plan.distance, &label);
            info!(
                request_id,
                kind = %label,
                hops = plan.hop_count(),
                distance = plan.distance,
                eta_seconds = plan.eta_seconds,
                "route computed"
            );
            Response::ok(RouteResponse::from_plan(plan, graph), request_id)
        }
        Err(err) => {
            record_route_failed(err.reason());
            warn!(request_id, kind = %label, error = %err, "route planning failed");
            Response::Error(from_lib_error(&err, request_id))
        }
    }
}

fn trimmed(ids: &[String]) -> Vec<&str> {
    ids.iter().map(|id| id.trim()).collect()
}

fn rejected(problem: Box<stadium_nav_service_shared::ProblemDetails>) -> Response<RouteResponse> {
    record_route_failed("validation_error");
    problem.into()
}

/// `POST /api/v1/route`
pub async fn route(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<RouteRequest>,
) -> Response<RouteResponse> {
    let request_id = request_id.as_str();
    if let Err(problem) = request.validate(request_id) {
        return rejected(problem);
    }
    let graph = match require_graph(&state, request_id).await {
        Ok(graph) => graph,
        Err(problem) => return problem.into(),
    };

    let result = plan_route(
        &graph,
        &state.hazards(),
        request.from.trim(),
        request.to.trim(),
        request.avoid_crowds,
    );
    respond(result, &graph, RouteKind::Direct, request_id)
}

/// `POST /api/v1/route/multi`
pub async fn multi_stop(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<MultiStopRequest>,
) -> Response<RouteResponse> {
    let request_id = request_id.as_str();
    if let Err(problem) = request.validate(request_id) {
        return rejected(problem);
    }
    let graph = match require_graph(&state, request_id).await {
        Ok(graph) => graph,
        Err(problem) => return problem.into(),
    };

    let result = plan_multi_stop(
        &graph,
        &state.hazards(),
        request.start.trim(),
        &trimmed(&request.destinations),
    );
    respond(result, &graph, RouteKind::MultiStop, request_id)
}

/// `POST /api/v1/route/nearest`
pub async fn nearest(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<NearestRequest>,
) -> Response<RouteResponse> {
    let request_id = request_id.as_str();
    if let Err(problem) = request.validate(request_id) {
        return rejected(problem);
    }
    let graph = match require_graph(&state, request_id).await {
        Ok(graph) => graph,
        Err(problem) => return problem.into(),
    };

    let result = plan_nearest(
        &graph,
        &state.hazards(),
        request.target.trim(),
        &trimmed(&request.candidates),
    );
    respond(result, &graph, RouteKind::Nearest, request_id)
}

/// `POST /api/v1/route/evacuation`
pub async fn evacuation(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<EvacuationRequest>,
) -> Response<RouteResponse> {
    let request_id = request_id.as_str();
    if let Err(problem) = request.validate(request_id) {
        return rejected(problem);
    }
    let graph = match require_graph(&state, request_id).await {
        Ok(graph) => graph,
        Err(problem) => return problem.into(),
    };

    let result = plan_evacuation(
        &graph,
        &state.hazards(),
        request.from.trim(),
        &trimmed(&request.exits),
    );
    respond(result, &graph, RouteKind::Evacuation, request_id)
}
