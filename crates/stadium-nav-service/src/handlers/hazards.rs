//! Hazard overlay handlers.
//!
//! Node ids are not checked against the topology here: hazards may be
//! staged for nodes that only appear after the next reload.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use stadium_nav_lib::{HazardKind, HazardMap, HazardSummary, NodeId};
use stadium_nav_service_shared::{
    record_hazard_update, AppState, ClosureRequest, CrowdRequest, HazardUpdateRequest, RequestId,
    Validate,
};

use crate::{round2, Response};

#[derive(Debug, Serialize)]
pub struct ClosureAck {
    pub from: NodeId,
    pub to: NodeId,
    pub closed: bool,
    pub active_closures: usize,
}

#[derive(Debug, Serialize)]
pub struct HazardAck {
    pub node_id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_node: Option<NodeId>,
    pub hazard_type: HazardKind,
    pub severity: f64,
    /// Cost added per traversal: base penalty times severity.
    pub penalty: f64,
}

#[derive(Debug, Serialize)]
pub struct CrowdAck {
    pub node_id: NodeId,
    pub occupancy_rate: f64,
    pub severity: f64,
    pub penalty: f64,
}

#[derive(Debug, Serialize)]
pub struct ClearedAck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    pub cleared: bool,
    pub active_closures: usize,
}

#[derive(Debug, Serialize)]
pub struct ClosedCorridor {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Serialize)]
pub struct HazardStatusResponse {
    pub closures: usize,
    pub node_hazards: usize,
    pub edge_hazards: usize,
    /// Each closed corridor once, endpoints in id order.
    pub closed_corridors: Vec<ClosedCorridor>,
}

impl HazardStatusResponse {
    fn from_map(hazards: &HazardMap) -> Self {
        let HazardSummary {
            closures,
            node_hazards,
            edge_hazards,
        } = hazards.summary();
        let closed_corridors = hazards
            .closures()
            .into_iter()
            .filter(|(from, to)| from < to)
            .map(|(from, to)| ClosedCorridor { from, to })
            .collect();
        Self {
            closures,
            node_hazards,
            edge_hazards,
            closed_corridors,
        }
    }
}

/// `POST /api/v1/hazards/closure`
pub async fn add_closure(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<ClosureRequest>,
) -> Response<ClosureAck> {
    set_closure(&state, request_id.as_str(), request, true)
}

/// `DELETE /api/v1/hazards/closure`
pub async fn remove_closure(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<ClosureRequest>,
) -> Response<ClosureAck> {
    set_closure(&state, request_id.as_str(), request, false)
}

fn set_closure(
    state: &AppState,
    request_id: &str,
    request: ClosureRequest,
    closed: bool,
) -> Response<ClosureAck> {
    if let Err(problem) = request.validate(request_id) {
        return problem.into();
    }
    let (from, to) = (request.from.trim(), request.to.trim());

    let active_closures = {
        let mut hazards = state.hazards();
        if closed {
            hazards.add_closure(from, to);
        } else {
            hazards.remove_closure(from, to);
        }
        hazards.summary().closures
    };

    record_hazard_update("closure");
    info!(request_id, from, to, closed, "corridor closure updated");
    Response::ok(
        ClosureAck {
            from: from.to_string(),
            to: to.to_string(),
            closed,
            active_closures,
        },
        request_id,
    )
}

/// `POST /api/v1/hazards/update`
pub async fn update(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<HazardUpdateRequest>,
) -> Response<HazardAck> {
    let request_id = request_id.as_str();
    if let Err(problem) = request.validate(request_id) {
        return problem.into();
    }
    let kind = match request.kind(request_id) {
        Ok(kind) => kind,
        Err(problem) => return problem.into(),
    };
    let node_id = request.node_id.trim().to_string();
    let to_node = request.to_node.as_deref().map(|to| to.trim().to_string());

    {
        let mut hazards = state.hazards();
        match &to_node {
            Some(to) => hazards.set_edge_hazard(&node_id, to, kind, request.severity),
            None => hazards.set_node_hazard(&node_id, kind, request.severity),
        }
    }

    record_hazard_update(kind.as_str());
    info!(
        request_id,
        node_id = %node_id,
        to_node = ?to_node,
        kind = %kind,
        severity = request.severity,
        "hazard updated"
    );
    Response::ok(
        HazardAck {
            node_id,
            to_node,
            hazard_type: kind,
            severity: request.severity,
            penalty: round2(kind.base_penalty() * request.severity),
        },
        request_id,
    )
}

/// `POST /api/v1/hazards/crowd`
pub async fn crowd(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<CrowdRequest>,
) -> Response<CrowdAck> {
    let request_id = request_id.as_str();
    if let Err(problem) = request.validate(request_id) {
        return problem.into();
    }
    let node_id = request.node_id.trim().to_string();

    let severity = state
        .hazards()
        .set_crowd_penalty(&node_id, request.occupancy_rate);

    record_hazard_update(HazardKind::Crowd.as_str());
    info!(
        request_id,
        node_id = %node_id,
        occupancy_rate = request.occupancy_rate,
        severity,
        "crowd penalty updated"
    );
    Response::ok(
        CrowdAck {
            node_id,
            occupancy_rate: request.occupancy_rate,
            severity,
            penalty: round2(HazardKind::Crowd.base_penalty() * severity),
        },
        request_id,
    )
}

/// `DELETE /api/v1/hazards/node/{node_id}`
pub async fn clear_node(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    request_id: RequestId,
) -> Response<ClearedAck> {
    let active_closures = {
        let mut hazards = state.hazards();
        hazards.clear_node_hazards(&node_id);
        hazards.summary().closures
    };
    let request_id = request_id.as_str();
    info!(request_id, node_id = %node_id, "node hazards cleared");
    Response::ok(
        ClearedAck {
            node_id: Some(node_id),
            cleared: true,
            active_closures,
        },
        request_id,
    )
}

/// `DELETE /api/v1/hazards`. Closures stay in place.
pub async fn clear_all(
    State(state): State<AppState>,
    request_id: RequestId,
) -> Response<ClearedAck> {
    let active_closures = {
        let mut hazards = state.hazards();
        hazards.clear_all();
        hazards.summary().closures
    };
    let request_id = request_id.as_str();
    info!(request_id, "all node and edge hazards cleared");
    Response::ok(
        ClearedAck {
            node_id: None,
            cleared: true,
            active_closures,
        },
        request_id,
    )
}

/// `GET /api/v1/hazards/status`
pub async fn status(
    State(state): State<AppState>,
    request_id: RequestId,
) -> Response<HazardStatusResponse> {
    let status = HazardStatusResponse::from_map(&state.hazards());
    Response::ok(status, request_id.as_str())
}
