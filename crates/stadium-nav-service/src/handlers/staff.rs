//! Staff registry handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use stadium_nav_lib::{StaffMember, StaffStatus};
use stadium_nav_service_shared::{
    from_lib_error, AppState, PositionUpdateRequest, ProblemDetails, RegisterStaffRequest,
    RequestId, StatusUpdateRequest, Validate,
};

use crate::Response;

#[derive(Debug, Serialize)]
pub struct StaffListResponse {
    pub count: usize,
    pub available: usize,
    /// Ordered by staff id.
    pub staff: Vec<StaffMember>,
}

#[derive(Debug, Serialize)]
pub struct StaffResponse {
    pub staff: StaffMember,
}

/// Reject positions the loaded topology does not know. Without a graph
/// there is nothing to check against, so the position is accepted.
fn check_position(
    state: &AppState,
    node_id: &str,
    request_id: &str,
) -> Result<(), Box<ProblemDetails>> {
    match state.graph() {
        Some(graph) => graph
            .require(node_id)
            .map(|_| ())
            .map_err(|err| Box::new(from_lib_error(&err, request_id))),
        None => Ok(()),
    }
}

/// `GET /api/v1/staff`
pub async fn list(
    State(state): State<AppState>,
    request_id: RequestId,
) -> Response<StaffListResponse> {
    let staff: Vec<StaffMember> = state.staff().list().cloned().collect();
    Response::ok(
        StaffListResponse {
            count: staff.len(),
            available: staff.iter().filter(|member| member.is_available()).count(),
            staff,
        },
        request_id.as_str(),
    )
}

/// `POST /api/v1/staff`. Registering an existing id replaces the record.
pub async fn register(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<RegisterStaffRequest>,
) -> Response<StaffResponse> {
    let request_id = request_id.as_str();
    if let Err(problem) = request.validate(request_id) {
        return problem.into();
    }
    let (role, status) = match (request.role(request_id), request.status(request_id)) {
        (Ok(role), Ok(status)) => (role, status),
        (Err(problem), _) | (_, Err(problem)) => return problem.into(),
    };
    let node_id = request.node_id.trim();
    if let Err(problem) = check_position(&state, node_id, request_id) {
        return problem.into();
    }

    let mut member = StaffMember::new(request.staff_id.trim(), role, node_id).with_status(status);
    if let Some(name) = &request.name {
        member = member.with_name(name.clone());
    }

    let replaced = state.staff().register(member.clone()).is_some();
    info!(
        request_id,
        staff_id = %member.id,
        role = %member.role,
        node_id = %member.position,
        replaced,
        "staff registered"
    );
    Response::created(StaffResponse { staff: member }, request_id)
}

/// `PUT /api/v1/staff/{staff_id}/position`
pub async fn position(
    State(state): State<AppState>,
    Path(staff_id): Path<String>,
    request_id: RequestId,
    Json(request): Json<PositionUpdateRequest>,
) -> Response<StaffResponse> {
    let request_id = request_id.as_str();
    if let Err(problem) = request.validate(request_id) {
        return problem.into();
    }
    let node_id = request.node_id.trim();
    if let Err(problem) = check_position(&state, node_id, request_id) {
        return problem.into();
    }

    let result = state
        .staff()
        .update_position(&staff_id, node_id)
        .map(StaffMember::clone);
    match result {
        Ok(staff) => {
            info!(request_id, staff_id = %staff_id, node_id, "staff moved");
            Response::ok(StaffResponse { staff }, request_id)
        }
        Err(err) => Response::Error(from_lib_error(&err, request_id)),
    }
}

/// `PUT /api/v1/staff/{staff_id}/status`
pub async fn status(
    State(state): State<AppState>,
    Path(staff_id): Path<String>,
    request_id: RequestId,
    Json(request): Json<StatusUpdateRequest>,
) -> Response<StaffResponse> {
    let request_id = request_id.as_str();
    let status: StaffStatus = match request.status(request_id) {
        Ok(status) => status,
        Err(problem) => return problem.into(),
    };

    let result = state
        .staff()
        .update_status(&staff_id, status)
        .map(StaffMember::clone);
    match result {
        Ok(staff) => {
            info!(request_id, staff_id = %staff_id, status = %status, "staff status changed");
            Response::ok(StaffResponse { staff }, request_id)
        }
        Err(err) => Response::Error(from_lib_error(&err, request_id)),
    }
}
