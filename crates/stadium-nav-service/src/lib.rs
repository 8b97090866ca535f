//! Stadium navigation HTTP service.
//!
//! # Endpoints
//!
//! All API routes live under `/api/v1`:
//!
//! - `POST /route`, `/route/multi`, `/route/nearest`, `/route/evacuation`
//! - `POST /dispatch/assign`, `/dispatch/assign-multiple`, `/dispatch/coverage`
//! - `POST`/`DELETE /hazards/closure`, `POST /hazards/update`, `POST /hazards/crowd`,
//!   `DELETE /hazards/node/{node_id}`, `DELETE /hazards`, `GET /hazards/status`
//! - `GET`/`POST /staff`, `PUT /staff/{id}/position`, `PUT /staff/{id}/status`
//! - `POST /admin/reload`
//!
//! Outside the prefix: `GET /metrics`, `GET /health/live`, `GET /health/ready`.

use axum::{
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use stadium_nav_service_shared::{
    health_live, health_ready, metrics_handler, AppState, MetricsLayer, ProblemDetails,
    ServiceResponse,
};

mod handlers;

pub use handlers::admin::ReloadResponse;
pub use handlers::dispatch::{AssignmentResponse, AssignmentsResponse, CoverageResponse};
pub use handlers::hazards::{CrowdAck, HazardAck, HazardStatusResponse};
pub use handlers::routes::RouteResponse;
pub use handlers::staff::{StaffListResponse, StaffResponse};

/// HTTP response: a payload or an RFC 9457 problem.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response<T> {
    Success(ServiceResponse<T>),
    Error(ProblemDetails),
}

impl<T> Response<T> {
    pub fn ok(data: T, request_id: &str) -> Self {
        Response::Success(ServiceResponse::ok(data, request_id))
    }

    pub fn created(data: T, request_id: &str) -> Self {
        Response::Success(ServiceResponse::created(data, request_id))
    }
}

impl<T> From<Box<ProblemDetails>> for Response<T> {
    fn from(problem: Box<ProblemDetails>) -> Self {
        Response::Error(*problem)
    }
}

impl<T: Serialize> IntoResponse for Response<T> {
    fn into_response(self) -> axum::response::Response {
        match self {
            Response::Success(data) => data.into_response(),
            Response::Error(problem) => problem.into_response(),
        }
    }
}

/// Build the router with the metrics endpoint at `/metrics`.
pub fn app(state: AppState) -> Router {
    router(state, "/metrics")
}

pub fn router(state: AppState, metrics_path: &str) -> Router {
    let api = Router::new()
        .route("/route", post(handlers::routes::route))
        .route("/route/multi", post(handlers::routes::multi_stop))
        .route("/route/nearest", post(handlers::routes::nearest))
        .route("/route/evacuation", post(handlers::routes::evacuation))
        .route("/dispatch/assign", post(handlers::dispatch::assign))
        .route(
            "/dispatch/assign-multiple",
            post(handlers::dispatch::assign_multiple),
        )
        .route("/dispatch/coverage", post(handlers::dispatch::coverage))
        .route("/hazards", delete(handlers::hazards::clear_all))
        .route(
            "/hazards/closure",
            post(handlers::hazards::add_closure).delete(handlers::hazards::remove_closure),
        )
        .route("/hazards/update", post(handlers::hazards::update))
        .route("/hazards/crowd", post(handlers::hazards::crowd))
        .route("/hazards/node/{node_id}", delete(handlers::hazards::clear_node))
        .route("/hazards/status", get(handlers::hazards::status))
        .route(
            "/staff",
            get(handlers::staff::list).post(handlers::staff::register),
        )
        .route("/staff/{staff_id}/position", put(handlers::staff::position))
        .route("/staff/{staff_id}/status", put(handlers::staff::status))
        .route("/admin/reload", post(handlers::admin::reload));

    Router::new()
        .nest("/api/v1", api)
        .route(metrics_path, get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(MetricsLayer)
        .with_state(state)
}

/// Round to two decimal places for display.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_centimetres() {
        assert_eq!(round2(58.0), 58.0);
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(0.004), 0.0);
    }

    #[test]
    fn problem_converts_into_error_variant() {
        let problem = Box::new(ProblemDetails::bad_request("nope", "req-1"));
        let response: Response<()> = problem.into();
        assert!(matches!(response, Response::Error(ref p) if p.status == 400));
    }

    #[derive(Serialize)]
    struct Registered {
        id: &'static str,
    }

    #[test]
    fn created_maps_to_201() {
        let response = Response::created(Registered { id: "SUP-1" }, "req-2").into_response();
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);

        let response = Response::ok(Registered { id: "SUP-1" }, "req-3").into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
