//! Shared infrastructure for the stadium navigation HTTP service.
//!
//! - [`AppState`]: swappable topology graph plus locked hazard and staff state
//! - [`health`]: liveness/readiness probes
//! - [`ProblemDetails`]: RFC 9457 error responses
//! - [`ServiceResponse`]: success envelope carrying the request id
//! - [`metrics`], [`logging`], [`middleware`]: observability
//! - [`TopologySource`]: map store or local file snapshots
//! - [`bus`] and [`listener`]: message-bus ingestion into the hazard and staff state
//! - Request types with validation for each endpoint
//!
//! # Architecture
//!
//! Handlers stay thin: all routing and dispatch logic lives in
//! `stadium-nav-lib`. This crate provides HTTP glue only.
//!
//! ```text
//! ┌──────────────┐   mpsc    ┌──────────────┐
//! │ MQTT bridge  │ ────────▶ │ listener     │ ──┐
//! └──────────────┘           └──────────────┘   │ lock
//! ┌──────────────┐                              ▼
//! │ axum handler │ ──────────────────────▶  AppState ──▶ stadium-nav-lib
//! └──────────────┘
//! ```
//!
//! # Testing Support
//!
//! Enable the `test-utils` feature for [`test_utils`].

pub mod bus;
pub mod config;
mod health;
pub mod listener;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod response;
mod state;
mod topology;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use bus::{spawn_mqtt_bridge, MqttConfig};
pub use config::ServiceConfig;
pub use health::{health_live, health_ready, HazardCounts, HealthStatus};
pub use listener::{apply_bus_message, event_channel, spawn_event_listener, ApplyOutcome, BusMessage};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_bus_event, record_dispatch_assigned,
    record_dispatch_failed, record_hazard_update, record_route_calculated,
    record_route_distance, record_route_failed, set_graph_nodes, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST,
    PROBLEM_NO_RESPONDER, PROBLEM_ROUTE_NOT_FOUND, PROBLEM_SERVICE_UNAVAILABLE,
    PROBLEM_UNKNOWN_NODE, PROBLEM_UNKNOWN_STAFF,
};
pub use request::{
    AssignMultipleRequest, AssignRequest, ClosureRequest, CoverageRequest, CrowdRequest,
    EvacuationRequest, HazardUpdateRequest, MultiStopRequest, NearestRequest,
    PositionUpdateRequest, RegisterStaffRequest, RouteRequest, StatusUpdateRequest, Validate,
    MAX_RESPONDERS,
};
pub use response::ServiceResponse;
pub use state::{AppState, AppStateError, ReloadSummary};
pub use topology::TopologySource;
