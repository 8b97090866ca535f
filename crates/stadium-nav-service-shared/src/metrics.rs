//! Prometheus metrics for the navigation service.
//!
//! - [`MetricsConfig`] and [`init_metrics`] install the global recorder.
//! - [`metrics_handler`] renders the `/metrics` endpoint.
//! - The `record_*` helpers cover routing, dispatch, hazard and bus activity.
//!
//! # Example
//!
//! ```no_run
//! use stadium_nav_service_shared::metrics::{init_metrics, metrics_handler, MetricsConfig};
//! use axum::{routing::get, Router};
//!
//! let config = MetricsConfig::from_env();
//! if let Err(err) = init_metrics(&config) {
//!     eprintln!("metrics disabled: {err}");
//! }
//!
//! let app: Router = Router::new().route(&config.path, get(metrics_handler));
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Path for the metrics endpoint (e.g., "/metrics").
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create configuration from environment variables.
    ///
    /// - `METRICS_ENABLED`: "true" or "false" (default: true)
    /// - `METRICS_PATH`: Path for metrics endpoint (default: "/metrics")
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let path = std::env::var("METRICS_PATH").unwrap_or_else(|_| "/metrics".to_string());

        Self { enabled, path }
    }
}

/// Install the Prometheus recorder. Call once at startup.
///
/// # Errors
///
/// Fails when metrics are disabled, when the recorder is already
/// installed, or when the exporter cannot be built.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Axum handler for the `/metrics` endpoint (Prometheus exposition format).
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

#[derive(Debug, Clone)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Increment `stadium_routes_calculated_total`.
///
/// `kind` is a [`stadium_nav_lib::RouteKind`] label: "direct", "multi_stop",
/// "nearest" or "evacuation".
pub fn record_route_calculated(kind: &str) {
    metrics::counter!(
        "stadium_routes_calculated_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Increment `stadium_routes_failed_total`, labelled with
/// [`stadium_nav_lib::Error::reason`].
pub fn record_route_failed(reason: &str) {
    metrics::counter!(
        "stadium_routes_failed_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

pub fn record_route_distance(distance: f64, kind: &str) {
    metrics::histogram!(
        "stadium_route_distance_meters",
        "kind" => kind.to_string()
    )
    .record(distance);
}

pub fn record_dispatch_assigned(role: &str, priority: &str) {
    metrics::counter!(
        "stadium_dispatch_assigned_total",
        "role" => role.to_string(),
        "priority" => priority.to_string()
    )
    .increment(1);
}

pub fn record_dispatch_failed(reason: &str) {
    metrics::counter!(
        "stadium_dispatch_failed_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Increment `stadium_hazard_updates_total` by hazard kind ("closure",
/// "crowd", "smoke", ...).
pub fn record_hazard_update(kind: &str) {
    metrics::counter!(
        "stadium_hazard_updates_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Increment `stadium_bus_events_total`.
///
/// `outcome` is "applied", "ignored" or "rejected".
pub fn record_bus_event(event: &str, outcome: &str) {
    metrics::counter!(
        "stadium_bus_events_total",
        "event" => event.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn set_graph_nodes(count: usize) {
    metrics::gauge!("stadium_graph_nodes").set(count as f64);
}
