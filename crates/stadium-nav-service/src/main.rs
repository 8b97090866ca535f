//! Stadium navigation HTTP service.
//!
//! Loads the venue topology, listens for bus events, and serves routing,
//! dispatch, and hazard endpoints.
//!
//! # Configuration
//!
//! - `MAP_SERVICE_URL` - Base URL of the map service (default: `http://localhost:8000`)
//! - `STADIUM_TOPOLOGY_PATH` - Local topology JSON; takes precedence over the map service
//! - `TOPOLOGY_TIMEOUT_SECS` - Map service request timeout (default: 10)
//! - `SERVICE_PORT` - HTTP port (default: 8002)
//! - `STADIUM_SEED_STAFF_PER_ROLE` - Demo responders per role placed at startup (default: 0)
//! - `MQTT_HOST`, `MQTT_PORT`, `MQTT_TOPICS` - Event bus; disabled when `MQTT_HOST` is unset
//! - `RUST_LOG`, `LOG_FORMAT` - Logging
//! - `METRICS_PATH` - Prometheus endpoint path (default: `/metrics`)

use std::net::SocketAddr;

use tracing::{info, warn};

use stadium_nav_service::router;
use stadium_nav_service_shared::{
    event_channel, init_logging, init_metrics, spawn_event_listener, spawn_mqtt_bridge, AppState,
    LoggingConfig, MetricsConfig, MqttConfig, ServiceConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("stadium-nav");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let config = ServiceConfig::from_env();
    let source = config.topology_source();
    info!(source = %source, port = config.port, "starting stadium navigation service");

    let state = AppState::load(source).await;

    if config.seed_staff_per_role > 0 {
        match state.graph() {
            Some(graph) => {
                let seeded = state
                    .staff()
                    .seed_roster(&graph, config.seed_staff_per_role);
                info!(seeded, "demo staff roster placed");
            }
            None => warn!("no topology loaded, skipping staff seeding"),
        }
    }

    let (sender, receiver) = event_channel();
    let _listener = spawn_event_listener(state.clone(), receiver);
    let _bridge = match MqttConfig::from_env() {
        Some(mqtt) => Some(spawn_mqtt_bridge(mqtt, sender)),
        None => {
            info!("MQTT_HOST not set, event bus disabled");
            drop(sender);
            None
        }
    };

    let app = router(state, &metrics_config.path);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
