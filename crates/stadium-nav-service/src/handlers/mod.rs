pub mod admin;
pub mod dispatch;
pub mod hazards;
pub mod routes;
pub mod staff;

use std::sync::Arc;

use stadium_nav_lib::Graph;
use stadium_nav_service_shared::{from_lib_error, AppState, ProblemDetails};

/// Current graph, or a 503 problem when none can be loaded.
pub(crate) async fn require_graph(
    state: &AppState,
    request_id: &str,
) -> Result<Arc<Graph>, Box<ProblemDetails>> {
    state.graph_or_reload().await.map_err(|err| {
        tracing::warn!(request_id, error = %err, "no topology available");
        Box::new(from_lib_error(&err, request_id))
    })
}
