//! Application state shared by all axum handlers.
//!
//! The graph is swapped wholesale on reload behind an `RwLock<Option<Arc<_>>>`:
//! a handler clones the `Arc` once and routes against that snapshot even if
//! a reload lands mid-request. Hazards and staff each sit behind their own
//! mutex. When both are needed the staff lock is taken first.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use stadium_nav_lib::{Error as LibError, Graph, HazardMap, StaffTracker};

use crate::metrics::set_graph_nodes;
use crate::topology::TopologySource;

/// Error during topology load or reload.
#[derive(Debug)]
pub enum AppStateError {
    /// The state was built from a fixed graph and has nowhere to reload from.
    NoSource,
    /// Fetching or validating the topology failed.
    Topology(LibError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSource => write!(f, "no topology source configured"),
            Self::Topology(e) => write!(f, "failed to load topology: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Topology(e) => Some(e),
            Self::NoSource => None,
        }
    }
}

impl From<LibError> for AppStateError {
    fn from(err: LibError) -> Self {
        Self::Topology(err)
    }
}

/// Outcome of a successful topology (re)load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    pub nodes: usize,
    pub edges: usize,
    pub exits: usize,
    /// Closure pairs replayed from the snapshot.
    pub closures: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Cheaply cloneable handle to the service state.
///
/// # Example
///
/// ```ignore
/// use axum::{extract::State, routing::get, Router};
/// use stadium_nav_service_shared::{AppState, TopologySource};
///
/// async fn handler(State(state): State<AppState>) {
///     let graph = state.graph_or_reload().await;
///     // ...
/// }
///
/// let state = AppState::load(TopologySource::File("venue.json".into())).await;
/// let app = Router::new().route("/", get(handler)).with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    graph: RwLock<Option<Arc<Graph>>>,
    hazards: Mutex<HazardMap>,
    staff: Mutex<StaffTracker>,
    loaded_at: Mutex<Option<DateTime<Utc>>>,
    source: Option<TopologySource>,
    reload_lock: tokio::sync::Mutex<()>,
}

impl AppState {
    /// State with no graph yet; the first routing call triggers a load.
    pub fn degraded(source: TopologySource) -> Self {
        Self::build(None, HazardMap::new(), StaffTracker::new(), Some(source))
    }

    /// Load the topology from `source`, falling back to a degraded state
    /// when the source is unavailable.
    pub async fn load(source: TopologySource) -> Self {
        let state = Self::degraded(source);
        match state.reload().await {
            Ok(summary) => tracing::info!(
                nodes = summary.nodes,
                edges = summary.edges,
                exits = summary.exits,
                closures = summary.closures,
                "topology loaded"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "starting without a topology, will retry on first routing request"
            ),
        }
        state
    }

    /// State around a pre-built graph. Reloads are unavailable.
    pub fn from_parts(graph: Graph, hazards: HazardMap, staff: StaffTracker) -> Self {
        set_graph_nodes(graph.node_count());
        Self::build(Some(Arc::new(graph)), hazards, staff, None)
    }

    fn build(
        graph: Option<Arc<Graph>>,
        hazards: HazardMap,
        staff: StaffTracker,
        source: Option<TopologySource>,
    ) -> Self {
        let graph_loaded_at = graph.is_some().then(Utc::now);
        Self {
            inner: Arc::new(AppStateInner {
                graph: RwLock::new(graph),
                hazards: Mutex::new(hazards),
                staff: Mutex::new(staff),
                loaded_at: Mutex::new(graph_loaded_at),
                source,
                reload_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Current graph snapshot, if one is loaded.
    pub fn graph(&self) -> Option<Arc<Graph>> {
        self.inner
            .graph
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current graph, attempting one reload when none is loaded yet.
    ///
    /// Callers that arrive while another lazy reload is in flight wait for
    /// it and share its outcome instead of fetching again.
    ///
    /// # Errors
    ///
    /// [`LibError::GraphNotLoaded`] when the retry also fails.
    pub async fn graph_or_reload(&self) -> Result<Arc<Graph>, LibError> {
        if let Some(graph) = self.graph() {
            return Ok(graph);
        }
        let Some(source) = self.inner.source.as_ref() else {
            return Err(LibError::GraphNotLoaded);
        };

        let _guard = match self.inner.reload_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                let _guard = self.inner.reload_lock.lock().await;
                return self.graph().ok_or(LibError::GraphNotLoaded);
            }
        };
        if let Some(graph) = self.graph() {
            return Ok(graph);
        }
        if let Err(e) = self.install(source).await {
            tracing::warn!(error = %e, "lazy topology reload failed");
        }
        self.graph().ok_or(LibError::GraphNotLoaded)
    }

    /// Fetch the topology, swap in the new graph, and replay its closures.
    ///
    /// Existing hazards are kept; snapshot closures are added on top.
    /// Concurrent reloads are serialized and each one fetches.
    pub async fn reload(&self) -> Result<ReloadSummary, AppStateError> {
        let source = self.inner.source.as_ref().ok_or(AppStateError::NoSource)?;
        let _guard = self.inner.reload_lock.lock().await;
        self.install(source).await
    }

    /// Caller holds `reload_lock`.
    async fn install(&self, source: &TopologySource) -> Result<ReloadSummary, AppStateError> {
        let snapshot = source.fetch().await?;
        let graph = snapshot.build_graph()?;
        let closures = snapshot.closure_pairs(&graph);

        let summary = ReloadSummary {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            exits: graph.exits().len(),
            closures: closures.len(),
            loaded_at: Utc::now(),
        };

        {
            let mut hazards = self.hazards();
            for (from, to) in &closures {
                hazards.add_closure(from, to);
            }
        }
        *self
            .inner
            .graph
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(graph));
        *self
            .inner
            .loaded_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(summary.loaded_at);

        set_graph_nodes(summary.nodes);
        tracing::debug!(source = %source, "graph swapped");
        Ok(summary)
    }

    /// When the current graph was installed.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        *self
            .inner
            .loaded_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn hazards(&self) -> MutexGuard<'_, HazardMap> {
        self.inner
            .hazards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn staff(&self) -> MutexGuard<'_, StaffTracker> {
        self.inner
            .staff
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock staff then hazards, for select-and-commit dispatch.
    pub fn staff_and_hazards(&self) -> (MutexGuard<'_, StaffTracker>, MutexGuard<'_, HazardMap>) {
        let staff = self.staff();
        let hazards = self.hazards();
        (staff, hazards)
    }

    pub fn source(&self) -> Option<&TopologySource> {
        self.inner.source.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("node_count", &self.graph().map(|graph| graph.node_count()))
            .field("source", &self.inner.source)
            .finish()
    }
}
