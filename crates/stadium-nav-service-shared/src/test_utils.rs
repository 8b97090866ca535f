//! Fixtures for handler tests.
//!
//! The fixture venue (`docs/fixtures/stadium_topology.json`) is a 12-node,
//! two-level concourse with exits at `N1` and `N5` and a maintenance
//! closure between `N4` and `N8`.

use std::path::PathBuf;

use stadium_nav_lib::{load_topology, HazardMap, StaffMember, StaffRole, StaffTracker};

use crate::state::AppState;
use crate::topology::TopologySource;

/// Path to the fixture topology.
pub const TEST_FIXTURE_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../docs/fixtures/stadium_topology.json"
);

pub fn fixture_topology_path() -> PathBuf {
    PathBuf::from(TEST_FIXTURE_PATH)
}

pub fn fixture_source() -> TopologySource {
    TopologySource::File(fixture_topology_path())
}

/// Staff registered by [`fresh_test_state`].
pub mod fixture_staff {
    /// Security at the west gate (N1).
    pub const SEC_1: &str = "SEC-1";
    /// Security at the east gate (N5).
    pub const SEC_2: &str = "SEC-2";
    /// Medical at the east gate (N5).
    pub const MED_1: &str = "MED-1";
    /// Cleaning in the upper seating block (N11).
    pub const CLN_1: &str = "CLN-1";
}

/// A new, isolated state over the fixture venue with its snapshot
/// closures replayed and four staff on duty.
///
/// Every call returns independent hazard and staff state, so tests may
/// mutate freely.
///
/// # Panics
///
/// Panics if the fixture cannot be loaded.
pub fn fresh_test_state() -> AppState {
    let path = fixture_topology_path();
    let snapshot = load_topology(&path)
        .unwrap_or_else(|e| panic!("failed to load fixture {:?}: {}", path, e));
    let graph = snapshot
        .build_graph()
        .unwrap_or_else(|e| panic!("fixture graph invalid: {}", e));

    let mut hazards = HazardMap::new();
    for (from, to) in snapshot.closure_pairs(&graph) {
        hazards.add_closure(&from, &to);
    }

    let mut staff = StaffTracker::new();
    staff.register(StaffMember::new(fixture_staff::SEC_1, StaffRole::Security, "N1"));
    staff.register(StaffMember::new(fixture_staff::SEC_2, StaffRole::Security, "N5"));
    staff.register(StaffMember::new(fixture_staff::MED_1, StaffRole::Medical, "N5"));
    staff.register(StaffMember::new(fixture_staff::CLN_1, StaffRole::Cleaning, "N11"));

    AppState::from_parts(graph, hazards, staff)
}

/// Generate a unique request ID for testing.
pub fn test_request_id() -> String {
    format!("test-{}", uuid::Uuid::now_v7())
}
