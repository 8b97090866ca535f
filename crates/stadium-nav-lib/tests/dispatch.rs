mod common;

use std::sync::Mutex;
use std::thread;

use stadium_nav_lib::{
    assign_multiple, assign_nearest, dispatch_multiple, dispatch_nearest, response_coverage,
    Error, GraphBuilder, HazardMap, Incident, Priority, StaffMember, StaffRole, StaffStatus,
    StaffTracker,
};

use common::fixture_venue;

fn roster(members: &[(&str, StaffRole, &str)]) -> StaffTracker {
    let mut tracker = StaffTracker::new();
    for (id, role, position) in members {
        tracker.register(StaffMember::new(*id, *role, *position));
    }
    tracker
}

#[test]
fn role_filter_beats_proximity() {
    let graph = GraphBuilder::new()
        .node("POST", 0.0, 0.0, 0)
        .node("NEAR", 190.0, 0.0, 0)
        .node("INC", 200.0, 0.0, 0)
        .corridor("POST", "INC", 200.0)
        .corridor("NEAR", "INC", 10.0)
        .build()
        .unwrap();
    let tracker = roster(&[
        ("S1", StaffRole::Security, "POST"),
        ("M1", StaffRole::Medical, "NEAR"),
    ]);

    let incident = Incident::new("INC", StaffRole::Security, Priority::High);
    let assignment = assign_nearest(&graph, &HazardMap::new(), &incident, &tracker).unwrap();
    assert_eq!(assignment.staff_id, "S1");
    assert_eq!(assignment.role, StaffRole::Security);
    assert_eq!(assignment.eta_seconds, 100);
    assert_eq!(assignment.distance, 200.0);

    let medical = Incident::new("INC", StaffRole::Medical, Priority::High);
    let assignment = assign_nearest(&graph, &HazardMap::new(), &medical, &tracker).unwrap();
    assert_eq!(assignment.staff_id, "M1");
    assert_eq!(assignment.eta_seconds, 5);
}

#[test]
fn priority_scales_but_never_reorders_a_single_incident() {
    let (graph, hazards) = fixture_venue();
    let tracker = roster(&[
        ("SEC-FAR", StaffRole::Security, "N11"),
        ("SEC-NEAR", StaffRole::Security, "N1"),
    ]);

    let critical = Incident::new("N2", StaffRole::Security, Priority::Critical);
    let low = Incident::new("N2", StaffRole::Security, Priority::Low);
    let urgent = assign_nearest(&graph, &hazards, &critical, &tracker).unwrap();
    let routine = assign_nearest(&graph, &hazards, &low, &tracker).unwrap();

    assert_eq!(urgent.staff_id, "SEC-NEAR");
    assert_eq!(routine.staff_id, urgent.staff_id);
    assert_eq!(urgent.eta_seconds, routine.eta_seconds);
    assert_eq!(urgent.weighted_eta(), 2.5);
    assert_eq!(routine.weighted_eta(), 7.5);
}

#[test]
fn responders_route_around_crowds() {
    let (graph, mut hazards) = fixture_venue();
    let tracker = roster(&[("S1", StaffRole::Security, "N2")]);
    let incident = Incident::new("N7", StaffRole::Security, Priority::Medium);

    let calm = assign_nearest(&graph, &hazards, &incident, &tracker).unwrap();
    assert_eq!(calm.path, vec!["N2", "N3", "N7"]);

    hazards.set_crowd_penalty("N3", 100.0);
    let crowded = assign_nearest(&graph, &hazards, &incident, &tracker).unwrap();
    assert_eq!(crowded.path, vec!["N2", "N6", "N7"]);
    assert_eq!(crowded.distance, 20.0);
}

#[test]
fn committed_responders_are_not_reassigned() {
    let (graph, hazards) = fixture_venue();
    let mut tracker = roster(&[
        ("SEC-A", StaffRole::Security, "N1"),
        ("SEC-B", StaffRole::Security, "N5"),
    ]);
    let incident = Incident::new("N2", StaffRole::Security, Priority::High).with_type("fight");

    let first = dispatch_nearest(&graph, &hazards, &mut tracker, &incident, true).unwrap();
    assert_eq!(first.staff_id, "SEC-A");
    assert_eq!(
        tracker.get("SEC-A").map(|member| member.status),
        Some(StaffStatus::Responding)
    );

    let second = dispatch_nearest(&graph, &hazards, &mut tracker, &incident, true).unwrap();
    assert_eq!(second.staff_id, "SEC-B");
    assert_eq!(second.eta_seconds, 15);

    let err = dispatch_nearest(&graph, &hazards, &mut tracker, &incident, true).unwrap_err();
    assert!(matches!(err, Error::NoResponderAvailable { .. }));
}

#[test]
fn preview_does_not_commit() {
    let (graph, hazards) = fixture_venue();
    let mut tracker = roster(&[("SEC-A", StaffRole::Security, "N1")]);
    let incident = Incident::new("N2", StaffRole::Security, Priority::Low);

    dispatch_nearest(&graph, &hazards, &mut tracker, &incident, false).unwrap();
    assert!(tracker.get("SEC-A").unwrap().is_available());
}

#[test]
fn busy_and_unreachable_staff_are_skipped() {
    let (graph, mut hazards) = fixture_venue();
    let mut tracker = roster(&[
        ("MED-1", StaffRole::Medical, "N11"),
        ("MED-2", StaffRole::Medical, "N2"),
        ("MED-3", StaffRole::Medical, "N5"),
    ]);
    tracker.update_status("MED-2", StaffStatus::Busy).unwrap();
    hazards.add_closure("N9", "N10");

    let incident = Incident::new("N3", StaffRole::Medical, Priority::Critical);
    let assignment = assign_nearest(&graph, &hazards, &incident, &tracker).unwrap();
    assert_eq!(assignment.staff_id, "MED-3");
    assert_eq!(assignment.from_node, "N5");
    assert_eq!(assignment.to_node, "N3");
}

#[test]
fn unknown_location_is_not_found() {
    let (graph, hazards) = fixture_venue();
    let mut tracker = roster(&[("SEC-A", StaffRole::Security, "N1")]);
    let incident = Incident::new("N404", StaffRole::Security, Priority::Medium);
    let err = dispatch_nearest(&graph, &hazards, &mut tracker, &incident, true).unwrap_err();
    assert!(matches!(err, Error::UnknownNode { .. }));
}

#[test]
fn multiple_responders_ranked_by_raw_eta() {
    let (graph, hazards) = fixture_venue();
    let tracker = roster(&[
        ("SEC-C", StaffRole::Security, "N11"),
        ("SEC-B", StaffRole::Security, "N5"),
        ("SEC-A", StaffRole::Security, "N1"),
        ("CLN-1", StaffRole::Cleaning, "N2"),
    ]);
    let incident = Incident::new("N2", StaffRole::Security, Priority::Critical);

    let ranked = assign_multiple(&graph, &hazards, &incident, &tracker, 2);
    let ids: Vec<&str> = ranked.iter().map(|a| a.staff_id.as_str()).collect();
    assert_eq!(ids, vec!["SEC-A", "SEC-B"]);
    assert_eq!(ranked[0].eta_seconds, 5);
    assert_eq!(ranked[1].eta_seconds, 15);

    let everyone = assign_multiple(&graph, &hazards, &incident, &tracker, 10);
    assert_eq!(everyone.len(), 3);
    assert_eq!(everyone[2].staff_id, "SEC-C");
    assert_eq!(everyone[2].eta_seconds, 24);
}

#[test]
fn dispatch_multiple_commits_every_assignee() {
    let (graph, hazards) = fixture_venue();
    let mut tracker = roster(&[
        ("SEC-A", StaffRole::Security, "N1"),
        ("SEC-B", StaffRole::Security, "N5"),
    ]);
    let incident = Incident::new("N3", StaffRole::Security, Priority::High);

    let ranked = dispatch_multiple(&graph, &hazards, &mut tracker, &incident, 5, true).unwrap();
    assert_eq!(ranked.len(), 2);
    assert!(tracker.list().all(|member| member.status == StaffStatus::Responding));

    let err = dispatch_multiple(&graph, &hazards, &mut tracker, &incident, 5, true).unwrap_err();
    assert!(matches!(err, Error::NoResponderAvailable { .. }));
}

#[test]
fn serialized_commits_hand_out_a_responder_once() {
    let (graph, hazards) = fixture_venue();
    let tracker = Mutex::new(roster(&[("S1", StaffRole::Security, "N1")]));
    let incident = Incident::new("N3", StaffRole::Security, Priority::High);

    let outcomes: Vec<Result<String, Error>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let mut tracker = tracker.lock().unwrap();
                    dispatch_nearest(&graph, &hazards, &mut tracker, &incident, true)
                        .map(|assignment| assignment.staff_id)
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let assigned: Vec<&String> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(assigned, ["S1"]);
    assert!(outcomes
        .iter()
        .filter_map(|o| o.as_ref().err())
        .all(|err| matches!(err, Error::NoResponderAvailable { .. })));
    assert_eq!(
        tracker.lock().unwrap().get("S1").map(|m| m.status),
        Some(StaffStatus::Responding)
    );
}

#[test]
fn coverage_reports_mean_eta_per_location() {
    let (graph, mut hazards) = fixture_venue();
    hazards.add_closure("N9", "N10");
    let tracker = roster(&[
        ("SEC-A", StaffRole::Security, "N1"),
        ("SEC-B", StaffRole::Security, "N5"),
    ]);

    let coverage =
        response_coverage(&graph, &hazards, &tracker, &["N3", "N11"], StaffRole::Security)
            .unwrap();
    assert_eq!(coverage.get("N3"), Some(&Some(10.0)));
    assert_eq!(coverage.get("N11"), Some(&None));

    let nobody =
        response_coverage(&graph, &hazards, &tracker, &["N3"], StaffRole::Medical).unwrap();
    assert_eq!(nobody.get("N3"), Some(&None));

    assert!(
        response_coverage(&graph, &hazards, &tracker, &["N404"], StaffRole::Security).is_err()
    );
}
