//! Decoding and application of message-bus notifications.
//!
//! Events arrive as JSON objects discriminated by `event_type`. Hazard events
//! mutate a [`HazardMap`], staff events mutate a [`StaffTracker`]; everything
//! else decodes to [`BusEvent::Other`] and is ignored by both.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::hazard::{HazardKind, HazardMap};
use crate::staff::{StaffStatus, StaffTracker};

fn full_severity() -> f64 {
    1.0
}

fn closed_by_default() -> bool {
    true
}

/// Corridor state change carried by an evacuation update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClosureUpdate {
    pub from_node: String,
    pub to_node: String,
    #[serde(default = "closed_by_default")]
    pub closed: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Raw detector reading from a fire or smoke sensor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorReading {
    #[serde(alias = "node_id")]
    pub location_node: String,
    pub reading: f64,
    pub threshold: f64,
}

impl SensorReading {
    pub fn severity(&self) -> f64 {
        sensor_severity(self.reading, self.threshold)
    }
}

/// Map a detector reading onto a hazard severity.
///
/// Readings at twice the threshold or more are full severity, at one and a
/// half times 0.75, and anything lower 0.5. A non-positive threshold counts
/// as full severity.
pub fn sensor_severity(reading: f64, threshold: f64) -> f64 {
    if !(threshold > 0.0) {
        return 1.0;
    }
    let ratio = reading / threshold;
    if ratio >= 2.0 {
        1.0
    } else if ratio >= 1.5 {
        0.75
    } else {
        0.5
    }
}

/// A notification received from the venue message bus.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum BusEvent {
    CrowdDensity {
        area_id: String,
        occupancy_rate: f64,
    },
    EvacUpdate {
        closure: ClosureUpdate,
    },
    HazardUpdate {
        node_id: String,
        hazard_type: String,
        #[serde(default = "full_severity")]
        severity: f64,
        #[serde(default)]
        to_node: Option<String>,
    },
    HazardCleared {
        node_id: String,
    },
    FireDetected(SensorReading),
    SmokeDetected(SensorReading),
    StaffUpdate {
        staff_id: String,
        #[serde(default)]
        node_id: Option<String>,
        #[serde(default)]
        status: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl BusEvent {
    /// Decode a raw payload. Malformed JSON and known event types with
    /// missing fields yield `None`.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        match serde_json::from_slice(payload) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::debug!(error = %err, "dropping undecodable bus payload");
                None
            }
        }
    }

    /// Label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            BusEvent::CrowdDensity { .. } => "crowd_density",
            BusEvent::EvacUpdate { .. } => "evac_update",
            BusEvent::HazardUpdate { .. } => "hazard_update",
            BusEvent::HazardCleared { .. } => "hazard_cleared",
            BusEvent::FireDetected(_) => "fire_detected",
            BusEvent::SmokeDetected(_) => "smoke_detected",
            BusEvent::StaffUpdate { .. } => "staff_update",
            BusEvent::Other => "other",
        }
    }

    pub fn is_staff_event(&self) -> bool {
        matches!(self, BusEvent::StaffUpdate { .. })
    }

    pub fn is_hazard_event(&self) -> bool {
        !matches!(self, BusEvent::StaffUpdate { .. } | BusEvent::Other)
    }

    /// Apply a hazard-affecting event to `hazards`.
    ///
    /// Returns `Ok(false)` for events that do not touch hazards. Invalid
    /// payloads (unknown hazard kind, occupancy outside 0-100) are rejected
    /// without mutating anything.
    pub fn apply_hazard(&self, hazards: &mut HazardMap) -> Result<bool> {
        match self {
            BusEvent::CrowdDensity {
                area_id,
                occupancy_rate,
            } => {
                if !(0.0..=100.0).contains(occupancy_rate) {
                    return Err(Error::OccupancyOutOfRange {
                        value: *occupancy_rate,
                    });
                }
                hazards.set_crowd_penalty(area_id, *occupancy_rate);
            }
            BusEvent::EvacUpdate { closure } => {
                if closure.closed {
                    hazards.add_closure(&closure.from_node, &closure.to_node);
                } else {
                    hazards.remove_closure(&closure.from_node, &closure.to_node);
                }
            }
            BusEvent::HazardUpdate {
                node_id,
                hazard_type,
                severity,
                to_node,
            } => {
                let kind: HazardKind = hazard_type.parse()?;
                match to_node {
                    Some(to_node) => hazards.set_edge_hazard(node_id, to_node, kind, *severity),
                    None => hazards.set_node_hazard(node_id, kind, *severity),
                }
            }
            BusEvent::HazardCleared { node_id } => hazards.clear_node_hazards(node_id),
            BusEvent::FireDetected(sensor) => {
                hazards.set_node_hazard(&sensor.location_node, HazardKind::Fire, sensor.severity())
            }
            BusEvent::SmokeDetected(sensor) => {
                hazards.set_node_hazard(&sensor.location_node, HazardKind::Smoke, sensor.severity())
            }
            BusEvent::StaffUpdate { .. } | BusEvent::Other => return Ok(false),
        }
        Ok(true)
    }

    /// Apply a staff event to `tracker`. Returns `Ok(false)` for other events.
    pub fn apply_staff(&self, tracker: &mut StaffTracker) -> Result<bool> {
        let BusEvent::StaffUpdate {
            staff_id,
            node_id,
            status,
        } = self
        else {
            return Ok(false);
        };

        let status = status
            .as_deref()
            .map(str::parse::<StaffStatus>)
            .transpose()?;
        if tracker.get(staff_id).is_none() {
            return Err(Error::UnknownStaff {
                id: staff_id.clone(),
            });
        }
        if let Some(node_id) = node_id {
            tracker.update_position(staff_id, node_id)?;
        }
        if let Some(status) = status {
            tracker.update_status(staff_id, status)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staff::{StaffMember, StaffRole};

    #[test]
    fn decodes_crowd_density() {
        let event = BusEvent::decode(
            br#"{"event_type":"crowd_density","area_id":"N42","current_count":150,"occupancy_rate":85.0}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            BusEvent::CrowdDensity {
                area_id: "N42".into(),
                occupancy_rate: 85.0
            }
        );

        let mut hazards = HazardMap::new();
        assert!(event.apply_hazard(&mut hazards).unwrap());
        assert!((hazards.node_penalty("N42") - 1.875).abs() < 1e-9);
    }

    #[test]
    fn evacuation_updates_open_and_close() {
        let mut hazards = HazardMap::new();
        let close = BusEvent::decode(
            br#"{"event_type":"evac_update","closure":{"from_node":"N23","to_node":"N24","reason":"smoke"}}"#,
        )
        .unwrap();
        close.apply_hazard(&mut hazards).unwrap();
        assert!(hazards.is_closed("N24", "N23"));

        let reopen = BusEvent::decode(
            br#"{"event_type":"evac_update","closure":{"from_node":"N24","to_node":"N23","closed":false}}"#,
        )
        .unwrap();
        reopen.apply_hazard(&mut hazards).unwrap();
        assert!(!hazards.is_closed("N23", "N24"));
    }

    #[test]
    fn hazard_update_defaults_to_full_severity() {
        let mut hazards = HazardMap::new();
        BusEvent::decode(br#"{"event_type":"hazard_update","node_id":"N5","hazard_type":"smoke"}"#)
            .unwrap()
            .apply_hazard(&mut hazards)
            .unwrap();
        assert_eq!(hazards.node_penalty("N5"), 5.0);

        BusEvent::decode(
            br#"{"event_type":"hazard_update","node_id":"N5","hazard_type":"spill","severity":0.5,"to_node":"N6"}"#,
        )
        .unwrap()
        .apply_hazard(&mut hazards)
        .unwrap();
        assert_eq!(hazards.edge_penalty("N6", "N5"), 1.0);
    }

    #[test]
    fn invalid_hazard_payloads_are_rejected() {
        let mut hazards = HazardMap::new();
        let unknown_kind = BusEvent::decode(
            br#"{"event_type":"hazard_update","node_id":"N5","hazard_type":"lava"}"#,
        )
        .unwrap();
        assert!(unknown_kind.apply_hazard(&mut hazards).is_err());

        let overfull = BusEvent::decode(
            br#"{"event_type":"crowd_density","area_id":"N5","occupancy_rate":140}"#,
        )
        .unwrap();
        assert!(matches!(
            overfull.apply_hazard(&mut hazards),
            Err(Error::OccupancyOutOfRange { .. })
        ));
        assert_eq!(hazards.summary().node_hazards, 0);
    }

    #[test]
    fn sensor_tiers() {
        assert_eq!(sensor_severity(200.0, 100.0), 1.0);
        assert_eq!(sensor_severity(160.0, 100.0), 0.75);
        assert_eq!(sensor_severity(110.0, 100.0), 0.5);
        assert_eq!(sensor_severity(5.0, 0.0), 1.0);
    }

    #[test]
    fn fire_detector_accepts_node_id_alias() {
        let event = BusEvent::decode(
            br#"{"event_type":"fire_detected","node_id":"N7","reading":150,"threshold":100}"#,
        )
        .unwrap();
        let mut hazards = HazardMap::new();
        event.apply_hazard(&mut hazards).unwrap();
        assert!(hazards.has_hazard("N7", HazardKind::Fire));
        assert_eq!(hazards.node_penalty("N7"), 7.5);
    }

    #[test]
    fn unknown_and_malformed_payloads() {
        assert_eq!(
            BusEvent::decode(br#"{"event_type":"queue_update","location_id":"G1"}"#),
            Some(BusEvent::Other)
        );
        assert!(BusEvent::decode(b"not json").is_none());
        assert!(BusEvent::decode(br#"{"event_type":"hazard_cleared"}"#).is_none());

        let mut hazards = HazardMap::new();
        assert!(!BusEvent::Other.apply_hazard(&mut hazards).unwrap());
    }

    #[test]
    fn staff_update_moves_and_flags() {
        let mut tracker = StaffTracker::new();
        tracker.register(StaffMember::new("S1", StaffRole::Security, "N1"));

        let event = BusEvent::decode(
            br#"{"event_type":"staff_update","staff_id":"S1","node_id":"N4","status":"busy"}"#,
        )
        .unwrap();
        assert!(event.is_staff_event());
        assert!(event.apply_staff(&mut tracker).unwrap());
        let member = tracker.get("S1").unwrap();
        assert_eq!(member.position, "N4");
        assert_eq!(member.status, StaffStatus::Busy);

        let ghost = BusEvent::StaffUpdate {
            staff_id: "S9".into(),
            node_id: Some("N1".into()),
            status: None,
        };
        assert!(matches!(
            ghost.apply_staff(&mut tracker),
            Err(Error::UnknownStaff { .. })
        ));
    }
}
