//! Background task applying message-bus events to the shared state.
//!
//! The bus client only forwards raw payloads into an mpsc channel. This
//! task decodes them and applies them through the same locked
//! `HazardMap` / `StaffTracker` API the HTTP handlers use. Nothing a
//! payload contains can fail the task: bad messages are logged at debug
//! and counted.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use stadium_nav_lib::BusEvent;

use crate::metrics::{record_bus_event, record_hazard_update};
use crate::AppState;

/// Raw message as delivered by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Decoded, but not something this service acts on.
    Ignored,
    /// Undecodable, or rejected by validation.
    Rejected,
}

impl ApplyOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplyOutcome::Applied => "applied",
            ApplyOutcome::Ignored => "ignored",
            ApplyOutcome::Rejected => "rejected",
        }
    }
}

pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

pub fn event_channel() -> (mpsc::Sender<BusMessage>, mpsc::Receiver<BusMessage>) {
    mpsc::channel(DEFAULT_CHANNEL_CAPACITY)
}

/// Decode and apply a single message.
pub fn apply_bus_message(state: &AppState, message: &BusMessage) -> ApplyOutcome {
    let Some(event) = BusEvent::decode(&message.payload) else {
        tracing::debug!(topic = %message.topic, "dropping malformed bus message");
        record_bus_event("undecodable", ApplyOutcome::Rejected.as_str());
        return ApplyOutcome::Rejected;
    };

    let applied = if event.is_staff_event() {
        event.apply_staff(&mut state.staff())
    } else {
        event.apply_hazard(&mut state.hazards())
    };

    let outcome = match applied {
        Ok(true) => {
            if event.is_hazard_event() {
                record_hazard_update(event.name());
            }
            ApplyOutcome::Applied
        }
        Ok(false) => ApplyOutcome::Ignored,
        Err(err) => {
            tracing::debug!(
                topic = %message.topic,
                event = event.name(),
                error = %err,
                "bus event rejected"
            );
            ApplyOutcome::Rejected
        }
    };

    record_bus_event(event.name(), outcome.as_str());
    outcome
}

/// Spawn the listener. It runs until every sender is dropped.
pub fn spawn_event_listener(
    state: AppState,
    mut receiver: mpsc::Receiver<BusMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("bus event listener started");
        while let Some(message) = receiver.recv().await {
            let outcome = apply_bus_message(&state, &message);
            if outcome == ApplyOutcome::Applied {
                tracing::debug!(topic = %message.topic, "bus event applied");
            }
        }
        tracing::info!("bus event listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stadium_nav_lib::{
        GraphBuilder, HazardKind, HazardMap, StaffMember, StaffRole, StaffStatus, StaffTracker,
    };

    fn state() -> AppState {
        let graph = GraphBuilder::new()
            .node("N1", 0.0, 0.0, 0)
            .node("N2", 10.0, 0.0, 0)
            .corridor("N1", "N2", 10.0)
            .build()
            .unwrap();
        let mut staff = StaffTracker::new();
        staff.register(StaffMember::new("SEC-1", StaffRole::Security, "N1"));
        AppState::from_parts(graph, HazardMap::new(), staff)
    }

    #[test]
    fn applies_hazard_and_staff_events() {
        let state = state();

        let fire = BusMessage::new(
            "stadium/emergency/sensors",
            r#"{"event_type":"fire_detected","location_node":"N2","reading":90,"threshold":40}"#,
        );
        assert_eq!(apply_bus_message(&state, &fire), ApplyOutcome::Applied);
        assert!(state.hazards().has_hazard("N2", HazardKind::Fire));

        let moved = BusMessage::new(
            "stadium/events",
            r#"{"event_type":"staff_update","staff_id":"SEC-1","node_id":"N2","status":"busy"}"#,
        );
        assert_eq!(apply_bus_message(&state, &moved), ApplyOutcome::Applied);
        let staff = state.staff();
        let member = staff.get("SEC-1").unwrap();
        assert_eq!(member.position, "N2");
        assert_eq!(member.status, StaffStatus::Busy);
    }

    #[test]
    fn bad_messages_never_touch_state() {
        let state = state();
        let cases = [
            BusMessage::new("stadium/events", "not json"),
            BusMessage::new(
                "stadium/crowd/gate",
                r#"{"event_type":"crowd_density","area_id":"N1","occupancy_rate":140}"#,
            ),
            BusMessage::new(
                "stadium/events",
                r#"{"event_type":"hazard_update","node_id":"N1","hazard_type":"lava"}"#,
            ),
            BusMessage::new(
                "stadium/events",
                r#"{"event_type":"staff_update","staff_id":"GHOST","status":"busy"}"#,
            ),
        ];
        for message in &cases {
            assert_eq!(apply_bus_message(&state, message), ApplyOutcome::Rejected);
        }
        assert_eq!(state.hazards().summary().node_hazards, 0);
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let state = state();
        let message = BusMessage::new(
            "stadium/events",
            r#"{"event_type":"queue_update","queue_id":"Q1","length":12}"#,
        );
        assert_eq!(apply_bus_message(&state, &message), ApplyOutcome::Ignored);
    }

    #[tokio::test]
    async fn listener_drains_channel_until_closed() {
        let state = state();
        let (sender, receiver) = event_channel();
        let handle = spawn_event_listener(state.clone(), receiver);

        sender
            .send(BusMessage::new(
                "stadium/emergency/evac",
                r#"{"event_type":"evac_update","closure":{"from_node":"N1","to_node":"N2"}}"#,
            ))
            .await
            .unwrap();
        drop(sender);
        handle.await.unwrap();

        assert!(state.hazards().is_closed("N2", "N1"));
    }
}
