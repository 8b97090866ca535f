use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId, NodeKind};

/// Responder roles that can be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Security,
    Cleaning,
    Supervisor,
    Medical,
}

impl StaffRole {
    pub const ALL: [StaffRole; 4] = [
        StaffRole::Security,
        StaffRole::Cleaning,
        StaffRole::Supervisor,
        StaffRole::Medical,
    ];

    /// Typical walking speed for the role, in metres per second.
    pub fn speed(self) -> f64 {
        match self {
            StaffRole::Security => 2.0,
            StaffRole::Medical => 1.8,
            StaffRole::Supervisor => 1.5,
            StaffRole::Cleaning => 1.2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StaffRole::Security => "security",
            StaffRole::Cleaning => "cleaning",
            StaffRole::Supervisor => "supervisor",
            StaffRole::Medical => "medical",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        StaffRole::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| Error::UnknownRole {
                value: s.to_string(),
            })
    }
}

/// Availability of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    Available,
    Busy,
    OffDuty,
    Responding,
}

impl StaffStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StaffStatus::Available => "available",
            StaffStatus::Busy => "busy",
            StaffStatus::OffDuty => "off_duty",
            StaffStatus::Responding => "responding",
        }
    }
}

impl fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "available" => Ok(StaffStatus::Available),
            "busy" => Ok(StaffStatus::Busy),
            "off_duty" => Ok(StaffStatus::OffDuty),
            "responding" => Ok(StaffStatus::Responding),
            _ => Err(Error::UnknownStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// A mobile responder and where they currently stand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub role: StaffRole,
    pub position: NodeId,
    pub status: StaffStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl StaffMember {
    pub fn new(id: impl Into<String>, role: StaffRole, position: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            role,
            position: position.into(),
            status: StaffStatus::Available,
            name: None,
        }
    }

    pub fn with_status(mut self, status: StaffStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == StaffStatus::Available
    }
}

/// In-memory registry of staff keyed by id.
///
/// Iteration is ordered by id, which keeps dispatch tie-breaks stable.
#[derive(Debug, Clone, Default)]
pub struct StaffTracker {
    members: BTreeMap<String, StaffMember>,
}

impl StaffTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a staff member. Returns the previous record, if any.
    pub fn register(&mut self, member: StaffMember) -> Option<StaffMember> {
        self.members.insert(member.id.clone(), member)
    }

    pub fn remove(&mut self, id: &str) -> Option<StaffMember> {
        self.members.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&StaffMember> {
        self.members.get(id)
    }

    pub fn update_position(&mut self, id: &str, position: &str) -> Result<&StaffMember> {
        let member = self.member_mut(id)?;
        member.position = position.to_string();
        Ok(member)
    }

    pub fn update_status(&mut self, id: &str, status: StaffStatus) -> Result<&StaffMember> {
        let member = self.member_mut(id)?;
        member.status = status;
        Ok(member)
    }

    /// Staff with `role` whose status is available.
    pub fn available_by_role(&self, role: StaffRole) -> Vec<&StaffMember> {
        self.members
            .values()
            .filter(|member| member.role == role && member.is_available())
            .collect()
    }

    pub fn list(&self) -> impl Iterator<Item = &StaffMember> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Place `per_role` available members of every role around the venue.
    ///
    /// Members start on gate or entrance nodes, cycling through them; when
    /// the topology has neither, every node is used. Ids follow
    /// `STAFF_{ROLE}_{nnn}`. Returns the number of members registered.
    pub fn seed_roster(&mut self, graph: &Graph, per_role: usize) -> usize {
        let mut anchors: Vec<&NodeId> = graph
            .nodes()
            .filter(|node| matches!(node.kind, NodeKind::Gate | NodeKind::Entrance))
            .map(|node| &node.id)
            .collect();
        if anchors.is_empty() {
            anchors = graph.nodes().map(|node| &node.id).collect();
        }
        if anchors.is_empty() {
            return 0;
        }
        anchors.sort();

        let mut registered = 0;
        for role in StaffRole::ALL {
            for index in 0..per_role {
                let position = anchors[(index + registered) % anchors.len()];
                let id = format!("STAFF_{}_{:03}", role.as_str().to_uppercase(), index + 1);
                self.register(StaffMember::new(id, role, position.clone()));
            }
            registered += per_role;
        }
        registered
    }

    fn member_mut(&mut self, id: &str) -> Result<&mut StaffMember> {
        self.members
            .get_mut(id)
            .ok_or_else(|| Error::UnknownStaff { id: id.to_string() })
    }
}
