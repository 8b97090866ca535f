//! Request types and validation for HTTP endpoints.
//!
//! Enumerated fields (roles, priorities, hazard kinds, statuses) arrive as
//! plain strings so that unknown values surface as RFC 9457 `400` problems
//! instead of extractor rejections.

use serde::{Deserialize, Serialize};

use stadium_nav_lib::{HazardKind, Incident, Priority, StaffRole, StaffStatus};

use crate::{from_lib_error, ProblemDetails};

/// Upper bound on responders requested for a single incident.
pub const MAX_RESPONDERS: usize = 20;

/// Validation trait for request types.
///
/// Implementations should validate all fields and return a `ProblemDetails`
/// error for invalid input.
pub trait Validate {
    /// Validate the request, returning an error if invalid.
    ///
    /// Returns a boxed `ProblemDetails` to avoid large `Result::Err` variants.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

fn require_field(value: &str, field: &str, request_id: &str) -> Result<(), Box<ProblemDetails>> {
    if value.trim().is_empty() {
        return Err(Box::new(ProblemDetails::bad_request(
            format!("The '{}' field is required and cannot be empty", field),
            request_id,
        )));
    }
    Ok(())
}

fn require_list(values: &[String], field: &str, request_id: &str) -> Result<(), Box<ProblemDetails>> {
    if values.is_empty() {
        return Err(Box::new(ProblemDetails::bad_request(
            format!("The '{}' field must list at least one node", field),
            request_id,
        )));
    }
    for value in values {
        require_field(value, field, request_id)?;
    }
    Ok(())
}

fn parse_field<T>(value: &str, request_id: &str) -> Result<T, Box<ProblemDetails>>
where
    T: std::str::FromStr<Err = stadium_nav_lib::Error>,
{
    value
        .parse()
        .map_err(|err| Box::new(from_lib_error(&err, request_id)))
}

fn full_severity() -> f64 {
    1.0
}

fn commit_by_default() -> bool {
    true
}

fn default_count() -> usize {
    3
}

/// Point-to-point route between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub from: String,
    pub to: String,

    /// Charge crowd and smoke penalties on every node entered.
    #[serde(default)]
    pub avoid_crowds: bool,
}

impl Validate for RouteRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.from, "from", request_id)?;
        require_field(&self.to, "to", request_id)
    }
}

/// Greedy tour through several destinations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiStopRequest {
    pub start: String,
    pub destinations: Vec<String>,
}

impl Validate for MultiStopRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.start, "start", request_id)?;
        require_list(&self.destinations, "destinations", request_id)
    }
}

/// Cheapest candidate from a target node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestRequest {
    pub target: String,
    pub candidates: Vec<String>,
}

impl Validate for NearestRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.target, "target", request_id)?;
        require_list(&self.candidates, "candidates", request_id)
    }
}

/// Route to the nearest exit. Without `exits` the topology's own exits are used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvacuationRequest {
    pub from: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exits: Vec<String>,
}

impl Validate for EvacuationRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.from, "from", request_id)?;
        for exit in &self.exits {
            require_field(exit, "exits", request_id)?;
        }
        Ok(())
    }
}

/// Responder assignment for a single incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRequest {
    pub location: String,
    pub required_role: String,

    /// Defaults to `medium`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<String>,

    /// Flip the chosen responder to `responding`. Set to false to preview.
    #[serde(default = "commit_by_default")]
    pub commit: bool,
}

impl AssignRequest {
    /// Validate and convert into a library incident.
    pub fn incident(&self, request_id: &str) -> Result<Incident, Box<ProblemDetails>> {
        self.validate(request_id)?;
        let role: StaffRole = parse_field(&self.required_role, request_id)?;
        let priority: Priority = match self.priority.as_deref() {
            Some(value) => parse_field(value, request_id)?,
            None => Priority::default(),
        };

        let mut incident = Incident::new(self.location.trim(), role, priority);
        if let Some(kind) = &self.incident_type {
            incident = incident.with_type(kind.clone());
        }
        Ok(incident)
    }
}

impl Validate for AssignRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.location, "location", request_id)?;
        require_field(&self.required_role, "required_role", request_id)
    }
}

/// Responder assignment for incidents needing several staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignMultipleRequest {
    #[serde(flatten)]
    pub incident: AssignRequest,

    #[serde(default = "default_count")]
    pub count: usize,
}

impl Validate for AssignMultipleRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        self.incident.validate(request_id)?;
        if self.count == 0 {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'count' field must be at least 1",
                request_id,
            )));
        }
        if self.count > MAX_RESPONDERS {
            return Err(Box::new(ProblemDetails::bad_request(
                format!("The 'count' field cannot exceed {}", MAX_RESPONDERS),
                request_id,
            )));
        }
        Ok(())
    }
}

/// Mean response time per location for one role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageRequest {
    pub role: String,
    pub locations: Vec<String>,
}

impl CoverageRequest {
    pub fn role(&self, request_id: &str) -> Result<StaffRole, Box<ProblemDetails>> {
        parse_field(&self.role, request_id)
    }
}

impl Validate for CoverageRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.role, "role", request_id)?;
        require_list(&self.locations, "locations", request_id)
    }
}

/// Corridor to close or reopen. Closures apply in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureRequest {
    pub from: String,
    pub to: String,
}

impl Validate for ClosureRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.from, "from", request_id)?;
        require_field(&self.to, "to", request_id)
    }
}

/// Node hazard, or edge hazard when `to_node` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardUpdateRequest {
    pub node_id: String,
    pub hazard_type: String,

    #[serde(default = "full_severity")]
    pub severity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_node: Option<String>,
}

impl HazardUpdateRequest {
    pub fn kind(&self, request_id: &str) -> Result<HazardKind, Box<ProblemDetails>> {
        parse_field(&self.hazard_type, request_id)
    }
}

impl Validate for HazardUpdateRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.node_id, "node_id", request_id)?;
        if let Some(to_node) = &self.to_node {
            require_field(to_node, "to_node", request_id)?;
        }
        if !(0.0..=1.0).contains(&self.severity) {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'severity' field must be between 0.0 and 1.0",
                request_id,
            )));
        }
        self.kind(request_id).map(|_| ())
    }
}

/// Occupancy reading used to derive a crowd penalty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdRequest {
    pub node_id: String,
    pub occupancy_rate: f64,
}

impl Validate for CrowdRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.node_id, "node_id", request_id)?;
        if !(0.0..=100.0).contains(&self.occupancy_rate) {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'occupancy_rate' field must be between 0 and 100",
                request_id,
            )));
        }
        Ok(())
    }
}

/// Register (or replace) a staff member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterStaffRequest {
    pub staff_id: String,
    pub role: String,
    pub node_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RegisterStaffRequest {
    pub fn role(&self, request_id: &str) -> Result<StaffRole, Box<ProblemDetails>> {
        parse_field(&self.role, request_id)
    }

    pub fn status(&self, request_id: &str) -> Result<StaffStatus, Box<ProblemDetails>> {
        match self.status.as_deref() {
            Some(value) => parse_field(value, request_id),
            None => Ok(StaffStatus::Available),
        }
    }
}

impl Validate for RegisterStaffRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.staff_id, "staff_id", request_id)?;
        require_field(&self.node_id, "node_id", request_id)?;
        self.role(request_id)?;
        self.status(request_id).map(|_| ())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionUpdateRequest {
    pub node_id: String,
}

impl Validate for PositionUpdateRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require_field(&self.node_id, "node_id", request_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

impl StatusUpdateRequest {
    pub fn status(&self, request_id: &str) -> Result<StaffStatus, Box<ProblemDetails>> {
        parse_field(&self.status, request_id)
    }
}

impl Validate for StatusUpdateRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        self.status(request_id).map(|_| ())
    }
}
