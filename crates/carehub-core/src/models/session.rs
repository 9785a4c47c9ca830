//! Session identity, passed explicitly to anything that scopes data.

use serde::{Deserialize, Serialize};

use super::Appointment;

/// Role of the signed-in user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }

    /// Parse a role name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "doctor" => Some(Role::Doctor),
            "patient" => Some(Role::Patient),
            _ => None,
        }
    }
}

/// The current session identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Which appointments this session may report on.
    pub fn scope(&self) -> ReportScope {
        match self.role {
            Role::Admin => ReportScope::All,
            Role::Doctor => ReportScope::Doctor(self.user_id.clone()),
            Role::Patient => ReportScope::Patient(self.user_id.clone()),
        }
    }
}

/// Supplies the current session.
pub trait IdentityProvider {
    fn current_session(&self) -> Option<Session>;
}

/// Identity provider with a fixed session.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    session: Option<Session>,
}

impl StaticIdentity {
    pub fn signed_in(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self { session: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_session(&self) -> Option<Session> {
        self.session.clone()
    }
}

/// Filter applied before aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "user_id", rename_all = "lowercase")]
pub enum ReportScope {
    All,
    Doctor(String),
    Patient(String),
}

impl ReportScope {
    pub fn includes(&self, appointment: &Appointment) -> bool {
        match self {
            ReportScope::All => true,
            ReportScope::Doctor(id) => appointment.doctor_id == *id,
            ReportScope::Patient(id) => appointment.patient_id == *id,
        }
    }

    /// Keep only appointments inside the scope.
    pub fn apply(&self, appointments: Vec<Appointment>) -> Vec<Appointment> {
        appointments
            .into_iter()
            .filter(|a| self.includes(a))
            .collect()
    }
}
