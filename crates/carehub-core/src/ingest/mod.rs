//! Ingestion of raw store documents into canonical records.
//!
//! Pipeline: RawDocument → validating mapper → Appointment / StaffMember
//!
//! A rejected document never fails its batch; it is logged and counted.

mod appointment;
pub mod dates;
mod staff;

pub use appointment::*;
pub use staff::*;

use thiserror::Error;

use crate::models::Appointment;

/// Why a document was dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} has wrong type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// A dropped document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub document_id: String,
    pub reason: RejectReason,
}

/// Result of normalizing one snapshot.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Accepted appointments, in first-seen order
    pub appointments: Vec<Appointment>,
    pub rejected: Vec<Rejection>,
}

impl NormalizedBatch {
    /// Appointments whose date was substituted with start of today.
    pub fn defaulted_date_count(&self) -> usize {
        self.appointments
            .iter()
            .filter(|a| a.has_defaulted_date())
            .count()
    }
}
