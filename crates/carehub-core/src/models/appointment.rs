//! Canonical appointment model.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Where an appointment's date came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// Native store timestamp
    Timestamp,
    /// Text with time of day and UTC offset
    DetailedText,
    /// Day-only text, pinned to start of day
    DayText,
    /// Nothing usable upstream; start of today was substituted
    Defaulted,
}

impl DateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateSource::Timestamp => "timestamp",
            DateSource::DetailedText => "detailed_text",
            DateSource::DayText => "day_text",
            DateSource::Defaulted => "defaulted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "timestamp" => Some(DateSource::Timestamp),
            "detailed_text" => Some(DateSource::DetailedText),
            "day_text" => Some(DateSource::DayText),
            "defaulted" => Some(DateSource::Defaulted),
            _ => None,
        }
    }
}

/// A normalized appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Store document id (merge key)
    pub id: String,
    /// Human-facing business code
    pub appointment_code: String,
    /// Patient reference
    pub patient_id: String,
    /// Doctor reference
    pub doctor_id: String,
    /// Reason for visit
    pub description: String,
    /// Visit status as given upstream (scheduled, completed, cancelled)
    pub status: String,
    /// Billing status as given upstream (pending, cancelled, paid, ...)
    pub billing_status: String,
    /// Billed amount, absent until billed
    pub amount: Option<f64>,
    /// Visit date in the reporting calendar
    pub date: DateTime<FixedOffset>,
    /// How `date` was resolved
    pub date_source: DateSource,
    pub doctors_notes: Option<String>,
    /// Opaque prescription identifier
    pub prescription_reference: Option<String>,
    /// Direct link to an uploaded prescription file
    pub prescription_url: Option<String>,
    pub follow_up_required: Option<bool>,
    pub follow_up_date: Option<DateTime<FixedOffset>>,
}

impl Appointment {
    /// Create a locally scheduled appointment.
    pub fn new(
        patient_id: String,
        doctor_id: String,
        description: String,
        date: DateTime<FixedOffset>,
    ) -> Self {
        let id = uuid::Uuid::new_v4();
        let code = id.simple().to_string()[..8].to_uppercase();
        Self {
            id: id.to_string(),
            appointment_code: format!("APT-{}", code),
            patient_id,
            doctor_id,
            description,
            status: "scheduled".into(),
            billing_status: "pending".into(),
            amount: None,
            date,
            date_source: DateSource::Timestamp,
            doctors_notes: None,
            prescription_reference: None,
            prescription_url: None,
            follow_up_required: None,
            follow_up_date: None,
        }
    }

    /// Status lowercased for grouping.
    pub fn canonical_status(&self) -> String {
        self.status.to_lowercase()
    }

    /// Billing status is compared case-sensitively.
    pub fn is_billing_cancelled(&self) -> bool {
        self.billing_status == "cancelled"
    }

    /// True when the date was fabricated at ingestion.
    pub fn has_defaulted_date(&self) -> bool {
        self.date_source == DateSource::Defaulted
    }

    /// Serialize to canonical JSON for content hashing.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// SHA-256 of the canonical JSON, hex encoded.
    pub fn content_hash(&self) -> Result<String, serde_json::Error> {
        let json = self.to_canonical_json()?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_new_appointment() {
        let appt = Appointment::new("p-1".into(), "d-1".into(), "Checkup".into(), date());
        assert_eq!(appt.id.len(), 36);
        assert!(appt.appointment_code.starts_with("APT-"));
        assert_eq!(appt.appointment_code.len(), 12);
        assert_eq!(appt.status, "scheduled");
        assert_eq!(appt.billing_status, "pending");
        assert!(!appt.has_defaulted_date());
    }

    #[test]
    fn test_billing_cancelled_is_case_sensitive() {
        let mut appt = Appointment::new("p".into(), "d".into(), "x".into(), date());
        appt.billing_status = "Cancelled".into();
        assert!(!appt.is_billing_cancelled());
        appt.billing_status = "cancelled".into();
        assert!(appt.is_billing_cancelled());
    }

    #[test]
    fn test_content_hash_tracks_changes() {
        let mut appt = Appointment::new("p".into(), "d".into(), "x".into(), date());
        let before = appt.content_hash().unwrap();
        assert_eq!(before, appt.content_hash().unwrap());
        assert_eq!(before.len(), 64);

        appt.status = "completed".into();
        assert_ne!(before, appt.content_hash().unwrap());
    }

    #[test]
    fn test_date_source_round_trip() {
        for source in [
            DateSource::Timestamp,
            DateSource::DetailedText,
            DateSource::DayText,
            DateSource::Defaulted,
        ] {
            assert_eq!(DateSource::from_str(source.as_str()), Some(source));
        }
        assert_eq!(DateSource::from_str("bogus"), None);
    }
}
