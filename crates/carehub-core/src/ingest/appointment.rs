//! Appointment normalizer.
//!
//! Handles:
//! - Field name aliases (`Description`, `Status`, `doctorNotes`, ...)
//! - Two-format date resolution with a start-of-today fallback
//! - Splitting `prescriptionId` into reference vs. URL

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};

use crate::models::{Appointment, DateSource, RawDocument, RawValue};

use super::dates::{resolve_date, start_of_today};
use super::{NormalizedBatch, RejectReason, Rejection};

pub const FIELD_APPOINTMENT_CODE: &str = "appointmentCode";
pub const FIELD_PATIENT_ID: &str = "patientId";
pub const FIELD_DOCTOR_ID: &str = "doctorId";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_BILLING_STATUS: &str = "billingStatus";
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_DATE: &str = "date";
pub const FIELD_DOCTORS_NOTES: &str = "doctorsNotes";
pub const FIELD_PRESCRIPTION_ID: &str = "prescriptionId";
pub const FIELD_FOLLOW_UP_REQUIRED: &str = "followUpRequired";
pub const FIELD_FOLLOW_UP_DATE: &str = "followUpDate";

/// Normalizer for raw appointment documents.
pub struct AppointmentNormalizer {
    /// Canonical field → names to try, in order
    aliases: HashMap<&'static str, Vec<String>>,
}

impl Default for AppointmentNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentNormalizer {
    /// Create a normalizer with the default field aliases.
    pub fn new() -> Self {
        Self {
            aliases: Self::default_aliases(),
        }
    }

    /// Add an alternate name for a canonical field.
    pub fn add_alias(&mut self, canonical: &'static str, alias: &str) {
        let names = self
            .aliases
            .entry(canonical)
            .or_insert_with(|| vec![canonical.to_string()]);
        if !names.iter().any(|n| n == alias) {
            names.push(alias.to_string());
        }
    }

    /// Normalize one document, or say why it was rejected.
    ///
    /// `now` supplies both the fallback date and the reporting calendar.
    pub fn normalize(
        &self,
        doc: &RawDocument,
        now: DateTime<FixedOffset>,
    ) -> Result<Appointment, RejectReason> {
        let appointment_code = self.required_str(doc, FIELD_APPOINTMENT_CODE)?;
        let patient_id = self.required_str(doc, FIELD_PATIENT_ID)?;
        let description = self.required_str(doc, FIELD_DESCRIPTION)?;
        let doctor_id = self.required_str(doc, FIELD_DOCTOR_ID)?;
        let status = self.required_str(doc, FIELD_STATUS)?;
        let billing_status = self.required_str(doc, FIELD_BILLING_STATUS)?;

        let offset = *now.offset();

        let (date, date_source) = resolve_date(self.lookup(doc, FIELD_DATE), offset)
            .unwrap_or_else(|| {
                tracing::debug!(
                    document_id = %doc.id,
                    "Unresolvable date, defaulting to start of today"
                );
                (start_of_today(now), DateSource::Defaulted)
            });

        let follow_up_required = self
            .lookup(doc, FIELD_FOLLOW_UP_REQUIRED)
            .and_then(RawValue::as_bool);
        let follow_up_date = resolve_date(self.lookup(doc, FIELD_FOLLOW_UP_DATE), offset)
            .map(|(d, _)| d)
            .or_else(|| (follow_up_required == Some(true)).then(|| start_of_today(now)));

        let (prescription_reference, prescription_url) =
            match self.optional_str(doc, FIELD_PRESCRIPTION_ID) {
                Some(value) if is_url(&value) => (None, Some(value)),
                Some(value) => (Some(value), None),
                None => (None, None),
            };

        Ok(Appointment {
            id: doc.id.clone(),
            appointment_code,
            patient_id,
            doctor_id,
            description,
            status,
            billing_status,
            amount: self.lookup(doc, FIELD_AMOUNT).and_then(RawValue::as_f64),
            date,
            date_source,
            doctors_notes: self.optional_str(doc, FIELD_DOCTORS_NOTES),
            prescription_reference,
            prescription_url,
            follow_up_required,
            follow_up_date,
        })
    }

    /// Normalize a snapshot, dropping rejected documents.
    ///
    /// A later document with an id already seen replaces the earlier one.
    pub fn normalize_batch(
        &self,
        docs: &[RawDocument],
        now: DateTime<FixedOffset>,
    ) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for doc in docs {
            match self.normalize(doc, now) {
                Ok(appointment) => match positions.get(&appointment.id) {
                    Some(&pos) => batch.appointments[pos] = appointment,
                    None => {
                        positions.insert(appointment.id.clone(), batch.appointments.len());
                        batch.appointments.push(appointment);
                    }
                },
                Err(reason) => {
                    tracing::warn!(document_id = %doc.id, %reason, "Rejected appointment document");
                    batch.rejected.push(Rejection {
                        document_id: doc.id.clone(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            accepted = batch.appointments.len(),
            rejected = batch.rejected.len(),
            "Normalized appointment snapshot"
        );
        batch
    }

    fn lookup<'d>(&self, doc: &'d RawDocument, canonical: &'static str) -> Option<&'d RawValue> {
        match self.aliases.get(canonical) {
            Some(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                doc.get_any(&names)
            }
            None => doc.get_any(&[canonical]),
        }
    }

    fn required_str(&self, doc: &RawDocument, field: &'static str) -> Result<String, RejectReason> {
        match self.lookup(doc, field) {
            None => Err(RejectReason::MissingField(field)),
            Some(RawValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(RejectReason::WrongType {
                field,
                expected: "string",
            }),
        }
    }

    fn optional_str(&self, doc: &RawDocument, field: &'static str) -> Option<String> {
        self.lookup(doc, field)
            .and_then(RawValue::as_str)
            .map(str::to_string)
    }

    /// Default field alias mappings.
    fn default_aliases() -> HashMap<&'static str, Vec<String>> {
        let mut map = HashMap::new();

        map.insert(
            FIELD_DESCRIPTION,
            vec!["description".into(), "Description".into()],
        );
        map.insert(FIELD_STATUS, vec!["status".into(), "Status".into()]);
        map.insert(
            FIELD_DOCTORS_NOTES,
            vec!["doctorsNotes".into(), "doctorNotes".into()],
        );

        map
    }
}

fn is_url(value: &str) -> bool {
    let lower = value.trim_start().to_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}
