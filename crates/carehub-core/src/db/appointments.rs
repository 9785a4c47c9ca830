//! Appointment snapshot operations.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Appointment, DateSource, ReportScope};

const SELECT_COLUMNS: &str = r#"
    id, appointment_code, patient_id, doctor_id, description, status,
    billing_status, amount, date, date_source, doctors_notes,
    prescription_reference, prescription_url, follow_up_required, follow_up_date
"#;

/// What an upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Stored content hash already matched
    Unchanged,
}

/// Counts from merging one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl MergeSummary {
    /// True if the merge changed any stored row.
    pub fn has_changes(&self) -> bool {
        self.inserted + self.updated + self.removed > 0
    }
}

impl Database {
    /// Insert or update an appointment by id.
    pub fn upsert_appointment(&self, appointment: &Appointment) -> DbResult<UpsertOutcome> {
        upsert(&self.conn, appointment)
    }

    /// Merge a listener snapshot in one transaction.
    ///
    /// With `prune`, stored appointments inside that scope but absent from the
    /// snapshot are removed. A listener snapshot is complete for the scope it
    /// was queried with, and only for that scope.
    pub fn merge_snapshot(
        &mut self,
        appointments: &[Appointment],
        prune: Option<&ReportScope>,
    ) -> DbResult<MergeSummary> {
        let tx = self.conn.transaction()?;
        let mut summary = MergeSummary::default();

        for appointment in appointments {
            match upsert(&tx, appointment)? {
                UpsertOutcome::Inserted => summary.inserted += 1,
                UpsertOutcome::Updated => summary.updated += 1,
                UpsertOutcome::Unchanged => summary.unchanged += 1,
            }
        }

        if let Some(scope) = prune {
            let keep: HashSet<&str> = appointments.iter().map(|a| a.id.as_str()).collect();
            let stored = ids_in_scope(&tx, scope)?;
            for id in stored.iter().filter(|id| !keep.contains(id.as_str())) {
                summary.removed += tx.execute("DELETE FROM appointments WHERE id = ?1", [id])?;
            }
        }

        tx.commit()?;
        tracing::debug!(?summary, "Merged appointment snapshot");
        Ok(summary)
    }

    /// Remove an appointment. Returns whether a row was deleted.
    pub fn remove_appointment(&self, id: &str) -> DbResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Get an appointment by id.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM appointments WHERE id = ?1", SELECT_COLUMNS),
                [id],
                AppointmentRow::from_row,
            )
            .optional()?
            .map(Appointment::try_from)
            .transpose()
    }

    /// All stored appointments, ascending by date.
    pub fn list_appointments(&self) -> DbResult<Vec<Appointment>> {
        self.query_appointments(&format!("SELECT {} FROM appointments", SELECT_COLUMNS), None)
    }

    /// Appointments for one patient, ascending by date.
    pub fn list_for_patient(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        self.query_appointments(
            &format!("SELECT {} FROM appointments WHERE patient_id = ?1", SELECT_COLUMNS),
            Some(patient_id),
        )
    }

    /// Appointments for one doctor, ascending by date.
    pub fn list_for_doctor(&self, doctor_id: &str) -> DbResult<Vec<Appointment>> {
        self.query_appointments(
            &format!("SELECT {} FROM appointments WHERE doctor_id = ?1", SELECT_COLUMNS),
            Some(doctor_id),
        )
    }

    /// Number of stored appointments.
    pub fn count_appointments(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn query_appointments(&self, sql: &str, param: Option<&str>) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(param), AppointmentRow::from_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(Appointment::try_from(row?)?);
        }

        // Offsets may differ between rows, so order by instant rather than text
        appointments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(appointments)
    }
}

fn ids_in_scope(conn: &Connection, scope: &ReportScope) -> DbResult<Vec<String>> {
    let (sql, param) = match scope {
        ReportScope::All => ("SELECT id FROM appointments", None),
        ReportScope::Doctor(id) => ("SELECT id FROM appointments WHERE doctor_id = ?1", Some(id)),
        ReportScope::Patient(id) => ("SELECT id FROM appointments WHERE patient_id = ?1", Some(id)),
    };

    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params_from_iter(param), |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn upsert(conn: &Connection, appointment: &Appointment) -> DbResult<UpsertOutcome> {
    let hash = appointment.content_hash()?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT content_hash FROM appointments WHERE id = ?1",
            [&appointment.id],
            |row| row.get(0),
        )
        .optional()?;

    if existing.as_deref() == Some(hash.as_str()) {
        return Ok(UpsertOutcome::Unchanged);
    }

    conn.execute(
        r#"
        INSERT INTO appointments (
            id, appointment_code, patient_id, doctor_id, description, status,
            billing_status, amount, date, date_source, doctors_notes,
            prescription_reference, prescription_url, follow_up_required,
            follow_up_date, content_hash
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        ON CONFLICT(id) DO UPDATE SET
            appointment_code = excluded.appointment_code,
            patient_id = excluded.patient_id,
            doctor_id = excluded.doctor_id,
            description = excluded.description,
            status = excluded.status,
            billing_status = excluded.billing_status,
            amount = excluded.amount,
            date = excluded.date,
            date_source = excluded.date_source,
            doctors_notes = excluded.doctors_notes,
            prescription_reference = excluded.prescription_reference,
            prescription_url = excluded.prescription_url,
            follow_up_required = excluded.follow_up_required,
            follow_up_date = excluded.follow_up_date,
            content_hash = excluded.content_hash,
            synced_at = datetime('now')
        "#,
        params![
            appointment.id,
            appointment.appointment_code,
            appointment.patient_id,
            appointment.doctor_id,
            appointment.description,
            appointment.status,
            appointment.billing_status,
            appointment.amount,
            appointment.date.to_rfc3339(),
            appointment.date_source.as_str(),
            appointment.doctors_notes,
            appointment.prescription_reference,
            appointment.prescription_url,
            appointment.follow_up_required,
            appointment.follow_up_date.map(|d| d.to_rfc3339()),
            hash,
        ],
    )?;

    Ok(if existing.is_some() {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Inserted
    })
}

/// Internal row type for database mapping.
struct AppointmentRow {
    id: String,
    appointment_code: String,
    patient_id: String,
    doctor_id: String,
    description: String,
    status: String,
    billing_status: String,
    amount: Option<f64>,
    date: String,
    date_source: String,
    doctors_notes: Option<String>,
    prescription_reference: Option<String>,
    prescription_url: Option<String>,
    follow_up_required: Option<bool>,
    follow_up_date: Option<String>,
}

impl AppointmentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            appointment_code: row.get(1)?,
            patient_id: row.get(2)?,
            doctor_id: row.get(3)?,
            description: row.get(4)?,
            status: row.get(5)?,
            billing_status: row.get(6)?,
            amount: row.get(7)?,
            date: row.get(8)?,
            date_source: row.get(9)?,
            doctors_notes: row.get(10)?,
            prescription_reference: row.get(11)?,
            prescription_url: row.get(12)?,
            follow_up_required: row.get(13)?,
            follow_up_date: row.get(14)?,
        })
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let corrupt = |message: String| DbError::CorruptRow {
            id: row.id.clone(),
            message,
        };

        let date = parse_stored_date(&row.date).map_err(&corrupt)?;
        let date_source = DateSource::from_str(&row.date_source)
            .ok_or_else(|| corrupt(format!("unknown date source: {}", row.date_source)))?;
        let follow_up_date = row
            .follow_up_date
            .as_deref()
            .map(parse_stored_date)
            .transpose()
            .map_err(&corrupt)?;

        Ok(Appointment {
            id: row.id,
            appointment_code: row.appointment_code,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            description: row.description,
            status: row.status,
            billing_status: row.billing_status,
            amount: row.amount,
            date,
            date_source,
            doctors_notes: row.doctors_notes,
            prescription_reference: row.prescription_reference,
            prescription_url: row.prescription_url,
            follow_up_required: row.follow_up_required,
            follow_up_date,
        })
    }
}

fn parse_stored_date(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("bad date {:?}: {}", s, e))
}
