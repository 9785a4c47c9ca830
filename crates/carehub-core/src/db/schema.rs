//! SQLite schema definition.

/// Complete database schema for the local appointment snapshot.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Appointments (normalized snapshot, keyed by store document id)
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,                         -- store document id (merge key)
    appointment_code TEXT NOT NULL,
    patient_id TEXT NOT NULL,
    doctor_id TEXT NOT NULL,
    description TEXT NOT NULL,
    status TEXT NOT NULL,
    billing_status TEXT NOT NULL,
    amount REAL,
    date TEXT NOT NULL,                          -- RFC 3339 with offset
    date_source TEXT NOT NULL
        CHECK (date_source IN ('timestamp', 'detailed_text', 'day_text', 'defaulted')),
    doctors_notes TEXT,
    prescription_reference TEXT,
    prescription_url TEXT,
    follow_up_required INTEGER,
    follow_up_date TEXT,
    content_hash TEXT NOT NULL,                  -- SHA-256 of canonical JSON
    synced_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments(doctor_id);
CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(date);
"#;
