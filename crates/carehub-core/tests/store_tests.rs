//! On-disk snapshot store tests.

use carehub_core::db::{Database, UpsertOutcome};
use carehub_core::models::{Appointment, ReportScope};
use carehub_core::report::ReportEngine;
use carehub_core::{open_store, FfiSession};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use tempfile::tempdir;

fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(-5 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 3, day, hour, 0, 0)
        .unwrap()
}

fn make_appointment(id: &str, doctor: &str, day: u32) -> Appointment {
    let mut a = Appointment::new(
        "patient-1".into(),
        doctor.into(),
        "Consultation".into(),
        at(day, 10),
    );
    a.id = id.into();
    a
}

#[test]
fn test_store_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("carehub.db");

    {
        let mut db = Database::open(&path).unwrap();
        let summary = db
            .merge_snapshot(
                &[make_appointment("a", "d1", 4), make_appointment("b", "d2", 5)],
                None,
            )
            .unwrap();
        assert_eq!(summary.inserted, 2);
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.count_appointments().unwrap(), 2);

    let stored = db.get_appointment("a").unwrap().unwrap();
    assert_eq!(stored.date, at(4, 10));
    // offset survives the round trip
    assert_eq!(stored.date.offset().local_minus_utc(), -5 * 3600);
    assert_eq!(db.upsert_appointment(&stored).unwrap(), UpsertOutcome::Unchanged);
}

#[test]
fn test_report_over_stored_snapshot() {
    let dir = tempdir().unwrap();
    let mut db = Database::open(dir.path().join("report.db")).unwrap();

    let mut paid = make_appointment("a", "d1", 4);
    paid.billing_status = "paid".into();
    paid.amount = Some(120.0);
    let mut cancelled = make_appointment("b", "d1", 5);
    cancelled.billing_status = "cancelled".into();
    db.merge_snapshot(&[paid, cancelled, make_appointment("c", "d2", 6)], None)
        .unwrap();

    let engine = ReportEngine::default();
    let now = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
    let report = engine.build_report(
        db.list_for_doctor("d1").unwrap(),
        &ReportScope::Doctor("d1".into()),
        now,
        0,
    );

    assert_eq!(report.statistics.total_appointments, 2);
    assert_eq!(report.statistics.cancellation_rate, 50.0);
    assert_eq!(report.statistics.total_revenue, 120.0);
    assert_eq!(report.daily.total(), 2);
}

#[test]
fn test_ffi_store_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ffi.db").to_string_lossy().to_string();
    let admin = || FfiSession {
        user_id: "admin".into(),
        role: "admin".into(),
    };
    let snapshot = serde_json::json!([{
        "id": "x1",
        "appointmentCode": "APT-X1",
        "patientId": "p",
        "doctorId": "d",
        "description": "Review",
        "status": "scheduled",
        "billingStatus": "pending",
        "date": "6 Mar 2024 at 16:00:00 UTC+0000"
    }])
    .to_string();

    {
        let core = open_store(path.clone()).unwrap();
        let summary = core
            .ingest_snapshot(snapshot, admin(), Some("2024-03-06T12:00:00Z".into()))
            .unwrap();
        assert_eq!(summary.inserted, 1);
    }

    let core = open_store(path).unwrap();
    let upcoming = core
        .list_upcoming(admin(), Some("2024-03-06T12:00:00Z".into()))
        .unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].appointment_code, "APT-X1");
    assert!(!upcoming[0].date_defaulted);

    let json = core
        .export_report_json(admin(), Some("2024-03-06T12:00:00Z".into()))
        .unwrap();
    assert!(json.contains("\"appointment_count\": 1"));
}
