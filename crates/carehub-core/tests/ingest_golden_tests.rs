//! Golden tests for appointment ingestion.
//!
//! Each case is a raw document as the store delivers it and the canonical
//! record (or rejection) it must normalize to.

use carehub_core::ingest::{AppointmentNormalizer, RejectReason};
use carehub_core::models::{DateSource, RawDocument};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

/// Expected outcome of one golden case.
enum Expected {
    Accepted {
        date: DateTime<Utc>,
        date_source: DateSource,
        amount: Option<f64>,
        prescription_reference: Option<&'static str>,
        prescription_url: Option<&'static str>,
    },
    Rejected(RejectReason),
}

struct GoldenCase {
    id: &'static str,
    input: serde_json::Value,
    expected: Expected,
}

fn now() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 6, 15, 45, 0)
        .unwrap()
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn base(date: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "appointmentCode": "APT-100",
        "patientId": "patient-1",
        "doctorId": "doctor-1",
        "description": "Annual physical",
        "status": "scheduled",
        "billingStatus": "pending",
        "date": date
    })
}

fn with(mut value: serde_json::Value, key: &str, field: serde_json::Value) -> serde_json::Value {
    value[key] = field;
    value
}

fn without(mut value: serde_json::Value, key: &str) -> serde_json::Value {
    if let Some(map) = value.as_object_mut() {
        map.remove(key);
    }
    value
}

fn get_golden_cases() -> Vec<GoldenCase> {
    use serde_json::json;

    vec![
        GoldenCase {
            id: "native-timestamp",
            input: base(json!({"seconds": 1709640000, "nanoseconds": 0})),
            expected: Expected::Accepted {
                date: utc(2024, 3, 5, 12, 0),
                date_source: DateSource::Timestamp,
                amount: None,
                prescription_reference: None,
                prescription_url: None,
            },
        },
        GoldenCase {
            id: "serialized-timestamp-underscored",
            input: base(json!({"_seconds": 1709640000, "_nanoseconds": 0})),
            expected: Expected::Accepted {
                date: utc(2024, 3, 5, 12, 0),
                date_source: DateSource::Timestamp,
                amount: None,
                prescription_reference: None,
                prescription_url: None,
            },
        },
        GoldenCase {
            id: "detailed-text-with-offset",
            input: base(json!("5 Mar 2024 at 14:30:00 UTC+0100")),
            expected: Expected::Accepted {
                date: utc(2024, 3, 5, 13, 30),
                date_source: DateSource::DetailedText,
                amount: None,
                prescription_reference: None,
                prescription_url: None,
            },
        },
        GoldenCase {
            id: "day-only-text",
            input: base(json!("12 Feb 2024")),
            expected: Expected::Accepted {
                date: utc(2024, 2, 12, 0, 0),
                date_source: DateSource::DayText,
                amount: None,
                prescription_reference: None,
                prescription_url: None,
            },
        },
        GoldenCase {
            id: "day-only-text-full-month",
            input: base(json!("5 March 2024")),
            expected: Expected::Accepted {
                date: utc(2024, 3, 5, 0, 0),
                date_source: DateSource::DayText,
                amount: None,
                prescription_reference: None,
                prescription_url: None,
            },
        },
        GoldenCase {
            id: "unparseable-date-defaults-to-today",
            input: base(json!("next tuesday-ish")),
            expected: Expected::Accepted {
                date: utc(2024, 3, 6, 0, 0),
                date_source: DateSource::Defaulted,
                amount: None,
                prescription_reference: None,
                prescription_url: None,
            },
        },
        GoldenCase {
            id: "missing-date-defaults-to-today",
            input: without(base(json!(null)), "date"),
            expected: Expected::Accepted {
                date: utc(2024, 3, 6, 0, 0),
                date_source: DateSource::Defaulted,
                amount: None,
                prescription_reference: None,
                prescription_url: None,
            },
        },
        GoldenCase {
            id: "amount-and-prescription-reference",
            input: with(
                with(base(json!("1 Mar 2024")), "amount", json!(250.75)),
                "prescriptionId",
                json!("RX-2024-0042"),
            ),
            expected: Expected::Accepted {
                date: utc(2024, 3, 1, 0, 0),
                date_source: DateSource::DayText,
                amount: Some(250.75),
                prescription_reference: Some("RX-2024-0042"),
                prescription_url: None,
            },
        },
        GoldenCase {
            id: "prescription-url",
            input: with(
                base(json!("1 Mar 2024")),
                "prescriptionId",
                json!("https://storage.example.com/rx/42.pdf"),
            ),
            expected: Expected::Accepted {
                date: utc(2024, 3, 1, 0, 0),
                date_source: DateSource::DayText,
                amount: None,
                prescription_reference: None,
                prescription_url: Some("https://storage.example.com/rx/42.pdf"),
            },
        },
        GoldenCase {
            id: "capitalized-description-alias",
            input: with(
                without(base(json!("1 Mar 2024")), "description"),
                "Description",
                json!("Migraine"),
            ),
            expected: Expected::Accepted {
                date: utc(2024, 3, 1, 0, 0),
                date_source: DateSource::DayText,
                amount: None,
                prescription_reference: None,
                prescription_url: None,
            },
        },
        GoldenCase {
            id: "missing-appointment-code",
            input: without(base(json!("1 Mar 2024")), "appointmentCode"),
            expected: Expected::Rejected(RejectReason::MissingField("appointmentCode")),
        },
        GoldenCase {
            id: "missing-billing-status",
            input: without(base(json!("1 Mar 2024")), "billingStatus"),
            expected: Expected::Rejected(RejectReason::MissingField("billingStatus")),
        },
        GoldenCase {
            id: "null-doctor-id",
            input: with(base(json!("1 Mar 2024")), "doctorId", json!(null)),
            expected: Expected::Rejected(RejectReason::MissingField("doctorId")),
        },
        GoldenCase {
            id: "numeric-patient-id",
            input: with(base(json!("1 Mar 2024")), "patientId", json!(12345)),
            expected: Expected::Rejected(RejectReason::WrongType {
                field: "patientId",
                expected: "string",
            }),
        },
    ]
}

#[test]
fn test_golden_cases() {
    let normalizer = AppointmentNormalizer::new();

    for case in get_golden_cases() {
        let envelope = serde_json::json!({ "id": case.id, "data": case.input });
        let doc = RawDocument::from_json_value(envelope).unwrap();
        let result = normalizer.normalize(&doc, now());

        match (result, case.expected) {
            (
                Ok(appointment),
                Expected::Accepted {
                    date,
                    date_source,
                    amount,
                    prescription_reference,
                    prescription_url,
                },
            ) => {
                assert_eq!(appointment.id, case.id, "Case {}: id mismatch", case.id);
                assert_eq!(appointment.date, date, "Case {}: date mismatch", case.id);
                assert_eq!(
                    appointment.date_source, date_source,
                    "Case {}: date source mismatch", case.id
                );
                assert_eq!(appointment.amount, amount, "Case {}: amount mismatch", case.id);
                assert_eq!(
                    appointment.prescription_reference.as_deref(),
                    prescription_reference,
                    "Case {}: prescription reference mismatch",
                    case.id
                );
                assert_eq!(
                    appointment.prescription_url.as_deref(),
                    prescription_url,
                    "Case {}: prescription url mismatch",
                    case.id
                );
            }
            (Err(reason), Expected::Rejected(expected)) => {
                assert_eq!(reason, expected, "Case {}: reject reason mismatch", case.id);
            }
            (Ok(_), Expected::Rejected(expected)) => {
                panic!("Case {}: expected rejection ({}), got appointment", case.id, expected)
            }
            (Err(reason), Expected::Accepted { .. }) => {
                panic!("Case {}: unexpected rejection: {}", case.id, reason)
            }
        }
    }
}

#[test]
fn test_batch_counts_match_golden_cases() {
    let normalizer = AppointmentNormalizer::new();
    let cases = get_golden_cases();

    let docs: Vec<RawDocument> = cases
        .iter()
        .map(|case| {
            RawDocument::from_json_value(serde_json::json!({ "id": case.id, "data": case.input }))
                .unwrap()
        })
        .collect();
    let expected_rejections = cases
        .iter()
        .filter(|case| matches!(case.expected, Expected::Rejected(_)))
        .count();

    let batch = normalizer.normalize_batch(&docs, now());
    assert_eq!(batch.rejected.len(), expected_rejections);
    assert_eq!(batch.appointments.len(), docs.len() - expected_rejections);
    assert_eq!(batch.defaulted_date_count(), 2);
}

#[test]
fn test_snapshot_json_with_flat_and_enveloped_documents() {
    let json = r#"[
        {"id": "flat-1", "appointmentCode": "APT-1", "patientId": "p", "doctorId": "d",
         "description": "Cough", "status": "Completed", "billingStatus": "paid",
         "amount": 80, "date": "4 Mar 2024"},
        {"id": "env-1", "data": {"appointmentCode": "APT-2", "patientId": "p", "doctorId": "d",
         "description": "Rash", "status": "scheduled", "billingStatus": "pending",
         "date": "7 Mar 2024 at 09:15:00 UTC+0000"}},
        {"data": {"appointmentCode": "APT-3"}},
        "not an object"
    ]"#;

    let docs = RawDocument::parse_batch(json).unwrap();
    assert_eq!(docs.len(), 2);

    let batch = AppointmentNormalizer::new().normalize_batch(&docs, now());
    assert_eq!(batch.appointments.len(), 2);
    assert_eq!(batch.appointments[0].amount, Some(80.0));
    assert_eq!(batch.appointments[0].canonical_status(), "completed");
    assert_eq!(batch.appointments[1].date, utc(2024, 3, 7, 9, 15));
}
