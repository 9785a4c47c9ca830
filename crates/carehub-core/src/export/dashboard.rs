//! Dashboard report export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{APP_NAME, APP_VERSION};
use crate::models::{BucketSeries, DashboardReport, ReportScope};

/// A report ready to leave the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardExport {
    pub metadata: ExportMetadata,
    pub report: DashboardReport,
}

/// Export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Producing application
    pub generator: String,
    pub generator_version: String,
    /// Export timestamp (RFC 3339)
    pub exported_at: String,
    /// Reference instant of the report (RFC 3339, reporting calendar)
    pub report_generated_at: String,
    /// Whose appointments the report covers
    pub scope: String,
    pub appointment_count: usize,
}

impl DashboardExport {
    /// Wrap a report for export.
    pub fn new(report: DashboardReport, exported_at: DateTime<Utc>) -> Self {
        Self {
            metadata: ExportMetadata {
                generator: APP_NAME.to_string(),
                generator_version: APP_VERSION.to_string(),
                exported_at: exported_at.to_rfc3339(),
                report_generated_at: report.generated_at.to_rfc3339(),
                scope: describe_scope(&report.scope),
                appointment_count: report.appointments.len(),
            },
            report,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Daily, weekly and monthly series as one CSV table.
    pub fn series_to_csv(&self) -> String {
        let mut csv = String::from("series,period_start,count\n");
        for series in [&self.report.daily, &self.report.weekly, &self.report.monthly] {
            push_series_rows(&mut csv, series);
        }
        csv
    }

    /// Appointments in the report as CSV.
    pub fn appointments_to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("id,appointment_code,date,patient_id,doctor_id,description,");
        csv.push_str("status,billing_status,amount,date_source\n");

        for a in &self.report.appointments {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}\n",
                escape_csv(&a.id),
                escape_csv(&a.appointment_code),
                a.date.to_rfc3339(),
                escape_csv(&a.patient_id),
                escape_csv(&a.doctor_id),
                escape_csv(&a.description),
                escape_csv(&a.status),
                escape_csv(&a.billing_status),
                a.amount.map(|v| v.to_string()).unwrap_or_default(),
                a.date_source.as_str(),
            ));
        }

        csv
    }
}

/// A single series as CSV, with the same header as [`DashboardExport::series_to_csv`].
pub fn series_to_csv(series: &BucketSeries) -> String {
    let mut csv = String::from("series,period_start,count\n");
    push_series_rows(&mut csv, series);
    csv
}

fn push_series_rows(csv: &mut String, series: &BucketSeries) {
    for bucket in &series.buckets {
        csv.push_str(&format!(
            "{},{},{}\n",
            series.granularity.as_str(),
            bucket.period_start.format("%Y-%m-%d"),
            bucket.count
        ));
    }
}

fn describe_scope(scope: &ReportScope) -> String {
    match scope {
        ReportScope::All => "all".to_string(),
        ReportScope::Doctor(id) => format!("doctor:{}", id),
        ReportScope::Patient(id) => format!("patient:{}", id),
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
