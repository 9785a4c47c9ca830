//! CareHub Core Library
//!
//! Appointment aggregation and reporting engine for the CareHub mobile apps.
//!
//! # Architecture
//!
//! ```text
//! Document store (appointments, doctors, admins)
//!            │  live snapshots / one-shot fetches
//!            ▼
//!      RawDocument ──► AppointmentNormalizer ──► rejected (logged, counted)
//!            │
//!            ▼
//!       Appointment ──► [Local snapshot store, keyed by id]
//!            │
//!      ReportScope (from the signed-in Session)
//!            │
//!            ├──────────────────┬──────────────────┐
//!            ▼                  ▼                  ▼
//!     Day / Week / Month   AggregateStatistics   Upcoming
//!        BucketSeries                            appointments
//!            │                  │
//!            └────────┬─────────┘
//!                     ▼
//!              DashboardReport ──► JSON / CSV export
//! ```
//!
//! # Modules
//!
//! - [`config`]: Reporting calendar and lookback configuration
//! - [`models`]: Raw documents, appointments, sessions, report values
//! - [`ingest`]: Normalization of raw documents into canonical records
//! - [`report`]: Temporal bucketing and aggregate statistics
//! - [`fetch`]: Concurrent collection fetches against a document source
//! - [`db`]: SQLite snapshot store
//! - [`export`]: Report export

pub mod config;
pub mod db;
pub mod export;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod report;

// Re-export commonly used types
pub use config::ReportConfig;
pub use db::{Database, MergeSummary, UpsertOutcome};
pub use export::DashboardExport;
pub use fetch::{AppointmentPipeline, DocumentSource};
pub use ingest::{AppointmentNormalizer, NormalizedBatch, RejectReason};
pub use models::{
    AggregateStatistics, Appointment, BucketSeries, DashboardReport, DateSource, Granularity,
    RawDocument, RawValue, ReportScope, Role, Session,
};
pub use report::ReportEngine;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CareHubError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for CareHubError {
    fn from(e: db::DbError) -> Self {
        CareHubError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for CareHubError {
    fn from(e: serde_json::Error) -> Self {
        CareHubError::SerializationError(e.to_string())
    }
}

impl From<models::RawDocumentError> for CareHubError {
    fn from(e: models::RawDocumentError) -> Self {
        CareHubError::InvalidInput(e.to_string())
    }
}

impl From<config::ConfigError> for CareHubError {
    fn from(e: config::ConfigError) -> Self {
        CareHubError::ConfigError(e.to_string())
    }
}

impl From<fetch::FetchError> for CareHubError {
    fn from(e: fetch::FetchError) -> Self {
        CareHubError::FetchError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for CareHubError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CareHubError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the log subscriber. `RUST_LOG` wins over `filter`.
///
/// Calling this more than once is harmless.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) {
    use tracing_subscriber::EnvFilter;

    let fallback = filter.unwrap_or_else(|| config::DEFAULT_LOG_FILTER.to_string());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            app = config::APP_NAME,
            version = config::APP_VERSION,
            "Logging initialized"
        );
    }
}

/// Open or create a store at the given path with the default configuration.
#[uniffi::export]
pub fn open_store(path: String) -> Result<Arc<CareHubCore>, CareHubError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(CareHubCore::new(db, ReportConfig::default())))
}

/// Open or create a store with a JSON reporting configuration.
#[uniffi::export]
pub fn open_store_with_config(
    path: String,
    config_json: String,
) -> Result<Arc<CareHubCore>, CareHubError> {
    let config = ReportConfig::from_json(&config_json)?;
    let db = Database::open(&path)?;
    Ok(Arc::new(CareHubCore::new(db, config)))
}

/// Create an in-memory store (for testing).
#[uniffi::export]
pub fn open_store_in_memory() -> Result<Arc<CareHubCore>, CareHubError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(CareHubCore::new(db, ReportConfig::default())))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe store and report engine for FFI.
#[derive(uniffi::Object)]
pub struct CareHubCore {
    db: Arc<Mutex<Database>>,
    engine: ReportEngine,
}

impl CareHubCore {
    fn new(db: Database, config: ReportConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            engine: ReportEngine::new(config),
        }
    }

    fn report_for(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<DashboardReport, CareHubError> {
        let appointments = {
            let db = self.db.lock()?;
            db.list_appointments()?
        };
        Ok(self
            .engine
            .build_report(appointments, &session.scope(), now, 0))
    }
}

#[uniffi::export]
impl CareHubCore {
    // =========================================================================
    // Snapshot Operations
    // =========================================================================

    /// Normalize a listener snapshot (JSON array of documents) and merge it
    /// into the store. The snapshot is taken as complete for the session's
    /// scope, so stored appointments in that scope but missing from it are
    /// removed.
    pub fn ingest_snapshot(
        &self,
        snapshot_json: String,
        session: FfiSession,
        now_rfc3339: Option<String>,
    ) -> Result<FfiIngestSummary, CareHubError> {
        let session: Session = session.try_into()?;
        let now = parse_now(now_rfc3339)?;

        let docs = RawDocument::parse_batch(&snapshot_json)?;
        let batch = self.engine.normalize_batch(&docs, now);
        let scope = session.scope();
        let appointments = scope.apply(batch.appointments);

        let merge = {
            let mut db = self.db.lock()?;
            db.merge_snapshot(&appointments, Some(&scope))?
        };

        Ok(FfiIngestSummary {
            received: count_u32(docs.len()),
            accepted: count_u32(appointments.len()),
            rejected: count_u32(batch.rejected.len()),
            defaulted_dates: count_u32(
                appointments
                    .iter()
                    .filter(|a| a.has_defaulted_date())
                    .count(),
            ),
            inserted: count_u32(merge.inserted),
            updated: count_u32(merge.updated),
            unchanged: count_u32(merge.unchanged),
            removed: count_u32(merge.removed),
        })
    }

    /// Remove a single appointment from the store.
    pub fn remove_appointment(&self, id: String) -> Result<bool, CareHubError> {
        let db = self.db.lock()?;
        Ok(db.remove_appointment(&id)?)
    }

    /// Get a stored appointment by id.
    pub fn get_appointment(&self, id: String) -> Result<Option<FfiAppointment>, CareHubError> {
        let db = self.db.lock()?;
        let appointment = db.get_appointment(&id)?;
        Ok(appointment.map(|a| a.into()))
    }

    // =========================================================================
    // Report Operations
    // =========================================================================

    /// Build the dashboard report over stored appointments.
    pub fn build_report(
        &self,
        session: FfiSession,
        now_rfc3339: Option<String>,
    ) -> Result<FfiReport, CareHubError> {
        let session: Session = session.try_into()?;
        let report = self.report_for(&session, parse_now(now_rfc3339)?)?;
        Ok(report.into())
    }

    /// Scheduled appointments from today onward, soonest first.
    pub fn list_upcoming(
        &self,
        session: FfiSession,
        now_rfc3339: Option<String>,
    ) -> Result<Vec<FfiAppointment>, CareHubError> {
        let session: Session = session.try_into()?;
        let now = parse_now(now_rfc3339)?;

        let appointments = {
            let db = self.db.lock()?;
            db.list_appointments()?
        };
        let scoped = session.scope().apply(appointments);

        Ok(self
            .engine
            .upcoming(&scoped, now)
            .into_iter()
            .map(|a| a.into())
            .collect())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export the dashboard report as JSON.
    pub fn export_report_json(
        &self,
        session: FfiSession,
        now_rfc3339: Option<String>,
    ) -> Result<String, CareHubError> {
        let session: Session = session.try_into()?;
        let report = self.report_for(&session, parse_now(now_rfc3339)?)?;
        Ok(DashboardExport::new(report, Utc::now()).to_json()?)
    }

    /// Export the day, week and month series as CSV.
    pub fn export_series_csv(
        &self,
        session: FfiSession,
        now_rfc3339: Option<String>,
    ) -> Result<String, CareHubError> {
        let session: Session = session.try_into()?;
        let report = self.report_for(&session, parse_now(now_rfc3339)?)?;
        Ok(DashboardExport::new(report, Utc::now()).series_to_csv())
    }

    /// Export the scoped appointments as CSV.
    pub fn export_appointments_csv(
        &self,
        session: FfiSession,
        now_rfc3339: Option<String>,
    ) -> Result<String, CareHubError> {
        let session: Session = session.try_into()?;
        let report = self.report_for(&session, parse_now(now_rfc3339)?)?;
        Ok(DashboardExport::new(report, Utc::now()).appointments_to_csv())
    }
}

/// Reference instant from an RFC 3339 string, or the wall clock.
fn parse_now(now_rfc3339: Option<String>) -> Result<DateTime<Utc>, CareHubError> {
    match now_rfc3339 {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CareHubError::InvalidInput(format!("Bad timestamp {:?}: {}", s, e))),
        None => Ok(Utc::now()),
    }
}

/// Counts cross the FFI as `u32`, saturating.
fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe session.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub user_id: String,
    /// "admin", "doctor" or "patient"
    pub role: String,
}

impl TryFrom<FfiSession> for Session {
    type Error = CareHubError;

    fn try_from(session: FfiSession) -> Result<Self, Self::Error> {
        let role = Role::parse(&session.role)
            .ok_or_else(|| CareHubError::InvalidInput(format!("Unknown role: {}", session.role)))?;
        Ok(Session::new(session.user_id, role))
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub appointment_code: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub description: String,
    pub status: String,
    pub billing_status: String,
    pub amount: Option<f64>,
    /// RFC 3339
    pub date: String,
    /// True when no usable date was stored and today was substituted
    pub date_defaulted: bool,
    pub doctors_notes: Option<String>,
    pub prescription_reference: Option<String>,
    pub prescription_url: Option<String>,
    pub follow_up_required: Option<bool>,
    pub follow_up_date: Option<String>,
}

impl From<Appointment> for FfiAppointment {
    fn from(a: Appointment) -> Self {
        Self {
            date: a.date.to_rfc3339(),
            date_defaulted: a.has_defaulted_date(),
            follow_up_date: a.follow_up_date.map(|d| d.to_rfc3339()),
            id: a.id,
            appointment_code: a.appointment_code,
            patient_id: a.patient_id,
            doctor_id: a.doctor_id,
            description: a.description,
            status: a.status,
            billing_status: a.billing_status,
            amount: a.amount,
            doctors_notes: a.doctors_notes,
            prescription_reference: a.prescription_reference,
            prescription_url: a.prescription_url,
            follow_up_required: a.follow_up_required,
        }
    }
}

/// FFI-safe period bucket.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBucket {
    /// YYYY-MM-DD
    pub period_start: String,
    pub count: u32,
}

fn buckets(series: &BucketSeries) -> Vec<FfiBucket> {
    series
        .buckets
        .iter()
        .map(|b| FfiBucket {
            period_start: b.period_start.format("%Y-%m-%d").to_string(),
            count: count_u32(b.count),
        })
        .collect()
}

/// FFI-safe histogram entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHistogramEntry {
    pub key: String,
    pub count: u32,
}

/// FFI-safe statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStatistics {
    pub total_appointments: u32,
    pub cancellation_rate: f64,
    pub total_revenue: f64,
    pub average_revenue_per_appointment: f64,
    pub status_histogram: Vec<FfiHistogramEntry>,
    pub billing_histogram: Vec<FfiHistogramEntry>,
}

impl From<AggregateStatistics> for FfiStatistics {
    fn from(stats: AggregateStatistics) -> Self {
        type Histogram = std::collections::BTreeMap<String, usize>;
        let entries = |histogram: Histogram| -> Vec<FfiHistogramEntry> {
            histogram
                .into_iter()
                .map(|(key, count)| FfiHistogramEntry {
                    key,
                    count: count_u32(count),
                })
                .collect()
        };
        Self {
            total_appointments: count_u32(stats.total_appointments),
            cancellation_rate: stats.cancellation_rate,
            total_revenue: stats.total_revenue,
            average_revenue_per_appointment: stats.average_revenue_per_appointment,
            status_histogram: entries(stats.status_histogram),
            billing_histogram: entries(stats.billing_histogram),
        }
    }
}

/// FFI-safe dashboard report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReport {
    /// RFC 3339, reporting calendar
    pub generated_at: String,
    pub statistics: FfiStatistics,
    pub daily: Vec<FfiBucket>,
    pub weekly: Vec<FfiBucket>,
    pub monthly: Vec<FfiBucket>,
    pub appointments: Vec<FfiAppointment>,
    pub defaulted_date_count: u32,
}

impl From<DashboardReport> for FfiReport {
    fn from(report: DashboardReport) -> Self {
        Self {
            generated_at: report.generated_at.to_rfc3339(),
            daily: buckets(&report.daily),
            weekly: buckets(&report.weekly),
            monthly: buckets(&report.monthly),
            statistics: report.statistics.into(),
            appointments: report.appointments.into_iter().map(|a| a.into()).collect(),
            defaulted_date_count: count_u32(report.defaulted_date_count),
        }
    }
}

/// FFI-safe snapshot ingestion summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIngestSummary {
    /// Documents in the snapshot
    pub received: u32,
    /// Normalized appointments inside the session scope
    pub accepted: u32,
    pub rejected: u32,
    pub defaulted_dates: u32,
    pub inserted: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub removed: u32,
}
