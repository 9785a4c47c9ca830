//! Dashboard reporting.
//!
//! Pipeline: raw documents → normalization → scope → {buckets, statistics}

mod buckets;
mod statistics;

pub use buckets::*;
pub use statistics::*;

use chrono::{DateTime, FixedOffset, Utc};

use crate::config::ReportConfig;
use crate::ingest::{dates::start_of_today, AppointmentNormalizer, NormalizedBatch};
use crate::models::{
    AggregateStatistics, Appointment, BucketSeries, DashboardReport, RawDocument, ReportScope,
};

/// Coordinates normalization and aggregation for one reporting calendar.
///
/// Stateless apart from configuration; every call is a pure function of its
/// inputs and the supplied instant.
pub struct ReportEngine {
    config: ReportConfig,
    normalizer: AppointmentNormalizer,
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new(ReportConfig::default())
    }
}

impl ReportEngine {
    /// Create a new engine.
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            normalizer: AppointmentNormalizer::new(),
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Get the normalizer for direct access.
    pub fn normalizer(&self) -> &AppointmentNormalizer {
        &self.normalizer
    }

    /// Get the normalizer for alias customization.
    pub fn normalizer_mut(&mut self) -> &mut AppointmentNormalizer {
        &mut self.normalizer
    }

    fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        self.config.local_now(now)
    }

    /// Normalize a raw snapshot.
    pub fn normalize_batch(&self, docs: &[RawDocument], now: DateTime<Utc>) -> NormalizedBatch {
        self.normalizer.normalize_batch(docs, self.local(now))
    }

    pub fn daily_series(&self, appointments: &[Appointment], now: DateTime<Utc>) -> BucketSeries {
        daily_series(appointments, self.local(now))
    }

    pub fn weekly_series(&self, appointments: &[Appointment], now: DateTime<Utc>) -> BucketSeries {
        weekly_series(appointments, self.local(now), self.config.weekly_lookback_weeks)
    }

    pub fn monthly_series(&self, appointments: &[Appointment], now: DateTime<Utc>) -> BucketSeries {
        monthly_series(appointments, self.local(now), self.config.monthly_lookback_months)
    }

    pub fn statistics(&self, appointments: &[Appointment]) -> AggregateStatistics {
        aggregate(appointments)
    }

    /// Build a full report over already-normalized appointments.
    pub fn build_report(
        &self,
        appointments: Vec<Appointment>,
        scope: &ReportScope,
        now: DateTime<Utc>,
        rejected_count: usize,
    ) -> DashboardReport {
        let mut appointments = scope.apply(appointments);
        appointments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        let defaulted_date_count = appointments.iter().filter(|a| a.has_defaulted_date()).count();

        DashboardReport {
            generated_at: self.local(now),
            scope: scope.clone(),
            statistics: self.statistics(&appointments),
            daily: self.daily_series(&appointments, now),
            weekly: self.weekly_series(&appointments, now),
            monthly: self.monthly_series(&appointments, now),
            appointments,
            rejected_count,
            defaulted_date_count,
        }
    }

    /// Normalize a raw snapshot and report on it in one pass.
    pub fn report_from_documents(
        &self,
        docs: &[RawDocument],
        scope: &ReportScope,
        now: DateTime<Utc>,
    ) -> DashboardReport {
        let batch = self.normalize_batch(docs, now);
        let rejected = batch.rejected.len();
        self.build_report(batch.appointments, scope, now, rejected)
    }

    /// Upcoming scheduled appointments, in the configured calendar.
    pub fn upcoming(&self, appointments: &[Appointment], now: DateTime<Utc>) -> Vec<Appointment> {
        upcoming(appointments, self.local(now))
    }
}

/// Scheduled appointments from the start of today onward, soonest first.
pub fn upcoming(appointments: &[Appointment], now: DateTime<FixedOffset>) -> Vec<Appointment> {
    let today = start_of_today(now);
    let mut result: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.canonical_status() == "scheduled" && a.date >= today)
        .cloned()
        .collect();
    result.sort_by(|a, b| a.date.cmp(&b.date));
    result
}
