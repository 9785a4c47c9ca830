//! Reporting value objects, recomputed on every aggregation pass.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Appointment, ReportScope};

/// Bucket granularity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

/// Appointment count for one period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodBucket {
    /// Start of day, ISO week (Monday) or month
    pub period_start: NaiveDate,
    pub count: usize,
}

/// Buckets sorted ascending by period start, without gaps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketSeries {
    pub granularity: Granularity,
    pub buckets: Vec<PeriodBucket>,
}

impl BucketSeries {
    /// Build from a period → count map (a `BTreeMap` iterates in order).
    pub fn from_counts(granularity: Granularity, counts: BTreeMap<NaiveDate, usize>) -> Self {
        Self {
            granularity,
            buckets: counts
                .into_iter()
                .map(|(period_start, count)| PeriodBucket {
                    period_start,
                    count,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Count for a given period start.
    pub fn count_for(&self, period_start: NaiveDate) -> Option<usize> {
        self.buckets
            .iter()
            .find(|b| b.period_start == period_start)
            .map(|b| b.count)
    }

    /// Sum of all bucket counts.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

/// Summary statistics over a set of appointments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregateStatistics {
    pub total_appointments: usize,
    /// Percentage (0-100) with billing status "cancelled"
    pub cancellation_rate: f64,
    pub total_revenue: f64,
    pub average_revenue_per_appointment: f64,
    /// Lowercased status → count
    pub status_histogram: BTreeMap<String, usize>,
    /// Billing status as given → count
    pub billing_histogram: BTreeMap<String, usize>,
}

/// Everything a dashboard needs, computed in one pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardReport {
    /// The reference "now" the report was computed against
    pub generated_at: DateTime<FixedOffset>,
    pub scope: ReportScope,
    pub statistics: AggregateStatistics,
    pub daily: BucketSeries,
    pub weekly: BucketSeries,
    pub monthly: BucketSeries,
    /// Appointments inside the scope, ascending by date
    pub appointments: Vec<Appointment>,
    /// Documents dropped during normalization
    pub rejected_count: usize,
    /// Appointments whose date was substituted with today
    pub defaulted_date_count: usize,
}
