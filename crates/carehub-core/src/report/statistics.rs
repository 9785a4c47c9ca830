//! Aggregate statistics over a set of appointments.

use crate::models::{AggregateStatistics, Appointment};

/// Compute summary statistics. Empty input yields all zeros.
pub fn aggregate(appointments: &[Appointment]) -> AggregateStatistics {
    let mut stats = AggregateStatistics {
        total_appointments: appointments.len(),
        ..Default::default()
    };

    if appointments.is_empty() {
        return stats;
    }

    let mut cancelled = 0usize;
    for appointment in appointments {
        if appointment.is_billing_cancelled() {
            cancelled += 1;
        }
        stats.total_revenue += appointment.amount.unwrap_or(0.0);

        *stats
            .status_histogram
            .entry(appointment.canonical_status())
            .or_insert(0) += 1;
        *stats
            .billing_histogram
            .entry(appointment.billing_status.clone())
            .or_insert(0) += 1;
    }

    let total = appointments.len() as f64;
    stats.cancellation_rate = 100.0 * cancelled as f64 / total;
    stats.average_revenue_per_appointment = stats.total_revenue / total;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn appt(status: &str, billing: &str, amount: Option<f64>) -> Appointment {
        let date = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 6, 9, 0, 0)
            .unwrap();
        let mut a = Appointment::new("p".into(), "d".into(), "Visit".into(), date);
        a.status = status.into();
        a.billing_status = billing.into();
        a.amount = amount;
        a
    }

    #[test]
    fn test_empty_input() {
        let stats = aggregate(&[]);
        assert_eq!(stats, AggregateStatistics::default());
    }

    #[test]
    fn test_mixed_input() {
        let appointments = vec![
            appt("Scheduled", "pending", None),
            appt("completed", "paid", Some(200.0)),
            appt("cancelled", "cancelled", Some(0.0)),
            appt("completed", "Paid", Some(100.0)),
        ];

        let stats = aggregate(&appointments);
        assert_eq!(stats.total_appointments, 4);
        assert_eq!(stats.cancellation_rate, 25.0);
        assert_eq!(stats.total_revenue, 300.0);
        assert_eq!(stats.average_revenue_per_appointment, 75.0);
        assert_eq!(stats.status_histogram.get("completed"), Some(&2));
        assert_eq!(stats.status_histogram.get("scheduled"), Some(&1));
        // billing statuses keep their casing
        assert_eq!(stats.billing_histogram.get("paid"), Some(&1));
        assert_eq!(stats.billing_histogram.get("Paid"), Some(&1));
    }

    #[test]
    fn test_uppercase_cancelled_not_counted() {
        let stats = aggregate(&[appt("cancelled", "Cancelled", None)]);
        assert_eq!(stats.cancellation_rate, 0.0);
    }
}
