//! Temporal bucketing into day, ISO week and month series.
//!
//! Every series is zero-filled for its nominal window so charts never have
//! gaps. Weekly and monthly series admit appointments by a rolling threshold
//! ("N weeks before now") but key them by calendar period, so an appointment
//! right at the threshold can open one extra, older bucket.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, Weekday};

use crate::models::{Appointment, BucketSeries, Granularity};

/// Monday of the ISO week containing `date`.
pub fn iso_week_start(date: NaiveDate) -> NaiveDate {
    let week = date.iso_week();
    NaiveDate::from_isoywd_opt(week.year(), week.week(), Weekday::Mon).unwrap_or(date)
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Seven buckets, Monday through Sunday of the week containing `now`.
pub fn daily_series(appointments: &[Appointment], now: DateTime<FixedOffset>) -> BucketSeries {
    let offset = *now.offset();
    let today = now.date_naive();
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));

    let mut counts: BTreeMap<NaiveDate, usize> =
        (0..7).map(|i| (monday + Duration::days(i), 0)).collect();

    for appointment in appointments {
        let day = appointment.date.with_timezone(&offset).date_naive();
        if let Some(count) = counts.get_mut(&day) {
            *count += 1;
        }
    }

    BucketSeries::from_counts(Granularity::Day, counts)
}

/// One bucket per ISO week for the `weeks` weeks ending with the current one.
pub fn weekly_series(
    appointments: &[Appointment],
    now: DateTime<FixedOffset>,
    weeks: u32,
) -> BucketSeries {
    let offset = *now.offset();
    let current = iso_week_start(now.date_naive());

    let mut counts: BTreeMap<NaiveDate, usize> = (0..i64::from(weeks))
        .map_while(|i| current.checked_sub_signed(Duration::weeks(i)))
        .map(|start| (start, 0))
        .collect();

    let threshold = now.checked_sub_signed(Duration::weeks(i64::from(weeks)));

    for appointment in appointments {
        if threshold.is_some_and(|t| appointment.date < t) {
            continue;
        }
        let key = iso_week_start(appointment.date.with_timezone(&offset).date_naive());
        if key > current {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    BucketSeries::from_counts(Granularity::Week, counts)
}

/// One bucket per calendar month for the `months` months ending with the current one.
pub fn monthly_series(
    appointments: &[Appointment],
    now: DateTime<FixedOffset>,
    months: u32,
) -> BucketSeries {
    let offset = *now.offset();
    let current = month_start(now.date_naive());

    let mut counts: BTreeMap<NaiveDate, usize> = (0..months)
        .filter_map(|i| current.checked_sub_months(Months::new(i)))
        .map(|start| (start, 0))
        .collect();

    let threshold = now.checked_sub_months(Months::new(months));

    for appointment in appointments {
        if threshold.is_some_and(|t| appointment.date < t) {
            continue;
        }
        let key = month_start(appointment.date.with_timezone(&offset).date_naive());
        if key > current {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    BucketSeries::from_counts(Granularity::Month, counts)
}
