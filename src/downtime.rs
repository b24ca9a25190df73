//! Downtime reconstruction.
//!
//! The warehouse only records transitions, so "how long was it broken" has
//! to be inferred: a `broken` row lasts until the next row for the same
//! location, or until the end of the window if nothing follows it.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{LocationKey, LocationObservation};
use crate::store::HistoricalTable;

/// Inclusive `[start, end]` analysis range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Window {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidWindow { start, end });
        }
        Ok(Window { start, end })
    }

    /// Midnight UTC of `start` through midnight UTC of `end`.
    pub fn between_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        Window::new(start.and_time(NaiveTime::MIN), end.and_time(NaiveTime::MIN))
    }

    /// The `span` leading up to `end`.
    pub fn trailing(end: NaiveDateTime, span: std::time::Duration) -> Result<Self> {
        let start = chrono::Duration::from_std(span)
            .ok()
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| Error::WindowOutOfRange {
                end,
                span: humantime::format_duration(span).to_string(),
            })?;
        Window::new(start, end)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }
}

/// A reconstructed span during which one location was broken.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenInterval {
    pub latitude: f64,
    pub longitude: f64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// True when no later observation closed the interval and the window
    /// end was used instead.
    pub open: bool,
}

impl BrokenInterval {
    pub fn key(&self) -> LocationKey {
        LocationKey::new(self.latitude, self.longitude)
    }

    /// Length in seconds; out-of-order rows never yield a negative value.
    pub fn seconds(&self) -> f64 {
        let millis = self.end.signed_duration_since(self.start).num_milliseconds();
        (millis as f64 / 1000.0).max(0.0)
    }
}

/// Group in-window rows by location, each group sorted by `last_checked`.
///
/// The sort is stable, so rows with equal timestamps keep insertion order.
fn group_by_location<'a>(
    table: &'a HistoricalTable,
    window: &Window,
) -> HashMap<LocationKey, Vec<&'a LocationObservation>> {
    let mut groups: HashMap<LocationKey, Vec<&LocationObservation>> = HashMap::new();
    for row in table.observed_between(window.start, window.end) {
        groups.entry(row.key()).or_default().push(row);
    }
    for rows in groups.values_mut() {
        rows.sort_by_key(|row| row.last_checked);
    }
    groups
}

/// Every broken interval in `window`.
pub fn broken_intervals(table: &HistoricalTable, window: &Window) -> Vec<BrokenInterval> {
    let mut intervals = Vec::new();

    for rows in group_by_location(table, window).values() {
        for (i, row) in rows.iter().enumerate() {
            if !row.status.is_broken() {
                continue;
            }

            let (end, open) = match rows.get(i + 1) {
                Some(next) => (next.last_checked, false),
                None => (window.end, true),
            };

            intervals.push(BrokenInterval {
                latitude: row.latitude,
                longitude: row.longitude,
                start: row.last_checked,
                end,
                open,
            });
        }
    }

    intervals
}

/// Total broken seconds across all locations in `window`.
pub fn broken_seconds(table: &HistoricalTable, window: &Window) -> f64 {
    broken_intervals(table, window).iter().map(BrokenInterval::seconds).sum()
}

/// Broken seconds for one location over the window.
#[derive(Debug, Clone, Serialize)]
pub struct LocationDowntime {
    pub latitude: f64,
    pub longitude: f64,
    pub state: String,
    pub city: String,
    pub street: String,
    pub broken_seconds: f64,
    pub intervals: usize,
}

/// Per-location totals, largest first. Locations never broken in the
/// window are left out.
pub fn broken_seconds_by_location(table: &HistoricalTable, window: &Window) -> Vec<LocationDowntime> {
    let mut totals: HashMap<LocationKey, (f64, usize)> = HashMap::new();
    for interval in broken_intervals(table, window) {
        let entry = totals.entry(interval.key()).or_default();
        entry.0 += interval.seconds();
        entry.1 += 1;
    }

    let mut breakdown: Vec<LocationDowntime> = totals
        .into_iter()
        .map(|(key, (seconds, intervals))| {
            let last = table.last_known(&key);
            LocationDowntime {
                latitude: key.latitude,
                longitude: key.longitude,
                state: last.map(|r| r.state.clone()).unwrap_or_default(),
                city: last.map(|r| r.city.clone()).unwrap_or_default(),
                street: last.map(|r| r.street.clone()).unwrap_or_default(),
                broken_seconds: seconds,
                intervals,
            }
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.broken_seconds
            .total_cmp(&a.broken_seconds)
            .then(a.latitude.total_cmp(&b.latitude))
            .then(a.longitude.total_cmp(&b.longitude))
    });
    breakdown
}
