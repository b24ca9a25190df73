//! Historical status table.
//!
//! Append-only log of status transitions, one row per change per location.
//! Alongside the rows the table keeps an index from location to the row that
//! was appended last for it, so ingestion never has to rescan the log.
//!
//! - merge: change detection against a fresh snapshot
//! - warehouse: csv file load/persist
//! - archive: raw per-scrape snapshot files

pub mod archive;
pub mod warehouse;
pub mod merge;

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::model::{LocationKey, LocationObservation};

#[derive(Debug, Clone, Default)]
pub struct HistoricalTable {
    rows: Vec<LocationObservation>,
    latest: HashMap<LocationKey, usize>,
}

impl HistoricalTable {
    pub fn new() -> Self {
        HistoricalTable::default()
    }

    /// Build a table from rows in insertion order.
    pub fn from_rows(rows: Vec<LocationObservation>) -> Self {
        let mut latest = HashMap::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            latest.insert(row.key(), index);
        }
        HistoricalTable { rows, latest }
    }

    pub fn rows(&self) -> &[LocationObservation] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<LocationObservation> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct locations ever recorded.
    pub fn location_count(&self) -> usize {
        self.latest.len()
    }

    /// Most recently appended row for `key`, by insertion order.
    pub fn last_known(&self, key: &LocationKey) -> Option<&LocationObservation> {
        self.latest.get(key).map(|&index| &self.rows[index])
    }

    /// Rows whose `last_checked` falls inside `[start, end]`, in insertion order.
    pub fn observed_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> impl Iterator<Item = &LocationObservation> {
        self.rows
            .iter()
            .filter(move |row| row.last_checked >= start && row.last_checked <= end)
    }

    pub(crate) fn append(&mut self, row: LocationObservation) {
        self.latest.insert(row.key(), self.rows.len());
        self.rows.push(row);
    }

    pub fn summary(&self) -> TableSummary {
        let broken_now = self
            .latest
            .values()
            .filter(|&&index| self.rows[index].status.is_broken())
            .count();

        TableSummary {
            rows: self.rows.len(),
            locations: self.latest.len(),
            broken_now,
            first_checked: self.rows.iter().map(|r| r.last_checked).min(),
            last_checked: self.rows.iter().map(|r| r.last_checked).max(),
        }
    }
}

/// Headline numbers for `conewatch status`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub rows: usize,
    pub locations: usize,
    /// Locations whose last recorded status is broken.
    pub broken_now: usize,
    pub first_checked: Option<NaiveDateTime>,
    pub last_checked: Option<NaiveDateTime>,
}
