//! Change detection between the warehouse and a fresh snapshot.
//!
//! For every location in the snapshot:
//! - compares against the last row recorded for that location
//! - appends the snapshot row only when the status differs
//! - unchanged locations are dropped, so the table grows with transitions only
//!
//! An empty warehouse takes the whole snapshot verbatim.

use serde::Deserialize;

use crate::model::{LocationKey, Snapshot, Status};
use crate::store::HistoricalTable;

/// What to do with a location the warehouse has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewLocationPolicy {
    /// Record its first observation.
    #[default]
    Append,
    /// Skip it; only locations present since bootstrap are tracked.
    Ignore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    Bootstrap,
    Transition { from: Status },
    NewLocation,
}

#[derive(Debug, Clone)]
pub struct Change {
    pub key: LocationKey,
    pub status: Status,
    pub kind: ChangeKind,
}

#[derive(Debug, Default)]
pub struct MergeReport {
    pub bootstrap: bool,
    pub appended: Vec<Change>,
    pub unchanged: usize,
    pub ignored_new: usize,
}

impl MergeReport {
    pub fn transitions(&self) -> usize {
        self.appended
            .iter()
            .filter(|c| matches!(c.kind, ChangeKind::Transition { .. }))
            .count()
    }

    pub fn new_locations(&self) -> usize {
        self.appended
            .iter()
            .filter(|c| c.kind == ChangeKind::NewLocation)
            .count()
    }
}

pub struct Merged {
    pub table: HistoricalTable,
    pub report: MergeReport,
}

/// Append the rows of `snapshot` whose status changed since the last
/// recorded observation of the same location.
///
/// Existing rows are never modified or reordered; new rows land at the end
/// in snapshot order.
pub fn merge(historical: HistoricalTable, snapshot: &Snapshot, policy: NewLocationPolicy) -> Merged {
    let mut table = historical;
    let mut report = MergeReport::default();

    if table.is_empty() {
        report.bootstrap = true;
        for observation in snapshot.observations() {
            report.appended.push(Change {
                key: observation.key(),
                status: observation.status,
                kind: ChangeKind::Bootstrap,
            });
            table.append(observation.clone());
        }
        return Merged { table, report };
    }

    // decide against the pre-merge state, then append
    let mut pending = Vec::new();
    for observation in snapshot.observations() {
        let key = observation.key();

        let kind = match table.last_known(&key) {
            Some(last) if last.status == observation.status => {
                report.unchanged += 1;
                continue;
            }
            Some(last) => ChangeKind::Transition { from: last.status },
            None => match policy {
                NewLocationPolicy::Append => ChangeKind::NewLocation,
                NewLocationPolicy::Ignore => {
                    report.ignored_new += 1;
                    continue;
                }
            },
        };

        report.appended.push(Change {
            key,
            status: observation.status,
            kind,
        });
        pending.push(observation.clone());
    }

    for row in pending {
        table.append(row);
    }

    Merged { table, report }
}
