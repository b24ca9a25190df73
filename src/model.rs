//! Location observations and snapshots.
//!
//! A location has no stable id in the feed, so it is identified by its
//! coordinate pair. Everything downstream (ingestion, downtime) groups on
//! `LocationKey`.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Working,
    Broken,
    Inactive,
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Working => "working",
            Status::Broken => "broken",
            Status::Inactive => "inactive",
            Status::Unknown => "unknown",
        }
    }

    pub fn is_broken(&self) -> bool {
        matches!(self, Status::Broken)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a location: its (latitude, longitude) pair.
///
/// Compared and hashed on the bit pattern of both floats, with `-0.0`
/// folded into `0.0`. NaN never gets this far; the feed parser drops it.
#[derive(Debug, Clone, Copy)]
pub struct LocationKey {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationKey {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        LocationKey { latitude, longitude }
    }

    fn bits(&self) -> (u64, u64) {
        (normalized_bits(self.latitude), normalized_bits(self.longitude))
    }
}

fn normalized_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for LocationKey {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for LocationKey {}

impl Hash for LocationKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// One status reading for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationObservation {
    pub latitude: f64,
    pub longitude: f64,
    pub status: Status,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub street: String,
    /// When the source last observed `status`.
    #[serde(with = "crate::util::timestamp")]
    pub last_checked: NaiveDateTime,
    /// When this system fetched the feed that produced the row.
    #[serde(with = "crate::util::timestamp")]
    pub scraped_datetime: NaiveDateTime,
}

impl LocationObservation {
    pub fn key(&self) -> LocationKey {
        LocationKey::new(self.latitude, self.longitude)
    }
}

/// The state of every monitored location at one scrape instant.
#[derive(Debug, Clone)]
pub struct Snapshot {
    scraped_at: NaiveDateTime,
    observations: Vec<LocationObservation>,
}

impl Snapshot {
    /// Rejects the whole snapshot if any location appears twice.
    pub fn new(scraped_at: NaiveDateTime, observations: Vec<LocationObservation>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(observations.len());
        for observation in &observations {
            let key = observation.key();
            if !seen.insert(key) {
                return Err(Error::DuplicateLocation(key));
            }
        }

        Ok(Snapshot {
            scraped_at,
            observations,
        })
    }

    pub fn scraped_at(&self) -> NaiveDateTime {
        self.scraped_at
    }

    pub fn observations(&self) -> &[LocationObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn broken_count(&self) -> usize {
        self.observations.iter().filter(|o| o.status.is_broken()).count()
    }
}
