//! Markers document → `Snapshot`.
//!
//! Features the core cannot use are dropped here with a diagnostic and
//! never reach ingestion.

use std::sync::OnceLock;

use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use serde::Deserialize;

use crate::error::Result;
use crate::model::{LocationObservation, Snapshot, Status};

#[derive(Debug, Deserialize)]
pub struct FeedDocument {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    /// `[longitude, latitude]`
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub dot: Option<Status>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub last_checked: Option<String>,
}

/// Parsed snapshot plus a message for every feature that was dropped.
pub struct ParseOutcome {
    pub snapshot: Snapshot,
    pub diagnostics: Vec<String>,
}

fn minutes_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("static pattern"))
}

/// Minutes since the source last checked, from text like "Checked 14 minutes ago".
pub fn minutes_ago(raw: &str) -> Option<i64> {
    minutes_pattern().find(raw)?.as_str().parse().ok()
}

/// Build a snapshot from the feed.
///
/// `country` keeps only features from that country; `None` keeps all.
/// Errors only when the surviving rows contain the same location twice.
pub fn to_snapshot(document: FeedDocument, scraped_at: NaiveDateTime, country: Option<&str>) -> Result<ParseOutcome> {
    let mut observations = Vec::with_capacity(document.features.len());
    let mut diagnostics = Vec::new();
    let mut filtered = 0usize;

    for (index, feature) in document.features.into_iter().enumerate() {
        let props = feature.properties;

        if let Some(wanted) = country {
            if props.country.as_deref() != Some(wanted) {
                filtered += 1;
                continue;
            }
        }

        let Some(status) = props.dot else {
            diagnostics.push(format!("feature {index}: missing status"));
            continue;
        };

        let (longitude, latitude) = match feature.geometry.coordinates.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => (*lon, *lat),
            _ => {
                diagnostics.push(format!("feature {index}: missing or invalid coordinates"));
                continue;
            }
        };

        let last_checked = props
            .last_checked
            .as_deref()
            .and_then(minutes_ago)
            .and_then(Duration::try_minutes)
            .and_then(|ago| scraped_at.checked_sub_signed(ago));
        let Some(last_checked) = last_checked else {
            diagnostics.push(format!(
                "feature {index}: unreadable last_checked {:?}",
                props.last_checked.unwrap_or_default()
            ));
            continue;
        };

        observations.push(LocationObservation {
            latitude,
            longitude,
            status,
            state: props.state.unwrap_or_default(),
            city: props.city.unwrap_or_default(),
            street: props.street.unwrap_or_default(),
            last_checked,
            scraped_datetime: scraped_at,
        });
    }

    for message in &diagnostics {
        log::warn!("{message}");
    }
    if filtered > 0 {
        log::debug!("{filtered} features outside {country:?} skipped");
    }

    let snapshot = Snapshot::new(scraped_at, observations)?;
    Ok(ParseOutcome { snapshot, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::fixtures::at;

    fn document(json: &str) -> FeedDocument {
        serde_json::from_str(json).unwrap()
    }

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-74.006, 40.7128] },
                "properties": {
                    "dot": "broken", "country": "USA", "state": "NY", "city": "New York",
                    "street": "1 Main St", "last_checked": "Checked 14 minutes ago",
                    "is_broken": true, "is_active": true
                }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-118.2437, 34.0522] },
                "properties": {
                    "dot": "working", "country": "USA", "state": "CA", "city": "Los Angeles",
                    "street": "2 Sunset Blvd", "last_checked": "Checked 3 minutes ago"
                }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-0.1276, 51.5072] },
                "properties": {
                    "dot": "working", "country": "UK", "state": "", "city": "London",
                    "street": "3 Strand", "last_checked": "Checked 1 minutes ago"
                }
            }
        ]
    }"#;

    #[test]
    fn resolves_last_checked_against_scrape_time() {
        let outcome = to_snapshot(document(SAMPLE), at(12, 0), Some("USA")).unwrap();
        let rows = outcome.snapshot.observations();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].latitude, 40.7128);
        assert_eq!(rows[0].longitude, -74.006);
        assert_eq!(rows[0].status, Status::Broken);
        assert_eq!(rows[0].last_checked, at(11, 46));
        assert_eq!(rows[0].scraped_datetime, at(12, 0));
        assert_eq!(rows[1].last_checked, at(11, 57));
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn no_country_filter_keeps_everything() {
        let outcome = to_snapshot(document(SAMPLE), at(12, 0), None).unwrap();
        assert_eq!(outcome.snapshot.len(), 3);
    }

    #[test]
    fn malformed_features_are_dropped_with_diagnostics() {
        let json = r#"{ "features": [
            { "geometry": { "coordinates": [1.0] },
              "properties": { "dot": "broken", "last_checked": "Checked 5 minutes ago" } },
            { "geometry": { "coordinates": [1.0, 2.0] },
              "properties": { "dot": "broken", "last_checked": "just now" } },
            { "geometry": { "coordinates": [3.0, 4.0] },
              "properties": { "dot": "working", "last_checked": "Checked 0 minutes ago" } }
        ] }"#;
        let outcome = to_snapshot(document(json), at(12, 0), None).unwrap();

        assert_eq!(outcome.snapshot.len(), 1);
        assert_eq!(outcome.diagnostics.len(), 2);
        assert!(outcome.diagnostics[0].starts_with("feature 0"));
        assert_eq!(outcome.snapshot.observations()[0].last_checked, at(12, 0));
    }

    #[test]
    fn out_of_range_minutes_are_dropped_with_diagnostic() {
        let json = r#"{ "features": [
            { "geometry": { "coordinates": [1.0, 2.0] },
              "properties": { "dot": "broken", "last_checked": "Checked 200000000000 minutes ago" } },
            { "geometry": { "coordinates": [3.0, 4.0] },
              "properties": { "dot": "working", "last_checked": "Checked 2 minutes ago" } }
        ] }"#;
        let outcome = to_snapshot(document(json), at(12, 0), None).unwrap();

        assert_eq!(outcome.snapshot.len(), 1);
        assert_eq!(outcome.snapshot.observations()[0].last_checked, at(11, 58));
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].starts_with("feature 0: unreadable last_checked"));
    }

    #[test]
    fn duplicate_location_discards_snapshot() {
        let json = r#"{ "features": [
            { "geometry": { "coordinates": [1.0, 2.0] },
              "properties": { "dot": "broken", "last_checked": "Checked 5 minutes ago" } },
            { "geometry": { "coordinates": [1.0, 2.0] },
              "properties": { "dot": "working", "last_checked": "Checked 6 minutes ago" } }
        ] }"#;
        let result = to_snapshot(document(json), at(12, 0), None);
        assert!(matches!(result, Err(Error::DuplicateLocation(_))));
    }

    #[test]
    fn feature_without_status_is_dropped() {
        let json = r#"{ "features": [
            { "geometry": { "coordinates": [1.0, 2.0] },
              "properties": { "last_checked": "Checked 5 minutes ago" } }
        ] }"#;
        let outcome = to_snapshot(document(json), at(12, 0), None).unwrap();
        assert!(outcome.snapshot.is_empty());
        assert_eq!(outcome.diagnostics, vec!["feature 0: missing status".to_string()]);
    }

    #[test]
    fn minutes_ago_takes_first_number() {
        assert_eq!(minutes_ago("Checked 137 minutes ago"), Some(137));
        assert_eq!(minutes_ago("Checked recently"), None);
    }

    #[test]
    fn unexpected_dot_value_is_unknown() {
        let json = r#"{ "features": [
            { "geometry": { "coordinates": [1.0, 2.0] },
              "properties": { "dot": "inactive", "last_checked": "Checked 5 minutes ago" } },
            { "geometry": { "coordinates": [3.0, 4.0] },
              "properties": { "dot": "grey", "last_checked": "Checked 5 minutes ago" } }
        ] }"#;
        let outcome = to_snapshot(document(json), at(12, 0), None).unwrap();
        assert_eq!(outcome.snapshot.observations()[0].status, Status::Inactive);
        assert_eq!(outcome.snapshot.observations()[1].status, Status::Unknown);
    }
}
