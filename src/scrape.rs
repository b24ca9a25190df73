//! One scrape pass: fetch, parse, merge, archive, persist.
//!
//! A pass either completes or leaves the warehouse exactly as it was: the
//! snapshot is archived and the table rewritten only after the whole
//! snapshot has parsed and merged against the stored history.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::config::Config;
use crate::error::Result;
use crate::feed::{self, Feed};
use crate::store::merge::{self, MergeReport};
use crate::store::warehouse::Warehouse;
use crate::store::archive;

#[derive(Debug)]
pub struct ScrapeResult {
    pub scraped_at: NaiveDateTime,
    pub observed: usize,
    pub broken: usize,
    pub diagnostics: Vec<String>,
    pub merge: MergeReport,
    pub table_rows: usize,
    pub archive_path: Option<PathBuf>,
    pub duration_ms: u128,
}

pub fn run(config: &Config, source: &dyn Feed, scraped_at: NaiveDateTime, archive_snapshot: bool) -> Result<ScrapeResult> {
    let start = std::time::Instant::now();
    let warehouse = Warehouse::new(&config.data_dir);

    let outcome = feed::scrape(source, scraped_at, config.country.as_deref())?;
    let snapshot = outcome.snapshot;
    log::info!(
        "snapshot at {scraped_at}: {} locations, {} broken",
        snapshot.len(),
        snapshot.broken_count()
    );

    let historical = warehouse.load()?;
    let merged = merge::merge(historical, &snapshot, config.new_locations);

    let archive_path = if archive_snapshot {
        let path = archive::save_snapshot(&warehouse, &snapshot)?;
        log::debug!("archived snapshot to {}", path.display());
        Some(path)
    } else {
        None
    };

    if merged.report.appended.is_empty() {
        log::info!("no status changes");
    } else {
        warehouse.persist(&merged.table)?;
        log::info!(
            "appended {} rows ({} transitions, {} new locations)",
            merged.report.appended.len(),
            merged.report.transitions(),
            merged.report.new_locations()
        );
    }
    if merged.report.ignored_new > 0 {
        log::warn!("{} unseen locations ignored", merged.report.ignored_new);
    }

    Ok(ScrapeResult {
        scraped_at,
        observed: snapshot.len(),
        broken: snapshot.broken_count(),
        diagnostics: outcome.diagnostics,
        merge: merged.report,
        table_rows: merged.table.len(),
        archive_path,
        duration_ms: start.elapsed().as_millis(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::feed::parse::FeedDocument;
    use crate::model::fixtures::at;
    use crate::store::merge::NewLocationPolicy;
    use crate::revenue::RevenueModel;
    use std::time::Duration;

    struct StaticFeed(&'static str);

    impl Feed for StaticFeed {
        fn fetch(&self) -> Result<FeedDocument> {
            Ok(serde_json::from_str(self.0)?)
        }
    }

    struct FailingFeed;

    impl Feed for FailingFeed {
        fn fetch(&self) -> Result<FeedDocument> {
            Err(Error::Io(std::io::Error::other("connection refused")))
        }
    }

    fn config(dir: &std::path::Path) -> Config {
        Config {
            feed_url: String::new(),
            data_dir: dir.to_path_buf(),
            country: None,
            timeout: Duration::from_secs(1),
            new_locations: NewLocationPolicy::Append,
            archive_snapshots: true,
            revenue: RevenueModel::default(),
        }
    }

    const ONE_BROKEN: &str = r#"{ "features": [
        { "geometry": { "coordinates": [1.0, 2.0] },
          "properties": { "dot": "broken", "last_checked": "Checked 5 minutes ago" } },
        { "geometry": { "coordinates": [3.0, 4.0] },
          "properties": { "dot": "working", "last_checked": "Checked 5 minutes ago" } }
    ] }"#;

    #[test]
    fn repeated_identical_scrapes_do_not_grow_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let first = run(&config, &StaticFeed(ONE_BROKEN), at(10, 0), true).unwrap();
        assert!(first.merge.bootstrap);
        assert_eq!(first.table_rows, 2);
        assert_eq!(first.broken, 1);

        let second = run(&config, &StaticFeed(ONE_BROKEN), at(10, 15), false).unwrap();
        assert!(second.merge.appended.is_empty());
        assert_eq!(second.table_rows, 2);
        assert!(second.archive_path.is_none());

        assert_eq!(archive::list_snapshots(&Warehouse::new(dir.path())).unwrap().len(), 1);
    }

    #[test]
    fn failed_fetch_leaves_warehouse_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        run(&config, &StaticFeed(ONE_BROKEN), at(10, 0), false).unwrap();
        let path = Warehouse::new(dir.path()).table_path();
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(run(&config, &FailingFeed, at(10, 15), true).is_err());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert!(archive::list_snapshots(&Warehouse::new(dir.path())).unwrap().is_empty());
    }

    #[test]
    fn corrupt_warehouse_leaves_no_archive() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let warehouse = Warehouse::new(dir.path());
        std::fs::create_dir_all(warehouse.table_path().parent().unwrap()).unwrap();
        std::fs::write(
            warehouse.table_path(),
            "latitude,longitude,status,state,city,street,last_checked,scraped_datetime\n\
             north,4.0,broken,NY,New York,1 Main St,2021-03-01 09:00:00,2021-03-01 09:00:00\n",
        )
        .unwrap();

        assert!(matches!(
            run(&config, &StaticFeed(ONE_BROKEN), at(10, 0), true),
            Err(Error::Csv { .. })
        ));
        assert!(archive::list_snapshots(&warehouse).unwrap().is_empty());
    }
}
