//! Raw snapshot archive.
//!
//! Every scrape can be kept as its own csv under `processed/`, named after
//! the scrape instant. The files are never read back by the analysis; they
//! exist so the warehouse can be rebuilt or audited by hand.

use std::path::PathBuf;

use crate::error::Result;
use crate::model::Snapshot;
use crate::store::warehouse::{self, Warehouse};

const FILE_NAME_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

pub fn snapshot_path(warehouse: &Warehouse, snapshot: &Snapshot) -> PathBuf {
    let name = format!("{}.csv", snapshot.scraped_at().format(FILE_NAME_FORMAT));
    warehouse.processed_dir().join(name)
}

/// Write `snapshot` to the archive, returning the file path.
pub fn save_snapshot(warehouse: &Warehouse, snapshot: &Snapshot) -> Result<PathBuf> {
    let path = snapshot_path(warehouse, snapshot);
    warehouse::write_rows(&path, snapshot.observations())?;
    Ok(path)
}

/// Archived snapshot files, oldest first.
pub fn list_snapshots(warehouse: &Warehouse) -> Result<Vec<PathBuf>> {
    let dir = warehouse.processed_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    // names are timestamps, so lexical order is chronological
    paths.sort();
    Ok(paths)
}
