use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::LocationObservation;
use crate::store::HistoricalTable;

const TABLE_DIR: &str = "final";
const TABLE_FILE: &str = "data_warehouse.csv";
const PROCESSED_DIR: &str = "processed";

/// Get the default data directory (~/.local/share/conewatch or platform equivalent)
pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "conewatch").ok_or(Error::NoDataDir)?;
    Ok(dirs.data_dir().to_path_buf())
}

/// On-disk layout of the warehouse.
///
/// The historical table is one csv file rewritten in full on every persist.
/// Callers must not run two read-merge-persist cycles against the same
/// directory at once; nothing here locks the file.
#[derive(Debug, Clone)]
pub struct Warehouse {
    root: PathBuf,
}

impl Warehouse {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Warehouse { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self) -> PathBuf {
        self.root.join(TABLE_DIR).join(TABLE_FILE)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(PROCESSED_DIR)
    }

    /// Load the historical table. A missing file is an empty table.
    pub fn load(&self) -> Result<HistoricalTable> {
        let path = self.table_path();
        if !path.exists() {
            log::info!("no warehouse at {}, starting empty", path.display());
            return Ok(HistoricalTable::new());
        }

        let rows = read_rows(&path)?;
        log::debug!("loaded {} rows from {}", rows.len(), path.display());
        Ok(HistoricalTable::from_rows(rows))
    }

    /// Rewrite the warehouse file with every row of `table`.
    pub fn persist(&self, table: &HistoricalTable) -> Result<()> {
        let path = self.table_path();
        write_rows(&path, table.rows())?;
        log::debug!("wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }
}

pub(crate) fn read_rows(path: &Path) -> Result<Vec<LocationObservation>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<LocationObservation>, _>>()
        .map_err(|source| csv_error(path, source))
}

/// Write through a sibling temp file and rename, so a crash mid-write never
/// leaves a truncated table behind.
pub(crate) fn write_rows(path: &Path, rows: &[LocationObservation]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp_path).map_err(|source| csv_error(&tmp_path, source))?;
        for row in rows {
            writer.serialize(row).map_err(|source| csv_error(&tmp_path, source))?;
        }
        writer.flush()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn csv_error(path: &Path, source: csv::Error) -> Error {
    Error::Csv {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::*;
    use crate::model::{LocationKey, Status};

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = Warehouse::new(dir.path());
        assert!(warehouse.load().unwrap().is_empty());
    }

    #[test]
    fn persisted_rows_reload_in_order_with_index() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = Warehouse::new(dir.path());
        let table = HistoricalTable::from_rows(vec![
            obs(40.7128, -74.006, Status::Working, at(10, 0)),
            obs(34.0522, -118.2437, Status::Broken, at(10, 5)),
            obs(40.7128, -74.006, Status::Broken, at(11, 0)),
        ]);

        warehouse.persist(&table).unwrap();
        let loaded = warehouse.load().unwrap();

        assert_eq!(loaded.rows(), table.rows());
        assert_eq!(
            loaded.last_known(&LocationKey::new(40.7128, -74.006)).unwrap().status,
            Status::Broken
        );
        assert!(!warehouse.table_path().with_extension("csv.tmp").exists());
    }

    #[test]
    fn reads_columns_by_name_in_any_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        fs::write(
            &path,
            "status,state,city,street,last_checked,longitude,latitude,scraped_datetime\n\
             broken,NY,New York,1 Main St,2021-03-01 10:00:00,-74.006,40.7128,2021-03-01 10:20:00\n\
             is_it_on,NY,New York,2 Main St,2021-03-01 10:00:00.000000,-74.5,40.5,2021-03-01 10:20:00\n",
        )
        .unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, Status::Broken);
        assert_eq!(rows[0].latitude, 40.7128);
        assert_eq!(rows[0].last_checked, at(10, 0));
        assert_eq!(rows[1].status, Status::Unknown);
    }

    #[test]
    fn malformed_row_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(
            &path,
            "latitude,longitude,status,state,city,street,last_checked,scraped_datetime\n\
             north,-74.0,broken,NY,NYC,1 Main,2021-03-01 10:00:00,2021-03-01 10:00:00\n",
        )
        .unwrap();

        assert!(matches!(read_rows(&path), Err(Error::Csv { .. })));
    }
}
