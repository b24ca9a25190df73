use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::model::LocationKey;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to fetch feed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid csv in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid duration '{value}': {source}")]
    Duration {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("location {0} appears more than once in the snapshot")]
    DuplicateLocation(LocationKey),

    #[error("window end {end} is before start {start}")]
    InvalidWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("a window of {span} ending at {end} starts before the earliest representable time")]
    WindowOutOfRange { end: NaiveDateTime, span: String },

    #[error("both --start_date and --end_date are required")]
    IncompleteWindow,

    #[error("could not determine data directory")]
    NoDataDir,
}

pub type Result<T> = std::result::Result<T, Error>;
