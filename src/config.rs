use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::feed::DEFAULT_FEED_URL;
use crate::revenue::RevenueModel;
use crate::store::merge::NewLocationPolicy;
use crate::store::warehouse;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_COUNTRY: &str = "USA";

/// Contents of config.toml. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub feed_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    /// Empty string disables the country filter.
    pub country: Option<String>,
    pub timeout: Option<String>,
    pub new_locations: Option<NewLocationPolicy>,
    pub archive_snapshots: Option<bool>,
    pub revenue: Option<RevenueModel>,
}

impl FileConfig {
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub data_dir: PathBuf,
    pub country: Option<String>,
    pub timeout: Duration,
    pub new_locations: NewLocationPolicy,
    pub archive_snapshots: bool,
    pub revenue: RevenueModel,
}

/// Default config path (~/.config/conewatch/config.toml or platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "conewatch").map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn parse_duration(value: &str) -> Result<Duration> {
    humantime::parse_duration(value).map_err(|source| Error::Duration {
        value: value.to_string(),
        source,
    })
}

impl Config {
    pub fn from_file(file: FileConfig) -> Result<Self> {
        let data_dir = match file.data_dir {
            Some(dir) => dir,
            None => warehouse::default_data_dir()?,
        };

        let timeout = match file.timeout.as_deref() {
            Some(raw) => parse_duration(raw)?,
            None => DEFAULT_TIMEOUT,
        };

        let country = match file.country {
            Some(c) if c.is_empty() => None,
            Some(c) => Some(c),
            None => Some(DEFAULT_COUNTRY.to_string()),
        };

        Ok(Config {
            feed_url: file.feed_url.unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            data_dir,
            country,
            timeout,
            new_locations: file.new_locations.unwrap_or_default(),
            archive_snapshots: file.archive_snapshots.unwrap_or(true),
            revenue: file.revenue.unwrap_or_default(),
        })
    }

    /// Load config.toml (explicit `--config`, else the default path if it
    /// exists) and apply command line overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => read_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_file(&path)?,
                _ => FileConfig::default(),
            },
        };

        let mut config = Config::from_file(file)?;

        if let Some(dir) = &cli.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(url) = &cli.feed_url {
            config.feed_url = url.clone();
        }
        if let Some(raw) = &cli.timeout {
            config.timeout = parse_duration(raw)?;
        }

        log::debug!("config: {config:?}");
        Ok(config)
    }
}

fn read_file(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)?;
    FileConfig::parse(&contents, path)
}
