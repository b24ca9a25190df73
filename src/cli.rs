use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::util::parse_date;

#[derive(Parser)]
#[command(name = "conewatch")]
#[command(about = "Track broken ice cream machines and what they cost")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the warehouse and snapshot archive
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Markers feed URL
    #[arg(long, global = true)]
    pub feed_url: Option<String>,

    /// HTTP timeout, e.g. "30s"
    #[arg(long, global = true)]
    pub timeout: Option<String>,

    /// Show informational logging
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch the feed once and record status changes
    Scrape(ScrapeArgs),

    /// Scrape repeatedly at a fixed interval
    Watch(WatchArgs),

    /// Total downtime and lost revenue over a date range
    Analyze(AnalyzeArgs),

    /// Summarize the warehouse
    Status,
}

#[derive(Args)]
pub struct ScrapeArgs {
    /// Skip writing the raw snapshot to the archive
    #[arg(long, default_value_t = false)]
    pub no_archive: bool,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Time between scrapes, e.g. "15m"
    #[arg(long, default_value = "15m")]
    pub interval: String,

    /// Stop after this many scrapes
    #[arg(long)]
    pub count: Option<u64>,

    #[command(flatten)]
    pub scrape: ScrapeArgs,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Analysis start date (format: YEAR-MONTH-DAY)
    #[arg(long = "start_date", alias = "start-date", value_parser = parse_date, required_unless_present = "last")]
    pub start_date: Option<NaiveDate>,

    /// Analysis end date (format: YEAR-MONTH-DAY)
    #[arg(long = "end_date", alias = "end-date", value_parser = parse_date, required_unless_present = "last")]
    pub end_date: Option<NaiveDate>,

    /// Analyze the period ending now instead, e.g. "7d"
    #[arg(long, conflicts_with_all = ["start_date", "end_date"])]
    pub last: Option<String>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Also list the N locations with the most downtime
    #[arg(long, num_args = 0..=1, default_missing_value = "10")]
    pub by_location: Option<usize>,
}
