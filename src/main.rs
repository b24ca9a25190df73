use clap::Parser;
use conewatch::cli::{AnalyzeArgs, Cli, Command, ScrapeArgs, WatchArgs};
use conewatch::config::{self, Config};
use conewatch::downtime::Window;
use conewatch::feed::{self, HttpFeed};
use conewatch::report::{self, Analysis};
use conewatch::scrape::{self, ScrapeResult};
use conewatch::store::archive;
use conewatch::store::warehouse::Warehouse;
use conewatch::util::TIMESTAMP_FORMAT;

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_scrape(result: &ScrapeResult, verbose: bool) {
    let report = &result.merge;

    if report.bootstrap {
        println!(
            "{}: started warehouse with {} locations ({} broken)",
            result.scraped_at.format(TIMESTAMP_FORMAT),
            result.observed,
            result.broken
        );
    } else {
        println!(
            "{}: {} locations, {} broken, {} status changes recorded",
            result.scraped_at.format(TIMESTAMP_FORMAT),
            result.observed,
            result.broken,
            report.appended.len()
        );
    }

    if verbose {
        println!("  transitions: {}", report.transitions());
        println!("  new locations: {}", report.new_locations());
        println!("  unchanged: {}", report.unchanged);
        if report.ignored_new > 0 {
            println!("  ignored new locations: {}", report.ignored_new);
        }
        println!("  warehouse rows: {}", result.table_rows);
        if let Some(path) = &result.archive_path {
            println!("  archived to {}", path.display());
        }
        println!("  completed in {:.2}s", result.duration_ms as f64 / 1000.0);
    }

    if !result.diagnostics.is_empty() {
        println!("  {} features skipped (run with -v for details)", result.diagnostics.len());
    }
}

fn run_scrape(config: &Config, args: &ScrapeArgs, verbose: bool) -> conewatch::Result<ScrapeResult> {
    let source = HttpFeed::new(&config.feed_url, config.timeout)?;
    let archive_snapshot = config.archive_snapshots && !args.no_archive;
    let result = scrape::run(config, &source, feed::now(), archive_snapshot)?;
    print_scrape(&result, verbose);
    Ok(result)
}

fn run_watch(config: &Config, args: &WatchArgs, verbose: bool) -> conewatch::Result<()> {
    let interval = config::parse_duration(&args.interval)?;
    let mut passes: u64 = 0;

    loop {
        if let Err(e) = run_scrape(config, &args.scrape, verbose) {
            // the snapshot is discarded, the next pass starts fresh
            log::error!("scrape failed: {e}");
        }

        passes += 1;
        if args.count.is_some_and(|count| passes >= count) {
            break;
        }

        log::info!("next scrape in {}", humantime::format_duration(interval));
        std::thread::sleep(interval);
    }

    Ok(())
}

fn analysis_window(args: &AnalyzeArgs) -> conewatch::Result<Window> {
    if let Some(raw) = &args.last {
        return Window::trailing(feed::now(), config::parse_duration(raw)?);
    }

    match (args.start_date, args.end_date) {
        (Some(start), Some(end)) => Window::between_dates(start, end),
        _ => Err(conewatch::Error::IncompleteWindow),
    }
}

fn run_analyze(config: &Config, args: &AnalyzeArgs) -> conewatch::Result<()> {
    let window = analysis_window(args)?;
    let table = Warehouse::new(&config.data_dir).load()?;

    if table.is_empty() {
        eprintln!("Warehouse is empty. Run 'conewatch scrape' to collect data.");
    }

    let analysis = Analysis::compute(&table, &window, &config.revenue, args.by_location);
    report::print(&analysis, args.json)
}

fn run_status(config: &Config) -> conewatch::Result<()> {
    let warehouse = Warehouse::new(&config.data_dir);
    let summary = warehouse.load()?.summary();
    let archived = archive::list_snapshots(&warehouse)?;

    println!("warehouse: {}", warehouse.table_path().display());
    if summary.rows == 0 {
        println!("No observations recorded. Run 'conewatch scrape' to create the warehouse.");
        return Ok(());
    }

    let format = |at: Option<chrono::NaiveDateTime>| {
        at.map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };

    println!("{:<24} {}", "rows", summary.rows);
    println!("{:<24} {}", "locations", summary.locations);
    println!("{:<24} {}", "currently broken", summary.broken_now);
    println!("{:<24} {}", "first observation", format(summary.first_checked));
    println!("{:<24} {}", "last observation", format(summary.last_checked));
    println!("{:<24} {}", "archived snapshots", archived.len());
    if let Some(latest) = archived.last() {
        println!("{:<24} {}", "latest archive", latest.display());
    }

    if summary.locations > 0 {
        let share = summary.broken_now as f64 / summary.locations as f64 * 100.0;
        println!("{:<24} {share:.1}%", "broken share");
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli).unwrap_or_else(|e| fail(e));

    let outcome = match &cli.command {
        Command::Scrape(args) => run_scrape(&config, args, cli.verbose).map(|_| ()),
        Command::Watch(args) => run_watch(&config, args, cli.verbose),
        Command::Analyze(args) => run_analyze(&config, args),
        Command::Status => run_status(&config),
    };

    if let Err(e) = outcome {
        fail(e);
    }
}
