pub mod parse;

use std::time::Duration;

use chrono::{NaiveDateTime, SubsecRound, Utc};

use crate::error::Result;
use parse::{FeedDocument, ParseOutcome};

pub const DEFAULT_FEED_URL: &str = "https://mcbroken2.nyc3.digitaloceanspaces.com/markers.json";

/// Source of the markers document.
pub trait Feed {
    fn fetch(&self) -> Result<FeedDocument>;
}

pub struct HttpFeed {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("conewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpFeed {
            url: url.into(),
            client,
        })
    }
}

impl Feed for HttpFeed {
    fn fetch(&self) -> Result<FeedDocument> {
        log::info!("fetching {}", self.url);
        let document = self
            .client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .json::<FeedDocument>()?;
        log::debug!("received {} features", document.features.len());
        Ok(document)
    }
}

/// Current UTC time truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}

/// Fetch and parse one snapshot stamped with `scraped_at`.
pub fn scrape(feed: &dyn Feed, scraped_at: NaiveDateTime, country: Option<&str>) -> Result<ParseOutcome> {
    let document = feed.fetch()?;
    parse::to_snapshot(document, scraped_at, country)
}
