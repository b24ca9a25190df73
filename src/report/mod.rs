pub mod json;
pub mod table;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::downtime::{self, LocationDowntime, Window};
use crate::error::Result;
use crate::revenue::RevenueModel;
use crate::store::HistoricalTable;
use crate::util::{self, format_currency, seconds_to_hours};

/// Everything `analyze` prints.
#[derive(Debug, Serialize)]
pub struct Analysis {
    #[serde(with = "util::timestamp")]
    pub start: NaiveDateTime,
    #[serde(with = "util::timestamp")]
    pub end: NaiveDateTime,
    pub broken_seconds: f64,
    pub broken_hours: f64,
    pub lost_revenue: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<LocationDowntime>>,
}

impl Analysis {
    /// Run the downtime and revenue calculations for `window`.
    /// `top` limits the per-location breakdown; `None` skips it.
    pub fn compute(table: &HistoricalTable, window: &Window, revenue: &RevenueModel, top: Option<usize>) -> Self {
        let broken_seconds = downtime::broken_seconds(table, window);

        let locations = top.map(|n| {
            let mut breakdown = downtime::broken_seconds_by_location(table, window);
            breakdown.truncate(n);
            breakdown
        });

        Analysis {
            start: window.start(),
            end: window.end(),
            broken_seconds,
            broken_hours: seconds_to_hours(broken_seconds),
            lost_revenue: revenue.estimate(broken_seconds),
            locations,
        }
    }
}

pub fn render(analysis: &Analysis) -> String {
    let start = analysis.start.date();
    let end = analysis.end.date();

    let mut output = format!(
        "Total downtime across all restaurants: {} hours in the period from {start} to {end}.\n",
        analysis.broken_hours.ceil()
    );
    output.push_str(&format!(
        "In the period from {start} to {end} McDonald's lost approximately {} in revenue.\n",
        format_currency(analysis.lost_revenue)
    ));

    if let Some(locations) = &analysis.locations {
        output.push_str(&table::render(locations));
    }

    output
}

pub fn print(analysis: &Analysis, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", json::render(analysis)?);
    } else {
        print!("{}", render(analysis));
    }
    Ok(())
}
