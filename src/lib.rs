pub mod cli;
pub mod config;
pub mod downtime;
pub mod error;
pub mod feed;
pub mod model;
pub mod report;
pub mod revenue;
pub mod scrape;
pub mod store;
pub mod util;

pub use error::{Error, Result};
