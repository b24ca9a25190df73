//! JSON output for analysis results.
//!
//! Serializes Analysis to JSON for scripting and piping.

use super::Analysis;
use crate::error::Result;

pub fn render(analysis: &Analysis) -> Result<String> {
    Ok(serde_json::to_string_pretty(analysis)?)
}
