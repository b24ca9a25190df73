//! Per-location downtime table.
//!
//! One row per location, already sorted by downtime descending.

use crate::downtime::LocationDowntime;
use crate::util::format_duration;

pub fn render(locations: &[LocationDowntime]) -> String {
    if locations.is_empty() {
        return String::from("\nNo broken machines in this period.\n");
    }

    let mut output = String::new();
    output.push_str(&format!(
        "\n{:<32} {:<20} {:<5} {:>8} {:>12}\n",
        "Street", "City", "State", "Breaks", "Downtime"
    ));
    output.push_str(&"-".repeat(81));
    output.push('\n');

    for location in locations {
        output.push_str(&format!(
            "{:<32} {:<20} {:<5} {:>8} {:>12}\n",
            truncate(&location.street, 32),
            truncate(&location.city, 20),
            truncate(&location.state, 5),
            location.intervals,
            format_duration(location.broken_seconds)
        ));
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(street: &str, seconds: f64) -> LocationDowntime {
        LocationDowntime {
            latitude: 0.0,
            longitude: 0.0,
            state: "NY".to_string(),
            city: "New York".to_string(),
            street: street.to_string(),
            broken_seconds: seconds,
            intervals: 2,
        }
    }

    #[test]
    fn empty_breakdown_message() {
        assert!(render(&[]).contains("No broken machines"));
    }

    #[test]
    fn rows_follow_input_order() {
        let text = render(&[location("1 Main St", 7200.0), location("2 Side St", 60.0)]);
        let main = text.find("1 Main St").unwrap();
        let side = text.find("2 Side St").unwrap();
        assert!(main < side);
        assert!(text.contains("2h 0m"));
    }

    #[test]
    fn long_street_is_truncated() {
        assert_eq!(truncate("12345 Very Long Boulevard Name Here", 10), "1234567...");
        assert_eq!(truncate("short", 10), "short");
    }
}
