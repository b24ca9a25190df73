//! Lost revenue estimate.
//!
//! Pure arithmetic over total downtime and a handful of published figures
//! about the chain: customers per day, restaurant count, how often an order
//! includes a dessert and how often that dessert is ice cream.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::util::seconds_to_hours;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevenueModel {
    pub average_daily_customers: f64,
    pub num_restaurants: f64,
    pub dessert_order_ratio: f64,
    pub ice_cream_order_ratio: f64,
    pub dessert_prices: BTreeMap<String, f64>,
}

impl Default for RevenueModel {
    fn default() -> Self {
        let dessert_prices = [
            ("SMALL_SHAKE", 2.19),
            ("MEDIUM_SHAKE", 2.59),
            ("LARGE_SHAKE", 2.99),
            ("SUNDAE", 1.29),
            ("VANILLA_CONE", 1.00),
            ("SNACK_MCFLURRY", 1.79),
            ("REGULAR_MCFLURRY", 2.39),
        ]
        .into_iter()
        .map(|(name, price)| (name.to_string(), price))
        .collect();

        RevenueModel {
            average_daily_customers: 25_000_000.0,
            num_restaurants: 13_683.0,
            dessert_order_ratio: 0.3,
            ice_cream_order_ratio: 0.9,
            dessert_prices,
        }
    }
}

impl RevenueModel {
    pub fn estimate(&self, broken_seconds: f64) -> f64 {
        estimate_lost_revenue(
            broken_seconds,
            self.average_daily_customers,
            &self.dessert_prices,
            self.dessert_order_ratio,
            self.ice_cream_order_ratio,
            self.num_restaurants,
        )
    }
}

/// Mean price, or zero for an empty table.
pub fn average_price(prices: &BTreeMap<String, f64>) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    prices.values().sum::<f64>() / prices.len() as f64
}

/// Estimated ice cream sales lost over `broken_seconds` of machine downtime,
/// rounded up to a whole currency unit.
///
/// `num_restaurants` must be non-zero.
pub fn estimate_lost_revenue(
    broken_seconds: f64,
    average_daily_customers: f64,
    dessert_prices: &BTreeMap<String, f64>,
    dessert_order_ratio: f64,
    ice_cream_order_ratio: f64,
    num_restaurants: f64,
) -> f64 {
    let hours_broken = seconds_to_hours(broken_seconds);
    let customers_per_hour = average_daily_customers / 24.0;

    (customers_per_hour * hours_broken / num_restaurants
        * dessert_order_ratio
        * ice_cream_order_ratio
        * average_price(dessert_prices))
    .ceil()
}
