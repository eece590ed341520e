//! Profit studies over aggregated bars.
//!
//! All functions take bars ordered most-recent-first, as produced by the
//! aggregator.

use chrono::NaiveDate;

use crate::domain::aggregate::AggregatedBar;
use crate::domain::xirr::{solve_xirr, CashFlow};

/// Profit % per period if bought at the previous period's close and sold at
/// this period's high. Aligned with the input; the oldest period has no
/// predecessor and gets 0.0.
pub fn max_profit_from_last_close(bars: &[AggregatedBar]) -> Vec<f64> {
    let mut profits = Vec::with_capacity(bars.len());
    for pair in bars.windows(2) {
        let high = pair[0].high;
        let last_close = pair[1].close;
        profits.push((high - last_close) / last_close * 100.0);
    }
    if !bars.is_empty() {
        profits.push(0.0);
    }
    profits
}

/// Profit % per period if bought at that period's open and sold at its high.
pub fn max_profit_from_open(bars: &[AggregatedBar]) -> Vec<f64> {
    bars.iter()
        .map(|bar| (bar.high - bar.open) / bar.open * 100.0)
        .collect()
}

/// Percentage of the most recent `num_periods` periods whose profit exceeded
/// `threshold_percent`.
///
/// The denominator is the requested count, matching the odds interpretation
/// "how often did the last N periods pay off" even when fewer are available.
pub fn profitable_period_ratio(profits: &[f64], threshold_percent: f64, num_periods: usize) -> f64 {
    let hits = profits
        .iter()
        .take(num_periods)
        .filter(|&&p| p > threshold_percent)
        .count();
    hits as f64 / num_periods as f64 * 100.0
}

/// Outcome of buying one unit at every period close and holding.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyEveryCloseSummary {
    pub invested: f64,
    pub current_value: f64,
    pub profit_percent: f64,
    pub annualized_rate_percent: f64,
}

/// Simulate investing one unit at every period close except the latest, which
/// values the accumulated holding. Needs at least two bars.
pub fn buy_every_close(bars: &[AggregatedBar], as_of: NaiveDate) -> Option<BuyEveryCloseSummary> {
    if bars.len() < 2 {
        return None;
    }

    let latest_close = bars[0].close;
    let purchases = &bars[1..];
    let invested: f64 = purchases.iter().map(|b| b.close).sum();
    let current_value = latest_close * purchases.len() as f64;
    let profit_percent = (current_value - invested) / invested * 100.0;

    let flows: Vec<CashFlow> = purchases
        .iter()
        .map(|b| {
            let age = (as_of - b.key.end_date()).num_days().max(0) as u32;
            CashFlow::new(b.close, age)
        })
        .collect();
    let annualized_rate_percent = solve_xirr(&flows, current_value);

    Some(BuyEveryCloseSummary {
        invested,
        current_value,
        profit_percent,
        annualized_rate_percent,
    })
}
