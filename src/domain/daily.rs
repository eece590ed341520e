//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct DailyBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl DailyBar {
    /// True when the bar falls inside the inclusive `[start, end]` range.
    pub fn in_range(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.date >= start && self.date <= end
    }
}
