#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use trendwatch::domain::daily::DailyBar;
use trendwatch::domain::error::TrendwatchError;
use trendwatch::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<DailyBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_daily(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, TrendwatchError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TrendwatchError::Data {
                reason: reason.clone(),
            });
        }
        let mut bars = self.data.get(symbol).cloned().unwrap_or_default();
        bars.retain(|b| b.in_range(start_date, end_date));
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendwatchError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendwatchError> {
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: &str, close: f64) -> DailyBar {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    DailyBar {
        symbol: symbol.to_string(),
        date,
        open: close - 1.0,
        high: close + 2.0,
        low: close - 2.0,
        close,
        volume: 1_000,
    }
}

/// One bar per week (on Wednesday), starting from the week of `first_monday`,
/// with the given weekly closes in chronological order.
pub fn weekly_close_bars(symbol: &str, first_monday: NaiveDate, closes: &[f64]) -> Vec<DailyBar> {
    closes
        .iter()
        .enumerate()
        .map(|(week, &close)| {
            let wednesday = first_monday + Days::new(week as u64 * 7 + 2);
            DailyBar {
                symbol: symbol.to_string(),
                date: wednesday,
                open: close - 1.0,
                high: close + 2.0,
                low: close - 2.0,
                close,
                volume: 1_000,
            }
        })
        .collect()
}
