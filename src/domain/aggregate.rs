//! Calendar-period bar aggregation.
//!
//! Folds daily bars into weekly (Monday-to-Friday) or calendar-month bars.
//! Output is ordered most-recent-first; callers that need chronological order
//! must sort by [`AggregatedBar::key`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

use crate::domain::daily::DailyBar;
use crate::domain::error::TrendwatchError;
use crate::ports::data_port::DataPort;

/// Aggregation granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
}

impl Period {
    pub fn parse(input: &str) -> Result<Self, TrendwatchError> {
        match input.to_lowercase().as_str() {
            "week" | "weekly" => Ok(Period::Week),
            "month" | "monthly" => Ok(Period::Month),
            other => Err(TrendwatchError::InvalidParam {
                name: "period".to_string(),
                reason: format!("expected week or month, got {other}"),
            }),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Week => write!(f, "week"),
            Period::Month => write!(f, "month"),
        }
    }
}

/// Identifies one calendar period. Weeks are keyed by their Monday.
///
/// Ordering follows calendar position, so sorting a homogeneous list of keys
/// sorts the periods chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeriodKey {
    Week(NaiveDate),
    Month { year: i32, month: u32 },
}

impl PeriodKey {
    /// Key of the period containing `date`.
    pub fn for_date(date: NaiveDate, period: Period) -> Self {
        match period {
            Period::Week => {
                let monday = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
                PeriodKey::Week(monday)
            }
            Period::Month => PeriodKey::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }

    /// Last calendar day of the period: Friday for weeks, the last day of the
    /// month for months.
    pub fn end_date(&self) -> NaiveDate {
        match *self {
            PeriodKey::Week(monday) => monday + Days::new(4),
            PeriodKey::Month { year, month } => {
                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                first_day_of_month(next_year, next_month) - Days::new(1)
            }
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Week(monday) => write!(f, "{}", monday.format("%Y-%m-%d")),
            PeriodKey::Month { year, month } => write!(f, "{year}-{month:02}"),
        }
    }
}

/// One aggregated OHLCV bar for a calendar period.
///
/// `open` is the opening price of the first trading day in the period, `close`
/// the closing price of the last, `high`/`low` the period extremes and
/// `volume` the sum of daily volumes. Periods with no trading days are never
/// emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedBar {
    pub key: PeriodKey,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Normalize a raw `[start, end]` request to period boundaries.
///
/// Weeks: `start` moves forward to the next Monday (or stays if already one),
/// `end` moves back to the preceding Friday. Months: `start` becomes the first
/// day of its month and `end` the last day of the month *before* `end`'s
/// month, so the end month itself is excluded.
pub fn normalize_range(start: NaiveDate, end: NaiveDate, period: Period) -> (NaiveDate, NaiveDate) {
    match period {
        Period::Week => {
            let to_monday = (7 - start.weekday().num_days_from_monday()) % 7;
            let start = start + Days::new(u64::from(to_monday));
            let to_friday = (end.weekday().num_days_from_monday() + 7 - 4) % 7;
            let end = end - Days::new(u64::from(to_friday));
            (start, end)
        }
        Period::Month => {
            let start = first_day_of_month(start.year(), start.month());
            let end = first_day_of_month(end.year(), end.month()) - Days::new(1);
            (start, end)
        }
    }
}

fn first_day_of_month(year: i32, month: u32) -> NaiveDate {
    // month is always 1..=12 here, coming from a valid NaiveDate
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Fold daily bars into one [`AggregatedBar`] per calendar period.
///
/// Input need not be sorted or pre-filtered; bars are first indexed by date
/// (duplicate dates collapse to the last record seen) and only dates inside
/// the normalized range contribute. The result is ordered most-recent-first.
pub fn aggregate_daily(
    bars: &[DailyBar],
    start: NaiveDate,
    end: NaiveDate,
    period: Period,
) -> Vec<AggregatedBar> {
    let (start, end) = normalize_range(start, end, period);
    if start > end {
        return Vec::new();
    }

    // Explicit sort-by-date step; "most recent" must never depend on input order.
    let mut by_date: BTreeMap<NaiveDate, &DailyBar> = BTreeMap::new();
    for bar in bars {
        if bar.in_range(start, end) {
            by_date.insert(bar.date, bar);
        }
    }

    let mut result: Vec<AggregatedBar> = Vec::new();
    for (&date, bar) in &by_date {
        let key = PeriodKey::for_date(date, period);
        match result.last_mut() {
            Some(acc) if acc.key == key => {
                acc.high = acc.high.max(bar.high);
                acc.low = acc.low.min(bar.low);
                acc.close = bar.close;
                acc.volume += bar.volume;
            }
            // First trading day absorbed into a period fixes its open.
            _ => result.push(AggregatedBar {
                key,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            }),
        }
    }

    result.reverse();
    result
}

/// Normalize the range, fetch daily bars once through the port and fold them.
///
/// An inverted range after normalization and an empty provider result both
/// yield an empty table; only adapter failures are errors.
pub fn fetch_aggregated(
    port: &dyn DataPort,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    period: Period,
    verbose: bool,
) -> Result<Vec<AggregatedBar>, TrendwatchError> {
    let (start, end) = normalize_range(start, end, period);
    if start > end {
        return Ok(Vec::new());
    }

    let bars = port.fetch_daily(symbol, start, end)?;
    if verbose {
        eprintln!(
            "Fetched {} daily bars for {} from {} to {}",
            bars.len(),
            symbol,
            start,
            end
        );
    }
    if bars.is_empty() {
        eprintln!("Warning: no data received for {symbol} between {start} and {end}");
        return Ok(Vec::new());
    }

    Ok(aggregate_daily(&bars, start, end, period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bar(d: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: i64) -> DailyBar {
        DailyBar {
            symbol: "PIIND".into(),
            date: d,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    fn flat_bar(d: NaiveDate, price: f64) -> DailyBar {
        bar(d, price, price, price, price, 1_000)
    }

    #[test]
    fn week_range_moves_to_monday_and_friday() {
        // 2024-01-03 is a Wednesday, 2024-01-17 a Wednesday.
        let (start, end) = normalize_range(date(2024, 1, 3), date(2024, 1, 17), Period::Week);
        assert_eq!(start, date(2024, 1, 8)); // next Monday
        assert_eq!(end, date(2024, 1, 12)); // preceding Friday
    }

    #[test]
    fn week_range_keeps_exact_boundaries() {
        // 2024-01-08 is a Monday, 2024-01-12 a Friday.
        let (start, end) = normalize_range(date(2024, 1, 8), date(2024, 1, 12), Period::Week);
        assert_eq!(start, date(2024, 1, 8));
        assert_eq!(end, date(2024, 1, 12));
    }

    #[test]
    fn month_range_excludes_end_month() {
        let (start, end) = normalize_range(date(2024, 1, 20), date(2024, 4, 15), Period::Month);
        assert_eq!(start, date(2024, 1, 1));
        assert_eq!(end, date(2024, 3, 31));
    }

    #[test]
    fn inverted_range_is_empty() {
        // Wednesday to Thursday of the same week: Monday moves past Friday.
        let bars = vec![flat_bar(date(2024, 1, 10), 100.0)];
        let result = aggregate_daily(&bars, date(2024, 1, 10), date(2024, 1, 11), Period::Week);
        assert!(result.is_empty());
    }

    #[test]
    fn empty_input_is_empty() {
        let result = aggregate_daily(&[], date(2024, 1, 1), date(2024, 3, 1), Period::Month);
        assert!(result.is_empty());
    }

    #[test]
    fn weekly_open_close_capture() {
        let bars = vec![
            bar(date(2024, 1, 8), 10.0, 12.0, 9.0, 11.0, 100), // Monday
            bar(date(2024, 1, 10), 11.0, 15.0, 10.0, 14.0, 200), // Wednesday
            bar(date(2024, 1, 12), 14.0, 16.0, 13.0, 13.5, 300), // Friday
        ];
        let result = aggregate_daily(&bars, date(2024, 1, 8), date(2024, 1, 12), Period::Week);
        assert_eq!(result.len(), 1);
        let week = &result[0];
        assert_eq!(week.key, PeriodKey::Week(date(2024, 1, 8)));
        assert_eq!(week.open, 10.0); // Monday's open
        assert_eq!(week.close, 13.5); // Friday's close
        assert_eq!(week.high, 16.0);
        assert_eq!(week.low, 9.0);
        assert_eq!(week.volume, 600);
    }

    #[test]
    fn output_is_most_recent_first() {
        let bars = vec![
            flat_bar(date(2024, 1, 9), 10.0),  // week of Jan 8
            flat_bar(date(2024, 1, 16), 11.0), // week of Jan 15
            flat_bar(date(2024, 1, 23), 12.0), // week of Jan 22
        ];
        let result = aggregate_daily(&bars, date(2024, 1, 8), date(2024, 1, 26), Period::Week);
        let keys: Vec<PeriodKey> = result.iter().map(|b| b.key).collect();
        assert_eq!(
            keys,
            vec![
                PeriodKey::Week(date(2024, 1, 22)),
                PeriodKey::Week(date(2024, 1, 15)),
                PeriodKey::Week(date(2024, 1, 8)),
            ]
        );
    }

    #[test]
    fn week_with_no_trading_days_is_omitted() {
        let bars = vec![
            flat_bar(date(2024, 1, 9), 10.0),
            // nothing in the week of Jan 15
            flat_bar(date(2024, 1, 23), 12.0),
        ];
        let result = aggregate_daily(&bars, date(2024, 1, 8), date(2024, 1, 26), Period::Week);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].key, PeriodKey::Week(date(2024, 1, 22)));
        assert_eq!(result[1].key, PeriodKey::Week(date(2024, 1, 8)));
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut bars = vec![
            bar(date(2024, 1, 12), 14.0, 16.0, 13.0, 13.5, 300),
            bar(date(2024, 1, 8), 10.0, 12.0, 9.0, 11.0, 100),
            bar(date(2024, 1, 10), 11.0, 15.0, 10.0, 14.0, 200),
        ];
        let forward = aggregate_daily(&bars, date(2024, 1, 8), date(2024, 1, 12), Period::Week);
        bars.reverse();
        let backward = aggregate_daily(&bars, date(2024, 1, 8), date(2024, 1, 12), Period::Week);
        assert_eq!(forward, backward);
        assert_eq!(forward[0].open, 10.0);
        assert_eq!(forward[0].close, 13.5);
    }

    #[test]
    fn out_of_range_bars_are_ignored() {
        let bars = vec![
            flat_bar(date(2024, 1, 5), 99.0), // before range
            flat_bar(date(2024, 1, 10), 10.0),
            flat_bar(date(2024, 1, 19), 99.0), // after range
        ];
        let result = aggregate_daily(&bars, date(2024, 1, 8), date(2024, 1, 12), Period::Week);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].close, 10.0);
    }

    #[test]
    fn monthly_groups_by_calendar_month() {
        let bars = vec![
            bar(date(2024, 1, 2), 10.0, 12.0, 9.0, 11.0, 100),
            bar(date(2024, 1, 31), 11.0, 13.0, 10.0, 12.0, 200),
            bar(date(2024, 2, 1), 12.0, 14.0, 11.0, 13.0, 300),
        ];
        let result = aggregate_daily(&bars, date(2024, 1, 1), date(2024, 3, 15), Period::Month);
        assert_eq!(result.len(), 2);

        let feb = &result[0];
        assert_eq!(feb.key, PeriodKey::Month { year: 2024, month: 2 });
        assert_eq!(feb.open, 12.0);
        assert_eq!(feb.close, 13.0);

        let jan = &result[1];
        assert_eq!(jan.key, PeriodKey::Month { year: 2024, month: 1 });
        assert_eq!(jan.open, 10.0);
        assert_eq!(jan.close, 12.0);
        assert_eq!(jan.high, 13.0);
        assert_eq!(jan.low, 9.0);
        assert_eq!(jan.volume, 300);
    }

    #[test]
    fn monthly_drops_bars_from_excluded_end_month() {
        let bars = vec![
            flat_bar(date(2024, 1, 15), 10.0),
            flat_bar(date(2024, 2, 15), 11.0), // end month, excluded
        ];
        let result = aggregate_daily(&bars, date(2024, 1, 1), date(2024, 2, 20), Period::Month);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].key, PeriodKey::Month { year: 2024, month: 1 });
    }

    #[test]
    fn duplicate_dates_collapse_to_last_record() {
        let bars = vec![
            bar(date(2024, 1, 10), 10.0, 12.0, 9.0, 11.0, 100),
            bar(date(2024, 1, 10), 20.0, 22.0, 19.0, 21.0, 500),
        ];
        let result = aggregate_daily(&bars, date(2024, 1, 8), date(2024, 1, 12), Period::Week);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].open, 20.0);
        assert_eq!(result[0].volume, 500);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let bars: Vec<DailyBar> = (0..40u64)
            .map(|i| flat_bar(date(2024, 1, 1) + Days::new(i), 100.0 + i as f64))
            .collect();
        let first = aggregate_daily(&bars, date(2024, 1, 1), date(2024, 2, 9), Period::Week);
        let second = aggregate_daily(&bars, date(2024, 1, 1), date(2024, 2, 9), Period::Week);
        assert_eq!(first, second);
    }

    #[test]
    fn period_end_dates() {
        assert_eq!(
            PeriodKey::Week(date(2024, 1, 8)).end_date(),
            date(2024, 1, 12)
        );
        assert_eq!(
            PeriodKey::Month { year: 2024, month: 2 }.end_date(),
            date(2024, 2, 29)
        );
        assert_eq!(
            PeriodKey::Month { year: 2023, month: 12 }.end_date(),
            date(2023, 12, 31)
        );
    }

    #[test]
    fn period_key_display() {
        assert_eq!(PeriodKey::Week(date(2024, 1, 8)).to_string(), "2024-01-08");
        assert_eq!(
            PeriodKey::Month { year: 2024, month: 3 }.to_string(),
            "2024-03"
        );
    }

    #[test]
    fn period_parse_accepts_aliases() {
        assert_eq!(Period::parse("weekly").unwrap(), Period::Week);
        assert_eq!(Period::parse("Month").unwrap(), Period::Month);
        assert!(Period::parse("daily").is_err());
    }

    proptest! {
        #[test]
        fn ohlc_bounds_and_volume_sum(
            days in proptest::collection::vec((0u64..120, 1.0f64..500.0, 0.0f64..50.0, 1i64..100_000), 1..60)
        ) {
            let start = date(2024, 1, 1);
            let bars: Vec<DailyBar> = days
                .iter()
                .map(|&(offset, mid, spread, volume)| DailyBar {
                    symbol: "PIIND".into(),
                    date: start + Days::new(offset),
                    open: mid - spread / 2.0,
                    high: mid + spread,
                    low: mid - spread,
                    close: mid + spread / 2.0,
                    volume,
                })
                .collect();

            for period in [Period::Week, Period::Month] {
                let result = aggregate_daily(&bars, start, date(2024, 6, 1), period);
                let (norm_start, norm_end) = normalize_range(start, date(2024, 6, 1), period);

                // Dedup per date the same way the aggregator does.
                let mut by_date: BTreeMap<NaiveDate, &DailyBar> = BTreeMap::new();
                for b in &bars {
                    if b.in_range(norm_start, norm_end) {
                        by_date.insert(b.date, b);
                    }
                }

                for agg in &result {
                    prop_assert!(agg.high >= agg.open.max(agg.close).max(agg.low));
                    prop_assert!(agg.low <= agg.open.min(agg.close).min(agg.high));
                    let expected_volume: i64 = by_date
                        .values()
                        .filter(|b| PeriodKey::for_date(b.date, period) == agg.key)
                        .map(|b| b.volume)
                        .sum();
                    prop_assert_eq!(agg.volume, expected_volume);
                }

                // Every in-range trading day's period appears exactly once.
                let mut expected_keys: Vec<PeriodKey> = by_date
                    .keys()
                    .map(|&d| PeriodKey::for_date(d, period))
                    .collect();
                expected_keys.dedup();
                expected_keys.reverse();
                let actual_keys: Vec<PeriodKey> = result.iter().map(|b| b.key).collect();
                prop_assert_eq!(actual_keys, expected_keys);
            }
        }
    }
}
