//! Trend classification over a window of aggregated closes.
//!
//! Two independent algorithms operate on the same window of closes ordered
//! most-recent-first: a count of week-on-week gains and a local-minima
//! ("bottoms") structure analysis.

use chrono::{Days, NaiveDate};
use std::fmt;

use crate::domain::aggregate::{fetch_aggregated, Period};
use crate::domain::error::TrendwatchError;
use crate::ports::data_port::DataPort;

pub const DEFAULT_NUM_UNITS: usize = 15;
pub const DEFAULT_UPTREND_IF_ABOVE: f64 = 0.7;
pub const DEFAULT_DOWNTREND_IF_BELOW: f64 = 0.3;

/// Qualitative trend of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Uptrend,
    Consolidation,
    Downtrend,
}

impl Trend {
    /// Integer code: 1 uptrend, 0 consolidation, -1 downtrend.
    pub fn code(&self) -> i8 {
        match self {
            Trend::Uptrend => 1,
            Trend::Consolidation => 0,
            Trend::Downtrend => -1,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Uptrend => "uptrend",
            Trend::Consolidation => "consolidation",
            Trend::Downtrend => "downtrend",
        };
        write!(f, "{label}")
    }
}

/// Which classification algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Count,
    Peaks,
}

impl Algorithm {
    pub fn parse(input: &str) -> Result<Self, TrendwatchError> {
        match input.to_lowercase().as_str() {
            "count" => Ok(Algorithm::Count),
            "peaks" => Ok(Algorithm::Peaks),
            other => Err(TrendwatchError::InvalidParam {
                name: "algorithm".to_string(),
                reason: format!("expected count or peaks, got {other}"),
            }),
        }
    }
}

/// Chart granularity feeding the classifier. Only weekly is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Weekly,
}

impl ChartType {
    pub fn parse(input: &str) -> Result<Self, TrendwatchError> {
        match input.to_lowercase().as_str() {
            "weekly" | "week" => Ok(ChartType::Weekly),
            other => Err(TrendwatchError::UnsupportedChart {
                requested: other.to_string(),
            }),
        }
    }

    fn days_per_unit(&self) -> u64 {
        match self {
            ChartType::Weekly => 7,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrendParams {
    /// Window size in aggregated units.
    pub num_units: usize,
    /// Uptrend when the gain ratio is strictly above this.
    pub uptrend_if_above_percent: f64,
    /// Downtrend when the gain ratio is strictly below this.
    pub downtrend_if_below_percent: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            num_units: DEFAULT_NUM_UNITS,
            uptrend_if_above_percent: DEFAULT_UPTREND_IF_ABOVE,
            downtrend_if_below_percent: DEFAULT_DOWNTREND_IF_BELOW,
        }
    }
}

impl TrendParams {
    /// Fail-fast precondition check before any data is fetched.
    pub fn validate(&self) -> Result<(), TrendwatchError> {
        if self.num_units < 3 {
            return Err(TrendwatchError::InvalidParam {
                name: "num_units".to_string(),
                reason: format!("must be at least 3, got {}", self.num_units),
            });
        }
        for (name, value) in [
            ("uptrend_if_above_percent", self.uptrend_if_above_percent),
            ("downtrend_if_below_percent", self.downtrend_if_below_percent),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrendwatchError::InvalidParam {
                    name: name.to_string(),
                    reason: format!("must be in [0, 1], got {value}"),
                });
            }
        }
        if self.downtrend_if_below_percent >= self.uptrend_if_above_percent {
            return Err(TrendwatchError::InvalidParam {
                name: "downtrend_if_below_percent".to_string(),
                reason: "must be below uptrend_if_above_percent".to_string(),
            });
        }
        Ok(())
    }
}

/// A classification plus its diagnostic flags.
#[derive(Debug, Clone, Copy)]
pub struct TrendReport {
    pub trend: Trend,
    pub algorithm: Algorithm,
    /// Units of data the classification was based on.
    pub units: usize,
    /// Fewer units than requested (e.g. newly listed instrument).
    pub thin_data: bool,
    /// More than `num_units + 2` units; likely an upstream windowing bug.
    pub excess_data: bool,
    /// Peak analysis found too little structure and used the count algorithm.
    pub used_count_fallback: bool,
}

/// Count-based classification over closes ordered most-recent-first.
///
/// Requires at least 2 closes.
pub fn classify_by_count(closes: &[f64], params: &TrendParams) -> Trend {
    debug_assert!(closes.len() >= 2, "count classification needs 2+ closes");
    let mut gains = 0usize;
    for pair in closes.windows(2) {
        // Strictly greater: the more recent close beat the older one.
        if pair[0] > pair[1] {
            gains += 1;
        }
    }
    let gain_ratio = gains as f64 / (closes.len() - 1) as f64;
    if gain_ratio > params.uptrend_if_above_percent {
        Trend::Uptrend
    } else if gain_ratio < params.downtrend_if_below_percent {
        Trend::Downtrend
    } else {
        Trend::Consolidation
    }
}

/// Peak-based classification over closes ordered most-recent-first.
///
/// Bottoms are interior closes lower than both neighbors, collected scanning
/// from the most recent end, so `bottoms[0]` is the most recent bottom.
/// Returns the trend and whether the count algorithm was used as a fallback
/// (fewer than two bottoms; the two-equal-bottoms tie is deliberately left to
/// the plain ordering rules below).
pub fn classify_by_peaks(closes: &[f64], params: &TrendParams) -> (Trend, bool) {
    debug_assert!(closes.len() >= 2, "peak classification needs 2+ closes");
    let mut bottoms: Vec<f64> = Vec::new();
    for i in 1..closes.len().saturating_sub(1) {
        if closes[i - 1] > closes[i] && closes[i] < closes[i + 1] {
            bottoms.push(closes[i]);
        }
    }

    if let Some(&most_recent_bottom) = bottoms.first() {
        if closes[0] < most_recent_bottom {
            return (Trend::Downtrend, false);
        }
    }

    if bottoms.len() < 2 {
        return (classify_by_count(closes, params), true);
    }

    let trend = if bottoms.len() >= 3 && bottoms[0] > bottoms[1] && bottoms[1] > bottoms[2] {
        // Each more recent bottom sits above the previous one: higher lows.
        Trend::Uptrend
    } else if bottoms[0] > bottoms[1] {
        Trend::Consolidation
    } else {
        Trend::Downtrend
    };
    (trend, false)
}

/// Classify the current trend of `symbol` as of `as_of`.
///
/// Aggregates the last `num_units + 1` weeks through the data port, sorts the
/// closes most-recent-first and runs the chosen algorithm. Thin or excess
/// windows are warnings, never failures; fewer than 2 units is an error since
/// no classification is possible.
pub fn current_trend(
    port: &dyn DataPort,
    symbol: &str,
    algorithm: Algorithm,
    params: &TrendParams,
    chart: ChartType,
    as_of: NaiveDate,
    verbose: bool,
) -> Result<TrendReport, TrendwatchError> {
    params.validate()?;

    if verbose {
        eprintln!(
            "Finding trend of {} on {:?} chart with num_units={}, \
             uptrend_if_above_percent={}, downtrend_if_below_percent={}",
            symbol,
            chart,
            params.num_units,
            params.uptrend_if_above_percent,
            params.downtrend_if_below_percent
        );
    }

    let lookback = (params.num_units as u64 + 1) * chart.days_per_unit();
    let start = as_of - Days::new(lookback);
    let mut bars = fetch_aggregated(port, symbol, start, as_of, Period::Week, verbose)?;
    // "Most recent" must come from the period key, not from discovery order.
    bars.sort_by(|a, b| b.key.cmp(&a.key));
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let units = closes.len();
    if units < 2 {
        return Err(TrendwatchError::InsufficientUnits {
            symbol: symbol.to_string(),
            units,
            minimum: 2,
        });
    }

    let thin_data = units < params.num_units;
    if thin_data {
        eprintln!(
            "Warning: computing trend for {} from only {} units of data ({} requested)",
            symbol, units, params.num_units
        );
    }
    let excess_data = units > params.num_units + 2;
    if excess_data {
        eprintln!(
            "Warning: computing trend for {} from {} units of data ({} requested); \
             this might indicate a bug",
            symbol, units, params.num_units
        );
    }

    let (trend, used_count_fallback) = match algorithm {
        Algorithm::Count => (classify_by_count(&closes, params), false),
        Algorithm::Peaks => {
            let (trend, fallback) = classify_by_peaks(&closes, params);
            if fallback {
                eprintln!(
                    "Warning: fewer than two bottoms for {}; falling back to count algorithm",
                    symbol
                );
            }
            (trend, fallback)
        }
    };

    if verbose {
        eprintln!("Classified {symbol} from {units} units: {trend}");
    }

    Ok(TrendReport {
        trend,
        algorithm,
        units,
        thin_data,
        excess_data,
        used_count_fallback,
    })
}
