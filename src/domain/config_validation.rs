//! Configuration validation.
//!
//! Validates all config fields up front so commands fail fast with a precise
//! section/key/reason before any data is fetched.

use crate::domain::error::TrendwatchError;
use crate::domain::trend::{
    ChartType, TrendParams, DEFAULT_DOWNTREND_IF_BELOW, DEFAULT_NUM_UNITS,
    DEFAULT_UPTREND_IF_ABOVE,
};
use crate::domain::watchlist::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TrendwatchError> {
    match config.get_string("data", "csv_dir") {
        Some(dir) if !dir.trim().is_empty() => Ok(()),
        Some(_) => Err(TrendwatchError::ConfigInvalid {
            section: "data".to_string(),
            key: "csv_dir".to_string(),
            reason: "must not be empty".to_string(),
        }),
        None => Err(TrendwatchError::ConfigMissing {
            section: "data".to_string(),
            key: "csv_dir".to_string(),
        }),
    }
}

pub fn validate_trend_config(config: &dyn ConfigPort) -> Result<(), TrendwatchError> {
    validate_num_units(config)?;
    validate_thresholds(config)?;
    validate_chart_type(config)?;
    Ok(())
}

pub fn validate_watchlist_config(config: &dyn ConfigPort) -> Result<Vec<String>, TrendwatchError> {
    let raw = config.get_string("watchlist", "symbols").ok_or_else(|| {
        TrendwatchError::ConfigMissing {
            section: "watchlist".to_string(),
            key: "symbols".to_string(),
        }
    })?;
    parse_symbols(&raw).map_err(|e| TrendwatchError::ConfigInvalid {
        section: "watchlist".to_string(),
        key: "symbols".to_string(),
        reason: e.to_string(),
    })
}

/// Trend parameters from config, with the documented defaults for absent keys.
pub fn load_trend_params(config: &dyn ConfigPort) -> TrendParams {
    TrendParams {
        num_units: config.get_int("trend", "num_units", DEFAULT_NUM_UNITS as i64) as usize,
        uptrend_if_above_percent: config.get_double(
            "trend",
            "uptrend_if_above_percent",
            DEFAULT_UPTREND_IF_ABOVE,
        ),
        downtrend_if_below_percent: config.get_double(
            "trend",
            "downtrend_if_below_percent",
            DEFAULT_DOWNTREND_IF_BELOW,
        ),
    }
}

fn validate_num_units(config: &dyn ConfigPort) -> Result<(), TrendwatchError> {
    let value = config.get_int("trend", "num_units", DEFAULT_NUM_UNITS as i64);
    if value < 3 {
        return Err(TrendwatchError::ConfigInvalid {
            section: "trend".to_string(),
            key: "num_units".to_string(),
            reason: format!("must be at least 3, got {value}"),
        });
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), TrendwatchError> {
    let up = config.get_double("trend", "uptrend_if_above_percent", DEFAULT_UPTREND_IF_ABOVE);
    let down = config.get_double(
        "trend",
        "downtrend_if_below_percent",
        DEFAULT_DOWNTREND_IF_BELOW,
    );
    for (key, value) in [
        ("uptrend_if_above_percent", up),
        ("downtrend_if_below_percent", down),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(TrendwatchError::ConfigInvalid {
                section: "trend".to_string(),
                key: key.to_string(),
                reason: format!("must be between 0 and 1, got {value}"),
            });
        }
    }
    if down >= up {
        return Err(TrendwatchError::ConfigInvalid {
            section: "trend".to_string(),
            key: "downtrend_if_below_percent".to_string(),
            reason: "must be below uptrend_if_above_percent".to_string(),
        });
    }
    Ok(())
}

fn validate_chart_type(config: &dyn ConfigPort) -> Result<(), TrendwatchError> {
    if let Some(value) = config.get_string("trend", "chart_type") {
        ChartType::parse(&value)?;
    }
    Ok(())
}
