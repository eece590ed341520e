//! All-time-high comparison over daily bars.

use crate::domain::daily::DailyBar;
use crate::domain::error::TrendwatchError;

/// Where the last traded price sits relative to the highs of the lookback
/// window.
#[derive(Debug, Clone, PartialEq)]
pub struct AthComparison {
    pub last_traded_price: f64,
    pub all_time_high: f64,
    /// The nth-percentile high; at percentile 100 this equals the high itself.
    pub percentile_high: f64,
}

/// Compare the latest close against the highest and the `percentile`-th
/// percentile high of `bars`. Returns `None` for an empty window.
pub fn ath_comparison(
    bars: &[DailyBar],
    percentile: f64,
) -> Result<Option<AthComparison>, TrendwatchError> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(TrendwatchError::InvalidParam {
            name: "percentile".to_string(),
            reason: format!("must be in [0, 100], got {percentile}"),
        });
    }
    if bars.is_empty() {
        return Ok(None);
    }

    let last_traded_price = bars
        .iter()
        .max_by_key(|b| b.date)
        .map(|b| b.close)
        .unwrap_or_default();

    let mut highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    highs.sort_by(|a, b| b.total_cmp(a));

    let all_time_high = highs[0];
    let rank = ((1.0 - percentile / 100.0) * highs.len() as f64) as usize;
    let percentile_high = highs[rank.min(highs.len() - 1)];

    Ok(Some(AthComparison {
        last_traded_price,
        all_time_high,
        percentile_high,
    }))
}
