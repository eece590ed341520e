//! Data access port trait.

use crate::domain::daily::DailyBar;
use crate::domain::error::TrendwatchError;
use chrono::NaiveDate;

/// Upstream collaborator supplying daily bars for a symbol and inclusive date
/// range. An empty range result is an empty vec, not an error.
pub trait DataPort {
    fn fetch_daily(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, TrendwatchError>;

    fn list_symbols(&self) -> Result<Vec<String>, TrendwatchError>;

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendwatchError>;
}
