//! CSV file data adapter.
//!
//! Reads per-symbol files named `{SYMBOL}.csv` with a
//! `date,open,high,low,close,volume` header.

use crate::domain::daily::DailyBar;
use crate::domain::error::TrendwatchError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<DailyBar>, TrendwatchError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TrendwatchError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TrendwatchError::Data {
                reason: format!("CSV parse error: {e}"),
            })?;

            let date_str = record.get(0).ok_or_else(|| TrendwatchError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                TrendwatchError::Data {
                    reason: format!("invalid date format: {e}"),
                }
            })?;

            bars.push(DailyBar {
                symbol: symbol.to_string(),
                date,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, TrendwatchError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| TrendwatchError::Data {
            reason: format!("missing {name} column"),
        })?
        .parse()
        .map_err(|e| TrendwatchError::Data {
            reason: format!("invalid {name} value: {e}"),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_daily(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, TrendwatchError> {
        let mut bars = self.read_all(symbol)?;
        bars.retain(|b| b.in_range(start_date, end_date));
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendwatchError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendwatchError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TrendwatchError::Data {
                reason: format!("directory entry error: {e}"),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendwatchError> {
        let bars = self.read_all(symbol)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("PIIND.csv"), csv_content).unwrap();
        fs::write(path.join("TCS.csv"), "date,open,high,low,close,volume\n").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_daily_returns_correct_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let bars = adapter.fetch_daily("PIIND", start, end).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
    }

    #[test]
    fn fetch_daily_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let bars = adapter.fetch_daily("PIIND", day, day).unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day);
    }

    #[test]
    fn fetch_daily_missing_file_is_an_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(adapter.fetch_daily("MISSING", start, end).is_err());
    }

    #[test]
    fn empty_file_yields_no_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(adapter.fetch_daily("TCS", start, end).unwrap().is_empty());
    }

    #[test]
    fn list_symbols_finds_csv_files() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(adapter.list_symbols().unwrap(), vec!["PIIND", "TCS"]);
    }

    #[test]
    fn data_range_reports_bounds_and_count() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let range = adapter.data_range("PIIND").unwrap().unwrap();
        assert_eq!(range.0, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(range.1, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
        assert_eq!(range.2, 3);

        assert!(adapter.data_range("TCS").unwrap().is_none());
    }
}
