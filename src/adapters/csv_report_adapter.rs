//! CSV report adapter implementing ReportPort.
//!
//! Writes an aggregated-bar table in the row order given by the caller, one
//! row per period with a `period,open,high,low,close,volume` header.

use crate::domain::aggregate::AggregatedBar;
use crate::domain::error::TrendwatchError;
use crate::ports::report_port::ReportPort;
use std::path::Path;

pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write_bars(
        &self,
        bars: &[AggregatedBar],
        output_path: &Path,
    ) -> Result<(), TrendwatchError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| TrendwatchError::Data {
            reason: format!("failed to open {}: {}", output_path.display(), e),
        })?;

        wtr.write_record(["period", "open", "high", "low", "close", "volume"])
            .map_err(write_error)?;
        for bar in bars {
            wtr.write_record([
                bar.key.to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ])
            .map_err(write_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn write_error(e: csv::Error) -> TrendwatchError {
    TrendwatchError::Data {
        reason: format!("CSV write error: {e}"),
    }
}
