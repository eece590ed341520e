//! Report output port trait.

use crate::domain::aggregate::AggregatedBar;
use crate::domain::error::TrendwatchError;
use std::path::Path;

/// Port for writing an aggregated-bar table to a downstream consumer.
pub trait ReportPort {
    fn write_bars(&self, bars: &[AggregatedBar], output_path: &Path)
        -> Result<(), TrendwatchError>;
}
