//! trendwatch — calendar-aligned bar aggregation, trend classification and
//! annualized-return analysis for daily price series.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
