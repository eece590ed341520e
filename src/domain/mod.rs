//! Core domain types and logic.

pub mod daily;
pub mod aggregate;
pub mod trend;
pub mod xirr;
pub mod profit;
pub mod ath;
pub mod watchlist;
pub mod config_validation;
pub mod error;
