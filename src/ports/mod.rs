//! Port traits at the I/O seams.

pub mod data_port;
pub mod config_port;
pub mod report_port;
